use thiserror::Error;

pub const NATURALS_PER_OCTAVE: usize = 7;
pub const ACCIDENTALS_PER_OCTAVE: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("keyboard needs at least one octave")]
    NoOctaves,
    #[error("{octaves} octaves starting at pitch {start} run past the largest pitch")]
    PitchOverflow { start: i32, octaves: usize },
    #[error("key {name} must be a positive finite number, got {value}")]
    BadDimension { name: &'static str, value: f32 },
    #[error("velocity {0} is outside 0..=127")]
    BadVelocity(i32),
    #[error("MIDI channel {0} is outside 0..=15")]
    BadChannel(u8),
}

/// Accidental keys are always half as wide and half as tall as naturals.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardConfig {
    pub start_pitch: i32,
    pub octaves: usize,
    pub natural_width: f32,
    pub natural_height: f32,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            start_pitch: 48,
            octaves: 3,
            natural_width: 40.0,
            natural_height: 200.0,
        }
    }
}

impl KeyboardConfig {
    pub fn accidental_width(&self) -> f32 {
        self.natural_width / 2.0
    }

    pub fn accidental_height(&self) -> f32 {
        self.natural_height / 2.0
    }

    pub fn natural_count(&self) -> usize {
        NATURALS_PER_OCTAVE * self.octaves
    }

    pub fn accidental_count(&self) -> usize {
        ACCIDENTALS_PER_OCTAVE * self.octaves
    }

    pub fn key_count(&self) -> usize {
        self.natural_count() + self.accidental_count()
    }

    /// Pitch of the rightmost key, or `None` if it does not fit in an `i32`.
    pub fn last_pitch(&self) -> Option<i32> {
        let keys = (NATURALS_PER_OCTAVE + ACCIDENTALS_PER_OCTAVE).checked_mul(self.octaves)?;
        let span = i32::try_from(keys.checked_sub(1)?).ok()?;
        self.start_pitch.checked_add(span)
    }

    pub fn width(&self) -> f32 {
        self.natural_count() as f32 * self.natural_width
    }

    pub fn height(&self) -> f32 {
        self.natural_height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octaves == 0 {
            return Err(ConfigError::NoOctaves);
        }
        if self.last_pitch().is_none() {
            return Err(ConfigError::PitchOverflow {
                start: self.start_pitch,
                octaves: self.octaves,
            });
        }
        check_dimension("width", self.natural_width)?;
        check_dimension("height", self.natural_height)
    }
}

fn check_dimension(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::BadDimension { name, value })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteSettings {
    pub velocity: i32,
    pub channel: u8,
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            velocity: 93,
            channel: 0,
        }
    }
}

impl NoteSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=127).contains(&self.velocity) {
            return Err(ConfigError::BadVelocity(self.velocity));
        }
        if self.channel > 15 {
            return Err(ConfigError::BadChannel(self.channel));
        }
        Ok(())
    }
}
