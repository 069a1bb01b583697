use macroquad::color::Color;
use macroquad::math::Vec2;

use crate::config::KeyboardConfig;
use crate::geometry::Outline;
use crate::key::{Key, KeyCategory};
use crate::layout::build_keys;

pub struct Keyboard {
    config: KeyboardConfig,
    keys: Vec<Key>,
}

impl Keyboard {
    pub fn new(config: KeyboardConfig) -> Self {
        let keys = build_keys(&config);
        Self { config, keys }
    }

    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key_mut(&mut self, index: usize) -> Option<&mut Key> {
        self.keys.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn width(&self) -> f32 {
        self.config.width()
    }

    pub fn height(&self) -> f32 {
        self.config.height()
    }

    pub fn index_of_pitch(&self, pitch: i32) -> Option<usize> {
        let offset = usize::try_from(pitch.checked_sub(self.config.start_pitch)?).ok()?;
        (offset < self.keys.len()).then_some(offset)
    }

    /// Index of the key under `point`, accidentals taking priority.
    pub fn key_at(&self, point: Vec2) -> Option<usize> {
        self.first_containing(point, KeyCategory::Accidental)
            .or_else(|| self.first_containing(point, KeyCategory::Natural))
    }

    /// Every key whose outline contains `point`, ignoring priority.
    pub fn keys_containing(&self, point: Vec2) -> Vec<usize> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, key)| key.contains_point(point))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn sounding(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter().filter(|key| key.is_on())
    }

    pub fn for_each_key<F>(&self, mut visitor: F)
    where
        F: FnMut(&Outline, Color),
    {
        for key in &self.keys {
            visitor(key.outline(), key.fill_color());
        }
    }

    fn first_containing(&self, point: Vec2, category: KeyCategory) -> Option<usize> {
        self.keys
            .iter()
            .position(|key| key.category() == category && key.contains_point(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::color::{BLACK, GRAY, WHITE};

    #[test]
    fn accidental_wins_at_shared_boundary() {
        let keyboard = Keyboard::new(KeyboardConfig::default());
        let index = keyboard.key_at(Vec2::new(30.0, 0.0)).unwrap();
        assert_eq!(keyboard.keys()[index].pitch(), 49);
        assert_eq!(keyboard.keys_containing(Vec2::new(30.0, 0.0)), vec![index]);
    }

    #[test]
    fn lower_half_belongs_to_naturals() {
        let keyboard = Keyboard::new(KeyboardConfig::default());
        let index = keyboard.key_at(Vec2::new(35.0, 150.0)).unwrap();
        assert_eq!(keyboard.keys()[index].pitch(), 48);
        let index = keyboard.key_at(Vec2::new(40.0, 150.0)).unwrap();
        assert_eq!(keyboard.keys()[index].pitch(), 50);
    }

    #[test]
    fn outside_points_miss() {
        let keyboard = Keyboard::new(KeyboardConfig::default());
        assert_eq!(keyboard.key_at(Vec2::new(840.0, 10.0)), None);
        assert_eq!(keyboard.key_at(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(keyboard.key_at(Vec2::new(10.0, 200.0)), None);
        assert_eq!(keyboard.key_at(Vec2::new(10.0, -0.5)), None);
    }

    #[test]
    fn pitch_lookup_respects_span() {
        let keyboard = Keyboard::new(KeyboardConfig::default());
        assert_eq!(keyboard.index_of_pitch(48), Some(0));
        assert_eq!(keyboard.index_of_pitch(83), Some(35));
        assert_eq!(keyboard.index_of_pitch(84), None);
        assert_eq!(keyboard.index_of_pitch(47), None);
        assert_eq!(keyboard.index_of_pitch(i32::MIN), None);
        assert_eq!(keyboard.index_of_pitch(i32::MAX), None);
    }

    #[test]
    fn pitch_lookup_near_the_integer_limits() {
        let low = Keyboard::new(KeyboardConfig {
            start_pitch: i32::MIN,
            octaves: 1,
            ..Default::default()
        });
        assert_eq!(low.index_of_pitch(i32::MIN + 11), Some(11));
        assert_eq!(low.index_of_pitch(i32::MAX), None);
    }

    #[test]
    fn visitor_reports_state_colors() {
        let mut keyboard = Keyboard::new(KeyboardConfig::default());
        if let Some(key) = keyboard.key_mut(0) {
            key.set_on(true);
        }
        let mut colors = Vec::new();
        keyboard.for_each_key(|_, color| colors.push(color));
        assert_eq!(colors.len(), 36);
        assert_eq!(colors[0], GRAY);
        assert_eq!(colors[1], BLACK);
        assert_eq!(colors[2], WHITE);
        assert_eq!(keyboard.sounding().count(), 1);
    }
}
