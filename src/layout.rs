//! Builds the key outlines and pitches of a keyboard.
//!
//! An octave is walked as two groups: three naturals with two accidentals
//! between them (C D E), then four naturals with three accidentals
//! (F G A B). Naturals are notched so their top half stops where the
//! neighbouring accidental begins; accidentals are plain rectangles covering
//! the upper half of the keyboard, centred on the boundary between two
//! naturals.

use crate::config::KeyboardConfig;
use crate::geometry::Outline;
use crate::key::{Key, KeyCategory};

/// Natural keys per group, left to right within an octave.
const GROUP_NATURALS: [usize; 2] = [3, 4];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NaturalShape {
    /// Notched on the right only.
    First,
    /// Notched on both sides.
    Middle,
    /// Notched on the left only.
    Last,
}

pub fn build_keys(config: &KeyboardConfig) -> Vec<Key> {
    let builder = LayoutBuilder { config };
    let mut keys = Vec::with_capacity(config.key_count());
    let mut x = 0.0;
    let mut offset = 0;

    for _ in 0..config.octaves {
        for naturals in GROUP_NATURALS {
            builder.push_group(&mut keys, x, offset, naturals);
            x += naturals as f32 * config.natural_width;
            // Whole steps inside the group, a half step into the next one.
            offset += 2 * naturals - 1;
        }
    }

    keys.sort_by_key(Key::pitch);
    keys
}

struct LayoutBuilder<'a> {
    config: &'a KeyboardConfig,
}

impl LayoutBuilder<'_> {
    fn push_group(&self, keys: &mut Vec<Key>, x: f32, offset: usize, naturals: usize) {
        let width = self.config.natural_width;
        for index in 0..naturals {
            let shape = match index {
                0 => NaturalShape::First,
                i if i + 1 == naturals => NaturalShape::Last,
                _ => NaturalShape::Middle,
            };
            let left = x + index as f32 * width;
            keys.push(Key::new(
                self.natural_outline(left, shape),
                self.pitch(offset + 2 * index),
                KeyCategory::Natural,
            ));
        }

        let first_accidental = x + width - self.config.accidental_width() / 2.0;
        for index in 0..naturals - 1 {
            let left = first_accidental + index as f32 * width;
            keys.push(Key::new(
                self.accidental_outline(left),
                self.pitch(offset + 1 + 2 * index),
                KeyCategory::Accidental,
            ));
        }
    }

    // Saturates for spans that `KeyboardConfig::validate` rejects.
    fn pitch(&self, offset: usize) -> i32 {
        let offset = i32::try_from(offset).unwrap_or(i32::MAX);
        self.config.start_pitch.saturating_add(offset)
    }

    fn natural_outline(&self, x: f32, shape: NaturalShape) -> Outline {
        let width = self.config.natural_width;
        let height = self.config.natural_height;
        let notch = self.config.accidental_width() / 2.0;
        let mid = self.config.accidental_height();

        let coords = match shape {
            NaturalShape::First => vec![
                (x, 0.0),
                (x + width - notch, 0.0),
                (x + width - notch, mid),
                (x + width, mid),
                (x + width, height),
                (x, height),
            ],
            NaturalShape::Middle => vec![
                (x, mid),
                (x + notch, mid),
                (x + notch, 0.0),
                (x + width - notch, 0.0),
                (x + width - notch, mid),
                (x + width, mid),
                (x + width, height),
                (x, height),
            ],
            NaturalShape::Last => vec![
                (x + notch, 0.0),
                (x + width, 0.0),
                (x + width, height),
                (x, height),
                (x, mid),
                (x + notch, mid),
            ],
        };
        Outline::from_coords(&coords)
    }

    fn accidental_outline(&self, x: f32) -> Outline {
        let width = self.config.accidental_width();
        let height = self.config.accidental_height();
        Outline::from_coords(&[(x, 0.0), (x + width, 0.0), (x + width, height), (x, height)])
    }
}
