use std::fmt;

use log::warn;
use macroquad::color::{BLACK, Color, GRAY, WHITE};
use macroquad::math::Vec2;

use crate::config::NoteSettings;
use crate::geometry::Outline;
use crate::sink::{NoteEvent, NoteSink, RedrawRequester};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    Natural,
    Accidental,
}

#[derive(Clone, Debug)]
pub struct Key {
    outline: Outline,
    pitch: i32,
    category: KeyCategory,
    is_on: bool,
}

impl Key {
    pub fn new(outline: Outline, pitch: i32, category: KeyCategory) -> Self {
        Self {
            outline,
            pitch,
            category,
            is_on: false,
        }
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    pub fn category(&self) -> KeyCategory {
        self.category
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.outline.contains(point)
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn set_on(&mut self, on: bool) {
        self.is_on = on;
    }

    // A rejected event is logged and dropped and the key keeps its state.
    pub fn play(
        &mut self,
        on: bool,
        settings: &NoteSettings,
        sink: &mut dyn NoteSink,
        redraw: &dyn RedrawRequester,
    ) -> bool {
        let event = NoteEvent::new(self.pitch, on, settings.velocity);
        match sink.send(event) {
            Ok(()) => {
                self.is_on = on;
                redraw.request_redraw();
                true
            }
            Err(err) => {
                warn!("could not play {}: {err}", self);
                false
            }
        }
    }

    pub fn fill_color(&self) -> Color {
        if self.is_on {
            GRAY
        } else {
            match self.category {
                KeyCategory::Natural => WHITE,
                KeyCategory::Accidental => BLACK,
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key: {}", self.pitch)
    }
}
