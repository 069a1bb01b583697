use log::debug;
use macroquad::math::Vec2;

use crate::config::NoteSettings;
use crate::keyboard::Keyboard;
use crate::sink::{NoteSink, RedrawRequester};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(Vec2),
    Drag(Vec2),
    Release(Vec2),
}

/// Turns pointer gestures into key transitions.
///
/// Key state lives on the keys themselves; the controller only decides
/// which keys change. Dragging is legato: leaving a key silences it and
/// entering one sounds it, once per crossing.
pub struct PointerController<S, R> {
    keyboard: Keyboard,
    settings: NoteSettings,
    sink: S,
    redraw: R,
    last_point: Option<Vec2>,
}

impl<S: NoteSink, R: RedrawRequester> PointerController<S, R> {
    pub fn new(keyboard: Keyboard, settings: NoteSettings, sink: S, redraw: R) -> Self {
        Self {
            keyboard,
            settings,
            sink,
            redraw,
            last_point: None,
        }
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn redraw(&self) -> &R {
        &self.redraw
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Press(point) => self.press(point),
            PointerEvent::Drag(point) => self.drag(point),
            PointerEvent::Release(point) => self.release(point),
        }
    }

    /// Feeds one frame of left-button state. A release at a point the
    /// pointer never dragged to is preceded by a drag there, so whatever
    /// sounded along the way is silenced.
    pub fn handle_mouse(&mut self, point: Vec2, pressed: bool, down: bool, released: bool) {
        if pressed {
            self.press(point);
            self.last_point = Some(point);
        } else if down && self.last_point != Some(point) {
            self.drag(point);
            self.last_point = Some(point);
        }
        if released {
            if self.last_point.is_some_and(|last| last != point) {
                self.drag(point);
            }
            self.release(point);
            self.last_point = None;
        }
    }

    pub fn press(&mut self, point: Vec2) {
        if let Some(index) = self.keyboard.key_at(point) {
            self.play_index(index, true);
        }
    }

    pub fn drag(&mut self, point: Vec2) {
        let hit = self.keyboard.key_at(point);
        for index in 0..self.keyboard.len() {
            let is_on = self.keyboard.keys()[index].is_on();
            if hit == Some(index) {
                if !is_on && self.play_index(index, true) {
                    debug!("{}", self.keyboard.keys()[index]);
                }
            } else if is_on {
                self.play_index(index, false);
            }
        }
    }

    pub fn release(&mut self, point: Vec2) {
        if let Some(index) = self.keyboard.key_at(point) {
            self.play_index(index, false);
        }
    }

    /// Plays a key by pitch instead of position. Returns false when no key
    /// has that pitch or the backend refused the event.
    pub fn play_pitch(&mut self, pitch: i32, on: bool) -> bool {
        match self.keyboard.index_of_pitch(pitch) {
            Some(index) => self.play_index(index, on),
            None => false,
        }
    }

    /// Sends note-off for every sounding key.
    pub fn release_all(&mut self) {
        for index in 0..self.keyboard.len() {
            if self.keyboard.keys()[index].is_on() {
                self.play_index(index, false);
            }
        }
    }

    fn play_index(&mut self, index: usize, on: bool) -> bool {
        let Self {
            keyboard,
            settings,
            sink,
            redraw,
            ..
        } = self;
        match keyboard.key_mut(index) {
            Some(key) => key.play(on, &*settings, &mut *sink, &*redraw),
            None => false,
        }
    }
}
