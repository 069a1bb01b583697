use std::cell::Cell;
use std::collections::HashMap;

use log::info;
use thiserror::Error;

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("invalid MIDI data: {0}")]
    InvalidData(String),
    #[error("note backend failed: {0}")]
    Backend(String),
    #[error("note backend is no longer listening")]
    Disconnected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    Immediate,
    /// Backend clock time in microseconds.
    At(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: i32,
    pub on: bool,
    pub velocity: i32,
    pub timestamp: Timestamp,
}

impl NoteEvent {
    pub fn new(pitch: i32, on: bool, velocity: i32) -> Self {
        Self {
            pitch,
            on,
            velocity,
            timestamp: Timestamp::Immediate,
        }
    }

    pub fn validate(&self) -> Result<(), NoteError> {
        if !(0..=127).contains(&self.pitch) {
            return Err(NoteError::InvalidData(format!(
                "pitch {} is outside 0..=127",
                self.pitch
            )));
        }
        if !(0..=127).contains(&self.velocity) {
            return Err(NoteError::InvalidData(format!(
                "velocity {} is outside 0..=127",
                self.velocity
            )));
        }
        Ok(())
    }

    /// Encodes the event as a three byte channel voice message.
    pub fn encode(&self, channel: u8) -> Result<[u8; 3], NoteError> {
        self.validate()?;
        if channel > 15 {
            return Err(NoteError::InvalidData(format!(
                "channel {channel} is outside 0..=15"
            )));
        }
        let status = if self.on { NOTE_ON } else { NOTE_OFF };
        Ok([status | channel, self.pitch as u8, self.velocity as u8])
    }
}

pub trait NoteSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError>;
}

impl<T: NoteSink + ?Sized> NoteSink for Box<T> {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        (**self).send(event)
    }
}

pub trait RedrawRequester {
    fn request_redraw(&self);
}

impl RedrawRequester for () {
    fn request_redraw(&self) {}
}

#[derive(Debug)]
pub struct RedrawFlag {
    pending: Cell<bool>,
}

impl RedrawFlag {
    /// A flag that starts pending, so the first frame always draws.
    pub fn new() -> Self {
        Self {
            pending: Cell::new(true),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    pub fn take(&self) -> bool {
        self.pending.replace(false)
    }
}

impl Default for RedrawFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RedrawRequester for RedrawFlag {
    fn request_redraw(&self) {
        self.pending.set(true);
    }
}

/// Headless backend: every event goes to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl NoteSink for LogSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        event.validate()?;
        let state = if event.on { "on" } else { "off" };
        match event.timestamp {
            Timestamp::Immediate => info!(
                "note {state} pitch={} velocity={}",
                event.pitch, event.velocity
            ),
            Timestamp::At(micros) => info!(
                "note {state} pitch={} velocity={} at={micros}us",
                event.pitch, event.velocity
            ),
        }
        Ok(())
    }
}

/// Keeps every accepted event and per-pitch counters.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<NoteEvent>,
    on_counts: HashMap<i32, usize>,
    off_counts: HashMap<i32, usize>,
    sounding: HashMap<i32, bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn on_count(&self, pitch: i32) -> usize {
        self.on_counts.get(&pitch).copied().unwrap_or(0)
    }

    pub fn off_count(&self, pitch: i32) -> usize {
        self.off_counts.get(&pitch).copied().unwrap_or(0)
    }

    pub fn is_on(&self, pitch: i32) -> bool {
        self.sounding.get(&pitch).copied().unwrap_or(false)
    }
}

impl NoteSink for RecordingSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        event.validate()?;
        let counts = if event.on {
            &mut self.on_counts
        } else {
            &mut self.off_counts
        };
        *counts.entry(event.pitch).or_default() += 1;
        self.sounding.insert(event.pitch, event.on);
        self.events.push(event);
        Ok(())
    }
}
