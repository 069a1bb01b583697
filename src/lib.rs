//! On-screen piano keyboard: key geometry, hit testing and the pointer
//! gesture handling that turns presses, drags and releases into note-on and
//! note-off events for a sound backend.

pub mod config;
pub mod controllers;
pub mod geometry;
pub mod key;
pub mod keyboard;
pub mod layout;
pub mod midi;
pub mod output;
pub mod queue;
pub mod render;
pub mod sink;

pub use config::{ConfigError, KeyboardConfig, NoteSettings};
pub use controllers::{PointerController, PointerEvent};
pub use geometry::Outline;
pub use key::{Key, KeyCategory};
pub use keyboard::Keyboard;
pub use sink::{
    LogSink, NoteError, NoteEvent, NoteSink, RecordingSink, RedrawFlag, RedrawRequester, Timestamp,
};
