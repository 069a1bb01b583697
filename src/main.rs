use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use macroquad::prelude::*;
use piano_keys::midi::MidiOutSink;
use piano_keys::output::{AudioEngine, TonePipeline, ToneSink};
use piano_keys::queue::spawn_note_worker;
use piano_keys::render::{build_drawings, draw_keyboard};
use piano_keys::{
    Keyboard, KeyboardConfig, LogSink, NoteSettings, NoteSink, PointerController, RedrawFlag,
};
use tokio::runtime::Runtime;

const MARGIN: f32 = 20.0;
const BACKGROUND: Color = Color {
    r: 0.82,
    g: 0.82,
    b: 0.82,
    a: 1.0,
};

#[derive(Parser, Debug)]
#[command(name = "piano-keys", about = "Play an on-screen piano keyboard with the mouse")]
struct Args {
    /// MIDI pitch of the leftmost key.
    #[arg(long, default_value_t = 48, allow_negative_numbers = true)]
    start_pitch: i32,
    #[arg(long, default_value_t = 3)]
    octaves: usize,
    /// Width of a natural key in pixels.
    #[arg(long, default_value_t = 40.0)]
    key_width: f32,
    /// Height of a natural key in pixels.
    #[arg(long, default_value_t = 200.0)]
    key_height: f32,
    #[arg(long, default_value_t = 93)]
    velocity: i32,
    #[arg(long, default_value_t = 0)]
    channel: u8,
    #[arg(long, value_enum, default_value_t = Backend::Midi)]
    backend: Backend,
    /// Substring of the MIDI output port to use.
    #[arg(long)]
    port: Option<String>,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// External MIDI output port.
    Midi,
    /// Built-in sine tones on the default audio device.
    Tone,
    /// No sound, notes are only logged.
    Log,
}

impl Args {
    fn keyboard_config(&self) -> KeyboardConfig {
        KeyboardConfig {
            start_pitch: self.start_pitch,
            octaves: self.octaves,
            natural_width: self.key_width,
            natural_height: self.key_height,
        }
    }

    fn note_settings(&self) -> NoteSettings {
        NoteSettings {
            velocity: self.velocity,
            channel: self.channel,
        }
    }
}

// window_conf runs before main, so both read the same parsed arguments.
fn args() -> &'static Args {
    static ARGS: OnceLock<Args> = OnceLock::new();
    ARGS.get_or_init(Args::parse)
}

fn window_conf() -> Conf {
    let config = args().keyboard_config();
    Conf {
        window_title: "Piano Keys".into(),
        fullscreen: false,
        sample_count: 1,
        window_width: (config.width() + MARGIN * 2.0) as i32,
        window_height: (config.height() + MARGIN * 2.0) as i32,
        window_resizable: false,
        high_dpi: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    if let Err(err) = run().await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = args();
    init_logging(args.verbose);

    let config = args.keyboard_config();
    config.validate()?;
    let settings = args.note_settings();
    settings.validate()?;

    let runtime = Runtime::new().context("could not start tokio runtime")?;
    let (backend, _audio) = open_backend(args, &settings)?;
    let (sink, worker) = spawn_note_worker(&runtime, backend);
    let mut controller =
        PointerController::new(Keyboard::new(config), settings, sink, RedrawFlag::new());

    let origin = vec2(MARGIN, MARGIN);
    let mut drawings = Vec::new();

    prevent_quit();
    while !is_quit_requested() {
        controller.handle_mouse(
            Vec2::from(mouse_position()) - origin,
            is_mouse_button_pressed(MouseButton::Left),
            is_mouse_button_down(MouseButton::Left),
            is_mouse_button_released(MouseButton::Left),
        );

        if controller.redraw().take() {
            drawings = build_drawings(controller.keyboard(), origin);
        }
        clear_background(BACKGROUND);
        draw_keyboard(&drawings);

        next_frame().await;
    }

    controller.release_all();
    drop(controller);
    runtime
        .block_on(worker)
        .map_err(|err| anyhow!("note worker failed: {err}"))?;
    info!("shut down");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .try_init();
}

fn open_backend(
    args: &Args,
    settings: &NoteSettings,
) -> Result<(Box<dyn NoteSink + Send>, Option<AudioEngine>)> {
    match args.backend {
        Backend::Midi => match MidiOutSink::open(args.port.as_deref(), settings.channel) {
            Ok(sink) => Ok((Box::new(sink), None)),
            Err(err) => {
                warn!("{err:#}; notes will only be logged");
                Ok((Box::new(LogSink), None))
            }
        },
        Backend::Tone => {
            let pipeline = Arc::new(Mutex::new(TonePipeline::new()));
            let engine = AudioEngine::start(pipeline.clone()).context("could not open audio output")?;
            Ok((Box::new(ToneSink::new(pipeline)), Some(engine)))
        }
        Backend::Log => {
            info!("logging notes without sound");
            Ok((Box::new(LogSink), None))
        }
    }
}
