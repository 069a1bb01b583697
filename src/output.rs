use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use cpal::{
    SampleFormat, Stream,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use log::{error, info};

use crate::sink::{NoteError, NoteEvent, NoteSink};

pub type SharedPipeline = Arc<Mutex<TonePipeline>>;

const REFERENCE_PITCH: i32 = 69;
const REFERENCE_FREQ: f32 = 440.0;
const RAMP_SECONDS: f32 = 0.005;
const MASTER_LEVEL: f32 = 0.2;

pub fn midi_to_frequency(pitch: i32) -> f32 {
    REFERENCE_FREQ * 2.0f32.powf((pitch - REFERENCE_PITCH) as f32 / 12.0)
}

struct Voice {
    pitch: i32,
    frequency: f32,
    phase: f32,
    level: f32,
    target: f32,
}

/// Plain sine voices, one per sounding pitch, with a short click-free ramp.
pub struct TonePipeline {
    voices: Vec<Voice>,
    sample_rate: f32,
}

impl TonePipeline {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            sample_rate: 44_100.0,
        }
    }

    pub fn set_sample_rate(&mut self, rate: f32) {
        self.sample_rate = rate.max(1.0);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn note_on(&mut self, pitch: i32, velocity: i32) {
        let target = velocity.clamp(0, 127) as f32 / 127.0;
        match self.voices.iter_mut().find(|voice| voice.pitch == pitch) {
            Some(voice) => voice.target = target,
            None => self.voices.push(Voice {
                pitch,
                frequency: midi_to_frequency(pitch),
                phase: 0.0,
                level: 0.0,
                target,
            }),
        }
    }

    pub fn note_off(&mut self, pitch: i32) {
        if let Some(voice) = self.voices.iter_mut().find(|voice| voice.pitch == pitch) {
            voice.target = 0.0;
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let step = 1.0 / (RAMP_SECONDS * self.sample_rate);
        let mut mixed = 0.0;
        for voice in &mut self.voices {
            if voice.level < voice.target {
                voice.level = (voice.level + step).min(voice.target);
            } else {
                voice.level = (voice.level - step).max(voice.target);
            }
            mixed += (voice.phase * TAU).sin() * voice.level;
            voice.phase = (voice.phase + voice.frequency / self.sample_rate).fract();
        }
        self.voices
            .retain(|voice| voice.target > 0.0 || voice.level > 0.0);
        mixed * MASTER_LEVEL
    }
}

impl Default for TonePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Note sink feeding a [`TonePipeline`] shared with the audio callback.
pub struct ToneSink {
    pipeline: SharedPipeline,
}

impl ToneSink {
    pub fn new(pipeline: SharedPipeline) -> Self {
        Self { pipeline }
    }
}

impl NoteSink for ToneSink {
    fn send(&mut self, event: NoteEvent) -> Result<(), NoteError> {
        event.validate()?;
        let mut pipe = self
            .pipeline
            .lock()
            .map_err(|_| NoteError::Backend("tone pipeline lock poisoned".into()))?;
        if event.on {
            pipe.note_on(event.pitch, event.velocity);
        } else {
            pipe.note_off(event.pitch);
        }
        Ok(())
    }
}

pub struct AudioEngine {
    _stream: Stream,
}

impl AudioEngine {
    pub fn start(pipeline: SharedPipeline) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No default audio output"))?;
        let supported = device.default_output_config()?;
        let config = supported.config();
        let sample_rate = config.sample_rate.0 as f32;
        pipeline
            .lock()
            .map_err(|_| anyhow!("tone pipeline lock poisoned"))?
            .set_sample_rate(sample_rate);
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream_f32(&device, &config, pipeline)?,
            SampleFormat::I16 => build_stream_i16(&device, &config, pipeline)?,
            SampleFormat::U16 => build_stream_u16(&device, &config, pipeline)?,
            _ => build_stream_f32(&device, &config, pipeline)?,
        };
        stream.play()?;
        info!("tone output running at {sample_rate} Hz");
        Ok(Self { _stream: stream })
    }
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    pipeline: SharedPipeline,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [f32], _| {
            fill_output_buffer(output, channels, &pipeline, |sample| sample);
        },
        move |err| error!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    pipeline: SharedPipeline,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [i16], _| {
            fill_output_buffer(output, channels, &pipeline, |sample| {
                (sample * i16::MAX as f32) as i16
            });
        },
        move |err| error!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn build_stream_u16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    pipeline: SharedPipeline,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |output: &mut [u16], _| {
            fill_output_buffer(output, channels, &pipeline, |sample| {
                let scaled = (sample * 0.5 + 0.5).clamp(0.0, 1.0);
                (scaled * u16::MAX as f32) as u16
            });
        },
        move |err| error!("audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

fn fill_output_buffer<T, F>(
    output: &mut [T],
    channels: usize,
    pipeline: &SharedPipeline,
    mut convert: F,
) where
    F: FnMut(f32) -> T,
    T: Copy,
{
    let Ok(mut pipe) = pipeline.lock() else {
        let silence = convert(0.0);
        output.fill(silence);
        return;
    };
    for frame in output.chunks_mut(channels) {
        let value = convert(pipe.next_sample().clamp(-0.98, 0.98));
        for channel in frame {
            *channel = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitch_is_concert_a() {
        assert_eq!(midi_to_frequency(69), 440.0);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-3);
    }

    #[test]
    fn note_off_fades_voice_out() {
        let mut pipe = TonePipeline::new();
        pipe.set_sample_rate(1_000.0);
        pipe.note_on(60, 127);
        let peak = (0..200).map(|_| pipe.next_sample().abs()).fold(0.0, f32::max);
        assert!(peak > 0.0);
        assert_eq!(pipe.active_voices(), 1);

        pipe.note_off(60);
        for _ in 0..20 {
            pipe.next_sample();
        }
        assert_eq!(pipe.active_voices(), 0);
        assert_eq!(pipe.next_sample(), 0.0);
    }

    #[test]
    fn repeated_note_on_reuses_the_voice() {
        let mut pipe = TonePipeline::new();
        pipe.note_on(60, 93);
        pipe.note_on(60, 93);
        pipe.note_on(64, 93);
        assert_eq!(pipe.active_voices(), 2);
    }

    #[test]
    fn tone_sink_rejects_malformed_events() {
        let pipeline = Arc::new(Mutex::new(TonePipeline::new()));
        let mut sink = ToneSink::new(pipeline.clone());
        assert!(sink.send(NoteEvent::new(-3, true, 93)).is_err());
        sink.send(NoteEvent::new(72, true, 93)).unwrap();
        assert_eq!(pipeline.lock().unwrap().active_voices(), 1);
    }
}
