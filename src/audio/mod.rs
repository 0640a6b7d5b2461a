use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::audio_api::{AudioCommand, DeviceClock, PlaybackSink, TriggerParams};

mod engine;
mod frame;
mod sample_buffer;
mod sample_id;
mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use sample_id::{SampleId, TriggerId, next_sample_id, next_trigger_id};

use engine::Engine;

const COMMAND_QUEUE: usize = 1024;
const SCRATCH_FRAMES: usize = 4096;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    frames_rendered: Arc<AtomicU64>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // for the loader, which registers buffers itself
    pub fn command_sender(&self) -> Sender<AudioCommand> {
        self.tx.clone()
    }

    pub fn sink(&self) -> EngineSink {
        EngineSink { tx: self.tx.clone(), sample_rate: self.sample_rate }
    }

    pub fn clock(&self) -> AudioClock {
        AudioClock {
            frames_rendered: Arc::clone(&self.frames_rendered),
            sample_rate: self.sample_rate,
        }
    }
}

/// Device clock backed by the engine's rendered-frame counter.
#[derive(Clone)]
pub struct AudioClock {
    frames_rendered: Arc<AtomicU64>,
    sample_rate: u32,
}

impl DeviceClock for AudioClock {
    fn current_time(&self) -> f64 {
        self.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }
}

/// Playback sink that turns device seconds into engine frames and queues a
/// trigger. Never blocks; a full queue drops the trigger.
#[derive(Clone)]
pub struct EngineSink {
    tx: Sender<AudioCommand>,
    sample_rate: u32,
}

impl EngineSink {
    fn seconds_to_frame(&self, when: f64) -> u64 {
        (when.max(0.0) * self.sample_rate as f64).round() as u64
    }
}

impl PlaybackSink for EngineSink {
    fn play(&self, when: f64, sample: SampleId, gain: f32) -> TriggerId {
        let id = next_trigger_id();
        let cmd = AudioCommand::Trigger(TriggerParams {
            sample_id: sample,
            at_frame: self.seconds_to_frame(when),
            gain,
        });
        match self.tx.try_send(cmd) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::warn!("audio command queue full, dropped trigger {} at {when:.3}s", id.0),
            Err(TrySendError::Disconnected(_)) => log::debug!("audio engine gone, dropped trigger {} at {when:.3}s", id.0),
        }
        id
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate: u32 = config.sample_rate();
    let channels = config.channels() as usize;
    let frames_rendered = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(Arc::clone(&frames_rendered));
            let output_stream = build_output_stream_f32(&device, &config.into(), engine, rx, channels)?;
            output_stream.play().context("failed to play output stream")?;
            log::info!("audio output running at {sample_rate} Hz, {channels} channel(s)");

            Ok(AudioHandle {
                tx,
                frames_rendered,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
    rx: Receiver<AudioCommand>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut scratch = vec![StereoFrame::zero(); SCRATCH_FRAMES];

    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() { // drain everything queued since the last block
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::zero()); // only if the host grows its buffer
            }
            let block = &mut scratch[..n_frames];
            engine.render_block(block);
            write_interleaved(block, data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// stereo mix -> whatever layout the device wants
fn write_interleaved(block: &[StereoFrame], data: &mut [f32], channels: usize) {
    match channels {
        0 => {}
        1 => {
            for (out, f) in data.iter_mut().zip(block) {
                *out = 0.5 * (f.left + f.right);
            }
        }
        _ => {
            for (out, f) in data.chunks_exact_mut(channels).zip(block) {
                out[0] = f.left;
                out[1] = f.right;
                out[2..].fill(0.0);
            }
        }
    }
}
