use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use crate::audio::{SampleBuffer, SampleId, next_sample_id};
use crate::audio_api::AudioCommand;
use crate::error::LoadError;
use crate::sequencer::Sample;

// Outcome of one load, as seen by whoever kicked it off
#[derive(Debug)]
pub enum LoadEvent {
    Loaded { name: String, id: SampleId },
    Failed { name: String, error: LoadError },
}

// Decode a WAV from disk, ready for registration with the engine
pub fn load(path: &Path, target_rate: u32) -> Result<(SampleId, SampleBuffer), LoadError> {
    let buffer = SampleBuffer::load_wav(path, target_rate)?;
    Ok((next_sample_id(), buffer))
}

// Loads samples off the scheduler and audio threads. A sample only gets its
// buffer id after the engine has been handed the buffer, so a pattern can
// never trigger something the engine doesn't know about.
pub struct SampleLoader {
    engine_tx: Sender<AudioCommand>,
    sample_rate: u32,
    sample_dir: PathBuf,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
}

impl SampleLoader {
    pub fn new(engine_tx: Sender<AudioCommand>, sample_rate: u32, sample_dir: impl Into<PathBuf>) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            engine_tx,
            sample_rate,
            sample_dir: sample_dir.into(),
            events_tx,
            events_rx,
        }
    }

    pub fn events(&self) -> &Receiver<LoadEvent> {
        &self.events_rx
    }

    pub fn path_for(&self, sample: &Sample) -> PathBuf {
        self.sample_dir.join(sample.file_name())
    }

    // Fire and forget; the result shows up on `events()`. Loading a sample
    // again (say after fixing the file) swaps in the new buffer.
    pub fn load(&self, sample: Arc<Sample>) -> JoinHandle<()> {
        let path = self.path_for(&sample);
        let engine_tx = self.engine_tx.clone();
        let events_tx = self.events_tx.clone();
        let sample_rate = self.sample_rate;

        thread::spawn(move || {
            let event = match load_and_register(&path, sample_rate, &engine_tx) {
                Ok(id) => {
                    if let Some(old) = sample.set_buffer(id) {
                        // patterns already point at the new id, nothing triggers the old one
                        let _ = engine_tx.send(AudioCommand::UnregisterSample(old));
                        log::debug!("'{}' reloaded, retired buffer {}", sample.name(), old.0);
                    }
                    log::info!("loaded '{}' from {}", sample.name(), path.display());
                    LoadEvent::Loaded { name: sample.name().to_string(), id }
                }
                Err(error) => {
                    log::warn!("could not load '{}': {error}", sample.name());
                    LoadEvent::Failed { name: sample.name().to_string(), error }
                }
            };
            let _ = events_tx.send(event);
        })
    }
}

fn load_and_register(path: &Path, sample_rate: u32, engine_tx: &Sender<AudioCommand>) -> Result<SampleId, LoadError> {
    let (id, buffer) = load(path, sample_rate)?;
    engine_tx
        .send(AudioCommand::RegisterSample { id, buffer: Arc::new(buffer) })
        .map_err(|_| LoadError::EngineUnavailable)?;
    Ok(id)
}
