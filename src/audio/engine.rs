use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;
use super::voice::Voice;
use crate::audio_api::{AudioCommand, TriggerParams};

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
const MAX_PENDING: usize = 256; // triggers waiting for their frame
const MAX_SAMPLES: usize = 64; // registered buffers, same deal as the voice pool

// Lives on the audio thread. Owns the output frame counter, which doubles as
// the device clock everybody else schedules against.
pub struct Engine {
    samples: Vec<Option<(SampleId, Arc<SampleBuffer>)>>, // fixed slots, never grows
    voices: Vec<Option<Voice>>, // fixed pool, never grows
    pending: Vec<TriggerParams>,
    frames_rendered: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(frames_rendered: Arc<AtomicU64>) -> Self {
        Self {
            samples: vec![None; MAX_SAMPLES],
            voices: vec![None; MAX_VOICES],
            pending: Vec::with_capacity(MAX_PENDING),
            frames_rendered,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                // a full table drops the buffer; triggers for it are ignored like any unknown id
                let slot = self
                    .samples
                    .iter()
                    .position(|s| s.as_ref().is_some_and(|(existing, _)| *existing == id))
                    .or_else(|| self.samples.iter().position(|s| s.is_none()));
                if let Some(slot) = slot {
                    self.samples[slot] = Some((id, buffer));
                }
            }
            AudioCommand::UnregisterSample(id) => {
                for slot in self.samples.iter_mut() {
                    if slot.as_ref().is_some_and(|(existing, _)| *existing == id) {
                        *slot = None; // voices still playing it keep their own Arc
                    }
                }
            }
            AudioCommand::Trigger(t) => {
                // full queue means the scheduler is way ahead of us; drop rather than allocate
                if self.pending.len() < MAX_PENDING {
                    self.pending.push(t);
                }
            }
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Acquire)
    }

    // Fill one block. Triggers landing inside the block start on their exact
    // frame, late ones start at the top of the block.
    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());

        let block_start = self.frames_rendered();
        let block_end = block_start + out.len() as u64;

        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at_frame < block_end {
                let t = self.pending.swap_remove(i);
                let delay = t.at_frame.saturating_sub(block_start) as usize;
                self.start_voice(&t, delay);
            } else {
                i += 1;
            }
        }

        for slot in self.voices.iter_mut() {
            if let Some(voice) = slot {
                voice.render_into(out);
                if voice.is_finished() {
                    *slot = None;
                }
            }
        }

        self.frames_rendered.store(block_end, Ordering::Release);
    }

    fn start_voice(&mut self, t: &TriggerParams, delay: usize) {
        let Some(buffer) = self.buffer(t.sample_id) else {
            return; // never registered, nothing to play
        };

        // free slot first, otherwise steal whichever voice is furthest along
        let slot = self.voices.iter().position(|v| v.is_none()).unwrap_or_else(|| {
            self.voices
                .iter()
                .enumerate()
                .max_by_key(|(_, v)| v.as_ref().map_or(0, |v| v.position()))
                .map_or(0, |(i, _)| i)
        });

        self.voices[slot] = Some(Voice::new(buffer, t.gain, delay));
    }

    fn buffer(&self, id: SampleId) -> Option<Arc<SampleBuffer>> {
        self.samples
            .iter()
            .flatten()
            .find(|(existing, _)| *existing == id)
            .map(|(_, buffer)| Arc::clone(buffer))
    }

    #[cfg(test)]
    fn registered_samples(&self) -> usize {
        self.samples.iter().filter(|s| s.is_some()).count()
    }

    #[cfg(test)]
    fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_some()).count()
    }
}
