use std::sync::Arc;

use crate::audio::{SampleBuffer, SampleId, TriggerId};

#[derive(Clone, Debug)]
pub struct TriggerParams {
    pub sample_id: SampleId,
    pub at_frame: u64, // absolute frame on the engine's output clock
    pub gain: f32,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't load files (interrupts thread), so the loader decodes
    // off-thread and hands the engine a finished buffer under a fresh id
    RegisterSample { id: SampleId, buffer: Arc<SampleBuffer> },

    // A reload replaced this buffer; free its slot
    UnregisterSample(SampleId),

    // The engine then uses the sample id to start a voice at an exact frame
    Trigger(TriggerParams),
}

/// Where scheduled step events end up. `play` must not block: the scheduler
/// calls it from inside its wake and expects to move straight on.
///
/// `when` is on the same time base as [`DeviceClock::current_time`]. A gain of
/// 0.0 still has to schedule something, the first silent step relies on it.
pub trait PlaybackSink: Send {
    fn play(&self, when: f64, sample: SampleId, gain: f32) -> TriggerId;
}

/// The audio device's output clock, in seconds. Never goes backwards.
pub trait DeviceClock: Send + Sync {
    fn current_time(&self) -> f64;
}

impl<C: DeviceClock + ?Sized> DeviceClock for Arc<C> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }
}

// Stand-ins for the audio device so the sequencer can be driven by hand
#[cfg(test)]
pub mod testing {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    use atomic_float::AtomicF64;
    use parking_lot::Mutex;

    use super::{DeviceClock, PlaybackSink};
    use crate::audio::{SampleId, TriggerId, next_trigger_id};

    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayedEvent {
        pub when: f64,
        pub sample: SampleId,
        pub gain: f32,
    }

    // remembers every play call; clones share the same log
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        events: Arc<Mutex<Vec<PlayedEvent>>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<PlayedEvent> {
            self.events.lock().clone()
        }

        pub fn clear(&self) {
            self.events.lock().clear();
        }
    }

    impl PlaybackSink for RecordingSink {
        fn play(&self, when: f64, sample: SampleId, gain: f32) -> TriggerId {
            self.events.lock().push(PlayedEvent { when, sample, gain });
            next_trigger_id()
        }
    }

    // device clock that only moves when told to
    pub struct ManualClock {
        now: AtomicF64,
    }

    impl ManualClock {
        pub fn at(now: f64) -> Self {
            Self { now: AtomicF64::new(now) }
        }

        pub fn set(&self, now: f64) {
            self.now.store(now, Ordering::Release);
        }

        pub fn advance(&self, secs: f64) {
            self.now.fetch_add(secs, Ordering::AcqRel);
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::at(0.0)
        }
    }

    impl DeviceClock for ManualClock {
        fn current_time(&self) -> f64 {
            self.now.load(Ordering::Acquire)
        }
    }

    // device clock that follows the wall clock, for driving the real worker thread
    pub struct WallClock {
        origin: Instant,
    }

    impl WallClock {
        pub fn new() -> Self {
            Self { origin: Instant::now() }
        }
    }

    impl DeviceClock for WallClock {
        fn current_time(&self) -> f64 {
            self.origin.elapsed().as_secs_f64()
        }
    }
}
