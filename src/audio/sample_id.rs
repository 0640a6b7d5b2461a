use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SAMPLE_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_TRIGGER_ID: AtomicU64 = AtomicU64::new(0);

// Handle to a buffer registered with the engine. The sequencer only ever
// holds these, never the audio data itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub u64);

// Returned by every play call so the caller can tell its triggers apart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriggerId(pub u64);

// fancy atomic counters let us hand out unique ids from any thread
pub fn next_sample_id() -> SampleId {
    SampleId(NEXT_SAMPLE_ID.fetch_add(1, Ordering::Relaxed))
}

pub fn next_trigger_id() -> TriggerId {
    TriggerId(NEXT_TRIGGER_ID.fetch_add(1, Ordering::Relaxed))
}
