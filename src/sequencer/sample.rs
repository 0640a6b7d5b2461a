use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::SampleId;

const UNSET: u64 = u64::MAX;

// A named sound a pattern points at. The audio itself lives in the engine;
// this only remembers which registered buffer to ask for, once there is one.
#[derive(Debug)]
pub struct Sample {
    name: String,
    display_char: char,
    file_name: String,
    buffer: AtomicU64, // SampleId, or UNSET until a load lands
}

impl Sample {
    pub fn new(name: impl Into<String>, display_char: char, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_char,
            file_name: file_name.into(),
            buffer: AtomicU64::new(UNSET),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_char(&self) -> char {
        self.display_char
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn buffer(&self) -> Option<SampleId> {
        match self.buffer.load(Ordering::Acquire) {
            UNSET => None,
            id => Some(SampleId(id)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.buffer().is_some()
    }

    // called by the loader once the engine has the buffer; hands back the
    // one it replaced so that can be unregistered
    pub fn set_buffer(&self, id: SampleId) -> Option<SampleId> {
        match self.buffer.swap(id.0, Ordering::AcqRel) {
            UNSET => None,
            old => Some(SampleId(old)),
        }
    }
}
