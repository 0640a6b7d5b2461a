mod clock;
mod kit;
mod pattern;
mod sample;
mod scheduler;
mod track_set;
mod transport;

pub use clock::{Timing, validate_tempo};
pub use kit::KitPiece;
pub use sample::Sample;
pub use scheduler::Sequencer;
pub use track_set::TrackSet;
