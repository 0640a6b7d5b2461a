use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use super::pattern::Pattern;
use super::sample::Sample;
use crate::error::{Result, SequencerError};

// The stock drum sounds a track can be created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KitPiece {
    Kick,
    Snare,
    Hihat,
    Rim,
    Cowbell,
}

impl KitPiece {
    pub const ALL: [KitPiece; 5] = [
        KitPiece::Kick,
        KitPiece::Snare,
        KitPiece::Hihat,
        KitPiece::Rim,
        KitPiece::Cowbell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KitPiece::Kick => "kick",
            KitPiece::Snare => "snare",
            KitPiece::Hihat => "hihat",
            KitPiece::Rim => "rim",
            KitPiece::Cowbell => "cowbell",
        }
    }

    pub fn display_char(self) -> char {
        match self {
            KitPiece::Kick => 'k',
            KitPiece::Snare => 's',
            KitPiece::Hihat => 'h',
            KitPiece::Rim => 'r',
            KitPiece::Cowbell => 'c',
        }
    }

    // looked up in the sample dir
    pub fn file_name(self) -> String {
        format!("{}.wav", self.name())
    }

    // basic four-on-the-floor; rim and cowbell start empty
    pub fn default_steps(self) -> &'static [usize] {
        match self {
            KitPiece::Kick => &[0, 4, 8, 12],
            KitPiece::Snare => &[4, 12],
            KitPiece::Hihat => &[2, 6, 10, 14],
            KitPiece::Rim | KitPiece::Cowbell => &[],
        }
    }

    pub fn sample(self) -> Arc<Sample> {
        Arc::new(Sample::new(self.name(), self.display_char(), self.file_name()))
    }

    // fresh pattern with its own sample slot
    pub fn pattern(self) -> Result<Pattern> {
        Pattern::with_steps(self.sample(), self.default_steps())
    }
}

impl fmt::Display for KitPiece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KitPiece {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self> {
        KitPiece::ALL
            .into_iter()
            .find(|piece| piece.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SequencerError::UnknownKitPiece(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_render_their_default_patterns() {
        assert_eq!(KitPiece::Kick.pattern().unwrap().display_pattern(), "k---k---k---k---");
        assert_eq!(KitPiece::Snare.pattern().unwrap().display_pattern(), "----s-------s---");
        assert_eq!(KitPiece::Hihat.pattern().unwrap().display_pattern(), "--h---h---h---h-");
        assert_eq!(KitPiece::Rim.pattern().unwrap().display_pattern(), "----------------");
        assert_eq!(KitPiece::Cowbell.pattern().unwrap().display_pattern(), "----------------");
    }

    #[test]
    fn each_pattern_gets_its_own_state() {
        let a = KitPiece::Kick.pattern().unwrap();
        let b = KitPiece::Kick.pattern().unwrap();
        a.toggle_step(1).unwrap();
        assert!(a.is_active(1).unwrap());
        assert!(!b.is_active(1).unwrap());
        assert!(!Arc::ptr_eq(a.sample(), b.sample()));
    }

    #[test]
    fn parses_names() {
        assert_eq!("kick".parse::<KitPiece>(), Ok(KitPiece::Kick));
        assert_eq!(" HiHat ".parse::<KitPiece>(), Ok(KitPiece::Hihat));
        assert_eq!(
            "tabla".parse::<KitPiece>(),
            Err(SequencerError::UnknownKitPiece("tabla".into()))
        );
        for piece in KitPiece::ALL {
            assert_eq!(piece.to_string().parse::<KitPiece>(), Ok(piece));
        }
    }

    #[test]
    fn deserializes_lowercase() {
        let pieces: Vec<KitPiece> = serde_json::from_str(r#"["kick", "cowbell"]"#).unwrap();
        assert_eq!(pieces, vec![KitPiece::Kick, KitPiece::Cowbell]);
        assert!(serde_json::from_str::<KitPiece>(r#""tabla""#).is_err());
    }

    #[test]
    fn samples_are_named_after_the_piece() {
        let sample = KitPiece::Rim.sample();
        assert_eq!(sample.name(), "rim");
        assert_eq!(sample.file_name(), "rim.wav");
        assert_eq!(sample.display_char(), 'r');
        assert!(!sample.is_loaded());
    }
}
