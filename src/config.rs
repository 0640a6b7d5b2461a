// read once on startup; tells the runner what to play and how to schedule it
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::sequencer::{KitPiece, Timing, validate_tempo};
use crate::shared::{DEFAULT_LOOKAHEAD_SECS, DEFAULT_SCHEDULE_INTERVAL_MS, DEFAULT_TEMPO};

const DRUMLOOP_DIR: &str = ".drumloop";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tempo: f64,
    pub lookahead_secs: f64,
    pub schedule_interval_ms: u64,
    pub sample_dir: PathBuf, // relative paths resolve against the project dir
    pub tracks: Vec<KitPiece>,
    pub play_secs: f64, // how long the runner plays before stopping
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            schedule_interval_ms: DEFAULT_SCHEDULE_INTERVAL_MS,
            sample_dir: PathBuf::from("audio"),
            tracks: vec![KitPiece::Kick, KitPiece::Snare, KitPiece::Hihat],
            play_secs: 8.0,
        }
    }
}

impl Config {
    pub fn timing(&self) -> anyhow::Result<Timing> {
        Ok(Timing::new(self.lookahead_secs, self.schedule_interval_ms)?)
    }

    pub fn sample_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.sample_dir) // absolute sample_dir wins in join
    }

    fn validate(&self) -> anyhow::Result<()> {
        validate_tempo(self.tempo)?;
        self.timing()?;
        if !self.play_secs.is_finite() || self.play_secs < 0.0 {
            anyhow::bail!("play_secs must be a non-negative number, got {}", self.play_secs);
        }
        Ok(())
    }
}

// <project_dir>/.drumloop/config.json
fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DRUMLOOP_DIR).join(CONFIG_FILE)
}

// No file means defaults; a file that's there but broken is an error
pub fn load_config(project_dir: &Path) -> anyhow::Result<Config> {
    let path = config_file_path(project_dir);
    let config = match std::fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data)
            .with_context(|| format!("malformed config at {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no config at {}, using defaults", path.display());
            Config::default()
        }
        Err(e) => return Err(e).with_context(|| format!("could not read {}", path.display())),
    };
    config.validate().with_context(|| format!("invalid config at {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, json: &str) {
        let path = config_file_path(dir);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timing().unwrap(), Timing::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{ "tempo": 90, "tracks": ["kick", "cowbell"] }"#);

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.tempo, 90.0);
        assert_eq!(config.tracks, vec![KitPiece::Kick, KitPiece::Cowbell]);
        assert_eq!(config.schedule_interval_ms, DEFAULT_SCHEDULE_INTERVAL_MS);
        assert_eq!(config.sample_dir(dir.path()), dir.path().join("audio"));
    }

    #[test]
    fn out_of_range_tempo_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{ "tempo": 1000 }"#);
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn interval_longer_than_lookahead_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{ "lookahead_secs": 0.05, "schedule_interval_ms": 80 }"#);
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn garbage_is_an_error_not_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "{ tempo: ");
        assert!(load_config(dir.path()).is_err());

        write_config(dir.path(), r#"{ "tracks": ["tabla"] }"#);
        assert!(load_config(dir.path()).is_err());
    }
}
