mod shared;
mod audio_api;
mod audio;
mod config;
mod error;
mod loader;
mod sequencer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use loader::{LoadEvent, SampleLoader};
use sequencer::{Sequencer, TrackSet};

const LOAD_WAIT: Duration = Duration::from_secs(2);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config = config::load_config(&project_dir)?;

    let audio = audio::start_audio()?;

    let tracks = TrackSet::new();
    for piece in &config.tracks {
        tracks.add(Arc::new(piece.pattern()?));
    }

    // samples load in the background; tracks stay silent until theirs lands
    let loader = SampleLoader::new(audio.command_sender(), audio.sample_rate(), config.sample_dir(&project_dir));
    for pattern in tracks.snapshot() {
        loader.load(Arc::clone(pattern.sample()));
    }
    wait_for_loads(&loader, tracks.len());

    let sequencer = Sequencer::spawn(audio.sink(), audio.clock(), tracks.clone(), config.timing()?)?;
    sequencer.set_tempo(config.tempo)?;

    for pattern in tracks.snapshot() {
        log::info!("{:>8} {}", pattern.sample().name(), pattern.display_pattern());
    }

    sequencer.start()?;
    let tick_rate = Duration::from_millis(16); // ~60fps, same as a display would poll
    let until = Instant::now() + Duration::from_secs_f64(config.play_secs);
    let mut last_shown = None;
    while Instant::now() < until {
        let shown = sequencer.visual_index();
        if shown != last_shown {
            if shown == Some(0) {
                log::info!("bar");
            }
            log::debug!("step {shown:?}");
            last_shown = shown;
        }
        // late loads (or failures) still get reported while playing
        for event in loader.events().try_iter() {
            report(&event);
        }
        std::thread::sleep(tick_rate);
    }

    sequencer.stop()?;
    drop(sequencer);
    drop(audio);
    Ok(())
}

// give the loader a moment so the first bar isn't silent; anything slower joins in later
fn wait_for_loads(loader: &SampleLoader, expected: usize) {
    let deadline = Instant::now() + LOAD_WAIT;
    let mut seen = 0;
    while seen < expected {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match loader.events().recv_timeout(remaining) {
            Ok(event) => {
                report(&event);
                seen += 1;
            }
            Err(_) => {
                log::warn!("{} sample(s) still loading, starting anyway", expected - seen);
                break;
            }
        }
    }
}

fn report(event: &LoadEvent) {
    if let LoadEvent::Failed { name, .. } = event {
        log::warn!("track '{name}' will stay silent until its sample loads");
    }
}
