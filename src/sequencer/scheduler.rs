//! The thread that keeps the transport fed.
//!
//! It owns the [`Transport`] outright. Front-end calls become commands on a
//! channel, and the wait on that channel doubles as the re-arm timer: every
//! `schedule_interval` it runs one lookahead pass, and in between it fires the
//! deferred visual updates as their wall-clock deadlines come up.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use atomic_float::AtomicF64;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::clock::{self, Timing};
use super::track_set::TrackSet;
use super::transport::Transport;
use crate::audio_api::{DeviceClock, PlaybackSink};
use crate::error::{Result, SequencerError};
use crate::shared::{DEFAULT_TEMPO, NO_VISUAL_STEP};

#[derive(Debug)]
enum Command {
    Start,
    Stop,
    SetTempo(f64),
    Shutdown,
}

// what the front-end can read without talking to the worker
#[derive(Debug)]
struct Published {
    playing: AtomicBool,
    visual_index: AtomicI32,
    current_index: AtomicUsize,
    tempo: AtomicF64,
}

impl Published {
    fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            visual_index: AtomicI32::new(NO_VISUAL_STEP),
            current_index: AtomicUsize::new(0),
            tempo: AtomicF64::new(DEFAULT_TEMPO),
        }
    }

    fn sync(&self, transport: &Transport) {
        self.playing.store(transport.is_playing(), Ordering::Release);
        self.visual_index.store(transport.visual_index(), Ordering::Release);
        self.current_index.store(transport.current_index(), Ordering::Release);
        self.tempo.store(transport.tempo(), Ordering::Release);
    }
}

/// Handle to a running scheduler. Dropping it stops playback and joins the
/// worker thread.
pub struct Sequencer {
    tx: Sender<Command>,
    published: Arc<Published>,
    tracks: TrackSet,
    thread: Option<JoinHandle<()>>,
}

impl Sequencer {
    pub fn spawn<S, C>(sink: S, clock: C, tracks: TrackSet, timing: Timing) -> anyhow::Result<Self>
    where
        S: PlaybackSink + 'static,
        C: DeviceClock + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let published = Arc::new(Published::new());

        let worker = Worker::new(timing, tracks.clone(), sink, clock, rx, Arc::clone(&published));
        let thread = thread::Builder::new()
            .name("drumloop-scheduler".into())
            .spawn(move || worker.run())?;

        Ok(Self { tx, published, tracks, thread: Some(thread) })
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    // starting twice is harmless, the worker ignores the second one
    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Validated here, so a bad value never reaches the worker.
    pub fn set_tempo(&self, tempo: f64) -> Result<()> {
        let tempo = clock::validate_tempo(tempo)?;
        self.send(Command::SetTempo(tempo))
    }

    pub fn is_playing(&self) -> bool {
        self.published.playing.load(Ordering::Acquire)
    }

    pub fn tempo(&self) -> f64 {
        self.published.tempo.load(Ordering::Acquire)
    }

    /// The step the listener is hearing right now, if any has sounded yet.
    pub fn visual_index(&self) -> Option<usize> {
        usize::try_from(self.published.visual_index.load(Ordering::Acquire)).ok()
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.visual_index() == Some(index)
    }

    // next step the scheduler will hand out
    pub fn current_index(&self) -> usize {
        self.published.current_index.load(Ordering::Acquire)
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).map_err(|_| SequencerError::SchedulerGone)
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("scheduler thread panicked");
            }
        }
    }
}

struct Worker<S, C> {
    transport: Transport,
    tracks: TrackSet,
    sink: S,
    clock: C,
    rx: Receiver<Command>,
    published: Arc<Published>,
    // wall-clock deadlines for pending visual updates, oldest first
    visual_due: VecDeque<Instant>,
    next_pass: Option<Instant>, // None while stopped, nothing re-arms
}

impl<S: PlaybackSink, C: DeviceClock> Worker<S, C> {
    fn new(
        timing: Timing,
        tracks: TrackSet,
        sink: S,
        clock: C,
        rx: Receiver<Command>,
        published: Arc<Published>,
    ) -> Self {
        Self {
            transport: Transport::new(timing),
            tracks,
            sink,
            clock,
            rx,
            published,
            visual_due: VecDeque::new(),
            next_pass: None,
        }
    }

    fn run(mut self) {
        log::debug!("scheduler thread up");
        loop {
            let received = match self.next_deadline() {
                Some(deadline) => self.rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.fire_visual_updates(Instant::now());
            if self.next_pass.is_some_and(|at| Instant::now() >= at) {
                self.pass();
            }
            self.published.sync(&self.transport);
        }

        self.transport.stop();
        self.published.sync(&self.transport);
        log::debug!("scheduler thread down");
    }

    fn next_deadline(&self) -> Option<Instant> {
        match (self.next_pass, self.visual_due.front()) {
            (Some(a), Some(&b)) => Some(a.min(b)),
            (a, b) => a.or(b.copied()),
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start => {
                if self.transport.start(self.clock.current_time()) {
                    log::info!(
                        "transport started at step {} ({} bpm)",
                        self.transport.current_index(),
                        self.transport.tempo()
                    );
                    self.pass();
                } else {
                    log::debug!("start ignored, already playing");
                }
            }
            Command::Stop => {
                if self.transport.is_playing() {
                    log::info!("transport stopped at step {}", self.transport.current_index());
                }
                self.transport.stop();
                self.next_pass = None;
            }
            Command::SetTempo(tempo) => {
                // already validated by the handle
                if let Err(e) = self.transport.set_tempo(tempo) {
                    log::warn!("{e}");
                } else {
                    log::info!("tempo set to {tempo} bpm");
                }
            }
            Command::Shutdown => {}
        }
    }

    // one lookahead pass, then re-arm
    fn pass(&mut self) {
        let wall_now = Instant::now();
        let device_now = self.clock.current_time();
        let steps = {
            let tracks = self.tracks.read();
            self.transport.schedule(device_now, &tracks, &self.sink)
        };

        for step in steps {
            let due = wall_now + Duration::from_secs_f64(step.delay_secs);
            // the device clock can run ahead of the wall clock; keep the queue monotonic
            let due = self.visual_due.back().map_or(due, |&last| due.max(last));
            self.visual_due.push_back(due);
        }

        self.next_pass = if self.transport.is_playing() {
            Some(wall_now + self.transport.timing().schedule_interval())
        } else {
            None
        };
    }

    fn fire_visual_updates(&mut self, now: Instant) {
        while self.visual_due.front().is_some_and(|&due| due <= now) {
            self.visual_due.pop_front();
            self.transport.advance_visual();
        }
    }
}
