//! Top-level wiring: pick a pipeline, open the sink, start a source, and
//! drive the session until the source or the user ends it.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::info;
use motion_core::{ArmCommand, ArmPipeline, Pipeline, PointerCommand, PointerPipeline};

use crate::config::AppConfig;
use crate::replay::ReplaySampleSource;
use crate::serial::{open_sink, BoxedSink, SinkTarget};
use crate::session::{Control, Session, SessionStats};
use crate::source::{spawn_sample_source, SimSampleSource, SimInput, SourceHandle};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// Run options
// ════════════════════════════════════════════════════════════════════════════

/// Which actuator is on the other end of the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode { Pointer, Arm }

/// Where samples come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceKind {
    /// Mouse/keyboard simulation window.
    Sim,
    /// LeapMotion controller (needs the `leap` feature).
    Leap,
    /// Recorded CSV trace.
    Replay { trace: PathBuf, speed: f32 },
}

pub struct RunOptions {
    pub mode:   Mode,
    pub source: SourceKind,
    pub sink:   SinkTarget,
    pub config: AppConfig,
}

// ════════════════════════════════════════════════════════════════════════════
// Entry point
// ════════════════════════════════════════════════════════════════════════════

pub fn run(opts: RunOptions) -> Result<SessionStats> {
    let session_cfg = &opts.config.session;
    match opts.mode {
        Mode::Pointer => {
            let sink: BoxedSink<PointerCommand> = open_sink(&opts.sink)
                .with_context(|| format!("opening {}", opts.sink))?;
            let session = Session::new(PointerPipeline::new(&opts.config.pointer), sink, session_cfg);
            drive(session, &opts.source)
        }
        Mode::Arm => {
            let sink: BoxedSink<ArmCommand> = open_sink(&opts.sink)
                .with_context(|| format!("opening {}", opts.sink))?;
            let session = Session::new(ArmPipeline::new(&opts.config.arm), sink, session_cfg);
            drive(session, &opts.source)
        }
    }
}

type BoxedSession<P> = Session<P, BoxedSink<<P as Pipeline>::Command>>;

fn drive<P: Pipeline>(session: BoxedSession<P>, source: &SourceKind) -> Result<SessionStats> {
    match source {
        SourceKind::Sim => run_sim(session),
        SourceKind::Leap => {
            let handle = spawn_leap()?;
            Ok(run_headless(session, handle))
        }
        SourceKind::Replay { trace, speed } => {
            let replay = ReplaySampleSource::from_path(trace, *speed)
                .with_context(|| format!("loading trace {}", trace.display()))?;
            Ok(run_headless(session, spawn_sample_source(replay)))
        }
    }
}

#[cfg(feature = "leap")]
fn spawn_leap() -> Result<SourceHandle> {
    Ok(spawn_sample_source(crate::source::LeapSampleSource))
}

#[cfg(not(feature = "leap"))]
fn spawn_leap() -> Result<SourceHandle> {
    anyhow::bail!("this build has no LeapMotion support; rebuild with `--features leap`")
}

// ════════════════════════════════════════════════════════════════════════════
// Headless: hardware or replay, Enter quits
// ════════════════════════════════════════════════════════════════════════════

fn run_headless<P: Pipeline>(mut session: BoxedSession<P>, handle: SourceHandle) -> SessionStats {
    let quit = Arc::new(AtomicBool::new(false));
    spawn_enter_watcher(Arc::clone(&quit));
    println!("  Press Enter to quit.");

    session.run(&handle, &quit);
    session.finish(handle)
}

/// Raise `quit` when a line arrives on stdin. A closed stdin leaves the
/// session running until its source ends.
fn spawn_enter_watcher(quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let mut line = String::new();
        if let Ok(n) = io::stdin().lock().read_line(&mut line) {
            if n > 0 {
                info!("quit requested");
                quit.store(true, Ordering::Release);
            }
        }
    });
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation: window on the main thread
// ════════════════════════════════════════════════════════════════════════════

fn run_sim<P: Pipeline>(mut session: BoxedSession<P>) -> Result<SessionStats> {
    // ── Sim sample channel ────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    let handle = spawn_sample_source(SimSampleSource { rx: sim_rx });

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let title = format!("leap_actuator: {} simulation", session.pipeline().name());
    let mut vis = Visualizer::new(&title, sim_tx).context("opening simulation window")?;

    // ── Main loop ─────────────────────────────────────────────────────────
    'main: while vis.is_open() {
        // 1. Window input → SimInput
        if !vis.poll_input() { break; }

        // 2. Drain source events
        loop {
            match handle.try_recv() {
                Ok(evt) => {
                    if session.handle(evt) == Control::Quit { break 'main; }
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => break 'main,
            }
        }

        // 3. Scheduled commands
        session.tick();

        // 4. Render
        let status = status_line(session.pipeline().name(), session.stats());
        vis.render(&status, session.pipeline().click_pending());
    }

    Ok(session.finish(handle))
}

fn status_line(name: &str, s: SessionStats) -> String {
    format!("{} mode   frames {}   sent {}   failed {}", name, s.frames, s.sent, s.failed)
}
