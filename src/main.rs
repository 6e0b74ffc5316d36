//! Terminal slime-tap runner (default binary).
//!
//! Uses crossterm for input and the framebuffer renderer from `slime_tap::term`.
//! The session advances on real elapsed time; an optional TCP adapter lets a
//! remote client drive and watch it.

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use slime_tap::adapter::{apply_inbound, Adapter, FeedbackTap, ObservationPacer, OutboundMessage, StatusSnapshot};
use slime_tap::core::{GameSnapshot, Session, SessionConfig};
use slime_tap::input::{handle_key_event, handle_mouse_event, should_quit};
use slime_tap::term::{AdapterStatusView, EffectLayer, FrameBuffer, GameView, RenderThrottle, TerminalRenderer, Viewport};
use slime_tap::types::{GameAction, SessionPhase, FRAME_MS};

/// Static screens still redraw this often.
const STATIC_REDRAW_MS: u64 = 250;
const OBSERVATION_MIN_MS: u64 = 50;
const OBSERVATION_KEEPALIVE_MS: u64 = 1_000;

fn main() -> Result<()> {
    init_tracing()?;

    let mut config = SessionConfig::from_env().context("invalid session configuration")?;
    if std::env::var_os("SLIME_SEED").is_none() {
        config.seed = clock_seed();
    }

    let adapter = match Adapter::start_from_env() {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!(error = %e, "adapter unavailable, continuing without it");
            None
        }
    };
    if let Some(a) = adapter.as_ref() {
        info!(addr = %a.local_addr(), "adapter ready");
    }

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, config, adapter);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Log to `SLIME_LOG_PATH` when set. Without it nothing is installed, so the
/// terminal UI stays clean.
fn init_tracing() -> Result<()> {
    let Some(path) = std::env::var_os("SLIME_LOG_PATH") else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.to_string_lossy()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn clock_seed() -> u32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    (nanos as u32) ^ ((nanos >> 32) as u32)
}

fn status_view(st: StatusSnapshot) -> AdapterStatusView {
    AdapterStatusView {
        enabled: true,
        client_count: st.client_count.min(u16::MAX as usize) as u16,
        controller_id: st.controller_id,
        streaming_count: st.streaming_count.min(u16::MAX as usize) as u16,
    }
}

fn run(term: &mut TerminalRenderer, config: SessionConfig, mut adapter: Option<Adapter>) -> Result<()> {
    let mut session = Session::new(config)?;
    let mut collab = FeedbackTap::new(EffectLayer::new());

    let view = GameView::new();
    let mut fb = FrameBuffer::new(0, 0);
    let mut snap = GameSnapshot::default();
    let mut throttle = RenderThrottle::new(STATIC_REDRAW_MS);
    let mut pacer = ObservationPacer::new(OBSERVATION_MIN_MS, OBSERVATION_KEEPALIVE_MS);

    let clock = Instant::now();
    let frame = Duration::from_millis(FRAME_MS as u64);
    let mut simulated_ms: u64 = 0;

    loop {
        let now_ms = clock.elapsed().as_millis() as u64;
        collab.inner.tick(now_ms);
        session.snapshot_into(&mut snap);

        // The result overlay belongs to a finished session only.
        if snap.phase != SessionPhase::Finished && collab.inner.overlay().is_some() {
            collab.inner.close_overlay();
        }

        // Render.
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(w, h);
        let status = adapter.as_ref().map(|a| status_view(a.status()));
        let is_static = !snap.running() && !collab.inner.is_animating();
        let fingerprint = frame_fingerprint(&snap, collab.inner.overlay().is_some(), status, viewport);
        if throttle.should_render(now_ms, fingerprint, is_static) {
            view.render_into_with(&snap, Some(&collab.inner), status.as_ref(), viewport, &mut fb);
            term.draw_swap(&mut fb)?;
        }

        // Input with timeout until the next frame.
        let timeout = Duration::from_millis(simulated_ms + FRAME_MS as u64)
            .saturating_sub(clock.elapsed())
            .min(frame);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    match handle_key_event(key) {
                        Some(GameAction::CloseOverlay) => collab.inner.close_overlay(),
                        Some(action) => {
                            session.apply_action(action, &mut collab);
                        }
                        None => {}
                    }
                }
                Event::Mouse(mouse) => {
                    let point = handle_mouse_event(mouse).and_then(|cell| {
                        view.layout(&snap, viewport)
                            .and_then(|l| l.cell_to_play(cell.column, cell.row))
                    });
                    if let Some((x, y)) = point {
                        session.tap_at(x, y, &mut collab);
                    }
                }
                Event::Resize(..) => {
                    term.invalidate();
                    throttle.invalidate();
                }
                _ => {}
            }
        }

        // Remote commands.
        if let Some(a) = adapter.as_mut() {
            while let Some(cmd) = a.try_recv() {
                let seq = pacer.next_seq();
                let reply = apply_inbound(&mut session, &cmd, &mut collab, seq);
                a.send(reply);
            }
        }

        // Advance the session to wall-clock time.
        let target_ms = clock.elapsed().as_millis() as u64;
        if target_ms >= simulated_ms + FRAME_MS as u64 {
            let step = (target_ms - simulated_ms).min(u32::MAX as u64) as u32;
            session.advance(step, &mut collab);
            simulated_ms += step as u64;
        }

        // Stream feedback and observations.
        collab.flush(adapter.as_ref(), &mut pacer);
        if let Some(a) = adapter.as_ref() {
            session.snapshot_into(&mut snap);
            if let Some(obs) = pacer.poll(target_ms, &snap) {
                a.send(OutboundMessage::BroadcastObservation { obs });
            }
        }
    }
}

fn frame_fingerprint(
    snap: &GameSnapshot,
    overlay: bool,
    status: Option<AdapterStatusView>,
    viewport: Viewport,
) -> u64 {
    let mut h = snap.fingerprint();
    let mut mix = |v: u64| {
        h ^= v;
        h = h.wrapping_mul(0x100000001b3);
    };
    mix(overlay as u64);
    mix(((viewport.width as u64) << 16) | viewport.height as u64);
    if let Some(st) = status {
        mix(st.client_count as u64);
        mix(st.streaming_count as u64);
        mix(st.controller_id.map_or(0, |id| id as u64 + 1));
    }
    h
}
