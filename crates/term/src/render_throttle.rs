//! Frame pacing for the terminal runner.
//!
//! While the session is running, or an effect is animating, every frame is
//! drawn. Otherwise the screen is static and only redrawn when the snapshot
//! fingerprint changes, plus a slow keep-alive redraw.

#[derive(Debug, Clone)]
pub struct RenderThrottle {
    keepalive_ms: u64,
    last: Option<Drawn>,
}

#[derive(Debug, Clone, Copy)]
struct Drawn {
    at_ms: u64,
    fingerprint: u64,
}

impl RenderThrottle {
    pub fn new(keepalive_ms: u64) -> Self {
        Self {
            keepalive_ms,
            last: None,
        }
    }

    /// Decide whether to draw now, and record the draw if so.
    pub fn should_render(&mut self, now_ms: u64, fingerprint: u64, is_static: bool) -> bool {
        let draw = match self.last {
            None => true,
            Some(_) if !is_static => true,
            Some(prev) => {
                prev.fingerprint != fingerprint
                    || now_ms.saturating_sub(prev.at_ms) >= self.keepalive_ms
            }
        };
        if draw {
            self.last = Some(Drawn {
                at_ms: now_ms,
                fingerprint,
            });
        }
        draw
    }

    /// Forget the last draw so the next call always renders.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}
