//! GameView: maps a `core::GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::GameSnapshot;
use crate::effects::{EffectLayer, BURST_MS, POPUP_MS};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::layout::{Layout, Viewport, PANEL_COLS};
use crate::types::{SessionPhase, SlimeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

const PLAY_BG: Rgb = Rgb::new(24, 26, 36);
const PANEL_BG: Rgb = Rgb::new(0, 0, 0);

/// A lightweight terminal renderer for the slime session.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameView;

impl GameView {
    pub fn new() -> Self {
        Self
    }

    /// Layout used for a viewport. Shared with the runner so mouse cells map
    /// back to the same play-area pixels that were drawn.
    pub fn layout(&self, snap: &GameSnapshot, viewport: Viewport) -> Option<Layout> {
        Layout::fit(
            viewport,
            snap.play_area_width,
            snap.play_area_height,
            PANEL_COLS,
        )
    }

    /// Render the snapshot into an existing framebuffer.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        self.render_into_with(snap, None, None, viewport, fb);
    }

    pub fn render_into_with(
        &self,
        snap: &GameSnapshot,
        effects: Option<&EffectLayer>,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let Some(layout) = self.layout(snap, viewport) else {
            fb.put_str(0, 0, "terminal too small", CellStyle::default());
            return;
        };

        let bg = CellStyle::new(Rgb::new(60, 60, 70), PLAY_BG);
        fb.fill_rect(
            layout.interior_x(),
            layout.interior_y(),
            layout.cols,
            layout.rows,
            ' ',
            bg,
        );

        let border = match effects.and_then(EffectLayer::flash) {
            Some(f) if f.negative => CellStyle::new(Rgb::new(240, 80, 80), PANEL_BG).bold(),
            Some(_) => CellStyle::new(Rgb::new(255, 215, 90), PANEL_BG).bold(),
            None => CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG),
        };
        draw_border(
            fb,
            layout.origin_x,
            layout.origin_y,
            layout.frame_w(),
            layout.frame_h(),
            border,
        );

        for d in &snap.drops {
            draw_slime(fb, &layout, d.kind, d.x, d.y, d.footprint);
        }

        if let Some(fx) = effects {
            draw_effects(fb, &layout, fx);
        }

        self.draw_side_panel(fb, snap, adapter, viewport, &layout);

        match snap.phase {
            SessionPhase::Idle => {
                draw_overlay_lines(fb, &layout, &[("SLIME TAP", None), ("S TO START", None)]);
            }
            SessionPhase::Finished => match effects.and_then(EffectLayer::overlay) {
                Some(result) => draw_overlay_lines(
                    fb,
                    &layout,
                    &[
                        ("TIME UP", None),
                        ("SCORE ", Some(result.final_score)),
                        ("BEST STREAK ", Some(result.best_streak)),
                        ("A AGAIN  C CLOSE", None),
                    ],
                ),
                None => draw_overlay_lines(fb, &layout, &[("TIME UP", None)]),
            },
            SessionPhase::Running => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        layout: &Layout,
    ) {
        let panel_x = layout
            .origin_x
            .saturating_add(layout.frame_w())
            .saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }

        let label = CellStyle::new(Rgb::new(220, 220, 220), PANEL_BG).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);

        let mut y = layout.origin_y;
        fb.put_str(panel_x, y, "SCORE", label);
        fb.put_u32(panel_x, y + 1, snap.score, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "STREAK", label);
        fb.put_u32(panel_x, y + 1, snap.streak, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "BEST", label);
        fb.put_u32(panel_x, y + 1, snap.best_streak, value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "TIME", label);
        let time_style = if snap.running() && snap.time_remaining_ms <= 5_000 {
            CellStyle::new(Rgb::new(240, 100, 90), PANEL_BG).bold()
        } else {
            value
        };
        fb.put_secs_tenths(panel_x, y + 1, snap.time_remaining_ms, time_style);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "STATE", label);
        fb.put_str(panel_x, y + 1, snap.phase.as_str(), value);
        y = y.saturating_add(3);

        fb.put_str(panel_x, y, "AI", label);
        y = y.saturating_add(1);
        match adapter {
            Some(st) if st.enabled => {
                fb.put_str(panel_x, y, "C", value);
                fb.put_u32(panel_x + 2, y, st.client_count as u32, value);
                fb.put_str(panel_x + 6, y, "S", value);
                fb.put_u32(panel_x + 8, y, st.streaming_count as u32, value);
                y = y.saturating_add(1);
                fb.put_str(panel_x, y, "CTRL", value);
                if let Some(id) = st.controller_id {
                    fb.put_u32(panel_x + 5, y, id as u32, value);
                } else {
                    fb.put_str(panel_x + 5, y, "-", value);
                }
            }
            _ => {
                fb.put_str(panel_x, y, "OFF", value);
            }
        }
    }
}

pub fn slime_color(kind: SlimeKind) -> Rgb {
    match kind {
        SlimeKind::Green => Rgb::new(100, 220, 120),
        SlimeKind::Yellow => Rgb::new(240, 220, 80),
        SlimeKind::Red => Rgb::new(230, 80, 80),
        SlimeKind::Blue => Rgb::new(80, 140, 230),
        SlimeKind::Purple => Rgb::new(180, 110, 220),
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

/// Body fill with two eyes on the middle row. Clipped to the play area.
fn draw_slime(fb: &mut FrameBuffer, layout: &Layout, kind: SlimeKind, x: f64, y: f64, footprint: f64) {
    let body = CellStyle::new(slime_color(kind), PLAY_BG).bold();
    let face = CellStyle::new(Rgb::new(20, 20, 20), slime_color(kind)).bold();

    let c0 = layout.col_of(x);
    let c1 = layout.col_of(x + footprint).max(c0 + 1);
    let r0 = layout.row_of(y);
    let r1 = layout.row_of(y + footprint).max(r0 + 1);
    let eye_row = r0 + (r1 - r0) / 2;
    let w = c1 - c0;

    for row in r0..r1 {
        for col in c0..c1 {
            let Some((sx, sy)) = layout.screen(col, row) else {
                continue;
            };
            let dx = col - c0;
            if row == eye_row && w >= 3 && (dx == w / 3 || dx == w - 1 - w / 3) {
                fb.put_char(sx, sy, '•', face);
            } else {
                fb.put_char(sx, sy, '█', body);
            }
        }
    }
}

fn draw_effects(fb: &mut FrameBuffer, layout: &Layout, fx: &EffectLayer) {
    for b in fx.bursts() {
        let style = CellStyle::new(slime_color(b.kind), PLAY_BG).bold();
        let col = layout.col_of(b.x);
        if b.miss {
            // Escaped below the bottom edge; mark where it left.
            if let Some((sx, sy)) = layout.screen(col.clamp(0, layout.cols as i32 - 1), layout.rows as i32 - 1) {
                fb.put_char(sx, sy, '×', style.dim());
            }
            continue;
        }
        let row = layout.row_of(b.y);
        let spread = 1 + (fx.age(b.born_ms, BURST_MS) * 3.0) as i32;
        for (dc, dr) in [(-spread, 0), (spread, 0), (0, -spread), (0, spread)] {
            if let Some((sx, sy)) = layout.screen(col + dc * 2, row + dr) {
                fb.put_char(sx, sy, '*', style);
            }
        }
    }

    for p in fx.popups() {
        let rise = (fx.age(p.born_ms, POPUP_MS) * 3.0) as i32;
        let col = layout.col_of(p.x);
        let row = layout.row_of(p.y) - 1 - rise;
        let Some((sx, sy)) = layout.screen(col.max(0), row.max(0)) else {
            continue;
        };
        let fg = if p.points < 0 {
            Rgb::new(240, 90, 90)
        } else if p.critical {
            Rgb::new(255, 200, 60)
        } else {
            Rgb::new(230, 230, 230)
        };
        fb.put_signed(sx, sy, p.points, CellStyle::new(fg, PLAY_BG).bold());
    }
}

/// Centered lines over the play area. A line may carry a trailing number.
fn draw_overlay_lines(fb: &mut FrameBuffer, layout: &Layout, lines: &[(&str, Option<u32>)]) {
    let style = CellStyle::new(Rgb::new(255, 255, 255), PANEL_BG).bold();
    let n = lines.len() as u16;
    let top = layout
        .interior_y()
        .saturating_add(layout.rows.saturating_sub(n * 2) / 2);

    for (i, (text, num)) in lines.iter().enumerate() {
        let digits = num.map_or(0, decimal_width);
        let w = text.chars().count() as u16 + digits;
        let x = layout
            .interior_x()
            .saturating_add(layout.cols.saturating_sub(w) / 2);
        let y = top.saturating_add(i as u16 * 2);
        let end = fb.put_str(x, y, text, style);
        if let Some(v) = num {
            fb.put_u32(end, y, *v, style);
        }
    }
}

fn decimal_width(mut v: u32) -> u16 {
    let mut n = 1;
    while v >= 10 {
        v /= 10;
        n += 1;
    }
    n
}
