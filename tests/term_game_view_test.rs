use slime_tap::core::{GameSnapshot, NullCollaborators, Session, SessionConfig};
use slime_tap::term::{AdapterStatusView, EffectLayer, FrameBuffer, GameView, Viewport};
use slime_tap::types::{SessionPhase, SlimeKind};

fn quiet_session() -> Session {
    Session::new(SessionConfig {
        spawn_interval_ms: 1_000_000,
        ..SessionConfig::default()
    })
    .unwrap()
}

#[test]
fn term_view_renders_border_corners_at_layout_origin() {
    let snap = quiet_session().snapshot();
    let view = GameView::default();
    let vp = Viewport::new(100, 40);
    let fb = view.render(&snap, vp);
    let l = view.layout(&snap, vp).unwrap();

    let right = l.origin_x + l.frame_w() - 1;
    let bottom = l.origin_y + l.frame_h() - 1;
    assert_eq!(fb.get(l.origin_x, l.origin_y).unwrap().ch, '┌');
    assert_eq!(fb.get(right, l.origin_y).unwrap().ch, '┐');
    assert_eq!(fb.get(l.origin_x, bottom).unwrap().ch, '└');
    assert_eq!(fb.get(right, bottom).unwrap().ch, '┘');
}

#[test]
fn term_view_idle_shows_title_and_prompt() {
    let snap = quiet_session().snapshot();
    let fb = GameView::new().render(&snap, Viewport::new(100, 40));
    let all = fb.text();

    assert!(all.contains("SLIME TAP"));
    assert!(all.contains("S TO START"));
    assert!(all.contains("idle"));
}

#[test]
fn term_view_side_panel_shows_hud() {
    let mut s = quiet_session();
    let mut c = NullCollaborators;
    s.start(&mut c);
    let id = s.spawn_kind(SlimeKind::Red, &mut c).unwrap();
    s.tap(id, 0.0, 0.0, &mut c);
    s.advance(1_500, &mut c);

    let fb = GameView::new().render(&s.snapshot(), Viewport::new(100, 40));
    let all = fb.text();
    assert!(all.contains("SCORE"));
    assert!(all.contains("50"));
    assert!(all.contains("STREAK"));
    assert!(all.contains("18.5"));
    assert!(all.contains("running"));
    assert!(all.contains("OFF"));
}

#[test]
fn term_view_shows_adapter_status_when_enabled() {
    let snap = quiet_session().snapshot();
    let adapter = AdapterStatusView {
        enabled: true,
        client_count: 2,
        controller_id: Some(7),
        streaming_count: 1,
    };
    let mut fb = FrameBuffer::new(0, 0);
    GameView::new().render_into_with(&snap, None, Some(&adapter), Viewport::new(100, 40), &mut fb);

    let all = fb.text();
    assert!(all.contains("CTRL 7"));
    assert!(!all.contains("OFF"));
}

#[test]
fn term_view_draws_visible_drop_and_maps_click_back() {
    let mut s = quiet_session();
    let mut c = NullCollaborators;
    s.start(&mut c);
    let id = s.spawn_kind(SlimeKind::Green, &mut c).unwrap();
    while s.drops().get(id).is_some_and(|d| d.y < 200.0) {
        s.advance(16, &mut c);
    }

    let view = GameView::new();
    let vp = Viewport::new(100, 40);
    let snap = s.snapshot();
    let fb = view.render(&snap, vp);
    let l = view.layout(&snap, vp).unwrap();

    let d = snap.drops[0];
    let (cx, cy) = (d.x + d.footprint / 2.0, d.y + d.footprint / 2.0);
    let (sx, sy) = l.screen(l.col_of(cx), l.row_of(cy)).unwrap();
    let ch = fb.get(sx, sy).unwrap().ch;
    assert!(ch == '█' || ch == '•', "unexpected glyph {ch:?}");

    let (px, py) = l.cell_to_play(sx, sy).unwrap();
    let hit = s.tap_at(px, py, &mut c);
    assert_eq!(hit.map(|h| h.points), Some(10));
}

#[test]
fn term_view_result_overlay_until_closed() {
    let mut s = quiet_session();
    let mut fx = EffectLayer::new();
    s.start(&mut fx);
    let id = s.spawn_kind(SlimeKind::Yellow, &mut fx).unwrap();
    s.tap(id, 0.0, 0.0, &mut fx);
    s.advance(20_000, &mut fx);
    assert_eq!(s.phase(), SessionPhase::Finished);

    let view = GameView::new();
    let vp = Viewport::new(100, 40);
    let snap: GameSnapshot = s.snapshot();
    let mut fb = FrameBuffer::new(0, 0);

    view.render_into_with(&snap, Some(&fx), None, vp, &mut fb);
    let all = fb.text();
    assert!(all.contains("TIME UP"));
    assert!(all.contains("SCORE 30"));
    assert!(all.contains("BEST STREAK 1"));

    fx.close_overlay();
    view.render_into_with(&snap, Some(&fx), None, vp, &mut fb);
    let all = fb.text();
    assert!(all.contains("TIME UP"));
    assert!(!all.contains("SCORE 30"));
    assert_eq!(s.phase(), SessionPhase::Finished);
}

#[test]
fn term_view_reports_tiny_viewport() {
    let snap = quiet_session().snapshot();
    let fb = GameView::new().render(&snap, Viewport::new(30, 2));
    assert!(fb.row_text(0).starts_with("terminal too"));
}
