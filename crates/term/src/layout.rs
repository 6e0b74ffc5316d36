//! Mapping between terminal cells and play-area pixels.
//!
//! A terminal cell is roughly twice as tall as it is wide, so one row covers
//! about twice the play-area pixels of one column.

/// Rows are this many times taller than columns.
pub const CELL_ASPECT: f64 = 2.0;

/// Columns reserved to the right of the play area for the HUD.
pub const PANEL_COLS: u16 = 18;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Placement of the play area inside a viewport.
///
/// `origin_x`/`origin_y` is the top-left corner of the border; the interior
/// starts one cell in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub origin_x: u16,
    pub origin_y: u16,
    pub cols: u16,
    pub rows: u16,
    pub px_per_col: f64,
    pub px_per_row: f64,
}

impl Layout {
    /// Fit a `play_w x play_h` area into the viewport, leaving `reserve_cols`
    /// for a side panel. `None` when the viewport is too small for a border.
    pub fn fit(viewport: Viewport, play_w: f64, play_h: f64, reserve_cols: u16) -> Option<Self> {
        let avail_w = viewport.width.saturating_sub(reserve_cols.saturating_add(2));
        let avail_h = viewport.height.saturating_sub(2);
        if avail_w == 0 || avail_h == 0 || play_w <= 0.0 || play_h <= 0.0 {
            return None;
        }

        let scale = (play_w / avail_w as f64).max(play_h / (CELL_ASPECT * avail_h as f64));
        let cols = ((play_w / scale).floor() as u16).clamp(1, avail_w);
        let rows = ((play_h / (CELL_ASPECT * scale)).floor() as u16).clamp(1, avail_h);

        let frame_w = cols + 2;
        let frame_h = rows + 2;
        let block_w = frame_w.saturating_add(reserve_cols);

        Some(Self {
            origin_x: viewport.width.saturating_sub(block_w) / 2,
            origin_y: viewport.height.saturating_sub(frame_h) / 2,
            cols,
            rows,
            px_per_col: play_w / cols as f64,
            px_per_row: play_h / rows as f64,
        })
    }

    pub fn frame_w(&self) -> u16 {
        self.cols + 2
    }

    pub fn frame_h(&self) -> u16 {
        self.rows + 2
    }

    pub fn interior_x(&self) -> u16 {
        self.origin_x + 1
    }

    pub fn interior_y(&self) -> u16 {
        self.origin_y + 1
    }

    /// Play-area point at the center of a terminal cell, if the cell is inside
    /// the play area.
    pub fn cell_to_play(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let cx = column.checked_sub(self.interior_x())?;
        let cy = row.checked_sub(self.interior_y())?;
        if cx >= self.cols || cy >= self.rows {
            return None;
        }
        Some((
            (cx as f64 + 0.5) * self.px_per_col,
            (cy as f64 + 0.5) * self.px_per_row,
        ))
    }

    /// Interior column for a play-area x. May be outside `0..cols`.
    pub fn col_of(&self, x: f64) -> i32 {
        (x / self.px_per_col).floor() as i32
    }

    /// Interior row for a play-area y. May be outside `0..rows`.
    pub fn row_of(&self, y: f64) -> i32 {
        (y / self.px_per_row).floor() as i32
    }

    /// Absolute terminal position of an interior cell, if visible.
    pub fn screen(&self, col: i32, row: i32) -> Option<(u16, u16)> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        Some((self.interior_x() + col as u16, self.interior_y() + row as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_inside_viewport_with_panel() {
        let vp = Viewport::new(100, 40);
        let l = Layout::fit(vp, 480.0, 800.0, PANEL_COLS).unwrap();
        assert!(l.origin_x + l.frame_w() + PANEL_COLS <= vp.width);
        assert!(l.origin_y + l.frame_h() <= vp.height);
        // Roughly preserves the play-area aspect.
        let w_px = l.cols as f64 * 1.0;
        let h_px = l.rows as f64 * CELL_ASPECT;
        assert!((w_px / h_px - 0.6).abs() < 0.1);
    }

    #[test]
    fn tiny_viewport_has_no_layout() {
        assert!(Layout::fit(Viewport::new(10, 2), 480.0, 800.0, PANEL_COLS).is_none());
    }

    #[test]
    fn cell_centers_round_trip() {
        let l = Layout::fit(Viewport::new(80, 24), 480.0, 800.0, PANEL_COLS).unwrap();
        for col in 0..l.cols {
            for row in 0..l.rows {
                let (x, y) = l
                    .cell_to_play(l.interior_x() + col, l.interior_y() + row)
                    .unwrap();
                assert_eq!(l.col_of(x), col as i32);
                assert_eq!(l.row_of(y), row as i32);
            }
        }
    }

    #[test]
    fn border_and_outside_cells_are_not_play_area() {
        let l = Layout::fit(Viewport::new(80, 24), 480.0, 800.0, PANEL_COLS).unwrap();
        assert!(l.cell_to_play(l.origin_x, l.interior_y()).is_none());
        assert!(l.cell_to_play(l.interior_x(), l.origin_y).is_none());
        assert!(l
            .cell_to_play(l.interior_x() + l.cols, l.interior_y())
            .is_none());
        assert!(l.screen(-1, 0).is_none());
        assert!(l.screen(0, l.rows as i32).is_none());
    }
}
