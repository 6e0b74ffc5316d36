//! Framebuffer and style types for terminal rendering.

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Minimal per-cell styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub dim: bool,
}

impl CellStyle {
    pub const fn new(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            dim: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn cell(self, ch: char) -> Cell {
        Cell { ch, style: self }
    }
}

impl Default for CellStyle {
    fn default() -> Self {
        Self::new(Rgb::new(220, 220, 220), Rgb::new(0, 0, 0))
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: CellStyle::default(),
        }
    }
}

/// 2D framebuffer of styled character cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize in place, keeping the allocation when it is large enough.
    pub fn resize(&mut self, width: u16, height: u16) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        let len = (width as usize) * (height as usize);
        self.cells.resize(len, Cell::default());
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline(always)]
    fn idx(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.idx(x, y).map(|i| self.cells[i])
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = cell;
        }
    }

    pub fn clear(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    pub fn put_char(&mut self, x: u16, y: u16, ch: char, style: CellStyle) {
        self.set(x, y, Cell { ch, style });
    }

    /// Write a string, clipped at the right edge. Returns the column after the
    /// last written char.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, style: CellStyle) -> u16 {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.put_char(cx, y, ch, style);
            cx += 1;
        }
        cx
    }

    /// Write an unsigned number without allocating.
    pub fn put_u32(&mut self, x: u16, y: u16, mut v: u32, style: CellStyle) -> u16 {
        let mut digits = [0u8; 10];
        let mut n = 0;
        loop {
            digits[n] = b'0' + (v % 10) as u8;
            n += 1;
            v /= 10;
            if v == 0 {
                break;
            }
        }
        let mut cx = x;
        for i in (0..n).rev() {
            self.put_char(cx, y, digits[i] as char, style);
            cx = cx.saturating_add(1);
        }
        cx
    }

    /// Write a number with an explicit sign (`+10`, `-30`).
    pub fn put_signed(&mut self, x: u16, y: u16, v: i32, style: CellStyle) -> u16 {
        let sign = if v < 0 { '-' } else { '+' };
        self.put_char(x, y, sign, style);
        self.put_u32(x.saturating_add(1), y, v.unsigned_abs(), style)
    }

    /// Milliseconds as seconds with one decimal (`12.3`).
    pub fn put_secs_tenths(&mut self, x: u16, y: u16, ms: u32, style: CellStyle) -> u16 {
        let cx = self.put_u32(x, y, ms / 1000, style);
        self.put_char(cx, y, '.', style);
        self.put_u32(cx.saturating_add(1), y, (ms % 1000) / 100, style)
    }

    pub fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, ch: char, style: CellStyle) {
        for dy in 0..h {
            for dx in 0..w {
                self.put_char(x.saturating_add(dx), y.saturating_add(dy), ch, style);
            }
        }
    }

    /// Row of text as a `String`. Test helper.
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.get(x, y))
            .map(|c| c.ch)
            .collect()
    }

    /// Whole buffer as newline-separated text. Test helper.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for y in 0..self.height {
            out.push_str(&self.row_text(y));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_render_without_padding() {
        let mut fb = FrameBuffer::new(12, 1);
        let style = CellStyle::default();
        let end = fb.put_u32(0, 0, 1205, style);
        assert_eq!(end, 4);
        fb.put_signed(5, 0, -30, style);
        assert_eq!(fb.row_text(0), "1205 -30    ");
    }

    #[test]
    fn seconds_with_tenths() {
        let mut fb = FrameBuffer::new(6, 1);
        fb.put_secs_tenths(0, 0, 19_900, CellStyle::default());
        assert_eq!(fb.row_text(0), "19.9  ");
        fb.clear(Cell::default());
        fb.put_secs_tenths(0, 0, 50, CellStyle::default());
        assert_eq!(fb.row_text(0), "0.0   ");
    }

    #[test]
    fn writes_clip_at_edges() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(1, 0, "abcdef", CellStyle::default());
        fb.put_char(9, 9, 'x', CellStyle::default());
        assert_eq!(fb.row_text(0), " ab");
    }
}
