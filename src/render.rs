use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use image::{Rgb, RgbImage};
use std::io::{self, Write};

/* -----------------------------
   Colours and the drawing contract
------------------------------ */

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Pixel {
    pub(crate) const BLACK: Pixel = Pixel::rgb(0x00, 0x00, 0x00);
    pub(crate) const WHITE: Pixel = Pixel::rgb(0xFF, 0xFF, 0xFF);
    /// Venus
    pub(crate) const LIGHT_YELLOW: Pixel = Pixel::rgb(0xFF, 0xFF, 0xCF);
    /// Earth
    pub(crate) const LIGHT_CYAN: Pixel = Pixel::rgb(0xCF, 0xFF, 0xFF);
    /// Sun
    pub(crate) const PURE_YELLOW: Pixel = Pixel::rgb(0xFF, 0xFF, 0x00);

    pub(crate) const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn luma(self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

/// Opacity of a stroked line; the pen is a tenth of a pixel wide.
pub(crate) const HAIRLINE_ALPHA: f32 = 0.1;

/// Drawing primitives the simulator needs from its host.
///
/// Coordinates are in surface pixels with the origin at the top left.
pub(crate) trait Surface {
    fn clear(&mut self, color: Pixel);
    fn draw_dot(&mut self, x: f64, y: f64, radius: f64, color: Pixel);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Pixel);
}

/* -----------------------------
   Software raster
------------------------------ */

#[derive(Clone, Debug)]
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::BLACK; (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(self.px[self.idx(x, y)])
    }

    fn in_bounds(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return None;
        }
        Some(self.idx(x as u32, y as u32))
    }

    fn put(&mut self, x: i64, y: i64, p: Pixel) {
        if let Some(i) = self.in_bounds(x, y) {
            self.px[i] = p;
        }
    }

    fn blend_over(&mut self, x: i64, y: i64, src: Pixel, alpha: f32) {
        let Some(i) = self.in_bounds(x, y) else {
            return;
        };
        let dst = self.px[i];
        let a = alpha.clamp(0.0, 1.0);
        let blend = |sc: u8, dc: u8| -> u8 {
            let out = dc as f32 + (sc as f32 - dc as f32) * a;
            (out.clamp(0.0, 255.0) + 0.5) as u8
        };
        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
        };
    }

    pub(crate) fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.w, self.h, |x, y| {
            let p = self.px[self.idx(x, y)];
            Rgb([p.r, p.g, p.b])
        })
    }

    pub(crate) fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let px = img
            .pixels()
            .map(|Rgb([r, g, b])| Pixel::rgb(*r, *g, *b))
            .collect();
        Self { w, h, px }
    }
}

impl Surface for PixelCanvas {
    fn clear(&mut self, color: Pixel) {
        self.px.fill(color);
    }

    fn draw_dot(&mut self, x: f64, y: f64, radius: f64, color: Pixel) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let r = radius.max(0.0);
        let x0 = (x - r).floor() as i64;
        let x1 = (x + r).ceil() as i64;
        let y0 = (y - r).floor() as i64;
        let y1 = (y + r).ceil() as i64;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - x;
                let dy = py as f64 + 0.5 - y;
                if dx * dx + dy * dy <= r * r {
                    self.put(px, py, color);
                }
            }
        }
        // Sub-pixel dots still mark the pixel they sit in.
        self.put(x.floor() as i64, y.floor() as i64, color);
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Pixel) {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return;
        }
        let dx = x2 - x1;
        let dy = y2 - y1;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
        let mut last = None;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let px = (x1 + dx * t).floor() as i64;
            let py = (y1 + dy * t).floor() as i64;
            if last == Some((px, py)) {
                continue;
            }
            last = Some((px, py));
            self.blend_over(px, py, color, HAIRLINE_ALPHA);
        }
    }
}

/* -----------------------------
   Terminal cells
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                ch: ' ',
                fg: Color::White,
                bg,
            };
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 dots -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Pixels at or above this luma count as ink.
const INK_LUMA: u8 = 16;

/// Cell rectangle on screen.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Viewport {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
}

/// Scales the whole canvas into `vp`, keeping its aspect ratio and centring it.
pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    vp: Viewport,
    enable_color: bool,
    bg: Color,
) {
    let dots_w = vp.w as f64 * 2.0;
    let dots_h = vp.h as f64 * 4.0;
    if canvas.w == 0 || canvas.h == 0 || dots_w == 0.0 || dots_h == 0.0 {
        return;
    }

    let scale = (dots_w / canvas.w as f64).min(dots_h / canvas.h as f64);
    let off_x = (dots_w - canvas.w as f64 * scale) / 2.0;
    let off_y = (dots_h - canvas.h as f64 * scale) / 2.0;

    // Canvas span [from, to) covered by one dot along an axis.
    let span = |dot: u32, off: f64, limit: u32| -> (u32, u32) {
        let from = ((dot as f64 - off) / scale).floor();
        let to = ((dot as f64 + 1.0 - off) / scale).ceil();
        let from = from.clamp(0.0, limit as f64) as u32;
        let to = to.clamp(0.0, limit as f64) as u32;
        (from, to.max(from + 1).min(limit))
    };

    for cy in 0..vp.h as u32 {
        for cx in 0..vp.w as u32 {
            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let gx = cx * 2 + dx;
                    let gy = cy * 4 + dy;
                    if (gx as f64) + 1.0 <= off_x
                        || (gy as f64) + 1.0 <= off_y
                        || (gx as f64) >= dots_w - off_x
                        || (gy as f64) >= dots_h - off_y
                    {
                        continue;
                    }
                    let (x0, x1) = span(gx, off_x, canvas.w);
                    let (y0, y1) = span(gy, off_y, canvas.h);

                    let mut brightest: Option<Pixel> = None;
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let Some(p) = canvas.get(x, y) else {
                                continue;
                            };
                            if p.luma() >= INK_LUMA
                                && brightest.map_or(true, |b| p.luma() > b.luma())
                            {
                                brightest = Some(p);
                            }
                        }
                    }

                    if let Some(p) = brightest {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                Color::Rgb {
                    r: (sum_r / ink_count) as u8,
                    g: (sum_g / ink_count) as u8,
                    b: (sum_b / ink_count) as u8,
                }
            } else {
                Color::White
            };

            out.set(vp.x + cx as u16, vp.y + cy as u16, Cell { ch, fg, bg });
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x as usize + i;
        if xx >= buf.w as usize {
            break;
        }
        buf.set(xx as u16, y, Cell { ch, fg, bg });
    }
}
