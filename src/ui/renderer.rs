/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back

use std::io::{self, BufWriter, Write};
use std::mem::{discriminant, Discriminant};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::net::LoopbackNetwork;
use crate::sim::world::{AppState, Phase, SelectKind};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    wide: bool, // occupies this column and the next
    cont: bool, // right half of a wide char, never printed
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 12, g: 12, b: 28 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, wide: false, cont: false };

    const WIDE_CONT: Cell = Cell { ch: ' ', fg: Color::White, wide: false, cont: true };

    /// Differs from any real cell, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, wide: false, cont: false };
}

/// Terminal columns taken by `ch`: 0 for combining marks and controls,
/// 2 for East Asian wide/fullwidth and emoji blocks, otherwise 1.
fn char_cols(ch: char) -> usize {
    match ch as u32 {
        0x00..=0x1F | 0x7F..=0x9F => 0,
        0x0300..=0x036F | 0x200B..=0x200F | 0xFE00..=0xFE0F => 0,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x1F900..=0x1F9FF
        | 0x20000..=0x3FFFD => 2,
        _ => 1,
    }
}

fn str_cols(s: &str) -> usize {
    s.chars().map(char_cols).sum()
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// Write `s` at (x, y). Wide chars take two columns; one that would
    /// straddle the right edge ends the string.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        if y >= self.height {
            return;
        }
        let mut cx = x;
        for ch in s.chars() {
            let cols = char_cols(ch);
            if cols == 0 {
                continue;
            }
            if cx + cols > self.width {
                break;
            }
            if cols == 2 {
                self.set(cx, y, Cell { ch, fg, wide: true, cont: false });
                self.set(cx + 1, y, Cell::WIDE_CONT);
            } else {
                self.set(cx, y, Cell { ch, fg, wide: false, cont: false });
            }
            cx += cols;
        }
    }

    /// Write `s` horizontally centered on row `y`.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(str_cols(s)) / 2;
        self.put_str(x, y, s, fg);
    }
}

// ── Palette ──

const TITLE: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const TEXT: Color = Color::White;
const DIM: Color = Color::DarkGrey;
const ACCENT: Color = Color::Rgb { r: 80, g: 220, b: 255 };
const WARN: Color = Color::Rgb { r: 255, g: 110, b: 90 };

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Discriminant<Phase>>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(8192, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &AppState, network: &LoopbackNetwork) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        let phase = discriminant(&app.phase);
        if resized || self.last_phase != Some(phase) {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(phase);
        }

        self.front.clear();
        match &app.phase {
            Phase::Title => self.compose_title(app, network),
            Phase::LevelSelect => self.compose_level_select(app),
            Phase::Cutscene { id, .. } => self.compose_cutscene(app, id),
            Phase::Loading { map } => self.compose_loading(map),
        }
        if !app.message.is_empty() {
            let row = self.front.height.saturating_sub(2);
            self.front.put_centered(row, &app.message, ACCENT);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);

                // Right halves are drawn by their wide char.
                if cell.cont {
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide && self.front.get(x + 1, y) != self.back.get(x + 1, y);
                if cell == self.back.get(x, y) && !cont_changed {
                    x += 1;
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                queue!(self.writer, Print(cell.ch))?;

                let step = if cell.wide { 2 } else { 1 };
                cursor_at = Some((x + step, y));
                x += step;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_title(&mut self, app: &AppState, network: &LoopbackNetwork) {
        let top = self.front.height / 4;
        self.front.put_centered(top, "S P A C E N A U T S", TITLE);
        self.front.put_centered(top + 3, "[1]  Single player", TEXT);
        self.front.put_centered(top + 4, "[2]  Multiplayer", TEXT);
        self.front.put_centered(top + 5, "[Q]  Quit", DIM);

        if let Some(reg) = network.pending() {
            let line = format!("Registered as {} for {}, waiting for a match...", reg.nickname, reg.session_token);
            self.front.put_centered(top + 8, &line, ACCENT);
        } else if app.anim_tick / 30 % 2 == 0 {
            self.front.put_centered(top + 8, "choose a mode", DIM);
        }
    }

    fn compose_level_select(&mut self, app: &AppState) {
        let v = &app.view;
        let h = self.front.height;
        let top = 1;

        self.front.put_centered(top, "SELECT LEVEL", TITLE);
        let mode = match app.active {
            SelectKind::Single => "single player",
            SelectKind::Multi => "multiplayer",
        };
        self.front.put_centered(top + 1, mode, DIM);

        // Level title and position in the catalog
        self.front.put_centered(top + 3, &v.name, TEXT);
        if let Some(level) = app.selecter().current() {
            let pos = format!("{} / {}", level.ordinal + 1, app.selecter().catalog().len());
            self.front.put_centered(top + 4, &pos, DIM);
        }

        // Preview frame with arrows either side
        let frame_w = 30usize;
        let frame_h = 7usize;
        let fx = self.front.width.saturating_sub(frame_w) / 2;
        let fy = top + 5;
        let horiz = "─".repeat(frame_w - 2);
        self.front.put_str(fx, fy, &format!("┌{}┐", horiz), DIM);
        for row in 1..frame_h - 1 {
            self.front.put_str(fx, fy + row, "│", DIM);
            self.front.put_str(fx + frame_w - 1, fy + row, "│", DIM);
        }
        self.front.put_str(fx, fy + frame_h - 1, &format!("└{}┘", horiz), DIM);
        let preview = format!("[ {} ]", v.preview_key);
        let px = fx + frame_w.saturating_sub(str_cols(&preview)) / 2;
        self.front.put_str(px, fy + frame_h / 2, &preview, ACCENT);

        let mid = fy + frame_h / 2;
        if v.show_prev {
            self.front.put_str(fx.saturating_sub(4), mid, "◀", TITLE);
        }
        if v.show_next {
            self.front.put_str(fx + frame_w + 3, mid, "▶", TITLE);
        }

        // Start label
        self.front.put_centered(fy + frame_h + 1, "START", TEXT);

        // Lower corners: back and countdown
        let bottom = h.saturating_sub(1);
        self.front.put_str(1, bottom, "[Esc] Back", DIM);
        self.front.put_centered(bottom, "←→: Select   ENTER: Start", DIM);
        if let Some(secs) = v.countdown.filter(|_| app.selecter().is_multiplayer()) {
            let s = format!("{:>3}", secs);
            let color = if secs <= 10 { WARN } else { TEXT };
            let x = self.front.width.saturating_sub(s.len() + 1);
            self.front.put_str(x, bottom, &s, color);
        }
    }

    fn compose_cutscene(&mut self, app: &AppState, id: &str) {
        let mid = self.front.height / 2;
        let dots = ".".repeat((app.anim_tick / 10 % 4) as usize);
        self.front.put_centered(mid.saturating_sub(1), &format!("~ {} ~", id), TITLE);
        self.front.put_centered(mid + 1, &dots, DIM);
        self.front.put_centered(mid + 3, "[Enter] Skip", DIM);
    }

    fn compose_loading(&mut self, map: &str) {
        let mid = self.front.height / 2;
        self.front.put_centered(mid.saturating_sub(1), "LOADING", TITLE);
        self.front.put_centered(mid, map, TEXT);
        self.front.put_centered(mid + 3, "[Enter] Clear level   [Esc] Title", DIM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width)
            .map(|x| buf.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.ch)
            .collect()
    }

    #[test]
    fn wide_glyphs_take_two_columns() {
        let mut buf = FrameBuffer::new(10, 1);
        buf.put_str(0, 0, "星A", TEXT);
        assert!(buf.get(0, 0).wide);
        assert!(buf.get(1, 0).cont);
        assert_eq!(buf.get(2, 0).ch, 'A');
        assert_eq!(str_cols("星A"), 3);
    }

    #[test]
    fn centering_uses_display_width() {
        let mut buf = FrameBuffer::new(10, 1);
        buf.put_centered(0, "星星", TEXT);
        // 4 columns in a 10-wide row start at column 3.
        assert_eq!(buf.get(2, 0), Cell::BLANK);
        assert!(buf.get(3, 0).wide);
        assert!(buf.get(6, 0).cont);
        assert_eq!(row(&buf, 0), "   星星   ");
    }

    #[test]
    fn wide_glyph_at_right_edge_is_dropped() {
        let mut buf = FrameBuffer::new(3, 1);
        buf.put_str(0, 0, "ab星", TEXT);
        assert_eq!(row(&buf, 0), "ab ");
        assert!(!buf.get(2, 0).cont);
    }
}
