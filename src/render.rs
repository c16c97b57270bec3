use crate::model::{Element, FlashColor, ToastLength};
use crate::ports::{Display, Notifier, ScreenMetrics};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use std::time::Instant;

pub(crate) const START_LABEL: &str = "[  START  ]";

const INSTRUCTIONS: [&str; 3] = [
    "Click the quadrant that matches the number.",
    "Double-click (or press D) to finish.",
    "Enter / Space / click START to begin.  Q quits.",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::Black,
            bg: Color::White,
            bold: false,
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
            c.ch = ' ';
            c.fg = Color::Black;
            c.bg = bg;
            c.bold = false;
        }
    }
}

/* -----------------------------
   View models behind the game's Display / Notifier
------------------------------ */

#[derive(Clone, Debug)]
pub(crate) struct Screen {
    pub(crate) challenge_text: String,
    pub(crate) score_text: String,
    pub(crate) show_start: bool,
    pub(crate) show_instructions: bool,
    pub(crate) show_challenge: bool,
    pub(crate) background: FlashColor,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            challenge_text: String::new(),
            score_text: String::new(),
            show_start: false,
            show_instructions: false,
            show_challenge: false,
            background: FlashColor::White,
        }
    }
}

impl Display for Screen {
    fn set_challenge_text(&mut self, text: &str) {
        self.challenge_text = text.to_string();
    }
    fn set_score_text(&mut self, text: &str) {
        self.score_text = text.to_string();
    }
    fn set_visible(&mut self, element: Element, visible: bool) {
        match element {
            Element::StartButton => self.show_start = visible,
            Element::Instructions => self.show_instructions = visible,
            Element::Challenge => self.show_challenge = visible,
        }
    }
    fn set_background(&mut self, color: FlashColor) {
        self.background = color;
    }
}

/// Only the newest toast is shown; it replaces whatever was up.
#[derive(Default)]
pub(crate) struct Toasts {
    current: Option<(String, Instant)>,
}

impl Toasts {
    pub(crate) fn show_at(&mut self, now: Instant, message: &str, length: ToastLength) {
        self.current = Some((message.to_string(), now + length.duration()));
    }

    pub(crate) fn expire(&mut self, now: Instant) {
        if matches!(&self.current, Some((_, until)) if now >= *until) {
            self.current = None;
        }
    }

    pub(crate) fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(m, _)| m.as_str())
    }
}

impl Notifier for Toasts {
    fn show_transient(&mut self, message: &str, length: ToastLength) {
        self.show_at(Instant::now(), message, length);
    }
}

/* -----------------------------
   Frame composition
------------------------------ */

#[derive(Clone, Copy)]
struct Palette {
    fg: Color,
    divider: Color,
    label: Color,
    digit: Color,
}

fn background_color(c: FlashColor, enable_color: bool) -> Color {
    match (c, enable_color) {
        (FlashColor::White, true) => Color::Rgb { r: 245, g: 245, b: 245 },
        (FlashColor::Green, true) => Color::Rgb { r: 60, g: 190, b: 90 },
        (FlashColor::Red, true) => Color::Rgb { r: 215, g: 60, b: 60 },
        (FlashColor::White, false) => Color::White,
        (FlashColor::Green, false) => Color::Green,
        (FlashColor::Red, false) => Color::Red,
    }
}

fn palette(enable_color: bool) -> Palette {
    if enable_color {
        Palette {
            fg: Color::Rgb { r: 20, g: 20, b: 20 },
            divider: Color::Rgb { r: 150, g: 150, b: 150 },
            label: Color::Rgb { r: 120, g: 120, b: 120 },
            digit: Color::Rgb { r: 30, g: 60, b: 160 },
        }
    } else {
        Palette {
            fg: Color::Black,
            divider: Color::DarkGrey,
            label: Color::DarkGrey,
            digit: Color::Black,
        }
    }
}

pub(crate) fn start_label_origin(cols: u16, rows: u16) -> (u16, u16) {
    let w = START_LABEL.chars().count() as u16;
    (cols.saturating_sub(w) / 2, (rows / 2).saturating_add(3))
}

pub(crate) fn start_label_hit(cols: u16, rows: u16, column: u16, row: u16) -> bool {
    let (x0, y0) = start_label_origin(cols, rows);
    let w = START_LABEL.chars().count() as u16;
    row == y0 && column >= x0 && column < x0 + w
}

pub(crate) fn compose(buf: &mut CellBuffer, screen: &Screen, toast: Option<&str>, enable_color: bool) {
    let bg = background_color(screen.background, enable_color);
    let pal = palette(enable_color);
    buf.clear(bg);

    let (w, h) = (buf.w, buf.h);
    if w == 0 || h == 0 {
        return;
    }
    // Midlines sit exactly on the cells a tap resolves to "no quadrant".
    let (mid_x, mid_y) = (w / 2, h / 2);
    for y in 0..h {
        buf.set(mid_x, y, Cell { ch: '│', fg: pal.divider, bg, bold: false });
    }
    for x in 0..w {
        buf.set(x, mid_y, Cell { ch: '─', fg: pal.divider, bg, bold: false });
    }
    buf.set(mid_x, mid_y, Cell { ch: '┼', fg: pal.divider, bg, bold: false });

    for (n, qx, qy) in [
        (1, mid_x / 2, mid_y / 2),
        (2, mid_x + (w - mid_x) / 2, mid_y / 2),
        (3, mid_x / 2, mid_y + (h - mid_y) / 2),
        (4, mid_x + (w - mid_x) / 2, mid_y + (h - mid_y) / 2),
    ] {
        draw_text(buf, qx, qy, &n.to_string(), pal.label, bg);
    }

    draw_centered(buf, 0, &screen.score_text, pal.fg, bg, true);

    if screen.show_challenge {
        draw_big_glyph(buf, &screen.challenge_text, pal.digit, bg);
    }

    if screen.show_instructions {
        let top = mid_y.saturating_sub(INSTRUCTIONS.len() as u16 + 1);
        for (i, line) in INSTRUCTIONS.iter().enumerate() {
            draw_centered(buf, top + i as u16, line, pal.fg, bg, false);
        }
    }

    if screen.show_start {
        let (x0, y0) = start_label_origin(w, h);
        for (i, ch) in START_LABEL.chars().enumerate() {
            buf.set(x0 + i as u16, y0, Cell { ch, fg: bg, bg: pal.fg, bold: true });
        }
    }

    if let Some(msg) = toast {
        draw_centered(buf, h.saturating_sub(2), &format!(" {} ", msg), bg, pal.fg, true);
    }
}

fn draw_centered(buf: &mut CellBuffer, y: u16, s: &str, fg: Color, bg: Color, bold: bool) {
    let len = s.chars().count() as u16;
    let x0 = buf.w.saturating_sub(len) / 2;
    for (i, ch) in s.chars().enumerate() {
        buf.set(x0.saturating_add(i as u16), y, Cell { ch, fg, bg, bold });
    }
}

const GLYPH_ROWS: usize = 5;

fn glyph(ch: char) -> Option<[&'static str; GLYPH_ROWS]> {
    match ch {
        '1' => Some(["  #  ", " ##  ", "  #  ", "  #  ", " ### "]),
        '2' => Some(["#### ", "    #", " ### ", "#    ", "#####"]),
        '3' => Some(["#### ", "    #", " ### ", "    #", "#### "]),
        '4' => Some(["#  # ", "#  # ", "#####", "   # ", "   # "]),
        _ => None,
    }
}

/// Challenge digit in a 5×5 block font, two cells per dot, centred on screen.
fn draw_big_glyph(buf: &mut CellBuffer, text: &str, fg: Color, bg: Color) {
    let Some(rows) = text.chars().next().and_then(glyph) else {
        draw_centered(buf, buf.h / 2, text, fg, bg, true);
        return;
    };
    let gw = 10u16;
    let x0 = buf.w.saturating_sub(gw) / 2;
    let y0 = (buf.h / 2).saturating_sub(GLYPH_ROWS as u16 / 2);
    for (dy, line) in rows.iter().enumerate() {
        for (dx, dot) in line.chars().enumerate() {
            if dot != '#' {
                continue;
            }
            for k in 0..2u16 {
                buf.set(
                    x0 + dx as u16 * 2 + k,
                    y0 + dy as u16,
                    Cell { ch: '█', fg, bg, bold: false },
                );
            }
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

/* -----------------------------
   Terminal
------------------------------ */

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        // Before touching any mode, so a failure here leaves nothing to restore.
        let (cols, rows) = terminal::size()?;

        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

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
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize(&mut self, c: u16, r: u16) -> bool {
        if c == self.cols && r == self.rows {
            return false;
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        true
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_bold != Some(c.bold) {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = Some(c.bold);
                    // NormalIntensity can drop colours on some terminals
                    last_fg = None;
                    last_bg = None;
                }
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

impl ScreenMetrics for Terminal {
    fn width(&self) -> u32 {
        self.cols as u32
    }
    fn height(&self) -> u32 {
        self.rows as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(buf: &CellBuffer, x: u16, y: u16) -> Cell {
        buf.cells[buf.idx(x, y)]
    }

    fn row_text(buf: &CellBuffer, y: u16) -> String {
        (0..buf.w).map(|x| at(buf, x, y).ch).collect()
    }

    fn idle_screen() -> Screen {
        let mut s = Screen::default();
        s.set_visible(Element::StartButton, true);
        s.set_visible(Element::Instructions, true);
        s.set_score_text("0 correct - 0 wrong");
        s
    }

    #[test]
    fn midlines_are_drawn_on_boundary_cells() {
        let mut buf = CellBuffer::new(80, 24);
        compose(&mut buf, &Screen::default(), None, true);
        assert_eq!(at(&buf, 40, 3).ch, '│');
        assert_eq!(at(&buf, 5, 12).ch, '─');
        assert_eq!(at(&buf, 40, 12).ch, '┼');
    }

    #[test]
    fn idle_screen_shows_start_and_score() {
        let mut buf = CellBuffer::new(80, 24);
        let screen = idle_screen();
        compose(&mut buf, &screen, None, true);

        assert!(row_text(&buf, 0).contains("0 correct - 0 wrong"));
        let (_, y) = start_label_origin(80, 24);
        assert!(row_text(&buf, y).contains(START_LABEL));
    }

    #[test]
    fn challenge_digit_only_when_visible() {
        let mut screen = idle_screen();
        screen.set_challenge_text("2");
        let mut buf = CellBuffer::new(80, 24);
        compose(&mut buf, &screen, None, true);
        assert!(!buf.cells.iter().any(|c| c.ch == '█'));

        screen.set_visible(Element::Challenge, true);
        compose(&mut buf, &screen, None, true);
        assert!(buf.cells.iter().any(|c| c.ch == '█'));
    }

    #[test]
    fn flash_paints_background() {
        let mut screen = Screen::default();
        screen.set_background(FlashColor::Red);
        let mut buf = CellBuffer::new(20, 10);
        compose(&mut buf, &screen, None, false);
        assert_eq!(at(&buf, 1, 1).bg, Color::Red);
    }

    #[test]
    fn start_label_hit_test() {
        let (x0, y0) = start_label_origin(80, 24);
        assert!(start_label_hit(80, 24, x0, y0));
        assert!(start_label_hit(80, 24, x0 + 5, y0));
        assert!(!start_label_hit(80, 24, x0 + 5, y0 + 1));
        assert!(!start_label_hit(80, 24, x0.saturating_sub(1), y0));
    }

    #[test]
    fn toast_replaces_and_expires() {
        let t0 = Instant::now();
        let mut toasts = Toasts::default();
        toasts.show_at(t0, "Correct!", ToastLength::Short);
        toasts.show_at(t0, "Incorrect", ToastLength::Short);
        assert_eq!(toasts.current(), Some("Incorrect"));

        toasts.expire(t0 + Duration::from_millis(1999));
        assert_eq!(toasts.current(), Some("Incorrect"));
        toasts.expire(t0 + Duration::from_millis(2000));
        assert_eq!(toasts.current(), None);

        toasts.show_at(t0, "Game over", ToastLength::Long);
        toasts.expire(t0 + Duration::from_millis(3000));
        assert_eq!(toasts.current(), Some("Game over"));
    }

    #[test]
    fn toast_is_drawn_near_the_bottom() {
        let mut buf = CellBuffer::new(60, 20);
        compose(&mut buf, &Screen::default(), Some("Correct!"), true);
        assert!(row_text(&buf, 18).contains("Correct!"));
    }
}
