use crate::game::GameEvent;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Press { column: u16, row: u16, at: Instant },
    Resize { cols: u16, rows: u16 },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AppCommand {
    Game(GameEvent),
    Resize { cols: u16, rows: u16 },
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) => {
                if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                    out.push(InputEvent::Press {
                        column: m.column,
                        row: m.row,
                        at: Instant::now(),
                    });
                }
            }
            Event::Resize(cols, rows) => out.push(InputEvent::Resize { cols, rows }),
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

/// Turns raw presses into taps and double taps. The second press of a pair
/// becomes a `DoubleTap` and is never also reported as a tap.
pub(crate) struct DoubleTapDetector {
    window: Duration,
    slop: u16,
    last: Option<(u16, u16, Instant)>,
}

impl DoubleTapDetector {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            slop: 2,
            last: None,
        }
    }

    pub(crate) fn press(&mut self, column: u16, row: u16, at: Instant) -> GameEvent {
        if let Some((c, r, t)) = self.last {
            let close = column.abs_diff(c) <= self.slop && row.abs_diff(r) <= self.slop;
            if close && at.saturating_duration_since(t) <= self.window {
                self.last = None;
                return GameEvent::DoubleTap;
            }
        }
        self.last = Some((column, row, at));
        GameEvent::TapDown {
            x: column as f32,
            y: row as f32,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}

pub(crate) fn map_event_to_command(
    detector: &mut DoubleTapDetector,
    ev: InputEvent,
) -> Option<AppCommand> {
    match ev {
        InputEvent::Key { key, mods } => {
            if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
                return Some(AppCommand::Quit);
            }
            match key {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(AppCommand::Quit),
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') | KeyCode::Char('S') => {
                    Some(AppCommand::Game(GameEvent::StartPressed))
                }
                KeyCode::Char('d') | KeyCode::Char('D') => {
                    Some(AppCommand::Game(GameEvent::DoubleTap))
                }
                _ => None,
            }
        }
        InputEvent::Press { column, row, at } => {
            Some(AppCommand::Game(detector.press(column, row, at)))
        }
        InputEvent::Resize { cols, rows } => Some(AppCommand::Resize { cols, rows }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn tap(x: f32, y: f32) -> GameEvent {
        GameEvent::TapDown { x, y }
    }

    #[test]
    fn single_press_is_a_tap_at_the_cell() {
        let mut d = DoubleTapDetector::new(WINDOW);
        assert_eq!(d.press(12, 7, Instant::now()), tap(12.0, 7.0));
    }

    #[test]
    fn quick_second_press_is_a_double_tap_only() {
        let t0 = Instant::now();
        let mut d = DoubleTapDetector::new(WINDOW);
        assert_eq!(d.press(10, 5, t0), tap(10.0, 5.0));
        assert_eq!(
            d.press(11, 5, t0 + Duration::from_millis(150)),
            GameEvent::DoubleTap
        );
        // a third press starts a new pair
        assert_eq!(
            d.press(11, 5, t0 + Duration::from_millis(200)),
            tap(11.0, 5.0)
        );
    }

    #[test]
    fn slow_or_distant_presses_stay_taps() {
        let t0 = Instant::now();
        let mut d = DoubleTapDetector::new(WINDOW);
        d.press(10, 5, t0);
        assert_eq!(
            d.press(10, 5, t0 + Duration::from_millis(400)),
            tap(10.0, 5.0)
        );
        assert_eq!(
            d.press(30, 5, t0 + Duration::from_millis(450)),
            tap(30.0, 5.0)
        );
    }

    #[test]
    fn reset_forgets_the_previous_press() {
        let t0 = Instant::now();
        let mut d = DoubleTapDetector::new(WINDOW);
        d.press(3, 3, t0);
        d.reset();
        assert_eq!(
            d.press(3, 3, t0 + Duration::from_millis(10)),
            tap(3.0, 3.0)
        );
    }

    #[test]
    fn keys_map_to_commands() {
        let mut d = DoubleTapDetector::new(WINDOW);
        let key = |k: KeyCode| InputEvent::Key {
            key: k,
            mods: KeyModifiers::NONE,
        };
        assert_eq!(
            map_event_to_command(&mut d, key(KeyCode::Char('q'))),
            Some(AppCommand::Quit)
        );
        assert_eq!(
            map_event_to_command(&mut d, key(KeyCode::Enter)),
            Some(AppCommand::Game(GameEvent::StartPressed))
        );
        assert_eq!(
            map_event_to_command(&mut d, key(KeyCode::Char('d'))),
            Some(AppCommand::Game(GameEvent::DoubleTap))
        );
        assert_eq!(map_event_to_command(&mut d, key(KeyCode::Char('x'))), None);
        assert_eq!(
            map_event_to_command(
                &mut d,
                InputEvent::Key {
                    key: KeyCode::Char('c'),
                    mods: KeyModifiers::CONTROL,
                }
            ),
            Some(AppCommand::Quit)
        );
        assert_eq!(
            map_event_to_command(&mut d, InputEvent::Resize { cols: 90, rows: 30 }),
            Some(AppCommand::Resize { cols: 90, rows: 30 })
        );
    }
}
