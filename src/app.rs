use crate::config::{self, Args, Settings};
use crate::game::{GameController, GameEvent};
use crate::input::{
    collect_input_nonblocking, map_event_to_command, AppCommand, DoubleTapDetector, InputEvent,
};
use crate::logging;
use crate::ports::{ChallengeSource, Display, Notifier, RandomChallenges, Scheduler};
use crate::render::{compose, start_label_hit, Screen, Terminal, Toasts};
use crate::scheduler::TimerQueue;
use anyhow::Context;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

type Controller = GameController<Screen, Toasts, TimerQueue, RandomChallenges<StdRng>>;

pub(crate) struct App {
    settings: Settings,
    game: Controller,
    taps: DoubleTapDetector,
    term: Terminal,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let term = Terminal::begin().context("could not set up the terminal")?;
        let game = GameController::new(
            Screen::default(),
            Toasts::default(),
            TimerQueue::new(),
            RandomChallenges(rng),
            &term,
        );
        info!("screen is {}x{} cells", term.cols, term.rows);

        Ok(Self {
            taps: DoubleTapDetector::new(Duration::from_millis(settings.double_tap_ms)),
            settings,
            game,
            term,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps() as f32);

        while !self.should_quit {
            // input
            for ev in collect_input_nonblocking(frame_dt)? {
                self.handle(ev);
                if self.should_quit {
                    break;
                }
            }

            // deferred work
            let now = Instant::now();
            let due = self.game.scheduler_mut().drain_due(now);
            if !due.is_empty() {
                trace!(
                    "{} deferred task(s) due, {} still pending",
                    due.len(),
                    self.game.scheduler_mut().len()
                );
            }
            for task in due {
                self.game.run_deferred(task);
            }
            self.game.notifier_mut().expire(now);

            // render
            compose(
                &mut self.term.cur,
                self.game.display(),
                self.game.notifier().current(),
                self.settings.enable_color,
            );
            self.term.present(true)?;

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }

    fn handle(&mut self, ev: InputEvent) {
        let (cols, rows) = (self.term.cols, self.term.rows);
        match route(&mut self.game, &mut self.taps, cols, rows, ev) {
            Some(AppCommand::Quit) => self.should_quit = true,
            Some(AppCommand::Resize { cols, rows }) => {
                if self.term.resize(cols, rows) {
                    self.game.resize(cols as u32, rows as u32);
                    debug!("resized to {}x{}", cols, rows);
                }
            }
            Some(AppCommand::Game(_)) | None => {}
        }
    }
}

/// Feeds one input event to the game. Game events are handled here; quit and
/// resize come back for the shell.
///
/// A press the game does not consume is a start press when it lands on the
/// start label while idle. Starting a game forgets the previous press so the
/// starting click cannot pair into a double tap.
pub(crate) fn route<D, N, S, R>(
    game: &mut GameController<D, N, S, R>,
    taps: &mut DoubleTapDetector,
    cols: u16,
    rows: u16,
    ev: InputEvent,
) -> Option<AppCommand>
where
    D: Display,
    N: Notifier,
    S: Scheduler,
    R: ChallengeSource,
{
    let press_at = match &ev {
        InputEvent::Press { column, row, .. } => Some((*column, *row)),
        _ => None,
    };
    let event = match map_event_to_command(taps, ev)? {
        AppCommand::Game(event) => event,
        other => return Some(other),
    };

    if game.on_event(event) {
        if event == GameEvent::StartPressed {
            taps.reset();
        }
        return None;
    }
    if let Some((column, row)) = press_at {
        let idle = !game.state().is_active();
        if idle && start_label_hit(cols, rows, column, row) {
            game.on_event(GameEvent::StartPressed);
            taps.reset();
        }
    }
    None
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    let (settings, settings_warning) = config::resolve(&args)?;
    logging::init(args.log_file.as_deref(), &settings.log_level)?;
    if let Some(w) = settings_warning {
        warn!("{w}");
    }
    debug!("settings: {:?}", settings);

    let mut app = App::init(settings)?;
    let res = app.run();
    // restore the terminal even when the loop failed
    let restored = app.term.end();
    finish(res, restored)
}

/// The loop's own error wins over a failure to restore the terminal.
fn finish(run: anyhow::Result<()>, restored: anyhow::Result<()>) -> anyhow::Result<()> {
    run.and(restored)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ScreenMetrics;
    use crate::render::start_label_origin;

    const COLS: u16 = 80;
    const ROWS: u16 = 24;

    struct FixedScreen;

    impl ScreenMetrics for FixedScreen {
        fn width(&self) -> u32 {
            COLS as u32
        }
        fn height(&self) -> u32 {
            ROWS as u32
        }
    }

    fn setup() -> (Controller, DoubleTapDetector) {
        let game = GameController::new(
            Screen::default(),
            Toasts::default(),
            TimerQueue::new(),
            RandomChallenges(StdRng::seed_from_u64(7)),
            &FixedScreen,
        );
        (game, DoubleTapDetector::new(Duration::from_millis(300)))
    }

    fn press(column: u16, row: u16, at: Instant) -> InputEvent {
        InputEvent::Press { column, row, at }
    }

    #[test]
    fn idle_click_on_start_label_starts_the_game() {
        let (mut game, mut taps) = setup();
        let (x0, y0) = start_label_origin(COLS, ROWS);

        let out = route(&mut game, &mut taps, COLS, ROWS, press(x0 + 2, y0, Instant::now()));

        assert_eq!(out, None);
        assert!(game.state().is_active());
        assert_eq!(game.state().taps_scored(), 0);
        assert!(game.display().show_challenge);
        assert!(!game.display().show_start);
    }

    #[test]
    fn idle_click_elsewhere_changes_nothing() {
        let (mut game, mut taps) = setup();

        let out = route(&mut game, &mut taps, COLS, ROWS, press(3, 2, Instant::now()));

        assert_eq!(out, None);
        assert!(!game.state().is_active());
        assert_eq!(game.state().taps_scored(), 0);
        assert!(game.display().show_start);
        assert_eq!(game.notifier().current(), None);
    }

    #[test]
    fn starting_click_does_not_pair_with_the_next() {
        let (mut game, mut taps) = setup();
        let (x0, y0) = start_label_origin(COLS, ROWS);
        let t0 = Instant::now();

        route(&mut game, &mut taps, COLS, ROWS, press(x0 + 2, y0, t0));
        assert!(game.state().is_active());

        // Same cell, well inside the double-tap window: scored as a tap.
        let t1 = t0 + Duration::from_millis(50);
        route(&mut game, &mut taps, COLS, ROWS, press(x0 + 2, y0, t1));
        assert!(game.state().is_active());
        assert_eq!(game.state().taps_scored(), 1);

        // The pair after that is a real double tap and ends the session.
        let t2 = t1 + Duration::from_millis(50);
        route(&mut game, &mut taps, COLS, ROWS, press(x0 + 2, y0, t2));
        assert!(!game.state().is_active());
    }

    #[test]
    fn start_key_also_resets_pairing() {
        let (mut game, mut taps) = setup();
        let t0 = Instant::now();

        route(&mut game, &mut taps, COLS, ROWS, press(3, 2, t0));
        let enter = InputEvent::Key {
            key: crossterm::event::KeyCode::Enter,
            mods: crossterm::event::KeyModifiers::NONE,
        };
        route(&mut game, &mut taps, COLS, ROWS, enter);
        assert!(game.state().is_active());

        route(&mut game, &mut taps, COLS, ROWS, press(3, 2, t0 + Duration::from_millis(40)));
        assert!(game.state().is_active());
        assert_eq!(game.state().taps_scored(), 1);
    }

    #[test]
    fn quit_and_resize_go_back_to_the_shell() {
        let (mut game, mut taps) = setup();
        let q = InputEvent::Key {
            key: crossterm::event::KeyCode::Char('q'),
            mods: crossterm::event::KeyModifiers::NONE,
        };
        assert_eq!(
            route(&mut game, &mut taps, COLS, ROWS, q),
            Some(AppCommand::Quit)
        );
        assert_eq!(
            route(&mut game, &mut taps, COLS, ROWS, InputEvent::Resize { cols: 100, rows: 40 }),
            Some(AppCommand::Resize { cols: 100, rows: 40 })
        );
    }

    #[test]
    fn loop_error_is_not_hidden_by_restore_error() {
        let err = finish(Err(anyhow::anyhow!("loop broke")), Err(anyhow::anyhow!("restore broke")))
            .unwrap_err();
        assert_eq!(err.to_string(), "loop broke");

        let err = finish(Ok(()), Err(anyhow::anyhow!("restore broke"))).unwrap_err();
        assert_eq!(err.to_string(), "restore broke");

        assert!(finish(Ok(()), Ok(())).is_ok());
    }
}
