use crate::model::{
    final_score_message, quadrant_at, score_text, Element, FlashColor, GameState, Phase,
    Quadrant, ToastLength, FLASH_RESET_DELAY, MSG_CORRECT, MSG_INCORRECT,
};
use crate::ports::{ChallengeSource, Deferred, Display, Notifier, Scheduler, ScreenMetrics};
use log::{debug, info, trace};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum GameEvent {
    StartPressed,
    TapDown { x: f32, y: f32 },
    DoubleTap,
}

/// Owns the one `GameState` and drives every transition of a session.
pub(crate) struct GameController<D, N, S, R> {
    state: GameState,
    display: D,
    notifier: N,
    scheduler: S,
    challenges: R,
}

impl<D, N, S, R> GameController<D, N, S, R>
where
    D: Display,
    N: Notifier,
    S: Scheduler,
    R: ChallengeSource,
{
    pub(crate) fn new(
        display: D,
        notifier: N,
        scheduler: S,
        challenges: R,
        metrics: &impl ScreenMetrics,
    ) -> Self {
        let mut ctl = Self {
            state: GameState::new(metrics.width(), metrics.height()),
            display,
            notifier,
            scheduler,
            challenges,
        };
        ctl.show_idle_screen();
        ctl
    }

    pub(crate) fn state(&self) -> &GameState {
        &self.state
    }

    pub(crate) fn display(&self) -> &D {
        &self.display
    }

    pub(crate) fn notifier(&self) -> &N {
        &self.notifier
    }

    pub(crate) fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Returns whether the game consumed the event.
    pub(crate) fn on_event(&mut self, event: GameEvent) -> bool {
        match event {
            // The start affordance is hidden for the whole session.
            GameEvent::StartPressed => {
                if self.state.is_active() {
                    return false;
                }
                self.start_game();
                true
            }
            GameEvent::TapDown { x, y } => self.handle_touch_down(x, y),
            GameEvent::DoubleTap => self.handle_double_tap(),
        }
    }

    pub(crate) fn start_game(&mut self) {
        self.state.phase = Phase::Active;
        self.state.correct = 0;
        self.state.wrong = 0;

        self.display.set_visible(Element::StartButton, false);
        self.display.set_visible(Element::Instructions, false);
        self.display.set_visible(Element::Challenge, true);
        self.update_score_display();
        self.generate_new_challenge();
        info!(
            "session started on a {}x{} screen",
            self.state.screen_width, self.state.screen_height
        );
    }

    /// Returns false, with no side effects, when no session is running.
    pub(crate) fn end_game(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state.phase = Phase::Idle;
        self.state.challenge = None;
        info!(
            "session ended after {} taps: {} correct, {} wrong",
            self.state.taps_scored(),
            self.state.correct,
            self.state.wrong
        );

        self.notifier
            .show_transient(&final_score_message(self.state.correct), ToastLength::Long);
        self.show_idle_screen();
        true
    }

    pub(crate) fn handle_touch_down(&mut self, x: f32, y: f32) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let quadrant = quadrant_at(x, y, self.state.screen_width, self.state.screen_height);
        debug!("tap at ({x}, {y}) -> quadrant {}", quadrant.number());
        self.validate_answer(quadrant);
        true
    }

    pub(crate) fn handle_double_tap(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.end_game()
    }

    /// Scores `quadrant` against the current challenge and moves on to the
    /// next one. Every call scores exactly once, right or wrong.
    pub(crate) fn validate_answer(&mut self, quadrant: Quadrant) -> bool {
        let hit = self.state.challenge == Some(quadrant);
        if hit {
            self.state.correct += 1;
            self.notifier.show_transient(MSG_CORRECT, ToastLength::Short);
            self.flash_feedback(FlashColor::Green);
        } else {
            self.state.wrong += 1;
            self.notifier
                .show_transient(MSG_INCORRECT, ToastLength::Short);
            self.flash_feedback(FlashColor::Red);
        }
        debug!(
            "answer {} vs challenge {:?}: {}",
            quadrant.number(),
            self.state.challenge.map(Quadrant::number),
            if hit { "correct" } else { "wrong" }
        );

        self.update_score_display();
        self.generate_new_challenge();
        hit
    }

    pub(crate) fn generate_new_challenge(&mut self) -> Quadrant {
        let next = self.challenges.next_quadrant();
        self.state.challenge = Some(next);
        self.display.set_challenge_text(&next.number().to_string());
        debug!("new challenge: {}", next.number());
        next
    }

    pub(crate) fn update_score_display(&mut self) {
        self.display
            .set_score_text(&score_text(self.state.correct, self.state.wrong));
    }

    /// Paints `color` now and queues a repaint to white. Earlier pending
    /// resets are left alone; whichever fires last wins.
    pub(crate) fn flash_feedback(&mut self, color: FlashColor) {
        self.display.set_background(color);
        self.scheduler
            .after(FLASH_RESET_DELAY, Deferred::ResetBackground);
        trace!("flash {:?}, reset in {:?}", color, FLASH_RESET_DELAY);
    }

    pub(crate) fn run_deferred(&mut self, task: Deferred) {
        trace!("deferred task fired: {:?}", task);
        match task {
            Deferred::ResetBackground => self.display.set_background(FlashColor::White),
        }
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.state.screen_width = width.max(1);
        self.state.screen_height = height.max(1);
    }

    fn show_idle_screen(&mut self) {
        self.display.set_visible(Element::StartButton, true);
        self.display.set_visible(Element::Instructions, true);
        self.display.set_visible(Element::Challenge, false);
        self.display.set_score_text(&score_text(0, 0));
    }
}
