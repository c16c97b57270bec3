use crate::model::{Element, FlashColor, Quadrant, ToastLength};
use rand::Rng;
use std::time::Duration;

pub(crate) trait Display {
    fn set_challenge_text(&mut self, text: &str);
    fn set_score_text(&mut self, text: &str);
    fn set_visible(&mut self, element: Element, visible: bool);
    fn set_background(&mut self, color: FlashColor);
}

pub(crate) trait Notifier {
    fn show_transient(&mut self, message: &str, length: ToastLength);
}

/// Work the controller asks to have run later on the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
    ResetBackground,
}

/// Fire-once delayed execution. Tasks come back through
/// `GameController::run_deferred` on the same thread that scheduled them.
pub(crate) trait Scheduler {
    fn after(&mut self, delay: Duration, task: Deferred);
}

pub(crate) trait ScreenMetrics {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

pub(crate) trait ChallengeSource {
    /// Uniform draw from `lo..=hi`.
    fn next_in_range(&mut self, lo: u8, hi: u8) -> u8;

    /// Always a playable quadrant. Draws outside `1..=4` are clamped into it,
    /// so a faulty source can never produce `Boundary`.
    fn next_quadrant(&mut self) -> Quadrant {
        let n = self.next_in_range(1, 4);
        if !(1..=4).contains(&n) {
            log::warn!("challenge source returned {n}, outside 1..=4");
        }
        Quadrant::from_number(n.clamp(1, 4)).unwrap_or(Quadrant::TopLeft)
    }
}

/// Challenge draws backed by any `rand` generator.
pub(crate) struct RandomChallenges<R>(pub(crate) R);

impl<R: Rng> ChallengeSource for RandomChallenges<R> {
    fn next_in_range(&mut self, lo: u8, hi: u8) -> u8 {
        self.0.gen_range(lo..=hi)
    }
}
