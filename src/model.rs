use std::time::Duration;

pub(crate) const FLASH_RESET_DELAY: Duration = Duration::from_millis(200);
pub(crate) const TOAST_SHORT: Duration = Duration::from_millis(2000);
pub(crate) const TOAST_LONG: Duration = Duration::from_millis(3500);

pub(crate) const MSG_CORRECT: &str = "Correct!";
pub(crate) const MSG_INCORRECT: &str = "Incorrect";

/// Screen region split by the vertical and horizontal midlines.
///
/// `Boundary` is what a tap resolves to when it lands exactly on a midline.
/// It never equals a challenge, so such taps always score as wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Quadrant {
    Boundary,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub(crate) fn number(self) -> u8 {
        match self {
            Quadrant::Boundary => 0,
            Quadrant::TopLeft => 1,
            Quadrant::TopRight => 2,
            Quadrant::BottomLeft => 3,
            Quadrant::BottomRight => 4,
        }
    }

    pub(crate) fn from_number(n: u8) -> Option<Quadrant> {
        match n {
            0 => Some(Quadrant::Boundary),
            1 => Some(Quadrant::TopLeft),
            2 => Some(Quadrant::TopRight),
            3 => Some(Quadrant::BottomLeft),
            4 => Some(Quadrant::BottomRight),
            _ => None,
        }
    }
}

/// Classify a tap. Midpoints use integer halves of the screen size and the
/// comparisons are strict, so a coordinate sitting on either midline is
/// `Boundary`. Coordinates outside the screen are classified the same way.
pub(crate) fn quadrant_at(x: f32, y: f32, width: u32, height: u32) -> Quadrant {
    let mid_x = (width / 2) as f32;
    let mid_y = (height / 2) as f32;

    if x < mid_x && y < mid_y {
        Quadrant::TopLeft
    } else if x > mid_x && y < mid_y {
        Quadrant::TopRight
    } else if x < mid_x && y > mid_y {
        Quadrant::BottomLeft
    } else if x > mid_x && y > mid_y {
        Quadrant::BottomRight
    } else {
        Quadrant::Boundary
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Active,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlashColor {
    Green,
    Red,
    White,
}

/// Togglable pieces of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Element {
    StartButton,
    Instructions,
    Challenge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastLength {
    Short,
    Long,
}

impl ToastLength {
    pub(crate) fn duration(self) -> Duration {
        match self {
            ToastLength::Short => TOAST_SHORT,
            ToastLength::Long => TOAST_LONG,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GameState {
    pub(crate) phase: Phase,
    pub(crate) correct: u32,
    pub(crate) wrong: u32,
    /// `Some` for the whole of an active session, `None` while idle.
    pub(crate) challenge: Option<Quadrant>,
    pub(crate) screen_width: u32,
    pub(crate) screen_height: u32,
}

impl GameState {
    pub(crate) fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            phase: Phase::Idle,
            correct: 0,
            wrong: 0,
            challenge: None,
            screen_width: screen_width.max(1),
            screen_height: screen_height.max(1),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub(crate) fn taps_scored(&self) -> u32 {
        self.correct + self.wrong
    }
}

pub(crate) fn score_text(correct: u32, wrong: u32) -> String {
    format!("{} correct - {} wrong", correct, wrong)
}

pub(crate) fn final_score_message(correct: u32) -> String {
    format!("Game over. Final score: {} correct.", correct)
}
