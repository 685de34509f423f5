use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use tracing::{debug, info};

use crate::state::CONTROLLER_COUNT;

/// Buttons of one controller. Red is the buzzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerButtons {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
    pub orange: bool,
    pub blue: bool,
}

/// Names of the five buttons, used by the command path and the virtual controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Red,
    Yellow,
    Green,
    Orange,
    Blue,
}

impl ControllerButtons {
    /// Only `button` held.
    pub fn pressing(button: Button) -> Self {
        let mut buttons = Self::default();
        match button {
            Button::Red => buttons.red = true,
            Button::Yellow => buttons.yellow = true,
            Button::Green => buttons.green = true,
            Button::Orange => buttons.orange = true,
            Button::Blue => buttons.blue = true,
        }
        buttons
    }

    /// Vote carried by the buttons: green splits (`false`), orange steals (`true`).
    /// Green wins when both are held.
    pub fn vote(&self) -> Option<bool> {
        if self.green {
            Some(false)
        } else if self.orange {
            Some(true)
        } else {
            None
        }
    }
}

/// A full snapshot of every controller, as read from the input device.
pub type ButtonFrame = [ControllerButtons; CONTROLLER_COUNT];

/// Frame with a single button held on a single controller.
pub fn single_press(controller: usize, button: Button) -> ButtonFrame {
    let mut frame = ButtonFrame::default();
    if let Some(slot) = frame.get_mut(controller) {
        *slot = ControllerButtons::pressing(button);
    }
    frame
}

/// Result of running admission over the latest frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arbitration {
    /// Nobody eligible pressed red.
    Idle,
    /// Red pressed while the window was not open; these controllers are now penalized.
    FalseStart(Vec<usize>),
    /// The window is armed but its deadline passed.
    WindowClosed,
    /// Eligible presses all came from penalized controllers.
    Penalized(Vec<usize>),
    /// First eligible controller without a running penalty.
    Winner(usize),
}

/// Button state, penalty clock and reading window of the four controllers.
#[derive(Debug, Clone)]
pub struct BuzzArbiter {
    buttons: ButtonFrame,
    timeouts: [Instant; CONTROLLER_COUNT],
    reading: bool,
    reading_until: Instant,
    penalty: Duration,
}

impl BuzzArbiter {
    pub fn new(penalty: Duration, now: Instant) -> Self {
        Self {
            buttons: ButtonFrame::default(),
            timeouts: [now; CONTROLLER_COUNT],
            reading: false,
            reading_until: now,
            penalty,
        }
    }

    /// Replace the state of every controller with `frame`.
    pub fn ingest_frame(&mut self, frame: ButtonFrame) {
        self.buttons = frame;
    }

    pub fn buttons(&self) -> &ButtonFrame {
        &self.buttons
    }

    /// Open (or restart) the reading window.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.reading = true;
        self.reading_until = now + duration;
    }

    pub fn disarm(&mut self) {
        self.reading = false;
    }

    pub fn is_armed(&self) -> bool {
        self.reading
    }

    /// Deadline of the current window.
    pub fn reading_until(&self) -> Instant {
        self.reading_until
    }

    pub fn is_penalized(&self, controller: usize, now: Instant) -> bool {
        self.timeouts
            .get(controller)
            .is_some_and(|until| now < *until)
    }

    /// Playing, not used on this question and not serving a penalty.
    pub fn eligible(
        &self,
        controller: usize,
        playing: &BTreeSet<usize>,
        used: &BTreeSet<usize>,
        now: Instant,
    ) -> bool {
        playing.contains(&controller)
            && !used.contains(&controller)
            && !self.is_penalized(controller, now)
    }

    /// Decide who, if anyone, takes the buzz from the current frame.
    pub fn arbitrate(
        &mut self,
        playing: &BTreeSet<usize>,
        used: &BTreeSet<usize>,
        now: Instant,
    ) -> Arbitration {
        let pressed: Vec<usize> = (0..CONTROLLER_COUNT)
            .filter(|c| self.buttons[*c].red && playing.contains(c) && !used.contains(c))
            .collect();
        if pressed.is_empty() {
            return Arbitration::Idle;
        }

        if !self.reading {
            for controller in &pressed {
                self.timeouts[*controller] = now + self.penalty;
            }
            info!(controllers = ?pressed, "buzz before the window opened; penalized");
            return Arbitration::FalseStart(pressed);
        }

        if now > self.reading_until {
            debug!(controllers = ?pressed, "buzz after the window closed");
            return Arbitration::WindowClosed;
        }

        match pressed.iter().find(|c| !self.is_penalized(**c, now)) {
            Some(winner) => {
                info!(controller = winner, "buzz admitted");
                Arbitration::Winner(*winner)
            }
            None => {
                debug!(controllers = ?pressed, "buzz from penalized controllers ignored");
                Arbitration::Penalized(pressed)
            }
        }
    }

    /// Votes cast in the current frame by eligible controllers, in controller order.
    ///
    /// Nothing counts once the window deadline has passed.
    pub fn collect_votes(
        &self,
        playing: &BTreeSet<usize>,
        used: &BTreeSet<usize>,
        now: Instant,
    ) -> Vec<(usize, bool)> {
        if !self.reading || now > self.reading_until {
            return Vec::new();
        }
        (0..CONTROLLER_COUNT)
            .filter(|c| self.eligible(*c, playing, used, now))
            .filter_map(|c| self.buttons[c].vote().map(|steal| (c, steal)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::{Clock, ManualClock};

    const PENALTY: Duration = Duration::from_secs(5);

    fn everyone() -> BTreeSet<usize> {
        (0..CONTROLLER_COUNT).collect()
    }

    fn frame(reds: &[usize]) -> ButtonFrame {
        let mut frame = ButtonFrame::default();
        for c in reds {
            frame[*c].red = true;
        }
        frame
    }

    #[test]
    fn press_before_arming_penalizes_every_presser() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.ingest_frame(frame(&[0, 2]));

        let outcome = arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now());
        assert_eq!(outcome, Arbitration::FalseStart(vec![0, 2]));
        assert!(arbiter.is_penalized(0, clock.now()));
        assert!(!arbiter.is_penalized(1, clock.now()));
        assert!(arbiter.is_penalized(2, clock.now()));
    }

    #[test]
    fn penalty_expires_exactly_at_deadline() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.ingest_frame(frame(&[1]));
        arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now());

        arbiter.arm(clock.now(), Duration::from_secs(60));
        clock.advance(PENALTY - Duration::from_millis(1));
        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Penalized(vec![1])
        );

        clock.advance(Duration::from_millis(1));
        assert!(!arbiter.is_penalized(1, clock.now()));
        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Winner(1)
        );
    }

    #[test]
    fn lowest_index_wins_simultaneous_presses() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.arm(clock.now(), Duration::from_secs(20));
        arbiter.ingest_frame(frame(&[3, 1]));

        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Winner(1)
        );
    }

    #[test]
    fn penalized_presser_is_skipped_for_the_next_one() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.ingest_frame(frame(&[0]));
        arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now());

        arbiter.arm(clock.now(), Duration::from_secs(20));
        arbiter.ingest_frame(frame(&[0, 2]));
        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Winner(2)
        );
    }

    #[test]
    fn window_closes_after_deadline() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.arm(clock.now(), Duration::from_secs(20));
        arbiter.ingest_frame(frame(&[0]));

        clock.advance(Duration::from_secs(20));
        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Winner(0)
        );

        clock.advance(Duration::from_millis(1));
        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::WindowClosed
        );
        assert!(!arbiter.is_penalized(0, clock.now()));
    }

    #[test]
    fn rearming_restarts_the_window() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.arm(clock.now(), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        arbiter.arm(clock.now(), Duration::from_secs(1));
        arbiter.ingest_frame(frame(&[0]));

        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Winner(0)
        );
    }

    #[test]
    fn used_and_benched_controllers_are_ignored() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.ingest_frame(frame(&[0, 1, 3]));
        let playing: BTreeSet<usize> = [0, 1].into();
        let used: BTreeSet<usize> = [0].into();

        assert_eq!(
            arbiter.arbitrate(&playing, &used, clock.now()),
            Arbitration::FalseStart(vec![1])
        );
        assert!(!arbiter.is_penalized(3, clock.now()));
        assert!(!arbiter.eligible(0, &playing, &used, clock.now()));
    }

    #[test]
    fn released_buttons_do_not_stick() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.ingest_frame(frame(&[2]));
        arbiter.ingest_frame(ButtonFrame::default());
        arbiter.arm(clock.now(), Duration::from_secs(20));

        assert_eq!(
            arbiter.arbitrate(&everyone(), &BTreeSet::new(), clock.now()),
            Arbitration::Idle
        );
    }

    #[test]
    fn votes_need_an_armed_window_and_green_wins() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        let mut votes = ButtonFrame::default();
        votes[0].green = true;
        votes[0].orange = true;
        votes[1].orange = true;
        votes[2].yellow = true;
        arbiter.ingest_frame(votes);

        let playing: BTreeSet<usize> = [0, 1, 2].into();
        assert!(
            arbiter
                .collect_votes(&playing, &BTreeSet::new(), clock.now())
                .is_empty()
        );

        arbiter.arm(clock.now(), Duration::from_secs(20));
        assert_eq!(
            arbiter.collect_votes(&playing, &BTreeSet::new(), clock.now()),
            vec![(0, false), (1, true)]
        );
        assert_eq!(
            arbiter.collect_votes(&playing, &[0].into(), clock.now()),
            vec![(1, true)]
        );
    }

    #[test]
    fn votes_after_the_deadline_are_dropped() {
        let clock = ManualClock::new();
        let mut arbiter = BuzzArbiter::new(PENALTY, clock.now());
        arbiter.arm(clock.now(), Duration::from_secs(20));
        arbiter.ingest_frame(single_press(1, Button::Orange));
        let playing: BTreeSet<usize> = [0, 1].into();

        clock.advance(Duration::from_secs(20));
        assert_eq!(
            arbiter.collect_votes(&playing, &BTreeSet::new(), clock.now()),
            vec![(1, true)]
        );

        clock.advance(Duration::from_millis(1));
        assert!(
            arbiter
                .collect_votes(&playing, &BTreeSet::new(), clock.now())
                .is_empty()
        );
    }

    #[test]
    fn single_press_targets_one_controller() {
        let frame = single_press(2, Button::Orange);
        assert!(frame[2].orange);
        assert_eq!(frame[2].vote(), Some(true));
        assert_eq!(frame[0], ControllerButtons::default());
        assert_eq!(single_press(9, Button::Red), ButtonFrame::default());
    }
}
