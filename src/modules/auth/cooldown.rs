use log::debug;

/// Whole-second countdown owned by a single flow.
///
/// The owner calls [`Countdown::tick`] once per elapsed second. After
/// [`Countdown::cancel`] the countdown sits at zero and ignores ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    cancelled: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, seconds: u32) {
        if self.cancelled {
            return;
        }
        self.remaining = seconds;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.remaining > 0
    }

    /// Advances one second. Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.cancelled || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            debug!("Countdown elapsed");
            return true;
        }
        false
    }

    /// Applies several elapsed seconds at once; returns whether zero was reached
    pub fn advance(&mut self, seconds: u64) -> bool {
        let mut elapsed = false;
        for _ in 0..seconds.min(u64::from(self.remaining)) {
            elapsed |= self.tick();
        }
        elapsed
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
