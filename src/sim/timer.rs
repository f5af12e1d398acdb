/// Registration-expiry countdown (multiplayer only).
///
/// Two states: Active (counting down) and Expired (inert). `tick` is driven
/// by the outer frame loop with the elapsed time since the previous frame.
/// The expiry fires once per Active period; the caller performs the
/// fallback action when `tick` reports it.

use std::time::Duration;

pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(60);

/// Result of one `tick` while Active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Remaining time rounded up to whole seconds.
    pub seconds: u64,
    /// True exactly once, on the tick that reached zero.
    pub fired: bool,
}

#[derive(Clone, Debug)]
pub struct ExpiryTimer {
    length: Duration,
    remaining: Duration,
    expired: bool,
}

impl ExpiryTimer {
    pub fn new(length: Duration) -> Self {
        ExpiryTimer { length, remaining: length, expired: false }
    }

    /// Advance by `delta`. Returns `None` while Expired.
    pub fn tick(&mut self, delta: Duration) -> Option<TickReport> {
        if self.expired {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(delta);

        let fired = self.remaining.is_zero();
        if fired {
            self.expired = true;
        }
        Some(TickReport { seconds: ceil_secs(self.remaining), fired })
    }

    /// Back to Active with a full countdown, from any state.
    pub fn reset(&mut self) {
        self.remaining = self.length;
        self.expired = false;
    }

    /// Stop without firing.
    pub fn halt(&mut self) {
        self.expired = true;
    }

    #[cfg(test)]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time as shown to the player.
    pub fn seconds_left(&self) -> u64 {
        ceil_secs(self.remaining)
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

impl Default for ExpiryTimer {
    fn default() -> Self {
        ExpiryTimer::new(DEFAULT_COUNTDOWN)
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_active_at_sixty() {
        let t = ExpiryTimer::default();
        assert_eq!(t.remaining(), Duration::from_secs(60));
        assert!(!t.is_expired());
    }

    #[test]
    fn display_is_ceiling_of_remaining() {
        let mut t = ExpiryTimer::default();
        assert_eq!(t.tick(ms(16)).map(|r| r.seconds), Some(60));
        assert_eq!(t.tick(ms(984)).map(|r| r.seconds), Some(59));
        assert_eq!(t.tick(ms(1)).map(|r| r.seconds), Some(59));
    }

    #[test]
    fn fires_once_after_sixty_seconds() {
        let mut t = ExpiryTimer::default();
        let mut fired = 0;
        // 60s in 16ms+ frames: 3750 * 16ms = 60s
        for _ in 0..3750 {
            if let Some(r) = t.tick(ms(16)) {
                if r.fired {
                    fired += 1;
                }
            }
        }
        assert!(t.is_expired());
        assert_eq!(fired, 1);
        assert_eq!(t.remaining(), Duration::ZERO);

        for _ in 0..100 {
            assert_eq!(t.tick(ms(16)), None);
        }
    }

    #[test]
    fn last_tick_reports_zero() {
        let mut t = ExpiryTimer::new(Duration::from_secs(2));
        assert_eq!(t.tick(Duration::from_secs(1)), Some(TickReport { seconds: 1, fired: false }));
        assert_eq!(t.tick(Duration::from_secs(5)), Some(TickReport { seconds: 0, fired: true }));
    }

    #[test]
    fn halt_prevents_firing() {
        let mut t = ExpiryTimer::default();
        t.tick(Duration::from_secs(30));
        t.halt();
        assert!(t.is_expired());
        assert_eq!(t.tick(Duration::from_secs(120)), None);
    }

    #[test]
    fn reset_restores_full_countdown() {
        let mut t = ExpiryTimer::default();
        t.tick(Duration::from_secs(61));
        assert!(t.is_expired());
        t.reset();
        assert_eq!(t.remaining(), Duration::from_secs(60));
        assert!(!t.is_expired());

        t.tick(Duration::from_secs(10));
        t.reset();
        assert_eq!(t.remaining(), Duration::from_secs(60));

        let again = t.tick(Duration::from_secs(60)).unwrap();
        assert!(again.fired);
    }
}
