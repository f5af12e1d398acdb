/// Loopback matchmaking adapter.
///
/// Stands in for the real transport: a registration is recorded as
/// pending and logged, and `reset` withdraws it. Nothing leaves the
/// process.

use std::time::{Duration, Instant};

use tracing::info;

use crate::sim::session::NetworkAdapter;

#[derive(Clone, Debug)]
pub struct Registration {
    pub nickname: String,
    pub session_token: String,
    pub timeout: Duration,
    pub sent_at: Instant,
}

impl Registration {
    pub fn timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.sent_at) >= self.timeout
    }
}

#[derive(Debug, Default)]
pub struct LoopbackNetwork {
    pending: Option<Registration>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&Registration> {
        self.pending.as_ref()
    }

    /// Drop a registration nobody answered in time.
    pub fn expire(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|r| r.timed_out(now)) {
            info!("registration timed out");
            self.pending = None;
        }
    }
}

impl NetworkAdapter for LoopbackNetwork {
    fn register(&mut self, nickname: &str, timeout: Duration, session_token: &str) {
        info!(%nickname, %session_token, timeout_secs = timeout.as_secs(), "registration sent");
        self.pending = Some(Registration {
            nickname: nickname.to_string(),
            session_token: session_token.to_string(),
            timeout,
            sent_at: Instant::now(),
        });
    }

    fn reset(&mut self) {
        if self.pending.take().is_some() {
            info!("registration withdrawn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_reset_clears_pending() {
        let mut net = LoopbackNetwork::new();
        net.register("Alice", Duration::from_secs(30), "Level_1 maps/level1.tmx");
        assert_eq!(net.pending().map(|r| r.session_token.as_str()), Some("Level_1 maps/level1.tmx"));
        net.reset();
        assert!(net.pending().is_none());
    }

    #[test]
    fn expire_drops_old_registration_only() {
        let mut net = LoopbackNetwork::new();
        net.register("Alice", Duration::from_secs(30), "t");
        let sent = net.pending().unwrap().sent_at;

        net.expire(sent + Duration::from_secs(10));
        assert!(net.pending().is_some());
        net.expire(sent + Duration::from_secs(30));
        assert!(net.pending().is_none());
    }
}
