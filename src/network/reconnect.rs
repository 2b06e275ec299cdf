use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
    /// Reconnect attempts exhausted; only an explicit connect leaves this state.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("offline"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("online"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Failed => f.write_str("connection lost"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(3000),
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectStep {
    Retry { attempt: u32, delay: Duration },
    /// `notify` is true only the first time attempts run out.
    GiveUp { notify: bool },
}

/// Linear backoff with a bounded number of attempts.
#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    policy: ReconnectPolicy,
    attempts: u32,
    failure_reported: bool,
}

impl ReconnectTracker {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            failure_reported: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_connected(&mut self) {
        self.attempts = 0;
        self.failure_reported = false;
    }

    /// Called after every unexpected close or failed reconnect attempt.
    pub fn next_step(&mut self) -> ReconnectStep {
        if self.attempts >= self.policy.max_attempts {
            let notify = !self.failure_reported;
            self.failure_reported = true;
            return ReconnectStep::GiveUp { notify };
        }
        self.attempts += 1;
        ReconnectStep::Retry {
            attempt: self.attempts,
            delay: self.policy.base_delay * self.attempts,
        }
    }
}
