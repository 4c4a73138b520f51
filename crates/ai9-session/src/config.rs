use std::time::Duration;

/// Session behavior configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Bound on every wait for a queued message. `None` waits forever, which
    /// is how the device has always been driven; set it when a missing reply
    /// should surface as [`SessionError::Timeout`](crate::SessionError::Timeout).
    pub response_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Convenience constructor with a response bound.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            response_timeout: Some(timeout),
        }
    }
}
