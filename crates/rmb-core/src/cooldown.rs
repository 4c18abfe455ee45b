use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{errors::ErrorKind, Error};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// What the delivery loop should do after a failed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Logged, no delay.
    Continue,
    /// Waited out the full cooldown window.
    CooledDown,
    /// Cancelled while cooling down.
    Aborted,
}

/// Failure policy for dispatch errors.
///
/// Every failure is logged. Transport failures additionally hold the current
/// processing path for a fixed window so a failing platform is not hammered.
/// Never panics and never hands the error back.
#[derive(Clone, Copy, Debug)]
pub struct CooldownPolicy {
    cooldown: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownPolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub async fn on_dispatch_failure(&self, err: &Error, cancel: &CancellationToken) -> Recovery {
        match err.kind() {
            ErrorKind::Transport => {
                tracing::warn!(
                    error = %err,
                    cooldown_ms = self.cooldown.as_millis() as u64,
                    "transport failure, cooling down"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("cooldown aborted by cancellation");
                        Recovery::Aborted
                    }
                    _ = sleep(self.cooldown) => Recovery::CooledDown,
                }
            }
            ErrorKind::Cancelled => {
                tracing::debug!("dispatch cancelled");
                Recovery::Continue
            }
            ErrorKind::Programming => {
                tracing::error!(error = %err, "programming error while handling update");
                Recovery::Continue
            }
            ErrorKind::Validation | ErrorKind::NotFound => {
                tracing::warn!(error = %err, "update rejected");
                Recovery::Continue
            }
            ErrorKind::Other => {
                tracing::error!(error = %err, "update handler failed");
                Recovery::Continue
            }
        }
    }
}
