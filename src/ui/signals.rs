use crate::error::{Result, ToolError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag handed to long-running loops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        Ok(())
    }
}

pub struct GracefulShutdown {
    token: ShutdownToken,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let token = ShutdownToken::new();
        let message_shown = AtomicBool::new(false);

        let token_clone = token.clone();

        ctrlc::set_handler(move || {
            token_clone.cancel();

            if !message_shown.swap(true, Ordering::SeqCst) {
                eprintln!("\n🛑 Stopping after the current item... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\n💀 Force stopping...");
                std::process::exit(130);
            }
        })
        .map_err(|e| ToolError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self { token })
    }

    /// Create a GracefulShutdown instance for testing (no signal handler registration)
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self {
            token: ShutdownToken::new(),
        }
    }

    pub fn token(&self) -> ShutdownToken {
        self.token.clone()
    }

    pub fn check_shutdown(&self) -> Result<()> {
        self.token.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_token_stops_checks() {
        let shutdown = GracefulShutdown::new_for_test();
        assert!(shutdown.check_shutdown().is_ok());

        shutdown.token().cancel();
        assert!(matches!(shutdown.check_shutdown(), Err(ToolError::Cancelled)));
    }

    #[test]
    fn test_token_shares_state() {
        let shutdown = GracefulShutdown::new_for_test();
        let token = shutdown.token();
        let other = token.clone();

        assert!(!token.is_cancelled());
        other.cancel();
        assert!(token.is_cancelled());
        assert!(token.check().is_err());
    }
}
