// src/commands/interrupt.rs

//! Interrupt handling for a running build
//!
//! Children run in their own process groups, so a terminal Ctrl-C only
//! reaches the builder. The signal handler raises a flag and a watcher thread
//! turns it into a cancellation, which kills the running command's group and
//! stops the pipeline before the next stage.

use anyhow::{Context, Result};
use helmhub_builder::CancelToken;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// How often the watcher checks for a delivered signal
const WATCH_INTERVAL: Duration = Duration::from_millis(50);

/// Set by the signal handler
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Cancel `token` once SIGINT or SIGTERM arrives
pub fn cancel_on_interrupt(token: CancelToken) -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_interrupt),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("Failed to install {:?} handler", signal))?;
    }

    thread::spawn(move || {
        while !INTERRUPTED.load(Ordering::SeqCst) {
            thread::sleep(WATCH_INTERVAL);
        }
        warn!("Interrupted, cancelling build");
        token.cancel();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;
    use std::time::Instant;

    #[test]
    fn test_sigint_cancels_token() {
        let token = CancelToken::new();
        cancel_on_interrupt(token.clone()).unwrap();

        raise(Signal::SIGINT).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !token.is_cancelled() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(token.is_cancelled());
    }
}
