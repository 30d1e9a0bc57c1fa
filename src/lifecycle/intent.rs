//! Pending-intent delivery from asynchronous signals
//!
//! Signal handlers never touch the segment or any other I/O; they only
//! raise a flag. The controller picks flags up between transitions, so an
//! intent arriving mid-transition is processed strictly after the current
//! transition completes. Flags are level-triggered: ten reload signals
//! while a reload is in flight still collapse into one pending reload.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::error::{Result, ShmCastError};

/// What the outside world wants the publisher to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Re-run the data source and replace the segment
    Reload,
    /// Tear the segment down and exit
    Shutdown,
}

/// Source of lifecycle intents polled by the controller
///
/// `poll` must never block; returning `None` means "nothing pending".
/// A pending shutdown must outrank a pending reload.
pub trait IntentSource {
    fn poll(&mut self) -> Option<Intent>;
}

static RELOAD_PENDING: AtomicBool = AtomicBool::new(false);
static SHUTDOWN_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn on_shutdown_signal(_signal: libc::c_int) {
    SHUTDOWN_PENDING.store(true, Ordering::SeqCst);
}

extern "C" fn on_reload_signal(_signal: libc::c_int) {
    RELOAD_PENDING.store(true, Ordering::SeqCst);
}

/// Process-wide signal-driven intent source
///
/// SIGINT and SIGTERM raise the shutdown flag, SIGHUP the reload flag.
/// Only one instance is meaningful per process since the flags are
/// process-global, matching the one-live-segment-per-process model.
pub struct SignalIntents {
    _private: (),
}

impl SignalIntents {
    /// Install the signal handlers and hand back the pollable source
    pub fn install() -> Result<Self> {
        let shutdown = SigAction::new(
            SigHandler::Handler(on_shutdown_signal),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        let reload = SigAction::new(
            SigHandler::Handler(on_reload_signal),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );

        for sig in [Signal::SIGINT, Signal::SIGTERM] {
            unsafe { signal::sigaction(sig, &shutdown) }.map_err(|errno| {
                ShmCastError::platform(format!("sigaction({}) failed: {}", sig, errno))
            })?;
        }
        unsafe { signal::sigaction(Signal::SIGHUP, &reload) }.map_err(|errno| {
            ShmCastError::platform(format!("sigaction(SIGHUP) failed: {}", errno))
        })?;

        Ok(Self { _private: () })
    }
}

impl IntentSource for SignalIntents {
    fn poll(&mut self) -> Option<Intent> {
        // shutdown outranks reload when both are pending
        if SHUTDOWN_PENDING.swap(false, Ordering::SeqCst) {
            Some(Intent::Shutdown)
        } else if RELOAD_PENDING.swap(false, Ordering::SeqCst) {
            Some(Intent::Reload)
        } else {
            None
        }
    }
}
