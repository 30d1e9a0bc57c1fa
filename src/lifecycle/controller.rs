//! Signal-driven lifecycle state machine
//!
//! One logical thread of control: the controller alternates between an
//! idle wait and intent processing, with at most one transition in flight.
//! All segment and data source work happens here, never in signal-handler
//! context.

use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::codec::Strategy;
use crate::error::{Result, ShmCastError};
use crate::segment::{SegmentHandle, SegmentKey, SegmentManager};
use crate::source::DataSource;

use super::intent::{Intent, IntentSource};

/// Default idle wait between intent polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Where the publisher currently is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, nothing published yet
    Init,
    /// Segment live, waiting for intents
    Running,
    /// Replacing the segment after a reload intent
    Reloading,
    /// Shutdown intent accepted, cleanup in progress
    Terminating,
    /// Terminal; the process exits from here
    Closed,
}

/// Serializes publish/reload/shutdown against one live segment
///
/// Owns all of the publisher's mutable state: the derived key, the
/// current handle, and the lifecycle state. Nothing lives in process
/// globals except the signal flags.
pub struct LifecycleController<S> {
    manager: SegmentManager,
    source: S,
    key: SegmentKey,
    strategy: Strategy,
    poll_interval: Duration,
    state: LifecycleState,
    handle: Option<SegmentHandle>,
}

impl<S: DataSource> LifecycleController<S> {
    /// Controller in the `Init` state; nothing is published until
    /// [`start`](Self::start)
    pub fn new(manager: SegmentManager, key: SegmentKey, strategy: Strategy, source: S) -> Self {
        Self {
            manager,
            source,
            key,
            strategy,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: LifecycleState::Init,
            handle: None,
        }
    }

    /// Override the idle wait between intent polls
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The key the segment is (or will be) published under
    pub fn segment_key(&self) -> SegmentKey {
        self.key
    }

    /// First publish: `Init` → `Running`.
    ///
    /// A failure here is fatal; the caller is expected to exit nonzero.
    pub fn start(&mut self) -> Result<()> {
        if self.state != LifecycleState::Init {
            return Err(ShmCastError::invalid_parameter(
                "lifecycle",
                "controller already started",
            ));
        }
        match self.publish() {
            Ok(()) => {
                self.state = LifecycleState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Closed;
                Err(e)
            }
        }
    }

    /// Replace the segment: `Running` → `Reloading` → `Running`.
    ///
    /// The old segment goes first since the new payload may need a
    /// different size. A failure after that point leaves no segment at
    /// all; serving stale data silently is not an option, so the error is
    /// fatal to the process.
    pub fn reload(&mut self) -> Result<()> {
        if self.state != LifecycleState::Running {
            return Err(ShmCastError::invalid_parameter(
                "lifecycle",
                "reload is only valid while running",
            ));
        }
        self.state = LifecycleState::Reloading;
        info!("reload requested, replacing segment {}", self.key);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.manager.delete(handle.key()) {
                self.manager.close(handle);
                self.state = LifecycleState::Closed;
                return Err(e);
            }
            self.manager.close(handle);
        }

        match self.publish() {
            Ok(()) => {
                self.state = LifecycleState::Running;
                Ok(())
            }
            Err(e) => {
                error!("reload failed with the previous segment already removed");
                self.state = LifecycleState::Closed;
                Err(e)
            }
        }
    }

    /// Tear down: `Running` → `Terminating` → `Closed`.
    ///
    /// Cleanup is best-effort; a failed deletion is logged and the OS
    /// resource may need external cleanup, but the process still exits
    /// cleanly once the shutdown intent is honored.
    pub fn shutdown(&mut self) {
        self.state = LifecycleState::Terminating;
        info!("shutting down, removing segment {}", self.key);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.manager.delete(handle.key()) {
                warn!("could not remove segment {} during shutdown: {}", self.key, e);
            }
            self.manager.close(handle);
        }
        self.state = LifecycleState::Closed;
    }

    /// Publish once, then serve intents until shutdown.
    ///
    /// Returns `Ok(())` after an honored shutdown intent and `Err` on any
    /// fatal startup or reload failure; the binary maps those to exit
    /// codes 0 and nonzero.
    pub fn run<I: IntentSource>(&mut self, intents: &mut I) -> Result<()> {
        self.start()?;
        loop {
            match intents.poll() {
                Some(Intent::Shutdown) => {
                    self.shutdown();
                    return Ok(());
                }
                Some(Intent::Reload) => self.reload()?,
                None => thread::sleep(self.poll_interval),
            }
        }
    }

    fn publish(&mut self) -> Result<()> {
        let records = self.source.load()?;
        let payload = self.strategy.encode(&records)?;
        let handle = self.manager.create_or_replace(self.key, &payload)?;
        info!(
            "published {} records ({} bytes) to segment {}",
            records.len(),
            payload.len(),
            self.key
        );
        self.handle = Some(handle);
        Ok(())
    }
}
