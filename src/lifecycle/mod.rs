//! Publisher lifecycle: intents, states, and the controller loop

pub mod controller;
pub mod intent;

pub use controller::{LifecycleController, LifecycleState, DEFAULT_POLL_INTERVAL};
pub use intent::{Intent, IntentSource, SignalIntents};
