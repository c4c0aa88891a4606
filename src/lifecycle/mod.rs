//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Initialize logging → Bind listener → Start accepting
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Close listener → Drain sessions → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and exits non-zero
//! - Ordered shutdown: stop accept, then drain
//! - No forced exit: drain is bounded by the session read timeout

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::ShutdownCoordinator;
pub use signals::{wait_for_signal, ShutdownSignal};
pub use startup::{bind_listener, resolve_config, ConfigOverrides, StartupError};
