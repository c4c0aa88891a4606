//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → acceptor.rs (accept loop, one task per connection)
//!     → connection.rs (registration in the live-set)
//!     → session.rs (idle-timeout read loop → RecordSink)
//!
//! Session states:
//!     Running → {TimedOut, PeerClosed, ReadError} → Terminated
//! ```
//!
//! # Design Decisions
//! - Sessions are registered before they are spawned
//! - Stream close and deregistration happen by drop
//! - No connection cap: every accepted connection gets a session

pub mod acceptor;
pub mod connection;
pub mod listener;
pub mod session;

pub use acceptor::Acceptor;
pub use connection::{ConnectionId, SessionGuard, SessionTracker};
pub use listener::{Accept, Listener, ListenerError};
pub use session::{Session, SessionOutcome};
