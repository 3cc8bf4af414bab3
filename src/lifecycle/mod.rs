//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build store → Start ingest + http servers
//!
//! Shutdown (shutdown.rs):
//!     ctrl-c → Shutdown::trigger → listeners stop accepting
//!         → in-flight receive/persist cycles finish → tasks exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
