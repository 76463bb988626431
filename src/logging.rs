//! Logging facade for the endpoint-dispatch library
//!
//! The library only emits records through the `log` crate; installing a
//! backend (env_logger, a tracing bridge, ...) is left to the application.
//! Records are written at `debug` (stage reached, outcome) and `trace`
//! (validated payloads and decoded responses) so tokens never appear at
//! the default levels.

// Re-export the log crate macros used across the crate
pub use log::{debug, trace};
