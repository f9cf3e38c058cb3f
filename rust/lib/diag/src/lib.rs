//! Campus diagnostics — client-side logging and error surfacing.
//!
//! Two independent bounded structures live here:
//!
//! - [`LogStore`] — ring buffer of structured [`LogEntry`] values. Appends are
//!   synchronous; each entry is mirrored to the developer console (tracing)
//!   and, in production mode, forwarded to a remote [`LogSink`] on a
//!   fire-and-forget task whose failures are dropped.
//! - [`ErrorSurface`] — the "current error" slot the UI observes, plus an
//!   optional [`DiagnosticTrail`] that host-page crash reporting can read.
//!
//! Neither is a global. Build one of each at startup from a [`DiagConfig`]
//! and hand out `Arc`s; [`ErrorScope`] makes the surface reachable from code
//! that has no other way to receive it.

pub mod config;
pub mod console;
pub mod entry;
pub mod error;
pub mod scope;
pub mod sink;
pub mod store;
pub mod surface;
pub mod trail;

pub use config::{DiagConfig, Mode};
pub use entry::{now_iso8601, Detail, Fault, LogEntry, Severity};
pub use error::{ConfigError, SinkError};
pub use scope::{try_use_error, use_error, ErrorScope};
pub use sink::{HttpSink, LogSink};
pub use store::LogStore;
pub use surface::{ErrorInput, ErrorSurface};
pub use trail::{DiagnosticTrail, TrailEntry};
