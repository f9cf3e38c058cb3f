//! Developer console mirror.
//!
//! The console is the tracing subscriber the host installed. Entries are
//! emitted at their own level as `"[LEVEL] message"`, with the payload and
//! stack as structured fields.

use tracing::{debug, error, info, warn};

use crate::entry::{LogEntry, Severity};

pub fn mirror(entry: &LogEntry) {
    let data = entry.data.as_ref().map(|v| v.to_string());
    let stack = entry.stack.as_deref();
    match entry.level {
        Severity::Debug => debug!(data = data.as_deref(), "[{}] {}", entry.level, entry.message),
        Severity::Info => info!(data = data.as_deref(), "[{}] {}", entry.level, entry.message),
        Severity::Warn => warn!(data = data.as_deref(), "[{}] {}", entry.level, entry.message),
        Severity::Error => error!(
            data = data.as_deref(),
            stack = stack,
            "[{}] {}",
            entry.level,
            entry.message
        ),
    }
}
