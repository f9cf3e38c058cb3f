use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current UTC time as ISO-8601 with millisecond precision (`...T12:00:00.000Z`).
pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured log record. Immutable once built.
///
/// Serializes as `{"level", "message", "timestamp", "data"?, "stack"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: Severity,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl LogEntry {
    pub fn new(level: Severity, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: now_iso8601(),
            data,
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

/// A structured fault: a message plus an optional stack.
///
/// The stack is the chain of underlying causes when built from an error,
/// one frame per line, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Build a fault from an error, walking its `source()` chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut lines = vec![format!("Error: {}", err)];
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("    caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack: Some(lines.join("\n")),
        }
    }

    /// JSON form used as a log entry's `data`.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "message": self.message })
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What accompanies an `error()` log call.
///
/// A [`Fault`] contributes both `data` and `stack`; plain data has no stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Detail {
    #[default]
    None,
    Data(Value),
    Fault(Fault),
}

impl Detail {
    pub(crate) fn into_parts(self) -> (Option<Value>, Option<String>) {
        match self {
            Detail::None => (None, None),
            Detail::Data(v) => (Some(v), None),
            Detail::Fault(f) => (Some(f.to_value()), f.stack),
        }
    }
}

impl From<Value> for Detail {
    fn from(value: Value) -> Self {
        Detail::Data(value)
    }
}

impl From<Option<Value>> for Detail {
    fn from(value: Option<Value>) -> Self {
        value.map(Detail::Data).unwrap_or_default()
    }
}

impl From<Fault> for Detail {
    fn from(fault: Fault) -> Self {
        Detail::Fault(fault)
    }
}

impl From<&Fault> for Detail {
    fn from(fault: &Fault) -> Self {
        Detail::Fault(fault.clone())
    }
}
