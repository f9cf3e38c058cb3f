use std::sync::Arc;

use campus_state::{StateCell, SubscriptionId};

use crate::config::DiagConfig;
use crate::entry::{now_iso8601, Fault};
use crate::trail::{DiagnosticTrail, TrailEntry};

/// Something raised to the error surface: a structured fault or a bare string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorInput {
    Fault(Fault),
    Message(String),
}

impl ErrorInput {
    pub fn message(&self) -> &str {
        match self {
            ErrorInput::Fault(f) => &f.message,
            ErrorInput::Message(m) => m,
        }
    }

    fn stack(&self) -> Option<String> {
        match self {
            ErrorInput::Fault(f) => f.stack.clone(),
            ErrorInput::Message(_) => None,
        }
    }
}

impl From<&str> for ErrorInput {
    fn from(message: &str) -> Self {
        ErrorInput::Message(message.to_string())
    }
}

impl From<String> for ErrorInput {
    fn from(message: String) -> Self {
        ErrorInput::Message(message)
    }
}

impl From<Fault> for ErrorInput {
    fn from(fault: Fault) -> Self {
        ErrorInput::Fault(fault)
    }
}

/// The "current error" the UI shows, plus the diagnostic trail.
///
/// The slot holds only the latest message; every `log_error` overwrites it.
/// The trail, when registered, keeps the history with context prefixes.
pub struct ErrorSurface {
    current: StateCell<Option<String>>,
    trail: Option<Arc<DiagnosticTrail>>,
}

impl ErrorSurface {
    /// A surface with no trail registered.
    pub fn new() -> Self {
        Self {
            current: StateCell::new(None),
            trail: None,
        }
    }

    pub fn with_trail(trail: Arc<DiagnosticTrail>) -> Self {
        Self {
            current: StateCell::new(None),
            trail: Some(trail),
        }
    }

    pub fn from_config(config: &DiagConfig) -> Self {
        if config.trail_enabled {
            Self::with_trail(Arc::new(DiagnosticTrail::new(config.trail_capacity)))
        } else {
            Self::new()
        }
    }

    /// The current error message, if any.
    pub fn error(&self) -> Option<String> {
        self.current.get()
    }

    pub fn set_error(&self, error: Option<String>) {
        self.current.set(error);
    }

    pub fn clear_error(&self) {
        self.current.set(None);
    }

    /// Record an error and make it current.
    ///
    /// The console and the trail get `"[context] message"`; the slot gets the
    /// bare message. Returns the prefixed form.
    pub fn log_error(&self, error: impl Into<ErrorInput>, context: Option<&str>) -> String {
        let error = error.into();
        let message = error.message().to_string();
        let full = match context {
            Some(ctx) => format!("[{}] {}", ctx, message),
            None => message.clone(),
        };

        tracing::error!("{}", full);

        if let Some(trail) = &self.trail {
            trail.push(TrailEntry {
                message: full.clone(),
                timestamp: now_iso8601(),
                stack: error.stack(),
            });
        }

        self.current.set(Some(message));
        full
    }

    pub fn trail(&self) -> Option<&Arc<DiagnosticTrail>> {
        self.trail.as_ref()
    }

    /// Observe changes of the current error.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Option<String>) + Send + Sync + 'static,
    {
        self.current.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.current.unsubscribe(id)
    }
}

impl Default for ErrorSurface {
    fn default() -> Self {
        Self::new()
    }
}
