//! Tagged states delivered over the course of one fetch cycle.

use std::fmt;

/// Error condition surfaced alongside a resource state: an HTTP-ish code
/// and a human-readable message. Code 0 marks a non-HTTP origin such as a
/// transport, decode or cache failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    pub code: u16,
    pub message: String,
}

impl fmt::Display for ErrorSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// One state of a cache-backed fetch cycle.
///
/// A cycle emits exactly one `Loading` followed by exactly one terminal
/// state, `Success` or `Error`. Values always come from the cache, so a
/// `Success` after a fetch reports what was actually committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    /// Fetch under way; carries whatever the cache held when it started.
    Loading { cached: Option<T> },
    /// Terminal: the cache holds `value`.
    Success { value: T },
    /// Terminal: the fetch failed; `cached` is the last known good value.
    Error { cause: ErrorSignal, cached: Option<T> },
}

impl<T> Resource<T> {
    /// Whatever value this state carries, fresh or stale.
    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Loading { cached } => cached.as_ref(),
            Resource::Success { value } => Some(value),
            Resource::Error { cached, .. } => cached.as_ref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resource::Loading { .. })
    }

    /// Whether this state ends its cycle.
    pub fn is_terminal(&self) -> bool {
        !self.is_loading()
    }

    pub fn error(&self) -> Option<&ErrorSignal> {
        match self {
            Resource::Error { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
