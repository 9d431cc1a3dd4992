//! Error types crossing the bridge boundary

use crate::handle::GuestHandle;

/// A host-domain exception.
///
/// This is what a raised guest error looks like after translation: an
/// exception class name plus a message, ready to be thrown in the host
/// engine. The translation itself is the exception collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct HostException {
    /// Host-side exception class name (e.g. "TypeError").
    pub name: String,
    /// Human-readable message.
    pub message: String,
}

impl HostException {
    /// Create an exception from a class name and message.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Value marshaling failure.
///
/// Raised by the marshaling collaborator when a value has no representation
/// on the other side. The bridge never handles these; they propagate to the
/// caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    /// A host value shape has no guest representation.
    #[error("unsupported host value shape: {shape}")]
    UnsupportedHostShape {
        /// Shape name, as reported by `HostValue::shape_name`.
        shape: &'static str,
    },

    /// A guest value has no host representation.
    #[error("unsupported guest value: {handle:?}")]
    UnsupportedGuestShape {
        /// The offending guest handle.
        handle: GuestHandle,
    },
}
