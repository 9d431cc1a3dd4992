//! Bridge error taxonomy
//!
//! Every guest-side error is translated exactly once at the bridge
//! boundary and carried by one of these variants; after that it behaves as
//! an ordinary host error. Marshaling failures from the collaborator pass
//! through untranslated.

use gangway_sdk::{HostException, MarshalError};

/// Errors surfaced at the bridge boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// The guest raised while instantiating. No proxy was created and no
    /// guest handle was rooted.
    #[error("construction of {class} failed: {exception}")]
    Construction {
        /// Display name of the guest class.
        class: String,
        /// The translated guest error.
        exception: HostException,
    },

    /// The guest raised during a method call or inside its callback
    /// trampoline. Local to that one invocation; nothing is retried.
    #[error("call to {method} failed: {exception}")]
    Invocation {
        /// Host-visible method name.
        method: String,
        /// The translated guest error.
        exception: HostException,
    },

    /// The name is not on the class template's method surface. Methods
    /// added to the guest class after its template was built land here;
    /// the template snapshot is never refreshed.
    #[error("class {class} has no method {method}")]
    UnknownMethod {
        /// Display name of the guest class.
        class: String,
        /// The requested method name.
        method: String,
    },

    /// The marshaling collaborator rejected a value shape.
    #[error(transparent)]
    Unsupported(#[from] MarshalError),
}

impl BridgeError {
    /// The translated guest exception, when this error carries one.
    pub fn exception(&self) -> Option<&HostException> {
        match self {
            Self::Construction { exception, .. } | Self::Invocation { exception, .. } => {
                Some(exception)
            }
            Self::UnknownMethod { .. } | Self::Unsupported(_) => None,
        }
    }
}
