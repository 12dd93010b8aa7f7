//! Navigation failures.
//!
//! Every navigation that does not commit ends with a [`NavigationFailure`].
//! Most failures are ordinary outcomes (a guard said no, a newer navigation
//! took over, the target is already current) and are identified by their
//! [`NavigationFailureType`]. The remaining variants are real errors and are
//! forwarded to the router's error hooks.

use std::fmt;

use thiserror::Error;
use waypost_routing::guard::GuardError;

/// The non-error kinds of navigation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationFailureType {
    /// Guards kept redirecting past the redirect limit.
    Redirected,
    /// A guard aborted the navigation.
    Aborted,
    /// A newer navigation started before this one finished.
    Cancelled,
    /// The target is the current route.
    Duplicated,
}

impl fmt::Display for NavigationFailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Redirected => "redirected",
            Self::Aborted => "aborted",
            Self::Cancelled => "cancelled",
            Self::Duplicated => "duplicated",
        })
    }
}

/// Why a navigation did not commit.
///
/// `from` and `to` are the full paths of the committed route and of the
/// target at the time the navigation stopped.
#[derive(Debug, Clone, Error)]
pub enum NavigationFailure {
    /// The target is already the current route.
    #[error("Avoided redundant navigation to current location: \"{to}\"")]
    Duplicated { from: String, to: String },

    /// A guard answered [`Next::Abort`](waypost_routing::Next::Abort).
    #[error("Navigation aborted from \"{from}\" to \"{to}\" via a navigation guard")]
    Aborted { from: String, to: String },

    /// A newer navigation superseded this one.
    #[error("Navigation cancelled from \"{from}\" to \"{to}\" with a new navigation")]
    Cancelled { from: String, to: String },

    /// Guards redirected more often than the router allows.
    #[error("Redirected when going from \"{from}\" to \"{to}\" too many times via a navigation guard")]
    Redirected { from: String, to: String },

    /// A guard answered with an error.
    #[error("Navigation guard failed going from \"{from}\" to \"{to}\": {error}")]
    Guard {
        from: String,
        to: String,
        error: GuardError,
    },

    /// A guard panicked.
    #[error("Navigation guard panicked going from \"{from}\" to \"{to}\": {message}")]
    GuardPanicked {
        from: String,
        to: String,
        message: String,
    },

    /// A lazy component of the target could not be loaded.
    #[error("Failed to resolve async component {view}: {reason}")]
    AsyncComponent {
        from: String,
        to: String,
        view: String,
        reason: String,
    },
}

impl NavigationFailure {
    /// The failure kind, or `None` for real errors.
    pub const fn kind(&self) -> Option<NavigationFailureType> {
        match self {
            Self::Duplicated { .. } => Some(NavigationFailureType::Duplicated),
            Self::Aborted { .. } => Some(NavigationFailureType::Aborted),
            Self::Cancelled { .. } => Some(NavigationFailureType::Cancelled),
            Self::Redirected { .. } => Some(NavigationFailureType::Redirected),
            Self::Guard { .. } | Self::GuardPanicked { .. } | Self::AsyncComponent { .. } => None,
        }
    }

    /// Returns `true` for failures that are errors rather than outcomes.
    pub const fn is_error(&self) -> bool {
        self.kind().is_none()
    }

    /// Returns `true` if this failure is of kind `kind`.
    pub fn is(&self, kind: NavigationFailureType) -> bool {
        self.kind() == Some(kind)
    }

    /// The full path of the route that was current.
    pub fn from(&self) -> &str {
        match self {
            Self::Duplicated { from, .. }
            | Self::Aborted { from, .. }
            | Self::Cancelled { from, .. }
            | Self::Redirected { from, .. }
            | Self::Guard { from, .. }
            | Self::GuardPanicked { from, .. }
            | Self::AsyncComponent { from, .. } => from,
        }
    }

    /// The full path of the target.
    pub fn to(&self) -> &str {
        match self {
            Self::Duplicated { to, .. }
            | Self::Aborted { to, .. }
            | Self::Cancelled { to, .. }
            | Self::Redirected { to, .. }
            | Self::Guard { to, .. }
            | Self::GuardPanicked { to, .. }
            | Self::AsyncComponent { to, .. } => to,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Error)]
    #[error("not allowed")]
    struct Denied;

    fn paths() -> (String, String) {
        ("/a".to_string(), "/b".to_string())
    }

    #[test]
    fn test_outcome_kinds() {
        let (from, to) = paths();
        let failure = NavigationFailure::Duplicated { from, to };
        assert_eq!(failure.kind(), Some(NavigationFailureType::Duplicated));
        assert!(!failure.is_error());
        assert!(failure.is(NavigationFailureType::Duplicated));
        assert!(!failure.is(NavigationFailureType::Aborted));
    }

    #[test]
    fn test_errors_have_no_kind() {
        let (from, to) = paths();
        let failure = NavigationFailure::Guard {
            from,
            to,
            error: Arc::new(Denied),
        };
        assert!(failure.is_error());
        assert_eq!(failure.kind(), None);
        assert!(failure.to_string().ends_with("not allowed"));
    }

    #[test]
    fn test_from_and_to() {
        let failure = NavigationFailure::AsyncComponent {
            from: "/".into(),
            to: "/lazy".into(),
            view: "default".into(),
            reason: "timed out".into(),
        };
        assert_eq!(failure.from(), "/");
        assert_eq!(failure.to(), "/lazy");
        assert_eq!(
            failure.to_string(),
            "Failed to resolve async component default: timed out"
        );
    }

    #[test]
    fn test_cancelled_message() {
        let failure = NavigationFailure::Cancelled {
            from: "/".into(),
            to: "/slow".into(),
        };
        assert_eq!(
            failure.to_string(),
            "Navigation cancelled from \"/\" to \"/slow\" with a new navigation"
        );
    }
}
