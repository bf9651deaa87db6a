//! Session-held authentication state.

use super::SignedIn;

/// Where the console stands on who is using it.
///
/// Built from the session store on every request; never revalidated against
/// the backend.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No session is attached to the request yet.
    Unknown,
    /// A principal is signed in.
    Authenticated(Box<SignedIn>),
    /// The session holds no principal.
    Anonymous,
    /// The session store could not be read or held an undecodable principal.
    HydrationFailed(String),
}

impl SessionState {
    /// The signed-in principal, if any.
    #[must_use]
    pub fn signed_in(&self) -> Option<&SignedIn> {
        match self {
            Self::Authenticated(signed_in) => Some(signed_in),
            _ => None,
        }
    }
}

/// Session keys.
pub mod keys {
    /// The signed-in principal and bearer token.
    pub const AUTH: &str = "auth";

    /// The in-progress client + credit wizard.
    pub const WIZARD: &str = "wizard";
}
