//! Console models held in the session.

mod principal;
mod session;

#[cfg(test)]
pub(crate) use principal::principal_with;
pub use principal::{Principal, SignedIn};
pub use session::{SessionState, keys as session_keys};
