//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry (hub per request, HTTP transaction)
//! 2. `TraceLayer` (`http_request` span with status and latency)
//! 3. Session layer (in-memory store, `SameSite=Strict`)
//! 4. [`teardown_rejected_sessions`] (signs out on backend 401)
//! 5. Route guards, as extractors: [`RequireAuth`], [`RequireRole`]

pub mod auth;
pub mod session;

pub use auth::{
    Access, Administrators, Cashiers, GuardDecision, GuardRejection, Officers, RequireAuth,
    RequireRole, RolePolicy, evaluate,
};
pub use session::{
    SESSION_COOKIE_NAME, SessionContext, SessionRejected, create_session_layer,
    teardown_rejected_sessions,
};
