//! The signed-in principal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use lendix_core::{CompanyId, Role, UserId};

use crate::backend::{BearerToken, LoginResponse, UserProfile};

/// Identity of the person using the console, as returned at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
    pub company_id: Option<CompanyId>,
    pub company_name: Option<String>,
    pub permissions: Option<BTreeSet<String>>,
}

impl Principal {
    /// Whether the principal holds at least one of `allowed`.
    #[must_use]
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|role| self.roles.contains(role))
    }

    /// Whether the principal may manage the catalog, users and branding.
    #[must_use]
    pub fn is_administrative(&self) -> bool {
        self.roles.iter().any(Role::is_administrative)
    }

    /// Comma-separated role labels for display.
    #[must_use]
    pub fn role_labels(&self) -> String {
        self.roles
            .iter()
            .map(Role::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<UserProfile> for Principal {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            roles: profile.roles,
            company_id: profile.company_id,
            company_name: profile.company_name,
            permissions: profile.permissions,
        }
    }
}

/// What the session stores for an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedIn {
    pub principal: Principal,
    pub token: BearerToken,
}

impl From<LoginResponse> for SignedIn {
    fn from(login: LoginResponse) -> Self {
        Self {
            principal: login.user.into(),
            token: BearerToken::new(login.token),
        }
    }
}

#[cfg(test)]
pub(crate) fn principal_with(roles: &[Role]) -> Principal {
    Principal {
        id: UserId::new(1),
        username: "ana".to_string(),
        email: Some("ana@lendix.test".to_string()),
        roles: roles.iter().cloned().collect(),
        company_id: Some(CompanyId::new(7)),
        company_name: Some("Crediya".to_string()),
        permissions: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_has_any_role() {
        let principal = principal_with(&[Role::Advisor]);
        assert!(principal.has_any_role(&[Role::Admin, Role::Advisor]));
        assert!(!principal.has_any_role(&[Role::SuperAdmin, Role::Admin]));
        assert!(!principal.has_any_role(&[]));
    }

    #[test]
    fn test_unknown_roles_are_not_administrative() {
        let principal = principal_with(&[Role::Other("auditor".to_string())]);
        assert!(!principal.is_administrative());
        assert!(principal_with(&[Role::Admin]).is_administrative());
    }

    #[test]
    fn test_signed_in_round_trips_through_session_json() {
        let signed_in = SignedIn {
            principal: principal_with(&[Role::Cashier]),
            token: BearerToken::new("tok"),
        };
        let json = serde_json::to_value(&signed_in).unwrap();
        assert_eq!(json["token"], "tok");
        let back: SignedIn = serde_json::from_value(json).unwrap();
        assert_eq!(back.principal, signed_in.principal);
    }
}
