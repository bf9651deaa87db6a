//! Role tags carried by an authenticated principal.

use serde::{Deserialize, Serialize};

/// A role tag as issued by the lending backend.
///
/// The backend is free to introduce new roles; unknown tags are kept as
/// [`Role::Other`] so a session never fails to hydrate over a new tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Platform operator, spans every company.
    SuperAdmin,
    /// Company administrator: catalog, users, branding.
    Admin,
    /// Loan officer: registers clients and files credit applications.
    Advisor,
    /// Cashier: records payments.
    Cashier,
    /// Any tag this console does not know about.
    Other(String),
}

impl Role {
    /// The wire tag for this role.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "superadmin",
            Self::Admin => "admin",
            Self::Advisor => "asesor",
            Self::Cashier => "cajero",
            Self::Other(tag) => tag,
        }
    }

    /// Human-readable label for menus and badges.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::SuperAdmin => "Super admin",
            Self::Admin => "Administrator",
            Self::Advisor => "Loan officer",
            Self::Cashier => "Cashier",
            Self::Other(tag) => tag,
        }
    }

    /// Whether the role may manage company-wide settings.
    #[must_use]
    pub const fn is_administrative(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl From<String> for Role {
    fn from(tag: String) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "superadmin" | "super_admin" => Self::SuperAdmin,
            "admin" | "administrador" => Self::Admin,
            "asesor" => Self::Advisor,
            "cajero" => Self::Cashier,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for Role {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_owned())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip() {
        for tag in ["superadmin", "admin", "asesor", "cajero"] {
            let role = Role::from(tag);
            assert!(!matches!(role, Role::Other(_)), "{tag} should be known");
            assert_eq!(role.as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let roles: Vec<Role> = serde_json::from_str(r#"["auditor","ADMIN"]"#).unwrap();
        assert_eq!(roles, vec![Role::Other("auditor".into()), Role::Admin]);
        assert_eq!(serde_json::to_string(&roles[0]).unwrap(), "\"auditor\"");
    }

    #[test]
    fn test_is_administrative() {
        assert!(Role::SuperAdmin.is_administrative());
        assert!(Role::Admin.is_administrative());
        assert!(!Role::Advisor.is_administrative());
        assert!(!Role::Other("auditor".into()).is_administrative());
    }
}
