//! Credit application status.

use serde::{Deserialize, Serialize};

/// Lifecycle tag of a credit application.
///
/// Transitions are enforced by the backend. [`CreditStatus::next`] only
/// lists the moves the console offers as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreditStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "aprobado")]
    Approved,
    #[serde(rename = "rechazado")]
    Rejected,
    #[serde(rename = "activo")]
    Active,
    #[serde(rename = "en_mora")]
    Overdue,
    #[serde(rename = "pagado")]
    Paid,
}

impl CreditStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Active,
        Self::Overdue,
        Self::Paid,
    ];

    /// The wire tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Approved => "aprobado",
            Self::Rejected => "rechazado",
            Self::Active => "activo",
            Self::Overdue => "en_mora",
            Self::Paid => "pagado",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Active => "Active",
            Self::Overdue => "Overdue",
            Self::Paid => "Paid",
        }
    }

    /// Statuses the console offers as the next step from this one.
    #[must_use]
    pub const fn next(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Active],
            Self::Active => &[Self::Overdue, Self::Paid],
            Self::Overdue => &[Self::Active, Self::Paid],
            Self::Rejected | Self::Paid => &[],
        }
    }

    /// Whether payments may be recorded against a credit in this status.
    #[must_use]
    pub const fn accepts_payments(&self) -> bool {
        matches!(self, Self::Active | Self::Overdue)
    }
}

impl std::fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CreditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid credit status: {s}"))
    }
}
