//! Steps of the client registration wizard.

use serde::{Deserialize, Serialize};

/// Error returned when a step number is outside `1..=6`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("wizard step must be between 1 and 6, got {0}")]
pub struct StepOutOfRange(pub u8);

/// One of the six fixed steps of the "client + credit" wizard.
///
/// Ordering follows the step number, so a `BTreeSet<WizardStep>` iterates in
/// the order the steps are shown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    /// Client identity. Produces the client ID every later step needs.
    #[default]
    Client,
    /// National ID number and scanned document.
    Documentation,
    /// Employer, position and salary.
    Employment,
    /// Home address.
    Address,
    /// Pick a credit product from the catalog.
    CreditType,
    /// File the credit application.
    Credit,
}

impl WizardStep {
    /// All steps in order.
    pub const ALL: [Self; 6] = [
        Self::Client,
        Self::Documentation,
        Self::Employment,
        Self::Address,
        Self::CreditType,
        Self::Credit,
    ];

    /// The first step.
    pub const FIRST: Self = Self::Client;

    /// The last step.
    pub const LAST: Self = Self::Credit;

    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Client => 1,
            Self::Documentation => 2,
            Self::Employment => 3,
            Self::Address => 4,
            Self::CreditType => 5,
            Self::Credit => 6,
        }
    }

    /// Look up a step by its 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`StepOutOfRange`] for numbers outside `1..=6`.
    pub const fn from_number(n: u8) -> Result<Self, StepOutOfRange> {
        match n {
            1 => Ok(Self::Client),
            2 => Ok(Self::Documentation),
            3 => Ok(Self::Employment),
            4 => Ok(Self::Address),
            5 => Ok(Self::CreditType),
            6 => Ok(Self::Credit),
            other => Err(StepOutOfRange(other)),
        }
    }

    /// The step after this one, or `None` for the last step.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Client => Some(Self::Documentation),
            Self::Documentation => Some(Self::Employment),
            Self::Employment => Some(Self::Address),
            Self::Address => Some(Self::CreditType),
            Self::CreditType => Some(Self::Credit),
            Self::Credit => None,
        }
    }

    /// Whether this step needs the client created in step 1.
    #[must_use]
    pub const fn requires_client(self) -> bool {
        !matches!(self, Self::Client)
    }

    /// Short title for the step indicator.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Documentation => "Documentation",
            Self::Employment => "Employment",
            Self::Address => "Address",
            Self::CreditType => "Credit type",
            Self::Credit => "Credit",
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = StepOutOfRange;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n)
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_follow_order() {
        for (i, step) in WizardStep::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(step.number()), i + 1);
            assert_eq!(WizardStep::from_number(step.number()).unwrap(), step);
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(WizardStep::from_number(0), Err(StepOutOfRange(0)));
        assert_eq!(WizardStep::from_number(7), Err(StepOutOfRange(7)));
        assert!(serde_json::from_str::<WizardStep>("9").is_err());
    }

    #[test]
    fn test_next_chain_ends_at_last() {
        let mut step = WizardStep::FIRST;
        let mut seen = 1;
        while let Some(next) = step.next() {
            assert!(next > step);
            step = next;
            seen += 1;
        }
        assert_eq!(step, WizardStep::LAST);
        assert_eq!(seen, 6);
    }

    #[test]
    fn test_only_first_step_is_client_free() {
        assert!(!WizardStep::Client.requires_client());
        assert!(WizardStep::ALL[1..].iter().all(|s| s.requires_client()));
    }
}
