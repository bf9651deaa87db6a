//! Wizard state holder.
//!
//! Tracks the current step, the set of completed steps, the client created in
//! step 1 and the data later steps display. One instance lives in each user's
//! session under [`session_keys::WIZARD`](crate::models::session_keys::WIZARD).
//!
//! # Navigation policy
//!
//! - Moving back to any step is always allowed.
//! - Moving forward is allowed up to the first step that is not completed.
//! - Steps 2 through 6 need the client created in step 1.
//!
//! Anything else is [`WizardError::StepLocked`] and leaves the state untouched.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lendix_core::{ClientId, WizardStep};

use crate::backend::{Client, CreditType};

/// Navigation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WizardError {
    /// The requested step cannot be shown yet.
    #[error("{requested} is locked; complete {reachable} first")]
    StepLocked {
        requested: WizardStep,
        reachable: WizardStep,
    },
}

/// Client profile captured in step 1, shown in the header of later steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub nombre: String,
    pub apellido: String,
    pub telefono: String,
}

impl ClientSummary {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            nombre: client.nombre.clone(),
            apellido: client.apellido.clone(),
            telefono: client.telefono.clone(),
        }
    }
}

/// Data accumulated across steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardData {
    /// Set by step 1.
    pub client: Option<ClientSummary>,
    /// Set by step 5, read by step 6.
    pub credit_type: Option<CreditType>,
}

/// Progress through the six wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    current_step: WizardStep,
    completed_steps: BTreeSet<WizardStep>,
    client_id: Option<ClientId>,
    accumulated: WizardData,
}

impl WizardState {
    /// A fresh wizard on step 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The step being shown.
    #[must_use]
    pub const fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// Whether `step` has been completed in this wizard session.
    #[must_use]
    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// Completed steps in order.
    pub fn completed_steps(&self) -> impl Iterator<Item = WizardStep> + '_ {
        self.completed_steps.iter().copied()
    }

    /// The client created in step 1.
    #[must_use]
    pub const fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn set_client_id(&mut self, id: ClientId) {
        self.client_id = Some(id);
    }

    #[must_use]
    pub const fn accumulated(&self) -> &WizardData {
        &self.accumulated
    }

    pub fn accumulated_mut(&mut self) -> &mut WizardData {
        &mut self.accumulated
    }

    /// The furthest step navigation may reach: the first incomplete one.
    #[must_use]
    pub fn first_incomplete_step(&self) -> WizardStep {
        WizardStep::ALL
            .into_iter()
            .find(|step| !self.is_completed(*step))
            .unwrap_or(WizardStep::LAST)
    }

    /// Whether [`set_current_step`](Self::set_current_step) would accept `step`.
    #[must_use]
    pub fn can_visit(&self, step: WizardStep) -> bool {
        if step.requires_client() && self.client_id.is_none() {
            return false;
        }
        step <= self.current_step || step <= self.first_incomplete_step()
    }

    /// Jump to `step`.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::StepLocked`] if the navigation policy forbids it.
    pub fn set_current_step(&mut self, step: WizardStep) -> Result<(), WizardError> {
        if !self.can_visit(step) {
            let reachable = if self.client_id.is_none() {
                WizardStep::FIRST
            } else {
                self.first_incomplete_step()
            };
            return Err(WizardError::StepLocked {
                requested: step,
                reachable,
            });
        }
        self.current_step = step;
        Ok(())
    }

    /// Record `step` as done. Marking twice has no further effect.
    pub fn mark_step_completed(&mut self, step: WizardStep) {
        self.completed_steps.insert(step);
    }

    /// Complete `step` and move to the one after it.
    ///
    /// Returns the new current step, or `None` when `step` was the last.
    pub fn advance_from(&mut self, step: WizardStep) -> Option<WizardStep> {
        self.mark_step_completed(step);
        let next = step.next()?;
        self.current_step = next;
        Some(next)
    }

    /// Forget everything: back to step 1 with no client.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether nothing has happened yet.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn after_client() -> WizardState {
        let mut state = WizardState::new();
        state.set_client_id(ClientId::new(42));
        state.advance_from(WizardStep::Client);
        state
    }

    #[test]
    fn test_new_starts_on_step_one() {
        let state = WizardState::new();
        assert_eq!(state.current_step(), WizardStep::Client);
        assert_eq!(state.completed_steps().count(), 0);
        assert!(state.client_id().is_none());
        assert!(state.is_pristine());
    }

    #[test]
    fn test_completed_steps_only_grow() {
        let mut state = after_client();
        state.advance_from(WizardStep::Documentation);
        state.set_current_step(WizardStep::Client).unwrap();
        state.advance_from(WizardStep::Employment);

        let completed: Vec<_> = state.completed_steps().collect();
        assert_eq!(
            completed,
            [WizardStep::Client, WizardStep::Documentation, WizardStep::Employment]
        );
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let mut state = after_client();
        let before = state.clone();
        state.mark_step_completed(WizardStep::Client);
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut state = after_client();
        state.advance_from(WizardStep::Documentation);
        state.accumulated_mut().client = Some(ClientSummary {
            nombre: "Ana".to_string(),
            apellido: "Quispe".to_string(),
            telefono: "71234567".to_string(),
        });

        state.reset();

        assert_eq!(state.current_step(), WizardStep::Client);
        assert_eq!(state.completed_steps().count(), 0);
        assert!(state.client_id().is_none());
        assert_eq!(state.accumulated(), &WizardData::default());
    }

    #[test]
    fn test_backwards_navigation_always_allowed() {
        let mut state = after_client();
        state.advance_from(WizardStep::Documentation);
        state.set_current_step(WizardStep::Client).unwrap();
        assert_eq!(state.current_step(), WizardStep::Client);
    }

    #[test]
    fn test_forward_navigation_up_to_first_incomplete() {
        let mut state = after_client();
        state.advance_from(WizardStep::Documentation);
        state.set_current_step(WizardStep::Client).unwrap();

        // Step 3 is the first incomplete one.
        state.set_current_step(WizardStep::Employment).unwrap();
        let err = state.set_current_step(WizardStep::Address).unwrap_err();
        assert_eq!(
            err,
            WizardError::StepLocked {
                requested: WizardStep::Address,
                reachable: WizardStep::Employment,
            }
        );
        assert_eq!(state.current_step(), WizardStep::Employment);
    }

    #[test]
    fn test_steps_after_one_need_a_client() {
        let mut state = WizardState::new();
        let before = state.clone();
        for step in &WizardStep::ALL[1..] {
            assert!(state.set_current_step(*step).is_err());
        }
        assert_eq!(state, before);
    }

    #[test]
    fn test_advance_from_last_stays_put() {
        let mut state = after_client();
        for step in [
            WizardStep::Documentation,
            WizardStep::Employment,
            WizardStep::Address,
            WizardStep::CreditType,
        ] {
            state.advance_from(step);
        }
        assert_eq!(state.current_step(), WizardStep::Credit);
        assert_eq!(state.advance_from(WizardStep::Credit), None);
        assert_eq!(state.current_step(), WizardStep::Credit);
        assert!(state.is_completed(WizardStep::Credit));
    }

    #[test]
    fn test_survives_session_serialization() {
        let state = after_client();
        let json = serde_json::to_string(&state).unwrap();
        let back: WizardState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
