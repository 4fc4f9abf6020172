//! Form workflow state for front ends that collect one record at a time.
//!
//! A [`Session`] is owned by the caller and passed along with each
//! interaction; nothing here is global.

use thiserror::Error;

use crate::features::FeatureVector;
use crate::inference::InferenceService;
use crate::prediction::PredictionResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Collecting measurements; `draft` holds the current form values.
    AwaitingInput { draft: FeatureVector },
    /// A prediction is on display. `editing` is set while the user revises
    /// the inputs next to the result.
    ShowingResult {
        input: FeatureVector,
        result: PredictionResult,
        editing: bool,
    },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInput { .. } => "awaiting input",
            Self::ShowingResult { editing: false, .. } => "showing a result",
            Self::ShowingResult { editing: true, .. } => "editing a result",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Start with an all-zero draft.
    pub fn new() -> Self {
        Self {
            state: SessionState::AwaitingInput {
                draft: FeatureVector::default(),
            },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The prediction on display, if any.
    pub fn result(&self) -> Option<&PredictionResult> {
        match &self.state {
            SessionState::ShowingResult { result, .. } => Some(result),
            SessionState::AwaitingInput { .. } => None,
        }
    }

    /// Replace the draft while collecting input.
    pub fn set_draft(&mut self, features: FeatureVector) -> Result<(), SessionError> {
        match &mut self.state {
            SessionState::AwaitingInput { draft } => {
                *draft = features;
                Ok(())
            }
            other => Err(invalid("edit the draft", other)),
        }
    }

    /// Predict for `features` and show the result.
    pub fn submit(
        &mut self,
        features: FeatureVector,
        service: &InferenceService,
    ) -> Result<PredictionResult, SessionError> {
        if !matches!(self.state, SessionState::AwaitingInput { .. }) {
            return Err(invalid("submit", &self.state));
        }
        Ok(self.show(features, service))
    }

    /// Open the inputs for revision alongside the current result.
    pub fn begin_edit(&mut self) -> Result<(), SessionError> {
        match &mut self.state {
            SessionState::ShowingResult { editing, .. } => {
                *editing = true;
                Ok(())
            }
            other => Err(invalid("begin editing", other)),
        }
    }

    /// Recompute the result for revised inputs and close the editor.
    pub fn update(
        &mut self,
        features: FeatureVector,
        service: &InferenceService,
    ) -> Result<PredictionResult, SessionError> {
        if !matches!(self.state, SessionState::ShowingResult { editing: true, .. }) {
            return Err(invalid("update", &self.state));
        }
        Ok(self.show(features, service))
    }

    /// Leave the result view, keeping the last input as the new draft.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::ShowingResult { input, .. } => {
                self.state = SessionState::AwaitingInput { draft: input };
                Ok(())
            }
            ref other => Err(invalid("reset", other)),
        }
    }

    fn show(&mut self, input: FeatureVector, service: &InferenceService) -> PredictionResult {
        let result = service.predict(&input);
        self.state = SessionState::ShowingResult {
            input,
            result,
            editing: false,
        };
        result
    }
}

fn invalid(action: &'static str, state: &SessionState) -> SessionError {
    SessionError::InvalidTransition {
        action,
        state: state.name(),
    }
}
