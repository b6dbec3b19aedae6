//! Configuration errors reported by the builder.

use thiserror::Error;

/// A malformed machine configuration.
///
/// States and triggers are recorded by their display names so the error
/// does not carry the machine's type parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("superstate chain through '{state}' is cyclic")]
    CyclicHierarchy { state: String },

    #[error("'{state}' is already a substate of '{existing}' and cannot also be a substate of '{requested}'")]
    ConflictingSuperstate {
        state: String,
        existing: String,
        requested: String,
    },

    #[error("initial transition target '{target}' of '{state}' is not one of its substates")]
    InitialTargetNotSubstate { state: String, target: String },

    #[error("permit on trigger '{trigger}' from '{state}' targets the state itself; use permit_reentry or ignore instead")]
    PermitToSelf { state: String, trigger: String },

    #[error("'{state}' declares more than one initial transition")]
    DuplicateInitialTransition { state: String },

    #[error("{} configuration errors: {}", .0.len(), join(.0))]
    Multiple(Vec<ConfigurationError>),
}

fn join(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigurationError {
    /// Collapse accumulated problems: one stays itself, several become
    /// `Multiple`.
    pub(crate) fn from_all(mut errors: Vec<ConfigurationError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Multiple(errors)
        }
    }

    /// Individual problems, flattening `Multiple`.
    pub fn problems(&self) -> Vec<&ConfigurationError> {
        match self {
            Self::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_error_is_not_wrapped() {
        let error = ConfigurationError::from_all(vec![ConfigurationError::CyclicHierarchy {
            state: "A".to_string(),
        }]);
        assert!(matches!(error, ConfigurationError::CyclicHierarchy { .. }));
        assert_eq!(error.problems().len(), 1);
    }

    #[test]
    fn multiple_errors_list_every_problem() {
        let error = ConfigurationError::from_all(vec![
            ConfigurationError::CyclicHierarchy {
                state: "A".to_string(),
            },
            ConfigurationError::PermitToSelf {
                state: "B".to_string(),
                trigger: "go".to_string(),
            },
        ]);
        let message = error.to_string();
        assert!(message.starts_with("2 configuration errors"));
        assert!(message.contains("'A' is cyclic"));
        assert!(message.contains("trigger 'go' from 'B'"));
        assert_eq!(error.problems().len(), 2);
    }
}
