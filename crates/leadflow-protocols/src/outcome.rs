//! Result of attempting one lead through the Form Driver.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FillOutcome {
    Success {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        problems: Vec<String>,
    },
    Failure {
        reason: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        problems: Vec<String>,
    },
}

impl FillOutcome {
    pub fn success() -> Self {
        Self::Success {
            problems: Vec::new(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
            problems: Vec::new(),
        }
    }

    /// Attach non-fatal problems found while filling.
    pub fn with_problems(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        match &mut self {
            Self::Success { problems } | Self::Failure { problems, .. } => problems.extend(extra),
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason),
        }
    }

    pub fn problems(&self) -> &[String] {
        match self {
            Self::Success { problems } | Self::Failure { problems, .. } => problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_outcome() {
        let outcome = FillOutcome::success();
        assert!(outcome.is_success());
        assert!(outcome.reason().is_none());
        assert!(outcome.problems().is_empty());
    }

    #[test]
    fn test_failure_with_problems() {
        let outcome = FillOutcome::failure("Save rejected")
            .with_problems(vec!["Mobile field not found".to_string()]);
        assert!(!outcome.is_success());
        assert_eq!(outcome.reason(), Some("Save rejected"));
        assert_eq!(outcome.problems().len(), 1);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(FillOutcome::failure("timeout")).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "timeout");
        assert!(json.get("problems").is_none());
    }
}
