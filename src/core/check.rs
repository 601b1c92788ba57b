//! Check descriptors and the report vocabulary.
//!
//! A [`Check`] is an immutable, named, tagged verification unit. It produces
//! an [`Outcome`]; the chain engine wraps that into a [`CheckReport`] with
//! identity and timing attached.

use crate::core::context::RunContext;
use crate::core::error::LabError;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

impl CheckStatus {
    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warn => "WARN",
            CheckStatus::Skip => "SKIP",
        }
    }
}

/// Outcome of one check execution. Exactly one status; detail is only
/// surfaced for non-pass outcomes.
#[derive(Debug, Serialize, Clone)]
pub struct Outcome {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Outcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Outcome {
            status: CheckStatus::Pass,
            message: Some(message.into()),
            detail: None,
            payload: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Outcome {
            status: CheckStatus::Fail,
            message: Some(message.into()),
            detail: None,
            payload: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Outcome {
            status: CheckStatus::Warn,
            message: Some(message.into()),
            detail: None,
            payload: None,
        }
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Outcome {
            status: CheckStatus::Skip,
            message: Some(message.into()),
            detail: None,
            payload: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

type CheckFn = Box<dyn Fn(&RunContext) -> Result<Outcome, LabError>>;

/// A named, tagged verification unit.
///
/// The run closure must translate expected failures (tool missing, endpoint
/// unreachable) into Fail/Warn outcomes; an `Err` escaping it is downgraded
/// by the chain engine to a Fail report with message "Exception".
pub struct Check {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    run: CheckFn,
}

impl Check {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        tags: &[&str],
        run: impl Fn(&RunContext) -> Result<Outcome, LabError> + 'static,
    ) -> Self {
        Check {
            id: id.into(),
            title: title.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            run: Box::new(run),
        }
    }

    pub fn run(&self, ctx: &RunContext) -> Result<Outcome, LabError> {
        (self.run)(ctx)
    }

    pub fn has_any_tag(&self, requested: &[String]) -> bool {
        self.tags.iter().any(|t| requested.contains(t))
    }
}

impl std::fmt::Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("tags", &self.tags)
            .finish()
    }
}

/// One check's outcome plus its identity and timing.
#[derive(Debug, Serialize, Clone)]
pub struct CheckReport {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub ts: String,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CheckReport {
    pub fn status(&self) -> CheckStatus {
        self.outcome.status
    }
}
