//! Error taxonomy for hierarchy resolution, host sessions and frame delivery.

use std::time::Duration;

use thiserror::Error;

use crate::structure::Role;

/// Malformed skeleton description. Raised before any streaming starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("skeleton has no root bone named '{0}'")]
    MissingRoot(String),
    #[error("top-level bone '{name}' is not the root '{root}' and has no parent")]
    StrayTopLevel { name: String, root: String },
    #[error("bone name '{0}' appears more than once")]
    DuplicateName(String),
    #[error("bone name '{name}' is {len} bytes; names must be shorter than {max}")]
    NameTooLong { name: String, len: usize, max: usize },
}

/// A structure registration or frame delivery the collaborator refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    #[error("host rejected the call: {0}")]
    Rejected(String),
    #[error("no structure registered for subject '{0}'")]
    UnregisteredSubject(String),
    #[error("subject '{subject}' was registered as {expected:?} but received a {actual:?} frame")]
    RoleMismatch {
        subject: String,
        expected: Role,
        actual: Role,
    },
    #[error("animation frame carries {actual} transforms for {expected} bones")]
    BoneCountMismatch { expected: usize, actual: usize },
    #[error("frame carries {actual} property values for {expected} declared properties")]
    PropertyCountMismatch { expected: usize, actual: usize },
    #[error("name '{name}' is {len} bytes; names must be shorter than {max}")]
    NameTooLong { name: String, len: usize, max: usize },
    #[error("tick took {elapsed:?}, over the {deadline:?} deadline")]
    DeadlineExceeded { elapsed: Duration, deadline: Duration },
}

/// Fatal conditions surfaced by the session, scheduler and driver.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("malformed hierarchy: {0}")]
    MalformedHierarchy(#[from] HierarchyError),
    #[error("unable to load live link module (status {status}: {})", describe_status(.status))]
    ModuleLoad { status: i32 },
    #[error("unable to start live link (status {status})")]
    LinkStart { status: i32 },
    #[error("delivery to '{subject}' failed{}: {source}", tick_suffix(.tick))]
    SinkDelivery {
        subject: String,
        /// `None` when the failing call was the structure registration.
        tick: Option<u64>,
        #[source]
        source: SinkError,
    },
    #[error("invalid stream config: {0}")]
    InvalidConfig(String),
}

impl StreamError {
    pub(crate) fn structure(subject: &str, source: SinkError) -> Self {
        StreamError::SinkDelivery {
            subject: subject.to_string(),
            tick: None,
            source,
        }
    }

    pub(crate) fn frame(subject: &str, tick: u64, source: SinkError) -> Self {
        StreamError::SinkDelivery {
            subject: subject.to_string(),
            tick: Some(tick),
            source,
        }
    }
}

fn describe_status(status: &i32) -> &'static str {
    crate::session::LoadStatus::from_code(*status)
        .map(|s| s.describe())
        .unwrap_or("unknown status")
}

fn tick_suffix(tick: &Option<u64>) -> String {
    match tick {
        Some(t) => format!(" on tick {t}"),
        None => " during structure registration".to_string(),
    }
}
