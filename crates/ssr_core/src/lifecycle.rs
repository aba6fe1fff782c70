//! Request lifecycle state machine.
//!
//! A route context moves through `Created -> (DataFetching) -> Rendering -> Sent`.
//! `DataFetching` is only entered when the route declares a data loader, and it
//! always finishes before `Rendering` starts. Any phase may jump to `Sent` (an
//! error handler can answer early), but nothing leaves `Sent`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SsrCoreError};

/// Phase of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestPhase {
    Created,
    DataFetching,
    Rendering,
    Sent,
}

impl RequestPhase {
    /// Move to `to`, rejecting transitions the lifecycle does not allow.
    pub fn transition(self, to: RequestPhase) -> Result<RequestPhase> {
        use RequestPhase::*;

        let allowed = matches!(
            (self, to),
            (Created, DataFetching)
                | (Created, Rendering)
                | (DataFetching, Rendering)
                | (Created | DataFetching | Rendering, Sent)
        );

        if allowed {
            Ok(to)
        } else if self == Sent {
            Err(SsrCoreError::ContextSealed)
        } else {
            Err(SsrCoreError::InvalidTransition { from: self, to })
        }
    }

    /// Whether the context may still be mutated.
    pub fn is_open(self) -> bool {
        self != RequestPhase::Sent
    }
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestPhase::Created => "created",
            RequestPhase::DataFetching => "data-fetching",
            RequestPhase::Rendering => "rendering",
            RequestPhase::Sent => "sent",
        };
        f.write_str(name)
    }
}

/// What to do when a route's data loader fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFailurePolicy {
    /// Log the failure and render without data.
    RenderDegraded,
    /// Log the failure, record it under `errors["getData"]` and render without data.
    #[default]
    ExposeError,
    /// Abort the request and hand the failure to the error handler.
    Abort,
}

impl FromStr for DataFailurePolicy {
    type Err = SsrCoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "render-degraded" | "degraded" => Ok(Self::RenderDegraded),
            "expose-error" | "expose" => Ok(Self::ExposeError),
            "abort" => Ok(Self::Abort),
            other => Err(SsrCoreError::InvalidConfig(format!(
                "unknown data failure policy: {other}"
            ))),
        }
    }
}
