use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Transcode,
    Acquire,
}

impl Display for JobKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobKind::Transcode => write!(f, "transcode"),
            JobKind::Acquire => write!(f, "acquire"),
        }
    }
}

impl FromStr for JobKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcode" => Ok(JobKind::Transcode),
            "acquire" => Ok(JobKind::Acquire),
            _ => Err(anyhow::anyhow!("Invalid job kind: {}", s)),
        }
    }
}

/// One pipeline run request for one asset.
///
/// `attempt` counts executions so far; the queue bumps it before each retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub asset_id: Uuid,
    pub attempt: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(kind: JobKind, asset_id: Uuid) -> Self {
        Job {
            id: Uuid::new_v4(),
            kind,
            asset_id,
            attempt: 0,
            enqueued_at: Utc::now(),
        }
    }
}
