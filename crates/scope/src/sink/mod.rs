//! Row-oriented sink for failure reports.
//!
//! One [`FailureRow`] per failure detail: the primary at position 0, then
//! each secondary in recorded order. Rows are denormalized so that a stream
//! of them can be loaded into any table without joins.
//!
//! Backend:
//! - **NDJSON stream**: write newline-delimited JSON rows to any `Write` impl

pub mod json_stream;

use crate::reporter::{DetailReport, FailureReport};
use serde::Serialize;
use warden_core::FailureKind;

/// Whether a row is the reported failure or one suppressed behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primary,
    Secondary,
}

/// One row per failure detail, append-only.
#[derive(Debug, Clone, Serialize)]
pub struct FailureRow {
    /// Name of the scope or operation that produced the failure.
    pub scope: String,
    pub role: Role,
    pub position: u32,
    pub kind: FailureKind,
    pub resource: Option<String>,
    pub message: String,
    pub recorded_at_unix: u64,
}

impl FailureReport {
    /// Flatten the report into sink-ready rows.
    pub fn to_rows(&self, scope: &str) -> Vec<FailureRow> {
        let now = unix_now();
        let row = |role, position: usize, detail: &DetailReport| FailureRow {
            scope: scope.to_string(),
            role,
            position: position as u32,
            kind: detail.kind,
            resource: detail.resource.clone(),
            message: detail.message.clone(),
            recorded_at_unix: now,
        };

        std::iter::once(row(Role::Primary, 0, &self.primary))
            .chain(
                self.secondary
                    .iter()
                    .enumerate()
                    .map(|(i, d)| row(Role::Secondary, i + 1, d)),
            )
            .collect()
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
