//! Failure report generator.
//!
//! Flattens a [`Failure`] into a serializable tree and renders it as a
//! human-readable box: the primary failure first, then every suppressed
//! failure in the order it was recorded.

use serde::Serialize;
use warden_core::{Failure, FailureDetail, FailureKind};

/// One failure with its source chain spelled out.
#[derive(Debug, Clone, Serialize)]
pub struct DetailReport {
    pub kind: FailureKind,
    pub resource: Option<String>,
    pub message: String,
    /// Messages of `source()` errors below `message`, outermost first.
    pub source_chain: Vec<String>,
}

impl DetailReport {
    fn from_detail(detail: &FailureDetail) -> Self {
        let mut chain = detail.cause.chain().into_iter();
        let message = chain.next().unwrap_or_default();
        Self {
            kind: detail.kind,
            resource: detail.resource.clone(),
            message,
            source_chain: chain.collect(),
        }
    }

    fn headline(&self) -> String {
        match &self.resource {
            Some(r) => format!("[{}] {}: {}", self.kind, r, self.message),
            None => format!("[{}] {}", self.kind, self.message),
        }
    }
}

/// Serializable view of a [`Failure`].
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub primary: DetailReport,
    pub secondary: Vec<DetailReport>,
}

impl FailureReport {
    pub fn from_failure(failure: &Failure) -> Self {
        Self {
            primary: DetailReport::from_detail(failure.primary()),
            secondary: failure
                .secondary()
                .iter()
                .map(DetailReport::from_detail)
                .collect(),
        }
    }

    /// Render the report as a formatted string.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                    WARDEN FAILURE REPORT                     ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Primary:   {}\n", self.primary.headline()));
        for source in &self.primary.source_chain {
            out.push_str(&format!("║     caused by: {}\n", source));
        }
        out.push_str(&format!(
            "║  Suppressed: {:>47} ║\n",
            self.secondary.len()
        ));

        if !self.secondary.is_empty() {
            out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
            for (i, detail) in self.secondary.iter().enumerate() {
                out.push_str(&format!("║  {}. {}\n", i + 1, detail.headline()));
                for source in &detail.source_chain {
                    out.push_str(&format!("║     caused by: {}\n", source));
                }
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}
