//! Outcome of applying a diff.

use crate::diff::DiffAction;
use serde::Serialize;
use shopsync_core::ModelKind;
use std::fmt;

/// One entity the applier could not sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    /// Model kind.
    pub kind: ModelKind,
    /// Stringified identity.
    pub key: String,
    /// The action that failed.
    pub action: DiffAction,
    /// Error message.
    pub message: String,
    /// Whether the error concerned only this entity.
    pub skippable: bool,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.action, self.kind, self.key, self.message)
    }
}

/// Counts and failures of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entities created remotely.
    pub created: usize,
    /// Entities updated remotely.
    pub updated: usize,
    /// Entities deleted remotely.
    pub deleted: usize,
    /// Entities left alone because they were unchanged.
    pub unchanged: usize,
    /// Entities not attempted because an ancestor's create failed.
    pub skipped: usize,
    /// Entities whose create, update or delete failed.
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Returns the number of failed entities.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing failed or was skipped.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {} | updated: {} | deleted: {} | skipped: {} | failed: {}",
            self.created,
            self.updated,
            self.deleted,
            self.skipped,
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_summary_line() {
        let mut report = SyncReport {
            created: 3,
            deleted: 1,
            ..Default::default()
        };
        assert!(report.is_success());
        assert_eq!(
            report.to_string(),
            "created: 3 | updated: 0 | deleted: 1 | skipped: 0 | failed: 0"
        );

        report.failures.push(SyncFailure {
            kind: ModelKind::Product,
            key: "P1".into(),
            action: DiffAction::Create,
            message: "package Doos not found".into(),
            skippable: true,
        });
        report.skipped = 2;
        assert!(!report.is_success());
        assert!(report.to_string().ends_with("skipped: 2 | failed: 1"));
        assert_eq!(
            report.failures[0].to_string(),
            "create product P1: package Doos not found"
        );
    }
}
