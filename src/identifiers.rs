use crate::audit::AuditLog;
use crate::correction::{resolve_session, CorrectionSession, Field, Operator};
use crate::error::Result;
use crate::record::SubmissionRecord;
use crate::scoring::ScoringPolicy;

/// Checks run in this order: student IDs, then school IDs, then test names.
pub const CHECK_ORDER: [Field; 3] = [Field::StudentId, Field::SchoolId, Field::Test];

/// Corrections accepted per check during one validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub student_ids: usize,
    pub school_ids: usize,
    pub tests: usize,
}

impl ValidationSummary {
    pub fn total(&self) -> usize {
        self.student_ids + self.school_ids + self.tests
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Indices of records that break `field`'s rule.
pub fn find_violations(
    records: &[SubmissionRecord],
    field: Field,
    policy: &ScoringPolicy,
) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| field.is_violation(r, policy))
        .map(|(i, _)| i)
        .collect()
}

/// Validate every record, asking the operator to correct each violation.
///
/// Returns once all three checks report nothing left to fix. Every accepted
/// correction is in the audit log.
pub fn validate_identifiers(
    records: &mut [SubmissionRecord],
    policy: &ScoringPolicy,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
) -> Result<ValidationSummary> {
    let mut summary = ValidationSummary::default();
    for field in CHECK_ORDER {
        let mut session = CorrectionSession::open(records, policy, field);
        if session.is_resolved() {
            continue;
        }
        tracing::debug!(
            check = %field,
            outstanding = session.outstanding(),
            "identifier violations"
        );
        let corrected = resolve_session(&mut session, operator, audit)?;
        match field {
            Field::StudentId => summary.student_ids += corrected,
            Field::SchoolId => summary.school_ids += corrected,
            Field::Test => summary.tests += corrected,
        }
    }
    Ok(summary)
}
