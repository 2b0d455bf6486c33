use std::collections::VecDeque;

use super::field::Field;
use super::CorrectionPrompt;
use crate::audit::{AuditAction, AuditLog};
use crate::error::Result;
use crate::record::SubmissionRecord;
use crate::scoring::ScoringPolicy;

/// Cursor over the records that currently violate one identifier rule.
///
/// The violation set is captured when the session opens. Each accepted
/// correction resolves the violation at the cursor and moves on; rejected
/// input leaves the cursor in place so the same record is asked again.
pub struct CorrectionSession<'a> {
    records: &'a mut [SubmissionRecord],
    policy: &'a ScoringPolicy,
    field: Field,
    pending: VecDeque<usize>,
}

impl<'a> CorrectionSession<'a> {
    pub fn open(
        records: &'a mut [SubmissionRecord],
        policy: &'a ScoringPolicy,
        field: Field,
    ) -> Self {
        let pending = records
            .iter()
            .enumerate()
            .filter(|(_, record)| field.is_violation(record, policy))
            .map(|(i, _)| i)
            .collect();
        Self {
            records,
            policy,
            field,
            pending,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Violations still waiting for a correction.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.pending.is_empty()
    }

    /// Describe the violation at the cursor, if any remain.
    pub fn next_violation(&self) -> Option<CorrectionPrompt> {
        let index = *self.pending.front()?;
        let record = &self.records[index];
        Some(CorrectionPrompt {
            index,
            school_id: record.school_id,
            student_id: record.student_id,
            field: self.field,
            offending: self.field.current(record),
            hint: self.field.hint(self.policy),
        })
    }

    /// Validate `raw` and write it into the record at the cursor.
    ///
    /// Out-of-domain input returns `InvalidCorrectionInput` and changes
    /// nothing. Accepted corrections are written to the audit log.
    pub fn apply_correction(&mut self, raw: &str, audit: &mut AuditLog) -> Result<()> {
        let Some(&index) = self.pending.front() else {
            return Ok(());
        };
        let value = self.field.parse_value(raw, self.policy)?;
        let record = &mut self.records[index];
        let before = self.field.assign(record, value);
        audit.record(
            AuditAction::Correction,
            format!(
                "updated {} from '{}' to '{}' for school {} student {} at index {}",
                self.field, before, value, record.school_id, record.student_id, index
            ),
        )?;
        self.pending.pop_front();
        Ok(())
    }
}
