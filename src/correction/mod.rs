//! Human-in-the-loop correction protocol.
//!
//! Every blocking question the pipeline asks goes through [`Operator`]. The
//! terminal implementation reads stdin; tests drive the same loops with a
//! scripted operator.

pub mod field;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod scripted;

pub use field::{Field, FieldValue};
pub use prompt::TerminalOperator;
pub use session::CorrectionSession;

use std::fmt;

use crate::audit::{AuditAction, AuditLog};
use crate::error::{MastError, Result};
use crate::record::{test_label, SubmissionRecord};
use crate::scoring::ScoringPolicy;

/// One identifier violation awaiting a replacement value.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionPrompt {
    pub index: usize,
    pub school_id: u32,
    pub student_id: u32,
    pub field: Field,
    pub offending: String,
    pub hint: String,
}

impl fmt::Display for CorrectionPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = match self.field {
            Field::SchoolId => format!("for student {}", self.student_id),
            Field::StudentId => format!("for school {}", self.school_id),
            Field::Test => format!("for student {} school {}", self.student_id, self.school_id),
        };
        write!(
            f,
            "Invalid {} '{}' {} at index {}.\n  {}",
            self.field, self.offending, owner, self.index, self.hint
        )
    }
}

/// Operator's choice in the record edit menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub index: usize,
    pub field: Field,
    pub value: String,
}

/// What the operator sees when asked whether to edit a record.
#[derive(Debug, Clone, Copy)]
pub struct EditContext<'a> {
    pub reason: &'a str,
    pub records: &'a [SubmissionRecord],
    pub flagged: &'a [usize],
    /// False while violations remain that must be corrected before moving on.
    pub may_finish: bool,
    pub policy: &'a ScoringPolicy,
}

pub trait Operator {
    /// Ask for a replacement value for the violation described by `prompt`.
    fn request_value(&mut self, prompt: &CorrectionPrompt) -> Result<String>;

    /// Ask which record to edit. `None` means the operator is done.
    fn request_edit(&mut self, context: &EditContext<'_>) -> Result<Option<EditRequest>>;

    /// Show a message that needs no answer, such as a rejected input.
    fn notify(&mut self, message: &str);
}

/// Drive one session to completion, re-asking until each value is accepted.
pub fn resolve_session(
    session: &mut CorrectionSession<'_>,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
) -> Result<usize> {
    let mut corrected = 0;
    while let Some(prompt) = session.next_violation() {
        let raw = operator.request_value(&prompt)?;
        match session.apply_correction(&raw, audit) {
            Ok(()) => corrected += 1,
            Err(MastError::InvalidCorrectionInput(reason)) => {
                operator.notify(&format!("Invalid input. {}. Try again.", reason));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(corrected)
}

/// Apply one edit-menu request after checking the index and value.
pub fn apply_edit(
    records: &mut [SubmissionRecord],
    request: &EditRequest,
    policy: &ScoringPolicy,
    audit: &mut AuditLog,
) -> Result<()> {
    let count = records.len();
    let record = records.get_mut(request.index).ok_or_else(|| {
        MastError::InvalidCorrectionInput(format!(
            "index {} is out of range (0-{})",
            request.index,
            count.saturating_sub(1)
        ))
    })?;
    let value = request.field.parse_value(&request.value, policy)?;
    let identity = format!(
        "school {} student {} test {}",
        record.school_id,
        record.student_id,
        test_label(record.test)
    );
    let before = request.field.assign(record, value);
    audit.record(
        AuditAction::Edit,
        format!(
            "record updated - index {} ({}) {} updated from '{}' to '{}'",
            request.index, identity, request.field, before, value
        ),
    )
}

/// Offer the edit menu until the operator declines or, when finishing is
/// not allowed, until exactly one edit has been applied.
/// Returns the number of applied edits.
pub fn edit_loop(
    records: &mut [SubmissionRecord],
    reason: &str,
    flagged: &[usize],
    may_finish: bool,
    operator: &mut dyn Operator,
    policy: &ScoringPolicy,
    audit: &mut AuditLog,
) -> Result<usize> {
    let mut applied = 0;
    loop {
        let context = EditContext {
            reason,
            records,
            flagged,
            may_finish,
            policy,
        };
        let Some(request) = operator.request_edit(&context)? else {
            if may_finish {
                return Ok(applied);
            }
            operator.notify(
                "Violations remain. Correct a flagged record or enter a skip sentinel to continue.",
            );
            continue;
        };
        match apply_edit(records, &request, policy, audit) {
            Ok(()) => {
                applied += 1;
                operator.notify("Record updated successfully");
                if !may_finish {
                    return Ok(applied);
                }
            }
            Err(MastError::InvalidCorrectionInput(reason)) => {
                operator.notify(&format!("Invalid input. {}. Try again.", reason));
            }
            Err(e) => return Err(e),
        }
    }
}
