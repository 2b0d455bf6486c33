use std::fmt;

use crate::error::{MastError, Result};
use crate::record::{test_label, Subject, SubmissionRecord};
use crate::scoring::ScoringPolicy;

/// A correctable field of a submission, numbered as in the edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SchoolId,
    StudentId,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Id(u32),
    Test(Subject),
}

impl Field {
    pub const MENU: [Field; 3] = [Field::SchoolId, Field::StudentId, Field::Test];

    /// 1 = School ID, 2 = Student ID, 3 = Test.
    pub fn from_menu(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Field::SchoolId),
            "2" => Some(Field::StudentId),
            "3" => Some(Field::Test),
            _ => None,
        }
    }

    pub fn menu_number(&self) -> u8 {
        match self {
            Field::SchoolId => 1,
            Field::StudentId => 2,
            Field::Test => 3,
        }
    }

    /// Describes what a valid replacement looks like.
    pub fn hint(&self, policy: &ScoringPolicy) -> String {
        match self {
            Field::SchoolId => format!(
                "School ID -> integer from {} to {}. Enter {} to skip permanently.",
                policy.min_school_id, policy.max_school_id, policy.school_skip_sentinel
            ),
            Field::StudentId => format!(
                "Student ID -> integer from 1 to {}. Enter {} to skip permanently.",
                policy.students_per_school, policy.student_skip_sentinel
            ),
            Field::Test => format!("Test -> Type exactly {}", Subject::choices()),
        }
    }

    /// True when the record's value for this field needs an operator.
    /// Skip sentinels count as resolved.
    pub fn is_violation(&self, record: &SubmissionRecord, policy: &ScoringPolicy) -> bool {
        match self {
            Field::SchoolId => {
                !policy.is_valid_school(record.school_id)
                    && record.school_id != policy.school_skip_sentinel
            }
            Field::StudentId => {
                !policy.is_valid_student(record.student_id)
                    && record.student_id != policy.student_skip_sentinel
            }
            Field::Test => record.test.is_none(),
        }
    }

    /// Current value as shown to the operator. Zero IDs came from blank columns.
    pub fn current(&self, record: &SubmissionRecord) -> String {
        let id = match self {
            Field::SchoolId => record.school_id,
            Field::StudentId => record.student_id,
            Field::Test => return test_label(record.test),
        };
        if id == 0 {
            "has blank".to_string()
        } else {
            id.to_string()
        }
    }

    /// Parse and range-check a typed replacement.
    pub fn parse_value(&self, raw: &str, policy: &ScoringPolicy) -> Result<FieldValue> {
        let raw = raw.trim();
        match self {
            Field::SchoolId => {
                let id = parse_id(raw)?;
                if policy.is_valid_school(id) || id == policy.school_skip_sentinel {
                    Ok(FieldValue::Id(id))
                } else {
                    Err(MastError::InvalidCorrectionInput(format!(
                        "Please enter a School ID between {} and {}",
                        policy.min_school_id, policy.max_school_id
                    )))
                }
            }
            Field::StudentId => {
                let id = parse_id(raw)?;
                if policy.is_valid_student(id) || id == policy.student_skip_sentinel {
                    Ok(FieldValue::Id(id))
                } else {
                    Err(MastError::InvalidCorrectionInput(format!(
                        "Please enter a Student ID between 1 and {}",
                        policy.students_per_school
                    )))
                }
            }
            Field::Test => raw
                .parse::<Subject>()
                .map(FieldValue::Test)
                .map_err(MastError::InvalidCorrectionInput),
        }
    }

    /// Write a parsed value into the record, returning the previous value.
    pub fn assign(&self, record: &mut SubmissionRecord, value: FieldValue) -> String {
        let before = self.current(record);
        match (self, value) {
            (Field::SchoolId, FieldValue::Id(id)) => record.school_id = id,
            (Field::StudentId, FieldValue::Id(id)) => record.student_id = id,
            (Field::Test, FieldValue::Test(test)) => record.test = Some(test),
            // parse_value never pairs a field with the other kind of value
            _ => {}
        }
        before
    }
}

fn parse_id(raw: &str) -> Result<u32> {
    raw.parse::<u32>()
        .map_err(|_| MastError::InvalidCorrectionInput(format!("'{}' is not a whole number", raw)))
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::SchoolId => f.write_str("School ID"),
            Field::StudentId => f.write_str("Student ID"),
            Field::Test => f.write_str("Test"),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(id) => write!(f, "{}", id),
            FieldValue::Test(test) => write!(f, "{}", test),
        }
    }
}
