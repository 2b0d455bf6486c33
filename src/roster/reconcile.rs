use serde::Serialize;
use std::collections::BTreeSet;

use super::types::Roster;
use crate::audit::AuditLog;
use crate::correction::{edit_loop, Operator};
use crate::error::Result;
use crate::record::{Subject, SubmissionRecord};
use crate::scoring::ScoringPolicy;

/// A submission with no matching registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostStudent {
    pub index: usize,
    pub school_id: u32,
    pub student_id: u32,
}

/// A registered test with no matching submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LostTest {
    pub school_id: u32,
    pub student_id: u32,
    pub name: String,
    pub test: Subject,
}

pub fn find_lost_students(records: &[SubmissionRecord], roster: &Roster) -> Vec<LostStudent> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| !roster.contains(r.school_id, r.student_id))
        .map(|(index, r)| LostStudent {
            index,
            school_id: r.school_id,
            student_id: r.student_id,
        })
        .collect()
}

/// Registered (school, student, test) triples minus the ones present in
/// `records`, sorted by school, then student, then test.
pub fn find_lost_tests(records: &[SubmissionRecord], roster: &Roster) -> Vec<LostTest> {
    let present: BTreeSet<(u32, u32, Subject)> = records
        .iter()
        .filter_map(|r| r.test.map(|test| (r.school_id, r.student_id, test)))
        .collect();

    let expected: BTreeSet<(u32, u32, Subject)> = roster
        .students()
        .iter()
        .flat_map(|s| {
            s.assigned_tests()
                .map(move |test| (s.school_id, s.student_id, test))
        })
        .collect();

    expected
        .difference(&present)
        .map(|&(school_id, student_id, test)| LostTest {
            school_id,
            student_id,
            name: roster
                .name(school_id, student_id)
                .unwrap_or_default()
                .to_string(),
            test,
        })
        .collect()
}

/// Show unregistered submissions and let the operator edit records until
/// they are done. Returns the number of edits applied.
pub fn review_lost_students(
    records: &mut [SubmissionRecord],
    roster: &Roster,
    policy: &ScoringPolicy,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
) -> Result<usize> {
    let lost = find_lost_students(records, roster);
    if lost.is_empty() {
        return Ok(0);
    }
    tracing::info!(count = lost.len(), "submissions without a registration");
    let flagged: Vec<usize> = lost.iter().map(|l| l.index).collect();
    edit_loop(
        records,
        "The following students were not found in the registration list",
        &flagged,
        true,
        operator,
        policy,
        audit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::scripted::ScriptedOperator;
    use crate::correction::Field;
    use crate::record::Answers;
    use crate::roster::RegistrationRecord;

    fn registration(
        school_id: u32,
        student_id: u32,
        name: &str,
        test_1: Subject,
        test_2: Option<Subject>,
    ) -> RegistrationRecord {
        RegistrationRecord {
            school_id,
            student_id,
            name: name.to_string(),
            test_1: Some(test_1),
            test_2,
        }
    }

    fn submission(school_id: u32, student_id: u32, test: Subject) -> SubmissionRecord {
        SubmissionRecord::new(school_id, student_id, Some(test), Answers::default())
    }

    #[test]
    fn test_lost_test_is_the_missing_assignment() {
        let roster = Roster::new(vec![registration(
            120,
            4,
            "Ada",
            Subject::Biology,
            Some(Subject::Physics),
        )]);
        let records = vec![submission(120, 4, Subject::Biology)];
        assert_eq!(
            find_lost_tests(&records, &roster),
            vec![LostTest {
                school_id: 120,
                student_id: 4,
                name: "Ada".to_string(),
                test: Subject::Physics,
            }]
        );
    }

    #[test]
    fn test_lost_tests_sorted_by_school() {
        let roster = Roster::new(vec![
            registration(130, 1, "Cy", Subject::Chemistry, None),
            registration(120, 2, "Bo", Subject::Mathematics, None),
        ]);
        let lost = find_lost_tests(&[], &roster);
        let schools: Vec<u32> = lost.iter().map(|l| l.school_id).collect();
        assert_eq!(schools, vec![120, 130]);
    }

    #[test]
    fn test_lost_students_report_unregistered() {
        let roster = Roster::new(vec![registration(120, 4, "Ada", Subject::Biology, None)]);
        let records = vec![
            submission(120, 4, Subject::Biology),
            submission(120, 7, Subject::Biology),
        ];
        assert_eq!(
            find_lost_students(&records, &roster),
            vec![LostStudent {
                index: 1,
                school_id: 120,
                student_id: 7
            }]
        );
    }

    #[test]
    fn test_review_lost_students_edits_until_done() {
        let policy = ScoringPolicy::default();
        let roster = Roster::new(vec![registration(120, 4, "Ada", Subject::Biology, None)]);
        let mut records = vec![submission(120, 7, Subject::Biology)];
        let mut operator = ScriptedOperator::default()
            .with_edit(0, Field::StudentId, "4")
            .finish();
        let mut audit = AuditLog::in_memory();
        let edits =
            review_lost_students(&mut records, &roster, &policy, &mut operator, &mut audit)
                .unwrap();
        assert_eq!(edits, 1);
        assert!(find_lost_students(&records, &roster).is_empty());
    }

    #[test]
    fn test_no_lost_students_asks_nothing() {
        let policy = ScoringPolicy::default();
        let roster = Roster::new(vec![registration(120, 4, "Ada", Subject::Biology, None)]);
        let mut records = vec![submission(120, 4, Subject::Biology)];
        let mut operator = ScriptedOperator::default();
        let mut audit = AuditLog::in_memory();
        assert_eq!(
            review_lost_students(&mut records, &roster, &policy, &mut operator, &mut audit)
                .unwrap(),
            0
        );
        assert!(operator.edit_reasons().is_empty());
    }
}
