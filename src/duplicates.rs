use std::collections::BTreeMap;
use std::fmt;

use crate::audit::AuditLog;
use crate::correction::{edit_loop, Operator};
use crate::error::Result;
use crate::record::{Subject, SubmissionRecord};
use crate::scoring::ScoringPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateRule {
    /// Too many records for one (school, student).
    OverQuota,
    /// The same test more than once for one (school, student).
    RepeatTest,
}

impl DuplicateRule {
    pub fn threshold(&self, policy: &ScoringPolicy) -> usize {
        match self {
            DuplicateRule::OverQuota => policy.over_quota_threshold,
            DuplicateRule::RepeatTest => policy.repeat_test_threshold,
        }
    }

    pub fn describe(&self, policy: &ScoringPolicy) -> String {
        match self {
            DuplicateRule::OverQuota => format!(
                "The following school-student combinations show up {} or more times",
                policy.over_quota_threshold
            ),
            DuplicateRule::RepeatTest => format!(
                "The following school-student-test combinations show up {} or more times",
                policy.repeat_test_threshold
            ),
        }
    }
}

impl fmt::Display for DuplicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateRule::OverQuota => f.write_str("over-quota"),
            DuplicateRule::RepeatTest => f.write_str("repeat-test"),
        }
    }
}

/// Records sharing one grouping key. `test` is only set for repeat tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub school_id: u32,
    pub student_id: u32,
    pub test: Option<Subject>,
    pub indices: Vec<usize>,
}

/// Find every group at or above the rule's threshold.
///
/// Records carrying a skip sentinel are left out of the grouping. Groups are
/// ordered by key and indices within a group by position, so two scans of
/// unchanged records report the same thing.
pub fn detect(
    records: &[SubmissionRecord],
    rule: DuplicateRule,
    policy: &ScoringPolicy,
) -> Vec<DuplicateGroup> {
    let mut groups: BTreeMap<(u32, u32, Option<Subject>), Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        if policy.is_skipped(record.school_id, record.student_id) {
            continue;
        }
        let test = match rule {
            DuplicateRule::OverQuota => None,
            DuplicateRule::RepeatTest => record.test,
        };
        groups
            .entry((record.school_id, record.student_id, test))
            .or_default()
            .push(i);
    }

    let threshold = rule.threshold(policy);
    groups
        .into_iter()
        .filter(|(_, indices)| indices.len() >= threshold)
        .map(|((school_id, student_id, test), indices)| DuplicateGroup {
            school_id,
            student_id,
            test,
            indices,
        })
        .collect()
}

/// Every record index in any group, ascending.
pub fn flagged_indices(groups: &[DuplicateGroup]) -> Vec<usize> {
    let mut flagged: Vec<usize> = groups.iter().flat_map(|g| g.indices.iter().copied()).collect();
    flagged.sort_unstable();
    flagged
}

/// Detect, ask for one correction, and re-detect from scratch until a
/// full scan is clean. Returns the number of edits applied.
pub fn resolve(
    records: &mut [SubmissionRecord],
    rule: DuplicateRule,
    policy: &ScoringPolicy,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
) -> Result<usize> {
    let reason = rule.describe(policy);
    let mut edits = 0;
    loop {
        let groups = detect(records, rule, policy);
        if groups.is_empty() {
            return Ok(edits);
        }
        tracing::info!(rule = %rule, groups = groups.len(), "duplicate submissions found");
        let flagged = flagged_indices(&groups);
        edits += edit_loop(records, &reason, &flagged, false, operator, policy, audit)?;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateSummary {
    pub over_quota_edits: usize,
    pub repeat_test_edits: usize,
}

/// Over-quota pass first, then the repeat-test pass.
pub fn resolve_all(
    records: &mut [SubmissionRecord],
    policy: &ScoringPolicy,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
) -> Result<DuplicateSummary> {
    let over_quota_edits = resolve(records, DuplicateRule::OverQuota, policy, operator, audit)?;
    let repeat_test_edits = resolve(records, DuplicateRule::RepeatTest, policy, operator, audit)?;
    Ok(DuplicateSummary {
        over_quota_edits,
        repeat_test_edits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::scripted::ScriptedOperator;
    use crate::correction::Field;
    use crate::record::Answers;

    fn record(school_id: u32, student_id: u32, test: Subject) -> SubmissionRecord {
        SubmissionRecord::new(school_id, student_id, Some(test), Answers::default())
    }

    #[test]
    fn test_over_quota_needs_three() {
        let policy = ScoringPolicy::default();
        let mut records = vec![
            record(120, 4, Subject::Biology),
            record(120, 4, Subject::Physics),
        ];
        assert!(detect(&records, DuplicateRule::OverQuota, &policy).is_empty());
        records.push(record(120, 4, Subject::Chemistry));
        let groups = detect(&records, DuplicateRule::OverQuota, &policy);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].indices, vec![0, 1, 2]);
        assert_eq!(groups[0].test, None);
    }

    #[test]
    fn test_repeat_test_needs_two() {
        let policy = ScoringPolicy::default();
        let records = vec![
            record(120, 4, Subject::Biology),
            record(121, 4, Subject::Biology),
            record(120, 4, Subject::Biology),
            record(120, 4, Subject::Physics),
        ];
        let groups = detect(&records, DuplicateRule::RepeatTest, &policy);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].test, Some(Subject::Biology));
        assert_eq!(groups[0].indices, vec![0, 2]);
    }

    #[test]
    fn test_detection_is_a_fixed_point() {
        let policy = ScoringPolicy::default();
        let records = vec![
            record(130, 2, Subject::Physics),
            record(120, 4, Subject::Biology),
            record(130, 2, Subject::Physics),
            record(120, 4, Subject::Biology),
        ];
        let first = detect(&records, DuplicateRule::RepeatTest, &policy);
        let second = detect(&records, DuplicateRule::RepeatTest, &policy);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(flagged_indices(&first), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sentinel_records_not_grouped() {
        let policy = ScoringPolicy::default();
        let records = vec![
            record(120, 99, Subject::Biology),
            record(120, 99, Subject::Biology),
        ];
        assert!(detect(&records, DuplicateRule::RepeatTest, &policy).is_empty());
    }

    #[test]
    fn test_resolve_redetects_after_each_edit() {
        let policy = ScoringPolicy::default();
        let mut records = vec![
            record(120, 4, Subject::Biology),
            record(120, 4, Subject::Biology),
            record(120, 5, Subject::Biology),
        ];
        // First edit moves record 1 onto student 5, creating a new repeat;
        // second edit resolves it.
        let mut operator = ScriptedOperator::default()
            .with_edit(1, Field::StudentId, "5")
            .with_edit(2, Field::Test, "Chemistry");
        let mut audit = AuditLog::in_memory();
        let edits = resolve(
            &mut records,
            DuplicateRule::RepeatTest,
            &policy,
            &mut operator,
            &mut audit,
        )
        .unwrap();
        assert_eq!(edits, 2);
        assert!(detect(&records, DuplicateRule::RepeatTest, &policy).is_empty());
        assert_eq!(operator.edit_reasons().len(), 2);
    }

    #[test]
    fn test_resolve_all_runs_both_passes() {
        let policy = ScoringPolicy::default();
        let mut records = vec![
            record(120, 4, Subject::Biology),
            record(120, 4, Subject::Physics),
            record(120, 4, Subject::Physics),
        ];
        // Over quota: move record 2 to student 6. Then nothing repeats.
        let mut operator = ScriptedOperator::default().with_edit(2, Field::StudentId, "6");
        let mut audit = AuditLog::in_memory();
        let summary = resolve_all(&mut records, &policy, &mut operator, &mut audit).unwrap();
        assert_eq!(summary.over_quota_edits, 1);
        assert_eq!(summary.repeat_test_edits, 0);
        assert!(detect(&records, DuplicateRule::OverQuota, &policy).is_empty());
        assert!(detect(&records, DuplicateRule::RepeatTest, &policy).is_empty());
    }
}
