use super::config::{ScoringPolicy, TierPolicy};
use super::tier::QuantileLevel;

/// Validate the scoring policy at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_policy(policy: &ScoringPolicy) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if policy.min_school_id > policy.max_school_id {
        errors.push(format!(
            "policy.min_school_id: {} is above max_school_id {}",
            policy.min_school_id, policy.max_school_id
        ));
    }
    if policy.students_per_school == 0 {
        errors.push("policy.students_per_school: must be at least 1".to_string());
    }
    if policy.is_valid_school(policy.school_skip_sentinel) {
        errors.push(format!(
            "policy.school_skip_sentinel: {} is a valid school ID",
            policy.school_skip_sentinel
        ));
    }
    if policy.is_valid_student(policy.student_skip_sentinel) {
        errors.push(format!(
            "policy.student_skip_sentinel: {} is a valid student ID",
            policy.student_skip_sentinel
        ));
    }
    if policy.over_quota_threshold < 1 {
        errors.push("policy.over_quota_threshold: must be at least 1".to_string());
    }
    if policy.repeat_test_threshold < 2 {
        errors.push("policy.repeat_test_threshold: must be at least 2".to_string());
    }

    check_ladder("policy.aggregate_ladder", &policy.aggregate_ladder, &mut errors);
    check_tier("policy.large", &policy.large, &policy.aggregate_ladder, &mut errors);
    check_tier("policy.small", &policy.small, &policy.aggregate_ladder, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_ladder(path: &str, ladder: &[QuantileLevel], errors: &mut Vec<String>) {
    if ladder.is_empty() {
        errors.push(format!("{}: must list at least one level", path));
    }
    for (i, level) in ladder.iter().enumerate() {
        if level.hundredths() == 0 || level.hundredths() >= 100 {
            errors.push(format!("{}[{}]: {} must be between 0 and 1", path, i, level));
        }
    }
    if ladder.windows(2).any(|pair| pair[0] <= pair[1]) {
        errors.push(format!("{}: levels must be strictly descending", path));
    }
}

fn check_tier(
    path: &str,
    tier: &TierPolicy,
    aggregate: &[QuantileLevel],
    errors: &mut Vec<String>,
) {
    let ladder_path = format!("{}.ladder", path);
    check_ladder(&ladder_path, &tier.ladder, errors);

    // Bucket assignment reads thresholds from the aggregate statistics
    for (i, level) in tier.ladder.iter().enumerate() {
        if !aggregate.contains(level) {
            errors.push(format!(
                "{}[{}]: {} is not in policy.aggregate_ladder",
                ladder_path, i, level
            ));
        }
    }

    for (i, entry) in tier.points.iter().enumerate() {
        if tier.points[..i].iter().any(|e| e.bucket == entry.bucket) {
            errors.push(format!(
                "{}.points[{}]: bucket {} listed twice",
                path, i, entry.bucket
            ));
        }
    }
}
