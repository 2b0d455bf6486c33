use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use mast_scorer::audit::{AuditAction, AuditLog};
use mast_scorer::config::FileConfig;
use mast_scorer::correction::{CorrectionPrompt, EditContext, EditRequest, Field, Operator};
use mast_scorer::dataset::load_dataset;
use mast_scorer::pipeline::{run_results, run_update, ResultsOptions, UpdateOptions};
use mast_scorer::record::Subject;
use mast_scorer::scoring::{Bucket, ScoringPolicy};

/// Replays typed answers and edit choices in order.
#[derive(Default)]
struct Script {
    values: VecDeque<&'static str>,
    edits: VecDeque<Option<EditRequest>>,
    prompts: Vec<CorrectionPrompt>,
}

impl Operator for Script {
    fn request_value(&mut self, prompt: &CorrectionPrompt) -> mast_scorer::Result<String> {
        self.prompts.push(prompt.clone());
        let value = self.values.pop_front().expect("unexpected correction prompt");
        Ok(value.to_string())
    }

    fn request_edit(&mut self, _: &EditContext<'_>) -> mast_scorer::Result<Option<EditRequest>> {
        Ok(self.edits.pop_front().expect("unexpected edit prompt"))
    }

    fn notify(&mut self, _: &str) {}
}

fn scan_line(id_block: &str, test: char, answers: &str) -> String {
    format!(
        "{:<10}{:<10}{:<10}{:<10}{}     {}  {}",
        "0001", "SCAN", "2024", "X", id_block, test, answers
    )
}

fn setup(dir: &Path) -> FileConfig {
    let mut files = FileConfig::for_date(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    for path in [
        &mut files.raw,
        &mut files.keys,
        &mut files.roster,
        &mut files.schools,
        &mut files.dataset,
        &mut files.final_dataset,
        &mut files.results_dir,
        &mut files.audit_log,
    ] {
        *path = dir.join(&*path);
    }
    fs::write(&files.keys, "Biology: ABCDE\nChemistry: AAAAA\n").unwrap();
    fs::write(
        &files.roster,
        r#"[
            {"school_id": 120, "student_id": 4, "name": "Ada Lovelace", "test_1": "Biology", "test_2": "Chemistry"},
            {"school_id": 120, "student_id": 5, "name": "Grace Hopper", "test_1": "Biology"},
            {"school_id": 130, "student_id": 1, "name": "Alan Turing", "test_1": "Biology"}
        ]"#,
    )
    .unwrap();
    fs::write(
        &files.schools,
        r#"[{"id": 120, "name": "Central High"}, {"id": 130, "name": "North High"}]"#,
    )
    .unwrap();
    files
}

#[test]
fn update_then_results() {
    let dir = tempfile::tempdir().unwrap();
    let files = setup(dir.path());
    let policy = ScoringPolicy::default();

    // Second sheet has a blank in the school column; the third has no test digit.
    let lines = [
        scan_line("12004", '1', "12345"),
        scan_line("1 005", '1', "12344"),
        scan_line("13001", ' ', "12333"),
    ];
    fs::write(&files.raw, lines.join("\n")).unwrap();

    let mut operator = Script {
        values: VecDeque::from(["5", "120", "Biology"]),
        ..Script::default()
    };
    let mut audit = AuditLog::open(&files.audit_log).unwrap();
    let report = run_update(
        &policy,
        &UpdateOptions {
            files: files.clone(),
            show_lost_tests: true,
            use_colors: false,
        },
        &mut operator,
        &mut audit,
        &mut Vec::new(),
    )
    .unwrap();

    // The blanked block zeroes both IDs, so the student and school are asked for.
    let asked: Vec<Field> = operator.prompts.iter().map(|p| p.field).collect();
    assert_eq!(asked, vec![Field::StudentId, Field::SchoolId, Field::Test]);
    assert_eq!(report.validation.total(), 3);
    assert!(report.first_run);
    assert_eq!(report.lost_students, 0);
    assert_eq!(report.lost_tests.len(), 1);
    assert_eq!(report.lost_tests[0].test, Subject::Chemistry);

    let final_dataset = load_dataset(&files.final_dataset).unwrap().unwrap();
    let scores: Vec<u32> = final_dataset.records.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![5, 4, 3]);
    assert_eq!(
        final_dataset.records[0].award_bucket,
        Some(Bucket::from_hundredths(2))
    );

    let log = fs::read_to_string(&files.audit_log).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains("[correction]")).count(), 3);

    let results = run_results(
        &policy,
        &ResultsOptions::from_files(&files, "-2024-Sat", false),
        &mut audit,
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(results.standings[0].school_id, 120);
    // 0.02 bucket is worth 10 on the small table, 0.50 is worth 1.
    assert_eq!(results.standings[0].points, 11);
    let biology = &results.winners[0];
    assert_eq!(biology.test, Subject::Biology);
    assert_eq!(biology.lists[1].names, vec!["Ada Lovelace".to_string()]);
    assert!(audit.of_kind(AuditAction::Save).count() >= 5);

    let rankings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&results.rankings_path).unwrap()).unwrap();
    assert_eq!(rankings[0]["name"], "Central High");
}

#[test]
fn rerun_without_scans_reuses_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = setup(dir.path());
    let policy = ScoringPolicy::default();
    fs::write(&files.raw, scan_line("12004", '1', "12345")).unwrap();

    let options = |files: &FileConfig| UpdateOptions {
        files: files.clone(),
        show_lost_tests: false,
        use_colors: false,
    };
    let mut audit = AuditLog::in_memory();
    run_update(
        &policy,
        &options(&files),
        &mut Script::default(),
        &mut audit,
        &mut Vec::new(),
    )
    .unwrap();

    files.raw = "none".into();
    let report = run_update(
        &policy,
        &options(&files),
        &mut Script::default(),
        &mut audit,
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(report.ingested, 0);
    assert_eq!(report.total, 1);
    assert!(!report.first_run);
    assert!(report.lost_tests.is_empty());
}

#[test]
fn rekeyed_lost_student_is_checked_for_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let files = setup(dir.path());
    let policy = ScoringPolicy::default();
    let options = UpdateOptions {
        files: files.clone(),
        show_lost_tests: false,
        use_colors: false,
    };

    fs::write(&files.raw, scan_line("12004", '1', "12345")).unwrap();
    run_update(
        &policy,
        &options,
        &mut Script::default(),
        &mut AuditLog::in_memory(),
        &mut Vec::new(),
    )
    .unwrap();

    // Student 7 is not registered. Re-keying it onto student 4 collides with
    // the Biology sheet already on file, which must then be moved.
    fs::write(&files.raw, scan_line("12007", '1', "11111")).unwrap();
    let edit = |index, field, value: &str| {
        Some(EditRequest {
            index,
            field,
            value: value.to_string(),
        })
    };
    let mut operator = Script {
        edits: VecDeque::from([
            edit(1, Field::StudentId, "4"),
            None,
            edit(1, Field::Test, "Chemistry"),
        ]),
        ..Script::default()
    };
    let report = run_update(
        &policy,
        &options,
        &mut operator,
        &mut AuditLog::in_memory(),
        &mut Vec::new(),
    )
    .unwrap();
    assert_eq!(report.lost_students, 1);
    assert_eq!(report.lost_student_edits, 1);
    assert_eq!(report.duplicates.repeat_test_edits, 1);
    assert!(operator.edits.is_empty());

    let saved = load_dataset(&files.dataset).unwrap().unwrap();
    let keys: Vec<(u32, u32, Option<Subject>)> = saved
        .records
        .iter()
        .map(|r| (r.school_id, r.student_id, r.test))
        .collect();
    assert_eq!(
        keys,
        vec![
            (120, 4, Some(Subject::Biology)),
            (120, 4, Some(Subject::Chemistry)),
        ]
    );
    // Regraded against the Chemistry key.
    assert_eq!(saved.records[1].score, 5);
}
