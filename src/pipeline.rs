//! Update and results runs.
//!
//! `run_update` takes a raw scan batch through validation, duplicate checks,
//! reconciliation, grading and bucket assignment, saving the dataset after
//! each phase that changes it. `run_results` tallies points and award lists
//! from the final dataset an operator has reviewed.

use anyhow::Result;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::audit::{AuditAction, AuditLog};
use crate::config::FileConfig;
use crate::correction::Operator;
use crate::dataset::{
    load_dataset, merge, save_dataset, save_final_dataset, write_json_atomic, CumulativeDataset,
    MergeOutcome,
};
use crate::duplicates::{self, DuplicateSummary};
use crate::error::MastError;
use crate::grading::{regrade_all, AnswerKey};
use crate::identifiers::{validate_identifiers, ValidationSummary};
use crate::output::{
    format_aggregates, format_lost_tests, format_rankings, format_step, format_test_totals,
    format_winners, StepStatus,
};
use crate::record::parse_scan_lines;
use crate::roster::{
    find_lost_students, find_lost_tests, load_roster, load_schools, review_lost_students,
    LostTest,
};
use crate::scoring::{
    assign_buckets, award_winners, rank_schools, AggregateStats, SchoolStanding, ScoringPolicy,
    TestWinners,
};

/// Number of schools listed on the console after a results run.
pub const TOP_SCHOOLS: usize = 5;

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub files: FileConfig,
    /// Off early in the event, before every scan batch is in.
    pub show_lost_tests: bool,
    pub use_colors: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub ingested: usize,
    pub first_run: bool,
    pub validation: ValidationSummary,
    pub duplicates: DuplicateSummary,
    pub lost_students: usize,
    pub lost_student_edits: usize,
    pub lost_tests: Vec<LostTest>,
    /// Scores that changed in the full regrade.
    pub regraded: usize,
    pub bucketed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ResultsOptions {
    pub data: PathBuf,
    pub roster: PathBuf,
    pub schools: PathBuf,
    pub results_dir: PathBuf,
    /// Appended to result file names, e.g. `-2024-Sat`.
    pub tag: String,
    pub use_colors: bool,
}

impl ResultsOptions {
    pub fn from_files(files: &FileConfig, tag: &str, use_colors: bool) -> Self {
        Self {
            data: files.final_dataset.clone(),
            roster: files.roster.clone(),
            schools: files.schools.clone(),
            results_dir: files.results_dir.clone(),
            tag: tag.to_string(),
            use_colors,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultsReport {
    pub standings: Vec<SchoolStanding>,
    pub winners: Vec<TestWinners>,
    pub rankings_path: PathBuf,
    pub winners_path: PathBuf,
}

/// Console and audit trail shared by the steps of one run.
struct Run<'a> {
    out: &'a mut dyn Write,
    audit: &'a mut AuditLog,
    use_colors: bool,
}

impl Run<'_> {
    fn step(&mut self, label: &str, status: StepStatus) -> Result<()> {
        writeln!(self.out, "{}", format_step(label, status, self.use_colors))?;
        Ok(())
    }

    /// Audit a fatal condition and hand the error back for propagation.
    fn fatal(&mut self, err: anyhow::Error) -> anyhow::Error {
        if let Err(log_err) = self.audit.record(AuditAction::Fatal, format!("{:#}", err)) {
            tracing::error!("failed to write audit entry: {}", log_err);
        }
        err
    }

    /// Load a file the run cannot continue without.
    fn load<T>(
        &mut self,
        label: &str,
        path: &Path,
        load: impl FnOnce(&Path) -> Result<T>,
    ) -> Result<T> {
        match load(path) {
            Ok(value) => {
                self.step(label, StepStatus::Success)?;
                self.audit
                    .record(AuditAction::Load, format!("loaded {}", path.display()))?;
                Ok(value)
            }
            Err(err) => {
                self.step(label, StepStatus::Fail)?;
                Err(self.fatal(err))
            }
        }
    }

    fn save(&mut self, path: &Path, dataset: &CumulativeDataset, what: &str) -> Result<()> {
        save_dataset(path, dataset).map_err(|e| self.fatal(e))?;
        self.audit.record(
            AuditAction::Save,
            format!("{} written to {}", what, path.display()),
        )?;
        Ok(())
    }

    /// Read the raw scan file. `None` when skipped or missing; the run goes
    /// on with whatever dataset already exists. Bytes that are not text abort
    /// the ingest like any other malformed line.
    fn read_raw(&mut self, files: &FileConfig) -> Result<Option<String>> {
        if files.skips_raw() {
            self.step("Loading raw scan data", StepStatus::Skipped)?;
            self.audit
                .record(AuditAction::Load, "raw input skipped by request")?;
            return Ok(None);
        }
        let bytes = match fs::read(&files.raw) {
            Ok(bytes) => bytes,
            Err(err)
                if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) =>
            {
                tracing::warn!(
                    path = %files.raw.display(),
                    error = %err,
                    "raw scan file unavailable"
                );
                self.step("Loading raw scan data", StepStatus::Fail)?;
                writeln!(self.out, "  Continuing without new data")?;
                self.audit.record(
                    AuditAction::Load,
                    format!("failed to load {}: {}; continuing", files.raw.display(), err),
                )?;
                return Ok(None);
            }
            Err(err) => {
                self.step("Loading raw scan data", StepStatus::Fail)?;
                let err = MastError::fatal_load(&files.raw, err.to_string());
                return Err(self.fatal(err.into()));
            }
        };
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.step("Loading raw scan data", StepStatus::Success)?;
                self.audit
                    .record(AuditAction::Load, format!("loaded {}", files.raw.display()))?;
                Ok(Some(text))
            }
            Err(err) => {
                self.step("Loading raw scan data", StepStatus::Fail)?;
                let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
                let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
                let err = MastError::malformed(line, "scan data is not valid UTF-8 text");
                Err(self.fatal(err.into()))
            }
        }
    }
}

/// Ingest one scan batch and refresh every derived value in the dataset.
pub fn run_update(
    policy: &ScoringPolicy,
    options: &UpdateOptions,
    operator: &mut dyn Operator,
    audit: &mut AuditLog,
    out: &mut dyn Write,
) -> Result<UpdateReport> {
    let files = &options.files;
    let mut run = Run {
        out,
        audit,
        use_colors: options.use_colors,
    };
    let mut report = UpdateReport::default();

    writeln!(run.out, "-- Update --\n")?;
    let raw = run.read_raw(files)?;
    let key = run.load("Loading answer keys", &files.keys, |p| Ok(AnswerKey::load(p)?))?;
    let roster = run.load("Loading roster", &files.roster, |p| Ok(load_roster(p)?))?;

    let has_new_data = raw.is_some();
    let mut incoming = Vec::new();
    if let Some(text) = raw {
        incoming = parse_scan_lines(text.lines()).map_err(|e| run.fatal(e.into()))?;
        report.ingested = incoming.len();
        writeln!(
            run.out,
            "\nChecking {} new records for improper identifiers...",
            incoming.len()
        )?;
        report.validation = validate_identifiers(&mut incoming, policy, operator, run.audit)?;
        regrade_all(&mut incoming, &key).map_err(|e| run.fatal(e.into()))?;
        run.audit.record(
            AuditAction::Grade,
            format!("graded {} new records from {}", incoming.len(), files.raw.display()),
        )?;
    }

    let existing = load_dataset(&files.dataset).map_err(|e| run.fatal(e))?;
    if existing.is_none() && !has_new_data {
        run.step("Loading previous dataset", StepStatus::Fail)?;
        writeln!(run.out, "No data to analyze. Exiting.")?;
        let err = MastError::fatal_load(
            &files.dataset,
            "no previous dataset and no new data to analyze",
        );
        return Err(run.fatal(err.into()));
    }

    let (mut dataset, outcome) = merge(existing, incoming);
    match outcome {
        MergeOutcome::FirstRun { incoming } => {
            report.first_run = true;
            writeln!(
                run.out,
                "\n** Did not find previous file {}. Creating new file. **\n",
                files.dataset.display()
            )?;
            run.audit.record(
                AuditAction::FirstRun,
                format!(
                    "no previous dataset at {}; starting it with {} records",
                    files.dataset.display(),
                    incoming
                ),
            )?;
        }
        MergeOutcome::Appended { existing, incoming } => {
            run.step("Loading previous dataset", StepStatus::Success)?;
            run.audit.record(
                AuditAction::Merge,
                format!(
                    "appended {} new records to {} records from {}",
                    incoming,
                    existing,
                    files.dataset.display()
                ),
            )?;
        }
    }

    report.duplicates = duplicates::resolve_all(&mut dataset.records, policy, operator, run.audit)?;
    run.step("Checking for duplicate submissions", StepStatus::Success)?;
    run.save(&files.dataset, &dataset, "merged dataset")?;

    report.lost_students = find_lost_students(&dataset.records, &roster).len();
    if report.lost_students == 0 {
        run.step("Searching for lost students", StepStatus::Success)?;
    } else {
        writeln!(
            run.out,
            "\n{} submissions have no matching registration",
            report.lost_students
        )?;
        report.lost_student_edits =
            review_lost_students(&mut dataset.records, &roster, policy, operator, run.audit)?;
        if report.lost_student_edits > 0 {
            // Re-keyed records may now collide with existing submissions.
            let again = duplicates::resolve_all(&mut dataset.records, policy, operator, run.audit)?;
            report.duplicates.over_quota_edits += again.over_quota_edits;
            report.duplicates.repeat_test_edits += again.repeat_test_edits;
            run.step("Rechecking for duplicate submissions", StepStatus::Success)?;
        }
    }

    if options.show_lost_tests {
        report.lost_tests = find_lost_tests(&dataset.records, &roster);
        run.step("Searching for lost tests", StepStatus::Success)?;
        if !report.lost_tests.is_empty() {
            writeln!(
                run.out,
                "\nHere is a list of all missing tests sorted by School ID\n\n{}\n",
                format_lost_tests(&report.lost_tests)
            )?;
        }
    } else {
        run.step("Searching for lost tests", StepStatus::Skipped)?;
    }

    report.regraded = regrade_all(&mut dataset.records, &key).map_err(|e| run.fatal(e.into()))?;
    run.audit.record(
        AuditAction::Grade,
        format!(
            "regraded all {} records; {} scores changed",
            dataset.len(),
            report.regraded
        ),
    )?;
    run.save(&files.dataset, &dataset, "regraded dataset")?;

    let stats = AggregateStats::compute(&dataset.records, &policy.aggregate_ladder);
    report.bucketed = assign_buckets(&mut dataset.records, &stats, policy);
    run.step("Calculating quantiles", StepStatus::Success)?;
    writeln!(
        run.out,
        "\nCurrent test totals\n\n{}\n\n{}\n",
        format_test_totals(&dataset.records, run.use_colors),
        format_aggregates(&stats)
    )?;
    run.save(&files.dataset, &dataset, "dataset with quantile buckets")?;
    save_final_dataset(&files.final_dataset, &dataset).map_err(|e| run.fatal(e))?;
    run.audit.record(
        AuditAction::Save,
        format!(
            "quantiles computed, data sorted and written to {}",
            files.final_dataset.display()
        ),
    )?;

    report.total = dataset.len();
    writeln!(
        run.out,
        "If all scan files have been processed, open {} and edit only the\n\
         award_bucket values before tallying results with `mast results`.",
        files.final_dataset.display()
    )?;
    Ok(report)
}

/// Tally school points and award lists from the reviewed final dataset.
pub fn run_results(
    policy: &ScoringPolicy,
    options: &ResultsOptions,
    audit: &mut AuditLog,
    out: &mut dyn Write,
) -> Result<ResultsReport> {
    let mut run = Run {
        out,
        audit,
        use_colors: options.use_colors,
    };

    writeln!(run.out, "-- Results --\n")?;
    let dataset = run.load("Loading final dataset", &options.data, |p| {
        load_dataset(p)?
            .ok_or_else(|| MastError::fatal_load(p, "file not found").into())
    })?;
    let roster = run.load("Loading roster", &options.roster, |p| Ok(load_roster(p)?))?;
    let schools = run.load("Loading schools", &options.schools, |p| Ok(load_schools(p)?))?;

    let stats = AggregateStats::compute(&dataset.records, &policy.aggregate_ladder);
    let standings = rank_schools(&dataset.records, &stats, policy, &schools);
    let rankings_path = options
        .results_dir
        .join(format!("MaST-School_Rankings{}.json", options.tag));
    write_json_atomic(&rankings_path, &standings).map_err(|e| run.fatal(e))?;
    run.audit.record(
        AuditAction::Save,
        format!("school rankings written to {}", rankings_path.display()),
    )?;
    writeln!(
        run.out,
        "\nTop {} Schools\n\n{}\n",
        TOP_SCHOOLS,
        format_rankings(&standings, TOP_SCHOOLS, run.use_colors)
    )?;

    let winners = award_winners(&dataset.records, &roster, &policy.award_buckets);
    let winners_path = options
        .results_dir
        .join(format!("MaST-winners{}.json", options.tag));
    write_json_atomic(&winners_path, &winners).map_err(|e| run.fatal(e))?;
    run.audit.record(
        AuditAction::Save,
        format!("award winners written to {}", winners_path.display()),
    )?;
    writeln!(run.out, "{}\n", format_winners(&winners))?;
    writeln!(
        run.out,
        "** All result files can be found in the {} folder **",
        options.results_dir.display()
    )?;

    Ok(ResultsReport {
        standings,
        winners,
        rankings_path,
        winners_path,
    })
}
