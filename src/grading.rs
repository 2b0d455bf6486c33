use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{MastError, Result};
use crate::record::{Answers, Subject, SubmissionRecord};

/// Correct answers per test. Loaded once and never mutated during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerKey {
    keys: BTreeMap<Subject, Answers>,
}

impl AnswerKey {
    pub fn new(keys: BTreeMap<Subject, Answers>) -> Self {
        Self { keys }
    }

    pub fn get(&self, test: Subject) -> Option<&Answers> {
        self.keys.get(&test)
    }

    pub fn tests(&self) -> impl Iterator<Item = Subject> + '_ {
        self.keys.keys().copied()
    }

    /// Parse a YAML map of test name to key letters:
    ///
    /// ```yaml
    /// Biology: "ABCDEABCDE"
    /// Computer Science: "EDCBA"
    /// ```
    pub fn from_yaml(text: &str, source: &Path) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_saphyr::from_str(text)
            .map_err(|e| MastError::fatal_load(source, e.to_string()))?;
        let mut keys = BTreeMap::new();
        for (name, letters) in raw {
            let test: Subject = name
                .parse()
                .map_err(|e: String| MastError::fatal_load(source, e))?;
            let letters = letters.trim();
            if let Some(bad) = letters.chars().find(|c| !('A'..='E').contains(c)) {
                return Err(MastError::fatal_load(
                    source,
                    format!("{} key contains '{}'; only A-E are allowed", test, bad),
                ));
            }
            keys.insert(test, Answers::from_text(letters));
        }
        Ok(Self { keys })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MastError::fatal_load(path, e.to_string()))?;
        let key = Self::from_yaml(&text, path)?;
        tracing::debug!(path = %path.display(), tests = key.keys.len(), "loaded answer key");
        Ok(key)
    }
}

/// Count positions where the answer equals the key, over the shorter length.
pub fn grade(answers: &Answers, key: &Answers) -> u32 {
    answers
        .marks()
        .iter()
        .zip(key.marks())
        .filter(|(answer, correct)| answer == correct)
        .count() as u32
}

/// Score one record against its test's key.
pub fn grade_record(record: &SubmissionRecord, key: &AnswerKey) -> Result<u32> {
    let Some(test) = record.test else {
        return Ok(0);
    };
    let correct = key.get(test).ok_or(MastError::MissingKey(test))?;
    Ok(grade(&record.answers, correct))
}

/// Re-score every record in place. Returns how many scores changed.
pub fn regrade_all(records: &mut [SubmissionRecord], key: &AnswerKey) -> Result<usize> {
    let mut changed = 0;
    for record in records.iter_mut() {
        let score = grade_record(record, key)?;
        if score != record.score {
            record.score = score;
            changed += 1;
        }
    }
    Ok(changed)
}
