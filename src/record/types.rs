use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scoring::Bucket;

/// The five tournament tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subject {
    Biology,
    Chemistry,
    Mathematics,
    Physics,
    #[serde(rename = "Computer Science")]
    ComputerScience,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Biology,
        Subject::Chemistry,
        Subject::Mathematics,
        Subject::Physics,
        Subject::ComputerScience,
    ];

    /// Map the bubbled test number from a scan sheet.
    pub fn from_digit(token: &str) -> Option<Self> {
        match token {
            "1" => Some(Subject::Biology),
            "2" => Some(Subject::Chemistry),
            "3" => Some(Subject::Mathematics),
            "4" => Some(Subject::Physics),
            "5" => Some(Subject::ComputerScience),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subject::Biology => "Biology",
            Subject::Chemistry => "Chemistry",
            Subject::Mathematics => "Mathematics",
            Subject::Physics => "Physics",
            Subject::ComputerScience => "Computer Science",
        }
    }

    /// Human-readable list of accepted names, used in prompts.
    pub fn choices() -> String {
        "Biology, Chemistry, Computer Science, Mathematics, or Physics".to_string()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subject {
    type Err = String;

    /// Names must be typed exactly as displayed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.name() == s)
            .ok_or_else(|| format!("'{}' is not one of {}", s, Subject::choices()))
    }
}

/// Display helper for a test slot that may still be unresolved.
pub fn test_label(test: Option<Subject>) -> String {
    test.map(|t| t.name().to_string())
        .unwrap_or_else(|| "None".to_string())
}

/// Ordered answer marks for one sheet.
///
/// Letters A-E are bubbled choices; anything else (blank, `*` for a
/// multi-mark, stray digits) is kept verbatim and never matches a key.
/// Persisted as a single string with one character per position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Answers(Vec<char>);

impl Answers {
    pub fn new(marks: Vec<char>) -> Self {
        Self(marks)
    }

    pub fn marks(&self) -> &[char] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.0.iter().collect()
    }

    pub fn from_text(text: &str) -> Self {
        Self(text.chars().collect())
    }
}

impl From<String> for Answers {
    fn from(text: String) -> Self {
        Answers::from_text(&text)
    }
}

impl From<Answers> for String {
    fn from(answers: Answers) -> Self {
        answers.to_text()
    }
}

/// One graded answer sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub school_id: u32,
    pub student_id: u32,
    /// `None` until the bubbled test number resolves to a known test.
    pub test: Option<Subject>,
    pub answers: Answers,
    #[serde(default)]
    pub score: u32,
    /// Percentile tier computed from the current dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantile_bucket: Option<Bucket>,
    /// Tier used for award lists; starts as a copy of `quantile_bucket`
    /// and may be hand-edited before results are tallied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_bucket: Option<Bucket>,
}

impl SubmissionRecord {
    pub fn new(school_id: u32, student_id: u32, test: Option<Subject>, answers: Answers) -> Self {
        Self {
            school_id,
            student_id,
            test,
            answers,
            score: 0,
            quantile_bucket: None,
            award_bucket: None,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "school {} student {} test {}",
            self.school_id,
            self.student_id,
            test_label(self.test)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_from_digit() {
        assert_eq!(Subject::from_digit("1"), Some(Subject::Biology));
        assert_eq!(Subject::from_digit("5"), Some(Subject::ComputerScience));
        assert_eq!(Subject::from_digit("0"), None);
        assert_eq!(Subject::from_digit("6"), None);
    }

    #[test]
    fn test_subject_parse_requires_exact_name() {
        assert_eq!("Physics".parse::<Subject>(), Ok(Subject::Physics));
        assert_eq!(
            "Computer Science".parse::<Subject>(),
            Ok(Subject::ComputerScience)
        );
        assert!("physics".parse::<Subject>().is_err());
        assert!("ComputerScience".parse::<Subject>().is_err());
    }

    #[test]
    fn test_subject_serializes_display_name() {
        let json = serde_json::to_string(&Subject::ComputerScience).unwrap();
        assert_eq!(json, "\"Computer Science\"");
    }

    #[test]
    fn test_answers_text_roundtrip_keeps_blanks_and_marks() {
        let text = "AB E*C  D12";
        let answers = Answers::from_text(text);
        assert_eq!(answers.len(), 11);
        assert_eq!(answers.marks()[2], ' ');
        assert_eq!(answers.to_text(), text);
    }

    #[test]
    fn test_record_json_roundtrip_restores_structured_answers() {
        let mut record = SubmissionRecord::new(
            120,
            4,
            Some(Subject::Biology),
            Answers::new(vec!['A', ' ', '*', 'E']),
        );
        record.score = 2;
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"answers\":\"A *E\""));
        let parsed: SubmissionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.answers.marks(), &['A', ' ', '*', 'E']);
    }

    #[test]
    fn test_unknown_test_label() {
        assert_eq!(test_label(None), "None");
        assert_eq!(test_label(Some(Subject::Chemistry)), "Chemistry");
    }
}
