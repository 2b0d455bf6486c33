use super::types::{Answers, Subject, SubmissionRecord};
use crate::error::{MastError, Result};

/// Shortest line that still reaches the test-number column.
pub const MIN_LINE_LEN: usize = 51;

const ID_BLOCK: std::ops::Range<usize> = 40..45;
const TEST_COLUMN: usize = 50;
const UNKNOWN_ID_BLOCK: [char; 5] = ['0'; 5];
const UNKNOWN_TEST_DIGIT: char = '0';

/// Whitespace fields the scanner writes before the identifier block.
const LEADING_FIELDS: usize = 4;

/// Parse every line of a scanner export. One bad line aborts the whole file.
pub fn parse_scan_lines<'a, I>(lines: I) -> Result<Vec<SubmissionRecord>>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| parse_scan_line(i + 1, line))
        .collect()
}

/// Parse one fixed-layout scan line. `line_no` is 1-based and only used in errors.
///
/// Blank test digits and blank identifier columns are replaced with zeros so
/// the record survives to identifier validation instead of being dropped.
pub fn parse_scan_line(line_no: usize, line: &str) -> Result<SubmissionRecord> {
    let mut chars: Vec<char> = line.chars().collect();
    if chars.len() < MIN_LINE_LEN {
        return Err(MastError::malformed(
            line_no,
            format!(
                "expected at least {} characters, found {}",
                MIN_LINE_LEN,
                chars.len()
            ),
        ));
    }

    if chars[TEST_COLUMN] == ' ' {
        chars[TEST_COLUMN] = UNKNOWN_TEST_DIGIT;
    }
    if chars[ID_BLOCK].contains(&' ') {
        chars.splice(ID_BLOCK, UNKNOWN_ID_BLOCK);
    }
    let line: String = chars.into_iter().collect();

    let fields = split_fields(&line, LEADING_FIELDS + 2);
    let tail = fields.get(LEADING_FIELDS..).unwrap_or_default();
    let [identifier, test_token, marks] = tail else {
        return Err(MastError::malformed(
            line_no,
            format!(
                "expected identifier, test number and answers after {} leading fields",
                LEADING_FIELDS
            ),
        ));
    };

    let (school_id, student_id) = split_identifier(identifier)
        .ok_or_else(|| MastError::malformed(line_no, format!("bad identifier '{}'", identifier)))?;

    Ok(SubmissionRecord::new(
        school_id,
        student_id,
        Subject::from_digit(test_token),
        map_marks(marks),
    ))
}

/// First three digits are the school, the next two the student.
fn split_identifier(identifier: &str) -> Option<(u32, u32)> {
    let school = identifier.get(0..3)?.parse().ok()?;
    let student = identifier.get(3..5)?.parse().ok()?;
    Some((school, student))
}

/// Bubble positions 1-5 become letters A-E; everything else passes through.
fn map_marks(marks: &str) -> Answers {
    Answers::new(
        marks
            .chars()
            .map(|c| match c {
                '1' => 'A',
                '2' => 'B',
                '3' => 'C',
                '4' => 'D',
                '5' => 'E',
                other => other,
            })
            .collect(),
    )
}

/// Split on whitespace runs at most `max_splits` times. The final field
/// keeps its interior and trailing whitespace, since blanks inside the
/// answer string are unanswered questions.
fn split_fields(line: &str, max_splits: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if fields.len() == max_splits {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a line with the identifier block at column 40 and the test digit at 50.
    fn scan_line(id_block: &str, test: char, answers: &str) -> String {
        // Four leading fields padded out to column 40.
        let prefix = format!("{:<10}{:<10}{:<10}{:<10}", "0001", "SCAN", "2024", "X");
        format!("{}{:<5}     {}  {}", prefix, id_block, test, answers)
    }

    #[test]
    fn test_layout_helper_places_columns() {
        let line = scan_line("12004", '4', "12345");
        let chars: Vec<char> = line.chars().collect();
        assert_eq!(chars[40..45].iter().collect::<String>(), "12004");
        assert_eq!(chars[50], '4');
    }

    #[test]
    fn test_parse_valid_line() {
        let line = scan_line("12004", '4', "1234512 5*");
        let record = parse_scan_line(1, &line).unwrap();
        assert_eq!(record.school_id, 120);
        assert_eq!(record.student_id, 4);
        assert_eq!(record.test, Some(Subject::Physics));
        assert_eq!(record.answers.to_text(), "ABCDEAB E*");
        assert_eq!(record.score, 0);
        assert_eq!(record.quantile_bucket, None);
    }

    #[test]
    fn test_blank_test_digit_becomes_unknown_test() {
        let line = scan_line("12004", ' ', "12345");
        let record = parse_scan_line(1, &line).unwrap();
        assert_eq!(record.school_id, 120);
        assert_eq!(record.test, None);
    }

    #[test]
    fn test_unmapped_test_digit_is_unknown() {
        let line = scan_line("12004", '7', "12345");
        let record = parse_scan_line(1, &line).unwrap();
        assert_eq!(record.test, None);
    }

    #[test]
    fn test_blank_in_id_block_zeroes_ids() {
        let line = scan_line("12 04", '2', "111");
        let record = parse_scan_line(1, &line).unwrap();
        assert_eq!(record.school_id, 0);
        assert_eq!(record.student_id, 0);
        assert_eq!(record.test, Some(Subject::Chemistry));
        assert_eq!(record.answers.to_text(), "AAA");
    }

    #[test]
    fn test_short_line_is_malformed() {
        let err = parse_scan_line(3, "too short").unwrap_err();
        match err {
            MastError::ParseMalformed { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_answers_is_malformed() {
        let prefix = format!("{:<10}{:<10}{:<10}{:<10}", "0001", "SCAN", "2024", "X");
        let line = format!("{}12004     4", prefix);
        assert!(matches!(
            parse_scan_line(1, &line),
            Err(MastError::ParseMalformed { .. })
        ));
    }

    #[test]
    fn test_one_bad_line_aborts_file() {
        let good = scan_line("12004", '4', "12345");
        let lines = vec![good.as_str(), "short"];
        let err = parse_scan_lines(lines).unwrap_err();
        assert!(matches!(err, MastError::ParseMalformed { line: 2, .. }));
    }

    #[test]
    fn test_parse_many_keeps_order() {
        let a = scan_line("12004", '4', "1");
        let b = scan_line("30112", '1', "2");
        let records = parse_scan_lines([a.as_str(), b.as_str()]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].school_id, 120);
        assert_eq!(records[1].school_id, 301);
        assert_eq!(records[1].student_id, 12);
    }

    #[test]
    fn test_split_fields_keeps_tail_whitespace() {
        let fields = split_fields("  a b  c d e f g  h i ", 6);
        assert_eq!(fields, vec!["a", "b", "c", "d", "e", "f", "g  h i "]);
    }
}
