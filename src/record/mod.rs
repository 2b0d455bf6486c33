pub mod parser;
pub mod types;

pub use parser::{parse_scan_line, parse_scan_lines, MIN_LINE_LEN};
pub use types::{test_label, Answers, Subject, SubmissionRecord};
