use owo_colors::OwoColorize;
use std::io::{self, BufRead, Write};

use super::{CorrectionPrompt, EditContext, EditRequest, Field, Operator};
use crate::error::Result;
use crate::output::format_record_rows;

/// Operator that asks questions on a terminal.
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
    use_colors: bool,
}

impl TerminalOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(use_colors: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), use_colors)
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W, use_colors: bool) -> Self {
        Self {
            input,
            output,
            use_colors,
        }
    }

    /// Prompt with a message and return the trimmed reply.
    fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;
        let mut reply = String::new();
        if self.input.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for a correction",
            )
            .into());
        }
        Ok(reply.trim().to_string())
    }

    fn marker(&self) -> String {
        if self.use_colors {
            "**".red().to_string()
        } else {
            "**".to_string()
        }
    }

    fn ask_index(&mut self) -> Result<Option<usize>> {
        loop {
            let reply = self.prompt(" > Index: ")?;
            if reply == "-1" {
                return Ok(None);
            }
            match reply.parse::<usize>() {
                Ok(index) => return Ok(Some(index)),
                Err(_) => writeln!(self.output, "\nInvalid index. Try again.\n")?,
            }
        }
    }

    fn ask_field(&mut self) -> Result<Field> {
        writeln!(self.output, "\nWhich field would you like to update? Enter number\n")?;
        for field in Field::MENU {
            writeln!(self.output, "   {} - {}", field.menu_number(), field)?;
        }
        writeln!(self.output)?;
        loop {
            let reply = self.prompt(" > Field: ")?;
            match Field::from_menu(&reply) {
                Some(field) => return Ok(field),
                None => writeln!(self.output, "\nInvalid value. Try again.\n")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn request_value(&mut self, prompt: &CorrectionPrompt) -> Result<String> {
        writeln!(self.output, "\n\n{}\n", prompt)?;
        self.prompt(&format!(" > Overwrite {}: ", prompt.field))
    }

    fn request_edit(&mut self, context: &EditContext<'_>) -> Result<Option<EditRequest>> {
        let marker = self.marker();
        writeln!(self.output, "\n{} {} {}\n", marker, context.reason, marker)?;
        writeln!(
            self.output,
            "{}\n",
            format_record_rows(context.records, context.flagged)
        )?;
        writeln!(
            self.output,
            "To update a record first enter the index number of the record to update. Enter -1 to continue with no further edits.\n"
        )?;

        let Some(index) = self.ask_index()? else {
            return Ok(None);
        };
        let field = self.ask_field()?;
        writeln!(self.output, "\nWhat would you like to update it to?\n")?;
        writeln!(self.output, "  {}", field.hint(context.policy))?;
        let value = self.prompt(" > New Value: ")?;
        Ok(Some(EditRequest {
            index,
            field,
            value,
        }))
    }

    fn notify(&mut self, message: &str) {
        // A closed stdout cannot be reported anywhere better
        if writeln!(self.output, "\n{}\n", message).is_err() {
            tracing::warn!("failed to write operator notice: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Answers, Subject, SubmissionRecord};
    use crate::scoring::ScoringPolicy;
    use std::io::Cursor;

    fn operator(input: &str) -> TerminalOperator<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalOperator::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), false)
    }

    #[test]
    fn test_request_value_reads_line() {
        let mut op = operator("  130 \n");
        let prompt = CorrectionPrompt {
            index: 0,
            school_id: 0,
            student_id: 4,
            field: Field::SchoolId,
            offending: "has blank".to_string(),
            hint: Field::SchoolId.hint(&ScoringPolicy::default()),
        };
        assert_eq!(op.request_value(&prompt).unwrap(), "130");
        let shown = String::from_utf8(op.output).unwrap();
        assert!(shown.contains("Invalid School ID 'has blank' for student 4 at index 0."));
        assert!(shown.contains(" > Overwrite School ID: "));
    }

    #[test]
    fn test_request_edit_menu() {
        let mut op = operator("x\n1\n9\n3\nPhysics\n");
        let records = vec![SubmissionRecord::new(
            120,
            4,
            Some(Subject::Biology),
            Answers::default(),
        )];
        let context = EditContext {
            reason: "repeat tests",
            records: &records,
            flagged: &[0],
            may_finish: false,
            policy: &ScoringPolicy::default(),
        };
        let request = op.request_edit(&context).unwrap().unwrap();
        assert_eq!(request.index, 1);
        assert_eq!(request.field, Field::Test);
        assert_eq!(request.value, "Physics");
    }

    #[test]
    fn test_minus_one_ends_edits() {
        let mut op = operator("-1\n");
        let context = EditContext {
            reason: "lost students",
            records: &[],
            flagged: &[],
            may_finish: true,
            policy: &ScoringPolicy::default(),
        };
        assert_eq!(op.request_edit(&context).unwrap(), None);
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut op = operator("");
        let context = EditContext {
            reason: "lost students",
            records: &[],
            flagged: &[],
            may_finish: true,
            policy: &ScoringPolicy::default(),
        };
        assert!(op.request_edit(&context).is_err());
    }
}
