use std::collections::VecDeque;
use std::io;

use super::{CorrectionPrompt, EditContext, EditRequest, Field, Operator};
use crate::error::Result;

/// Operator that replays canned answers. Running out of answers is an
/// end-of-input error, so a loop that never converges fails instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    values: VecDeque<String>,
    edits: VecDeque<Option<EditRequest>>,
    prompts: Vec<CorrectionPrompt>,
    edit_reasons: Vec<String>,
    notices: Vec<String>,
}

fn exhausted(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("scripted operator has no more {}", what),
    )
}

impl ScriptedOperator {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_edit(mut self, index: usize, field: Field, value: &str) -> Self {
        self.edits.push_back(Some(EditRequest {
            index,
            field,
            value: value.to_string(),
        }));
        self
    }

    /// Queue a "no more edits" answer.
    pub fn finish(mut self) -> Self {
        self.edits.push_back(None);
        self
    }

    pub fn prompts(&self) -> &[CorrectionPrompt] {
        &self.prompts
    }

    pub fn edit_reasons(&self) -> &[String] {
        &self.edit_reasons
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

impl Operator for ScriptedOperator {
    fn request_value(&mut self, prompt: &CorrectionPrompt) -> Result<String> {
        self.prompts.push(prompt.clone());
        Ok(self.values.pop_front().ok_or_else(|| exhausted("values"))?)
    }

    fn request_edit(&mut self, context: &EditContext<'_>) -> Result<Option<EditRequest>> {
        self.edit_reasons.push(context.reason.to_string());
        Ok(self.edits.pop_front().ok_or_else(|| exhausted("edits"))?)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
