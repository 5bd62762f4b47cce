use std::fmt;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// One sanitized line of validator output, without its line ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    pub fn new(stream: OutputStream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
        }
    }
}

/// Item of the delivery channel between a validator run and its consumer.
/// `Failed` is sent at most once and is always the last item.
#[derive(Debug)]
pub enum ValidatorEvent {
    Line(OutputLine),
    Failed(AppError),
}

impl From<AppError> for ValidatorEvent {
    fn from(err: AppError) -> Self {
        ValidatorEvent::Failed(err)
    }
}
