use std::io::Write;

use serde::Serialize;

use crate::error::PipelineError;

/// Provenance label used when no source path is known.
pub const STDIN_SENTINEL: &str = "stdin";

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Everything the presenter can print.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OutputEnvelope {
    Text(String),
    Error(String),
    Recognized { ocr_text: String, path_to_file: String },
    Failed { error: String, path_to_file: String },
    Languages { languages: Vec<String> },
}

impl OutputEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self, OutputEnvelope::Error(_) | OutputEnvelope::Failed { .. })
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_error() { EXIT_FAILURE } else { EXIT_SUCCESS }
    }

    /// Body without the trailing newline.
    pub fn render(&self) -> String {
        match self {
            OutputEnvelope::Text(text) => text.clone(),
            OutputEnvelope::Error(message) => format!("Error: {message}"),
            other => serde_json::to_string(other).unwrap_or_else(|e| {
                serde_json::json!({ "error": e.to_string(), "path_to_file": STDIN_SENTINEL })
                    .to_string()
            }),
        }
    }
}

/// Turns every pipeline outcome into one of the two output shapes.
pub struct ResultPresenter {
    format: OutputFormat,
    source_path: String,
}

impl ResultPresenter {
    pub fn new(format: OutputFormat, source_path: Option<&str>) -> Self {
        Self {
            format,
            source_path: source_path.unwrap_or(STDIN_SENTINEL).to_string(),
        }
    }

    pub fn envelope(&self, outcome: &Result<String, PipelineError>) -> OutputEnvelope {
        match outcome {
            Ok(text) => self.success(text.trim().to_string()),
            Err(e) => self.failure(e),
        }
    }

    pub fn languages_envelope(&self, outcome: &Result<Vec<String>, PipelineError>) -> OutputEnvelope {
        match (outcome, self.format) {
            (Ok(langs), OutputFormat::Plain) => OutputEnvelope::Text(langs.join("\n")),
            (Ok(langs), OutputFormat::Json) => {
                OutputEnvelope::Languages { languages: langs.clone() }
            }
            (Err(e), _) => self.failure(e),
        }
    }

    fn success(&self, text: String) -> OutputEnvelope {
        match self.format {
            OutputFormat::Plain => OutputEnvelope::Text(text),
            OutputFormat::Json => OutputEnvelope::Recognized {
                ocr_text: text,
                path_to_file: self.source_path.clone(),
            },
        }
    }

    fn failure(&self, error: &PipelineError) -> OutputEnvelope {
        match self.format {
            OutputFormat::Plain => OutputEnvelope::Error(error.to_string()),
            OutputFormat::Json => OutputEnvelope::Failed {
                error: error.to_string(),
                path_to_file: self.source_path.clone(),
            },
        }
    }

    /// Write the envelope to `out` (success) or `err` (failure) and return
    /// the exit status. Write errors are ignored; the status stands.
    pub fn emit<O: Write, E: Write>(&self, envelope: &OutputEnvelope, out: &mut O, err: &mut E) -> u8 {
        let body = envelope.render();
        let stream: &mut dyn Write = if envelope.is_error() { err } else { out };
        let _ = writeln!(stream, "{body}").and_then(|_| stream.flush());
        envelope.exit_code()
    }
}
