use std::io::Read;

use tracing::debug;

use crate::correct::{self, CorrectionEngine};
use crate::decode;
use crate::error::PipelineError;
use crate::recognizer::OcrBackend;
use crate::source::ImageSource;
use crate::types::{LanguageSpec, RawImagePayload};

/// Per-invocation recognition settings.
#[derive(Debug, Clone, Default)]
pub struct OcrOptions {
    pub languages: LanguageSpec,
    /// Skip the correction stage and return the trimmed engine text.
    pub no_correct: bool,
}

/// Orchestrates: source → decode → OCR → trim → correct.
pub struct OcrPipeline<R: OcrBackend> {
    recognizer: R,
    corrector: &'static CorrectionEngine,
    options: OcrOptions,
}

impl<R: OcrBackend> OcrPipeline<R> {
    pub fn new(recognizer: R, options: OcrOptions) -> Self {
        Self { recognizer, corrector: correct::builtin(), options }
    }

    /// Read the payload from `source`, then process it.
    pub fn run<I: Read>(&self, source: &ImageSource, stdin: I) -> Result<String, PipelineError> {
        let payload = source.read(stdin)?;
        self.process_payload(&payload)
    }

    pub fn process_payload(&self, payload: &RawImagePayload) -> Result<String, PipelineError> {
        let image = decode::decode(payload)?;

        debug!(languages = %self.options.languages, "running OCR");
        let raw = self.recognizer.recognize(&image, &self.options.languages)?;
        let text = raw.trim();

        if self.options.no_correct {
            return Ok(text.to_string());
        }
        Ok(self.corrector.apply(text))
    }

    /// Query mode: list installed languages without touching any input.
    pub fn available_languages(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.recognizer.available_languages()?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
