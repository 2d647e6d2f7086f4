use thiserror::Error;

use crate::types::TransportKind;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("No data provided via {transport}")]
    Empty { transport: TransportKind },
    #[error("Invalid base64 input - {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("Failed to read {transport}: {source}")]
    Read {
        transport: TransportKind,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Cannot open image: unrecognized image format")]
    UnknownFormat(#[source] image::ImageError),
    #[error("Cannot open image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("OCR engine not available: {0}")]
    NotAvailable(String),
    #[error("OCR engine could not load languages '{languages}': {reason}")]
    Init { languages: String, reason: String },
    #[error("OCR failed - {0}")]
    Engine(String),
    #[error("Failed to hand image to OCR engine: {0}")]
    Encode(String),
    #[error("OCR engine returned invalid UTF-8: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

/// Raised while removing a scratch file. Never leaves
/// [`crate::cleanup::TempArtifactCleaner`].
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("Failed to remove {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    /// The command line could not be parsed.
    #[error("{0}")]
    Usage(String),
    #[error("Interrupted")]
    Interrupted,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Stable category name, kept apart from the rendered message.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Input(_) => "input",
            PipelineError::Decode(_) => "decode",
            PipelineError::Recognition(_) => "recognition",
            PipelineError::Usage(_) => "usage",
            PipelineError::Interrupted => "interrupted",
            PipelineError::Unexpected(_) => "unexpected",
        }
    }
}
