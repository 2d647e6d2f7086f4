pub mod cleanup;
pub mod correct;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod present;
pub mod recognizer;
pub mod source;
pub mod types;

pub use cleanup::TempArtifactCleaner;
pub use correct::{CorrectionEngine, CorrectionRule, RuleScope, CORRECTION_RULES};
pub use error::{CleanupError, DecodeError, InputError, PipelineError, RecognitionError};
pub use pipeline::{OcrOptions, OcrPipeline};
pub use present::{OutputEnvelope, OutputFormat, ResultPresenter};
pub use recognizer::{MockRecognizer, OcrBackend, TesseractCli};
pub use source::{ImageSource, Transport, IMAGE_ENV_VAR};
pub use types::{DecodedImage, LanguageSpec, RawImagePayload, TransportKind};
