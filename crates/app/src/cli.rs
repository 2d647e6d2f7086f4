use std::ffi::OsStr;
use std::path::PathBuf;

use clap::Parser;
use glyphfix_ocr::types::DEFAULT_LANGUAGES;
use glyphfix_ocr::{LanguageSpec, OcrOptions, OutputFormat, Transport, IMAGE_ENV_VAR};

#[derive(Debug, Parser)]
#[command(name = "glyphfix", version)]
#[command(about = "Extract text from an image and repair common OCR misreadings")]
pub struct Cli {
    /// File holding base64-encoded image text (otherwise stdin or IMAGE_B64)
    pub file: Option<PathBuf>,

    /// Standard input carries base64 text instead of raw image bytes
    #[arg(long)]
    pub base64: bool,

    /// Languages to recognize, `+`-separated
    #[arg(short, long, env = "OCR_LANG", default_value = DEFAULT_LANGUAGES)]
    pub lang: LanguageSpec,

    /// List installed OCR languages and exit
    #[arg(long, conflicts_with = "file")]
    pub list_langs: bool,

    /// Return the engine text without corrections
    #[arg(long)]
    pub no_correct: bool,

    /// Print a JSON envelope instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Path reported as the source of the image
    #[arg(long, env = "FILE_PATH")]
    pub source_path: Option<String>,

    /// Delete --source-path afterwards when it lives in the scratch directory
    #[arg(long)]
    pub cleanup: bool,

    /// Tesseract executable
    #[arg(long, env = "TESSERACT_BIN", default_value = "tesseract")]
    pub tesseract: PathBuf,

    /// Tesseract language data directory
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn transport(&self) -> Transport {
        Transport::resolve(
            self.base64,
            self.file.clone(),
            std::env::var(IMAGE_ENV_VAR).ok(),
        )
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Plain
        }
    }

    pub fn ocr_options(&self) -> OcrOptions {
        OcrOptions { languages: self.lang.clone(), no_correct: self.no_correct }
    }
}

/// First line of a clap error, without the `error: ` tag or the usage block.
pub fn usage_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

/// Output shape for a command line that did not parse: honour a literal
/// `--json` anywhere among the arguments.
pub fn fallback_format<I, A>(args: I) -> OutputFormat
where
    I: IntoIterator<Item = A>,
    A: AsRef<OsStr>,
{
    if args.into_iter().any(|a| a.as_ref() == "--json") {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    }
}
