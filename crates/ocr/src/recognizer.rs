use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::decode::encode_as_png;
use crate::error::RecognitionError;
use crate::types::{DecodedImage, LanguageSpec};

/// Abstraction over an OCR backend.
/// Implementations take a decoded bitmap plus the languages to recognize and
/// return the raw recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image: &DecodedImage,
        languages: &LanguageSpec,
    ) -> Result<String, RecognitionError>;

    /// Language identifiers the engine has data for.
    fn available_languages(&self) -> Result<Vec<String>, RecognitionError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(
        &self,
        image: &DecodedImage,
        languages: &LanguageSpec,
    ) -> Result<String, RecognitionError> {
        (**self).recognize(image, languages)
    }

    fn available_languages(&self) -> Result<Vec<String>, RecognitionError> {
        (**self).available_languages()
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, for exercising the pipeline without
/// requiring Tesseract to be installed.
pub struct MockRecognizer {
    pub text: String,
    pub languages: Vec<String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), languages: vec!["eng".into(), "ukr".into()] }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(
        &self,
        _image: &DecodedImage,
        _languages: &LanguageSpec,
    ) -> Result<String, RecognitionError> {
        Ok(self.text.clone())
    }

    fn available_languages(&self) -> Result<Vec<String>, RecognitionError> {
        Ok(self.languages.clone())
    }
}

// ── Tesseract executable backend ──────────────────────────────────────────────

/// Runs the `tesseract` executable, piping the image in as PNG.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>, tessdata_dir: Option<PathBuf>) -> Self {
        Self { binary: binary.into(), tessdata_dir }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> RecognitionError {
        if e.kind() == ErrorKind::NotFound {
            RecognitionError::NotAvailable(format!("{} not found", self.binary.display()))
        } else {
            RecognitionError::Engine(format!("failed to run {}: {e}", self.binary.display()))
        }
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(
        &self,
        image: &DecodedImage,
        languages: &LanguageSpec,
    ) -> Result<String, RecognitionError> {
        let png = encode_as_png(&image.image)?;

        let mut cmd = self.command();
        cmd.arg("stdin").arg("stdout");
        if !languages.languages().is_empty() {
            cmd.arg("-l").arg(languages.as_tesseract_arg());
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The engine may exit before reading everything (bad language);
            // its stderr explains why, so a broken pipe is not the error.
            match stdin.write_all(&png) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(RecognitionError::Encode(e.to_string()));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(classify_failure(languages, stderr.trim()));
        }
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "tesseract diagnostics");
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    fn available_languages(&self) -> Result<Vec<String>, RecognitionError> {
        let output = self
            .command()
            .arg("--list-langs")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(stderr.trim().to_string()));
        }

        // Tesseract 3 printed the list on stderr.
        let listing = if output.stdout.is_empty() { output.stderr } else { output.stdout };
        Ok(parse_language_listing(&String::from_utf8(listing)?))
    }
}

/// Missing language data is an initialisation failure; anything else is a
/// recognition failure.
fn classify_failure(languages: &LanguageSpec, stderr: &str) -> RecognitionError {
    let lower = stderr.to_lowercase();
    if lower.contains("failed loading language") || lower.contains("could not initialize") {
        RecognitionError::Init { languages: languages.to_string(), reason: stderr.to_string() }
    } else if stderr.is_empty() {
        RecognitionError::Engine("tesseract exited with an error".to_string())
    } else {
        RecognitionError::Engine(stderr.to_string())
    }
}

/// Parse `tesseract --list-langs` output, dropping the header line.
fn parse_language_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| !l.starts_with("List of available languages"))
        .map(str::to_string)
        .collect()
}

// ── Tesseract library backend (optional, gated behind `tesseract` feature) ────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use std::path::{Path, PathBuf};

    use super::OcrBackend;
    use crate::decode::encode_as_png;
    use crate::error::RecognitionError;
    use crate::types::{DecodedImage, LanguageSpec};
    use leptess::LepTess;

    /// In-process Tesseract via leptess.
    pub struct TesseractRecognizer {
        data_path: Option<String>,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>) -> Self {
            Self { data_path }
        }

        fn tessdata_dir(&self) -> Option<PathBuf> {
            let base = self
                .data_path
                .clone()
                .or_else(|| std::env::var("TESSDATA_PREFIX").ok())?;
            let base = PathBuf::from(base);
            let nested = base.join("tessdata");
            Some(if nested.is_dir() { nested } else { base })
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(
            &self,
            image: &DecodedImage,
            languages: &LanguageSpec,
        ) -> Result<String, RecognitionError> {
            let lang = languages.as_tesseract_arg();
            let mut lt = LepTess::new(self.data_path.as_deref(), &lang).map_err(|e| {
                RecognitionError::Init { languages: lang.clone(), reason: e.to_string() }
            })?;
            let png = encode_as_png(&image.image)?;
            lt.set_image_from_mem(&png)
                .map_err(|e| RecognitionError::Engine(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| RecognitionError::Engine(e.to_string()))
        }

        fn available_languages(&self) -> Result<Vec<String>, RecognitionError> {
            let dir = self.tessdata_dir().ok_or_else(|| {
                RecognitionError::NotAvailable("no tessdata directory configured".into())
            })?;
            list_traineddata(&dir)
        }
    }

    fn list_traineddata(dir: &Path) -> Result<Vec<String>, RecognitionError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            RecognitionError::NotAvailable(format!("{}: {e}", dir.display()))
        })?;
        let mut langs: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("traineddata") {
                    return None;
                }
                path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
            })
            .collect();
        langs.sort();
        Ok(langs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma, Rgb};

    fn blank_image() -> DecodedImage {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([255u8]));
        DecodedImage { format: ImageFormat::Png, image: DynamicImage::ImageLuma8(img) }
    }

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("Залишок 150 2");
        let text = r.recognize(&blank_image(), &LanguageSpec::default()).unwrap();
        assert_eq!(text, "Залишок 150 2");
    }

    #[test]
    fn boxed_backend_delegates() {
        let r: Box<dyn OcrBackend> = Box::new(MockRecognizer::new("hello"));
        assert_eq!(r.recognize(&blank_image(), &LanguageSpec::default()).unwrap(), "hello");
        assert_eq!(r.available_languages().unwrap(), ["eng", "ukr"]);
    }

    #[test]
    fn parses_language_listing() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\nukr\n";
        assert_eq!(parse_language_listing(listing), ["eng", "osd", "ukr"]);
    }

    #[test]
    fn missing_language_data_is_init_failure() {
        let langs: LanguageSpec = "xyz".parse().unwrap();
        let err = classify_failure(
            &langs,
            "Error opening data file /usr/share/tessdata/xyz.traineddata\nFailed loading language 'xyz'",
        );
        assert!(matches!(err, RecognitionError::Init { ref languages, .. } if languages == "xyz"));
    }

    #[test]
    fn other_failures_are_engine_errors() {
        let err = classify_failure(&LanguageSpec::default(), "");
        assert!(matches!(err, RecognitionError::Engine(_)));
    }

    #[test]
    fn missing_binary_is_not_available() {
        let cli = TesseractCli::new("/nonexistent/glyphfix/tesseract", None);
        let err = cli.recognize(&blank_image(), &LanguageSpec::default()).unwrap_err();
        assert!(matches!(err, RecognitionError::NotAvailable(_)));
        let err = cli.available_languages().unwrap_err();
        assert!(matches!(err, RecognitionError::NotAvailable(_)));
    }

    #[cfg(unix)]
    mod fake_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("tesseract");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn recognizes_via_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let bin = script(dir.path(), "cat > /dev/null\nprintf 'Залишок 150 2\\n'");
            let text = TesseractCli::new(bin, None)
                .recognize(&blank_image(), &LanguageSpec::default())
                .unwrap();
            assert_eq!(text, "Залишок 150 2\n");
        }

        #[test]
        fn float_image_reaches_the_engine_as_png() {
            let dir = tempfile::tempdir().unwrap();
            let bin = script(dir.path(), "cat > \"$(dirname \"$0\")/received.png\"\necho ok");
            let hdr = ImageBuffer::from_pixel(4, 4, Rgb([0.25f32, 0.5, 0.75]));
            let image = DecodedImage {
                format: ImageFormat::OpenExr,
                image: DynamicImage::ImageRgb32F(hdr),
            };
            let text = TesseractCli::new(bin, None)
                .recognize(&image, &LanguageSpec::default())
                .unwrap();
            assert_eq!(text, "ok\n");
            let received = std::fs::read(dir.path().join("received.png")).unwrap();
            assert_eq!(&received[..4], b"\x89PNG");
        }

        #[test]
        fn passes_languages_through() {
            let dir = tempfile::tempdir().unwrap();
            let bin = script(dir.path(), "cat > /dev/null\necho \"$@\"");
            let langs: LanguageSpec = "ukr+rus+eng".parse().unwrap();
            let text = TesseractCli::new(bin, Some(PathBuf::from("/data/tess")))
                .recognize(&blank_image(), &langs)
                .unwrap();
            assert_eq!(text.trim(), "--tessdata-dir /data/tess stdin stdout -l ukr+rus+eng");
        }

        #[test]
        fn failed_language_load_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let bin = script(dir.path(), "echo \"Failed loading language 'zz'\" >&2\nexit 1");
            let langs: LanguageSpec = "zz".parse().unwrap();
            let err = TesseractCli::new(bin, None).recognize(&blank_image(), &langs).unwrap_err();
            assert!(matches!(err, RecognitionError::Init { .. }));
        }

        #[test]
        fn lists_languages() {
            let dir = tempfile::tempdir().unwrap();
            let bin = script(
                dir.path(),
                "echo 'List of available languages in \"/tessdata/\" (2):'\necho eng\necho ukr",
            );
            let langs = TesseractCli::new(bin, None).available_languages().unwrap();
            assert_eq!(langs, ["eng", "ukr"]);
        }
    }
}
