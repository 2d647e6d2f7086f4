use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

/// Language set used when the caller does not pick one.
pub const DEFAULT_LANGUAGES: &str = "ukr+eng";

/// Where the image bytes came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    BinaryStdin,
    Base64Stdin,
    Base64Env,
    Base64File,
}

impl TransportKind {
    /// Whether the transport carries base64 text rather than raw bytes.
    pub fn is_base64(self) -> bool {
        !matches!(self, TransportKind::BinaryStdin)
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::BinaryStdin => write!(f, "binary stdin"),
            TransportKind::Base64Stdin => write!(f, "base64 stdin"),
            TransportKind::Base64Env => write!(f, "base64 environment variable"),
            TransportKind::Base64File => write!(f, "base64 file"),
        }
    }
}

/// Image bytes resolved from a transport. Never empty once constructed by
/// [`crate::source::ImageSource`].
#[derive(Debug, Clone)]
pub struct RawImagePayload {
    pub transport: TransportKind,
    pub bytes: Vec<u8>,
}

/// A bitmap decoded from a payload, owned by the invocation that made it.
#[derive(Debug)]
pub struct DecodedImage {
    /// Container format sniffed from the leading bytes.
    pub format: ImageFormat,
    pub image: DynamicImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Ordered language identifiers, handed to the recognizer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec(Vec<String>);

impl LanguageSpec {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(languages.into_iter().map(Into::into).collect())
    }

    pub fn languages(&self) -> &[String] {
        &self.0
    }

    /// Tesseract's `+`-joined form, e.g. `ukr+eng`.
    pub fn as_tesseract_arg(&self) -> String {
        self.0.join("+")
    }
}

impl Default for LanguageSpec {
    fn default() -> Self {
        DEFAULT_LANGUAGES.parse().unwrap_or_else(|_| Self(Vec::new()))
    }
}

impl std::str::FromStr for LanguageSpec {
    type Err = std::convert::Infallible;

    /// Splits on `+` or `,`; identifiers are not validated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split(['+', ','])
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }
}

impl std::fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tesseract_arg())
    }
}
