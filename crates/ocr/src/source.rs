use std::io::Read;
use std::path::PathBuf;

use base64::Engine as _;
use tracing::debug;

use crate::error::InputError;
use crate::types::{RawImagePayload, TransportKind};

/// Environment variable read for base64 image text.
pub const IMAGE_ENV_VAR: &str = "IMAGE_B64";

/// One transport per invocation. The env and file variants carry what was
/// resolved at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    BinaryStdin,
    Base64Stdin,
    Base64Env(String),
    Base64File(PathBuf),
}

impl Transport {
    /// Pick the transport: a file argument wins, then a non-empty
    /// `IMAGE_B64` value, then standard input in the requested encoding.
    pub fn resolve(base64_stdin: bool, file: Option<PathBuf>, env_value: Option<String>) -> Self {
        if let Some(path) = file {
            return Transport::Base64File(path);
        }
        match env_value {
            Some(value) if !value.trim().is_empty() => Transport::Base64Env(value),
            _ if base64_stdin => Transport::Base64Stdin,
            _ => Transport::BinaryStdin,
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::BinaryStdin => TransportKind::BinaryStdin,
            Transport::Base64Stdin => TransportKind::Base64Stdin,
            Transport::Base64Env(_) => TransportKind::Base64Env,
            Transport::Base64File(_) => TransportKind::Base64File,
        }
    }
}

pub struct ImageSource {
    transport: Transport,
}

impl ImageSource {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Resolve the payload. `stdin` is only touched by the stdin transports.
    pub fn read<R: Read>(&self, mut stdin: R) -> Result<RawImagePayload, InputError> {
        let kind = self.transport.kind();
        let read_err = |source| InputError::Read { transport: kind, source };

        let bytes = match &self.transport {
            Transport::BinaryStdin => {
                let mut buf = Vec::new();
                stdin.read_to_end(&mut buf).map_err(read_err)?;
                if buf.iter().all(u8::is_ascii_whitespace) {
                    return Err(InputError::Empty { transport: kind });
                }
                buf
            }
            Transport::Base64Stdin => {
                let mut text = String::new();
                stdin.read_to_string(&mut text).map_err(read_err)?;
                decode_base64(&text, kind)?
            }
            Transport::Base64Env(value) => decode_base64(value, kind)?,
            Transport::Base64File(path) => {
                let text = std::fs::read_to_string(path).map_err(read_err)?;
                decode_base64(&text, kind)?
            }
        };

        debug!(transport = %kind, bytes = bytes.len(), "image payload resolved");
        Ok(RawImagePayload { transport: kind, bytes })
    }
}

/// Decode base64 text, ignoring whitespace so line-wrapped input works.
fn decode_base64(text: &str, transport: TransportKind) -> Result<Vec<u8>, InputError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(InputError::Empty { transport });
    }
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact.as_bytes())?;
    if bytes.is_empty() {
        return Err(InputError::Empty { transport });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn b64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[test]
    fn resolve_prefers_file_then_env_then_stdin() {
        let file = Some(PathBuf::from("/tmp/img.b64"));
        let env = Some("aGVsbG8=".to_string());

        assert_eq!(
            Transport::resolve(false, file.clone(), env.clone()),
            Transport::Base64File(PathBuf::from("/tmp/img.b64"))
        );
        assert_eq!(
            Transport::resolve(false, None, env.clone()),
            Transport::Base64Env("aGVsbG8=".into())
        );
        assert_eq!(Transport::resolve(true, None, None), Transport::Base64Stdin);
        assert_eq!(Transport::resolve(false, None, None), Transport::BinaryStdin);
    }

    #[test]
    fn resolve_treats_blank_env_as_unset() {
        assert_eq!(
            Transport::resolve(true, None, Some("  \n".into())),
            Transport::Base64Stdin
        );
    }

    #[test]
    fn binary_stdin_passes_bytes_through() {
        let source = ImageSource::new(Transport::BinaryStdin);
        let payload = source.read(Cursor::new(vec![0x89, b'P', b'N', b'G'])).unwrap();
        assert_eq!(payload.transport, TransportKind::BinaryStdin);
        assert_eq!(payload.bytes, b"\x89PNG");
    }

    #[test]
    fn empty_input_is_rejected_on_every_transport() {
        let dir = tempfile::tempdir().unwrap();
        let blank_file = dir.path().join("blank.b64");
        std::fs::write(&blank_file, "  \n\t").unwrap();

        let cases = [
            (Transport::BinaryStdin, ""),
            (Transport::BinaryStdin, " \n "),
            (Transport::Base64Stdin, ""),
            (Transport::Base64Stdin, "\n\n"),
            (Transport::Base64Env("   ".into()), ""),
            (Transport::Base64File(blank_file), ""),
        ];
        for (transport, stdin) in cases {
            let kind = transport.kind();
            let err = ImageSource::new(transport).read(Cursor::new(stdin)).unwrap_err();
            assert!(
                matches!(err, InputError::Empty { transport } if transport == kind),
                "expected Empty for {kind}, got {err:?}"
            );
        }
    }

    #[test]
    fn invalid_base64_is_an_input_error() {
        let source = ImageSource::new(Transport::Base64Stdin);
        let err = source.read(Cursor::new("not*base64!")).unwrap_err();
        assert!(matches!(err, InputError::InvalidEncoding(_)));
        assert!(err.to_string().starts_with("Invalid base64 input"));
    }

    #[test]
    fn base64_stdin_tolerates_line_wrapping() {
        let encoded = b64(b"some image bytes");
        let wrapped = format!("{}\n{}\n", &encoded[..8], &encoded[8..]);
        let payload = ImageSource::new(Transport::Base64Stdin)
            .read(Cursor::new(wrapped))
            .unwrap();
        assert_eq!(payload.bytes, b"some image bytes");
    }

    #[test]
    fn env_transport_ignores_stdin() {
        let source = ImageSource::new(Transport::Base64Env(b64(b"from env")));
        let payload = source.read(Cursor::new("ignored")).unwrap();
        assert_eq!(payload.bytes, b"from env");
        assert_eq!(payload.transport, TransportKind::Base64Env);
    }

    #[test]
    fn file_transport_reads_base64_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.b64");
        std::fs::write(&path, format!("{}\n", b64(b"from file"))).unwrap();

        let payload = ImageSource::new(Transport::Base64File(path))
            .read(Cursor::new(""))
            .unwrap();
        assert_eq!(payload.bytes, b"from file");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let source = ImageSource::new(Transport::Base64File(PathBuf::from(
            "/nonexistent/glyphfix/img.b64",
        )));
        let err = source.read(Cursor::new("")).unwrap_err();
        assert!(matches!(err, InputError::Read { transport: TransportKind::Base64File, .. }));
    }
}
