use std::io::Read;
use std::path::{Path, PathBuf};

/// Where a benchmark output blob comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` means standard input, anything else is a file path.
    pub fn parse(arg: &Path) -> Self {
        if arg == Path::new("-") {
            InputSource::Stdin
        } else {
            InputSource::File(arg.to_path_buf())
        }
    }

    /// Read the whole blob into memory.
    pub fn read(&self) -> Result<String, InputError> {
        match self {
            InputSource::Stdin => self.read_from(std::io::stdin().lock()),
            InputSource::File(path) => {
                std::fs::read_to_string(path).map_err(|e| InputError {
                    source_name: self.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Drain `reader` into a String, naming this source in any error.
    pub fn read_from(&self, mut reader: impl Read) -> Result<String, InputError> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf).map_err(|e| InputError {
            source_name: self.to_string(),
            source: e,
        })?;
        Ok(buf)
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSource::Stdin => write!(f, "<stdin>"),
            InputSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Failure reading an input blob.
#[derive(Debug)]
pub struct InputError {
    pub source_name: String,
    pub source: std::io::Error,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to read {}: {}", self.source_name, self.source)
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_dash_is_stdin() {
        assert_eq!(InputSource::parse(Path::new("-")), InputSource::Stdin);
        assert_eq!(
            InputSource::parse(Path::new("run.txt")),
            InputSource::File(PathBuf::from("run.txt"))
        );
    }

    #[test]
    fn test_read_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.txt");
        std::fs::write(&path, "50.000%  0.013 sec.\n").unwrap();
        let text = InputSource::File(path).read().unwrap();
        assert_eq!(text, "50.000%  0.013 sec.\n");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = InputSource::File(path).read().unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_from_stdin_reader() {
        let blob = "50.000%  0.013 sec.\n99.000%  0.024 sec.\n";
        let text = InputSource::Stdin.read_from(blob.as_bytes()).unwrap();
        assert_eq!(text, blob);
    }

    #[test]
    fn test_read_from_invalid_utf8_names_stdin() {
        let bytes: &[u8] = &[0x35, 0x30, 0xff, 0xfe];
        let err = InputSource::Stdin.read_from(bytes).unwrap_err();
        assert_eq!(err.source.kind(), std::io::ErrorKind::InvalidData);
        assert!(err.to_string().starts_with("failed to read <stdin>"));
    }

    #[test]
    fn test_display() {
        assert_eq!(InputSource::Stdin.to_string(), "<stdin>");
    }
}
