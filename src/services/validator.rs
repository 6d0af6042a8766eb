//! Syntactic validation of candidate source files.
//!
//! Deliberately shallow: a compile-only (parse, never execute) check
//! that catches gross syntax breakage before a candidate is allowed to
//! replace the live file. Semantic bugs are the self-correction loop's
//! problem, not the validator's.

use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// File kinds the validator knows how to check. Anything else passes
/// unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Python,
    Json,
    Yaml,
    Other,
}

impl FileKind {
    /// Kind derived from a path's extension. Callers validating a temp
    /// copy should derive the kind from the *target* path, since temp
    /// siblings carry a `.tmp` suffix.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Self::Python,
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    /// The candidate is syntactically invalid; the detail is suitable
    /// for the history log.
    #[error("{0}")]
    Syntax(String),

    /// The check itself could not run (missing interpreter, unreadable
    /// file). Not a verdict on the candidate.
    #[error("syntax check could not run: {0}")]
    Io(#[from] std::io::Error),
}

/// Compile-only syntax checker.
pub struct Validator {
    python_bin: String,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            python_bin: "python3".to_string(),
        }
    }

    #[must_use]
    pub fn with_python(python_bin: impl Into<String>) -> Self {
        Self {
            python_bin: python_bin.into(),
        }
    }

    /// Check the file at `path`, treating it as `kind`.
    pub async fn validate(&self, path: &Path, kind: FileKind) -> Result<(), ValidationError> {
        debug!(path = %path.display(), ?kind, "validating candidate");
        match kind {
            FileKind::Python => self.check_python(path).await,
            FileKind::Json => {
                let text = tokio::fs::read_to_string(path).await?;
                serde_json::from_str::<serde_json::Value>(&text)
                    .map(|_| ())
                    .map_err(|err| ValidationError::Syntax(format!("invalid JSON: {err}")))
            }
            FileKind::Yaml => {
                let text = tokio::fs::read_to_string(path).await?;
                serde_yaml::from_str::<serde_yaml::Value>(&text)
                    .map(|_| ())
                    .map_err(|err| ValidationError::Syntax(format!("invalid YAML: {err}")))
            }
            FileKind::Other => Ok(()),
        }
    }

    async fn check_python(&self, path: &Path) -> Result<(), ValidationError> {
        let output = Command::new(&self.python_bin)
            .args(["-m", "py_compile"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(ValidationError::Syntax(format!(
                "python syntax error: {stderr}"
            )))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/worker.py")), FileKind::Python);
        assert_eq!(FileKind::from_path(Path::new("cfg.json")), FileKind::Json);
        assert_eq!(FileKind::from_path(Path::new("cfg.yml")), FileKind::Yaml);
        assert_eq!(FileKind::from_path(Path::new("notes.txt")), FileKind::Other);
        assert_eq!(FileKind::from_path(Path::new("Makefile")), FileKind::Other);
    }

    #[tokio::test]
    async fn valid_json_passes_and_invalid_fails() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::new();

        let good = dir.path().join("good.json");
        tokio::fs::write(&good, r#"{"a": [1, 2]}"#).await.unwrap();
        assert!(validator.validate(&good, FileKind::Json).await.is_ok());

        let bad = dir.path().join("bad.json");
        tokio::fs::write(&bad, r#"{"a": [1, 2"#).await.unwrap();
        assert!(matches!(
            validator.validate(&bad, FileKind::Json).await,
            Err(ValidationError::Syntax(_))
        ));
    }

    #[tokio::test]
    async fn unknown_kind_is_a_no_op_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        tokio::fs::write(&path, b"\x00\x01\x02").await.unwrap();

        let validator = Validator::new();
        assert!(validator.validate(&path, FileKind::Other).await.is_ok());
    }

    #[tokio::test]
    async fn python_check_rejects_broken_source() {
        if Command::new("python3").arg("--version").output().await.is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::new();

        let good = dir.path().join("good.py");
        tokio::fs::write(&good, "print('ok')\n").await.unwrap();
        assert!(validator.validate(&good, FileKind::Python).await.is_ok());

        let bad = dir.path().join("bad.py");
        tokio::fs::write(&bad, "print('unclosed\n").await.unwrap();
        assert!(matches!(
            validator.validate(&bad, FileKind::Python).await,
            Err(ValidationError::Syntax(_))
        ));
    }

    #[tokio::test]
    async fn missing_interpreter_is_io_not_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("w.py");
        tokio::fs::write(&path, "x = 1\n").await.unwrap();

        let validator = Validator::with_python("definitely-not-a-python");
        assert!(matches!(
            validator.validate(&path, FileKind::Python).await,
            Err(ValidationError::Io(_))
        ));
    }
}
