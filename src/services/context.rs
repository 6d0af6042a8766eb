//! Source context assembly for generation prompts.
//!
//! Walks the worker source tree and concatenates every matching file
//! into one text blob, with per-file headers. Excluded paths and
//! oversized files are skipped; the size guard keeps a runaway log or
//! data file from blowing up the prompt.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::models::ContextConfig;

/// Assembles the source-context blob consumed by the code generator.
pub struct ContextAssembler {
    root: PathBuf,
    exclude: Vec<String>,
    extensions: Vec<String>,
    max_file_bytes: u64,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            exclude: config.exclude.clone(),
            extensions: config.extensions.clone(),
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Concatenate all matching files under the root, in path order.
    pub async fn assemble(&self) -> std::io::Result<String> {
        let mut files = vec![];
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if self.is_excluded(&path) {
                    continue;
                }
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.wants(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();

        let mut context = String::new();
        for path in files {
            let metadata = tokio::fs::metadata(&path).await?;
            if metadata.len() > self.max_file_bytes {
                warn!(
                    path = %path.display(),
                    bytes = metadata.len(),
                    limit = self.max_file_bytes,
                    "skipping oversized file in context"
                );
                continue;
            }

            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    context.push_str(&format!("--- File: {} ---\n", path.display()));
                    context.push_str(&text);
                    context.push_str("\n\n");
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable file in context");
                }
            }
        }

        debug!(bytes = context.len(), "assembled source context");
        Ok(context)
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.exclude.iter().any(|pattern| {
            if let Some(dir) = pattern.strip_suffix('/') {
                text == dir || text.starts_with(pattern)
            } else {
                text == pattern.as_str()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path, exclude: Vec<String>) -> ContextConfig {
        ContextConfig {
            root: root.to_string_lossy().into_owned(),
            exclude,
            extensions: vec!["py".to_string()],
            max_file_bytes: 64,
        }
    }

    #[tokio::test]
    async fn collects_matching_files_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.py"), "a = 1\n").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub/b.py"), "b = 2\n").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        let assembler = ContextAssembler::new(&config(dir.path(), vec![]));
        let context = assembler.assemble().await.unwrap();

        assert!(context.contains("--- File: "));
        assert!(context.contains("a = 1"));
        assert!(context.contains("b = 2"));
        assert!(!context.contains("ignored"));
    }

    #[tokio::test]
    async fn honors_exclusions_and_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("keep.py"), "k = 1\n").await.unwrap();
        tokio::fs::write(dir.path().join("secret.py"), "s = 1\n").await.unwrap();
        tokio::fs::write(dir.path().join("big.py"), "x".repeat(128)).await.unwrap();

        let excluded = dir.path().join("secret.py").to_string_lossy().into_owned();
        let assembler = ContextAssembler::new(&config(dir.path(), vec![excluded]));
        let context = assembler.assemble().await.unwrap();

        assert!(context.contains("k = 1"));
        assert!(!context.contains("s = 1"));
        assert!(!context.contains("xxxx"));
    }
}
