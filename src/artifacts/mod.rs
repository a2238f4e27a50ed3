//! Artifact persistence collaborator.
//!
//! The history manager hands a folder hint and a bundle of named text files
//! to a sink and records whatever opaque handles come back. The local sink
//! writes files under the data directory; an external document store would
//! implement the same trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Opaque handle to one persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    pub resolved_path: String,
}

/// One named text file within a bundle.
pub struct ArtifactFile<'a> {
    pub name: &'a str,
    pub text: &'a str,
}

#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist a bundle of files under one folder derived from the hint.
    /// All files of a bundle land together; refs come back in input order.
    async fn write(
        &self,
        folder_hint: &str,
        files: &[ArtifactFile<'_>],
    ) -> Result<Vec<ArtifactRef>>;
}

/// Writes artifacts as plain files under a root directory.
pub struct LocalArtifactSink {
    root: PathBuf,
}

impl LocalArtifactSink {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a collision-free folder for the hint by appending a counter.
    fn resolve_folder(&self, hint: &str) -> PathBuf {
        let path = self.root.join(hint);
        if !path.exists() {
            return path;
        }

        for i in 1..100 {
            let alt = self.root.join(format!("{hint}-{i}"));
            if !alt.exists() {
                return alt;
            }
        }

        path
    }
}

#[async_trait]
impl ArtifactSink for LocalArtifactSink {
    async fn write(
        &self,
        folder_hint: &str,
        files: &[ArtifactFile<'_>],
    ) -> Result<Vec<ArtifactRef>> {
        let folder = self.resolve_folder(folder_hint);
        tokio::fs::create_dir_all(&folder)
            .await
            .context("Failed to create artifact folder")?;

        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            let path = folder.join(file.name);
            tokio::fs::write(&path, file.text)
                .await
                .with_context(|| format!("Failed to write artifact {:?}", path))?;

            refs.push(ArtifactRef {
                id: format!(
                    "{}/{}",
                    folder.file_name().unwrap_or_default().to_string_lossy(),
                    file.name
                ),
                resolved_path: path.to_string_lossy().into_owned(),
            });
        }

        info!("Persisted {} artifact(s) under {:?}", refs.len(), folder);
        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_bundle_under_one_folder() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalArtifactSink::new(dir.path().to_path_buf());

        let refs = sink
            .write(
                "abc-defg-hij-20250101-0900",
                &[
                    ArtifactFile {
                        name: "summary.md",
                        text: "# Summary",
                    },
                    ArtifactFile {
                        name: "transcript.txt",
                        text: "Hello",
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(refs.len(), 2);
        let summary = std::fs::read_to_string(&refs[0].resolved_path).unwrap();
        assert_eq!(summary, "# Summary");
        assert!(refs[0].id.ends_with("summary.md"));
    }

    #[tokio::test]
    async fn test_folder_collision_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalArtifactSink::new(dir.path().to_path_buf());
        let files = [ArtifactFile {
            name: "summary.md",
            text: "first",
        }];

        let first = sink.write("abc", &files).await.unwrap();
        let second = sink.write("abc", &files).await.unwrap();

        assert_ne!(first[0].resolved_path, second[0].resolved_path);
        assert!(second[0].id.starts_with("abc-1/"));
    }
}
