//! File Registry — owns uploaded CV/JD binaries and resolves fuzzy references.

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Whether an uploaded artifact is a candidate CV or a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Cv,
    Jd,
}

/// One uploaded binary, keyed by its original file name.
/// Never mutated after registration; payload clones are cheap (`Bytes`).
#[derive(Debug, Clone)]
pub struct UploadedArtifact {
    pub id: Uuid,
    pub identity: String,
    pub payload: Bytes,
    pub kind: ArtifactKind,
}

/// Process-wide store of uploaded artifacts, in registration order.
///
/// Registration order matters: the substring-match fallback in [`resolve`]
/// returns the first hit, so ties between near-duplicate names break
/// deterministically toward the earliest upload.
///
/// [`resolve`]: FileRegistry::resolve
#[derive(Default)]
pub struct FileRegistry {
    artifacts: RwLock<Vec<UploadedArtifact>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an artifact under its original name. Re-uploading the same
    /// name replaces the payload but keeps the original registration position.
    pub async fn register(&self, identity: &str, payload: Bytes, kind: ArtifactKind) -> Uuid {
        let artifact = UploadedArtifact {
            id: Uuid::new_v4(),
            identity: identity.to_string(),
            payload,
            kind,
        };
        let id = artifact.id;
        let mut artifacts = self.artifacts.write().await;
        if let Some(existing) = artifacts.iter_mut().find(|a| a.identity == identity) {
            *existing = artifact;
        } else {
            artifacts.push(artifact);
        }
        id
    }

    /// Resolves a pairing-table reference to an artifact. Strategies are tried
    /// in order, first hit wins:
    ///
    /// 1. exact match on `name`
    /// 2. exact match on `name.{fallback_ext}`
    /// 3. first artifact of the requested kind whose identity starts with or
    ///    contains `name` (registration order)
    ///
    /// Returns `None` when nothing matches; the caller turns that into a
    /// per-item failure, never a job-level one.
    pub async fn resolve(
        &self,
        name: &str,
        kind: ArtifactKind,
        fallback_ext: &str,
    ) -> Option<UploadedArtifact> {
        let artifacts = self.artifacts.read().await;

        if let Some(a) = artifacts.iter().find(|a| a.identity == name) {
            return Some(a.clone());
        }

        let with_ext = format!("{name}.{fallback_ext}");
        if let Some(a) = artifacts.iter().find(|a| a.identity == with_ext) {
            return Some(a.clone());
        }

        artifacts
            .iter()
            .find(|a| {
                a.kind == kind && (a.identity.starts_with(name) || a.identity.contains(name))
            })
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(s: &str) -> Bytes {
        Bytes::from(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_exact_match_wins() {
        let reg = FileRegistry::new();
        reg.register("john_doe_cv.pdf", payload("a"), ArtifactKind::Cv)
            .await;
        reg.register("john_doe_cv", payload("b"), ArtifactKind::Cv)
            .await;

        let hit = reg
            .resolve("john_doe_cv", ArtifactKind::Cv, "pdf")
            .await
            .unwrap();
        assert_eq!(hit.identity, "john_doe_cv");
    }

    #[tokio::test]
    async fn test_extension_fallback() {
        let reg = FileRegistry::new();
        reg.register("jane_cv.pdf", payload("a"), ArtifactKind::Cv)
            .await;

        let hit = reg.resolve("jane_cv", ArtifactKind::Cv, "pdf").await.unwrap();
        assert_eq!(hit.identity, "jane_cv.pdf");
    }

    #[tokio::test]
    async fn test_substring_fallback_respects_kind() {
        let reg = FileRegistry::new();
        reg.register("backend_jd_v2.pdf", payload("jd"), ArtifactKind::Jd)
            .await;
        reg.register("backend_candidate.pdf", payload("cv"), ArtifactKind::Cv)
            .await;

        let hit = reg.resolve("backend", ArtifactKind::Cv, "pdf").await.unwrap();
        assert_eq!(hit.identity, "backend_candidate.pdf");
        assert_eq!(hit.kind, ArtifactKind::Cv);
    }

    #[tokio::test]
    async fn test_substring_tie_breaks_by_registration_order() {
        let reg = FileRegistry::new();
        reg.register("dev_cv_first.pdf", payload("1"), ArtifactKind::Cv)
            .await;
        reg.register("dev_cv_second.pdf", payload("2"), ArtifactKind::Cv)
            .await;

        let hit = reg.resolve("dev_cv", ArtifactKind::Cv, "pdf").await.unwrap();
        assert_eq!(hit.identity, "dev_cv_first.pdf");
    }

    #[tokio::test]
    async fn test_missing_reference_is_none() {
        let reg = FileRegistry::new();
        assert!(reg.resolve("ghost", ArtifactKind::Cv, "pdf").await.is_none());
    }

    #[tokio::test]
    async fn test_reupload_replaces_payload_in_place() {
        let reg = FileRegistry::new();
        reg.register("cv.pdf", payload("old"), ArtifactKind::Cv).await;
        reg.register("cv.pdf", payload("new"), ArtifactKind::Cv).await;

        assert_eq!(reg.len().await, 1);
        let hit = reg.resolve("cv.pdf", ArtifactKind::Cv, "pdf").await.unwrap();
        assert_eq!(&hit.payload[..], b"new");
    }
}
