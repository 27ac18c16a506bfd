use super::entity::ImageArtifact;
use crate::domain::{DomainError, DomainResult};

/// Validates all ImageArtifact invariants
pub fn validate_artifact(artifact: &ImageArtifact) -> DomainResult<()> {
    if artifact.bytes().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Image payload cannot be empty".to_string(),
        ));
    }

    if artifact.file_name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Image file name cannot be empty".to_string(),
        ));
    }

    // An artifact held by the workflow must still be displayable
    if artifact.preview().is_revoked() {
        return Err(DomainError::InvariantViolation(format!(
            "Preview of artifact {} was already revoked",
            artifact.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{ImageMime, ImageOrigin};
    use crate::infrastructure::PreviewRegistry;
    use std::sync::Arc;

    fn artifact(registry: &PreviewRegistry, bytes: Vec<u8>, name: &str) -> ImageArtifact {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let preview = registry.allocate(Arc::clone(&bytes));
        ImageArtifact::new(
            name.to_string(),
            ImageMime::Jpeg,
            ImageOrigin::FileSelection,
            bytes,
            preview,
        )
    }

    #[test]
    fn test_valid_artifact() {
        let registry = PreviewRegistry::new();
        assert!(validate_artifact(&artifact(&registry, vec![0xFF, 0xD8], "me.jpg")).is_ok());
    }

    #[test]
    fn test_empty_payload_fails() {
        let registry = PreviewRegistry::new();
        let result = validate_artifact(&artifact(&registry, Vec::new(), "me.jpg"));

        if let Err(DomainError::InvariantViolation(msg)) = result {
            assert!(msg.contains("cannot be empty"));
        } else {
            panic!("Expected InvariantViolation error");
        }
    }

    #[test]
    fn test_released_artifact_fails() {
        let registry = PreviewRegistry::new();
        let mut released = artifact(&registry, vec![1], "me.jpg");
        released.release();

        assert!(validate_artifact(&released).is_err());
        assert_eq!(registry.live_count(), 0);
    }
}
