use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::ResourceError;

/// Pre-flight validation run before any request is dispatched.
#[async_trait]
pub trait ResourceCheck: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when a resource the run depends on is unavailable.
    async fn check(&self) -> Result<(), ResourceError>;
}

/// Verifies every referenced input file is a readable regular file.
#[derive(Debug, Clone, Default)]
pub struct FileResources {
    paths: Vec<PathBuf>,
}

impl FileResources {
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl ResourceCheck for FileResources {
    async fn check(&self) -> Result<(), ResourceError> {
        for path in &self.paths {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|err| ResourceError::Unreadable {
                    path: path.clone(),
                    source: err,
                })?;
            let metadata = file
                .metadata()
                .await
                .map_err(|err| ResourceError::Unreadable {
                    path: path.clone(),
                    source: err,
                })?;
            if !metadata.is_file() {
                return Err(ResourceError::NotAFile { path: path.clone() });
            }
        }
        Ok(())
    }
}
