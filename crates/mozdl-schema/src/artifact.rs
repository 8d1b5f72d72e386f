//! Resolved build artifacts.

use serde::{Deserialize, Serialize};

/// A resolved, fetchable build artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    /// Download URL (may redirect to the storage backend)
    pub url: String,

    /// Artifact name in the index (e.g. "public/build/target.tar.bz2")
    pub name: String,

    /// Suffix the name was matched against (e.g. ".tar.bz2")
    pub filetype: String,
}

impl ArtifactReference {
    /// Last path segment of the artifact name.
    ///
    /// # Example
    ///
    /// ```
    /// use mozdl_schema::ArtifactReference;
    ///
    /// let artifact = ArtifactReference {
    ///     url: "https://example.com/task/abc/artifacts/public/build/target.zip".to_string(),
    ///     name: "public/build/target.zip".to_string(),
    ///     filetype: ".zip".to_string(),
    /// };
    /// assert_eq!(artifact.file_name(), "target.zip");
    /// ```
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}
