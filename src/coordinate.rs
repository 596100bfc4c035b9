//! Artifact coordinates
//!
//! A [`Coordinate`] identifies one artifact file in a Maven-layout repository:
//! `group:artifact[:extension[:classifier]]:version`. An absent classifier is
//! the empty string for matching and file naming.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ResolverError};

/// Extension used when a coordinate string omits one
pub const DEFAULT_EXTENSION: &str = "jar";

/// Extension of the descriptor (project manifest) resolved alongside an artifact
pub const DESCRIPTOR_EXTENSION: &str = "pom";

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Coordinate string: 3 to 5 colon-separated segments, optional `maven://` prefix.
static COORDINATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:maven://)?([^:\s]+):([^:\s]+)(?::([^:\s]*))?(?::([^:\s]*))?:([^:\s]+)$")
        .expect("valid coordinate regex")
});

/// Identifies a versioned artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    /// Create a coordinate with the default `jar` extension and no classifier
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Set the extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the classifier
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Check that group, artifact, extension and version are non-blank and
    /// that no field can step outside its directory in the local cache.
    ///
    /// Pure check: performs no I/O. A blank classifier is allowed.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("groupId", &self.group),
            ("artifactId", &self.artifact),
            ("extension", &self.extension),
            ("version", &self.version),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ResolverError::InvalidCoordinate { field });
            }
        }

        let segments = [
            ("groupId", self.group.as_str()),
            ("artifactId", self.artifact.as_str()),
            ("extension", self.extension.as_str()),
            ("classifier", self.classifier_or_empty()),
            ("version", self.version.as_str()),
        ];
        for (field, value) in segments {
            if !is_path_segment(value) {
                return Err(ResolverError::UnsafeCoordinate {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Classifier for matching and naming; absent is `""`
    pub fn classifier_or_empty(&self) -> &str {
        self.classifier.as_deref().unwrap_or("")
    }

    /// Same coordinate pointing at the descriptor file
    pub fn descriptor(&self) -> Self {
        self.clone().with_extension(DESCRIPTOR_EXTENSION)
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// File name inside the version directory: `artifact-version[-classifier].extension`
    pub fn file_name(&self) -> String {
        let classifier = self.classifier_or_empty();
        if classifier.is_empty() {
            format!("{}-{}.{}", self.artifact, self.version, self.extension)
        } else {
            format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            )
        }
    }

    /// Path relative to a repository root, `/`-separated
    /// (`org/example/hello/1.0.0/hello-1.0.0.jar`).
    pub fn repository_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }
}

/// No separators, no NUL, and not a `.`/`..` directory reference
fn is_path_segment(value: &str) -> bool {
    !value.contains(['/', '\\', '\0']) && value != "." && value != ".."
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.extension)?;
        if let Some(classifier) = self.classifier.as_deref().filter(|c| !c.is_empty()) {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.version)
    }
}

impl FromStr for Coordinate {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = COORDINATE_RE
            .captures(s.trim())
            .ok_or_else(|| ResolverError::MalformedCoordinate {
                input: s.to_string(),
            })?;

        let extension = caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXTENSION);
        let classifier = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            group: caps[1].to_string(),
            artifact: caps[2].to_string(),
            version: caps[5].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }
}
