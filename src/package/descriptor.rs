use std::fmt;

use semver::Version;

use crate::error::ManifestError;

/// Identifies the release being installed. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    name: String,
    version: Version,
}

impl PackageDescriptor {
    pub fn new(name: &str, version: Version) -> Result<Self, ManifestError> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    /// Build a descriptor from a version string such as `0.1.1`.
    pub fn parse(name: &str, version: &str) -> Result<Self, ManifestError> {
        let version = Version::parse(version.trim_start_matches('v')).map_err(|e| {
            ManifestError::InvalidDescriptor {
                reason: format!("version {:?} is not semantic: {}", version, e),
            }
        })?;
        Self::new(name, version)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

/// Check that `name` can be used as a single path component: non-empty,
/// no separators, no `..`, no whitespace.
pub fn validate_name(name: &str) -> Result<(), ManifestError> {
    if name.is_empty() {
        return Err(ManifestError::InvalidDescriptor {
            reason: "package name is empty".to_string(),
        });
    }
    if name.contains(['/', '\\']) || name.contains("..") || name.chars().any(char::is_whitespace)
    {
        return Err(ManifestError::InvalidDescriptor {
            reason: format!(
                "package name {:?} must not contain '/', '\\', '..' or whitespace",
                name
            ),
        });
    }
    Ok(())
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
