//! Package version parsing and ordering.
//!
//! Feed versions are dotted numeric releases with an optional pre-release
//! label and optional build metadata: `1.0`, `2.1.3`, `1.0.0.4`,
//! `3.0.0-beta.2`, `1.2.0+sha.5114f85`. Releases of different lengths compare
//! as if padded with zeros, so `1.0` and `1.0.0` are the same version.
//! Pre-release labels follow semver precedence and a release always outranks
//! its own pre-releases. Comparison ignores case and build metadata.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Prerelease;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version is empty")]
    Empty,

    #[error("release segment '{0}' is not a number")]
    InvalidSegment(String),

    #[error("invalid pre-release label '{label}': {reason}")]
    InvalidPrerelease { label: String, reason: String },
}

/// A parsed, comparable package version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    release: Vec<u64>,
    pre: Prerelease,
}

impl PackageVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VersionError::Empty);
        }

        let lowered = input.to_lowercase();
        let without_build = lowered.split('+').next().unwrap_or_default();
        let (release_part, pre_part) = match without_build.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (without_build, None),
        };

        let release = release_part
            .split('.')
            .map(|segment| {
                segment
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidSegment(segment.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match pre_part {
            Some("") => {
                return Err(VersionError::InvalidPrerelease {
                    label: String::new(),
                    reason: "empty label".to_string(),
                })
            }
            Some(label) => {
                Prerelease::new(label).map_err(|e| VersionError::InvalidPrerelease {
                    label: label.to_string(),
                    reason: e.to_string(),
                })?
            }
            None => Prerelease::EMPTY,
        };

        Ok(Self { release, pre })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

impl FromStr for PackageVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pre.cmp(&other.pre))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

/// Semantic comparison of two version strings.
///
/// Strings that fail to parse sort below every valid version and fall back to
/// a case-insensitive textual comparison among themselves.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (PackageVersion::parse(a), PackageVersion::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PackageVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("2.0.0") > v("1.0.1"));
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("1.0.1") > v("1.0.0"));
    }

    #[test]
    fn test_release_length_is_padded() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.0.0.1") > v("1.0"));
    }

    #[test]
    fn test_prerelease_ordering() {
        assert!(v("1.0.0") > v("1.0.0-rc.1"));
        assert!(v("1.0.0-beta.2") > v("1.0.0-alpha"));
        assert!(v("1.0.0-beta.11") > v("1.0.0-beta.2"));
        assert!(v("1.0.0-BETA").is_prerelease());
        assert_eq!(v("1.0.0-Beta"), v("1.0.0-beta"));
    }

    #[test]
    fn test_build_metadata_is_ignored() {
        assert_eq!(v("1.2.0+sha.5114f85"), v("1.2.0"));
    }

    #[test]
    fn test_invalid_versions() {
        assert_eq!(PackageVersion::parse(""), Err(VersionError::Empty));
        assert!(matches!(
            PackageVersion::parse("1.x.0"),
            Err(VersionError::InvalidSegment(_))
        ));
        assert!(PackageVersion::parse("1..0").is_err());
        assert!(PackageVersion::parse("1.0.0-").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(v("1.02.3-RC.1").to_string(), "1.2.3-rc.1");
    }

    #[test]
    fn test_compare_versions_handles_unparseable() {
        assert_eq!(compare_versions("2.0.0", "1.0.1"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "not-a-version"), Ordering::Greater);
        assert_eq!(compare_versions("abc", "ABD"), Ordering::Less);
    }
}
