//! # Package Archive Reader
//!
//! Turns an uploaded byte stream into a [`PackageArchive`]. The catalog only
//! depends on the [`ArchiveReader`] trait; [`NupkgReader`] is the reader the
//! server wires in.
//!
//! A `.nupkg` is a zip container with a `.nuspec` XML manifest at its root:
//!
//! ```xml
//! <package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
//!   <metadata>
//!     <id>MyTestPackage</id>
//!     <version>1.0.1</version>
//!     <authors>Jane Doe</authors>
//!     <description>Does things</description>
//!   </metadata>
//! </package>
//! ```

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::types::{PackageArchive, PackageManifest};
use crate::validation::MAX_MANIFEST_SIZE;
use crate::version::{PackageVersion, VersionError};

pub const PACKAGE_EXTENSION: &str = ".nupkg";
const MANIFEST_EXTENSION: &str = ".nuspec";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("unsupported file type '{0}', expected a .nupkg archive")]
    UnsupportedExtension(String),

    #[error("not a valid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive has no .nuspec manifest at its root")]
    MissingManifest,

    #[error("manifest is {size} bytes inflated (max: {max} bytes)")]
    ManifestTooLarge { size: u64, max: u64 },

    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed manifest XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("manifest is missing required element <{0}>")]
    MissingField(&'static str),

    #[error("manifest version '{version}' is invalid: {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },
}

impl ArchiveError {
    /// Machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            ArchiveError::UnsupportedExtension(_) => "unsupported_extension",
            ArchiveError::Zip(_) => "zip",
            ArchiveError::MissingManifest => "missing_manifest",
            ArchiveError::ManifestTooLarge { .. } => "manifest_too_large",
            ArchiveError::Io(_) => "io",
            ArchiveError::Xml(_) => "xml",
            ArchiveError::MissingField(_) => "missing_field",
            ArchiveError::InvalidVersion { .. } => "invalid_version",
        }
    }
}

/// Capability that extracts package metadata from an uploaded archive.
pub trait ArchiveReader: Send + Sync {
    fn read(&self, filename: &str, content: &[u8]) -> Result<PackageArchive, ArchiveError>;
}

/// Reads `.nupkg` archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct NupkgReader;

impl ArchiveReader for NupkgReader {
    fn read(&self, filename: &str, content: &[u8]) -> Result<PackageArchive, ArchiveError> {
        if !filename.to_lowercase().ends_with(PACKAGE_EXTENSION) {
            return Err(ArchiveError::UnsupportedExtension(filename.to_string()));
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(content))?;

        let mut manifest_index = None;
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            let name = entry.name();
            if !name.contains('/') && name.to_lowercase().ends_with(MANIFEST_EXTENSION) {
                manifest_index = Some(index);
                break;
            }
        }
        let index = manifest_index.ok_or(ArchiveError::MissingManifest)?;

        let entry = archive.by_index(index)?;
        let declared = entry.size();
        if declared > MAX_MANIFEST_SIZE {
            return Err(ArchiveError::ManifestTooLarge {
                size: declared,
                max: MAX_MANIFEST_SIZE,
            });
        }

        // The declared size is not trusted; inflate at most one byte past the cap.
        let mut raw = Vec::new();
        entry.take(MAX_MANIFEST_SIZE + 1).read_to_end(&mut raw)?;
        if raw.len() as u64 > MAX_MANIFEST_SIZE {
            return Err(ArchiveError::ManifestTooLarge {
                size: raw.len() as u64,
                max: MAX_MANIFEST_SIZE,
            });
        }
        let xml = String::from_utf8(raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let manifest = parse_manifest(&xml)?;
        debug!(id = %manifest.id, version = %manifest.version, "Read package manifest");

        Ok(PackageArchive {
            manifest,
            source_filename: filename.to_string(),
        })
    }
}

/// Parse the `<package><metadata>` section of a nuspec document.
///
/// Elements are matched by local name so any nuspec schema namespace works.
pub fn parse_manifest(xml: &str) -> Result<PackageManifest, ArchiveError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut fields: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(e) => {
                if let Some(field) = metadata_field(&path) {
                    let text = e.unescape().map_err(quick_xml::Error::from)?;
                    fields.entry(field).or_default().push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(field) = metadata_field(&path) {
                    let text = String::from_utf8_lossy(&e);
                    fields.entry(field).or_default().push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut take = |name: &str| {
        fields
            .remove(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let id = take("id").ok_or(ArchiveError::MissingField("id"))?;
    let version = take("version").ok_or(ArchiveError::MissingField("version"))?;
    PackageVersion::parse(&version).map_err(|source| ArchiveError::InvalidVersion {
        version: version.clone(),
        source,
    })?;

    Ok(PackageManifest {
        id,
        version,
        description: take("description").unwrap_or_default(),
        authors: take("authors").unwrap_or_default(),
        title: take("title"),
        tags: take("tags"),
    })
}

/// Name of the metadata child the reader is inside, if any
fn metadata_field(path: &[String]) -> Option<String> {
    match path {
        [package, metadata, field] if package == "package" && metadata == "metadata" => {
            Some(field.clone())
        }
        _ => None,
    }
}
