//! KEY index parsing and lookup

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bif::{Bif, ResourceLocator};
use crate::cursor::ByteCursor;
use crate::key::error::{KeyError, KeyResult};
use crate::key::resource_type::ResourceType;
use crate::key::{KEY_SIGNATURE, KEY_VERSION};

/// Size of one archive table record
const ARCHIVE_ENTRY_SIZE: usize = 12;

/// Archive listed in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRef {
    /// Relative path with forward slashes, as stored (case preserved)
    pub name: String,
    /// Archive file length
    pub length: u32,
    /// Location flags; bits 0x08/0x10/0x20 name the CD folder
    pub location: u16,
}

impl ArchiveRef {
    /// CD sub-folder the location flags point at, if any
    ///
    /// When several bits are set the lowest CD number wins.
    pub const fn cd_folder(&self) -> Option<&'static str> {
        if self.location & 0x08 != 0 {
            Some("cd2")
        } else if self.location & 0x10 != 0 {
            Some("cd3")
        } else if self.location & 0x20 != 0 {
            Some("cd4")
        } else {
            None
        }
    }

    /// Path of the archive under a game root
    ///
    /// The CD folder is tried first; when nothing exists there the archive
    /// is expected directly under `root`. The relative part is lowercased.
    pub fn resolve_path(&self, root: &Path) -> PathBuf {
        let relative = self.name.to_lowercase();
        if let Some(cd) = self.cd_folder() {
            let on_cd = root.join(cd).join(&relative);
            if on_cd.exists() {
                return on_cd;
            }
        }
        root.join(relative)
    }
}

/// One resource listed in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Resource name, at most eight characters
    pub name: String,
    /// Resource type
    pub resource_type: ResourceType,
    /// Where the resource lives
    pub locator: ResourceLocator,
}

impl ResourceEntry {
    /// Name with its type extension appended
    pub fn file_name(&self) -> String {
        match self.resource_type.extension() {
            Some(ext) => format!("{}.{ext}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Parsed `chitin.key` index
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    archives: Vec<ArchiveRef>,
    resources: Vec<ResourceEntry>,
}

impl KeyIndex {
    /// Read an index from disk
    pub fn open(path: impl AsRef<Path>) -> KeyResult<Self> {
        Self::parse(&std::fs::read(path)?)
    }

    /// Parse an index held in memory
    pub fn parse(data: &[u8]) -> KeyResult<Self> {
        let mut cursor = ByteCursor::new(data);
        let signature = cursor.read_tag()?;
        if &signature != KEY_SIGNATURE {
            return Err(KeyError::InvalidSignature(signature));
        }
        let version = cursor.read_tag()?;
        if &version != KEY_VERSION {
            return Err(KeyError::UnsupportedVersion(version));
        }

        let archive_count = cursor.read_u32()? as usize;
        let resource_count = cursor.read_u32()? as usize;
        let archive_offset = cursor.read_u32()? as usize;
        let resource_offset = cursor.read_u32()? as usize;

        let mut archives = Vec::with_capacity(archive_count.min(4096));
        for i in 0..archive_count {
            cursor.seek(archive_offset + i * ARCHIVE_ENTRY_SIZE)?;
            let length = cursor.read_u32()?;
            let name_offset = cursor.read_u32()? as usize;
            let name_len = cursor.read_u16()? as usize;
            let location = cursor.read_u16()?;

            // The stored length counts the terminating NUL
            cursor.seek(name_offset)?;
            let raw = cursor.read_bytes(name_len.saturating_sub(1))?;
            let name = String::from_utf8_lossy(raw).replace('\\', "/");
            archives.push(ArchiveRef {
                name,
                length,
                location,
            });
        }

        let mut resources = Vec::with_capacity(resource_count.min(65536));
        cursor.seek(resource_offset)?;
        for _ in 0..resource_count {
            let raw_name = cursor.read_array::<8>()?;
            let end = raw_name.iter().position(|&b| b == 0).unwrap_or(8);
            let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();
            let resource_type = ResourceType::from_code(cursor.read_u16()?);
            let locator = ResourceLocator::from_raw(cursor.read_u32()?);
            resources.push(ResourceEntry {
                name,
                resource_type,
                locator,
            });
        }

        debug!(
            "Parsed KEY index: {} archives, {} resources",
            archives.len(),
            resources.len()
        );
        Ok(Self {
            archives,
            resources,
        })
    }

    /// Archives in table order
    pub fn archives(&self) -> &[ArchiveRef] {
        &self.archives
    }

    /// Resources in table order
    pub fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    /// Resources grouped by category name, each group sorted by name
    pub fn by_category(&self) -> BTreeMap<&'static str, Vec<&ResourceEntry>> {
        let mut groups: BTreeMap<&'static str, Vec<&ResourceEntry>> = BTreeMap::new();
        for resource in &self.resources {
            groups
                .entry(resource.resource_type.category())
                .or_default()
                .push(resource);
        }
        for group in groups.values_mut() {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        groups
    }

    /// Find a resource by name and type, ignoring case
    pub fn find(&self, name: &str, resource_type: ResourceType) -> Option<&ResourceEntry> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name.eq_ignore_ascii_case(name))
    }

    /// On-disk path of the archive holding `resource`
    pub fn archive_path(&self, root: &Path, resource: &ResourceEntry) -> KeyResult<PathBuf> {
        let archive = resource.locator.archive;
        self.archives
            .get(usize::from(archive))
            .map(|entry| entry.resolve_path(root))
            .ok_or_else(|| KeyError::MissingArchive {
                name: resource.name.clone(),
                archive,
                available: self.archives.len(),
            })
    }

    /// Open the owning archive and return the resource bytes
    pub fn load_resource(&self, root: &Path, resource: &ResourceEntry) -> KeyResult<Vec<u8>> {
        let path = self.archive_path(root, resource)?;
        debug!("Loading {} from {}", resource.file_name(), path.display());
        let bif = Bif::open(&path)?;
        Ok(bif.get_resource(resource.locator)?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{ArchiveBuilder, KeyBuilder};
    use pretty_assertions::assert_eq;

    fn sample_index() -> Vec<u8> {
        KeyBuilder::new()
            .with_archive("data\\Movies.bif", 0)
            .with_archive("data\\AREA01.bif", 0x10)
            .with_resource("OPENING", 2, 0x0000_0000)
            .with_resource("AR0100", 1010, 0x0010_0000)
            .with_resource("AR0100", 1003, 0x0010_4000)
            .with_resource("AMBUSH", 2, 0x0000_0001)
            .build()
    }

    #[test]
    fn test_parse_index() {
        let index = KeyIndex::parse(&sample_index()).unwrap();
        assert_eq!(index.archives().len(), 2);
        assert_eq!(index.archives()[0].name, "data/Movies.bif");
        assert_eq!(index.archives()[1].cd_folder(), Some("cd3"));
        assert_eq!(index.resources().len(), 4);

        let tiles = &index.resources()[2];
        assert_eq!(tiles.resource_type, ResourceType::Tiles);
        assert_eq!(tiles.locator.archive, 1);
        assert_eq!(tiles.locator.tileset, 1);
        assert_eq!(tiles.file_name(), "AR0100.tis");
    }

    #[test]
    fn test_by_category_sorted() {
        let index = KeyIndex::parse(&sample_index()).unwrap();
        let groups = index.by_category();
        let movies: Vec<&str> = groups["Movies"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(movies, vec!["AMBUSH", "OPENING"]);
        assert_eq!(groups["Areas"].len(), 1);
        assert!(!groups.contains_key("unknown"));
    }

    #[test]
    fn test_find_ignores_case() {
        let index = KeyIndex::parse(&sample_index()).unwrap();
        let found = index.find("ar0100", ResourceType::Tiles).unwrap();
        assert_eq!(found.locator.raw(), 0x0010_4000);
        assert!(index.find("ar0100", ResourceType::Movie).is_none());
    }

    #[test]
    fn test_cd_precedence() {
        let mut entry = ArchiveRef {
            name: "x.bif".to_string(),
            length: 0,
            location: 0x20 | 0x10 | 0x08,
        };
        assert_eq!(entry.cd_folder(), Some("cd2"));
        entry.location = 0x20 | 0x10;
        assert_eq!(entry.cd_folder(), Some("cd3"));
        entry.location = 0x20;
        assert_eq!(entry.cd_folder(), Some("cd4"));
        entry.location = 0x01;
        assert_eq!(entry.cd_folder(), None);
    }

    #[test]
    fn test_resolve_path_fallback() {
        let root = tempfile::tempdir().unwrap();
        let entry = ArchiveRef {
            name: "Data/Area.bif".to_string(),
            length: 0,
            location: 0x10,
        };
        assert_eq!(entry.resolve_path(root.path()), root.path().join("data/area.bif"));

        std::fs::create_dir_all(root.path().join("cd3/data")).unwrap();
        std::fs::write(root.path().join("cd3/data/area.bif"), b"").unwrap();
        assert_eq!(
            entry.resolve_path(root.path()),
            root.path().join("cd3/data/area.bif")
        );
    }

    #[test]
    fn test_load_resource() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        let archive = ArchiveBuilder::new()
            .with_file(2, b"movie zero".to_vec())
            .with_file(2, b"movie one".to_vec());
        std::fs::write(root.path().join("data/movies.bif"), archive.build_compressed(8)).unwrap();

        let index = KeyIndex::parse(&sample_index()).unwrap();
        let ambush = index.find("AMBUSH", ResourceType::Movie).unwrap();
        assert_eq!(
            index.load_resource(root.path(), ambush).unwrap(),
            b"movie one"
        );
    }

    #[test]
    fn test_missing_archive() {
        let data = KeyBuilder::new()
            .with_resource("LOST", 1005, 0x0050_0000)
            .build();
        let index = KeyIndex::parse(&data).unwrap();
        let lost = &index.resources()[0];
        assert!(matches!(
            index.archive_path(Path::new("."), lost),
            Err(KeyError::MissingArchive { archive: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_signature() {
        let mut data = sample_index();
        data[..4].copy_from_slice(b"BIFF");
        assert!(matches!(
            KeyIndex::parse(&data),
            Err(KeyError::InvalidSignature(_))
        ));
        assert!(matches!(
            KeyIndex::parse(&data[..10]),
            Err(KeyError::InvalidSignature(_))
        ));

        let truncated = sample_index();
        assert!(matches!(
            KeyIndex::parse(&truncated[..20]),
            Err(KeyError::Truncated(_))
        ));
    }
}
