use crate::StoreError;
use modelink_schema::ManifestEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One manifest leaf found under the manifest root: the entry derived from
/// its path segments plus the file path itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub entry: ManifestEntry,
    pub path: PathBuf,
}

/// Enumerate every manifest file exactly three levels below the manifest
/// root (namespace/model/tag). Entries at other depths, non-file leaves, and
/// subtrees that cannot be read (stray files where a directory is expected,
/// permission-restricted directories) are skipped, not errors. The tree is
/// snapshotted fully into the returned vector before any caller acts on it.
///
/// Order follows filesystem traversal order and is not guaranteed stable
/// across platforms.
///
/// Fails only when the manifest root itself does not exist.
pub fn walk_manifests(manifest_root: &Path) -> Result<Vec<ManifestRecord>, StoreError> {
    if !manifest_root.is_dir() {
        return Err(StoreError::ManifestRootMissing(manifest_root.to_owned()));
    }

    let mut records = Vec::new();
    for namespace_entry in fs::read_dir(manifest_root)?.flatten() {
        let namespace_path = namespace_entry.path();
        let model_dirs = match fs::read_dir(&namespace_path) {
            Ok(iter) => iter,
            Err(e) => {
                warn!("skipping unreadable entry {}: {e}", namespace_path.display());
                continue;
            }
        };
        let namespace = namespace_entry.file_name().to_string_lossy().into_owned();

        for model_entry in model_dirs.flatten() {
            let model_path = model_entry.path();
            let tag_files = match fs::read_dir(&model_path) {
                Ok(iter) => iter,
                Err(e) => {
                    warn!("skipping unreadable entry {}: {e}", model_path.display());
                    continue;
                }
            };
            let model = model_entry.file_name().to_string_lossy().into_owned();

            for tag_entry in tag_files.flatten() {
                let tag_path = tag_entry.path();
                if !tag_path.is_file() {
                    debug!("skipping non-file at tag level: {}", tag_path.display());
                    continue;
                }
                let tag = tag_entry.file_name().to_string_lossy().into_owned();
                records.push(ManifestRecord {
                    entry: ManifestEntry::new(&namespace, model.clone(), tag),
                    path: tag_path,
                });
            }
        }
    }

    Ok(records)
}
