//! Android SDK installation layout and the pristine-sources backup.
//!
//! Annotating in place would compound on every run, so the platform sources
//! are copied once into a backup folder and each run rewrites the SDK copy
//! from that backup.

use crate::version::ApiLevel;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Backup folder created under the home directory.
const BACKUP_FOLDER: &str = ".enhance-backup";

/// Paths of one platform inside an SDK installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkLayout {
    /// `android-<level>`, shared by `platforms/`, `sources/` and the backup.
    pub folder: String,
    pub api_versions: PathBuf,
    pub sources: PathBuf,
}

impl SdkLayout {
    pub fn resolve(root: &Path, level: ApiLevel) -> Result<Self> {
        let platforms = root.join("platforms");
        let sources = root.join("sources");
        if !platforms.is_dir() {
            bail!("cannot find 'platforms' folder: {}", platforms.display());
        }
        if !sources.is_dir() {
            bail!("cannot find 'sources' folder: {}", sources.display());
        }

        let folder = format!("android-{}", level.get());
        let api_versions = platforms.join(&folder).join("data").join("api-versions.xml");
        if !api_versions.is_file() {
            bail!("cannot find 'api-versions.xml': {}", api_versions.display());
        }
        let sources = sources.join(&folder);
        if !sources.is_dir() {
            bail!("cannot find '{}' sources folder: {}", folder, sources.display());
        }

        Ok(Self {
            folder,
            api_versions,
            sources,
        })
    }
}

/// `$HOME/.enhance-backup`
pub fn default_backup_root() -> Result<PathBuf> {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(BACKUP_FOLDER))
        .context("cannot determine the home directory, pass --backup-dir")
}

/// Make sure `backup_root/folder` holds a copy of `sources` and return it.
///
/// An existing backup is reused as is. A copy that fails midway is removed
/// so the next run starts over.
pub fn stage_backup(sources: &Path, backup_root: &Path, folder: &str) -> Result<PathBuf> {
    let backup = backup_root.join(folder);

    if !backup.exists() {
        info!(from = %sources.display(), to = %backup.display(), "backing up platform sources");
        fs::create_dir_all(&backup)
            .with_context(|| format!("failed to create backup directory: {}", backup.display()))?;

        if let Err(err) = copy_tree(sources, &backup) {
            if let Err(cleanup) = fs::remove_dir_all(&backup) {
                warn!(path = %backup.display(), error = %cleanup, "could not remove partial backup");
            }
            return Err(err.context(format!("failed to back up {}", sources.display())));
        }
    }

    let is_empty = fs::read_dir(&backup)
        .with_context(|| format!("failed to read backup directory: {}", backup.display()))?
        .next()
        .is_none();
    if is_empty {
        bail!(
            "backup directory is empty, remove it and run again: {}",
            backup.display()
        );
    }

    Ok(backup)
}

/// Remove everything inside `dir`, keeping `dir` itself.
pub fn clean_directory(dir: &Path) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read {}", dir.display()))?;
        let path = entry.path();
        let removed = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Recursive copy of the contents of `from` into `to`.
pub fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", from.display()))?;
        let target = to.join(entry.path().strip_prefix(from)?);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sdk(level: i32) -> TempDir {
        let root = TempDir::new().unwrap();
        let data = root.path().join(format!("platforms/android-{level}/data"));
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("api-versions.xml"), "<api/>").unwrap();
        let sources = root.path().join(format!("sources/android-{level}/android/app"));
        fs::create_dir_all(&sources).unwrap();
        fs::write(sources.join("Activity.java"), "class Activity {}").unwrap();
        root
    }

    #[test]
    fn resolves_platform_paths() {
        let root = sdk(33);
        let layout = SdkLayout::resolve(root.path(), ApiLevel::new(33)).unwrap();
        assert_eq!(layout.folder, "android-33");
        assert!(layout.api_versions.ends_with("platforms/android-33/data/api-versions.xml"));
        assert!(layout.sources.ends_with("sources/android-33"));
    }

    #[test]
    fn missing_pieces_are_named() {
        let root = sdk(33);
        let err = SdkLayout::resolve(root.path(), ApiLevel::new(34)).unwrap_err();
        assert!(err.to_string().contains("android-34"), "{err}");

        let empty = TempDir::new().unwrap();
        let err = SdkLayout::resolve(empty.path(), ApiLevel::new(33)).unwrap_err();
        assert!(err.to_string().contains("platforms"), "{err}");
    }

    #[test]
    fn backup_is_created_once() {
        let root = sdk(30);
        let layout = SdkLayout::resolve(root.path(), ApiLevel::new(30)).unwrap();
        let backups = TempDir::new().unwrap();

        let backup = stage_backup(&layout.sources, backups.path(), &layout.folder).unwrap();
        assert_eq!(
            fs::read_to_string(backup.join("android/app/Activity.java")).unwrap(),
            "class Activity {}"
        );

        // later runs keep the pristine copy
        fs::write(layout.sources.join("android/app/Activity.java"), "changed").unwrap();
        let again = stage_backup(&layout.sources, backups.path(), &layout.folder).unwrap();
        assert_eq!(again, backup);
        assert_eq!(
            fs::read_to_string(backup.join("android/app/Activity.java")).unwrap(),
            "class Activity {}"
        );
    }

    #[test]
    fn empty_backup_is_an_error() {
        let root = sdk(30);
        let backups = TempDir::new().unwrap();
        fs::create_dir_all(backups.path().join("android-30")).unwrap();
        let err = stage_backup(&root.path().join("sources/android-30"), backups.path(), "android-30").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn failed_backup_is_removed() {
        let backups = TempDir::new().unwrap();
        let missing = backups.path().join("no-such-sources");
        assert!(stage_backup(&missing, backups.path(), "android-30").is_err());
        assert!(!backups.path().join("android-30").exists());
    }

    #[test]
    fn cleaning_keeps_the_directory() {
        let root = sdk(30);
        let sources = root.path().join("sources/android-30");
        fs::write(sources.join("top.txt"), "x").unwrap();
        clean_directory(&sources).unwrap();
        assert!(sources.is_dir());
        assert_eq!(fs::read_dir(&sources).unwrap().count(), 0);
    }
}
