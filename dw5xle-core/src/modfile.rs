use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::unit::TABLE_SIZE;
use crate::{EditorError, Result};

/// Extension for standalone mod files: a raw dump of the table, no header.
pub const MOD_EXTENSION: &str = "dw5xlemod";

/// Extension for backup snapshots of the original table.
pub const BACKUP_EXTENSION: &str = "unitdata";

const BACKUP_SUFFIX: &str = "_Original";

/// Path of the backup snapshot for `image_path`:
/// `<image-base-name>_Original.unitdata` next to the image.
pub fn backup_path_for(image_path: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image_path.with_file_name(format!("{stem}{BACKUP_SUFFIX}.{BACKUP_EXTENSION}"))
}

/// Writes `table` as the image's backup snapshot unless one already
/// exists. Returns whether a new backup was written. An existing backup
/// is never overwritten, so the snapshot always reflects the first load.
pub fn write_backup_once(image_path: &Path, table: &[u8]) -> Result<bool> {
    let path = backup_path_for(image_path);
    if path.exists() {
        return Ok(false);
    }
    fs::write(&path, table)?;
    Ok(true)
}

fn check_block_size(block: &[u8]) -> Result<()> {
    if block.len() != TABLE_SIZE {
        return Err(EditorError::SizeMismatch {
            expected: TABLE_SIZE,
            actual: block.len(),
        });
    }
    Ok(())
}

/// Writes the table verbatim to a standalone mod/backup file.
pub fn dump_to_file(path: &Path, table: &[u8]) -> Result<()> {
    check_block_size(table)?;
    fs::write(path, table)?;
    Ok(())
}

/// Reads a mod or backup block, requiring it to be exactly one table.
pub fn load_block(path: &Path) -> Result<Vec<u8>> {
    let block = fs::read(path)?;
    check_block_size(&block)?;
    Ok(block)
}

/// Overwrites the table region of the image in place with `block`.
///
/// The block length and the target region are both validated before the
/// file is opened for writing, so a failed apply leaves the image
/// untouched and the file is never resized.
pub fn apply(image_path: &Path, table_offset: u64, block: &[u8]) -> Result<()> {
    check_block_size(block)?;

    let file_len = fs::metadata(image_path)?.len();
    if table_offset + block.len() as u64 > file_len {
        return Err(EditorError::TruncatedRead {
            needed: block.len() as u64,
            available: file_len.saturating_sub(table_offset),
        });
    }

    let mut file = fs::OpenOptions::new().write(true).open(image_path)?;
    file.seek(SeekFrom::Start(table_offset))?;
    file.write_all(block)?;
    Ok(())
}

/// Lists backup snapshots under `dir`, sorted by path.
pub fn list_backups(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut backups = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| EditorError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(BACKUP_EXTENSION))
            .unwrap_or(false)
        {
            backups.push(path.to_path_buf());
        }
    }
    backups.sort();
    Ok(backups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_path_keeps_image_directory() {
        let path = backup_path_for(Path::new("/tmp/discs/dw5xl.iso"));
        assert_eq!(
            path,
            Path::new("/tmp/discs/dw5xl_Original.unitdata")
        );
    }

    #[test]
    fn backup_is_written_once_and_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("game.iso");
        fs::write(&image, b"irrelevant").unwrap();

        let first = vec![1u8; TABLE_SIZE];
        assert!(write_backup_once(&image, &first).unwrap());

        let second = vec![2u8; TABLE_SIZE];
        assert!(!write_backup_once(&image, &second).unwrap());

        let saved = fs::read(backup_path_for(&image)).unwrap();
        assert_eq!(saved, first);
    }

    #[test]
    fn load_block_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.dw5xlemod");
        fs::write(&path, vec![0u8; TABLE_SIZE - 1]).unwrap();

        let err = load_block(&path).unwrap_err();
        assert!(matches!(
            err,
            EditorError::SizeMismatch { expected, actual }
                if expected == TABLE_SIZE && actual == TABLE_SIZE - 1
        ));
    }

    #[test]
    fn apply_patches_in_place_without_resizing() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("game.iso");
        let mut bytes = vec![0x11u8; 0x100];
        bytes.extend_from_slice(&vec![0u8; TABLE_SIZE]);
        bytes.extend_from_slice(&[0x22; 0x40]);
        fs::write(&image, &bytes).unwrap();

        let block = vec![0xEEu8; TABLE_SIZE];
        apply(&image, 0x100, &block).unwrap();

        let after = fs::read(&image).unwrap();
        assert_eq!(after.len(), bytes.len());
        assert_eq!(&after[..0x100], &bytes[..0x100]);
        assert_eq!(&after[0x100..0x100 + TABLE_SIZE], &block[..]);
        assert_eq!(&after[0x100 + TABLE_SIZE..], &bytes[0x100 + TABLE_SIZE..]);
    }

    #[test]
    fn apply_rejects_wrong_size_without_touching_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("game.iso");
        let bytes = vec![0x33u8; TABLE_SIZE + 0x200];
        fs::write(&image, &bytes).unwrap();

        let err = apply(&image, 0x100, &vec![0u8; TABLE_SIZE + 1]).unwrap_err();
        assert!(matches!(err, EditorError::SizeMismatch { .. }));
        assert_eq!(fs::read(&image).unwrap(), bytes);
    }

    #[test]
    fn apply_rejects_region_past_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("game.iso");
        let bytes = vec![0u8; TABLE_SIZE];
        fs::write(&image, &bytes).unwrap();

        // Offset 0x10 pushes the region past EOF; the file must not grow.
        let err = apply(&image, 0x10, &vec![0u8; TABLE_SIZE]).unwrap_err();
        assert!(matches!(err, EditorError::TruncatedRead { .. }));
        assert_eq!(fs::read(&image).unwrap().len(), TABLE_SIZE);
    }

    #[test]
    fn lists_only_backup_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_Original.unitdata"), b"x").unwrap();
        fs::write(dir.path().join("b.dw5xlemod"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let found = list_backups(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].file_name().unwrap().to_str().unwrap(),
            "a_Original.unitdata"
        );
    }
}
