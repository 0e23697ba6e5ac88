use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod locator;
pub mod modfile;
pub mod unit;

pub use locator::{locate, read_table, SCAN_CHUNK_SIZE, SIGNATURE, TABLE_DISPLACEMENT};
pub use modfile::{
    apply, backup_path_for, dump_to_file, list_backups, load_block, write_backup_once,
    BACKUP_EXTENSION, MOD_EXTENSION,
};
pub use unit::{
    decode, encode, parse_slot_index, Field, UnitRecord, NUM_FIELDS, NUM_SLOTS_TOTAL, SLOT_SIZE,
    TABLE_SIZE,
};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unit table signature not found in image")]
    NotFound,
    #[error("image too short for unit table: need {needed} bytes, only {available} available")]
    TruncatedRead { needed: u64, available: u64 },
    #[error("slot index {slot:#x} outside valid range 0x0..=0x37E")]
    OutOfRange { slot: usize },
    #[error("{field} value {value} does not fit its field width")]
    FieldOutOfRange { field: &'static str, value: u32 },
    #[error("block is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// One open disc image: the image path, the located table offset and the
/// table buffer loaded from it.
///
/// All edits happen against the in-memory buffer; nothing touches the
/// image file until `write_to_image` or `restore_backup`. Sessions are
/// independent, so several images can be open side by side.
pub struct EditorSession {
    image_path: PathBuf,
    table_offset: u64,
    table: Vec<u8>,
    backup_path: PathBuf,
    backup_created: bool,
}

impl EditorSession {
    /// Locates the unit table in the image, loads it, and snapshots the
    /// original table bytes as a backup if this image has none yet.
    pub fn open(image_path: &Path) -> Result<EditorSession> {
        let table_offset = locator::locate(image_path)?;
        let table = locator::read_table(image_path, table_offset)?;

        let backup_path = modfile::backup_path_for(image_path);
        let backup_created = modfile::write_backup_once(image_path, &table)?;

        Ok(EditorSession {
            image_path: image_path.to_path_buf(),
            table_offset,
            table,
            backup_path,
            backup_created,
        })
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn table_offset(&self) -> u64 {
        self.table_offset
    }

    /// The raw table buffer, exactly `TABLE_SIZE` bytes.
    pub fn table(&self) -> &[u8] {
        &self.table
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Whether `open` wrote a fresh backup (false if one already existed).
    pub fn backup_created(&self) -> bool {
        self.backup_created
    }

    /// Decodes one slot for display.
    pub fn record(&self, slot: usize) -> Result<UnitRecord> {
        unit::decode(&self.table, slot)
    }

    /// Re-encodes one slot from an edited record. On failure the buffer
    /// is left exactly as it was.
    pub fn submit(&mut self, slot: usize, record: &UnitRecord) -> Result<()> {
        unit::encode(&mut self.table, slot, record)
    }

    /// Saves the current table buffer verbatim as a standalone mod file.
    pub fn save_mod(&self, path: &Path) -> Result<()> {
        modfile::dump_to_file(path, &self.table)
    }

    /// Replaces the table buffer with the contents of a mod or backup
    /// file. A wrong-sized file fails with the buffer unchanged.
    pub fn load_mod(&mut self, path: &Path) -> Result<()> {
        let block = modfile::load_block(path)?;
        self.table = block;
        Ok(())
    }

    /// Patches the current table buffer back into the disc image at the
    /// located offset.
    pub fn write_to_image(&self) -> Result<()> {
        modfile::apply(&self.image_path, self.table_offset, &self.table)
    }

    /// Re-applies the original backup snapshot to the image and reloads
    /// the buffer from it.
    pub fn restore_backup(&mut self) -> Result<()> {
        let block = modfile::load_block(&self.backup_path)?;
        modfile::apply(&self.image_path, self.table_offset, &block)?;
        self.table = block;
        Ok(())
    }
}
