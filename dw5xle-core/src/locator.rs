use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::unit::TABLE_SIZE;
use crate::{EditorError, Result};

/// The 32-byte block that precedes the unit table in every known dump of
/// the title. Matched literally, no wildcards.
pub const SIGNATURE: [u8; 32] = [
    0x01, 0x01, 0x01, 0x02, 0x02, 0x01, 0x00, 0x00,
    0x64, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3F,
    0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x80, 0x3F,
    0x9A, 0x99, 0x19, 0x3F, 0x00, 0x00, 0x00, 0x00,
];

/// Displacement from the signature match position to the start of the
/// unit table.
pub const TABLE_DISPLACEMENT: u64 = 0x3D0;

pub const SCAN_CHUNK_SIZE: usize = 8000;

fn find_signature(buf: &[u8]) -> Option<usize> {
    buf.windows(SIGNATURE.len()).position(|w| w == SIGNATURE)
}

/// Scans the image for the table signature and returns the absolute byte
/// offset of the unit table (match position + `TABLE_DISPLACEMENT`).
///
/// The file is read in fixed-size chunks, carrying the last
/// pattern-length-minus-one bytes of the previous chunk so a signature
/// split across a chunk boundary is still found. The first match wins;
/// the image only ever contains one instance.
pub fn locate(image_path: &Path) -> Result<u64> {
    let mut file = fs::File::open(image_path)?;

    let mut tail: Vec<u8> = Vec::new();
    // Absolute file position of the next unread byte.
    let mut pos: u64 = 0;

    loop {
        let mut chunk = vec![0u8; SCAN_CHUNK_SIZE];
        let n = file.read(&mut chunk)?;
        if n == 0 {
            return Err(EditorError::NotFound);
        }
        chunk.truncate(n);

        let mut window = tail;
        let window_start = pos - window.len() as u64;
        window.extend_from_slice(&chunk);

        if let Some(idx) = find_signature(&window) {
            return Ok(window_start + idx as u64 + TABLE_DISPLACEMENT);
        }

        pos += n as u64;
        let keep = window.len().min(SIGNATURE.len() - 1);
        tail = window[window.len() - keep..].to_vec();
    }
}

/// Reads the full unit table at `table_offset`.
///
/// The file length is checked up front so a truncated or wrong file fails
/// with `TruncatedRead` before anything is read; a short buffer is never
/// returned.
pub fn read_table(image_path: &Path, table_offset: u64) -> Result<Vec<u8>> {
    let file_len = fs::metadata(image_path)?.len();
    let needed = TABLE_SIZE as u64;
    if table_offset + needed > file_len {
        return Err(EditorError::TruncatedRead {
            needed,
            available: file_len.saturating_sub(table_offset),
        });
    }

    let mut file = fs::File::open(image_path)?;
    file.seek(SeekFrom::Start(table_offset))?;
    let mut table = vec![0u8; TABLE_SIZE];
    file.read_exact(&mut table)?;
    Ok(table)
}
