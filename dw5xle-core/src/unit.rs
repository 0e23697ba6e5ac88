use serde::ser::{Serialize, Serializer};

use crate::{EditorError, Result};

/// Size of one unit record in the table.
pub const SLOT_SIZE: usize = 22;

/// Number of unit slots in the table (indices 0x0..=0x37E).
pub const NUM_SLOTS_TOTAL: usize = 895;

/// Total size of the unit table in bytes.
pub const TABLE_SIZE: usize = NUM_SLOTS_TOTAL * SLOT_SIZE;

pub const NUM_FIELDS: usize = 21;

/// One field of a unit record. Declaration order matches the byte layout
/// of the 22-byte slot: Name is a little-endian u16 at offset 0, everything
/// after it is a single unsigned byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    Name,
    Unknown1,
    Voice,
    Model,
    Color,
    Moveset,
    Horse,
    Life,
    Attack,
    Defense,
    Bow,
    Mounted,
    Speed,
    StrafeSpeed,
    Jump,
    AiLevel,
    AiType,
    Unknown2,
    Weapon,
    WeaponLevel,
    Orb,
}

impl Field {
    pub const ALL: [Field; NUM_FIELDS] = [
        Field::Name,
        Field::Unknown1,
        Field::Voice,
        Field::Model,
        Field::Color,
        Field::Moveset,
        Field::Horse,
        Field::Life,
        Field::Attack,
        Field::Defense,
        Field::Bow,
        Field::Mounted,
        Field::Speed,
        Field::StrafeSpeed,
        Field::Jump,
        Field::AiLevel,
        Field::AiType,
        Field::Unknown2,
        Field::Weapon,
        Field::WeaponLevel,
        Field::Orb,
    ];

    /// Byte offset of this field inside a slot.
    pub fn offset(self) -> usize {
        // Name occupies bytes 0-1, every later field is one byte wide, so
        // the offset is simply the field position plus one.
        match self {
            Field::Name => 0,
            other => other as usize + 1,
        }
    }

    /// Encoded width in bytes: 2 for Name, 1 for everything else.
    pub fn width(self) -> usize {
        match self {
            Field::Name => 2,
            _ => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Unknown1 => "Unknown1",
            Field::Voice => "Voice",
            Field::Model => "Model",
            Field::Color => "Color",
            Field::Moveset => "Moveset",
            Field::Horse => "Horse",
            Field::Life => "Life",
            Field::Attack => "Attack",
            Field::Defense => "Defense",
            Field::Bow => "Bow",
            Field::Mounted => "Mounted",
            Field::Speed => "Speed",
            Field::StrafeSpeed => "StrafeSpeed",
            Field::Jump => "Jump",
            Field::AiLevel => "AILevel",
            Field::AiType => "AIType",
            Field::Unknown2 => "Unknown2",
            Field::Weapon => "Weapon",
            Field::WeaponLevel => "WeaponLevel",
            Field::Orb => "Orb",
        }
    }

    /// Hidden fields are carried through edits but not shown in the UIs.
    pub fn hidden(self) -> bool {
        matches!(self, Field::Unknown1 | Field::Unknown2)
    }

    /// Largest value the field can hold at its encoded width.
    pub fn max_value(self) -> u32 {
        match self.width() {
            2 => 0xFFFF,
            _ => 0xFF,
        }
    }

    pub fn from_label(text: &str) -> Option<Field> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.label().eq_ignore_ascii_case(text))
    }
}

/// A decoded unit record: one value per field, indexed by `Field`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UnitRecord {
    values: [u32; NUM_FIELDS],
}

impl UnitRecord {
    pub fn get(&self, field: Field) -> u32 {
        self.values[field as usize]
    }

    pub fn set(&mut self, field: Field, value: u32) {
        self.values[field as usize] = value;
    }
}

impl Serialize for UnitRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(Field::ALL.iter().map(|f| (f.label(), self.get(*f))))
    }
}

fn slot_base(table: &[u8], slot: usize) -> Result<usize> {
    if slot >= NUM_SLOTS_TOTAL {
        return Err(EditorError::OutOfRange { slot });
    }
    let base = slot * SLOT_SIZE;
    if base + SLOT_SIZE > table.len() {
        return Err(EditorError::OutOfRange { slot });
    }
    Ok(base)
}

/// Decodes the 22-byte slot at `slot` into a `UnitRecord`.
pub fn decode(table: &[u8], slot: usize) -> Result<UnitRecord> {
    let base = slot_base(table, slot)?;
    let raw = &table[base..base + SLOT_SIZE];

    let mut record = UnitRecord {
        values: [0; NUM_FIELDS],
    };
    for field in Field::ALL {
        let off = field.offset();
        let value = match field.width() {
            2 => u16::from_le_bytes([raw[off], raw[off + 1]]) as u32,
            _ => raw[off] as u32,
        };
        record.set(field, value);
    }

    Ok(record)
}

/// Encodes `record` into the 22-byte slot at `slot`.
///
/// Name must fit its 16-bit width or the call fails with the table
/// untouched; every byte-wide field wraps to its low 8 bits instead of
/// being rejected.
pub fn encode(table: &mut [u8], slot: usize, record: &UnitRecord) -> Result<()> {
    let base = slot_base(table, slot)?;

    let name = record.get(Field::Name);
    if name > 0xFFFF {
        return Err(EditorError::FieldOutOfRange {
            field: Field::Name.label(),
            value: name,
        });
    }

    // Stage the whole slot first so a write is always all 22 bytes or none.
    let mut raw = [0u8; SLOT_SIZE];
    for field in Field::ALL {
        let off = field.offset();
        let value = record.get(field);
        match field.width() {
            2 => raw[off..off + 2].copy_from_slice(&(value as u16).to_le_bytes()),
            _ => raw[off] = (value & 0xFF) as u8,
        }
    }

    table[base..base + SLOT_SIZE].copy_from_slice(&raw);
    Ok(())
}

/// Parses a slot index as decimal or 0x-prefixed hex, bounds-checked
/// against the table.
pub fn parse_slot_index(text: &str) -> Option<usize> {
    let t = text.trim();
    let value = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()?
    } else {
        t.parse::<usize>().ok()?
    };
    (value < NUM_SLOTS_TOTAL).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slot() -> [u8; SLOT_SIZE] {
        [
            0x34, 0x12, // Name = 0x1234
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, // Unknown1..Horse
            0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, // Life..Speed
            0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, // StrafeSpeed..Unknown2, Weapon
            0x13, 0x14, // WeaponLevel, Orb
        ]
    }

    #[test]
    fn layout_covers_whole_slot() {
        let mut covered = [false; SLOT_SIZE];
        for field in Field::ALL {
            for b in field.offset()..field.offset() + field.width() {
                assert!(!covered[b], "{} overlaps byte {}", field.label(), b);
                covered[b] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn decodes_slot_zero_per_layout() {
        let mut table = vec![0u8; TABLE_SIZE];
        table[..SLOT_SIZE].copy_from_slice(&sample_slot());

        let record = decode(&table, 0).unwrap();
        assert_eq!(record.get(Field::Name), 0x1234);
        assert_eq!(record.get(Field::Unknown1), 0x01);
        assert_eq!(record.get(Field::Voice), 0x02);
        assert_eq!(record.get(Field::Horse), 0x06);
        assert_eq!(record.get(Field::Life), 0x07);
        assert_eq!(record.get(Field::AiLevel), 0x0F);
        assert_eq!(record.get(Field::Weapon), 0x12);
        assert_eq!(record.get(Field::Orb), 0x14);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut table = vec![0u8; TABLE_SIZE];
        let slot = 42;

        let mut record = decode(&table, slot).unwrap();
        record.set(Field::Name, 65535);
        record.set(Field::Life, 200);
        record.set(Field::Attack, 255);
        record.set(Field::Orb, 3);

        encode(&mut table, slot, &record).unwrap();
        let back = decode(&table, slot).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn encode_wraps_byte_fields() {
        let mut table = vec![0u8; TABLE_SIZE];
        let mut record = decode(&table, 0).unwrap();
        record.set(Field::Speed, 0x1FE);

        encode(&mut table, 0, &record).unwrap();
        assert_eq!(table[Field::Speed.offset()], 0xFE);
        assert_eq!(decode(&table, 0).unwrap().get(Field::Speed), 0xFE);
    }

    #[test]
    fn encode_rejects_out_of_range_name() {
        let mut table = vec![0u8; TABLE_SIZE];
        table[..SLOT_SIZE].copy_from_slice(&sample_slot());
        let before = table.clone();

        let mut record = decode(&table, 0).unwrap();
        record.set(Field::Name, 70000);

        let err = encode(&mut table, 0, &record).unwrap_err();
        assert!(matches!(
            err,
            EditorError::FieldOutOfRange { value: 70000, .. }
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn slot_index_bounds() {
        let table = vec![0u8; TABLE_SIZE];
        assert!(decode(&table, NUM_SLOTS_TOTAL - 1).is_ok());
        assert!(matches!(
            decode(&table, NUM_SLOTS_TOTAL),
            Err(EditorError::OutOfRange { slot }) if slot == NUM_SLOTS_TOTAL
        ));
    }

    #[test]
    fn parses_hex_and_decimal_slot_indices() {
        assert_eq!(parse_slot_index("0x37E"), Some(894));
        assert_eq!(parse_slot_index("0x0"), Some(0));
        assert_eq!(parse_slot_index("15"), Some(15));
        assert_eq!(parse_slot_index("0x37F"), None);
        assert_eq!(parse_slot_index("bogus"), None);
    }

    #[test]
    fn record_serializes_with_field_labels() {
        let table = vec![0u8; TABLE_SIZE];
        let record = decode(&table, 0).unwrap();
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["Name"], 0);
        assert_eq!(json["WeaponLevel"], 0);
        assert!(json.get("Unknown1").is_some());
    }
}
