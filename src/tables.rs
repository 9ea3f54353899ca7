//! Reading and writing tightly packed arrays of fixed size records.
//!
//! The functions in this module only slice and pack bytes.
//! References between tables are not checked here.
use binrw::{
    io::{Cursor, Seek, SeekFrom},
    Endian,
};
use orb_write::OrbWrite;

use crate::{DecodeError, Record, Section, SectionEntry};

/// Reads `entry.count` records of type `T` starting at `entry.offset`.
/**
```rust
# use orb_lib::{read_table, SectionEntry, AnimKeyComponent, AnimKeyFormat};
let bytes = [0u8, 0, 0, 0, 3, 0, 0, 0, 5, 0, 0, 0];
let entry = SectionEntry { offset: 4, count: 2 };
let components: Vec<AnimKeyComponent> = read_table(&bytes, entry).unwrap();
assert_eq!(Ok(AnimKeyFormat::Float3), components[0].key_format());
assert_eq!(Ok(AnimKeyFormat::Quaternion), components[1].key_format());
```
*/
pub fn read_table<T: Record>(bytes: &[u8], entry: SectionEntry) -> Result<Vec<T>, DecodeError> {
    let size = entry.count as u64 * T::SIZE_IN_BYTES as u64;
    let truncated = || DecodeError::TruncatedData {
        section: T::SECTION,
        offset: entry.offset as u64,
        size,
        buffer_len: bytes.len(),
    };

    // Check the extent up front so malformed counts never cause large allocations.
    if entry.offset as u64 + size > bytes.len() as u64 {
        return Err(truncated());
    }

    let mut reader = Cursor::new(bytes);
    reader
        .seek(SeekFrom::Start(entry.offset as u64))
        .map_err(|_| truncated())?;

    let mut elements = Vec::with_capacity(entry.count as usize);
    for _ in 0..entry.count {
        let element =
            T::read_options(&mut reader, Endian::Little, ()).map_err(|_| truncated())?;
        elements.push(element);
    }

    Ok(elements)
}

/// Copies the bytes of the raw blob `section` located by `entry`.
pub fn read_blob(
    bytes: &[u8],
    section: Section,
    entry: SectionEntry,
) -> Result<Vec<u8>, DecodeError> {
    let start = entry.offset as usize;
    start
        .checked_add(entry.count as usize)
        .and_then(|end| bytes.get(start..end))
        .map(|b| b.to_vec())
        .ok_or(DecodeError::TruncatedData {
            section,
            offset: entry.offset as u64,
            size: entry.count as u64,
            buffer_len: bytes.len(),
        })
}

/// Writes `records` with no padding between elements and returns the number of bytes written.
pub fn write_table<T: Record, W: std::io::Write>(
    writer: &mut W,
    records: &[T],
) -> std::io::Result<u64> {
    records.orb_write(writer)?;
    Ok(records.len() as u64 * T::SIZE_IN_BYTES as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{AnimCurve, StringOffset, TextureProperty, Vector4};
    use hexlit::hex;

    #[test]
    fn read_table_texture_properties() {
        let bytes = hex!("FFFFFFFF 08000000 01000000 0C000000 02000000");
        let entry = SectionEntry {
            offset: 4,
            count: 2,
        };
        let properties: Vec<TextureProperty> = read_table(&bytes, entry).unwrap();
        assert_eq!(
            vec![
                TextureProperty {
                    name: StringOffset(8),
                    location: 1
                },
                TextureProperty {
                    name: StringOffset(12),
                    location: 2
                }
            ],
            properties
        );
    }

    #[test]
    fn read_table_empty() {
        let entry = SectionEntry {
            offset: 0,
            count: 0,
        };
        let curves: Vec<AnimCurve> = read_table(&[], entry).unwrap();
        assert!(curves.is_empty());
    }

    #[test]
    fn read_table_truncated() {
        let bytes = hex!("FFFFFFFF 00000000 00000000 00000000 00000000");
        let entry = SectionEntry {
            offset: 4,
            count: 1,
        };
        let result = read_table::<AnimCurve>(&bytes, entry);
        assert!(matches!(
            result,
            Err(DecodeError::TruncatedData {
                section: Section::AnimCurves,
                offset: 4,
                size: 20,
                buffer_len: 20
            })
        ));
    }

    #[test]
    fn read_table_extreme_count() {
        // Make sure this just returns an error instead of attempting a huge allocation.
        let entry = SectionEntry {
            offset: 0,
            count: u32::MAX,
        };
        assert!(read_table::<AnimCurve>(&[0u8; 64], entry).is_err());
    }

    #[test]
    fn read_blob_truncated() {
        let entry = SectionEntry {
            offset: 4,
            count: 8,
        };
        let result = read_blob(&[0u8; 8], Section::VertexData, entry);
        assert!(matches!(
            result,
            Err(DecodeError::TruncatedData {
                section: Section::VertexData,
                offset: 4,
                size: 8,
                buffer_len: 8
            })
        ));
    }

    #[test]
    fn write_table_curves() {
        let curves = vec![
            AnimCurve {
                key_offset: 0,
                static_key: Vector4::default(),
            },
            AnimCurve {
                key_offset: -1,
                static_key: Vector4::new(1.0, 0.0, 0.0, 0.0),
            },
        ];

        let mut writer = Vec::new();
        let size = write_table(&mut writer, &curves).unwrap();
        assert_eq!(40, size);
        assert_eq!(
            hex!(
                "00000000 00000000 00000000 00000000 00000000
                 FFFFFFFF 0000803F 00000000 00000000 00000000"
            )
            .to_vec(),
            writer
        );
    }

    #[test]
    fn write_table_empty() {
        let mut writer = Vec::new();
        let size = write_table::<AnimCurve, _>(&mut writer, &[]).unwrap();
        assert_eq!(0, size);
        assert!(writer.is_empty());
    }
}
