use std::io::Write;

use orb_write::OrbWrite;

use crate::{
    round_up, tables::write_table, Header, Orb, Section, SectionEntry, WriteOrbError,
    HEADER_SIZE, SECTION_ALIGNMENT, SECTION_COUNT,
};

/// Assigns offsets to every section in header order.
///
/// Each section starts at the end of the previous section rounded up to [SECTION_ALIGNMENT].
/// Empty sections still receive the current offset.
/// Blob sizes in the header are rounded up as well, so every offset and size is aligned.
pub(crate) fn calculate_header(orb: &Orb) -> Result<Header, WriteOrbError> {
    let mut sections = [SectionEntry::default(); SECTION_COUNT];

    let mut offset = HEADER_SIZE as u64;
    for section in Section::ALL {
        let count = orb.section_count(section);
        let size = match section.record_size() {
            Some(record_size) => count as u64 * record_size as u64,
            None => round_up(count as u64, SECTION_ALIGNMENT as u64),
        };

        let end = offset + size;
        if end > u32::MAX as u64 {
            return Err(WriteOrbError::SectionTooLarge { section, end });
        }

        sections[section.index()] = SectionEntry {
            offset: offset as u32,
            count: match section.record_size() {
                Some(_) => count as u32,
                None => size as u32,
            },
        };

        offset = round_up(end, SECTION_ALIGNMENT as u64);
    }

    Ok(Header::new(sections))
}

pub(crate) fn write_orb<W: Write>(writer: &mut W, orb: &Orb) -> Result<(), WriteOrbError> {
    let header = calculate_header(orb)?;

    log::debug!(
        "Writing ORB with sections {:?}",
        Section::ALL
            .iter()
            .map(|s| (s, header.entry(*s)))
            .collect::<Vec<_>>()
    );

    // The sections are written in the order they appear in the header.
    // Tables are always multiples of 4 bytes, so only blobs need padding.
    header.orb_write(writer)?;
    write_table(writer, &orb.vertex_components)?;
    write_table(writer, &orb.value_properties)?;
    write_table(writer, &orb.texture_properties)?;
    write_table(writer, &orb.materials)?;
    write_table(writer, &orb.meshes)?;
    write_table(writer, &orb.bones)?;
    write_table(writer, &orb.nodes)?;
    write_table(writer, &orb.anim_key_components)?;
    write_table(writer, &orb.anim_curves)?;
    write_table(writer, &orb.anim_clips)?;
    write_padded_blob(writer, &orb.vertex_data)?;
    write_padded_blob(writer, &orb.index_data)?;
    write_padded_blob(writer, &orb.anim_key_data)?;
    write_padded_blob(writer, &orb.string_pool_data)?;

    Ok(())
}

fn write_padded_blob<W: Write>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_all(bytes)?;
    let padding = round_up(bytes.len() as u64, SECTION_ALIGNMENT as u64) - bytes.len() as u64;
    writer.write_all(&vec![0u8; padding as usize])?;
    Ok(())
}

pub(crate) fn write_buffered<W: Write, F: Fn(&mut Vec<u8>) -> Result<(), WriteOrbError>>(
    writer: &mut W,
    write_data: F,
) -> Result<(), WriteOrbError> {
    // Buffer the entire write operation into memory to improve performance.
    // Nothing is written to the output if any section fails to write.
    let mut buffer = Vec::new();
    write_data(&mut buffer)?;

    writer.write_all(&buffer)?;
    Ok(())
}
