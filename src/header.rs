//! The fixed size table of contents at the start of every container.
//!
//! The header is the magic value followed by one `(offset, count)` pair for each of the ten
//! typed tables and one `(offset, size)` pair for each of the four raw blobs.
//! All values are byte offsets or sizes from the start of the buffer except the table counts.
use binrw::{io::Cursor, BinRead, BinReaderExt};
use orb_write::OrbWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AnimClip, AnimCurve, AnimKeyComponent, Bone, DecodeError, Material, Mesh, Node, Record,
    TextureProperty, ValueProperty, VertexComponent,
};

/// The multi-character constant `'ORB1'`.
/// Stored little endian, so the file starts with the bytes `31 42 52 4F`.
pub const MAGIC: u32 = 0x4F524231;

/// The number of `(offset, count)` pairs in the header.
pub const SECTION_COUNT: usize = 14;

/// The size in bytes of the magic and all section entries.
pub const HEADER_SIZE: u32 = 4 + SECTION_COUNT as u32 * 8;

/// Every offset and size in the container is a multiple of this value.
pub const SECTION_ALIGNMENT: u32 = 4;

/// A contiguous region of the container addressed by the header.
/// Variants are listed in the order they appear in the header and in the file.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "strum",
    derive(strum::EnumString, strum::Display, strum::EnumVariantNames)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    VertexComponents,
    ValueProperties,
    TextureProperties,
    Materials,
    Meshes,
    Bones,
    Nodes,
    AnimKeyComponents,
    AnimCurves,
    AnimClips,
    VertexData,
    IndexData,
    AnimKeyData,
    StringPoolData,
}

impl Section {
    /// All sections in header order.
    pub const ALL: [Section; SECTION_COUNT] = [
        Section::VertexComponents,
        Section::ValueProperties,
        Section::TextureProperties,
        Section::Materials,
        Section::Meshes,
        Section::Bones,
        Section::Nodes,
        Section::AnimKeyComponents,
        Section::AnimCurves,
        Section::AnimClips,
        Section::VertexData,
        Section::IndexData,
        Section::AnimKeyData,
        Section::StringPoolData,
    ];

    /// The position of this section's entry in the header.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The size of a single record for typed tables or [None] for raw blobs.
    pub fn record_size(&self) -> Option<u32> {
        match self {
            Section::VertexComponents => Some(VertexComponent::SIZE_IN_BYTES),
            Section::ValueProperties => Some(ValueProperty::SIZE_IN_BYTES),
            Section::TextureProperties => Some(TextureProperty::SIZE_IN_BYTES),
            Section::Materials => Some(Material::SIZE_IN_BYTES),
            Section::Meshes => Some(Mesh::SIZE_IN_BYTES),
            Section::Bones => Some(Bone::SIZE_IN_BYTES),
            Section::Nodes => Some(Node::SIZE_IN_BYTES),
            Section::AnimKeyComponents => Some(AnimKeyComponent::SIZE_IN_BYTES),
            Section::AnimCurves => Some(AnimCurve::SIZE_IN_BYTES),
            Section::AnimClips => Some(AnimClip::SIZE_IN_BYTES),
            Section::VertexData
            | Section::IndexData
            | Section::AnimKeyData
            | Section::StringPoolData => None,
        }
    }
}

#[cfg(not(feature = "strum"))]
impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// The location of a single section.
/// `count` is the number of records for typed tables and the size in bytes for raw blobs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionEntry {
    pub offset: u32,
    pub count: u32,
}

/// The table of contents for the container.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    /// The entries for each [Section] in header order.
    pub sections: [SectionEntry; SECTION_COUNT],
}

/// Reasons a buffer cannot contain a valid header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFault {
    /// The buffer is smaller than [HEADER_SIZE].
    TooShort { len: usize },
    /// The first four bytes are not [MAGIC].
    BadMagic { found: u32 },
}

impl std::fmt::Display for HeaderFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderFault::TooShort { len } => write!(
                f,
                "expected at least {HEADER_SIZE} bytes but found {len} bytes"
            ),
            HeaderFault::BadMagic { found } => write!(
                f,
                "expected magic {:?} but found {:?}",
                MAGIC.to_le_bytes(),
                found.to_le_bytes()
            ),
        }
    }
}

impl Header {
    /// Creates a header with [MAGIC] from the entries in header order.
    pub fn new(sections: [SectionEntry; SECTION_COUNT]) -> Self {
        Self {
            magic: MAGIC,
            sections,
        }
    }

    pub fn entry(&self, section: Section) -> SectionEntry {
        self.sections[section.index()]
    }

    /// The size in bytes of `section` computed from its count and record size.
    pub fn byte_size(&self, section: Section) -> u64 {
        let entry = self.entry(section);
        match section.record_size() {
            Some(record_size) => entry.count as u64 * record_size as u64,
            None => entry.count as u64,
        }
    }

    /// Reads the header from the start of `bytes` and checks that every section lies within `bytes`.
    ///
    /// Faults are checked in order: the size and magic, then the alignment of every entry,
    /// then the extent of every entry. The first fault aborts the read.
    pub fn read_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(DecodeError::MalformedHeader(HeaderFault::TooShort {
                len: bytes.len(),
            }));
        }

        let header: Header = Cursor::new(bytes).read_le().map_err(|_| {
            DecodeError::MalformedHeader(HeaderFault::TooShort { len: bytes.len() })
        })?;

        if header.magic != MAGIC {
            return Err(DecodeError::MalformedHeader(HeaderFault::BadMagic {
                found: header.magic,
            }));
        }

        header.check_alignment()?;
        header.check_extents(bytes.len())?;
        Ok(header)
    }

    fn check_alignment(&self) -> Result<(), DecodeError> {
        for section in Section::ALL {
            let entry = self.entry(section);
            // Table counts are record counts, so only their offsets need to be aligned.
            let misaligned_size =
                section.record_size().is_none() && entry.count % SECTION_ALIGNMENT != 0;
            if entry.offset % SECTION_ALIGNMENT != 0 || misaligned_size {
                return Err(DecodeError::MisalignedOffsetOrSize {
                    section,
                    offset: entry.offset,
                    size: entry.count,
                });
            }
        }
        Ok(())
    }

    fn check_extents(&self, buffer_len: usize) -> Result<(), DecodeError> {
        for section in Section::ALL {
            let entry = self.entry(section);
            let size = self.byte_size(section);
            // The values are at most 32 bits, so this can't overflow.
            if entry.offset as u64 + size > buffer_len as u64 {
                return Err(DecodeError::TruncatedData {
                    section,
                    offset: entry.offset as u64,
                    size,
                    buffer_len,
                });
            }
        }
        Ok(())
    }
}
