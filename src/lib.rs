//! # orb_lib
//!
//! orb_lib is a library for safe and efficient reading and writing of the ORB binary scene container.
//! An ORB file packs the vertex layout, materials, meshes, skeleton, scene graph and animation clips
//! of a single asset into one contiguous buffer intended to be loaded with very few allocations.
//!
//! The types in this crate fully represent the binary data contained in the file.
//! Reading and writing a file without any modifications produces identical bytes.
//! Cross references between tables are not checked here.
//! See [orb_data](https://docs.rs/orb_data) for validation and higher level access to the data.
//!
//! ## Layout
//! The file starts with a fixed size [Header] containing the magic `'ORB1'` (file bytes `31 42 52 4F`) and one [SectionEntry] for each [Section].
//! The ten typed tables come first followed by the four raw blobs.
//! Every offset and size is a multiple of 4 bytes.
//!
//! | Section | Contents |
//! | --- | --- |
//! | [Section::VertexComponents] | [VertexComponent] records defining the interleaved vertex layout |
//! | [Section::ValueProperties] | [ValueProperty] records |
//! | [Section::TextureProperties] | [TextureProperty] records |
//! | [Section::Materials] | [Material] records |
//! | [Section::Meshes] | [Mesh] records |
//! | [Section::Bones] | [Bone] records |
//! | [Section::Nodes] | [Node] records |
//! | [Section::AnimKeyComponents] | [AnimKeyComponent] records |
//! | [Section::AnimCurves] | [AnimCurve] records |
//! | [Section::AnimClips] | [AnimClip] records |
//! | [Section::VertexData] | interleaved vertex bytes |
//! | [Section::IndexData] | 16 bit indices padded to a multiple of 4 bytes |
//! | [Section::AnimKeyData] | per curve runs of keys |
//! | [Section::StringPoolData] | null terminated UTF-8 strings |
//!
//! ## Example
/*!
```no_run
# fn main() -> Result<(), Box<dyn std::error::Error>> {
use orb_lib::{Orb, resolve_string};

let orb = Orb::from_file("scene.orb")?;
for node in &orb.nodes {
    println!("{}", resolve_string(&orb.string_pool_data, node.name)?);
}

orb.write_to_file("scene_new.orb")?;
# Ok(())
# }
```
 */
mod enums;
mod export;
mod header;
mod records;
mod strings;
mod tables;
mod vectors;

pub use enums::*;
pub use header::*;
pub use records::*;
pub use strings::*;
pub use tables::{read_blob, read_table, write_table};
pub use vectors::*;

use std::io::{Read, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while reading the structure of an ORB file.
/// Any of these errors means none of the tables can be trusted.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer is too small to contain a header or the magic does not match.
    #[error("Malformed header: {0}.")]
    MalformedHeader(HeaderFault),

    /// A section offset or blob size is not a multiple of 4 bytes.
    #[error("Section {section} has offset {offset} and size {size}, which are not both multiples of 4.")]
    MisalignedOffsetOrSize {
        section: Section,
        offset: u32,
        size: u32,
    },

    /// A section extends past the end of the buffer.
    #[error("Section {section} with offset {offset} and size {size} extends past the end of the buffer of {buffer_len} bytes.")]
    TruncatedData {
        section: Section,
        offset: u64,
        size: u64,
        buffer_len: usize,
    },

    /// An error occurred while trying to read the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedHeader(_) => ErrorKind::MalformedHeader,
            DecodeError::MisalignedOffsetOrSize { .. } => ErrorKind::MisalignedOffsetOrSize,
            DecodeError::TruncatedData { .. } => ErrorKind::TruncatedData,
            DecodeError::Io(_) => ErrorKind::Io,
        }
    }
}

/// The category of a structural or cross reference error.
/// Structural errors prevent decoding.
/// The remaining kinds are reported by validation and never prevent access to the tables.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedHeader,
    MisalignedOffsetOrSize,
    TruncatedData,
    OutOfBoundsReference,
    CyclicOrInvalidHierarchy,
    UnknownEnumValue,
    InvalidString,
    /// The sections are not where the writer would place them, so encoding changes the bytes.
    NonCanonicalLayout,
    Io,
}

/// Errors while writing an ORB file.
#[derive(Debug, Error)]
pub enum WriteOrbError {
    /// The end of a section does not fit in a 32 bit offset.
    #[error("Section {section} would end at byte {end}, which exceeds the 32 bit offset limit.")]
    SectionTooLarge { section: Section, end: u64 },

    /// An error occurred while writing the output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The tables and blobs of an ORB file.
///
/// Records refer to each other by index or byte offset only.
/// The [Header] is calculated when writing, so sections are always written in header order
/// with offsets determined by the preceding sections.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Orb {
    pub vertex_components: Vec<VertexComponent>,
    pub value_properties: Vec<ValueProperty>,
    pub texture_properties: Vec<TextureProperty>,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub bones: Vec<Bone>,
    pub nodes: Vec<Node>,
    pub anim_key_components: Vec<AnimKeyComponent>,
    pub anim_curves: Vec<AnimCurve>,
    pub anim_clips: Vec<AnimClip>,
    /// Interleaved vertex data for all meshes using the layout in
    /// [vertex_components](#structfield.vertex_components).
    pub vertex_data: Vec<u8>,
    /// 16 bit vertex indices for all meshes.
    pub index_data: Vec<u8>,
    /// Keys for all animation curves that aren't static.
    pub anim_key_data: Vec<u8>,
    /// Null terminated UTF-8 strings referenced by [StringOffset].
    pub string_pool_data: Vec<u8>,
}

impl Orb {
    /// Tries to read an ORB from `path`.
    /// The entire file is buffered for performance.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path)?;
        Self::read_bytes(&bytes)
    }

    /// Tries to read an ORB from `reader`.
    /// For best performance when opening from a file, use `from_file` instead.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::read_bytes(&bytes)
    }

    /// Tries to read an ORB from the bytes of an entire file.
    pub fn read_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let header = Header::read_bytes(bytes)?;
        Self::read_sections(bytes, &header)
    }

    /// Reads all tables and blobs located by a `header` previously read from `bytes`.
    ///
    /// The tables don't depend on each other, so the order they are read in does not matter.
    pub fn read_sections(bytes: &[u8], header: &Header) -> Result<Self, DecodeError> {
        let orb = Self {
            vertex_components: read_table(bytes, header.entry(Section::VertexComponents))?,
            value_properties: read_table(bytes, header.entry(Section::ValueProperties))?,
            texture_properties: read_table(bytes, header.entry(Section::TextureProperties))?,
            materials: read_table(bytes, header.entry(Section::Materials))?,
            meshes: read_table(bytes, header.entry(Section::Meshes))?,
            bones: read_table(bytes, header.entry(Section::Bones))?,
            nodes: read_table(bytes, header.entry(Section::Nodes))?,
            anim_key_components: read_table(bytes, header.entry(Section::AnimKeyComponents))?,
            anim_curves: read_table(bytes, header.entry(Section::AnimCurves))?,
            anim_clips: read_table(bytes, header.entry(Section::AnimClips))?,
            vertex_data: read_section_blob(bytes, header, Section::VertexData)?,
            index_data: read_section_blob(bytes, header, Section::IndexData)?,
            anim_key_data: read_section_blob(bytes, header, Section::AnimKeyData)?,
            string_pool_data: read_section_blob(bytes, header, Section::StringPoolData)?,
        };

        log::debug!(
            "Read ORB with {} vertex components, {} materials, {} meshes, {} bones, {} nodes, {} anim clips",
            orb.vertex_components.len(),
            orb.materials.len(),
            orb.meshes.len(),
            orb.bones.len(),
            orb.nodes.len(),
            orb.anim_clips.len(),
        );

        Ok(orb)
    }

    /// Writes the data to the given writer.
    /// Nothing is written if any section fails to write.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), WriteOrbError> {
        export::write_buffered(writer, |buffer| export::write_orb(buffer, self))
    }

    /// Writes the data to the given path.
    /// The entire file is buffered for performance.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteOrbError> {
        // Lay out the sections before creating the file to avoid leaving a partial file.
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Writes the data to a new buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WriteOrbError> {
        let mut bytes = Vec::new();
        export::write_orb(&mut bytes, self)?;
        Ok(bytes)
    }

    /// Calculates the [Header] that will be written for the current data.
    pub fn header(&self) -> Result<Header, WriteOrbError> {
        export::calculate_header(self)
    }

    /// The number of records for a table or the unpadded size in bytes for a blob.
    pub fn section_count(&self, section: Section) -> usize {
        match section {
            Section::VertexComponents => self.vertex_components.len(),
            Section::ValueProperties => self.value_properties.len(),
            Section::TextureProperties => self.texture_properties.len(),
            Section::Materials => self.materials.len(),
            Section::Meshes => self.meshes.len(),
            Section::Bones => self.bones.len(),
            Section::Nodes => self.nodes.len(),
            Section::AnimKeyComponents => self.anim_key_components.len(),
            Section::AnimCurves => self.anim_curves.len(),
            Section::AnimClips => self.anim_clips.len(),
            Section::VertexData => self.vertex_data.len(),
            Section::IndexData => self.index_data.len(),
            Section::AnimKeyData => self.anim_key_data.len(),
            Section::StringPoolData => self.string_pool_data.len(),
        }
    }
}

fn read_section_blob(
    bytes: &[u8],
    header: &Header,
    section: Section,
) -> Result<Vec<u8>, DecodeError> {
    read_blob(bytes, section, header.entry(section))
}

pub(crate) fn round_up(value: u64, n: u64) -> u64 {
    // Find the next largest multiple of n.
    ((value + n - 1) / n) * n
}
