//! # orb_data
//!
//! orb_data checks and provides convenient access to the data in an ORB scene container built on orb_lib.
//!
//! ## Features
//! - Validation of every index, range, string offset and key offset between tables
//! - Resolving the shared vertex layout and decoding vertex attributes to floats
//! - Resolving static and keyed animation curves
//! - An incremental [OrbBuilder](crate::builder::OrbBuilder) that lays out the string pool and blobs
//! - Owned [SceneData](crate::scene_data::SceneData) types using [Vec] and [String] instead of offsets
//!
//! ## Getting Started
//! [decode] reads the structure of a file and reports all invalid references without failing.
//! [encode] refuses to write a container with any invalid reference.
/*!
```no_run
use orb_data::prelude::*;
# fn main() -> Result<(), Box<dyn std::error::Error>> {
let bytes = std::fs::read("scene.orb")?;
let (scene, errors) = orb_data::decode(&bytes)?;
for error in &errors {
    println!("{error}");
}

let mut data = SceneData::try_from(&scene)?;
data.nodes[0].name = "root".to_string();
data.write_to_file("scene_new.orb")?;
# Ok(())
# }
```
 */
pub mod anim_keys;
pub mod builder;
pub mod scene;
pub mod scene_data;
pub mod validation;
pub mod vertex_layout;

use std::io::{Read, Write};
use std::path::Path;

use orb_lib::{DecodeError, Header, Orb, Section, WriteOrbError};
use thiserror::Error;

use crate::builder::BuildOptions;
use crate::scene::DecodedScene;
use crate::scene_data::SceneData;
use crate::validation::{validate, validate_first, validate_layout, ValidationError};

/// Errors while encoding a container.
/// Nothing is written if any error occurs.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The first invalid reference found.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The end of a section does not fit in a 32 bit offset.
    #[error("Section {section} would end at byte {end}, which exceeds the 32 bit offset limit.")]
    SectionTooLarge { section: Section, end: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<WriteOrbError> for BuildError {
    fn from(e: WriteOrbError) -> Self {
        match e {
            WriteOrbError::SectionTooLarge { section, end } => {
                BuildError::SectionTooLarge { section, end }
            }
            WriteOrbError::Io(e) => BuildError::Io(e),
        }
    }
}

/// Reads the tables from `bytes` and checks all references between them.
///
/// Structural errors in the header or section layout return an error.
/// Invalid references are returned alongside the scene, so a faulty file can still be inspected.
/// Sections placed differently than [encode] would place them are also reported,
/// so an empty error list means `encode` reproduces `bytes` exactly.
pub fn decode(bytes: &[u8]) -> Result<(DecodedScene, Vec<ValidationError>), DecodeError> {
    let header = Header::read_bytes(bytes)?;
    let orb = Orb::read_sections(bytes, &header)?;

    let mut errors = validate_layout(&header, bytes.len());
    errors.extend(validate(&orb));
    if !errors.is_empty() {
        log::warn!("Decoded ORB with {} invalid references", errors.len());
    }

    Ok((DecodedScene::new(header, orb), errors))
}

/// Checks all references in `orb` and lays out the sections in a new buffer.
/// Fails on the first invalid reference.
pub fn encode(orb: &Orb) -> Result<Vec<u8>, BuildError> {
    if let Some(error) = validate_first(orb) {
        return Err(error.into());
    }
    Ok(orb.to_bytes()?)
}

/// Functions for reading and writing the high level data types.
pub trait OrbData: Sized {
    type WriteError: std::error::Error;

    /// Tries to read and convert the data from `path`.
    /// The entire file is buffered for performance.
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>>;

    /// Tries to read and convert the data from `reader`.
    /// For best performance when opening from a file, use [OrbData::from_file] instead.
    fn read<R: Read>(reader: &mut R) -> Result<Self, Box<dyn std::error::Error>>;

    /// Converts the data and writes to the given `writer`.
    fn write<W: Write>(&self, writer: &mut W) -> Result<(), Self::WriteError>;

    /// Converts the data and writes to the given `path`.
    /// The entire file is buffered for performance.
    fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::WriteError>;
}

impl OrbData for SceneData {
    type WriteError = BuildError;

    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let (scene, _) = decode(&bytes)?;
        Ok(Self::try_from(&scene)?)
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self, Box<dyn std::error::Error>> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let (scene, _) = decode(&bytes)?;
        Ok(Self::try_from(&scene)?)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<(), Self::WriteError> {
        let bytes = encode(&self.to_orb(BuildOptions::default()))?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Self::WriteError> {
        let bytes = encode(&self.to_orb(BuildOptions::default()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Common imports for top level types and important traits.
pub mod prelude {
    pub use crate::builder::{BuildOptions, OrbBuilder};
    pub use crate::scene::DecodedScene;
    pub use crate::scene_data::SceneData;
    pub use crate::validation::ValidationError;
    pub use crate::{decode, encode, BuildError, OrbData};
}

#[cfg(test)]
pub(crate) fn group_hex(a: &str, words_per_line: usize) -> String {
    use itertools::Itertools;

    // ex: "FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFF..."
    let words = a
        .chars()
        .collect::<Vec<char>>()
        .chunks(8)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<String>>();

    words.chunks(words_per_line).map(|c| c.join(" ")).join("\n")
}

#[cfg(test)]
macro_rules! assert_hex_eq {
    ($a:expr, $b:expr) => {
        assert!(
            $a == $b,
            "\n{} !=\n{}",
            crate::group_hex(&hex::encode($a), 8),
            crate::group_hex(&hex::encode($b), 8)
        )
    };
}

#[cfg(test)]
pub(crate) use assert_hex_eq;
