//! The fixed size records stored in the ten typed tables of an [Orb](crate::Orb).
//!
//! Each record is tightly packed with fields in declaration order and no padding.
//! Cross references between tables are plain indices or `(first, count)` ranges,
//! and text is stored as a [StringOffset] into the string pool.
use binrw::BinRead;
use orb_write::OrbWrite;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    AnimKeyFormat, Section, UnknownEnumValue, Vector3, Vector4, VertexAttr, VertexFormat,
};

/// A record type stored in one of the typed tables.
pub trait Record: for<'a> BinRead<Args<'a> = ()> + OrbWrite {
    /// The size of the record on disk.
    const SIZE_IN_BYTES: u32;
    /// The section of the header describing the table of this record type.
    const SECTION: Section;
}

macro_rules! record_impl {
    ($ty:ident, $size:expr, $section:expr) => {
        impl Record for $ty {
            const SIZE_IN_BYTES: u32 = $size;
            const SECTION: Section = $section;
        }
    };
}

/// A byte offset into the string pool of a null terminated UTF-8 string.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StringOffset(pub u32);

/// One component of the interleaved vertex layout shared by all meshes.
/// Components are stored in the order they appear in each vertex.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexComponent {
    /// The raw [VertexAttr] tag.
    pub attr: u32,
    /// The raw [VertexFormat] tag.
    pub format: u32,
}

impl VertexComponent {
    pub fn new(attr: VertexAttr, format: VertexFormat) -> Self {
        Self {
            attr: attr.into(),
            format: format.into(),
        }
    }

    pub fn attr(&self) -> Result<VertexAttr, UnknownEnumValue> {
        VertexAttr::try_from(self.attr)
    }

    pub fn format(&self) -> Result<VertexFormat, UnknownEnumValue> {
        VertexFormat::try_from(self.format)
    }
}

/// A named material parameter with 1 to 4 float components.
/// Values past [dimension](#structfield.dimension) are unused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct ValueProperty {
    pub name: StringOffset,
    pub dimension: u32,
    pub value: Vector4,
}

/// A named texture parameter bound to a texture slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureProperty {
    pub name: StringOffset,
    pub location: u32,
}

/// A shader and the ranges of its value and texture properties.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    pub name: StringOffset,
    pub shader: StringOffset,
    /// The index of the first [ValueProperty] for this material.
    pub first_value_property: u32,
    pub num_value_properties: u32,
    /// The index of the first [TextureProperty] for this material.
    pub first_texture_property: u32,
    pub num_texture_properties: u32,
}

/// A range of vertices and 16 bit indices drawn with a single material.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    /// The index of the [Material] used to draw this mesh.
    pub material: u32,
    /// The index of the first vertex in the vertex data.
    pub first_vertex: u32,
    pub num_vertices: u32,
    /// The index of the first index in the index data.
    pub first_index: u32,
    pub num_indices: u32,
    /// The dimensions of the bounding box.
    pub size: Vector3,
}

/// A bone of the skeleton.
/// The parent index is `-1` for root bones.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    pub name: StringOffset,
    pub parent: i32,
    pub translate: Vector3,
    pub scale: Vector3,
    /// A quaternion stored as xyzw.
    pub rotate: Vector4,
}

impl Bone {
    /// The parent index or [None] for root bones.
    pub fn parent_index(&self) -> Option<i32> {
        parent_index(self.parent)
    }
}

/// A node of the scene graph and the range of meshes attached to it.
/// The parent index is `-1` for root nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub name: StringOffset,
    pub parent: i32,
    /// The index of the first [Mesh] attached to this node.
    pub first_mesh: u32,
    pub num_meshes: u32,
    pub translate: Vector3,
    pub scale: Vector3,
    /// A quaternion stored as xyzw.
    pub rotate: Vector4,
}

impl Node {
    /// The parent index or [None] for root nodes.
    pub fn parent_index(&self) -> Option<i32> {
        parent_index(self.parent)
    }
}

fn parent_index(parent: i32) -> Option<i32> {
    if parent == -1 {
        None
    } else {
        Some(parent)
    }
}

/// The key format of one animated channel.
/// The curve at position `i` of each clip uses the component at index `i`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimKeyComponent {
    /// The raw [AnimKeyFormat] tag.
    pub key_format: u32,
}

impl AnimKeyComponent {
    pub fn new(key_format: AnimKeyFormat) -> Self {
        Self {
            key_format: key_format.into(),
        }
    }

    pub fn key_format(&self) -> Result<AnimKeyFormat, UnknownEnumValue> {
        AnimKeyFormat::try_from(self.key_format)
    }
}

/// The keys for a single animated channel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct AnimCurve {
    /// The byte offset of the first key in the anim key data or `-1` for static curves.
    pub key_offset: i32,
    /// The constant value used for the entire clip when the curve is static.
    pub static_key: Vector4,
}

impl AnimCurve {
    pub const STATIC_KEY_OFFSET: i32 = -1;

    /// Returns `true` if the curve uses [static_key](#structfield.static_key) for the entire clip.
    pub fn is_static(&self) -> bool {
        self.key_offset == Self::STATIC_KEY_OFFSET
    }
}

/// A named animation and the range of its curves.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(BinRead, OrbWrite, Debug, Clone, Copy, PartialEq)]
pub struct AnimClip {
    pub name: StringOffset,
    /// The duration of a single key.
    pub key_duration: f32,
    /// The index of the first [AnimCurve] for this clip.
    pub first_curve: u32,
    pub num_curves: u32,
}

record_impl!(VertexComponent, 8, Section::VertexComponents);
record_impl!(ValueProperty, 24, Section::ValueProperties);
record_impl!(TextureProperty, 8, Section::TextureProperties);
record_impl!(Material, 24, Section::Materials);
record_impl!(Mesh, 32, Section::Meshes);
record_impl!(Bone, 48, Section::Bones);
record_impl!(Node, 56, Section::Nodes);
record_impl!(AnimKeyComponent, 4, Section::AnimKeyComponents);
record_impl!(AnimCurve, 20, Section::AnimCurves);
record_impl!(AnimClip, 16, Section::AnimClips);
