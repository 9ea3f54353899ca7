//! Incremental construction of an [Orb].
//!
//! Records are appended in the order they are added, so the returned indices are stable.
//! Child records such as value properties and curves are stored contiguously
//! with their parent's `(first, count)` range.
use std::ops::Range;

use orb_lib::{
    AnimClip, AnimCurve, AnimKeyComponent, AnimKeyFormat, Bone, Material, Mesh, Node, Orb,
    StringOffset, StringPool, TextureProperty, ValueProperty, Vector4, VertexAttr,
    VertexComponent, VertexFormat,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{encode, vertex_layout::VertexLayout, BuildError};

/// Options for [OrbBuilder].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Store identical strings only once in the string pool.
    pub deduplicate_strings: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            deduplicate_strings: true,
        }
    }
}

/// The local transform of a bone or node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translate: [f32; 3],
    pub scale: [f32; 3],
    /// A quaternion stored as xyzw.
    pub rotate: [f32; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translate: [0.0; 3],
        scale: [1.0; 3],
        rotate: [0.0, 0.0, 0.0, 1.0],
    };
}

/// The keys for a single curve passed to [OrbBuilder::add_anim_clip].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveInput<'a> {
    /// A constant value. Values past the key format's dimension are unused.
    Static([f32; 4]),
    /// Keys flattened into consecutive floats.
    Keyed(&'a [f32]),
}

/// Appends records to a new [Orb] while interning strings and packing the blobs.
/**
```rust
# use orb_data::builder::{OrbBuilder, Transform};
# use orb_lib::{VertexAttr, VertexFormat};
let mut builder = OrbBuilder::new();
builder.add_vertex_component(VertexAttr::Position, VertexFormat::Float3);
let material = builder.add_material("mat", "basic", &[("color", &[1.0, 0.0, 0.0])], &[]);
let mesh = builder.add_mesh(material, &[0u8; 36], &[0, 1, 2], [1.0; 3]);
builder.add_node("root", None, mesh..mesh + 1, Transform::IDENTITY);

let bytes = builder.build().unwrap();
assert_eq!(&[0x31, 0x42, 0x52, 0x4F], &bytes[..4]);
```
*/
#[derive(Debug, Clone, Default)]
pub struct OrbBuilder {
    orb: Orb,
    strings: StringPool,
    indices: Vec<u16>,
}

impl OrbBuilder {
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            orb: Orb::default(),
            strings: StringPool::with_deduplication(options.deduplicate_strings),
            indices: Vec::new(),
        }
    }

    /// Adds `text` to the string pool.
    pub fn intern(&mut self, text: &str) -> StringOffset {
        self.strings.intern(text)
    }

    /// Appends a component to the vertex layout.
    /// The layout should be complete before adding any meshes.
    pub fn add_vertex_component(&mut self, attr: VertexAttr, format: VertexFormat) -> u32 {
        push(
            &mut self.orb.vertex_components,
            VertexComponent::new(attr, format),
        )
    }

    /// Adds a material and its properties.
    /// The dimension of each value property is the number of values.
    pub fn add_material(
        &mut self,
        name: &str,
        shader: &str,
        values: &[(&str, &[f32])],
        textures: &[(&str, u32)],
    ) -> u32 {
        let first_value_property = self.orb.value_properties.len() as u32;
        for (property_name, value) in values {
            let property = ValueProperty {
                name: self.strings.intern(property_name),
                dimension: value.len() as u32,
                value: padded_vector4(value),
            };
            self.orb.value_properties.push(property);
        }

        let first_texture_property = self.orb.texture_properties.len() as u32;
        for (property_name, location) in textures {
            let property = TextureProperty {
                name: self.strings.intern(property_name),
                location: *location,
            };
            self.orb.texture_properties.push(property);
        }

        let material = Material {
            name: self.strings.intern(name),
            shader: self.strings.intern(shader),
            first_value_property,
            num_value_properties: values.len() as u32,
            first_texture_property,
            num_texture_properties: textures.len() as u32,
        };
        push(&mut self.orb.materials, material)
    }

    /// Adds a mesh using interleaved `vertex_data` in the current vertex layout.
    /// `indices` are stored as is and are not offset by the mesh's first vertex.
    pub fn add_mesh(
        &mut self,
        material: u32,
        vertex_data: &[u8],
        indices: &[u16],
        size: [f32; 3],
    ) -> u32 {
        // An invalid layout is reported by validation when building.
        let stride = VertexLayout::from_components(&self.orb.vertex_components)
            .map(|layout| layout.stride as usize)
            .unwrap_or(0);
        let (first_vertex, num_vertices) = match stride {
            0 => (0, 0),
            stride => (
                self.orb.vertex_data.len() / stride,
                vertex_data.len() / stride,
            ),
        };

        let mesh = Mesh {
            material,
            first_vertex: first_vertex as u32,
            num_vertices: num_vertices as u32,
            first_index: self.indices.len() as u32,
            num_indices: indices.len() as u32,
            size: size.into(),
        };

        self.orb.vertex_data.extend_from_slice(vertex_data);
        self.indices.extend_from_slice(indices);
        push(&mut self.orb.meshes, mesh)
    }

    pub fn add_bone(&mut self, name: &str, parent: Option<u32>, transform: Transform) -> u32 {
        let bone = Bone {
            name: self.strings.intern(name),
            parent: parent_index(parent),
            translate: transform.translate.into(),
            scale: transform.scale.into(),
            rotate: transform.rotate.into(),
        };
        push(&mut self.orb.bones, bone)
    }

    /// Adds a node referencing the meshes with indices in `meshes`.
    pub fn add_node(
        &mut self,
        name: &str,
        parent: Option<u32>,
        meshes: Range<u32>,
        transform: Transform,
    ) -> u32 {
        let node = Node {
            name: self.strings.intern(name),
            parent: parent_index(parent),
            first_mesh: meshes.start,
            num_meshes: meshes.end.saturating_sub(meshes.start),
            translate: transform.translate.into(),
            scale: transform.scale.into(),
            rotate: transform.rotate.into(),
        };
        push(&mut self.orb.nodes, node)
    }

    /// Appends the key format for the next curve position shared by all clips.
    pub fn add_anim_key_component(&mut self, key_format: AnimKeyFormat) -> u32 {
        push(
            &mut self.orb.anim_key_components,
            AnimKeyComponent::new(key_format),
        )
    }

    /// Adds a clip with one curve for each anim key component in order.
    /// Keys for keyed curves are appended to the anim key data.
    pub fn add_anim_clip(&mut self, name: &str, key_duration: f32, curves: &[CurveInput]) -> u32 {
        let first_curve = self.orb.anim_curves.len() as u32;
        for curve in curves {
            let curve = match curve {
                CurveInput::Static(value) => AnimCurve {
                    key_offset: AnimCurve::STATIC_KEY_OFFSET,
                    static_key: (*value).into(),
                },
                CurveInput::Keyed(keys) => {
                    let key_offset = self.orb.anim_key_data.len() as i32;
                    for key in keys.iter() {
                        self.orb.anim_key_data.extend_from_slice(&key.to_le_bytes());
                    }
                    AnimCurve {
                        key_offset,
                        static_key: Vector4::default(),
                    }
                }
            };
            self.orb.anim_curves.push(curve);
        }

        let clip = AnimClip {
            name: self.strings.intern(name),
            key_duration,
            first_curve,
            num_curves: curves.len() as u32,
        };
        push(&mut self.orb.anim_clips, clip)
    }

    /// Packs the indices and string pool and returns the container without validating it.
    /// Index data and string pool data are padded to a multiple of 4 bytes.
    pub fn finish(self) -> Orb {
        let mut orb = self.orb;

        orb.index_data = self.indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        if self.indices.len() % 2 != 0 {
            orb.index_data.extend_from_slice(&[0u8; 2]);
        }

        orb.string_pool_data = self.strings.into_bytes();
        orb
    }

    /// Validates and encodes the container.
    /// Nothing is produced if any reference is invalid.
    pub fn build(self) -> Result<Vec<u8>, BuildError> {
        encode(&self.finish())
    }
}

fn push<T>(table: &mut Vec<T>, record: T) -> u32 {
    table.push(record);
    table.len() as u32 - 1
}

fn parent_index(parent: Option<u32>) -> i32 {
    parent.map(|p| p as i32).unwrap_or(-1)
}

fn padded_vector4(values: &[f32]) -> Vector4 {
    let mut value = [0f32; 4];
    for (v, x) in value.iter_mut().zip(values) {
        *v = *x;
    }
    value.into()
}
