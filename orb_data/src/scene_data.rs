//! Owned scene data without index or offset cross references.
//!
//! Materials own their properties, meshes own their vertices and indices,
//! and clips own their curves, so editing one item can't invalidate references in another table.
//!
//! Converting to [SceneData] and back does not preserve the unused components of static keys
//! and value properties or any vertex and key bytes not referenced by a mesh or curve.
//! Use [Orb] directly when the file must remain binary identical.
use std::ops::Range;

use orb_lib::{AnimKeyFormat, Orb, StringError, VertexAttr, VertexFormat};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::anim_keys::{AnimKeyError, AnimKeyResolver, CurveKeys};
use crate::builder::{BuildOptions, CurveInput, OrbBuilder, Transform};
use crate::scene::DecodedScene;
use crate::validation::{validate_first, ValidationError};
use crate::vertex_layout::LayoutError;

/// Errors while converting a [DecodedScene] to [SceneData].
#[derive(Debug, Error)]
pub enum SceneDataError {
    /// The scene contains an invalid reference.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    String(#[from] StringError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    AnimKeys(#[from] AnimKeyError),
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneData {
    /// The components of the interleaved vertex layout shared by all meshes.
    pub vertex_layout: Vec<(VertexAttr, VertexFormat)>,
    pub materials: Vec<MaterialData>,
    pub meshes: Vec<MeshData>,
    pub bones: Vec<BoneData>,
    pub nodes: Vec<NodeData>,
    /// The key format for each curve position shared by all clips.
    pub anim_key_formats: Vec<AnimKeyFormat>,
    pub anim_clips: Vec<AnimClipData>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub shader: String,
    pub values: Vec<ValuePropertyData>,
    pub textures: Vec<TexturePropertyData>,
}

/// A material parameter with 1 to 4 components.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePropertyData {
    pub name: String,
    pub values: Vec<f32>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct TexturePropertyData {
    pub name: String,
    pub location: u32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub material_index: usize,
    /// Interleaved vertex bytes in the scene's vertex layout.
    pub vertex_data: Vec<u8>,
    pub indices: Vec<u16>,
    pub size: [f32; 3],
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoneData {
    pub name: String,
    pub parent_index: Option<usize>,
    pub transform: Transform,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    pub parent_index: Option<usize>,
    /// The indices of the meshes attached to this node.
    pub mesh_indices: Range<usize>,
    pub transform: Transform,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub struct AnimClipData {
    pub name: String,
    pub key_duration: f32,
    /// One curve for each anim key format in order.
    pub curves: Vec<AnimCurveData>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq)]
pub enum AnimCurveData {
    /// A constant value with one float for each component of the key format.
    Static(Vec<f32>),
    /// Keys flattened into consecutive floats.
    Keyed(Vec<f32>),
}

impl SceneData {
    /// Packs the data into a new container.
    pub fn to_orb(&self, options: BuildOptions) -> Orb {
        let mut builder = OrbBuilder::with_options(options);
        for (attr, format) in &self.vertex_layout {
            builder.add_vertex_component(*attr, *format);
        }

        for material in &self.materials {
            let values: Vec<_> = material
                .values
                .iter()
                .map(|v| (v.name.as_str(), v.values.as_slice()))
                .collect();
            let textures: Vec<_> = material
                .textures
                .iter()
                .map(|t| (t.name.as_str(), t.location))
                .collect();
            builder.add_material(&material.name, &material.shader, &values, &textures);
        }

        for mesh in &self.meshes {
            builder.add_mesh(
                mesh.material_index as u32,
                &mesh.vertex_data,
                &mesh.indices,
                mesh.size,
            );
        }

        for bone in &self.bones {
            builder.add_bone(&bone.name, bone.parent_index.map(|i| i as u32), bone.transform);
        }

        for node in &self.nodes {
            builder.add_node(
                &node.name,
                node.parent_index.map(|i| i as u32),
                node.mesh_indices.start as u32..node.mesh_indices.end as u32,
                node.transform,
            );
        }

        for format in &self.anim_key_formats {
            builder.add_anim_key_component(*format);
        }

        for clip in &self.anim_clips {
            let curves: Vec<_> = clip
                .curves
                .iter()
                .map(|c| match c {
                    AnimCurveData::Static(values) => CurveInput::Static(padded(values)),
                    AnimCurveData::Keyed(keys) => CurveInput::Keyed(keys),
                })
                .collect();
            builder.add_anim_clip(&clip.name, clip.key_duration, &curves);
        }

        builder.finish()
    }
}

impl TryFrom<&DecodedScene> for SceneData {
    type Error = SceneDataError;

    fn try_from(scene: &DecodedScene) -> Result<Self, Self::Error> {
        let orb = scene.orb();
        if let Some(error) = validate_first(orb) {
            return Err(error.into());
        }

        let layout = scene.vertex_layout()?;
        let vertex_layout = layout
            .attributes
            .iter()
            .map(|a| (a.attr, a.format))
            .collect();

        let materials = orb
            .materials
            .iter()
            .map(|m| {
                let values = orb.value_properties[m.first_value_property as usize..]
                    [..m.num_value_properties as usize]
                    .iter()
                    .map(|p| {
                        Ok(ValuePropertyData {
                            name: scene.string(p.name)?.to_string(),
                            values: p.value.to_array()[..p.dimension as usize].to_vec(),
                        })
                    })
                    .collect::<Result<_, SceneDataError>>()?;
                let textures = orb.texture_properties[m.first_texture_property as usize..]
                    [..m.num_texture_properties as usize]
                    .iter()
                    .map(|p| {
                        Ok(TexturePropertyData {
                            name: scene.string(p.name)?.to_string(),
                            location: p.location,
                        })
                    })
                    .collect::<Result<_, SceneDataError>>()?;

                Ok(MaterialData {
                    name: scene.string(m.name)?.to_string(),
                    shader: scene.string(m.shader)?.to_string(),
                    values,
                    textures,
                })
            })
            .collect::<Result<_, SceneDataError>>()?;

        // Validation guarantees the ranges, so missing data only occurs for an empty layout.
        let meshes = orb
            .meshes
            .iter()
            .enumerate()
            .map(|(i, m)| MeshData {
                material_index: m.material as usize,
                vertex_data: scene.mesh_vertex_data(i).unwrap_or_default().to_vec(),
                indices: scene.mesh_indices(i).unwrap_or_default(),
                size: m.size.to_array(),
            })
            .collect();

        let bones = orb
            .bones
            .iter()
            .map(|b| {
                Ok(BoneData {
                    name: scene.string(b.name)?.to_string(),
                    parent_index: b.parent_index().map(|p| p as usize),
                    transform: Transform {
                        translate: b.translate.to_array(),
                        scale: b.scale.to_array(),
                        rotate: b.rotate.to_array(),
                    },
                })
            })
            .collect::<Result<_, SceneDataError>>()?;

        let nodes = orb
            .nodes
            .iter()
            .map(|n| {
                Ok(NodeData {
                    name: scene.string(n.name)?.to_string(),
                    parent_index: n.parent_index().map(|p| p as usize),
                    mesh_indices: n.first_mesh as usize
                        ..n.first_mesh as usize + n.num_meshes as usize,
                    transform: Transform {
                        translate: n.translate.to_array(),
                        scale: n.scale.to_array(),
                        rotate: n.rotate.to_array(),
                    },
                })
            })
            .collect::<Result<_, SceneDataError>>()?;

        let anim_key_formats = orb
            .anim_key_components
            .iter()
            .map(|c| c.key_format())
            .collect::<Result<_, _>>()
            .map_err(AnimKeyError::from)?;

        let resolver = scene.anim_keys();
        let anim_clips = orb
            .anim_clips
            .iter()
            .enumerate()
            .map(|(i, c)| anim_clip_data(scene, &resolver, i, c))
            .collect::<Result<_, SceneDataError>>()?;

        Ok(Self {
            vertex_layout,
            materials,
            meshes,
            bones,
            nodes,
            anim_key_formats,
            anim_clips,
        })
    }
}

fn anim_clip_data(
    scene: &DecodedScene,
    resolver: &AnimKeyResolver,
    clip_index: usize,
    clip: &orb_lib::AnimClip,
) -> Result<AnimClipData, SceneDataError> {
    let curves = (0..clip.num_curves as usize)
        .map(|position| {
            let curve = match resolver.resolve_clip_curve(clip_index, position)? {
                CurveKeys::Static(value) => AnimCurveData::Static(value.as_slice().to_vec()),
                CurveKeys::Keyed(keys) => AnimCurveData::Keyed(
                    keys.keys()
                        .flat_map(|k| k.as_slice().to_vec())
                        .collect(),
                ),
            };
            Ok(curve)
        })
        .collect::<Result<_, SceneDataError>>()?;

    Ok(AnimClipData {
        name: scene.string(clip.name)?.to_string(),
        key_duration: clip.key_duration,
        curves,
    })
}

fn padded(values: &[f32]) -> [f32; 4] {
    let mut value = [0f32; 4];
    for (v, x) in value.iter_mut().zip(values) {
        *v = *x;
    }
    value
}
