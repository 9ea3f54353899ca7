//! Cross reference checks for the tables of a structurally valid [Orb].
//!
//! Decoding only guarantees that every section fits in the buffer.
//! The checks here confirm that indices, ranges, string offsets, key offsets, and tags
//! all refer to existing data and that bone and node hierarchies terminate at a root.
//! A violation never prevents access to the tables, so callers can still inspect a faulty file.
use std::ops::ControlFlow;

use orb_lib::{
    resolve_string, ErrorKind, Header, Orb, Section, StringError, StringOffset,
    UnknownEnumValue, HEADER_SIZE, SECTION_ALIGNMENT,
};
use thiserror::Error;

use crate::vertex_layout::{LayoutError, VertexLayout};

/// A single inconsistency between the tables of a container.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An index or `(first, count)` range refers past the end of its target.
    #[error("{section} {index} has {field} referring to {target} {start}..{end}, but {target} has length {len}.")]
    OutOfBoundsReference {
        section: Section,
        index: usize,
        field: &'static str,
        target: Section,
        start: i64,
        end: i64,
        len: u64,
    },

    /// Following parents from this entry never reaches a root.
    #[error("{section} {index} with parent {parent} is part of a cycle or has an ancestor that is.")]
    CyclicOrInvalidHierarchy {
        section: Section,
        index: usize,
        parent: i32,
    },

    #[error("{section} {index} has an invalid {field}: {source}")]
    UnknownEnumValue {
        section: Section,
        index: usize,
        field: &'static str,
        source: UnknownEnumValue,
    },

    /// No null byte follows the string offset before the end of the string pool.
    #[error("{section} {index} has {field} at string offset {offset}, which is not null terminated.")]
    UnterminatedString {
        section: Section,
        index: usize,
        field: &'static str,
        offset: u32,
    },

    #[error("{section} {index} has {field} at string offset {offset}, which is not valid UTF-8.")]
    InvalidString {
        section: Section,
        index: usize,
        field: &'static str,
        offset: u32,
    },

    /// The vertex data is not exactly the vertices referenced by the meshes.
    #[error("Vertex data size {size} does not match {vertex_count} vertices with stride {stride}.")]
    VertexDataSize {
        size: usize,
        stride: u32,
        vertex_count: u64,
    },

    /// The section does not start at the end of the previous section.
    #[error("{section} starts at offset {offset} instead of the expected offset {expected}.")]
    NonCanonicalPlacement {
        section: Section,
        offset: u32,
        expected: u64,
    },

    /// Bytes follow the last section.
    #[error("The file has {len} bytes, but the last section ends at {end}.")]
    TrailingData { len: usize, end: u64 },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::OutOfBoundsReference { .. } => ErrorKind::OutOfBoundsReference,
            ValidationError::CyclicOrInvalidHierarchy { .. } => {
                ErrorKind::CyclicOrInvalidHierarchy
            }
            ValidationError::UnknownEnumValue { .. } => ErrorKind::UnknownEnumValue,
            ValidationError::UnterminatedString { .. } => ErrorKind::TruncatedData,
            ValidationError::InvalidString { .. } => ErrorKind::InvalidString,
            ValidationError::VertexDataSize { .. } => ErrorKind::TruncatedData,
            ValidationError::NonCanonicalPlacement { .. } | ValidationError::TrailingData { .. } => {
                ErrorKind::NonCanonicalLayout
            }
        }
    }
}

/// Checks every table and returns all detected errors in table order.
/**
```rust
# use orb_data::validation::validate;
# use orb_lib::Orb;
let orb = Orb::default();
assert!(validate(&orb).is_empty());
```
*/
pub fn validate(orb: &Orb) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let _ = validate_with(orb, |e| {
        errors.push(e);
        ControlFlow::Continue(())
    });
    errors
}

/// Checks the tables until the first error is found.
pub fn validate_first(orb: &Orb) -> Option<ValidationError> {
    let mut first = None;
    let _ = validate_with(orb, |e| {
        first = Some(e);
        ControlFlow::Break(())
    });
    first
}

/// Passes each detected error to `sink` in table order.
/// Checking stops as soon as `sink` returns [ControlFlow::Break].
pub fn validate_with<F>(orb: &Orb, mut sink: F) -> ControlFlow<()>
where
    F: FnMut(ValidationError) -> ControlFlow<()>,
{
    let mut validator = Validator {
        orb,
        sink: &mut sink,
    };
    validator.validate()
}

/// Checks that the sections located by `header` in a buffer of `len` bytes
/// are placed one after another in header order with no gaps or trailing bytes.
///
/// Only a file with this layout is reproduced exactly by [encode](crate::encode).
/// Only the first misplaced section is reported, since every later offset depends on it.
/**
```rust
# use orb_data::validation::validate_layout;
# use orb_lib::Orb;
let bytes = Orb::default().to_bytes().unwrap();
let header = Orb::default().header().unwrap();
assert!(validate_layout(&header, bytes.len()).is_empty());
```
*/
pub fn validate_layout(header: &Header, len: usize) -> Vec<ValidationError> {
    let mut expected = HEADER_SIZE as u64;
    for section in Section::ALL {
        let offset = header.entry(section).offset;
        if offset as u64 != expected {
            return vec![ValidationError::NonCanonicalPlacement {
                section,
                offset,
                expected,
            }];
        }
        expected = (expected + header.byte_size(section))
            .next_multiple_of(SECTION_ALIGNMENT as u64);
    }

    if len as u64 != expected {
        return vec![ValidationError::TrailingData { len, end: expected }];
    }
    Vec::new()
}

struct Validator<'a, F> {
    orb: &'a Orb,
    sink: &'a mut F,
}

impl<'a, F> Validator<'a, F>
where
    F: FnMut(ValidationError) -> ControlFlow<()>,
{
    fn report(&mut self, error: ValidationError) -> ControlFlow<()> {
        (self.sink)(error)
    }

    fn validate(&mut self) -> ControlFlow<()> {
        let layout = self.vertex_components()?;
        self.value_properties()?;
        self.texture_properties()?;
        self.materials()?;
        self.meshes(layout.as_ref())?;
        self.bones()?;
        self.nodes()?;
        self.anim_key_components()?;
        self.anim_curves()?;
        self.anim_clips()
    }

    fn vertex_components(&mut self) -> ControlFlow<(), Option<VertexLayout>> {
        let orb = self.orb;
        for (index, component) in orb.vertex_components.iter().enumerate() {
            if let Err(source) = component.attr() {
                self.report(ValidationError::UnknownEnumValue {
                    section: Section::VertexComponents,
                    index,
                    field: "attr",
                    source,
                })?;
            }
            if let Err(source) = component.format() {
                self.report(ValidationError::UnknownEnumValue {
                    section: Section::VertexComponents,
                    index,
                    field: "format",
                    source,
                })?;
            }
        }

        // Errors for invalid components were already reported above.
        match VertexLayout::from_components(&orb.vertex_components) {
            Ok(layout) => ControlFlow::Continue(Some(layout)),
            Err(LayoutError::UnknownEnumValue { .. }) => ControlFlow::Continue(None),
        }
    }

    fn value_properties(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, property) in orb.value_properties.iter().enumerate() {
            self.string(Section::ValueProperties, index, "name", property.name)?;
            if !(1..=4).contains(&property.dimension) {
                self.report(ValidationError::UnknownEnumValue {
                    section: Section::ValueProperties,
                    index,
                    field: "dimension",
                    source: UnknownEnumValue {
                        type_name: "dimension",
                        value: property.dimension,
                    },
                })?;
            }
        }
        ControlFlow::Continue(())
    }

    fn texture_properties(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, property) in orb.texture_properties.iter().enumerate() {
            self.string(Section::TextureProperties, index, "name", property.name)?;
        }
        ControlFlow::Continue(())
    }

    fn materials(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, material) in orb.materials.iter().enumerate() {
            self.string(Section::Materials, index, "name", material.name)?;
            self.string(Section::Materials, index, "shader", material.shader)?;
            self.range(
                (Section::Materials, index, "value properties"),
                Section::ValueProperties,
                material.first_value_property,
                material.num_value_properties,
                orb.value_properties.len(),
            )?;
            self.range(
                (Section::Materials, index, "texture properties"),
                Section::TextureProperties,
                material.first_texture_property,
                material.num_texture_properties,
                orb.texture_properties.len(),
            )?;
        }
        ControlFlow::Continue(())
    }

    fn meshes(&mut self, layout: Option<&VertexLayout>) -> ControlFlow<()> {
        let orb = self.orb;

        // Vertex ranges can only be checked with a known stride.
        let vertex_count = match layout {
            Some(layout) => match layout.vertex_count(orb.vertex_data.len()) {
                Some(count) => Some(count),
                None => {
                    self.report(ValidationError::VertexDataSize {
                        size: orb.vertex_data.len(),
                        stride: layout.stride,
                        vertex_count: max_vertex_extent(orb),
                    })?;
                    None
                }
            },
            None => None,
        };

        let index_count = orb.index_data.len() / 2;
        let mut vertex_ranges_valid = true;

        for (index, mesh) in orb.meshes.iter().enumerate() {
            self.index(
                (Section::Meshes, index, "material"),
                Section::Materials,
                mesh.material as i64,
                orb.materials.len(),
            )?;
            if let Some(vertex_count) = vertex_count {
                vertex_ranges_valid &= self.range(
                    (Section::Meshes, index, "vertices"),
                    Section::VertexData,
                    mesh.first_vertex,
                    mesh.num_vertices,
                    vertex_count,
                )?;
            }
            self.range(
                (Section::Meshes, index, "indices"),
                Section::IndexData,
                mesh.first_index,
                mesh.num_indices,
                index_count,
            )?;
        }

        // Trailing vertices not used by any mesh.
        if let (Some(layout), Some(vertex_count)) = (layout, vertex_count) {
            let extent = max_vertex_extent(orb);
            if vertex_ranges_valid && extent != vertex_count as u64 {
                self.report(ValidationError::VertexDataSize {
                    size: orb.vertex_data.len(),
                    stride: layout.stride,
                    vertex_count: extent,
                })?;
            }
        }

        ControlFlow::Continue(())
    }

    fn bones(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, bone) in orb.bones.iter().enumerate() {
            self.string(Section::Bones, index, "name", bone.name)?;
        }
        let parents: Vec<_> = orb.bones.iter().map(|b| b.parent).collect();
        self.hierarchy(Section::Bones, &parents)
    }

    fn nodes(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, node) in orb.nodes.iter().enumerate() {
            self.string(Section::Nodes, index, "name", node.name)?;
            self.range(
                (Section::Nodes, index, "meshes"),
                Section::Meshes,
                node.first_mesh,
                node.num_meshes,
                orb.meshes.len(),
            )?;
        }
        let parents: Vec<_> = orb.nodes.iter().map(|n| n.parent).collect();
        self.hierarchy(Section::Nodes, &parents)
    }

    fn anim_key_components(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, component) in orb.anim_key_components.iter().enumerate() {
            if let Err(source) = component.key_format() {
                self.report(ValidationError::UnknownEnumValue {
                    section: Section::AnimKeyComponents,
                    index,
                    field: "key_format",
                    source,
                })?;
            }
        }
        ControlFlow::Continue(())
    }

    fn anim_curves(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, curve) in orb.anim_curves.iter().enumerate() {
            let start = curve.key_offset as i64;
            if start < -1 || start >= orb.anim_key_data.len() as i64 {
                self.report(ValidationError::OutOfBoundsReference {
                    section: Section::AnimCurves,
                    index,
                    field: "key_offset",
                    target: Section::AnimKeyData,
                    start,
                    end: start + 1,
                    len: orb.anim_key_data.len() as u64,
                })?;
            }
        }
        ControlFlow::Continue(())
    }

    fn anim_clips(&mut self) -> ControlFlow<()> {
        let orb = self.orb;
        for (index, clip) in orb.anim_clips.iter().enumerate() {
            self.string(Section::AnimClips, index, "name", clip.name)?;
            let curves_valid = self.range(
                (Section::AnimClips, index, "curves"),
                Section::AnimCurves,
                clip.first_curve,
                clip.num_curves,
                orb.anim_curves.len(),
            )?;
            // The curve at each position uses the component at the same index.
            self.range(
                (Section::AnimClips, index, "curves"),
                Section::AnimKeyComponents,
                0,
                clip.num_curves,
                orb.anim_key_components.len(),
            )?;
            if !curves_valid {
                continue;
            }

            let curves = &orb.anim_curves[clip.first_curve as usize..][..clip.num_curves as usize];
            for (position, (curve, component)) in
                curves.iter().zip(&orb.anim_key_components).enumerate()
            {
                let Ok(format) = component.key_format() else {
                    continue;
                };
                // Offsets outside the data were already reported for the curve itself.
                let start = curve.key_offset as i64;
                if start < 0 || start >= orb.anim_key_data.len() as i64 {
                    continue;
                }

                let end = start + format.size_in_bytes() as i64;
                if end > orb.anim_key_data.len() as i64 {
                    self.report(ValidationError::OutOfBoundsReference {
                        section: Section::AnimCurves,
                        index: clip.first_curve as usize + position,
                        field: "key_offset",
                        target: Section::AnimKeyData,
                        start,
                        end,
                        len: orb.anim_key_data.len() as u64,
                    })?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn string(
        &mut self,
        section: Section,
        index: usize,
        field: &'static str,
        offset: StringOffset,
    ) -> ControlFlow<()> {
        match resolve_string(&self.orb.string_pool_data, offset) {
            Ok(_) => ControlFlow::Continue(()),
            Err(StringError::OutOfBounds { offset, pool_size }) => {
                self.report(ValidationError::OutOfBoundsReference {
                    section,
                    index,
                    field,
                    target: Section::StringPoolData,
                    start: offset as i64,
                    end: offset as i64 + 1,
                    len: pool_size as u64,
                })
            }
            Err(StringError::Unterminated { offset }) => {
                self.report(ValidationError::UnterminatedString {
                    section,
                    index,
                    field,
                    offset,
                })
            }
            Err(StringError::InvalidUtf8 { offset }) => {
                self.report(ValidationError::InvalidString {
                    section,
                    index,
                    field,
                    offset,
                })
            }
        }
    }

    /// Checks `first..first + count` against `len` and returns `true` if the range is in bounds.
    fn range(
        &mut self,
        (section, index, field): (Section, usize, &'static str),
        target: Section,
        first: u32,
        count: u32,
        len: usize,
    ) -> ControlFlow<(), bool> {
        let end = first as u64 + count as u64;
        if end > len as u64 {
            self.report(ValidationError::OutOfBoundsReference {
                section,
                index,
                field,
                target,
                start: first as i64,
                end: end as i64,
                len: len as u64,
            })?;
            ControlFlow::Continue(false)
        } else {
            ControlFlow::Continue(true)
        }
    }

    fn index(
        &mut self,
        (section, index, field): (Section, usize, &'static str),
        target: Section,
        value: i64,
        len: usize,
    ) -> ControlFlow<()> {
        if value < 0 || value >= len as i64 {
            self.report(ValidationError::OutOfBoundsReference {
                section,
                index,
                field,
                target,
                start: value,
                end: value + 1,
                len: len as u64,
            })?;
        }
        ControlFlow::Continue(())
    }

    fn hierarchy(&mut self, section: Section, parents: &[i32]) -> ControlFlow<()> {
        let len = parents.len();
        let mut walks = vec![Walk::Unknown; len];
        let mut path = Vec::new();

        for (index, parent) in parents.iter().copied().enumerate() {
            if parent == -1 {
                walks[index] = Walk::Root;
                continue;
            }

            if parent as i64 == index as i64 {
                walks[index] = Walk::Cycle;
                self.report(ValidationError::CyclicOrInvalidHierarchy {
                    section,
                    index,
                    parent,
                })?;
                continue;
            }

            if parent < 0 || parent as usize >= len {
                // The chain ends here, and the invalid parent is reported once for this entry.
                walks[index] = Walk::Root;
                self.index((section, index, "parent"), section, parent as i64, len)?;
                continue;
            }

            if walks[index] == Walk::Unknown {
                // Any chain longer than the table must revisit an entry.
                path.clear();
                let mut current = index;
                let walk = loop {
                    if walks[current] != Walk::Unknown {
                        break walks[current];
                    }
                    if path.len() > len {
                        break Walk::Cycle;
                    }
                    path.push(current);
                    match parents[current] {
                        p if p < 0 || p as usize >= len => break Walk::Root,
                        p => current = p as usize,
                    }
                };
                for &i in &path {
                    walks[i] = walk;
                }
            }

            if walks[index] == Walk::Cycle {
                self.report(ValidationError::CyclicOrInvalidHierarchy {
                    section,
                    index,
                    parent,
                })?;
            }
        }
        ControlFlow::Continue(())
    }
}

/// The result of following parents from an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
    Unknown,
    Root,
    Cycle,
}

fn max_vertex_extent(orb: &Orb) -> u64 {
    orb.meshes
        .iter()
        .map(|m| m.first_vertex as u64 + m.num_vertices as u64)
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use hexlit::hex;
    use orb_lib::{
        AnimClip, AnimCurve, AnimKeyComponent, AnimKeyFormat, Bone, Material, Mesh, Node,
        StringPool, TextureProperty, ValueProperty, Vector3, Vector4, VertexAttr,
        VertexComponent, VertexFormat,
    };
    use pretty_assertions::assert_eq;

    fn node(name: StringOffset, parent: i32) -> Node {
        Node {
            name,
            parent,
            first_mesh: 0,
            num_meshes: 0,
            translate: Vector3::default(),
            scale: Vector3::one(),
            rotate: Vector4::identity_quaternion(),
        }
    }

    fn valid_orb() -> Orb {
        let mut strings = StringPool::new();
        let root = strings.intern("root");
        let child = strings.intern("child");
        let material = strings.intern("mat");
        let shader = strings.intern("basic");
        let color = strings.intern("color");
        let texture = strings.intern("diffuse");
        let clip = strings.intern("walk");

        Orb {
            vertex_components: vec![VertexComponent::new(
                VertexAttr::Position,
                VertexFormat::Float3,
            )],
            value_properties: vec![ValueProperty {
                name: color,
                dimension: 3,
                value: Vector4::new(1.0, 1.0, 1.0, 0.0),
            }],
            texture_properties: vec![TextureProperty {
                name: texture,
                location: 0,
            }],
            materials: vec![Material {
                name: material,
                shader,
                first_value_property: 0,
                num_value_properties: 1,
                first_texture_property: 0,
                num_texture_properties: 1,
            }],
            meshes: vec![Mesh {
                material: 0,
                first_vertex: 0,
                num_vertices: 3,
                first_index: 0,
                num_indices: 3,
                size: Vector3::one(),
            }],
            bones: vec![Bone {
                name: root,
                parent: -1,
                translate: Vector3::default(),
                scale: Vector3::one(),
                rotate: Vector4::identity_quaternion(),
            }],
            nodes: vec![
                Node {
                    num_meshes: 1,
                    ..node(root, -1)
                },
                node(child, 0),
            ],
            anim_key_components: vec![
                AnimKeyComponent::new(AnimKeyFormat::Float),
                AnimKeyComponent::new(AnimKeyFormat::Quaternion),
            ],
            anim_curves: vec![
                AnimCurve {
                    key_offset: 0,
                    static_key: Vector4::default(),
                },
                AnimCurve {
                    key_offset: -1,
                    static_key: Vector4::identity_quaternion(),
                },
            ],
            anim_clips: vec![AnimClip {
                name: clip,
                key_duration: 0.04,
                first_curve: 0,
                num_curves: 2,
            }],
            vertex_data: vec![0u8; 36],
            index_data: hex!("00000100 02000000").to_vec(),
            anim_key_data: hex!("00000000 0000803F").to_vec(),
            string_pool_data: strings.into_bytes(),
        }
    }

    #[test]
    fn validate_valid_orb() {
        assert_eq!(Vec::<ValidationError>::new(), validate(&valid_orb()));
        assert_eq!(None, validate_first(&valid_orb()));
    }

    #[test]
    fn validate_material_index_equal_to_len() {
        let mut orb = valid_orb();
        orb.meshes[0].material = 1;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::Meshes,
                index: 0,
                field: "material",
                target: Section::Materials,
                start: 1,
                end: 2,
                len: 1
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_two_node_cycle() {
        let mut orb = valid_orb();
        orb.nodes[0].parent = 1;

        let errors = validate(&orb);
        assert!(!errors.is_empty());
        assert!(errors
            .iter()
            .all(|e| e.kind() == ErrorKind::CyclicOrInvalidHierarchy));
        assert_eq!(
            ValidationError::CyclicOrInvalidHierarchy {
                section: Section::Nodes,
                index: 0,
                parent: 1
            },
            errors[0]
        );
    }

    #[test]
    fn validate_bone_own_parent() {
        let mut orb = valid_orb();
        orb.bones[0].parent = 0;

        assert_eq!(
            vec![ValidationError::CyclicOrInvalidHierarchy {
                section: Section::Bones,
                index: 0,
                parent: 0
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_parent_out_of_range() {
        let mut orb = valid_orb();
        orb.nodes[1].parent = 2;
        orb.bones[0].parent = -2;

        let errors = validate(&orb);
        assert_eq!(2, errors.len());
        assert!(errors
            .iter()
            .all(|e| e.kind() == ErrorKind::OutOfBoundsReference));
    }

    #[test]
    fn validate_chain_into_cycle() {
        let mut strings = StringPool::new();
        let name = strings.intern("n");
        let orb = Orb {
            // 0 -> 1 -> 2 -> 1
            nodes: vec![node(name, 1), node(name, 2), node(name, 1)],
            string_pool_data: strings.into_bytes(),
            ..Default::default()
        };

        let indices: Vec<_> = validate(&orb)
            .into_iter()
            .map(|e| match e {
                ValidationError::CyclicOrInvalidHierarchy { index, .. } => index,
                e => panic!("unexpected error {e:?}"),
            })
            .collect();
        assert_eq!(vec![0, 1, 2], indices);
    }

    #[test]
    fn validate_deep_node_chain() {
        let mut strings = StringPool::new();
        let name = strings.intern("n");
        let count = 200_000;
        let mut orb = Orb {
            nodes: (0..count).map(|i| node(name, i - 1)).collect(),
            string_pool_data: strings.into_bytes(),
            ..Default::default()
        };
        assert!(validate(&orb).is_empty());

        // Closing the chain makes every node part of the cycle.
        orb.nodes[0].parent = count - 1;
        let errors = validate(&orb);
        assert_eq!(count as usize, errors.len());
        assert!(errors
            .iter()
            .all(|e| e.kind() == ErrorKind::CyclicOrInvalidHierarchy));
    }

    #[test]
    fn validate_chain_into_own_parent() {
        let mut strings = StringPool::new();
        let name = strings.intern("n");
        let orb = Orb {
            // 0 -> 1 -> 1, 2 -> -1
            nodes: vec![node(name, 1), node(name, 1), node(name, -1)],
            string_pool_data: strings.into_bytes(),
            ..Default::default()
        };

        let indices: Vec<_> = validate(&orb)
            .into_iter()
            .map(|e| match e {
                ValidationError::CyclicOrInvalidHierarchy { index, .. } => index,
                e => panic!("unexpected error {e:?}"),
            })
            .collect();
        assert_eq!(vec![0, 1], indices);
    }

    #[test]
    fn validate_unterminated_string() {
        let mut orb = valid_orb();
        let len = orb.string_pool_data.len();
        orb.string_pool_data.extend_from_slice(b"abcd");
        orb.anim_clips[0].name = StringOffset(len as u32);

        let errors = validate(&orb);
        assert_eq!(
            vec![ValidationError::UnterminatedString {
                section: Section::AnimClips,
                index: 0,
                field: "name",
                offset: len as u32
            }],
            errors
        );
        assert_eq!(ErrorKind::TruncatedData, errors[0].kind());
    }

    #[test]
    fn validate_string_out_of_bounds() {
        let mut orb = valid_orb();
        orb.materials[0].shader = StringOffset(1000);

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert!(matches!(
            errors[0],
            ValidationError::OutOfBoundsReference {
                section: Section::Materials,
                field: "shader",
                target: Section::StringPoolData,
                start: 1000,
                ..
            }
        ));
    }

    #[test]
    fn validate_invalid_utf8_string() {
        let mut orb = valid_orb();
        let len = orb.string_pool_data.len();
        orb.string_pool_data.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x00]);
        orb.texture_properties[0].name = StringOffset(len as u32);

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert_eq!(ErrorKind::InvalidString, errors[0].kind());
    }

    #[test]
    fn validate_dimension_out_of_range() {
        let mut orb = valid_orb();
        orb.value_properties[0].dimension = 5;

        assert_eq!(
            vec![ValidationError::UnknownEnumValue {
                section: Section::ValueProperties,
                index: 0,
                field: "dimension",
                source: UnknownEnumValue {
                    type_name: "dimension",
                    value: 5
                }
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_unknown_vertex_format_skips_vertex_ranges() {
        let mut orb = valid_orb();
        orb.vertex_components[0].format = 0;
        orb.meshes[0].num_vertices = 100;

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert_eq!(ErrorKind::UnknownEnumValue, errors[0].kind());
    }

    #[test]
    fn validate_vertex_data_not_multiple_of_stride() {
        let mut orb = valid_orb();
        orb.vertex_data.truncate(32);

        assert_eq!(
            vec![ValidationError::VertexDataSize {
                size: 32,
                stride: 12,
                vertex_count: 3
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_unreferenced_vertices() {
        let mut orb = valid_orb();
        orb.meshes[0].num_vertices = 2;

        let errors = validate(&orb);
        assert_eq!(
            vec![ValidationError::VertexDataSize {
                size: 36,
                stride: 12,
                vertex_count: 2
            }],
            errors
        );
        assert_eq!(ErrorKind::TruncatedData, errors[0].kind());
    }

    #[test]
    fn validate_vertex_range_past_end() {
        let mut orb = valid_orb();
        orb.meshes[0].first_vertex = 1;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::Meshes,
                index: 0,
                field: "vertices",
                target: Section::VertexData,
                start: 1,
                end: 4,
                len: 3
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_index_range_past_end() {
        let mut orb = valid_orb();
        orb.meshes[0].num_indices = 5;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::Meshes,
                index: 0,
                field: "indices",
                target: Section::IndexData,
                start: 0,
                end: 5,
                len: 4
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_node_mesh_range() {
        let mut orb = valid_orb();
        orb.nodes[1].first_mesh = 1;
        orb.nodes[1].num_meshes = 1;

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert!(matches!(
            errors[0],
            ValidationError::OutOfBoundsReference {
                section: Section::Nodes,
                index: 1,
                target: Section::Meshes,
                ..
            }
        ));
    }

    #[test]
    fn validate_clip_more_curves_than_components() {
        let mut orb = valid_orb();
        orb.anim_curves.push(AnimCurve {
            key_offset: -1,
            static_key: Vector4::default(),
        });
        orb.anim_clips[0].num_curves = 3;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::AnimClips,
                index: 0,
                field: "curves",
                target: Section::AnimKeyComponents,
                start: 0,
                end: 3,
                len: 2
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_key_offset_past_end() {
        let mut orb = valid_orb();
        orb.anim_curves[0].key_offset = 8;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::AnimCurves,
                index: 0,
                field: "key_offset",
                target: Section::AnimKeyData,
                start: 8,
                end: 9,
                len: 8
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_key_offset_partial_key() {
        let mut orb = valid_orb();
        orb.anim_curves[0].key_offset = 6;

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::AnimCurves,
                index: 0,
                field: "key_offset",
                target: Section::AnimKeyData,
                start: 6,
                end: 10,
                len: 8
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_key_offset_of_curve_outside_clips() {
        let mut orb = valid_orb();
        orb.anim_curves.push(AnimCurve {
            key_offset: 1000,
            static_key: Vector4::default(),
        });

        assert_eq!(
            vec![ValidationError::OutOfBoundsReference {
                section: Section::AnimCurves,
                index: 2,
                field: "key_offset",
                target: Section::AnimKeyData,
                start: 1000,
                end: 1001,
                len: 8
            }],
            validate(&orb)
        );
    }

    #[test]
    fn validate_key_offset_negative() {
        let mut orb = valid_orb();
        orb.anim_curves[1].key_offset = -4;

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert_eq!(ErrorKind::OutOfBoundsReference, errors[0].kind());
    }

    #[test]
    fn validate_unknown_key_format() {
        let mut orb = valid_orb();
        orb.anim_key_components[1].key_format = 6;

        let errors = validate(&orb);
        assert_eq!(1, errors.len());
        assert!(matches!(
            errors[0],
            ValidationError::UnknownEnumValue {
                section: Section::AnimKeyComponents,
                index: 1,
                field: "key_format",
                ..
            }
        ));
    }

    #[test]
    fn validate_first_stops_early() {
        let mut orb = valid_orb();
        orb.meshes[0].material = 5;
        orb.nodes[0].parent = 1;

        let mut count = 0;
        let result = validate_with(&orb, |_| {
            count += 1;
            ControlFlow::Break(())
        });
        assert_eq!(ControlFlow::Break(()), result);
        assert_eq!(1, count);

        assert!(matches!(
            validate_first(&orb),
            Some(ValidationError::OutOfBoundsReference {
                section: Section::Meshes,
                ..
            })
        ));
    }
}
