//! Read access to a decoded container.
use std::sync::OnceLock;

use binrw::io::Cursor;
use binrw::BinReaderExt;
use orb_lib::{Header, Orb, StringError, StringOffset, VertexAttr};

use crate::anim_keys::{AnimKeyError, AnimKeyResolver, CurveKeys, KeyCount};
use crate::vertex_layout::{LayoutError, VertexLayout};

/// The tables of a structurally valid container and the header they were read with.
///
/// Accessors never panic on invalid references and return [None] or an error instead.
/// Use [validate](crate::validation::validate) or the errors returned by [decode](crate::decode)
/// to find invalid references up front.
#[derive(Debug, Clone)]
pub struct DecodedScene {
    header: Header,
    orb: Orb,
    layout: OnceLock<Result<VertexLayout, LayoutError>>,
}

impl PartialEq for DecodedScene {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.orb == other.orb
    }
}

impl DecodedScene {
    pub fn new(header: Header, orb: Orb) -> Self {
        Self {
            header,
            orb,
            layout: OnceLock::new(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn orb(&self) -> &Orb {
        &self.orb
    }

    pub fn into_orb(self) -> Orb {
        self.orb
    }

    /// Finds the string at `offset` in the string pool.
    pub fn string(&self, offset: StringOffset) -> Result<&str, StringError> {
        orb_lib::resolve_string(&self.orb.string_pool_data, offset)
    }

    /// The vertex layout shared by all meshes.
    /// The layout is only computed on first access.
    pub fn vertex_layout(&self) -> Result<&VertexLayout, LayoutError> {
        self.layout
            .get_or_init(|| VertexLayout::from_components(&self.orb.vertex_components))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The interleaved vertex bytes for the mesh at `mesh_index`.
    pub fn mesh_vertex_data(&self, mesh_index: usize) -> Option<&[u8]> {
        let mesh = self.orb.meshes.get(mesh_index)?;
        let stride = self.vertex_layout().ok()?.stride as usize;
        let start = mesh.first_vertex as usize * stride;
        let end = start + mesh.num_vertices as usize * stride;
        self.orb.vertex_data.get(start..end)
    }

    /// The 16 bit indices for the mesh at `mesh_index`.
    pub fn mesh_indices(&self, mesh_index: usize) -> Option<Vec<u16>> {
        let mesh = self.orb.meshes.get(mesh_index)?;
        let start = mesh.first_index as usize * 2;
        let end = start + mesh.num_indices as usize * 2;
        let mut reader = Cursor::new(self.orb.index_data.get(start..end)?);
        (0..mesh.num_indices)
            .map(|_| reader.read_le::<u16>().ok())
            .collect()
    }

    /// Decodes the values of `attr` for every vertex of the mesh at `mesh_index`.
    /// Returns [None] if the layout does not contain `attr`.
    pub fn mesh_attribute_values(
        &self,
        mesh_index: usize,
        attr: VertexAttr,
    ) -> Option<Vec<[f32; 4]>> {
        let layout = self.vertex_layout().ok()?;
        let attribute = layout.attribute(attr)?;
        let vertex_data = self.mesh_vertex_data(mesh_index)?;

        let vertex_count = vertex_data.len() / layout.stride as usize;
        (0..vertex_count)
            .map(|i| layout.read_attribute(vertex_data, i, attribute))
            .collect()
    }

    /// A resolver for curve keys using [KeyCount::UntilNextCurve].
    pub fn anim_keys(&self) -> AnimKeyResolver<'_> {
        AnimKeyResolver::new(&self.orb)
    }

    /// Resolves the curve at `position` within the clip at index `clip`.
    pub fn curve_keys(
        &self,
        clip: usize,
        position: usize,
        key_count: KeyCount,
    ) -> Result<CurveKeys<'_>, AnimKeyError> {
        self.anim_keys()
            .with_key_count(key_count)
            .resolve_clip_curve(clip, position)
    }
}
