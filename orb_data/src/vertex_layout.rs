//! Resolving the interleaved vertex layout shared by every mesh in a container.
//!
//! The layout is defined by the ordered list of [VertexComponent] records.
//! Each component occupies a fixed number of bytes determined by its [VertexFormat],
//! so the offset of an attribute is the sum of the sizes of the components before it.
use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt, BinResult};
use orb_lib::{UnknownEnumValue, VertexAttr, VertexComponent, VertexFormat};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors while resolving a [VertexLayout].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The vertex component at `index` has an unrecognized attribute or format tag.
    #[error("Vertex component {index} is invalid: {source}")]
    UnknownEnumValue {
        index: usize,
        #[source]
        source: UnknownEnumValue,
    },
}

/// The location of a single attribute within each vertex.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub attr: VertexAttr,
    pub format: VertexFormat,
    /// The offset in bytes from the start of the vertex.
    pub offset: u32,
}

/// The stride and attribute offsets for the interleaved vertex data.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    /// The size in bytes of a single vertex.
    pub stride: u32,
    /// The attributes in the order they appear in each vertex.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Computes the layout by accumulating the size of each component in order.
    /**
    ```rust
    # use orb_data::vertex_layout::VertexLayout;
    # use orb_lib::{VertexAttr, VertexComponent, VertexFormat};
    let layout = VertexLayout::from_components(&[
        VertexComponent::new(VertexAttr::Position, VertexFormat::Float3),
        VertexComponent::new(VertexAttr::Normal, VertexFormat::Byte4N),
        VertexComponent::new(VertexAttr::TexCoord0, VertexFormat::Float2),
    ])
    .unwrap();
    assert_eq!(24, layout.stride);
    assert_eq!(Some(16), layout.attribute(VertexAttr::TexCoord0).map(|a| a.offset));
    ```
    */
    pub fn from_components(components: &[VertexComponent]) -> Result<Self, LayoutError> {
        let mut offset = 0;
        let mut attributes = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            let attr = component
                .attr()
                .map_err(|source| LayoutError::UnknownEnumValue { index, source })?;
            let format = component
                .format()
                .map_err(|source| LayoutError::UnknownEnumValue { index, source })?;

            attributes.push(VertexAttribute {
                attr,
                format,
                offset,
            });
            offset += format.size_in_bytes();
        }

        Ok(Self {
            stride: offset,
            attributes,
        })
    }

    /// Finds the first attribute with the given usage.
    pub fn attribute(&self, attr: VertexAttr) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.attr == attr)
    }

    /// The number of whole vertices in `vertex_data_size` bytes
    /// or [None] if the size is not a multiple of the stride.
    /// An empty layout only describes an empty vertex buffer.
    pub fn vertex_count(&self, vertex_data_size: usize) -> Option<usize> {
        if self.stride == 0 {
            (vertex_data_size == 0).then_some(0)
        } else if vertex_data_size % self.stride as usize == 0 {
            Some(vertex_data_size / self.stride as usize)
        } else {
            None
        }
    }

    /// Reads the value of `attribute` for the vertex at `vertex_index` in `vertex_data`.
    pub fn read_attribute(
        &self,
        vertex_data: &[u8],
        vertex_index: usize,
        attribute: &VertexAttribute,
    ) -> Option<[f32; 4]> {
        let start = vertex_index
            .checked_mul(self.stride as usize)?
            .checked_add(attribute.offset as usize)?;
        let end = start.checked_add(attribute.format.size_in_bytes() as usize)?;
        let bytes = vertex_data.get(start..end)?;
        read_value(attribute.format, bytes).ok()
    }

    /// Encodes the values for a single vertex with one value for each attribute in order.
    /// Unused components are ignored.
    pub fn write_vertex(&self, values: &[[f32; 4]], output: &mut Vec<u8>) {
        for (attribute, value) in self.attributes.iter().zip(values) {
            write_value(attribute.format, value, output);
        }
        // Attributes without a value are zeroed to preserve the stride.
        for attribute in self.attributes.iter().skip(values.len()) {
            output.extend(std::iter::repeat(0u8).take(attribute.format.size_in_bytes() as usize));
        }
    }
}

/// Decodes a single value of `format` from the start of `bytes`.
/// Components not present in the format are set to `0.0`.
pub fn read_value(format: VertexFormat, bytes: &[u8]) -> BinResult<[f32; 4]> {
    let mut reader = Cursor::new(bytes);
    let count = format.component_count();
    match format {
        VertexFormat::Float | VertexFormat::Float2 | VertexFormat::Float3 | VertexFormat::Float4 => {
            read_components::<f32>(&mut reader, count, |v| v)
        }
        VertexFormat::Byte4 => read_components::<i8>(&mut reader, count, |v| v as f32),
        VertexFormat::Byte4N => read_components::<i8>(&mut reader, count, |v| {
            (v as f32 / i8::MAX as f32).max(-1.0)
        }),
        VertexFormat::UByte4 => read_components::<u8>(&mut reader, count, |v| v as f32),
        VertexFormat::UByte4N => {
            read_components::<u8>(&mut reader, count, |v| v as f32 / u8::MAX as f32)
        }
        VertexFormat::Short2 | VertexFormat::Short4 => {
            read_components::<i16>(&mut reader, count, |v| v as f32)
        }
        VertexFormat::Short2N | VertexFormat::Short4N => {
            read_components::<i16>(&mut reader, count, |v| {
                (v as f32 / i16::MAX as f32).max(-1.0)
            })
        }
    }
}

fn read_components<T>(
    reader: &mut Cursor<&[u8]>,
    count: usize,
    convert: impl Fn(T) -> f32,
) -> BinResult<[f32; 4]>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut value = [0f32; 4];
    for v in value.iter_mut().take(count) {
        *v = convert(reader.read_le::<T>()?);
    }
    Ok(value)
}

/// Encodes the first [component_count](VertexFormat::component_count) components of `value` as `format`.
/// Normalized formats clamp values to their representable range.
pub fn write_value(format: VertexFormat, value: &[f32; 4], output: &mut Vec<u8>) {
    let components = &value[..format.component_count()];
    match format {
        VertexFormat::Float | VertexFormat::Float2 | VertexFormat::Float3 | VertexFormat::Float4 => {
            for v in components {
                output.extend_from_slice(&v.to_le_bytes());
            }
        }
        VertexFormat::Byte4 => {
            output.extend(components.iter().map(|v| *v as i8 as u8));
        }
        VertexFormat::Byte4N => {
            output.extend(
                components
                    .iter()
                    .map(|v| (v.clamp(-1.0, 1.0) * i8::MAX as f32).round() as i8 as u8),
            );
        }
        VertexFormat::UByte4 => {
            output.extend(components.iter().map(|v| *v as u8));
        }
        VertexFormat::UByte4N => {
            output.extend(
                components
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8),
            );
        }
        VertexFormat::Short2 | VertexFormat::Short4 => {
            for v in components {
                output.extend_from_slice(&(*v as i16).to_le_bytes());
            }
        }
        VertexFormat::Short2N | VertexFormat::Short4N => {
            for v in components {
                let value = (v.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                output.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
}
