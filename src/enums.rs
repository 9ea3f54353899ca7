//! Tag enums for the vertex and animation key layouts.
//!
//! Records store these tags as raw [u32] values so that a container with an unrecognized tag
//! still decodes structurally. Use the [TryFrom] implementations to convert a raw tag.
//! The value `0` is reserved as an invalid tag and never converts.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw tag did not match any variant of the expected enum.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{value} is not a valid {type_name} value")]
pub struct UnknownEnumValue {
    pub type_name: &'static str,
    pub value: u32,
}

macro_rules! orb_c_enum_impl {
    ($enum_type:ident, $($variant:ident),*) => {
        impl TryFrom<u32> for $enum_type {
            type Error = UnknownEnumValue;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                $(
                    if value == $enum_type::$variant as u32 {
                        return Ok($enum_type::$variant);
                    }
                )*
                Err(UnknownEnumValue {
                    type_name: stringify!($enum_type),
                    value,
                })
            }
        }

        impl From<$enum_type> for u32 {
            fn from(value: $enum_type) -> Self {
                value as u32
            }
        }
    };
}

/// Determines how a vertex component is consumed by the renderer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(
    feature = "strum",
    derive(strum::EnumString, strum::Display, strum::EnumVariantNames)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexAttr {
    Position = 1,
    Normal = 2,
    TexCoord0 = 3,
    TexCoord1 = 4,
    TexCoord2 = 5,
    TexCoord3 = 6,
    Tangent = 7,
    Binormal = 8,
    /// Skinning weights.
    Weights = 9,
    /// Skinning bone indices.
    Indices = 10,
    Color0 = 11,
    Color1 = 12,
}

orb_c_enum_impl!(
    VertexAttr, Position, Normal, TexCoord0, TexCoord1, TexCoord2, TexCoord3, Tangent, Binormal,
    Weights, Indices, Color0, Color1
);

/// The data type and component count of a vertex component.
/// This determines the stride and offset between attributes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(
    feature = "strum",
    derive(strum::EnumString, strum::Display, strum::EnumVariantNames)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexFormat {
    /// 1 component [f32].
    Float = 1,
    /// 2 component (xy or uv) vector of [f32].
    Float2 = 2,
    /// 3 component (xyz or rgb) vector of [f32].
    Float3 = 3,
    /// 4 component (xyzw or rgba) vector of [f32].
    Float4 = 4,
    /// 4 component vector of [i8].
    Byte4 = 5,
    /// 4 component vector of [i8] normalized to `-1.0..=1.0`.
    Byte4N = 6,
    /// 4 component vector of [u8].
    UByte4 = 7,
    /// 4 component vector of [u8] normalized to `0.0..=1.0`.
    UByte4N = 8,
    /// 2 component vector of [i16].
    Short2 = 9,
    /// 2 component vector of [i16] normalized to `-1.0..=1.0`.
    Short2N = 10,
    /// 4 component vector of [i16].
    Short4 = 11,
    /// 4 component vector of [i16] normalized to `-1.0..=1.0`.
    Short4N = 12,
}

orb_c_enum_impl!(
    VertexFormat,
    Float,
    Float2,
    Float3,
    Float4,
    Byte4,
    Byte4N,
    UByte4,
    UByte4N,
    Short2,
    Short2N,
    Short4,
    Short4N
);

impl VertexFormat {
    /// The size in bytes of a single value of this format.
    /**
    ```rust
    # use orb_lib::VertexFormat;
    assert_eq!(12, VertexFormat::Float3.size_in_bytes());
    assert_eq!(4, VertexFormat::UByte4N.size_in_bytes());
    ```
    */
    pub fn size_in_bytes(&self) -> u32 {
        match self {
            VertexFormat::Float => 4,
            VertexFormat::Float2 => 8,
            VertexFormat::Float3 => 12,
            VertexFormat::Float4 => 16,
            VertexFormat::Byte4
            | VertexFormat::Byte4N
            | VertexFormat::UByte4
            | VertexFormat::UByte4N => 4,
            VertexFormat::Short2 | VertexFormat::Short2N => 4,
            VertexFormat::Short4 | VertexFormat::Short4N => 8,
        }
    }

    /// The number of components in a single value of this format.
    pub fn component_count(&self) -> usize {
        match self {
            VertexFormat::Float => 1,
            VertexFormat::Float2 | VertexFormat::Short2 | VertexFormat::Short2N => 2,
            VertexFormat::Float3 => 3,
            _ => 4,
        }
    }
}

/// The shape of a single key for an animated channel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(
    feature = "strum",
    derive(strum::EnumString, strum::Display, strum::EnumVariantNames)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AnimKeyFormat {
    Float = 1,
    Float2 = 2,
    Float3 = 3,
    Float4 = 4,
    /// A rotation stored as xyzw.
    Quaternion = 5,
}

orb_c_enum_impl!(AnimKeyFormat, Float, Float2, Float3, Float4, Quaternion);

impl AnimKeyFormat {
    /// The number of [f32] values in a single key.
    pub fn dimension(&self) -> usize {
        match self {
            AnimKeyFormat::Float => 1,
            AnimKeyFormat::Float2 => 2,
            AnimKeyFormat::Float3 => 3,
            AnimKeyFormat::Float4 | AnimKeyFormat::Quaternion => 4,
        }
    }

    /// The size in bytes of a single key.
    /**
    ```rust
    # use orb_lib::AnimKeyFormat;
    assert_eq!(4, AnimKeyFormat::Float.size_in_bytes());
    assert_eq!(16, AnimKeyFormat::Quaternion.size_in_bytes());
    ```
    */
    pub fn size_in_bytes(&self) -> u32 {
        self.dimension() as u32 * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_attr_try_from_all_tags() {
        for tag in 1..=12u32 {
            let attr = VertexAttr::try_from(tag).unwrap();
            assert_eq!(tag, u32::from(attr));
        }
    }

    #[test]
    fn vertex_attr_invalid_tag() {
        assert_eq!(
            Err(UnknownEnumValue {
                type_name: "VertexAttr",
                value: 0
            }),
            VertexAttr::try_from(0)
        );
        assert!(VertexAttr::try_from(13).is_err());
    }

    #[test]
    fn vertex_format_sizes() {
        let sizes: Vec<_> = (1..=12u32)
            .map(|tag| VertexFormat::try_from(tag).unwrap().size_in_bytes())
            .collect();
        assert_eq!(vec![4, 8, 12, 16, 4, 4, 4, 4, 4, 4, 8, 8], sizes);
    }

    #[test]
    fn vertex_format_invalid_tag() {
        assert_eq!(
            Err(UnknownEnumValue {
                type_name: "VertexFormat",
                value: 13
            }),
            VertexFormat::try_from(13)
        );
    }

    #[test]
    fn anim_key_format_sizes() {
        assert_eq!(4, AnimKeyFormat::Float.size_in_bytes());
        assert_eq!(8, AnimKeyFormat::Float2.size_in_bytes());
        assert_eq!(12, AnimKeyFormat::Float3.size_in_bytes());
        assert_eq!(16, AnimKeyFormat::Float4.size_in_bytes());
        assert_eq!(16, AnimKeyFormat::Quaternion.size_in_bytes());
    }

    #[test]
    fn anim_key_format_invalid_tag() {
        assert!(AnimKeyFormat::try_from(0).is_err());
        assert!(AnimKeyFormat::try_from(6).is_err());
        assert_eq!(Ok(AnimKeyFormat::Quaternion), AnimKeyFormat::try_from(5));
    }
}
