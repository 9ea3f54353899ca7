//! Resolving the keys of an animation curve.
//!
//! A curve is either static with a single constant value
//! or keyed with a run of keys starting at a byte offset in the anim key data.
//! The key format comes from the [AnimKeyComponent] at the same position as the curve within its clip.
//!
//! The container doesn't store the number of keys for a curve, so the length of a run is
//! determined by a [KeyCount] policy chosen by the caller.
use binrw::io::Cursor;
use binrw::{BinReaderExt, BinResult};
use itertools::Itertools;
use orb_lib::{
    AnimClip, AnimCurve, AnimKeyComponent, AnimKeyFormat, Orb, UnknownEnumValue, Vector4,
};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors while resolving the keys for a curve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnimKeyError {
    #[error(transparent)]
    UnknownEnumValue(#[from] UnknownEnumValue),

    /// The clip or curve position doesn't refer to an existing curve or component.
    #[error("Curve {position} of anim clip {clip} does not have a curve and anim key component.")]
    MissingCurve { clip: usize, position: usize },

    /// The keys extend past the end of the anim key data.
    #[error("Keys at offset {offset} with size {size} extend past the end of the anim key data with size {anim_key_data_size}.")]
    OutOfBounds {
        offset: i64,
        size: u64,
        anim_key_data_size: usize,
    },
}

/// Determines the number of keys for a keyed curve.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum KeyCount {
    /// Keys continue until the next larger key offset used by any curve
    /// or the end of the anim key data for the last run.
    #[default]
    UntilNextCurve,
    /// Every keyed curve has the same number of keys.
    Fixed(usize),
    /// The clip's key duration in seconds multiplied by the sample rate in Hz.
    SampleRate(f32),
}

/// The floats for a single key or static value.
/// Only the first [dimension](#structfield.dimension) values are used.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyValue {
    pub values: [f32; 4],
    pub dimension: usize,
}

impl KeyValue {
    /// The used values of the key.
    pub fn as_slice(&self) -> &[f32] {
        &self.values[..self.dimension]
    }
}

/// The resolved keys for a curve.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveKeys<'a> {
    /// A constant value for the entire clip.
    Static(KeyValue),
    /// A run of keys borrowed from the anim key data.
    Keyed(KeyStream<'a>),
}

/// A view of consecutive keys in the anim key data.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyStream<'a> {
    data: &'a [u8],
    format: AnimKeyFormat,
}

impl<'a> KeyStream<'a> {
    pub fn format(&self) -> AnimKeyFormat {
        self.format
    }

    /// The number of keys in the run.
    pub fn len(&self) -> usize {
        self.data.len() / self.format.size_in_bytes() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes of the keys.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The key at `index` or [None] if the index is past the end of the run.
    pub fn key(&self, index: usize) -> Option<KeyValue> {
        let size = self.format.size_in_bytes() as usize;
        let start = index.checked_mul(size)?;
        let bytes = self.data.get(start..start.checked_add(size)?)?;
        read_key(self.format, bytes).ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = KeyValue> + 'a {
        let stream = self.clone();
        (0..self.len()).filter_map(move |i| stream.key(i))
    }
}

fn read_key(format: AnimKeyFormat, bytes: &[u8]) -> BinResult<KeyValue> {
    let mut reader = Cursor::new(bytes);
    let mut values = [0f32; 4];
    for v in values.iter_mut().take(format.dimension()) {
        *v = reader.read_le::<f32>()?;
    }
    Ok(KeyValue {
        values,
        dimension: format.dimension(),
    })
}

/// Resolves curves against the anim key data of a single container.
#[derive(Debug, Clone)]
pub struct AnimKeyResolver<'a> {
    anim_key_data: &'a [u8],
    clips: &'a [AnimClip],
    curves: &'a [AnimCurve],
    components: &'a [AnimKeyComponent],
    /// Sorted and deduplicated offsets of every keyed curve.
    key_offsets: Vec<usize>,
    key_count: KeyCount,
}

impl<'a> AnimKeyResolver<'a> {
    /// Creates a resolver using [KeyCount::UntilNextCurve].
    pub fn new(orb: &'a Orb) -> Self {
        let key_offsets = orb
            .anim_curves
            .iter()
            .filter(|c| c.key_offset >= 0)
            .map(|c| c.key_offset as usize)
            .sorted_unstable()
            .dedup()
            .collect();

        Self {
            anim_key_data: &orb.anim_key_data,
            clips: &orb.anim_clips,
            curves: &orb.anim_curves,
            components: &orb.anim_key_components,
            key_offsets,
            key_count: KeyCount::default(),
        }
    }

    pub fn with_key_count(mut self, key_count: KeyCount) -> Self {
        self.key_count = key_count;
        self
    }

    /// Resolves the curve at `position` within the clip at index `clip`.
    pub fn resolve_clip_curve(
        &self,
        clip: usize,
        position: usize,
    ) -> Result<CurveKeys<'a>, AnimKeyError> {
        let missing = || AnimKeyError::MissingCurve { clip, position };
        let anim_clip = self.clips.get(clip).ok_or_else(missing)?;
        if position >= anim_clip.num_curves as usize {
            return Err(missing());
        }

        let curve = self
            .curves
            .get(anim_clip.first_curve as usize + position)
            .ok_or_else(missing)?;
        let component = self.components.get(position).ok_or_else(missing)?;
        self.resolve(curve, component, anim_clip.key_duration)
    }

    /// Resolves `curve` using the key format of `component`.
    /// Static curves return the first [dimension](AnimKeyFormat::dimension) values of the static key.
    pub fn resolve(
        &self,
        curve: &AnimCurve,
        component: &AnimKeyComponent,
        key_duration: f32,
    ) -> Result<CurveKeys<'a>, AnimKeyError> {
        let format = component.key_format()?;

        if curve.is_static() {
            return Ok(CurveKeys::Static(static_value(&curve.static_key, format)));
        }

        let key_size = format.size_in_bytes() as usize;
        let out_of_bounds = |size: usize| AnimKeyError::OutOfBounds {
            offset: curve.key_offset as i64,
            size: size as u64,
            anim_key_data_size: self.anim_key_data.len(),
        };
        if curve.key_offset < 0 {
            return Err(out_of_bounds(key_size));
        }

        let start = curve.key_offset as usize;
        let count = match self.key_count {
            KeyCount::UntilNextCurve => {
                let end = self
                    .key_offsets
                    .iter()
                    .find(|o| **o > start)
                    .copied()
                    .unwrap_or(self.anim_key_data.len())
                    .min(self.anim_key_data.len());
                end.saturating_sub(start) / key_size
            }
            KeyCount::Fixed(count) => count,
            KeyCount::SampleRate(hz) => (key_duration * hz).round().max(0.0) as usize,
        };

        let size = count.saturating_mul(key_size);
        let data = start
            .checked_add(size)
            .and_then(|end| self.anim_key_data.get(start..end))
            .ok_or_else(|| out_of_bounds(size))?;

        Ok(CurveKeys::Keyed(KeyStream { data, format }))
    }
}

fn static_value(value: &Vector4, format: AnimKeyFormat) -> KeyValue {
    KeyValue {
        values: value.to_array(),
        dimension: format.dimension(),
    }
}
