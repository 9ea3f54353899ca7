//! The shared pool of null terminated UTF-8 strings.
//!
//! Records never store text inline. Name fields store a [StringOffset] to the first byte of
//! the string in the pool, and the string extends up to the next null byte.
use std::collections::HashMap;

use thiserror::Error;

use crate::{round_up, StringOffset, SECTION_ALIGNMENT};

/// Errors while resolving a [StringOffset].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StringError {
    /// The offset does not point inside the pool.
    #[error("String offset {offset} is outside the string pool of {pool_size} bytes.")]
    OutOfBounds { offset: u32, pool_size: usize },

    /// No null terminator occurs between the offset and the end of the pool.
    #[error("String at offset {offset} is not null terminated before the end of the string pool.")]
    Unterminated { offset: u32 },

    /// The bytes before the null terminator are not valid UTF-8.
    #[error("String at offset {offset} is not valid UTF-8.")]
    InvalidUtf8 { offset: u32 },
}

/// Finds the string starting at `offset` in the string pool data `pool`.
/**
```rust
# use orb_lib::{resolve_string, StringOffset};
let pool = b"root\0hips\0";
assert_eq!(Ok("hips"), resolve_string(pool, StringOffset(5)));
assert_eq!(Ok("ips"), resolve_string(pool, StringOffset(6)));
```
*/
pub fn resolve_string(pool: &[u8], offset: StringOffset) -> Result<&str, StringError> {
    let bytes = pool
        .get(offset.0 as usize..)
        .filter(|b| !b.is_empty())
        .ok_or(StringError::OutOfBounds {
            offset: offset.0,
            pool_size: pool.len(),
        })?;

    let end = bytes
        .iter()
        .position(|b| *b == 0)
        .ok_or(StringError::Unterminated { offset: offset.0 })?;

    std::str::from_utf8(&bytes[..end]).map_err(|_| StringError::InvalidUtf8 { offset: offset.0 })
}

/// An append only builder for string pool data.
///
/// Identical strings share a single offset when deduplication is enabled.
/// Text after an interior null byte can't be resolved, so callers should avoid interning such strings.
#[derive(Debug, Clone)]
pub struct StringPool {
    data: Vec<u8>,
    offsets: HashMap<String, StringOffset>,
    deduplicate: bool,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    /// Creates an empty pool with deduplication enabled.
    pub fn new() -> Self {
        Self::with_deduplication(true)
    }

    /// Creates an empty pool.
    /// If `deduplicate` is `false`, every call to [intern](StringPool::intern) appends a new string.
    pub fn with_deduplication(deduplicate: bool) -> Self {
        Self {
            data: Vec::new(),
            offsets: HashMap::new(),
            deduplicate,
        }
    }

    /// Adds `text` to the pool and returns its offset.
    /**
    ```rust
    # use orb_lib::StringPool;
    let mut pool = StringPool::new();
    let a = pool.intern("diffuse");
    let b = pool.intern("normal");
    assert_eq!(a, pool.intern("diffuse"));
    assert_ne!(a, b);
    assert_eq!(Ok("normal"), pool.resolve(b));
    ```
    */
    pub fn intern(&mut self, text: &str) -> StringOffset {
        if self.deduplicate {
            if let Some(offset) = self.offsets.get(text) {
                return *offset;
            }
        }

        let offset = StringOffset(self.data.len() as u32);
        self.data.extend_from_slice(text.as_bytes());
        self.data.push(0u8);

        if self.deduplicate {
            self.offsets.insert(text.to_string(), offset);
        }
        offset
    }

    /// Finds the string starting at `offset`.
    pub fn resolve(&self, offset: StringOffset) -> Result<&str, StringError> {
        resolve_string(&self.data, offset)
    }

    /// The size in bytes of the strings added so far including null terminators.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the pool data padded with null bytes to a multiple of 4 bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut data = self.data;
        let padded_size = round_up(data.len() as u64, SECTION_ALIGNMENT as u64);
        data.resize(padded_size as usize, 0u8);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hexlit::hex;

    #[test]
    fn resolve_first_string() {
        assert_eq!(Ok("abc"), resolve_string(b"abc\0def\0", StringOffset(0)));
    }

    #[test]
    fn resolve_empty_string() {
        assert_eq!(Ok(""), resolve_string(b"abc\0\0\0\0\0", StringOffset(4)));
    }

    #[test]
    fn resolve_unterminated() {
        assert_eq!(
            Err(StringError::Unterminated { offset: 4 }),
            resolve_string(b"abc\0defg", StringOffset(4))
        );
    }

    #[test]
    fn resolve_out_of_bounds() {
        assert_eq!(
            Err(StringError::OutOfBounds {
                offset: 8,
                pool_size: 8
            }),
            resolve_string(b"abc\0def\0", StringOffset(8))
        );
        assert!(resolve_string(&[], StringOffset(0)).is_err());
    }

    #[test]
    fn resolve_invalid_utf8() {
        assert_eq!(
            Err(StringError::InvalidUtf8 { offset: 0 }),
            resolve_string(&[0xFF, 0xFE, 0x00, 0x00], StringOffset(0))
        );
    }

    #[test]
    fn intern_deduplicated() {
        let mut pool = StringPool::new();
        assert_eq!(StringOffset(0), pool.intern("root"));
        assert_eq!(StringOffset(5), pool.intern("hips"));
        assert_eq!(StringOffset(0), pool.intern("root"));
        assert_eq!(10, pool.len());
    }

    #[test]
    fn intern_without_deduplication() {
        let mut pool = StringPool::with_deduplication(false);
        assert_eq!(StringOffset(0), pool.intern("root"));
        assert_eq!(StringOffset(5), pool.intern("root"));
        assert_eq!(Ok("root"), pool.resolve(StringOffset(5)));
    }

    #[test]
    fn intern_empty_string() {
        let mut pool = StringPool::new();
        let offset = pool.intern("");
        assert_eq!(Ok(""), pool.resolve(offset));
        assert_eq!(1, pool.len());
    }

    #[test]
    fn into_bytes_padded() {
        let mut pool = StringPool::new();
        pool.intern("root");
        pool.intern("hips");
        assert_eq!(hex!("726F6F74 00686970 73000000").to_vec(), pool.into_bytes());
    }

    #[test]
    fn into_bytes_empty() {
        assert!(StringPool::new().into_bytes().is_empty());
    }
}
