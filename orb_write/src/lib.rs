use std::io::Write;

pub use orb_write_derive::OrbWrite;

/// A trait for writing types that are part of the ORB container.
/// All values are written in little-endian byte order with no implicit alignment.
pub trait OrbWrite {
    /// Writes the byte representation of `self` to `writer`.
    fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    /// The number of bytes written by [orb_write](crate::OrbWrite::orb_write).
    /// For records, this is the offset in bytes between successive elements of a table.
    fn size_in_bytes(&self) -> u64;
}

macro_rules! orb_write_impl {
    ($($id:ident),*) => {
        $(
            impl OrbWrite for $id {
                fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
                    writer.write_all(&self.to_le_bytes())?;
                    Ok(())
                }

                fn size_in_bytes(&self) -> u64 {
                    std::mem::size_of::<Self>() as u64
                }
            }
        )*
    }
}

orb_write_impl!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: OrbWrite, const N: usize> OrbWrite for [T; N] {
    fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_slice().orb_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        self.as_slice().size_in_bytes()
    }
}

impl<T: OrbWrite> OrbWrite for [T] {
    fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for element in self.iter() {
            element.orb_write(writer)?;
        }
        Ok(())
    }

    fn size_in_bytes(&self) -> u64 {
        self.iter().map(OrbWrite::size_in_bytes).sum()
    }
}

impl<T: OrbWrite> OrbWrite for Vec<T> {
    fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_slice().orb_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        self.as_slice().size_in_bytes()
    }
}

impl<T: OrbWrite + ?Sized> OrbWrite for &T {
    fn orb_write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        (**self).orb_write(writer)
    }

    fn size_in_bytes(&self) -> u64 {
        (**self).size_in_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_u32_little_endian() {
        let mut writer = Vec::new();
        0x4F524231u32.orb_write(&mut writer).unwrap();
        assert_eq!(vec![0x31, 0x42, 0x52, 0x4F], writer);
    }

    #[test]
    fn write_negative_i32() {
        let mut writer = Vec::new();
        (-1i32).orb_write(&mut writer).unwrap();
        assert_eq!(vec![0xFFu8; 4], writer);
    }

    #[test]
    fn write_f32_array() {
        let mut writer = Vec::new();
        [1.0f32, 2.0f32].orb_write(&mut writer).unwrap();
        assert_eq!(
            vec![0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x40],
            writer
        );
    }

    #[test]
    fn size_in_bytes_arrays() {
        assert_eq!(12, [0f32; 3].size_in_bytes());
        assert_eq!(0, Vec::<u32>::new().size_in_bytes());
        assert_eq!(6, vec![1u16, 2u16, 3u16].size_in_bytes());
    }
}
