//! Bounds-checked little-endian cursor over a raw datagram.

use crate::error::DecodeError;

/// Sequential reader over a byte slice.
///
/// Every read is bounds checked; running off the end yields
/// [`DecodeError::TooShort`] with the datagram's actual length. The decoder
/// validates exact sizes against the catalogue before body parsing, so these
/// errors only fire on truncated input.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(DecodeError::TooShort { actual: self.data.len() })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    #[inline]
    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub(crate) fn i8(&mut self) -> Result<i8, DecodeError> {
        self.u8().map(|v| v as i8)
    }

    #[inline]
    pub(crate) fn u16_le(&mut self) -> Result<u16, DecodeError> {
        let s = self.take(2)?;
        Ok(u16::from_le_bytes([s[0], s[1]]))
    }

    #[inline]
    pub(crate) fn i16_le(&mut self) -> Result<i16, DecodeError> {
        self.u16_le().map(|v| v as i16)
    }

    #[inline]
    pub(crate) fn u32_le(&mut self) -> Result<u32, DecodeError> {
        let s = self.take(4)?;
        Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    #[inline]
    pub(crate) fn u64_le(&mut self) -> Result<u64, DecodeError> {
        let s = self.take(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(s);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads an `f32` exactly as transmitted. No normalization: the raw bit
    /// pattern is preserved so stored bytes replay bit-for-bit.
    #[inline]
    pub(crate) fn f32_le(&mut self) -> Result<f32, DecodeError> {
        let s = self.take(4)?;
        Ok(f32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub(crate) fn u8_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let s = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(s);
        Ok(arr)
    }

    pub(crate) fn u16_le_array<const N: usize>(&mut self) -> Result<[u16; N], DecodeError> {
        let mut arr = [0u16; N];
        for item in arr.iter_mut() {
            *item = self.u16_le()?;
        }
        Ok(arr)
    }

    pub(crate) fn f32_le_array<const N: usize>(&mut self) -> Result<[f32; N], DecodeError> {
        let mut arr = [0f32; N];
        for item in arr.iter_mut() {
            *item = self.f32_le()?;
        }
        Ok(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_advance_in_order() {
        let data = [0x34, 0x12, 0xff, 0x01, 0x00, 0x00, 0x00];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u16_le().unwrap(), 0x1234);
        assert_eq!(r.u8().unwrap(), 0xff);
        assert_eq!(r.u32_le().unwrap(), 1);
    }

    #[test]
    fn out_of_bounds_reports_datagram_length() {
        let data = [0u8; 3];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u32_le(), Err(DecodeError::TooShort { actual: 3 }));
    }

    #[test]
    fn f32_preserves_bit_pattern() {
        let bytes = 1.5f32.to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.f32_le().unwrap(), 1.5);

        let nan_bytes = [0x01, 0x00, 0xc0, 0x7f];
        let mut r = ByteReader::new(&nan_bytes);
        let v = r.f32_le().unwrap();
        assert_eq!(v.to_le_bytes(), nan_bytes);
    }
}
