// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Big-endian cursors over message payloads.

use super::Error;

/// Reads fields front to back from a received payload.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Take the next `N` bytes, or fail without advancing.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let end = self.pos.checked_add(N).ok_or(Error::PayloadTooShort)?;
        let bytes = self.buf.get(self.pos..end).ok_or(Error::PayloadTooShort)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    /// Bytes not yet consumed. Trailing DLC padding ends up here.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Writes fields front to back into an outgoing payload.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.pos.checked_add(bytes.len()).ok_or(Error::BufferTooSmall)?;
        let dst = self.buf.get_mut(self.pos..end).ok_or(Error::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// A fixed-width field that can appear in a message payload.
pub trait WireField: Sized {
    /// Encoded width in bytes.
    const SIZE: usize;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, Error>;
    fn write(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error>;
}

macro_rules! be_field {
    ($($ty:ty),*) => {$(
        impl WireField for $ty {
            const SIZE: usize = core::mem::size_of::<$ty>();

            #[inline]
            fn read(reader: &mut ByteReader<'_>) -> Result<Self, Error> {
                reader.take().map(<$ty>::from_be_bytes)
            }

            #[inline]
            fn write(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
                writer.put(&self.to_be_bytes())
            }
        }
    )*};
}

be_field!(u8, u16, u32, i32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0xff, 0xff, 0xff, 0xfe, 0x09];
        let mut r = ByteReader::new(&buf);
        assert_eq!(u32::read(&mut r), Ok(0x1234_5678));
        assert_eq!(i32::read(&mut r), Ok(-2));
        assert_eq!(u8::read(&mut r), Ok(9));
        assert_eq!(r.remaining(), 0);
        assert_eq!(u8::read(&mut r), Err(Error::PayloadTooShort));
    }

    #[test]
    fn short_read_does_not_advance() {
        let buf = [0x01, 0x02, 0x03];
        let mut r = ByteReader::new(&buf);
        assert_eq!(u32::read(&mut r), Err(Error::PayloadTooShort));
        assert_eq!(u16::read(&mut r), Ok(0x0102));
    }

    #[test]
    fn writer_refuses_to_overrun() {
        let mut buf = [0u8; 5];
        let mut w = ByteWriter::new(&mut buf);
        assert_eq!(0xdead_beefu32.write(&mut w), Ok(()));
        assert_eq!(0x1234u16.write(&mut w), Err(Error::BufferTooSmall));
        assert_eq!(0x7fu8.write(&mut w), Ok(()));
        assert_eq!(w.position(), 5);
        assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef, 0x7f]);
    }
}
