//! XDR primitives (RFC 4506) used by the GROMACS trajectory formats.
//!
//! All values are big-endian and every item occupies a multiple of four
//! bytes. Readers operate on an in-memory slice and return `None` when the
//! slice runs out, leaving it to the caller to decide whether that means a
//! truncated file.

use std::io::{self, Write};

/// Length of `n` bytes of opaque data once padded to the XDR 4-byte unit.
#[inline]
pub fn padded_len(n: usize) -> usize {
    n.div_ceil(4) * 4
}

pub fn write_i32(w: &mut impl Write, v: i32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

pub fn write_f32(w: &mut impl Write, v: f32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

/// Writes an XDR string: u32 length, the bytes, then zero padding.
pub fn write_string(w: &mut impl Write, s: &str) -> io::Result<()> {
    let bytes = s.as_bytes();
    w.write_all(&(bytes.len() as u32).to_be_bytes())?;
    w.write_all(bytes)?;
    let pad = padded_len(bytes.len()) - bytes.len();
    w.write_all(&[0u8; 3][..pad])
}

/// Sequential reader over an XDR-encoded byte slice.
#[derive(Debug, Clone)]
pub struct XdrSlice<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrSlice<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buf.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.take::<4>().map(i32::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Option<f32> {
        self.take::<4>().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> Option<f64> {
        self.take::<8>().map(f64::from_be_bytes)
    }

    /// Reads a real of `width` bytes (4 or 8), narrowing doubles to `f32`.
    pub fn read_real(&mut self, width: usize) -> Option<f32> {
        match width {
            4 => self.read_f32(),
            8 => self.read_f64().map(|v| v as f32),
            _ => None,
        }
    }

    /// Reads an XDR string and returns its raw bytes (padding skipped).
    pub fn read_string(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        let len = self.take::<4>().map(u32::from_be_bytes)? as usize;
        let bytes = self.read_opaque(len);
        if bytes.is_none() {
            self.pos = start;
        }
        bytes
    }

    /// Reads `len` bytes of fixed-length opaque data and skips its padding.
    pub fn read_opaque(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.buf.get(self.pos..self.pos.checked_add(len)?)?;
        self.skip(padded_len(len))?;
        Some(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Option<()> {
        if self.remaining() < n {
            return None;
        }
        self.pos += n;
        Some(())
    }
}
