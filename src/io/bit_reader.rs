// src/io/bit_reader.rs

//! MSB-first bit extraction, the mirror image of [`super::bit_writer::BitWriter`].

use crate::utils::error::Result;
use byteorder::ReadBytesExt;
use std::io::Read;

pub struct BitReader<R: Read> {
    reader: R,
    current: u8,
    remaining: u8,
    bits_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            current: 0,
            remaining: 0,
            bits_read: 0,
        }
    }

    /// Reads one bit. Running off the end of the input is an `UnexpectedEof` I/O error.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.remaining == 0 {
            self.current = self.reader.read_u8()?;
            self.remaining = 8;
        }
        self.remaining -= 1;
        self.bits_read += 1;
        Ok((self.current >> self.remaining) & 1 == 1)
    }

    /// Reads a `width`-bit field, most significant bit first. Only the low 32
    /// bits of wider fields are kept.
    pub fn read_bits(&mut self, width: u32) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..width {
            value = value.wrapping_shl(1) | self.read_bit()? as u32;
        }
        Ok(value)
    }

    /// Skips to the next byte boundary.
    pub fn align(&mut self) {
        self.bits_read += self.remaining as u64;
        self.remaining = 0;
    }

    #[inline]
    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }
}
