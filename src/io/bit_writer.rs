// src/io/bit_writer.rs

//! MSB-first bit packing on top of any byte sink.
//!
//! Bits are staged in a `BitVec<u8, Msb0>`, so the first bit written lands in the
//! most significant position of the first byte. Whole bytes are drained to the
//! sink periodically and on [`BitWriter::flush`]; a trailing partial byte stays
//! staged until [`BitWriter::flush_bits`] pads it.

use crate::utils::error::Result;
use bitvec::prelude::*;
use std::io::Write;

/// Staged bits are drained once this many have accumulated.
const DRAIN_THRESHOLD: usize = 4096 * 8;

pub struct BitWriter<W: Write> {
    sink: W,
    pending: BitVec<u8, Msb0>,
    bits_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pending: BitVec::with_capacity(DRAIN_THRESHOLD + 8),
            bits_written: 0,
        }
    }

    /// Appends a single bit.
    #[inline]
    pub fn put_bit(&mut self, bit: bool) -> Result<()> {
        self.pending.push(bit);
        self.bits_written += 1;
        if self.pending.len() >= DRAIN_THRESHOLD {
            self.drain_bytes()?;
        }
        Ok(())
    }

    /// Appends the low `width` bits of `value`, most significant first.
    ///
    /// Positions above bit 31 are emitted as zeros, so a `width` wider than
    /// `value` behaves like zero-extension rather than dropping bits.
    pub fn put_bits(&mut self, value: u32, width: u32) -> Result<()> {
        for shift in (0..width).rev() {
            let bit = shift < u32::BITS && (value >> shift) & 1 == 1;
            self.put_bit(bit)?;
        }
        Ok(())
    }

    /// Pads the current partial byte with zero bits. Does not terminate the stream.
    pub fn flush_bits(&mut self) -> Result<()> {
        while !self.is_byte_aligned() {
            self.put_bit(false)?;
        }
        Ok(())
    }

    /// Writes every complete staged byte and flushes the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.drain_bytes()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Total number of bits appended so far, padding included.
    #[inline]
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    #[inline]
    pub fn is_byte_aligned(&self) -> bool {
        self.pending.len() % 8 == 0
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flushes and hands back the sink. Unpadded trailing bits are discarded,
    /// so call [`BitWriter::flush_bits`] first.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    fn drain_bytes(&mut self) -> Result<()> {
        let whole = self.pending.len() - self.pending.len() % 8;
        if whole == 0 {
            return Ok(());
        }
        let tail = self.pending.split_off(whole);
        let full = std::mem::replace(&mut self.pending, tail);
        self.sink.write_all(full.as_raw_slice())?;
        Ok(())
    }
}
