// src/encode/container.rs

//! The IMS container: header, per-component budgets and DC offsets, then one
//! significance-coded payload per component, padded to a byte boundary.
//!
//! All fields are written MSB first with no byte alignment between them:
//!
//! | field                | bits        |
//! |----------------------|-------------|
//! | `'I' 'M' 'S'`        | 8 each      |
//! | stages               | 6           |
//! | size_x, size_y       | 12 each     |
//! | extra_x, extra_y     | 10 each     |
//! | is_color             | 1           |
//! | budget per component | 29 each     |
//! | DC per component     | 8 each      |
//! | payloads             | <= budget   |
//! | zero padding         | 0..7        |

use crate::encode::spiht::{CodingStats, SpihtEncoder};
use crate::encode::wavelet::prepare_component;
use crate::image::raster::{Plane, Raster};
use crate::image::source::ImageSource;
use crate::io::bit_reader::BitReader;
use crate::io::bit_writer::BitWriter;
use crate::io::sink::FileSink;
use crate::utils::error::{ImsError, Result};
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::path::Path;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub const MAGIC: [u8; 3] = *b"IMS";

pub const STAGES_BITS: u32 = 6;
pub const SIZE_BITS: u32 = 12;
pub const EXTRA_BITS: u32 = 10;
pub const BUDGET_BITS: u32 = 29;
pub const DC_BITS: u32 = 8;

/// Largest logical width or height.
pub const MAX_DIMENSION: usize = (1 << SIZE_BITS) - 1;
/// Largest decomposition stage count; keeps padding inside [`EXTRA_BITS`].
pub const MAX_STAGES: u32 = 10;
/// Largest per-component budget.
pub const MAX_BUDGET: u64 = (1 << BUDGET_BITS) - 1;

/// Share of the bit budget given to luma and the two chroma components.
pub const COLOR_RATE_SPLIT: [f64; 3] = [0.6, 0.2, 0.2];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImsHeader {
    pub num_stages: u32,
    pub size_x: usize,
    pub size_y: usize,
    pub extra_x: usize,
    pub extra_y: usize,
    pub is_color: bool,
    /// Payload budget in bits, one per component.
    pub budgets: Vec<u64>,
    /// Low 8 bits of each component's DC offset.
    pub dc: Vec<u8>,
}

impl ImsHeader {
    pub fn num_components(&self) -> usize {
        if self.is_color { 3 } else { 1 }
    }

    /// Header length in bits.
    pub fn bit_len(&self) -> u64 {
        let fixed = 3 * 8 + STAGES_BITS + 2 * SIZE_BITS + 2 * EXTRA_BITS + 1;
        fixed as u64 + self.num_components() as u64 * (BUDGET_BITS + DC_BITS) as u64
    }

    pub fn write_to<W: Write>(&self, out: &mut BitWriter<W>) -> Result<()> {
        let components = self.num_components();
        if self.budgets.len() != components || self.dc.len() != components {
            return Err(ImsError::InvalidArg(format!(
                "header for {} component(s) carries {} budget(s) and {} DC value(s)",
                components,
                self.budgets.len(),
                self.dc.len()
            )));
        }

        for &b in &MAGIC {
            out.put_bits(b as u32, 8)?;
        }
        out.put_bits(self.num_stages, STAGES_BITS)?;
        out.put_bits(self.size_x as u32, SIZE_BITS)?;
        out.put_bits(self.size_y as u32, SIZE_BITS)?;
        out.put_bits(self.extra_x as u32, EXTRA_BITS)?;
        out.put_bits(self.extra_y as u32, EXTRA_BITS)?;
        out.put_bit(self.is_color)?;
        for &budget in &self.budgets {
            out.put_bits(budget.min(MAX_BUDGET) as u32, BUDGET_BITS)?;
        }
        for &dc in &self.dc {
            out.put_bits(dc as u32, DC_BITS)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut BitReader<R>) -> Result<Self> {
        let mut magic = [0u8; 3];
        for b in magic.iter_mut() {
            *b = input.read_bits(8)? as u8;
        }
        if magic != MAGIC {
            return Err(ImsError::Format(format!(
                "bad magic {:02x?}, expected {:02x?}",
                magic, MAGIC
            )));
        }

        let num_stages = input.read_bits(STAGES_BITS)?;
        let size_x = input.read_bits(SIZE_BITS)? as usize;
        let size_y = input.read_bits(SIZE_BITS)? as usize;
        let extra_x = input.read_bits(EXTRA_BITS)? as usize;
        let extra_y = input.read_bits(EXTRA_BITS)? as usize;
        let is_color = input.read_bit()?;
        let components = if is_color { 3 } else { 1 };

        let mut budgets = Vec::with_capacity(components);
        for _ in 0..components {
            budgets.push(input.read_bits(BUDGET_BITS)? as u64);
        }
        let mut dc = Vec::with_capacity(components);
        for _ in 0..components {
            dc.push(input.read_bits(DC_BITS)? as u8);
        }

        Ok(ImsHeader {
            num_stages,
            size_x,
            size_y,
            extra_x,
            extra_y,
            is_color,
            budgets,
            dc,
        })
    }
}

/// Per-component budgets: `ceil(bit_rate * size * share)`, clamped to [`MAX_BUDGET`].
pub fn component_budgets(bit_rate: f32, size: usize, is_color: bool) -> Vec<u64> {
    let shares: &[f64] = if is_color { &COLOR_RATE_SPLIT } else { &[1.0] };
    shares
        .iter()
        .map(|share| {
            let bits = (bit_rate as f64 * size as f64 * share).ceil();
            if bits >= MAX_BUDGET as f64 {
                MAX_BUDGET
            } else {
                bits as u64
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderParams {
    /// Target bits per logical sample, shared out across components.
    pub bit_rate: f32,
    /// Decomposition stages; `None` asks the source.
    pub num_stages: Option<u32>,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            bit_rate: 1.0,
            num_stages: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub header: ImsHeader,
    pub components: Vec<CodingStats>,
    /// Bits written to the sink, header and padding included.
    pub total_bits: u64,
}

impl EncodeSummary {
    pub fn total_bytes(&self) -> u64 {
        self.total_bits / 8
    }
}

/// Header plus transformed coefficients, ready to be coded.
struct Prepared {
    header: ImsHeader,
    raster: Raster,
}

pub struct ImsEncoder {
    params: EncoderParams,
}

impl ImsEncoder {
    pub fn new(params: EncoderParams) -> Self {
        Self { params }
    }

    /// Encodes `source` into `sink`. Nothing is written unless the source and
    /// parameters are valid.
    pub fn encode<S, W>(&self, source: &S, sink: W) -> Result<EncodeSummary>
    where
        S: ImageSource + ?Sized,
        W: Write,
    {
        let prepared = self.prepare(source)?;
        Self::write(prepared, sink)
    }

    /// Encodes `source` into a new file at `path`. The file is only created
    /// once the image has been validated and transformed.
    pub fn encode_file<S>(&self, source: &S, path: impl AsRef<Path>) -> Result<EncodeSummary>
    where
        S: ImageSource + ?Sized,
    {
        let prepared = self.prepare(source)?;
        let sink = FileSink::create(path)?;
        info!("Writing IMS stream to {}", sink.path().display());
        Self::write(prepared, sink)
    }

    fn prepare<S: ImageSource + ?Sized>(&self, source: &S) -> Result<Prepared> {
        let bit_rate = self.params.bit_rate;
        if !bit_rate.is_finite() || bit_rate < 0.0 {
            return Err(ImsError::InvalidArg(format!(
                "bit rate must be finite and non-negative, got {}",
                bit_rate
            )));
        }
        let num_stages = self.params.num_stages.unwrap_or_else(|| source.num_stages());

        let mut raster = Raster::from_source(source, num_stages)?;
        let mut scratch = raster.like();
        let dcs = prepare_planes(raster.planes_mut(), scratch.planes_mut(), num_stages);
        drop(scratch);

        let dc = dcs
            .iter()
            .enumerate()
            .map(|(component, &dc)| {
                if !(0..=255).contains(&dc) {
                    warn!(
                        "DC offset {} of component {} does not fit {} bits; storing {}",
                        dc, component, DC_BITS, dc as u8
                    );
                }
                dc as u8
            })
            .collect();

        let header = ImsHeader {
            num_stages,
            size_x: raster.size_x(),
            size_y: raster.size_y(),
            extra_x: raster.extra_x(),
            extra_y: raster.extra_y(),
            is_color: raster.is_color(),
            budgets: component_budgets(bit_rate, raster.get_size(), raster.is_color()),
            dc,
        };
        debug!("IMS header: {:?}", header);
        Ok(Prepared { header, raster })
    }

    fn write<W: Write>(prepared: Prepared, sink: W) -> Result<EncodeSummary> {
        let Prepared { header, raster } = prepared;
        let mut out = BitWriter::new(sink);
        header.write_to(&mut out)?;

        let mut components = Vec::with_capacity(header.num_components());
        for (component, &budget) in header.budgets.iter().enumerate() {
            let stats = SpihtEncoder::new(raster.plane(component), header.num_stages)
                .encode(budget, &mut out)?;
            debug!(
                "Component {}: {} of {} bits",
                component, stats.bits_emitted, budget
            );
            components.push(stats);
        }

        out.flush_bits()?;
        out.flush()?;
        let total_bits = out.bits_written();

        info!(
            "Encoded {}x{} {} image, {} stage(s), {} bytes",
            header.size_x,
            header.size_y,
            if header.is_color { "color" } else { "grayscale" },
            header.num_stages,
            total_bits / 8
        );
        Ok(EncodeSummary {
            header,
            components,
            total_bits,
        })
    }
}

/// Runs level shift, transform and truncation on every component.
/// Returns the DC offsets in component order.
#[cfg(not(feature = "rayon"))]
fn prepare_planes(primary: &mut [Plane], scratch: &mut [Plane], num_stages: u32) -> Vec<i32> {
    primary
        .iter_mut()
        .zip(scratch.iter_mut())
        .map(|(p, s)| prepare_component(p, s, num_stages))
        .collect()
}

#[cfg(feature = "rayon")]
fn prepare_planes(primary: &mut [Plane], scratch: &mut [Plane], num_stages: u32) -> Vec<i32> {
    primary
        .par_iter_mut()
        .zip(scratch.par_iter_mut())
        .map(|(p, s)| prepare_component(p, s, num_stages))
        .collect()
}
