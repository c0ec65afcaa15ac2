// tests/common/mod.rs

//! Test-side decoder that mirrors the significance coder bit for bit.
//!
//! Reconstruction is the lower end of each coefficient's known interval
//! (`sign * sum of decoded magnitude bits`), so every extra payload bit can only
//! move an estimate toward its true value.

#![allow(dead_code)]

use ims_encoder::encode::spiht::{PLANE_FIELD_BITS, SetEntry, SpatialTree, WorkLists};
use ims_encoder::encode::wavelet::prepare_component;
use ims_encoder::image::{ImageSource, Raster};
use ims_encoder::io::BitReader;
use ims_encoder::ImsHeader;
use std::collections::VecDeque;
use std::io::Read;

pub struct DecodedImage {
    pub header: ImsHeader,
    /// Reconstructed coefficients per component, padded row-major.
    pub components: Vec<Vec<i32>>,
    /// Payload bits consumed per component.
    pub payload_bits: Vec<u64>,
}

/// Parses a whole IMS stream.
pub fn decode(bytes: &[u8]) -> DecodedImage {
    let mut reader = BitReader::new(bytes);
    let header = ImsHeader::read_from(&mut reader).expect("header");
    let width = header.size_x + header.extra_x;
    let height = header.size_y + header.extra_y;

    let mut components = Vec::new();
    let mut payload_bits = Vec::new();
    for &budget in &header.budgets {
        let (values, used) = decode_payload(&mut reader, width, height, header.num_stages, budget);
        components.push(values);
        payload_bits.push(used);
    }
    DecodedImage {
        header,
        components,
        payload_bits,
    }
}

struct Bits<'a, R: Read> {
    input: &'a mut BitReader<R>,
    left: u64,
    used: u64,
}

impl<R: Read> Bits<'_, R> {
    fn next(&mut self) -> Option<bool> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        self.used += 1;
        Some(self.input.read_bit().expect("stream ended inside a payload"))
    }
}

struct Mirror {
    tree: SpatialTree,
    values: Vec<i32>,
    lists: WorkLists,
}

impl Mirror {
    fn pixel<R: Read>(&mut self, coord: (usize, usize), threshold: i32, bits: &mut Bits<'_, R>) -> Option<bool> {
        if !bits.next()? {
            return Some(false);
        }
        let negative = bits.next()?;
        self.values[self.tree.index(coord)] = if negative { -threshold } else { threshold };
        Some(true)
    }

    fn run<R: Read>(&mut self, bits: &mut Bits<'_, R>) -> Option<()> {
        let mut top = 0u32;
        for _ in 0..PLANE_FIELD_BITS {
            top = top << 1 | bits.next()? as u32;
        }

        for plane in (0..=top).rev() {
            let threshold = 1i32 << plane;
            let refine_count = self.lists.lsp.len();

            let lip = std::mem::take(&mut self.lists.lip);
            for coord in lip {
                if self.pixel(coord, threshold, bits)? {
                    self.lists.lsp.push(coord);
                } else {
                    self.lists.lip.push(coord);
                }
            }

            let mut pending: VecDeque<SetEntry> = std::mem::take(&mut self.lists.lis).into();
            while let Some(entry) = pending.pop_front() {
                if !bits.next()? {
                    self.lists.lis.push(entry);
                    continue;
                }
                match entry {
                    SetEntry::Descendants(root) => {
                        for child in self.tree.children(root) {
                            if self.pixel(child, threshold, bits)? {
                                self.lists.lsp.push(child);
                            } else {
                                self.lists.lip.push(child);
                            }
                        }
                        if self.tree.has_grandchildren(root) {
                            pending.push_back(SetEntry::Grandchildren(root));
                        }
                    }
                    SetEntry::Grandchildren(root) => {
                        pending.extend(self.tree.children(root).map(SetEntry::Descendants));
                    }
                }
            }

            for i in 0..refine_count {
                let idx = self.tree.index(self.lists.lsp[i]);
                if bits.next()? {
                    let v = self.values[idx];
                    self.values[idx] = if v < 0 { v - threshold } else { v + threshold };
                }
            }
        }
        Some(())
    }
}

/// Decodes one payload of at most `budget` bits.
pub fn decode_payload<R: Read>(
    input: &mut BitReader<R>,
    width: usize,
    height: usize,
    num_stages: u32,
    budget: u64,
) -> (Vec<i32>, u64) {
    let tree = SpatialTree::new(width, height, num_stages);
    let mut mirror = Mirror {
        tree,
        values: vec![0; width * height],
        lists: WorkLists::seeded(&tree),
    };
    let mut bits = Bits {
        input,
        left: budget,
        used: 0,
    };
    let _ = mirror.run(&mut bits);
    let used = bits.used;
    (mirror.values, used)
}

/// The coefficients the encoder codes for `source`, computed through the
/// public preparation steps.
pub fn reference_coefficients<S: ImageSource + ?Sized>(source: &S, num_stages: u32) -> Vec<Vec<i32>> {
    let mut raster = Raster::from_source(source, num_stages).expect("valid source");
    let mut scratch = raster.like();
    raster
        .planes_mut()
        .iter_mut()
        .zip(scratch.planes_mut().iter_mut())
        .map(|(plane, tmp)| {
            prepare_component(plane, tmp, num_stages);
            plane.samples().iter().map(|&v| v as i32).collect()
        })
        .collect()
}

/// Sum of squared coefficient errors over all components.
pub fn squared_error(decoded: &[Vec<i32>], reference: &[Vec<i32>]) -> u128 {
    decoded
        .iter()
        .zip(reference)
        .flat_map(|(d, r)| d.iter().zip(r))
        .map(|(&d, &r)| {
            let e = (d as i64 - r as i64).unsigned_abs() as u128;
            e * e
        })
        .sum()
}
