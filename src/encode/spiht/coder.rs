// src/encode/spiht/coder.rs

//! Bit-plane significance coder (set partitioning in hierarchical trees).
//!
//! A payload starts with the top bit-plane index as a [`PLANE_FIELD_BITS`]-bit
//! field, followed by alternating sorting and refinement passes from that plane
//! down to plane 0. Every bit, the plane field included, counts against the
//! budget; coding stops at the first bit that would exceed it, so any prefix of a
//! payload is itself a valid lower-rate payload.
//!
//! Bit conventions: significance and set-significance bits are `1` when the
//! magnitude (or some magnitude in the set) is at least `2^n`; sign bits are `1`
//! for negative coefficients; refinement bits are bit `n` of the magnitude.

use super::lists::{SetEntry, WorkLists};
use super::tree::{Coord, SpatialTree};
use crate::image::raster::Plane;
use crate::io::bit_writer::BitWriter;
use crate::utils::error::{ImsError, Result};
use log::{debug, trace};
use std::collections::VecDeque;
use std::io::Write;

/// Width of the top bit-plane field at the start of every payload.
pub const PLANE_FIELD_BITS: u32 = 5;

/// Outcome of coding one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodingStats {
    /// Payload bits written, never more than the budget.
    pub bits_emitted: u64,
    /// Index of the first bit-plane coded.
    pub top_plane: u32,
    /// Bit-planes whose sorting and refinement passes both finished.
    pub planes_completed: u32,
    /// Whether coding stopped on the budget rather than after plane 0.
    pub budget_exhausted: bool,
    /// Coefficients found significant.
    pub significant: usize,
}

/// Why a pass stopped early.
enum Interrupt {
    Budget,
    Failed(ImsError),
}

impl From<ImsError> for Interrupt {
    fn from(err: ImsError) -> Self {
        Interrupt::Failed(err)
    }
}

type PassResult<T = ()> = std::result::Result<T, Interrupt>;

/// Bit sink that refuses to go past its budget.
struct BudgetedBits<'a, W: Write> {
    writer: &'a mut BitWriter<W>,
    budget: u64,
    used: u64,
}

impl<'a, W: Write> BudgetedBits<'a, W> {
    fn new(writer: &'a mut BitWriter<W>, budget: u64) -> Self {
        Self {
            writer,
            budget,
            used: 0,
        }
    }

    #[inline]
    fn emit(&mut self, bit: bool) -> PassResult {
        if self.used >= self.budget {
            return Err(Interrupt::Budget);
        }
        self.writer.put_bit(bit)?;
        self.used += 1;
        Ok(())
    }

    fn emit_field(&mut self, value: u32, width: u32) -> PassResult {
        for shift in (0..width).rev() {
            self.emit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }
}

/// Largest descendant magnitude of every coefficient (0 for leaves).
fn descendant_maxima(tree: &SpatialTree, coeffs: &[i32]) -> Vec<i32> {
    let mut desc_max = vec![0i32; coeffs.len()];
    // Children always sit later in raster order than their parent.
    for idx in (0..coeffs.len()).rev() {
        let coord = (idx % tree.width(), idx / tree.width());
        let mut max = 0;
        for child in tree.children(coord) {
            let ci = tree.index(child);
            debug_assert!(ci > idx);
            max = max.max(coeffs[ci].abs()).max(desc_max[ci]);
        }
        desc_max[idx] = max;
    }
    desc_max
}

pub struct SpihtEncoder {
    tree: SpatialTree,
    coeffs: Vec<i32>,
    desc_max: Vec<i32>,
    lists: WorkLists,
    top_plane: u32,
}

impl SpihtEncoder {
    /// Takes a normalized coefficient plane. Magnitudes beyond `i32` saturate.
    pub fn new(plane: &Plane, num_stages: u32) -> Self {
        let tree = SpatialTree::new(plane.width(), plane.height(), num_stages);
        let coeffs: Vec<i32> = plane
            .samples()
            .iter()
            .map(|&v| (v as i32).max(-i32::MAX))
            .collect();
        let desc_max = descendant_maxima(&tree, &coeffs);
        let max = coeffs.iter().map(|c| c.abs()).max().unwrap_or(0);
        let top_plane = if max > 0 { max.ilog2() } else { 0 };
        let lists = WorkLists::seeded(&tree);

        SpihtEncoder {
            tree,
            coeffs,
            desc_max,
            lists,
            top_plane,
        }
    }

    pub fn top_plane(&self) -> u32 {
        self.top_plane
    }

    /// Codes the plane into `out`, writing at most `budget` bits.
    pub fn encode<W: Write>(mut self, budget: u64, out: &mut BitWriter<W>) -> Result<CodingStats> {
        let mut bits = BudgetedBits::new(out, budget);
        let mut stats = CodingStats {
            top_plane: self.top_plane,
            ..Default::default()
        };

        match self.run(&mut bits, &mut stats) {
            Ok(()) => {}
            Err(Interrupt::Budget) => stats.budget_exhausted = true,
            Err(Interrupt::Failed(err)) => return Err(err),
        }
        stats.bits_emitted = bits.used;
        stats.significant = self.lists.lsp.len();

        debug!(
            "SPIHT: {} of {} bits, top plane {}, {} plane(s) complete, {} significant",
            stats.bits_emitted, budget, stats.top_plane, stats.planes_completed, stats.significant
        );
        Ok(stats)
    }

    fn run<W: Write>(&mut self, bits: &mut BudgetedBits<'_, W>, stats: &mut CodingStats) -> PassResult {
        bits.emit_field(self.top_plane, PLANE_FIELD_BITS)?;
        for plane in (0..=self.top_plane).rev() {
            let refine_count = self.lists.lsp.len();
            self.sorting_pass(plane, bits)?;
            self.refinement_pass(plane, refine_count, bits)?;
            stats.planes_completed += 1;
            trace!(
                "plane {} done at {} bits: lip={} lis={} lsp={}",
                plane,
                bits.used,
                self.lists.lip.len(),
                self.lists.lis.len(),
                self.lists.lsp.len()
            );
        }
        Ok(())
    }

    #[inline]
    fn coeff(&self, coord: Coord) -> i32 {
        self.coeffs[self.tree.index(coord)]
    }

    /// Emits the significance bit (and sign when significant) of one coefficient.
    fn code_pixel<W: Write>(
        &self,
        coord: Coord,
        threshold: i32,
        bits: &mut BudgetedBits<'_, W>,
    ) -> PassResult<bool> {
        let c = self.coeff(coord);
        let significant = c.abs() >= threshold;
        bits.emit(significant)?;
        if significant {
            bits.emit(c < 0)?;
        }
        Ok(significant)
    }

    fn sorting_pass<W: Write>(&mut self, plane: u32, bits: &mut BudgetedBits<'_, W>) -> PassResult {
        let threshold = 1i32 << plane;

        let lip = std::mem::take(&mut self.lists.lip);
        let mut insignificant = Vec::with_capacity(lip.len());
        for coord in lip {
            if self.code_pixel(coord, threshold, bits)? {
                self.lists.lsp.push(coord);
            } else {
                insignificant.push(coord);
            }
        }
        self.lists.lip = insignificant;

        // Entries appended while splitting are visited in this same pass.
        let mut pending: VecDeque<SetEntry> = std::mem::take(&mut self.lists.lis).into();
        let mut kept = Vec::with_capacity(pending.len());
        while let Some(entry) = pending.pop_front() {
            match entry {
                SetEntry::Descendants(root) => {
                    let significant = self.desc_max[self.tree.index(root)] >= threshold;
                    bits.emit(significant)?;
                    if !significant {
                        kept.push(entry);
                        continue;
                    }
                    for child in self.tree.children(root) {
                        if self.code_pixel(child, threshold, bits)? {
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
                    let max = self
                        .tree
                        .children(root)
                        .map(|c| self.desc_max[self.tree.index(c)])
                        .max()
                        .unwrap_or(0);
                    let significant = max >= threshold;
                    bits.emit(significant)?;
                    if !significant {
                        kept.push(entry);
                        continue;
                    }
                    pending.extend(self.tree.children(root).map(SetEntry::Descendants));
                }
            }
        }
        self.lists.lis = kept;
        Ok(())
    }

    /// Refines the first `refine_count` significant coefficients, i.e. those
    /// found on earlier planes.
    fn refinement_pass<W: Write>(
        &self,
        plane: u32,
        refine_count: usize,
        bits: &mut BudgetedBits<'_, W>,
    ) -> PassResult {
        for &coord in &self.lists.lsp[..refine_count] {
            let magnitude = self.coeff(coord).unsigned_abs();
            bits.emit((magnitude >> plane) & 1 == 1)?;
        }
        Ok(())
    }
}
