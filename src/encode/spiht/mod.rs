// src/encode/spiht/mod.rs

pub mod coder;
pub mod lists;
pub mod tree;

pub use coder::{CodingStats, SpihtEncoder, PLANE_FIELD_BITS};
pub use lists::{SetEntry, WorkLists};
pub use tree::{Coord, SpatialTree};
