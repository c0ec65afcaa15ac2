//! # IMS Encoder Library
//!
//! A wavelet still-image encoder. Each component is level shifted, decomposed
//! with the CDF 9/7 lifting transform, and coded bit-plane by bit-plane with a
//! set-partitioning significance coder until its share of the bit budget runs
//! out. The result is the embedded IMS bitstream: a small header followed by
//! one progressive payload per component.
//!
//! This library is organized into several modules:
//! - `utils`: error handling
//! - `io`: bit-level writer and reader, file sink
//! - `image`: image sources and padded component rasters
//! - `encode`: wavelet transform, significance coder and the IMS container
//!
//! ```no_run
//! use ims_encoder::{EncoderParams, ImsEncoder, PlanarImage};
//!
//! # fn main() -> ims_encoder::Result<()> {
//! let img = PlanarImage::gray(64, 64, vec![128.0; 64 * 64])?;
//! let encoder = ImsEncoder::new(EncoderParams { bit_rate: 0.5, ..Default::default() });
//! let summary = encoder.encode_file(&img, "out.ims")?;
//! println!("{} bytes", summary.total_bytes());
//! # Ok(())
//! # }
//! ```

// Re-export commonly used types at the crate root
pub use utils::error::{ImsError, Result};

// Core modules
pub mod utils {
    pub mod error;
}

pub mod io {
    pub mod bit_reader;
    pub mod bit_writer;
    pub mod sink;

    pub use bit_reader::BitReader;
    pub use bit_writer::BitWriter;
    pub use sink::FileSink;
}

pub mod image {
    pub mod raster;
    pub mod source;

    pub use raster::{Plane, Raster};
    pub use source::{ImageSource, PlanarImage, default_num_stages};
}

pub mod encode;

// Public API exports
pub use crate::encode::container::{
    EncodeSummary, EncoderParams, ImsEncoder, ImsHeader, component_budgets,
};
pub use crate::encode::spiht::CodingStats;
pub use crate::image::source::{ImageSource, PlanarImage};

// Constants
pub const IMS_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const IMS_MAGIC: [u8; 3] = encode::container::MAGIC;
