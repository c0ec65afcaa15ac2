pub mod container;
pub mod spiht;
pub mod wavelet;

// Re-export commonly used encoding functionality
pub use container::{EncodeSummary, EncoderParams, ImsEncoder, ImsHeader};
pub use spiht::{CodingStats, SpihtEncoder};

// Re-export error types for convenience
pub use crate::utils::error::{ImsError, Result};
