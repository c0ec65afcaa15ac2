// src/encode/wavelet/mod.rs

pub mod constants;
pub mod prep;
pub mod transform;

pub use prep::{normalize, sub_dc};
pub use transform::{dwt2, dwt2full, lift_forward};

use crate::image::raster::Plane;

/// Level shift, `num_stages` transform stages and truncation for one component.
/// Returns the component's DC offset; the coefficients end up in `primary`.
pub fn prepare_component(primary: &mut Plane, scratch: &mut Plane, num_stages: u32) -> i32 {
    let dc = sub_dc(primary);
    dwt2full(primary, scratch, num_stages);
    normalize(primary);
    dc
}
