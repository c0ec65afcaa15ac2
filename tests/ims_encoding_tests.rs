mod common;

use common::{decode, decode_payload, reference_coefficients, squared_error};
use ims_encoder::encode::container::MAX_DIMENSION;
use ims_encoder::io::BitReader;
use ims_encoder::{EncoderParams, ImageSource, ImsEncoder, ImsError, ImsHeader, PlanarImage};
use image::{GrayImage, Rgb, RgbImage};

/// Smooth gradient with a sharp-edged square in the middle.
fn test_pattern(width: usize, height: usize) -> Vec<f32> {
    let mut samples = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let mut v = ((x * 5 + y * 3) % 200) as f32;
            if (width / 4..3 * width / 4).contains(&x) && (height / 4..3 * height / 4).contains(&y) {
                v = 240.0 - v / 4.0;
            }
            samples.push(v);
        }
    }
    samples
}

fn gray(width: usize, height: usize) -> PlanarImage {
    PlanarImage::gray(width, height, test_pattern(width, height)).unwrap()
}

fn color(width: usize, height: usize) -> PlanarImage {
    let luma = test_pattern(width, height);
    let cb: Vec<f32> = luma.iter().map(|v| 128.0 + (v - 128.0) * 0.25).collect();
    let cr: Vec<f32> = luma.iter().rev().map(|v| 100.0 + v / 8.0).collect();
    PlanarImage::color(width, height, [luma, cb, cr]).unwrap()
}

fn encode_at(source: &dyn ImageSource, bit_rate: f32) -> Vec<u8> {
    let mut out = Vec::new();
    ImsEncoder::new(EncoderParams {
        bit_rate,
        ..Default::default()
    })
    .encode(source, &mut out)
    .expect("encoding failed");
    out
}

/// A source that reports whatever dimensions it is told to.
struct Blank {
    width: usize,
    height: usize,
}

impl ImageSource for Blank {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn is_color(&self) -> bool {
        true
    }
    fn sample(&self, _component: usize, _x: usize, _y: usize) -> f32 {
        0.0
    }
}

#[test]
fn test_grayscale_header() {
    let img = gray(32, 32);
    let bytes = encode_at(&img, 1.0);
    assert_eq!(&bytes[..3], b"IMS");

    let decoded = decode(&bytes);
    let header = &decoded.header;
    assert_eq!(header.num_stages, 5);
    assert_eq!((header.size_x, header.size_y), (32, 32));
    assert_eq!((header.extra_x, header.extra_y), (0, 0));
    assert!(!header.is_color);
    assert_eq!(header.budgets, vec![1024]);
    assert_eq!(header.dc.len(), 1);
}

#[test]
fn test_encoding_is_deterministic() {
    for img in [gray(45, 31), color(24, 40)] {
        let a = encode_at(&img, 0.75);
        let b = encode_at(&img, 0.75);
        assert_eq!(a, b);
    }
}

#[test]
fn test_color_budget_split() {
    let img = color(40, 24);
    let mut out = Vec::new();
    let summary = ImsEncoder::new(EncoderParams::default())
        .encode(&img, &mut out)
        .unwrap();
    assert_eq!(summary.header.budgets, vec![576, 192, 192]);
    assert_eq!(summary.components.len(), 3);
    for (stats, &budget) in summary.components.iter().zip(&summary.header.budgets) {
        assert!(stats.bits_emitted <= budget);
    }

    // The decoder finds each payload where the encoder put it.
    let decoded = decode(&out);
    assert!(decoded.header.is_color);
    let emitted: Vec<u64> = summary.components.iter().map(|s| s.bits_emitted).collect();
    assert_eq!(decoded.payload_bits, emitted);
}

#[test]
fn test_generous_budget_recovers_coefficients() {
    for img in [gray(32, 32), gray(33, 17), color(20, 12)] {
        let stages = img.num_stages();
        let bytes = encode_at(&img, 512.0);
        let decoded = decode(&bytes);
        assert_eq!(decoded.components, reference_coefficients(&img, stages));
    }
}

#[test]
fn test_padding_for_odd_sizes() {
    let img = gray(33, 17);
    let decoded = decode(&encode_at(&img, 1.0));
    // min side 17 -> 4 stages -> multiples of 16
    assert_eq!(decoded.header.num_stages, 4);
    assert_eq!((decoded.header.extra_x, decoded.header.extra_y), (15, 15));
}

#[test]
fn test_distortion_never_grows_with_rate() {
    let img = color(64, 48);
    let reference = reference_coefficients(&img, img.num_stages());
    let mut last = u128::MAX;
    for rate in [0.0, 0.02, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 16.0, 512.0] {
        let decoded = decode(&encode_at(&img, rate));
        let err = squared_error(&decoded.components, &reference);
        assert!(err <= last, "rate {} raised the error to {} from {}", rate, err, last);
        last = err;
    }
    assert_eq!(last, 0);
}

#[test]
fn test_truncated_payload_prefixes_decode() {
    let img = gray(48, 40);
    let bytes = encode_at(&img, 256.0);
    let full = decode(&bytes);
    let reference = reference_coefficients(&img, img.num_stages());
    assert_eq!(full.components, reference);

    let header = &full.header;
    let (width, height) = (header.size_x + header.extra_x, header.size_y + header.extra_y);
    let mut last = u128::MAX;
    for budget in (0..=full.payload_bits[0]).step_by(97).chain([full.payload_bits[0]]) {
        let mut reader = BitReader::new(&bytes[..]);
        ImsHeader::read_from(&mut reader).unwrap();
        let (values, used) = decode_payload(&mut reader, width, height, header.num_stages, budget);
        assert_eq!(used, budget);
        let err = squared_error(&[values], &reference);
        assert!(err <= last, "prefix of {} bits raised the error", budget);
        last = err;
    }
    assert_eq!(last, 0);
}

#[test]
fn test_zero_rate_is_header_only() {
    let img = gray(16, 16);
    let mut out = Vec::new();
    let summary = ImsEncoder::new(EncoderParams {
        bit_rate: 0.0,
        ..Default::default()
    })
    .encode(&img, &mut out)
    .unwrap();
    assert_eq!(summary.components[0].bits_emitted, 0);
    assert_eq!(out.len() as u64, summary.header.bit_len().div_ceil(8));
}

#[test]
fn test_tiny_images() {
    for (w, h) in [(1, 1), (2, 2), (1, 7), (3, 2)] {
        let img = gray(w, h);
        let bytes = encode_at(&img, 512.0);
        let decoded = decode(&bytes);
        assert_eq!((decoded.header.size_x, decoded.header.size_y), (w, h));
        assert_eq!(decoded.components, reference_coefficients(&img, img.num_stages()));
    }
}

#[test]
fn test_image_crate_adapters() {
    let (w, h) = (24u32, 16u32);
    let samples = test_pattern(w as usize, h as usize);

    let gray_img = GrayImage::from_raw(w, h, samples.iter().map(|&v| v as u8).collect()).unwrap();
    let planar = PlanarImage::from_gray_image(&gray_img);
    assert_eq!(encode_at(&gray_img, 1.0), encode_at(&planar, 1.0));
    let pixels: Vec<f32> = samples.iter().map(|&v| v as u8 as f32).collect();
    let same_pixels = PlanarImage::gray(w as usize, h as usize, pixels).unwrap();
    assert_eq!(encode_at(&planar, 1.0), encode_at(&same_pixels, 1.0));

    let rgb_img = RgbImage::from_fn(w, h, |x, y| {
        let v = samples[(y * w + x) as usize] as u8;
        Rgb([v, v / 2, 255 - v])
    });
    let planar = PlanarImage::from_rgb_image(&rgb_img);
    assert!(rgb_img.is_color());
    assert_eq!(encode_at(&rgb_img, 1.5), encode_at(&planar, 1.5));
}

#[test]
fn test_explicit_stage_count() {
    let img = gray(40, 40).with_num_stages(2);
    let decoded = decode(&encode_at(&img, 512.0));
    assert_eq!(decoded.header.num_stages, 2);
    assert_eq!(decoded.components, reference_coefficients(&img, 2));

    let mut out = Vec::new();
    let summary = ImsEncoder::new(EncoderParams {
        bit_rate: 2.0,
        num_stages: Some(1),
    })
    .encode(&img, &mut out)
    .unwrap();
    assert_eq!(summary.header.num_stages, 1);
}

#[test]
fn test_encode_file_matches_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pattern.ims");
    let img = color(30, 22);

    let encoder = ImsEncoder::new(EncoderParams::default());
    let summary = encoder.encode_file(&img, &path).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, encode_at(&img, 1.0));
    assert_eq!(on_disk.len() as u64, summary.total_bytes());
}

#[test]
fn test_invalid_image_creates_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = ImsEncoder::new(EncoderParams::default());

    let path = dir.path().join("too_wide.ims");
    let err = encoder
        .encode_file(
            &Blank {
                width: MAX_DIMENSION + 1,
                height: 8,
            },
            &path,
        )
        .unwrap_err();
    assert!(matches!(err, ImsError::InvalidImage(_)));
    assert!(!path.exists());

    let path = dir.path().join("empty.ims");
    let err = encoder
        .encode_file(&Blank { width: 0, height: 8 }, &path)
        .unwrap_err();
    assert!(matches!(err, ImsError::InvalidImage(_)));
    assert!(!path.exists());

    let path = dir.path().join("nan.ims");
    let mut samples = test_pattern(8, 8);
    samples[19] = f32::NAN;
    let img = PlanarImage::gray(8, 8, samples).unwrap();
    assert!(matches!(
        encoder.encode_file(&img, &path),
        Err(ImsError::InvalidImage(_))
    ));
    assert!(!path.exists());
}

#[test]
fn test_unwritable_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.ims");
    let err = ImsEncoder::new(EncoderParams::default())
        .encode_file(&gray(8, 8), &path)
        .unwrap_err();
    assert!(matches!(err, ImsError::Io(_)));
}
