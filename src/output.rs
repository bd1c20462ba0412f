//! Annotated images and the plain text keypoint/descriptor dump.
//!
//! The text format is a header line `<keypoints> <columns>` followed by one line per
//! keypoint: `x y size angle`, three spaces, then every descriptor value followed by a
//! space. Float values use C `%g` formatting (6 significant digits), binary descriptors
//! are written as integers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::error::{Error, Result};
use crate::keypoint::{Descriptors, Features, KeyPoint};

const SIGNIFICANT_DIGITS: i32 = 6;
const MIN_MARKER_RADIUS: i32 = 3;

const PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 0, 0]),
    Rgb([0, 200, 0]),
    Rgb([0, 96, 255]),
    Rgb([255, 200, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 220, 220]),
    Rgb([255, 128, 0]),
    Rgb([160, 64, 255]),
];

/// Formats `v` like `printf("%g", v)`.
pub fn format_general(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent is the one after rounding to the target precision.
    let sci = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, v);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_trailing_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS - 1 - exponent) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn strip_trailing_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn f32_general(v: f32) -> String {
    format_general(f64::from(v))
}

/// Writes keypoints and descriptors in the text dump format.
pub fn write_descriptors<W: Write>(mut w: W, features: &Features) -> io::Result<()> {
    writeln!(w, "{} {}", features.len(), features.descriptors.cols())?;
    for (i, kp) in features.keypoints.iter().enumerate() {
        write!(
            w,
            "{} {} {} {}   ",
            f32_general(kp.x),
            f32_general(kp.y),
            f32_general(kp.size),
            f32_general(kp.angle)
        )?;
        match &features.descriptors {
            Descriptors::Float(m) => {
                for v in m.row(i) {
                    write!(w, "{} ", f32_general(*v))?;
                }
            }
            Descriptors::Binary(m) => {
                for v in m.row(i) {
                    write!(w, "{v} ")?;
                }
            }
        }
        writeln!(w)?;
    }
    w.flush()
}

pub fn save_descriptors(path: &Path, features: &Features) -> Result<()> {
    let map_err = |source| Error::DescriptorWrite {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(map_err)?;
    write_descriptors(BufWriter::new(file), features).map_err(map_err)?;
    log::info!("wrote {} descriptors to {}", features.len(), path.display());
    Ok(())
}

/// Draws every keypoint as a circle of its size, plus a radius in its orientation when it
/// has one.
pub fn draw_keypoints(img: &GrayImage, keypoints: &[KeyPoint]) -> RgbImage {
    let mut canvas: RgbImage = img.convert();
    for (i, kp) in keypoints.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let center = (kp.x.round() as i32, kp.y.round() as i32);
        let radius = ((kp.size / 2.0).round() as i32).max(MIN_MARKER_RADIUS);
        draw_hollow_circle_mut(&mut canvas, center, radius, color);
        if kp.has_angle() {
            let (sin, cos) = kp.angle.to_radians().sin_cos();
            let start = (center.0 as f32, center.1 as f32);
            let end = (
                start.0 + (cos * radius as f32).round(),
                start.1 + (sin * radius as f32).round(),
            );
            draw_line_segment_mut(&mut canvas, start, end, color);
        }
    }
    canvas
}

/// Saves `img`, picking the format from the file extension.
pub fn save_image(path: &Path, img: &RgbImage) -> Result<()> {
    img.save(path).map_err(|source| Error::ImageWrite {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote annotated image to {}", path.display());
    Ok(())
}
