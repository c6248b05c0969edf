use ndarray::Array2;

use crate::error::Result;
use crate::raster::{check_shape, Raster};

/// RGB to HSV, hue and saturation in `[0, 1)`, value = max(r, g, b).
pub fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    (hue, saturation, max)
}

pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (v, v, v);
    }
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// HSV pansharpening: keep hue and saturation of the RGB triple and take
/// the value channel from `pan`.
///
/// A pixel is valid only where all three colour bands and the pan band are.
pub fn pansharpen(rgb: [&Raster; 3], pan: &Raster) -> Result<[Raster; 3]> {
    let shape = pan.dim();
    for band in rgb {
        check_shape(shape, band.dim())?;
    }

    let mut out = [
        Array2::<f32>::from_elem(shape, f32::NAN),
        Array2::<f32>::from_elem(shape, f32::NAN),
        Array2::<f32>::from_elem(shape, f32::NAN),
    ];
    let mut valid = Array2::<bool>::from_elem(shape, false);

    for ((row, col), ok) in valid.indexed_iter_mut() {
        let (Some(r), Some(g), Some(b), Some(p)) = (
            rgb[0].get(row, col),
            rgb[1].get(row, col),
            rgb[2].get(row, col),
            pan.get(row, col),
        ) else {
            continue;
        };
        let (h, s, _) = rgb_to_hsv(r, g, b);
        let (r, g, b) = hsv_to_rgb(h, s, p);
        out[0][[row, col]] = r;
        out[1][[row, col]] = g;
        out[2][[row, col]] = b;
        *ok = true;
    }

    let [r, g, b] = out;
    Ok([
        Raster::with_validity(r, valid.clone())?,
        Raster::with_validity(g, valid.clone())?,
        Raster::with_validity(b, valid)?,
    ])
}
