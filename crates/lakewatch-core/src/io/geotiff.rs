use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, RGB32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use crate::consts::{
    TAG_GDAL_NODATA, TAG_GEO_KEY_DIRECTORY, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT,
};
use crate::error::{LakewatchError, Result};
use crate::raster::{GeoTransform, GridSpec, Raster};

/// Decoded single-band TIFF: values widened to f64 plus whatever
/// georeferencing tags were present.
struct DecodedBand {
    values: Array2<f64>,
    transform: Option<GeoTransform>,
    nodata: Option<f64>,
}

fn decode_band<R: Read + Seek>(reader: R) -> Result<DecodedBand> {
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => {
            return Err(LakewatchError::Query(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    if values.len() != rows * cols {
        // Multi-sample images decode to rows*cols*samples values.
        return Err(LakewatchError::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let values = Array2::from_shape_vec((rows, cols), values).map_err(|_| {
        LakewatchError::InvalidDimensions {
            width: cols,
            height: rows,
        }
    })?;

    let transform = read_geotransform(&mut decoder);
    let nodata = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f64>().ok());

    Ok(DecodedBand {
        values,
        transform,
        nodata,
    })
}

/// ModelPixelScaleTag + ModelTiepointTag, if both are present.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT))
        .ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Read a single-band TIFF as a reflectance raster.
///
/// NaN, the file's GDAL no-data tag, and `nodata` (when given) all mark
/// invalid pixels.
pub fn read_band(path: &Path, nodata: Option<f64>) -> Result<(Raster, Option<GeoTransform>)> {
    let decoded = decode_band(BufReader::new(File::open(path)?))?;
    let nodata_values: Vec<f64> = [nodata, decoded.nodata].into_iter().flatten().collect();

    let valid = decoded
        .values
        .mapv(|v| v.is_finite() && !nodata_values.contains(&v));
    let data = decoded.values.mapv(|v| v as f32);
    Ok((Raster::with_validity(data, valid)?, decoded.transform))
}

/// Read a single-band integer TIFF as a quality bitmask.
pub fn read_quality(path: &Path) -> Result<Array2<u16>> {
    let decoded = decode_band(BufReader::new(File::open(path)?))?;
    Ok(decoded
        .values
        .mapv(|v| if v.is_finite() { v.clamp(0.0, u16::MAX as f64) as u16 } else { 0 }))
}

/// Parse an EPSG code from `"EPSG:32638"`, `"EPSG: 32638"` or `"epsg:4326"`.
pub fn parse_epsg(crs: &str) -> Result<u16> {
    let invalid = || LakewatchError::Config(format!("unsupported CRS identifier {crs:?}"));
    let (authority, code) = crs.split_once(':').ok_or_else(invalid)?;
    if !authority.trim().eq_ignore_ascii_case("EPSG") {
        return Err(invalid());
    }
    code.trim().parse::<u16>().map_err(|_| invalid())
}

/// GeoKeyDirectory entries for an EPSG code.
fn geo_keys(epsg: u16) -> Vec<u16> {
    // Geographic CRS codes live in the 4000-4999 range.
    let geographic = (4000..5000).contains(&epsg);
    let (model_type, crs_key) = if geographic { (2, 2048) } else { (1, 3072) };
    vec![
        1, 1, 0, 3, // Version 1.1.0, 3 keys
        1024, 0, 1, model_type, // GTModelTypeGeoKey
        1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
        crs_key, 0, 1, epsg, // GeographicTypeGeoKey or ProjectedCSTypeGeoKey
    ]
}

/// Write one (index) or three (RGB) bands as a float32 GeoTIFF.
///
/// No-data pixels are written as NaN and advertised through GDAL_NODATA.
pub fn write_geotiff(path: &Path, bands: &[&Raster], grid: &GridSpec, crs: &str) -> Result<()> {
    let epsg = parse_epsg(crs)?;
    let writer = BufWriter::new(File::create(path)?);
    encode_geotiff(writer, bands, grid, epsg)
}

fn encode_geotiff<W: Write + Seek>(
    writer: W,
    bands: &[&Raster],
    grid: &GridSpec,
    epsg: u16,
) -> Result<()> {
    for band in bands {
        if band.dim() != grid.shape() {
            return Err(LakewatchError::GridMismatch {
                expected: grid.shape(),
                found: band.dim(),
            });
        }
    }

    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = grid.shape();
    let t = &grid.transform;
    let scale = [t.pixel_width.abs(), t.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let keys = geo_keys(epsg);

    macro_rules! write_image {
        ($colortype:ty, $data:expr) => {{
            let mut image = encoder.new_image::<$colortype>(cols as u32, rows as u32)?;
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE), &scale[..])?;
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT), &tiepoint[..])?;
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(TAG_GEO_KEY_DIRECTORY), keys.as_slice())?;
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(TAG_GDAL_NODATA), "nan")?;
            image.write_data($data)?;
        }};
    }

    match bands {
        [single] => {
            let data: Vec<f32> = single.to_nan_filled().iter().copied().collect();
            write_image!(Gray32Float, &data);
        }
        [r, g, b] => {
            let (r, g, b) = (r.to_nan_filled(), g.to_nan_filled(), b.to_nan_filled());
            let mut data = Vec::with_capacity(rows * cols * 3);
            for ((&rv, &gv), &bv) in r.iter().zip(g.iter()).zip(b.iter()) {
                data.extend_from_slice(&[rv, gv, bv]);
            }
            write_image!(RGB32Float, &data);
        }
        _ => {
            return Err(LakewatchError::Config(format!(
                "GeoTIFF export supports 1 or 3 bands, got {}",
                bands.len()
            )))
        }
    }
    Ok(())
}

/// In-memory variant of [`write_geotiff`].
pub fn write_geotiff_to_buffer(bands: &[&Raster], grid: &GridSpec, crs: &str) -> Result<Vec<u8>> {
    let epsg = parse_epsg(crs)?;
    let mut buf = Vec::new();
    encode_geotiff(std::io::Cursor::new(&mut buf), bands, grid, epsg)?;
    Ok(buf)
}

/// Read back a single-band float GeoTIFF written by [`write_geotiff`].
pub fn read_geotiff(path: &Path) -> Result<(Raster, GridSpec)> {
    let (raster, transform) = read_band(path, None)?;
    let (rows, cols) = raster.dim();
    Ok((
        raster,
        GridSpec::new(rows, cols, transform.unwrap_or_default()),
    ))
}
