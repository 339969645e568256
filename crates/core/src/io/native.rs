//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Georeferencing is carried by the GeoTIFF tags:
//! ModelPixelScale + ModelTiepoint (or ModelTransformation) for the affine
//! transform, the GeoKey directory for the CRS and GDAL_NODATA for the
//! no-data value. Output is always written as 32-bit float.

use super::{Compression, GeoTiffOptions};
use crate::crs::{GeoKeyDirectory, CRS};
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::compression::{self as codec, Deflate, Lzw, Uncompressed};
use tiff::encoder::{ImageEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::{TiffError, TiffResult};
use tracing::debug;

/// Read one band of a GeoTIFF file into a Raster
///
/// # Arguments
/// * `path` - Path to the GeoTIFF file
/// * `band` - Band number (1-indexed), defaults to 1
///
/// # Errors
/// [`Error::RasterOpen`] if the file cannot be opened or decoded as TIFF,
/// [`Error::BandMissing`] if the requested band does not exist.
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::open(path, e))?;
    decode_geotiff(BufReader::new(file), band, path)
}

macro_rules! band_values {
    ($buf:expr, $band:expr, $samples:expr) => {
        $buf.iter()
            .skip($band - 1)
            .step_by($samples)
            .map(|&v| num_traits::cast(v).unwrap_or(T::default_nodata()))
            .collect()
    };
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R, band: Option<usize>, path: &Path) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    // Whole grids are decoded into memory; no size cap
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::open(path, e))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::open(path, format!("cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let samples = decoder
        .get_tag_u32(Tag::SamplesPerPixel)
        .map(|s| s.max(1) as usize)
        .unwrap_or(1);
    let band = band.unwrap_or(1);
    if band == 0 || band > samples {
        return Err(Error::BandMissing {
            path: path.to_path_buf(),
            band,
            available: samples,
        });
    }

    let result = decoder
        .read_image()
        .map_err(|e| match e {
            TiffError::LimitsExceeded => {
                Error::open(path, "image is too large to decode in memory")
            }
            e => Error::open(path, format!("cannot read image data: {}", e)),
        })?;

    let expected = rows * cols * samples;
    let decoded_len = match &result {
        DecodingResult::U8(buf) => buf.len(),
        DecodingResult::U16(buf) => buf.len(),
        DecodingResult::U32(buf) => buf.len(),
        DecodingResult::I8(buf) => buf.len(),
        DecodingResult::I16(buf) => buf.len(),
        DecodingResult::I32(buf) => buf.len(),
        DecodingResult::F32(buf) => buf.len(),
        DecodingResult::F64(buf) => buf.len(),
        _ => expected,
    };
    if decoded_len != expected {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let nodata = read_nodata(&mut decoder).map(|v| nodata_as_stored(v, &result));

    // Chunky (interleaved) pixels: band N is every `samples`-th value
    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => band_values!(buf, band, samples),
        DecodingResult::U16(buf) => band_values!(buf, band, samples),
        DecodingResult::U32(buf) => band_values!(buf, band, samples),
        DecodingResult::I8(buf) => band_values!(buf, band, samples),
        DecodingResult::I16(buf) => band_values!(buf, band, samples),
        DecodingResult::I32(buf) => band_values!(buf, band, samples),
        DecodingResult::F32(buf) => band_values!(buf, band, samples),
        DecodingResult::F64(buf) => band_values!(buf, band, samples),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    match read_geotransform(&mut decoder) {
        Some(transform) => raster.set_transform(transform),
        None => debug!(path = %path.display(), "no georeferencing tags, using identity transform"),
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(nodata.and_then(num_traits::cast));

    Ok(raster)
}

/// GeoTransform from ModelPixelScale + ModelTiepoint, or ModelTransformation
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok();
    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if let Some(gt) = GeoTransform::from_tiepoint(&scale, &tiepoint) {
            return Some(gt);
        }
    }

    let matrix = decoder.get_tag_f64_vec(Tag::ModelTransformationTag).ok()?;
    GeoTransform::from_model_transformation(&matrix)
}

/// CRS from the GeoKey directory, kept verbatim
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let directory = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    let double_params = decoder
        .get_tag_f64_vec(Tag::GeoDoubleParamsTag)
        .unwrap_or_default();
    let ascii_params = decoder
        .get_tag_ascii_string(Tag::GeoAsciiParamsTag)
        .ok()
        .map(|s| s.trim_end_matches('\0').to_string());

    Some(CRS::from_geokeys(GeoKeyDirectory {
        directory,
        double_params,
        ascii_params,
    }))
}

/// No-data value from the GDAL_NODATA ASCII tag
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    text.trim_end_matches('\0').trim().parse::<f64>().ok()
}

/// `nodata` rounded to the band's sample type.
///
/// GDAL_NODATA holds the value as typed (e.g. "-9999.9") while a Float32 band
/// holds `-9999.9f32`; comparing the widened cells against the unrounded
/// double would never match.
fn nodata_as_stored(nodata: f64, samples: &DecodingResult) -> f64 {
    if nodata.is_nan() {
        return nodata;
    }
    match samples {
        DecodingResult::F32(_) => nodata as f32 as f64,
        DecodingResult::U8(_) => nodata as u8 as f64,
        DecodingResult::U16(_) => nodata as u16 as f64,
        DecodingResult::U32(_) => nodata as u32 as f64,
        DecodingResult::I8(_) => nodata as i8 as f64,
        DecodingResult::I16(_) => nodata as i16 as f64,
        DecodingResult::I32(_) => nodata as i32 as f64,
        _ => nodata,
    }
}

fn format_nodata(nodata: f64) -> String {
    if nodata.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", nodata)
    }
}

/// Write a Raster to a single-band GeoTIFF file
///
/// Creates or overwrites `path`. The transform, CRS and no-data value of
/// `raster` are written as GeoTIFF tags.
///
/// # Errors
/// [`Error::RasterWrite`] if the file cannot be created or encoded.
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let compression = options.unwrap_or_default().compression;
    let file = File::create(path).map_err(|e| Error::write(path, e))?;
    encode_geotiff(raster, file, compression).map_err(|e| Error::write(path, e))
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, compression: Compression) -> TiffResult<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)?;
    let (rows, cols) = raster.shape();
    let (width, height) = (cols as u32, rows as u32);

    match compression {
        Compression::None => write_image(
            encoder.new_image_with_compression::<Gray32Float, _>(width, height, Uncompressed)?,
            raster,
        ),
        Compression::Lzw => write_image(
            encoder.new_image_with_compression::<Gray32Float, _>(width, height, Lzw)?,
            raster,
        ),
        Compression::Deflate => write_image(
            encoder.new_image_with_compression::<Gray32Float, _>(
                width,
                height,
                Deflate::default(),
            )?,
            raster,
        ),
    }
}

/// Georeferencing tags plus Float32 pixel data
fn write_image<T, W, K, D>(
    mut image: ImageEncoder<'_, W, Gray32Float, K, D>,
    raster: &Raster<T>,
) -> TiffResult<()>
where
    T: RasterElement,
    W: Write + Seek,
    K: TiffKind,
    D: codec::Compression,
{
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let gt = raster.transform();
    if gt.is_north_up() {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
    } else {
        let matrix = gt.to_model_transformation();
        image
            .encoder()
            .write_tag(Tag::ModelTransformationTag, &matrix[..])?;
    }

    // GTModelType=Projected, GTRasterType=PixelIsArea when no CRS is known,
    // so readers still recognize the file as a GeoTIFF
    let geokeys = match raster.crs() {
        Some(crs) => match (crs.geokeys(), crs.epsg()) {
            (Some(keys), _) => keys.clone(),
            (None, Some(code)) => GeoKeyDirectory::for_epsg(code),
            (None, None) => minimal_geokeys(),
        },
        None => minimal_geokeys(),
    };
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.directory.as_slice())?;
    if !geokeys.double_params.is_empty() {
        image
            .encoder()
            .write_tag(Tag::GeoDoubleParamsTag, geokeys.double_params.as_slice())?;
    }
    if let Some(ascii) = &geokeys.ascii_params {
        image
            .encoder()
            .write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())?;
    }

    if let Some(nodata) = raster.nodata().and_then(num_traits::cast::<T, f64>) {
        image
            .encoder()
            .write_tag(Tag::GdalNodata, format_nodata(nodata).as_str())?;
    }

    image.write_data(&data)
}

fn minimal_geokeys() -> GeoKeyDirectory {
    GeoKeyDirectory {
        directory: vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1],
        double_params: Vec::new(),
        ascii_params: None,
    }
}
