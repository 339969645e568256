//! Raster reading and writing using GDAL
//!
//! Reads any single band GDAL can open; always writes GTiff.

use super::GeoTiffOptions;
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use gdal::raster::{GdalDataType, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use std::path::Path;

const TILE_SIZE: usize = 256;

/// Read one band of a GDAL-readable raster
///
/// # Arguments
/// * `path` - Path to the raster (GeoTIFF, .img, .jp2, .dat, .bmp, .png, .vrt, ...)
/// * `band` - Band number (1-indexed), defaults to 1
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement + GdalType + Copy,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let dataset = Dataset::open(path).map_err(|e| Error::open(path, e))?;

    let band_idx = band.unwrap_or(1);
    let available = dataset.raster_count() as usize;
    if band_idx == 0 || band_idx > available {
        return Err(Error::BandMissing {
            path: path.to_path_buf(),
            band: band_idx,
            available,
        });
    }
    let rasterband = dataset
        .rasterband(band_idx)
        .map_err(|e| Error::open(path, e))?;

    let (cols, rows) = dataset.raster_size();
    let buffer = rasterband
        .read_as::<T>((0, 0), (cols, rows), (cols, rows), None)
        .map_err(|e| Error::open(path, e))?;

    let mut raster = Raster::from_vec(buffer.data().to_vec(), rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }

    if let Ok(srs) = dataset.spatial_ref() {
        if let Ok(code) = srs.auth_code() {
            raster.set_crs(Some(CRS::from_epsg(code as u32)));
        } else if let Ok(wkt) = srs.to_wkt() {
            raster.set_crs(Some(CRS::from_wkt(wkt)));
        }
    }

    if let Some(nodata) = rasterband.no_data_value() {
        // Match the Float32 cells, not the double written in the metadata
        let nodata = match rasterband.band_type() {
            GdalDataType::Float32 if !nodata.is_nan() => nodata as f32 as f64,
            _ => nodata,
        };
        raster.set_nodata(num_traits::cast(nodata));
    }

    Ok(raster)
}

/// Write a Raster to a single-band GeoTIFF file
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement + GdalType + Copy,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    write_dataset(raster, path, options.unwrap_or_default()).map_err(|e| Error::write(path, e))
}

fn write_dataset<T>(
    raster: &Raster<T>,
    path: &Path,
    opts: GeoTiffOptions,
) -> std::result::Result<(), gdal::errors::GdalError>
where
    T: RasterElement + GdalType + Copy,
{
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (rows, cols) = raster.shape();

    let create_options = [
        format!("COMPRESS={}", opts.compression),
        "TILED=YES".to_string(),
        format!("BLOCKXSIZE={}", TILE_SIZE),
        format!("BLOCKYSIZE={}", TILE_SIZE),
    ];
    let create_options_refs: Vec<&str> = create_options.iter().map(|s| s.as_str()).collect();

    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path,
        cols as isize,
        rows as isize,
        1,
        &create_options_refs,
    )?;

    dataset.set_geo_transform(&raster.transform().to_gdal())?;

    if let Some(crs) = raster.crs() {
        if let Some(epsg) = crs.epsg() {
            dataset.set_spatial_ref(&SpatialRef::from_epsg(epsg)?)?;
        } else if let Some(wkt) = crs.wkt() {
            dataset.set_spatial_ref(&SpatialRef::from_wkt(wkt)?)?;
        }
    }

    let mut band = dataset.rasterband(1)?;
    if let Some(nodata) = raster.nodata().and_then(num_traits::cast::<T, f64>) {
        band.set_no_data_value(Some(nodata))?;
    }

    let data: Vec<T> = raster.data().iter().copied().collect();
    band.write((0, 0), (cols, rows), &data)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let mut raster: Raster<f32> = Raster::new(20, 30);
        raster.set_transform(GeoTransform::new(552000.0, 5230000.0, 1.0, -1.0));
        raster.set_crs(Some(CRS::from_epsg(26910)));
        raster.set_nodata(Some(-9999.0));
        raster.set(5, 7, 0.42).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hsi.tif");
        write_geotiff(&raster, &path, None).unwrap();

        let loaded: Raster<f32> = read_geotiff(&path, None).unwrap();
        assert_eq!(loaded.shape(), raster.shape());
        assert_eq!(loaded.get(5, 7).unwrap(), 0.42);
        assert_eq!(loaded.nodata(), Some(-9999.0));

        let err = read_geotiff::<f32, _>(&path, Some(2)).unwrap_err();
        assert!(matches!(err, Error::BandMissing { .. }));
    }

    #[test]
    fn test_float32_nodata_matches_cells() {
        let mut raster: Raster<f32> = Raster::from_vec(vec![-9999.9, 1.0], 1, 2).unwrap();
        raster.set_nodata(Some(-9999.9));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depth.tif");
        write_geotiff(&raster, &path, None).unwrap();

        let loaded: Raster<f64> = read_geotiff(&path, None).unwrap();
        assert!(loaded.get(0, 0).unwrap().is_nodata(loaded.nodata()));
        assert_eq!(loaded.nodata_count(), 1);
    }
}
