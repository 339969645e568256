//! Coordinate Reference System handling
//!
//! The suitability engine never reprojects: a CRS is read from the depth
//! raster and handed back unchanged to the writer. GeoTIFF key directories
//! are therefore kept verbatim alongside the EPSG code decoded from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// GTModelTypeGeoKey
const GT_MODEL_TYPE: u16 = 1024;
/// GTRasterTypeGeoKey
const GT_RASTER_TYPE: u16 = 1025;
/// GeographicTypeGeoKey
const GEOGRAPHIC_TYPE: u16 = 2048;
/// ProjectedCSTypeGeoKey
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Raw GeoTIFF key directory (tags 34735, 34736, 34737).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoKeyDirectory {
    /// GeoKeyDirectoryTag: header followed by 4-short key entries
    pub directory: Vec<u16>,
    /// GeoDoubleParamsTag
    pub double_params: Vec<f64>,
    /// GeoAsciiParamsTag
    pub ascii_params: Option<String>,
}

impl GeoKeyDirectory {
    /// Minimal directory for a CRS identified by EPSG code.
    ///
    /// Codes in 4000..=4999 are geographic (e.g. 4326, 4269) and get
    /// GTModelType=Geographic with a GeographicTypeGeoKey; anything else is
    /// written as a ProjectedCSTypeGeoKey.
    pub fn for_epsg(code: u32) -> Self {
        let geographic = (4000..=4999).contains(&code);
        let (model_type, cs_key) = if geographic {
            (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE)
        } else {
            (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE)
        };

        let mut directory = vec![1, 1, 0, 2];
        directory.extend_from_slice(&[GT_MODEL_TYPE, 0, 1, model_type]);
        directory.extend_from_slice(&[GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
        if let Ok(code) = u16::try_from(code) {
            directory[3] = 3;
            directory.extend_from_slice(&[cs_key, 0, 1, code]);
        }
        Self {
            directory,
            double_params: Vec::new(),
            ascii_params: None,
        }
    }

    /// EPSG code from ProjectedCSTypeGeoKey or GeographicTypeGeoKey.
    ///
    /// Only keys stored inline (location 0) are considered; 32767 means
    /// "user-defined" and yields `None`.
    pub fn epsg(&self) -> Option<u32> {
        if self.directory.len() < 4 {
            return None;
        }
        let num_keys = self.directory[3] as usize;

        let mut geographic = None;
        for entry in self.directory[4..].chunks_exact(4).take(num_keys) {
            let (key_id, location, value) = (entry[0], entry[1], entry[3]);
            if location != 0 || value == 0 || value == 32767 {
                continue;
            }
            match key_id {
                PROJECTED_CS_TYPE => return Some(value as u32),
                GEOGRAPHIC_TYPE => geographic = Some(value as u32),
                _ => {}
            }
        }
        geographic
    }
}

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// GeoTIFF keys exactly as read from the source file
    geokeys: Option<GeoKeyDirectory>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            geokeys: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            geokeys: None,
        }
    }

    /// Create a CRS from a GeoTIFF key directory, decoding the EPSG code when present
    pub fn from_geokeys(geokeys: GeoKeyDirectory) -> Self {
        Self {
            wkt: None,
            epsg: geokeys.epsg(),
            geokeys: Some(geokeys),
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Raw GeoTIFF keys, if this CRS was read from a GeoTIFF
    pub fn geokeys(&self) -> Option<&GeoKeyDirectory> {
        self.geokeys.as_ref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.geokeys, &other.geokeys) {
            return a == b;
        }
        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            return format!("WKT:{}", wkt.chars().take(50).collect::<String>());
        }
        if self.geokeys.is_some() {
            return "GeoTIFF keys (user-defined)".to_string();
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
