use ndarray::Zip;
use serde::{Deserialize, Serialize};

use crate::raster::Raster;

/// Maps values in `(min, max]` to `value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclassRule {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

impl ReclassRule {
    pub fn matches(&self, v: f32) -> bool {
        self.min < v && v <= self.max
    }
}

/// Ordered rules plus the policy for values no rule covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReclassTable {
    pub rules: Vec<ReclassRule>,
    /// When false, unmatched valid pixels keep their value.
    #[serde(default)]
    pub nodata_for_missing: bool,
}

impl ReclassTable {
    pub fn new(rules: Vec<ReclassRule>) -> Self {
        Self {
            rules,
            nodata_for_missing: false,
        }
    }
}

/// NDWI water classes: `(-1, 0]` is land (0), `(0, 1]` is water (1).
pub fn water_table() -> ReclassTable {
    ReclassTable::new(vec![
        ReclassRule {
            min: -1.0,
            max: 0.0,
            value: 0.0,
        },
        ReclassRule {
            min: 0.0,
            max: 1.0,
            value: 1.0,
        },
    ])
}

/// Reclassify a raster with the first matching rule per pixel.
///
/// No-data stays no-data. A valid pixel no rule covers keeps its value
/// unless the table sets `nodata_for_missing`.
pub fn reclassify(raster: &Raster, table: &ReclassTable) -> Raster {
    let mut out = Raster::nodata(raster.dim());
    Zip::from(&mut out.data)
        .and(&mut out.valid)
        .and(&raster.data)
        .and(&raster.valid)
        .for_each(|o, ok, &v, &src_ok| {
            if !src_ok {
                return;
            }
            match table.rules.iter().find(|r| r.matches(v)) {
                Some(rule) => {
                    *o = rule.value;
                    *ok = true;
                }
                None if !table.nodata_for_missing => {
                    *o = v;
                    *ok = true;
                }
                None => {}
            }
        });
    out
}
