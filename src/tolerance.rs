//! Brightness-banded thresholds deciding when two HSV colors fall into the
//! same histogram bucket.

use serde::{Deserialize, Serialize};

use crate::color::HsvVector;
use crate::error::PaletteError;
use crate::math::delta_hue;

/// Hue, saturation and value thresholds, all in normalized units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdHsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl ThresholdHsv {
    /// Whether `color2` is close enough to `color1` to share its bucket. The
    /// thresholds are expected to come from `color1`'s band.
    #[inline(always)]
    pub fn accepts(&self, color1: &HsvVector, color2: &HsvVector) -> bool {
        delta_hue(color1.h, color2.h) <= self.hue
            && (color2.s - color1.s).abs() <= self.saturation
            && (color2.v - color1.v).abs() <= self.value
    }
}

/// Thresholds that apply to colors with `min_value <= V < max_value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub min_value: f64,
    pub max_value: f64,
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl ToleranceBand {
    /// A band reaching 1.0 also covers its upper bound, so pure white has a band.
    fn contains(&self, v: f64) -> bool {
        v >= self.min_value && (v < self.max_value || (self.max_value >= 1.0 && v == self.max_value))
    }

    pub fn threshold(&self) -> ThresholdHsv {
        ThresholdHsv {
            hue: self.hue,
            saturation: self.saturation,
            value: self.value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToleranceTable {
    bands: Vec<ToleranceBand>,
}

impl Default for ToleranceTable {
    fn default() -> Self {
        let band = |min_value, max_value, hue, saturation, value| ToleranceBand {
            min_value,
            max_value,
            hue,
            saturation,
            value,
        };
        // Dark colors carry little hue/saturation information, so their bands are looser.
        Self {
            bands: vec![
                band(0.0, 0.2, 1.0, 1.0, 0.3),
                band(0.2, 0.4, 0.04, 0.8, 0.3),
                band(0.4, 0.6, 0.02, 0.6, 0.3),
                band(0.6, 1.0, 0.02, 0.3, 0.3),
            ],
        }
    }
}

impl ToleranceTable {
    /// Builds a table without validating it. See [`ToleranceTable::validate`].
    pub fn new(bands: Vec<ToleranceBand>) -> Self {
        Self { bands }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn bands(&self) -> &[ToleranceBand] {
        &self.bands
    }

    /// Thresholds for a color with brightness `v`.
    pub fn threshold_for(&self, v: f64) -> Result<ThresholdHsv, PaletteError> {
        self.bands
            .iter()
            .find(|band| band.contains(v))
            .map(ToleranceBand::threshold)
            .ok_or(PaletteError::UncoveredValue(v))
    }

    /// Checks that thresholds lie in `[0, 1]` and that the bands tile `[0, 1]`
    /// with no gap or overlap. Bands may be listed in any order.
    pub fn validate(&self) -> Result<(), PaletteError> {
        if self.bands.is_empty() {
            return Err(PaletteError::EmptyTolerances);
        }

        for (index, band) in self.bands.iter().enumerate() {
            for (name, threshold) in [
                ("hue", band.hue),
                ("saturation", band.saturation),
                ("value", band.value),
            ] {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(PaletteError::ThresholdOutOfRange {
                        index,
                        name,
                        threshold,
                    });
                }
            }
            if !(band.min_value < band.max_value) {
                return Err(PaletteError::EmptyBand {
                    index,
                    min: band.min_value,
                    max: band.max_value,
                });
            }
        }

        let mut sorted: Vec<&ToleranceBand> = self.bands.iter().collect();
        sorted.sort_by(|a, b| a.min_value.total_cmp(&b.min_value));

        let mut covered_to = 0.0;
        for band in sorted {
            if band.min_value > covered_to {
                return Err(PaletteError::Gap {
                    from: covered_to,
                    to: band.min_value,
                });
            }
            if band.min_value < covered_to {
                return Err(PaletteError::Overlap(band.min_value));
            }
            covered_to = band.max_value;
        }

        if covered_to < 1.0 {
            return Err(PaletteError::Gap {
                from: covered_to,
                to: 1.0,
            });
        }
        Ok(())
    }
}
