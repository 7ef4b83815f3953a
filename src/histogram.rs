use tracing::debug;

use crate::color::{HsvVector, sort_hsv};
use crate::error::PaletteError;
use crate::math::delta_hue;
use crate::tolerance::{ThresholdHsv, ToleranceTable};

pub const DEFAULT_CAPACITY: usize = 16;

/// Upper bound on samples taken by the seeding pass.
const SEED_SAMPLES: usize = 256;

/// A representative color and how many pixels landed on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramBucket {
    pub color: HsvVector,
    pub count: usize,
    threshold: ThresholdHsv,
}

/// An unmatched tolerance class and how often it has been seen while the
/// histogram was full. Evicted buckets come back here with their count.
#[derive(Clone, Copy, Debug)]
struct Challenger {
    color: HsvVector,
    threshold: ThresholdHsv,
    count: usize,
}

/// Index of the closest candidate whose representative accepts `color`;
/// lowest index on ties.
fn nearest_within<'b>(
    candidates: impl IntoIterator<Item = (&'b HsvVector, &'b ThresholdHsv)>,
    color: &HsvVector,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, (representative, threshold)) in candidates.into_iter().enumerate() {
        if !threshold.accepts(representative, color) {
            continue;
        }
        let dh = delta_hue(representative.h, color.h);
        let ds = representative.s - color.s;
        let dv = representative.v - color.v;
        let d = dh * dh + ds * ds + dv * dv;
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Tolerance-aware histogram over HSV colors.
///
/// Buckets are searched linearly. Tolerance equality is not transitive, so it
/// is never used as an ordering key.
#[derive(Debug)]
pub struct HistogramBucketer<'a> {
    tolerances: &'a ToleranceTable,
    capacity: usize,
    buckets: Vec<HistogramBucket>,
    pending: Vec<Challenger>,
}

impl<'a> HistogramBucketer<'a> {
    pub fn new(tolerances: &'a ToleranceTable, capacity: usize) -> Result<Self, PaletteError> {
        if capacity == 0 {
            return Err(PaletteError::ZeroCapacity);
        }
        Ok(Self {
            tolerances,
            capacity,
            buckets: Vec::with_capacity(capacity),
            pending: Vec::new(),
        })
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    fn open(&self, color: HsvVector, count: usize) -> Result<HistogramBucket, PaletteError> {
        Ok(HistogramBucket {
            color,
            count,
            threshold: self.tolerances.threshold_for(color.v)?,
        })
    }

    fn find_bucket(&self, color: &HsvVector) -> Option<usize> {
        nearest_within(self.buckets.iter().map(|b| (&b.color, &b.threshold)), color)
    }

    fn find_pending(&self, color: &HsvVector) -> Option<usize> {
        nearest_within(self.pending.iter().map(|c| (&c.color, &c.threshold)), color)
    }

    /// Samples the input uniformly (at most 256 samples) and opens a bucket for
    /// every sample no existing bucket accepts. Counts are left to
    /// [`HistogramBucketer::accumulate`].
    pub fn seed(&mut self, colors: &[HsvVector]) -> Result<(), PaletteError> {
        let step = colors.len() / SEED_SAMPLES + 1;
        for color in colors.iter().step_by(step) {
            if self.find_bucket(color).is_none() {
                let bucket = self.open(*color, 1)?;
                self.buckets.push(bucket);
            }
        }
        Ok(())
    }

    /// Counts one color.
    ///
    /// Once the histogram is full, each unmatched tolerance class keeps its
    /// own running count. A class whose count exceeds the weakest bucket (the
    /// earliest inserted one on ties) takes that bucket's place, and the
    /// evicted bucket carries on as a pending class with the count it had.
    pub fn accumulate(&mut self, color: &HsvVector) -> Result<(), PaletteError> {
        if let Some(i) = self.find_bucket(color) {
            self.buckets[i].count += 1;
            return Ok(());
        }

        if self.buckets.len() < self.capacity {
            let bucket = self.open(*color, 1)?;
            self.buckets.push(bucket);
            return Ok(());
        }

        let p = match self.find_pending(color) {
            Some(p) => {
                self.pending[p].count += 1;
                p
            }
            None => {
                self.pending.push(Challenger {
                    color: *color,
                    threshold: self.tolerances.threshold_for(color.v)?,
                    count: 1,
                });
                self.pending.len() - 1
            }
        };

        let weakest = self
            .buckets
            .iter()
            .enumerate()
            .min_by_key(|(_, bucket)| bucket.count)
            .map(|(i, bucket)| (i, bucket.count));

        match weakest {
            Some((i, min_count)) if self.pending[p].count > min_count => {
                let challenger = self.pending.remove(p);
                let evicted = self.buckets.remove(i);
                debug!(
                    evicted = %evicted.color,
                    evicted_count = evicted.count,
                    replacement = %challenger.color,
                    replacement_count = challenger.count,
                    "histogram bucket replaced"
                );
                self.pending.push(Challenger {
                    color: evicted.color,
                    threshold: evicted.threshold,
                    count: evicted.count,
                });
                self.buckets.push(HistogramBucket {
                    color: challenger.color,
                    count: challenger.count,
                    threshold: challenger.threshold,
                });
            }
            _ => {}
        }
        Ok(())
    }

    /// The `capacity` most frequent representatives, sorted by (H, S, V).
    pub fn into_palette(self) -> Vec<HsvVector> {
        let mut ranked: Vec<&HistogramBucket> = self.buckets.iter().collect();
        // Stable, so equal counts keep insertion order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));

        let mut palette: Vec<HsvVector> = ranked
            .into_iter()
            .take(self.capacity)
            .map(|bucket| bucket.color)
            .collect();
        sort_hsv(&mut palette);
        palette
    }
}

/// Proposes up to `capacity` representative colors for `colors`.
///
/// Empty input yields an empty palette.
pub fn build_histogram_palette(
    colors: &[HsvVector],
    tolerances: &ToleranceTable,
    capacity: usize,
) -> Result<Vec<HsvVector>, PaletteError> {
    let mut bucketer = HistogramBucketer::new(tolerances, capacity)?;
    if colors.is_empty() {
        return Ok(Vec::new());
    }

    bucketer.seed(colors)?;
    let seeded = bucketer.buckets().len();
    for color in colors {
        bucketer.accumulate(color)?;
    }

    debug!(
        pixels = colors.len(),
        seeded,
        buckets = bucketer.buckets().len(),
        capacity,
        "histogram built"
    );
    Ok(bucketer.into_palette())
}
