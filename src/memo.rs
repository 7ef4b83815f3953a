use std::collections::HashMap;

use crate::color::{ColorVector, LabVector};

/// Nearest-cluster lookups keyed by exact color value.
///
/// Images repeat pixel values heavily, so each distinct color is assigned
/// once per pass. A cache is only valid for the centers it was filled
/// against and must be dropped when they move.
#[derive(Debug, Default)]
pub struct AssignmentCache {
    assignments: HashMap<[u64; 3], usize>,
}

impl AssignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with(&mut self, color: &LabVector, assign: impl FnOnce() -> usize) -> usize {
        *self.assignments.entry(key(color)).or_insert_with(assign)
    }

    pub fn distinct_colors(&self) -> usize {
        self.assignments.len()
    }
}

/// Bit pattern of each component, with `-0.0` folded onto `0.0`.
fn key(color: &LabVector) -> [u64; 3] {
    color.components().map(|c| (c + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_each_distinct_color_once() {
        let mut cache = AssignmentCache::new();
        let mut calls = 0;
        let red = LabVector::new(53.2, 80.1, 67.2);
        let blue = LabVector::new(32.3, 79.2, -107.9);

        for color in [red, blue, red, red, blue] {
            cache.get_or_insert_with(&color, || {
                calls += 1;
                calls
            });
        }

        assert_eq!(calls, 2);
        assert_eq!(cache.distinct_colors(), 2);
        assert_eq!(cache.get_or_insert_with(&red, || 99), 1);
    }

    #[test]
    fn negative_zero_shares_entry() {
        let mut cache = AssignmentCache::new();
        cache.get_or_insert_with(&LabVector::new(0.0, 0.0, 0.0), || 3);
        assert_eq!(cache.get_or_insert_with(&LabVector::new(-0.0, 0.0, -0.0), || 7), 3);
        assert_eq!(cache.distinct_colors(), 1);
    }
}
