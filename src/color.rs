use std::cmp::Ordering;
use std::fmt;

/// A color expressed as three `f64` components.
///
/// The distance and mean kernels in [`crate::math`] are generic over this
/// trait so that every call site is monomorphized; there is no dynamic
/// dispatch on the hot path.
pub trait ColorVector: Copy {
    fn components(&self) -> [f64; 3];
    fn from_components(components: [f64; 3]) -> Self;
}

/// Hue, saturation and value, each normalized to `[0, 1)`.
///
/// Hue is circular: `0.0` and `1.0` are the same angle. Equality is exact;
/// tolerance-aware comparison lives in [`crate::tolerance`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HsvVector {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl HsvVector {
    pub const fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Lexicographic order on (H, S, V). Used to present palettes in a stable order.
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.h
            .total_cmp(&other.h)
            .then_with(|| self.s.total_cmp(&other.s))
            .then_with(|| self.v.total_cmp(&other.v))
    }
}

impl ColorVector for HsvVector {
    #[inline(always)]
    fn components(&self) -> [f64; 3] {
        [self.h, self.s, self.v]
    }

    #[inline(always)]
    fn from_components([h, s, v]: [f64; 3]) -> Self {
        Self { h, s, v }
    }
}

impl fmt::Display for HsvVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsv({:.4}, {:.4}, {:.4})", self.h, self.s, self.v)
    }
}

/// CIE L\*a\*b\* color. Components are not range-checked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LabVector {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl LabVector {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

impl ColorVector for LabVector {
    #[inline(always)]
    fn components(&self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    #[inline(always)]
    fn from_components([l, a, b]: [f64; 3]) -> Self {
        Self { l, a, b }
    }
}

impl fmt::Display for LabVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lab({:.3}, {:.3}, {:.3})", self.l, self.a, self.b)
    }
}

/// Sort HSV colors ascending by (H, S, V) in place.
pub fn sort_hsv(colors: &mut [HsvVector]) {
    colors.sort_by(HsvVector::lexicographic_cmp);
}
