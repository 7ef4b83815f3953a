//! Distance and running-mean kernels shared by the sequential and parallel
//! clustering paths.

use crate::color::ColorVector;

/// Circular distance between two normalized hues, in normalized units.
///
/// `delta_hue(0.01, 0.99)` is `0.02`, not `0.98`.
#[inline(always)]
pub fn delta_hue(hue1: f64, hue2: f64) -> f64 {
    let diff = (hue1 - hue2).abs();
    diff.min(1.0 - diff)
}

/// Fold one more value into a mean built from `count` values.
#[inline(always)]
pub fn calculate_new_mean(mean: f64, count: usize, new_value: f64) -> f64 {
    let count = count as f64;
    (mean * count + new_value) / (count + 1.0)
}

/// Weighted combination of two means. At least one count must be non-zero.
#[inline(always)]
pub fn add_means(mean: f64, count: usize, other_mean: f64, other_count: usize) -> f64 {
    let (count, other_count) = (count as f64, other_count as f64);
    (mean * count + other_mean * other_count) / (count + other_count)
}

/// Component-wise [`calculate_new_mean`].
#[inline(always)]
pub fn new_mean<T: ColorVector>(mean: T, count: usize, new_color: T) -> T {
    let [x, y, z] = mean.components();
    let [nx, ny, nz] = new_color.components();
    T::from_components([
        calculate_new_mean(x, count, nx),
        calculate_new_mean(y, count, ny),
        calculate_new_mean(z, count, nz),
    ])
}

/// Component-wise [`add_means`].
///
/// A zero-count side contributes nothing: the other mean is returned as is.
/// When both counts are zero the first mean is returned.
#[inline(always)]
pub fn combine_means<T: ColorVector>(mean: T, count: usize, other: T, other_count: usize) -> T {
    if other_count == 0 {
        return mean;
    }
    if count == 0 {
        return other;
    }

    let [x, y, z] = mean.components();
    let [ox, oy, oz] = other.components();
    T::from_components([
        add_means(x, count, ox, other_count),
        add_means(y, count, oy, other_count),
        add_means(z, count, oz, other_count),
    ])
}

#[inline(always)]
pub fn distance_squared<T: ColorVector>(color1: T, color2: T) -> f64 {
    let [x1, y1, z1] = color1.components();
    let [x2, y2, z2] = color2.components();
    let (dx, dy, dz) = (x2 - x1, y2 - y1, z2 - z1);
    dx * dx + dy * dy + dz * dz
}

#[inline(always)]
pub fn distance<T: ColorVector>(color1: T, color2: T) -> f64 {
    distance_squared(color1, color2).sqrt()
}
