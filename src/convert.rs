//! RGB, HSV and Lab conversions backed by `palette`.

use palette::encoding;
use palette::white_point::D65;
use palette::{FromColor, Hsv, Lab, LinSrgb, Srgb};

use crate::color::{HsvVector, LabVector};

type HsvF64 = Hsv<encoding::Srgb, f64>;
type LabF64 = Lab<D65, f64>;

fn hsv_from_srgb(srgb: Srgb<f64>) -> HsvVector {
    let hsv = HsvF64::from_color(srgb);
    HsvVector::new(
        (hsv.hue.into_positive_degrees() / 360.0).rem_euclid(1.0),
        hsv.saturation,
        hsv.value,
    )
}

fn lab_from_srgb(srgb: Srgb<f64>) -> LabVector {
    let linear: LinSrgb<f64> = srgb.into_linear();
    let lab = LabF64::from_color(linear);
    LabVector::new(lab.l, lab.a, lab.b)
}

pub fn rgb_to_hsv(rgb: Srgb<u8>) -> HsvVector {
    hsv_from_srgb(rgb.into_format())
}

pub fn rgb_to_lab(rgb: Srgb<u8>) -> LabVector {
    lab_from_srgb(rgb.into_format())
}

fn hsv_to_srgb(hsv: HsvVector) -> Srgb<f64> {
    Srgb::from_color(HsvF64::new(hsv.h * 360.0, hsv.s, hsv.v))
}

/// Out-of-gamut Lab colors are clamped to sRGB first.
fn lab_to_srgb(lab: LabVector) -> Srgb<f64> {
    Srgb::from_color(LabF64::new(lab.l, lab.a, lab.b))
}

pub fn hsv_to_rgb(hsv: HsvVector) -> Srgb<u8> {
    hsv_to_srgb(hsv).into_format()
}

pub fn hsv_to_lab(hsv: HsvVector) -> LabVector {
    lab_from_srgb(hsv_to_srgb(hsv))
}

pub fn lab_to_hsv(lab: LabVector) -> HsvVector {
    hsv_from_srgb(lab_to_srgb(lab))
}

/// `RRGGBB`, upper case, no leading `#`.
pub fn to_hex(rgb: Srgb<u8>) -> String {
    format!("{:02X}{:02X}{:02X}", rgb.red, rgb.green, rgb.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_to_hsv() {
        let red = rgb_to_hsv(Srgb::new(255, 0, 0));
        assert!(red.h.abs() < 1e-9 && (red.s - 1.0).abs() < 1e-9 && (red.v - 1.0).abs() < 1e-9);

        let blue = rgb_to_hsv(Srgb::new(0, 0, 255));
        assert!((blue.h - 2.0 / 3.0).abs() < 1e-9);

        let gray = rgb_to_hsv(Srgb::new(128, 128, 128));
        assert_eq!(gray.s, 0.0);
    }

    #[test]
    fn red_to_lab() {
        let lab = rgb_to_lab(Srgb::new(255, 0, 0));
        assert!((lab.l - 53.23).abs() < 0.1, "{lab}");
        assert!((lab.a - 80.10).abs() < 0.1, "{lab}");
        assert!((lab.b - 67.21).abs() < 0.1, "{lab}");
    }

    #[test]
    fn rgb_survives_lab_and_hsv() {
        for rgb in [Srgb::new(12, 200, 77), Srgb::new(255, 255, 255), Srgb::new(0, 0, 0)] {
            assert_eq!(hsv_to_rgb(lab_to_hsv(rgb_to_lab(rgb))), rgb);
            assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb);
        }
    }

    #[test]
    fn hex_is_upper_case() {
        assert_eq!(to_hex(Srgb::new(255, 10, 171)), "FF0AAB");
    }
}
