//! Palette writers: hex strings, GIMP `.gpl` text and PNG swatches.

use image::{Rgba, RgbaImage};
use palette::Srgb;

use crate::convert::to_hex;

pub const SWATCH_SIZE: u32 = 64;
pub const SWATCH_COLUMNS: u32 = 8;

pub fn hex_list(colors: &[Srgb<u8>]) -> Vec<String> {
    colors.iter().copied().map(to_hex).collect()
}

/// GIMP palette file contents, one line per entry.
pub fn to_gpl(colors: &[Srgb<u8>], name: &str) -> Vec<String> {
    let mut lines = vec![
        "GIMP Palette".to_string(),
        format!("Name: {name}"),
        format!("Columns: {}", colors.len()),
        "#".to_string(),
    ];
    lines.extend(
        colors
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:3} {:3} {:3}\t#{i}", c.red, c.green, c.blue)),
    );
    lines
}

/// Draws one `SWATCH_SIZE` square per color, `SWATCH_COLUMNS` to a row, on a
/// transparent background.
pub fn render_swatch(colors: &[Srgb<u8>]) -> RgbaImage {
    let rows = (colors.len() as u32).div_ceil(SWATCH_COLUMNS).max(1);
    let mut image = RgbaImage::new(SWATCH_COLUMNS * SWATCH_SIZE, rows * SWATCH_SIZE);

    for (i, color) in colors.iter().enumerate() {
        let x0 = (i as u32 % SWATCH_COLUMNS) * SWATCH_SIZE;
        let y0 = (i as u32 / SWATCH_COLUMNS) * SWATCH_SIZE;
        let pixel = Rgba([color.red, color.green, color.blue, 255]);
        for y in y0..y0 + SWATCH_SIZE {
            for x in x0..x0 + SWATCH_SIZE {
                image.put_pixel(x, y, pixel);
            }
        }
    }
    image
}
