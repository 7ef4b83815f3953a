use wasm_bindgen::prelude::*;
use image::{self, DynamicImage, GenericImageView, ImageFormat, imageops::FilterType};
use palette::Srgb;
use js_sys::{Uint8Array, Array, Object, Reflect};
use anyhow::{Context, Result};
use tracing::info;

pub mod color;
pub mod convert;
pub mod error;
pub mod format;
pub mod histogram;
pub mod kmeans;
pub mod math;
pub mod memo;
pub mod tolerance;

pub use color::{ColorVector, HsvVector, LabVector};
pub use error::PaletteError;
pub use histogram::{DEFAULT_CAPACITY, HistogramBucketer, build_histogram_palette};
pub use kmeans::{KMeansLab, KMeansOptions, KMeansReport, Termination, refine_by_kmeans};
pub use tolerance::ToleranceTable;

use crate::color::sort_hsv;
use crate::convert::{hsv_to_lab, hsv_to_rgb, lab_to_hsv, rgb_to_hsv, rgb_to_lab};

/// Everything the palette pipeline can be tuned with.
#[derive(Clone, Debug)]
pub struct SwatchOptions {
    /// Maximum number of palette entries.
    pub capacity: usize,
    /// Shrink the image to this percentage before sampling. Ignored outside `1..100`.
    pub resize_percentage: Option<u32>,
    /// Stop after the histogram stage and skip k-means.
    pub histogram_only: bool,
    pub kmeans: KMeansOptions,
    pub tolerances: ToleranceTable,
}

impl Default for SwatchOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resize_percentage: None,
            histogram_only: false,
            kmeans: KMeansOptions::default(),
            tolerances: ToleranceTable::default(),
        }
    }
}

// ------------------------------------------------------------
// Palette pipeline
// ------------------------------------------------------------

/// Build a palette from RGB pixels.
///
/// Steps performed:
/// 1. Convert to HSV and bucket with the tolerance table to get seed colors.
/// 2. Unless `histogram_only`, convert pixels and seeds to Lab and refine the
///    seeds with k-means.
/// 3. Sort the result by (H, S, V).
pub fn palette_from_rgb(
    pixels: &[Srgb<u8>],
    options: &SwatchOptions,
) -> Result<Vec<HsvVector>, PaletteError> {
    options.tolerances.validate()?;

    let hsv_pixels: Vec<HsvVector> = pixels.iter().copied().map(rgb_to_hsv).collect();
    let seeds = build_histogram_palette(&hsv_pixels, &options.tolerances, options.capacity)?;
    info!(pixels = pixels.len(), seeds = seeds.len(), "histogram palette built");

    if options.histogram_only || seeds.is_empty() {
        return Ok(seeds);
    }
    drop(hsv_pixels);

    let lab_pixels: Vec<LabVector> = pixels.iter().copied().map(rgb_to_lab).collect();
    let lab_seeds: Vec<LabVector> = seeds.iter().copied().map(hsv_to_lab).collect();

    let mut kmeans = KMeansLab::new(&lab_seeds);
    let report = kmeans.run(&lab_pixels, &options.kmeans);
    info!(
        iterations = report.iterations,
        termination = ?report.termination,
        parallel = options.kmeans.parallel,
        "k-means palette refined"
    );

    let mut palette: Vec<HsvVector> = kmeans.centers().into_iter().map(lab_to_hsv).collect();
    sort_hsv(&mut palette);
    Ok(palette)
}

// ------------------------------------------------------------
// Image helpers
// ------------------------------------------------------------

/// Pixels of `img` with alpha flattened onto a white background, optionally
/// after a nearest-neighbour shrink to `resize_percentage` percent.
fn flattened_pixels(img: &DynamicImage, resize_percentage: Option<u32>) -> Vec<Srgb<u8>> {
    let working: DynamicImage = match resize_percentage {
        Some(percent) if percent > 0 && percent < 100 => {
            let (w, h) = img.dimensions();
            let scale = percent as f32 / 100.0;
            let w = ((w as f32) * scale).round().max(1.0) as u32;
            let h = ((h as f32) * scale).round().max(1.0) as u32;
            DynamicImage::ImageRgba8(image::imageops::resize(img, w, h, FilterType::Nearest))
        }
        _ => img.clone(),
    };

    working
        .to_rgba8()
        .into_raw()
        .chunks_exact(4)
        .map(|chunk| {
            let alpha = chunk[3] as u32;
            let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            Srgb::new(over_white(chunk[0]), over_white(chunk[1]), over_white(chunk[2]))
        })
        .collect()
}

/// Decode an encoded image and extract its palette as sRGB colors.
pub fn extract_palette_bytes(input: &[u8], options: &SwatchOptions) -> Result<Vec<Srgb<u8>>> {
    let img = image::load_from_memory(input).context("unable to decode image")?;
    let pixels = flattened_pixels(&img, options.resize_percentage);
    let palette = palette_from_rgb(&pixels, options).context("palette extraction failed")?;
    Ok(palette.into_iter().map(hsv_to_rgb).collect())
}

/// Encode the swatch image for `colors` as PNG.
pub fn swatch_png(colors: &[Srgb<u8>]) -> Result<Vec<u8>> {
    let swatch = format::render_swatch(colors);
    let mut buf = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut buf);
        swatch
            .write_to(&mut cursor, ImageFormat::Png)
            .context("PNG encode error")?;
    }
    Ok(buf)
}

// ------------------------------------------------------------
// wasm entry point
// ------------------------------------------------------------

/// Extract a palette from an encoded image.
///
/// Returns `{ palette: string[], swatch: Uint8Array }` where `palette` holds
/// `RRGGBB` hex strings and `swatch` is a PNG preview of them.
/// `tolerances_json` overrides the default tolerance table.
#[wasm_bindgen]
pub fn extract_palette(
    input: Vec<u8>,
    n_colors: usize,
    histogram_only: bool,
    tolerances_json: Option<String>,
) -> Result<Object, JsValue> {
    let tolerances = match tolerances_json {
        Some(json) => ToleranceTable::from_json(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid tolerances: {e}")))?,
        None => ToleranceTable::default(),
    };
    let options = SwatchOptions {
        capacity: n_colors,
        histogram_only,
        tolerances,
        ..SwatchOptions::default()
    };

    let colors = extract_palette_bytes(&input, &options)
        .map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
    let png = swatch_png(&colors).map_err(|e| JsValue::from_str(&format!("{e:#}")))?;

    let palette_js = Array::new();
    for hex in format::hex_list(&colors) {
        palette_js.push(&JsValue::from_str(&hex));
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(&result, &JsValue::from_str("swatch"), &Uint8Array::from(png.as_slice()))?;

    Ok(result)
}
