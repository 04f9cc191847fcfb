//! Summary image generation.
//!
//! After each refresh the service renders an 800x600 PNG listing the number
//! of cached countries, the last refresh time, and the top five countries by
//! estimated GDP. The image is written to `<cache dir>/summary.png` and served
//! as-is by `GET /countries/image`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use tracing::info;

use crate::constants::{SUMMARY_HEIGHT, SUMMARY_IMAGE_FILE, SUMMARY_TOP_N, SUMMARY_WIDTH};
use crate::store::CountryStore;

type Rgb = [u8; 3];

const WHITE: Rgb = [255, 255, 255];
const BLACK: Rgb = [0, 0, 0];

/// Side of a font8x8 glyph in font pixels.
const GLYPH_SIZE: u32 = 8;

/// Title scale (image pixels per font pixel).
const TITLE_SCALE: u32 = 3;
const TEXT_SCALE: u32 = 2;

/// Errors raised while producing or reading the summary image.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Reading the figures from the store failed.
    #[error("failed to read summary data: {0}")]
    Store(#[source] anyhow::Error),

    /// IO error with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding failed.
    #[error("failed to encode summary PNG: {0}")]
    Encode(#[from] png::EncodingError),

    /// The blocking render task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SummaryError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Figures shown on the summary image.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryData {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// `(name, estimated_gdp)` pairs, highest first.
    pub top_countries: Vec<(String, f64)>,
}

impl SummaryData {
    /// Collects the figures from the store.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Store`] if any store read fails.
    pub async fn collect(store: &CountryStore) -> Result<Self, SummaryError> {
        let total_countries = store.count().await.map_err(SummaryError::Store)?;
        let top_countries = store
            .top_by_gdp(SUMMARY_TOP_N)
            .await
            .map_err(SummaryError::Store)?
            .into_iter()
            .map(|country| (country.name, country.estimated_gdp))
            .collect();
        let last_refreshed_at = store
            .status()
            .await
            .map_err(SummaryError::Store)?
            .last_refreshed_at;

        Ok(Self {
            total_countries,
            last_refreshed_at,
            top_countries,
        })
    }

    /// Text lines in drawing order, paired with their position and scale.
    fn lines(&self) -> Vec<(u32, u32, u32, String)> {
        let last_refresh = self.last_refreshed_at.map_or_else(
            || "N/A".to_string(),
            |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );

        let mut lines = vec![
            (50, 50, TITLE_SCALE, "Country Data Summary".to_string()),
            (
                50,
                120,
                TEXT_SCALE,
                format!("Total Countries Cached: {}", self.total_countries),
            ),
            (50, 160, TEXT_SCALE, format!("Last Refresh: {last_refresh}")),
            (
                50,
                220,
                TEXT_SCALE,
                "Top 5 Countries by Estimated GDP:".to_string(),
            ),
        ];

        for (i, (name, gdp)) in self.top_countries.iter().enumerate() {
            let y = 260 + 30 * i as u32;
            lines.push((70, y, TEXT_SCALE, gdp_line(name, *gdp)));
        }
        lines
    }

    /// Renders the summary as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn render(&self) -> Result<Vec<u8>, SummaryError> {
        let mut canvas = Canvas::new(SUMMARY_WIDTH, SUMMARY_HEIGHT, WHITE);
        for (x, y, scale, text) in self.lines() {
            canvas.draw_text(x, y, scale, &text, BLACK);
        }
        canvas.encode_png()
    }
}

/// `- Name: $12.34 Billion`
fn gdp_line(name: &str, gdp: f64) -> String {
    format!("- {name}: ${:.2} Billion", gdp / 1_000_000_000.0)
}

/// RGB raster with clipped drawing.
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Self {
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                let idx = (py as usize * self.width as usize + px as usize) * 3;
                self.pixels[idx..idx + 3].copy_from_slice(&color);
            }
        }
    }

    fn draw_text(&mut self, x: u32, y: u32, scale: u32, text: &str, color: Rgb) {
        let mut cursor = x;
        for c in text.chars() {
            if cursor >= self.width {
                break;
            }
            // font8x8 rows are bytes with the leftmost pixel in bit 0.
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) != 0 {
                        self.fill_rect(
                            cursor + col * scale,
                            y + row as u32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
            cursor = cursor.saturating_add(GLYPH_SIZE * scale);
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, SummaryError> {
        let mut bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut bytes, self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.pixels)?;
        writer.finish()?;
        Ok(bytes)
    }
}

/// Glyph for `c`; accented Latin letters come from the Latin-1 table and
/// anything else unknown renders as `?`.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or_default()
}

/// Location of the cached summary image.
#[derive(Debug, Clone)]
pub struct SummaryImage {
    dir: PathBuf,
}

impl SummaryImage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SUMMARY_IMAGE_FILE)
    }

    /// Re-renders the image from current store contents.
    ///
    /// The file is replaced atomically, so readers never see a partial image.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, rendering fails, or the
    /// file cannot be written.
    pub async fn regenerate(&self, store: &CountryStore) -> Result<PathBuf, SummaryError> {
        let data = SummaryData::collect(store).await?;
        let path = self.path();
        let dir = self.dir.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_summary(&dir, &target, &data)).await??;

        info!(path = %path.display(), "Summary image generated");
        Ok(path)
    }

    /// Reads the cached image, `None` if it has not been generated yet.
    ///
    /// # Errors
    ///
    /// Returns an error for IO failures other than a missing file.
    pub async fn load(&self) -> Result<Option<Vec<u8>>, SummaryError> {
        let path = self.path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SummaryError::io(format!("reading {}", path.display()), e)),
        }
    }
}

fn write_summary(dir: &Path, path: &Path, data: &SummaryData) -> Result<(), SummaryError> {
    let bytes = data.render()?;

    std::fs::create_dir_all(dir)
        .map_err(|e| SummaryError::io(format!("creating {}", dir.display()), e))?;

    let tmp = path.with_extension("png.tmp");
    std::fs::write(&tmp, bytes)
        .map_err(|e| SummaryError::io(format!("writing {}", tmp.display()), e))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| SummaryError::io(format!("replacing {}", path.display()), e))?;
    Ok(())
}
