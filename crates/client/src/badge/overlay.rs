//! Count overlay drawn onto the application icon.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use outpost_core::AppConfig;

use super::sink::{BadgeError, BadgeSink};

const BADGE_FILL: Rgba<u8> = Rgba([220, 38, 38, 255]);
const BADGE_INK: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Edge length of the rendered icon, in pixels.
pub const ICON_SIZE: u32 = 192;

/// 3x5 bitmap glyphs, one row per byte, high bit on the left.
const GLYPH_ROWS: usize = 5;
const GLYPH_COLS: u32 = 3;

fn glyph(c: char) -> [u8; GLYPH_ROWS] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        _ => [0; GLYPH_ROWS],
    }
}

/// Badge text, capped at three characters.
pub fn badge_label(count: u32) -> String {
    if count > 99 { "99+".to_string() } else { count.to_string() }
}

/// Draw `count` onto `base` and encode the result as PNG.
///
/// A zero count yields the plain resized icon.
pub fn render_overlay(base: &DynamicImage, size: u32, count: u32) -> Result<Vec<u8>, BadgeError> {
    let mut canvas = base.resize_exact(size, size, FilterType::Triangle).to_rgba8();
    if count > 0 {
        draw_badge(&mut canvas, &badge_label(count));
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| BadgeError::Render(e.to_string()))?;
    Ok(png)
}

fn draw_badge(canvas: &mut RgbaImage, label: &str) {
    let size = canvas.width().min(canvas.height());
    let radius = (size / 4).max(4);
    let outline = (size / 32).max(1);
    let cx = size.saturating_sub(radius + 1) as f32;
    let cy = (radius + 1) as f32;

    let (r, inner) = (radius as f32, (radius - outline) as f32);
    for y in 0..(radius * 2 + 2).min(canvas.height()) {
        for x in size.saturating_sub(radius * 2 + 2)..canvas.width() {
            let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
            let distance = (dx * dx + dy * dy).sqrt();
            if distance <= inner {
                canvas.put_pixel(x, y, BADGE_FILL);
            } else if distance <= r {
                canvas.put_pixel(x, y, BADGE_INK);
            }
        }
    }

    let chars = label.chars().count() as u32;
    let text_units = chars * (GLYPH_COLS + 1) - 1;
    let scale = ((radius * 3 / 2) / text_units).min(radius / GLYPH_ROWS as u32).max(1);
    let left = (cx as u32).saturating_sub(text_units * scale / 2);
    let top = (cy as u32).saturating_sub(GLYPH_ROWS as u32 * scale / 2);

    for (i, c) in label.chars().enumerate() {
        let origin_x = left + i as u32 * (GLYPH_COLS + 1) * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                fill_block(canvas, origin_x + col * scale, top + row as u32 * scale, scale);
            }
        }
    }
}

fn fill_block(canvas: &mut RgbaImage, x: u32, y: u32, scale: u32) {
    for py in y..(y + scale).min(canvas.height()) {
        for px in x..(x + scale).min(canvas.width()) {
            canvas.put_pixel(px, py, BADGE_INK);
        }
    }
}

/// Renders the badge onto the application icon and keeps the latest PNG as
/// the active icon.
pub struct IconOverlay {
    base_icon: PathBuf,
    size: u32,
    current: RwLock<Option<Arc<Vec<u8>>>>,
}

impl IconOverlay {
    pub fn new(base_icon: impl Into<PathBuf>, size: u32) -> Self {
        Self { base_icon: base_icon.into(), size, current: RwLock::new(None) }
    }

    /// Overlay on the configured base icon; `None` when no icon is configured.
    pub fn from_app(config: &AppConfig) -> Option<Self> {
        config.badge_icon_path.as_ref().map(|path| Self::new(path.clone(), ICON_SIZE))
    }

    /// The active icon, if an overlay has been rendered.
    pub fn current(&self) -> Option<Arc<Vec<u8>>> {
        self.current.read().ok().and_then(|icon| icon.clone())
    }
}

fn load_icon(path: &Path) -> Result<DynamicImage, BadgeError> {
    ImageReader::open(path)
        .map_err(|e| BadgeError::IconUnavailable(format!("{}: {e}", path.display())))?
        .decode()
        .map_err(|e| BadgeError::IconUnavailable(format!("{}: {e}", path.display())))
}

#[async_trait]
impl BadgeSink for IconOverlay {
    fn name(&self) -> &'static str {
        "icon-overlay"
    }

    async fn project(&self, count: u32) -> Result<(), BadgeError> {
        let path = self.base_icon.clone();
        let size = self.size;
        let png = tokio::task::spawn_blocking(move || render_overlay(&load_icon(&path)?, size, count))
            .await
            .map_err(|e| BadgeError::Render(e.to_string()))??;

        if let Ok(mut current) = self.current.write() {
            *current = Some(Arc::new(png));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Rgba<u8> = Rgba([10, 120, 200, 255]);

    fn base_icon(size: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, BASE))
    }

    fn decode(png: &[u8]) -> RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn test_badge_label_caps() {
        assert_eq!(badge_label(7), "7");
        assert_eq!(badge_label(99), "99");
        assert_eq!(badge_label(100), "99+");
    }

    #[test]
    fn test_overlay_draws_top_right_badge() {
        let icon = decode(&render_overlay(&base_icon(128), 64, 3).unwrap());
        assert_eq!(icon.dimensions(), (64, 64));
        assert_eq!(*icon.get_pixel(47, 5), BADGE_FILL);
        assert_eq!(*icon.get_pixel(2, 60), BASE);
    }

    #[test]
    fn test_overlay_text_is_drawn() {
        let icon = decode(&render_overlay(&base_icon(64), 64, 150).unwrap());
        let ink = icon.pixels().filter(|p| **p == BADGE_INK).count();
        let plain = decode(&render_overlay(&base_icon(64), 64, 1).unwrap());
        let plain_ink = plain.pixels().filter(|p| **p == BADGE_INK).count();
        assert!(ink > plain_ink);
    }

    #[test]
    fn test_zero_count_is_plain_icon() {
        let icon = decode(&render_overlay(&base_icon(64), 64, 0).unwrap());
        assert!(icon.pixels().all(|p| *p == BASE));
    }

    #[tokio::test]
    async fn test_from_app_uses_configured_icon() {
        assert!(IconOverlay::from_app(&AppConfig::default()).is_none());

        let path = std::env::temp_dir().join(format!("outpost-app-icon-{}.png", std::process::id()));
        base_icon(48).save(&path).unwrap();
        let config = AppConfig { badge_icon_path: Some(path.clone()), ..AppConfig::default() };

        let overlay = IconOverlay::from_app(&config).unwrap();
        overlay.project(3).await.unwrap();
        let icon = decode(&overlay.current().unwrap());
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_missing_base_icon_is_skipped() {
        let overlay = IconOverlay::new("/nonexistent/outpost/icon.png", 64);
        let err = overlay.project(4).await.unwrap_err();
        assert!(matches!(err, BadgeError::IconUnavailable(_)));
        assert!(overlay.current().is_none());
    }

    #[tokio::test]
    async fn test_project_replaces_active_icon() {
        let path = std::env::temp_dir().join(format!("outpost-badge-{}.png", std::process::id()));
        base_icon(32).save(&path).unwrap();

        let overlay = IconOverlay::new(&path, 32);
        overlay.project(2).await.unwrap();
        let first = overlay.current().unwrap();
        overlay.project(0).await.unwrap();
        let second = overlay.current().unwrap();

        assert_ne!(first, second);
        assert!(decode(&second).pixels().all(|p| *p == BASE));
        let _ = std::fs::remove_file(path);
    }
}
