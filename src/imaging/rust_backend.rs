//! Pure Rust card backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Fill canvas | `calculate_fill_dimensions` + `resize_exact` (Lanczos3) + centre `crop_imm` |
//! | Overlay | `resvg` (usvg parse, tiny-skia raster) |
//! | Composite | `image::imageops::overlay` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Text is shaped with fonts from the system font database. The database maps
//! the generic `serif` and `sans-serif` families to fixed names ("Times New
//! Roman", "Arial") that many hosts lack, and resvg silently drops text it
//! cannot resolve. So each generic family is checked after loading and, when
//! unresolved, pointed at an installed face. A font file can be loaded on top;
//! it then serves both generic families.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_fill_dimensions, center_crop_offset};
use super::params::ComposeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use resvg::usvg::fontdb::{Database, Family, Query};

/// Whether the database has a face for `family`.
fn resolves(db: &Database, family: Family<'_>) -> bool {
    db.query(&Query {
        families: &[family],
        ..Query::default()
    })
    .is_some()
}

/// An installed family name, preferring one that contains `hint`.
fn installed_family(db: &Database, hint: &str, avoid: &str) -> Option<String> {
    let names: Vec<&str> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.as_str()))
        .collect();
    names
        .iter()
        .find(|name| name.contains(hint) && !name.contains(avoid))
        .or_else(|| names.first())
        .map(|name| name.to_string())
}

/// Point unresolved generic families at installed faces.
///
/// Fails when the database has no faces at all, since every text run would
/// be dropped.
fn resolve_generic_families(db: &mut Database) -> Result<(), BackendError> {
    if db.len() == 0 {
        return Err(BackendError::InvalidInput(
            "no fonts available; install a font or set layout.font_path".to_string(),
        ));
    }
    if !resolves(db, Family::Serif)
        && let Some(family) = installed_family(db, "Serif", "Sans")
    {
        warn!(%family, "generic serif family not installed, using fallback");
        db.set_serif_family(family);
    }
    if !resolves(db, Family::SansSerif)
        && let Some(family) = installed_family(db, "Sans", "Mono")
    {
        warn!(%family, "generic sans-serif family not installed, using fallback");
        db.set_sans_serif_family(family);
    }
    Ok(())
}

/// Pure Rust backend using the `image` and `resvg` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    fontdb: Arc<Database>,
}

impl RustBackend {
    /// Backend using system fonts only.
    pub fn new() -> Result<Self, BackendError> {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system fonts");
        resolve_generic_families(&mut db)?;
        Ok(Self {
            fontdb: Arc::new(db),
        })
    }

    /// Backend with an extra font file that also backs the generic families.
    pub fn with_font_file(path: &Path) -> Result<Self, BackendError> {
        let mut db = Database::new();
        db.load_system_fonts();
        let before = db.len();
        db.load_font_file(path).map_err(|e| {
            BackendError::InvalidInput(format!("failed to load font {}: {e}", path.display()))
        })?;
        let family = db
            .faces()
            .skip(before)
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| {
                BackendError::InvalidInput(format!("no usable face in {}", path.display()))
            })?;
        db.set_serif_family(family.clone());
        db.set_sans_serif_family(family.clone());
        debug!(%family, path = %path.display(), "loaded font file");
        Ok(Self {
            fontdb: Arc::new(db),
        })
    }

    /// Rasterize overlay markup onto a transparent canvas.
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| BackendError::Overlay(e.to_string()))?;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| BackendError::InvalidInput(format!("bad canvas {width}x{height}")))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let mut layer = RgbaImage::new(width, height);
        for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(layer)
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    if bytes.is_empty() {
        return Err(BackendError::Decode("empty image payload".to_string()));
    }
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Resize to cover the canvas, then centre crop to it exactly.
fn fill_canvas(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (fill_w, fill_h) = calculate_fill_dimensions((img.width(), img.height()), (width, height));
    let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
    let (x, y) = center_crop_offset((fill_w, fill_h), (width, height));
    filled.crop_imm(x, y, width, height)
}

fn encode_jpeg(img: RgbaImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality as u8);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn compose(&self, params: &ComposeParams<'_>) -> Result<Vec<u8>, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::InvalidInput(format!(
                "bad canvas {}x{}",
                params.width, params.height
            )));
        }
        let background = decode(params.background)?;
        let mut canvas = fill_canvas(&background, params.width, params.height).to_rgba8();
        let layer = self.rasterize(params.overlay_svg, params.width, params.height)?;
        image::imageops::overlay(&mut canvas, &layer, 0, 0);
        encode_jpeg(canvas, params.quality.value())
    }
}
