//! Full-diagram raster and document export.
//!
//! Export re-renders the diagram offscreen with a temporary surface and view
//! transform that map the content bounds (plus margin) onto the output
//! exactly, so the result never depends on the on-screen pan and zoom. The
//! swap is held by [`ExportScope`], which puts the live viewport back when
//! dropped.

use serde::Serialize;
use thiserror::Error;

use crate::render::Surface;
use crate::view::{DiagramView, ViewTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Pdf,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Pixel size of the raster (for PDF, of the embedded raster).
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there is no diagram to export")]
    NoDiagram,
    #[error("raster output is not available in this build")]
    RasterUnavailable,
    #[error("failed to parse the rendered SVG")]
    SvgParse,
    #[error("failed to allocate a {0}x{1} pixmap")]
    PixmapAlloc(u32, u32),
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("document export is not available in this build")]
    PdfUnavailable,
    #[error("failed to convert to PDF")]
    PdfConvert,
}

/// Temporarily replaces the view's surface and transform.
struct ExportScope<'a> {
    view: &'a mut DiagramView,
    saved: Option<(Surface, ViewTransform)>,
}

impl<'a> ExportScope<'a> {
    fn enter(view: &'a mut DiagramView, surface: Surface, transform: ViewTransform) -> Self {
        let saved = view.replace_viewport(surface, transform);
        Self {
            view,
            saved: Some(saved),
        }
    }

    fn render(&self) -> String {
        self.view.render()
    }
}

impl Drop for ExportScope<'_> {
    fn drop(&mut self) {
        if let Some((surface, transform)) = self.saved.take() {
            self.view.replace_viewport(surface, transform);
        }
    }
}

/// Renders the whole diagram at `export_scale` times the device pixel ratio.
/// A PDF request that cannot be fulfilled yields the PNG artifact instead.
pub fn export_diagram(view: &mut DiagramView, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
    let bounds = view
        .layout()
        .map(|layout| layout.content_bounds())
        .filter(|bounds| bounds.is_valid())
        .ok_or(ExportError::NoDiagram)?;

    let render_cfg = &view.config().render;
    let margin = render_cfg.content_margin;
    let w = bounds.width() + margin * 2.0;
    let h = bounds.height() + margin * 2.0;
    let dpr = render_cfg.export_scale * view.surface().device_pixel_ratio;
    let font_family = view.config().theme.font_family.clone();

    let surface = Surface::new(w, h, dpr);
    let transform = ViewTransform {
        scale: 1.0,
        tx: -(bounds.min_x - margin),
        ty: -(bounds.min_y - margin),
    };
    let svg = {
        let scope = ExportScope::enter(view, surface, transform);
        scope.render()
    };

    let png = svg_to_png(&svg, &font_family)?;
    let artifact = ExportArtifact {
        format: ExportFormat::Png,
        bytes: png,
        width: surface.pixel_width(),
        height: surface.pixel_height(),
    };
    tracing::debug!(width = artifact.width, height = artifact.height, "rendered export raster");

    match format {
        ExportFormat::Png => Ok(artifact),
        ExportFormat::Pdf => match png_to_pdf(&artifact.bytes, w, h) {
            Ok(pdf) => Ok(ExportArtifact {
                format: ExportFormat::Pdf,
                bytes: pdf,
                ..artifact
            }),
            Err(err) => {
                tracing::warn!(error = %err, "PDF export unavailable, falling back to PNG");
                Ok(artifact)
            }
        },
    }
}

/// The current frame exactly as displayed.
pub fn snapshot(view: &DiagramView) -> Result<ExportArtifact, ExportError> {
    let surface = view.surface();
    let svg = view.render();
    Ok(ExportArtifact {
        format: ExportFormat::Png,
        bytes: svg_to_png(&svg, &view.config().theme.font_family)?,
        width: surface.pixel_width(),
        height: surface.pixel_height(),
    })
}

#[cfg(feature = "png")]
mod raster {
    use super::ExportError;
    use once_cell::sync::Lazy;
    use resvg::tiny_skia;
    use std::sync::Arc;

    static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    });

    pub(super) fn svg_to_pixmap(svg: &str, font_family: &str) -> Result<tiny_skia::Pixmap, ExportError> {
        let mut opt = usvg::Options::default();
        opt.fontdb = FONT_DB.clone();
        if let Some(primary) = font_family.split(',').map(str::trim).find(|name| !name.is_empty()) {
            opt.font_family = primary.trim_matches('"').to_string();
        }
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| ExportError::SvgParse)?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or(ExportError::PixmapAlloc(size.width(), size.height()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

#[cfg(feature = "png")]
pub fn svg_to_png(svg: &str, font_family: &str) -> Result<Vec<u8>, ExportError> {
    raster::svg_to_pixmap(svg, font_family)?
        .encode_png()
        .map_err(|_| ExportError::PngEncode)
}

#[cfg(not(feature = "png"))]
pub fn svg_to_png(_svg: &str, _font_family: &str) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::RasterUnavailable)
}

/// One page of `width x height` points with the raster stretched over it.
#[cfg(feature = "pdf")]
pub fn png_to_pdf(png: &[u8], width: f32, height: f32) -> Result<Vec<u8>, ExportError> {
    use base64::Engine as _;

    let encoded = base64::engine::general_purpose::STANDARD.encode(png);
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\"><image x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"data:image/png;base64,{encoded}\"/></svg>"
    );
    let opt = svg2pdf::usvg::Options::default();
    let tree = svg2pdf::usvg::Tree::from_str(&svg, &opt).map_err(|_| ExportError::SvgParse)?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| ExportError::PdfConvert)
}

#[cfg(not(feature = "pdf"))]
pub fn png_to_pdf(_png: &[u8], _width: f32, _height: f32) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::PdfUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::{Automaton, State, StateShape};

    fn view() -> DiagramView {
        let mut config = Config::default();
        config.layout.fast_text_metrics = true;
        let mut view = DiagramView::new(config);
        let mut automaton = Automaton::new("q0");
        automaton.insert_state("q0", State::new(StateShape::Oval).with_transition("a", "q1"));
        automaton.insert_state("q1", State::new(StateShape::Rectangle));
        view.set_automaton(Some(automaton));
        view
    }

    #[test]
    fn scope_restores_viewport_on_drop() {
        let mut view = view();
        let surface = view.surface();
        let transform = view.transform();
        {
            let scope = ExportScope::enter(
                &mut view,
                Surface::new(10.0, 10.0, 4.0),
                ViewTransform {
                    scale: 1.0,
                    tx: 5.0,
                    ty: 5.0,
                },
            );
            assert!(scope.render().contains("width=\"40\""));
        }
        assert_eq!(view.surface(), surface);
        assert_eq!(view.transform(), transform);
    }

    #[test]
    fn export_without_diagram_fails_cleanly() {
        let mut view = DiagramView::new(Config::default());
        assert!(matches!(
            export_diagram(&mut view, ExportFormat::Png),
            Err(ExportError::NoDiagram)
        ));
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_export_covers_content_at_double_density() {
        let mut view = view();
        let before = view.transform();
        let bounds = view.layout().unwrap().content_bounds();
        let artifact = export_diagram(&mut view, ExportFormat::Png).unwrap();
        assert_eq!(artifact.format, ExportFormat::Png);
        assert!(artifact.bytes.starts_with(b"\x89PNG"));
        assert_eq!(artifact.width, ((bounds.width() + 80.0) * 2.0).floor() as u32);
        assert_eq!(artifact.height, ((bounds.height() + 80.0) * 2.0).floor() as u32);
        assert_eq!(view.transform(), before);
    }

    #[cfg(all(feature = "png", not(feature = "pdf")))]
    #[test]
    fn pdf_request_falls_back_to_png() {
        let mut view = view();
        let artifact = view.export_pdf().unwrap();
        assert_eq!(artifact.format, ExportFormat::Png);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_export_produces_document() {
        let mut view = view();
        let artifact = view.export_pdf().unwrap();
        assert_eq!(artifact.format, ExportFormat::Pdf);
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }
}
