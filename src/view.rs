//! Interaction and view state for one diagram instance.
//!
//! `DiagramView` owns the pan/zoom transform, the manual position overrides
//! written by node drags, the pointer gesture state machine and the cached
//! layout. Layout is recomputed only when the automaton or the overrides
//! change; pan and zoom just produce a new frame.

use indexmap::IndexMap;

use crate::config::Config;
use crate::export::{self, ExportArtifact, ExportFormat};
use crate::geometry::{Point, shape_contains};
use crate::ir::Automaton;
use crate::layout::{Layout, compute_layout};
use crate::render::{Surface, render_frame};

/// Maps world coordinates to CSS pixels: `screen = world * scale + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn screen_to_world(&self, p: Point) -> Point {
        ((p.0 - self.tx) / self.scale, (p.1 - self.ty) / self.scale)
    }

    pub fn world_to_screen(&self, p: Point) -> Point {
        (p.0 * self.scale + self.tx, p.1 * self.scale + self.ty)
    }
}

/// Pointer gesture in progress. Panning and dragging never overlap.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    Dragging {
        node: String,
        /// Pointer position relative to the node center, in world units.
        offset: Point,
    },
}

#[derive(Debug, Clone)]
pub struct DiagramView {
    automaton: Option<Automaton>,
    config: Config,
    transform: ViewTransform,
    surface: Surface,
    overrides: IndexMap<String, Point>,
    gesture: Gesture,
    layout: Option<Layout>,
    auto_fit_done: bool,
}

impl DiagramView {
    pub fn new(config: Config) -> Self {
        let surface = Surface::new(
            config.render.width,
            config.render.height,
            config.render.device_pixel_ratio,
        );
        Self {
            automaton: None,
            config,
            transform: ViewTransform::default(),
            surface,
            overrides: IndexMap::new(),
            gesture: Gesture::Idle,
            layout: None,
            auto_fit_done: false,
        }
    }

    /// Replaces the diagram. Overrides and any gesture belong to the old
    /// automaton and are dropped. The first layout of this instance is
    /// fitted to the viewport once.
    pub fn set_automaton(&mut self, automaton: Option<Automaton>) {
        self.automaton = automaton;
        self.overrides.clear();
        self.gesture = Gesture::Idle;
        self.relayout();
        if !self.auto_fit_done && self.layout.is_some() {
            self.auto_fit_done = self.fit_to_content();
        }
    }

    pub fn automaton(&self) -> Option<&Automaton> {
        self.automaton.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = ViewTransform {
            scale: self.config.render.clamp_scale(transform.scale),
            ..transform
        };
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn overrides(&self) -> &IndexMap<String, Point> {
        &self.overrides
    }

    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.surface = Surface::new(width, height, device_pixel_ratio);
    }

    pub fn set_override(&mut self, node: &str, position: Point) {
        self.overrides.insert(node.to_string(), position);
        self.relayout();
    }

    pub fn clear_overrides(&mut self) {
        if self.overrides.is_empty() {
            return;
        }
        self.overrides.clear();
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = match &self.automaton {
            None => None,
            Some(automaton) => match compute_layout(
                automaton,
                &self.config.theme,
                &self.config.layout,
                &self.overrides,
            ) {
                Ok(layout) => Some(layout),
                Err(err) => {
                    tracing::warn!(error = %err, "cannot lay out automaton, showing placeholder");
                    None
                }
            },
        };
    }

    pub fn screen_to_world(&self, p: Point) -> Point {
        self.transform.screen_to_world(p)
    }

    /// Topmost node under a world point. Later-declared nodes are drawn on
    /// top, so they are tested first.
    pub fn hit_test(&self, world: Point) -> Option<&str> {
        let layout = self.layout.as_ref()?;
        layout
            .nodes
            .values()
            .rev()
            .find(|node| shape_contains(node.center(), node.rx, node.ry, node.shape, world))
            .map(|node| node.id.as_str())
    }

    /// Starts a drag when the pointer lands on a node, otherwise a pan.
    pub fn pointer_down(&mut self, screen: Point) {
        let world = self.screen_to_world(screen);
        let hit = self.hit_test(world).and_then(|id| {
            let node = self.layout.as_ref()?.nodes.get(id)?;
            Some((id.to_string(), (world.0 - node.x, world.1 - node.y)))
        });
        self.gesture = match hit {
            Some((node, offset)) => Gesture::Dragging { node, offset },
            None => Gesture::Panning { last: screen },
        };
    }

    /// Returns whether the frame needs repainting.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Panning { last } => {
                self.transform.tx += screen.0 - last.0;
                self.transform.ty += screen.1 - last.1;
                *last = screen;
                true
            }
            Gesture::Dragging { node, offset } => {
                let world = self.transform.screen_to_world(screen);
                let position = (world.0 - offset.0, world.1 - offset.1);
                let node = node.clone();
                self.set_override(&node, position);
                true
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// One wheel notch: negative `delta_y` zooms in.
    pub fn wheel(&mut self, screen: Point, delta_y: f32) {
        let factor = if delta_y < 0.0 {
            self.config.render.wheel_zoom_in
        } else {
            self.config.render.wheel_zoom_out
        };
        self.zoom_at(screen, factor);
    }

    /// Scales by `factor` keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(anchor);
        let scale = self.config.render.clamp_scale(self.transform.scale * factor);
        self.transform = ViewTransform {
            scale,
            tx: anchor.0 - world.0 * scale,
            ty: anchor.1 - world.1 * scale,
        };
    }

    pub fn zoom_in(&mut self) {
        let factor = self.config.render.button_zoom;
        self.zoom_at(self.viewport_center(), factor);
    }

    pub fn zoom_out(&mut self) {
        let factor = 1.0 / self.config.render.button_zoom;
        self.zoom_at(self.viewport_center(), factor);
    }

    fn viewport_center(&self) -> Point {
        (self.surface.width / 2.0, self.surface.height / 2.0)
    }

    /// Frames the node bounding box plus margin. Returns false when there is
    /// nothing to frame or the viewport has no area.
    pub fn fit_to_content(&mut self) -> bool {
        let Some(layout) = &self.layout else {
            return false;
        };
        let bounds = layout.content_bounds();
        if !bounds.is_valid() || self.surface.width <= 0.0 || self.surface.height <= 0.0 {
            return false;
        }
        let margin = self.config.render.content_margin;
        let w = bounds.width() + margin * 2.0;
        let h = bounds.height() + margin * 2.0;
        let scale = self
            .config
            .render
            .clamp_scale((self.surface.width / w).min(self.surface.height / h));
        self.transform = ViewTransform {
            scale,
            tx: (self.surface.width - w * scale) / 2.0 - (bounds.min_x - margin) * scale,
            ty: (self.surface.height - h * scale) / 2.0 - (bounds.min_y - margin) * scale,
        };
        true
    }

    /// Current frame as SVG.
    pub fn render(&self) -> String {
        render_frame(
            self.layout.as_ref(),
            &self.config.theme,
            &self.config.layout,
            &self.transform,
            &self.surface,
        )
    }

    pub fn export_png(&mut self) -> Option<ExportArtifact> {
        self.export(ExportFormat::Png)
    }

    /// PDF when available, otherwise the PNG artifact.
    pub fn export_pdf(&mut self) -> Option<ExportArtifact> {
        self.export(ExportFormat::Pdf)
    }

    fn export(&mut self, format: ExportFormat) -> Option<ExportArtifact> {
        match export::export_diagram(self, format) {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                tracing::warn!(error = %err, ?format, "export failed");
                None
            }
        }
    }

    /// Rasterizes exactly what is on screen at the surface resolution.
    pub fn snapshot_png(&self) -> Option<ExportArtifact> {
        match export::snapshot(self) {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                tracing::warn!(error = %err, "snapshot failed");
                None
            }
        }
    }

    /// Swaps in a temporary surface and transform, returning the previous
    /// pair. Used by export, which restores them afterwards.
    pub(crate) fn replace_viewport(
        &mut self,
        surface: Surface,
        transform: ViewTransform,
    ) -> (Surface, ViewTransform) {
        let previous = (self.surface, self.transform);
        self.surface = surface;
        self.transform = transform;
        previous
    }
}
