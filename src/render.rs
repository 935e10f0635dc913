use crate::config::LayoutConfig;
use crate::geometry::{Point, arrow_triangle, distance, normalize};
use crate::ir::StateShape;
use crate::layout::{ArrowHead, EdgeLayout, EdgePath, Layout, NodeLayout, StartArrow};
use crate::theme::Theme;
use crate::view::ViewTransform;
use anyhow::Result;
use std::path::Path;

const START_STROKE: f32 = 2.5;
const NODE_STROKE: f32 = 1.8;
const FINAL_INNER_STROKE: f32 = 1.5;
const FINAL_INNER_INSET: f32 = 4.0;
const RECT_CORNER: f32 = 6.0;
const LABEL_CORNER: f32 = 4.0;
const EDGE_STROKE: f32 = 1.5;
const PLACEHOLDER_TEXT: &str = "No automaton data";

/// Drawing target: CSS size plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width: sanitize(width, 0.0),
            height: sanitize(height, 0.0),
            device_pixel_ratio: if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
                device_pixel_ratio
            } else {
                1.0
            },
        }
    }

    pub fn pixel_width(&self) -> u32 {
        (self.width * self.device_pixel_ratio).floor().max(1.0) as u32
    }

    pub fn pixel_height(&self) -> u32 {
        (self.height * self.device_pixel_ratio).floor().max(1.0) as u32
    }
}

fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

/// Paints one full frame as an SVG document sized to the surface in device
/// pixels. The layout stays in world units; the view transform and device
/// pixel ratio are applied by a single group transform.
///
/// Z-order: edges, nodes, edge labels, arrowheads, start arrow.
pub fn render_frame(
    layout: Option<&Layout>,
    theme: &Theme,
    config: &LayoutConfig,
    view: &ViewTransform,
    surface: &Surface,
) -> String {
    let Some(layout) = layout else {
        return render_placeholder(theme, surface);
    };

    let pw = surface.pixel_width();
    let ph = surface.pixel_height();
    let dpr = surface.device_pixel_ratio;
    let mut svg = String::new();
    svg_open(&mut svg, pw, ph, theme);
    svg.push_str(&format!(
        "<defs><filter id=\"node-shadow\" x=\"-20%\" y=\"-20%\" width=\"140%\" height=\"150%\"><feDropShadow dx=\"0\" dy=\"2\" stdDeviation=\"3\" flood-color=\"{0}\" flood-opacity=\"0.15\"/></filter><filter id=\"label-shadow\" x=\"-20%\" y=\"-30%\" width=\"140%\" height=\"160%\"><feDropShadow dx=\"0\" dy=\"0\" stdDeviation=\"1.5\" flood-color=\"{0}\" flood-opacity=\"0.1\"/></filter></defs>",
        theme.shadow_color
    ));
    svg.push_str(&format!(
        "<g transform=\"matrix({:.4} 0 0 {:.4} {:.4} {:.4})\">",
        dpr * view.scale,
        dpr * view.scale,
        dpr * view.tx,
        dpr * view.ty
    ));

    let stroke = EDGE_STROKE / view.scale.max(0.75);
    svg.push_str(&format!(
        "<g class=\"edges\" fill=\"none\" stroke=\"{}\" stroke-width=\"{stroke:.3}\">",
        theme.line_color
    ));
    for edge in &layout.edges {
        push_edge(&mut svg, edge);
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in layout.nodes.values() {
        push_node(&mut svg, node, theme, config);
    }
    svg.push_str("</g>");

    svg.push_str(&format!(
        "<g class=\"edge-labels\" font-family=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">",
        escape_xml(&theme.font_family),
        config.font_size
    ));
    for edge in &layout.edges {
        let label = &edge.label;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{LABEL_CORNER}\" fill=\"{}\" filter=\"url(#label-shadow)\"/>",
            label.x - label.width / 2.0,
            label.y - label.height / 2.0,
            label.width,
            label.height,
            theme.edge_label_background
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\">{}</text>",
            label.x,
            label.y,
            theme.edge_label_text,
            escape_xml(&label.text)
        ));
    }
    svg.push_str("</g>");

    svg.push_str(&format!("<g class=\"arrowheads\" fill=\"{}\">", theme.line_color));
    for edge in &layout.edges {
        push_arrowhead(&mut svg, &edge.arrow, config);
    }
    svg.push_str("</g>");

    if let Some(start) = &layout.start_arrow {
        push_start_arrow(&mut svg, start, theme, config);
    }

    svg.push_str("</g></svg>");
    svg
}

/// Empty-state frame shown when there is nothing valid to draw.
pub fn render_placeholder(theme: &Theme, surface: &Surface) -> String {
    let pw = surface.pixel_width();
    let ph = surface.pixel_height();
    let mut svg = String::new();
    svg_open(&mut svg, pw, ph, theme);
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{:.2}\" font-weight=\"500\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
        pw as f32 / 2.0,
        ph as f32 / 2.0,
        escape_xml(&theme.font_family),
        14.0 * surface.device_pixel_ratio,
        theme.placeholder_text,
        PLACEHOLDER_TEXT
    ));
    svg.push_str("</svg>");
    svg
}

fn svg_open(svg: &mut String, pw: u32, ph: u32, theme: &Theme) {
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{pw}\" height=\"{ph}\" viewBox=\"0 0 {pw} {ph}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
}

fn push_edge(svg: &mut String, edge: &EdgeLayout) {
    match &edge.path {
        EdgePath::SelfLoop { center, radius } => {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\"/>",
                center.0, center.1, radius
            ));
        }
        EdgePath::Curve {
            start,
            control,
            end,
        } => {
            svg.push_str(&format!(
                "<path d=\"M {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}\"/>",
                start.0, start.1, control.0, control.1, end.0, end.1
            ));
        }
        EdgePath::Orthogonal {
            points,
            corner_radius,
            ..
        } => {
            svg.push_str(&format!(
                "<path d=\"{}\" stroke-linejoin=\"round\"/>",
                rounded_path_data(points, *corner_radius)
            ));
        }
    }
}

/// Polyline with each interior corner replaced by a quadratic arc. The
/// radius shrinks on short segments so corners never overshoot.
pub(crate) fn rounded_path_data(points: &[Point], radius: f32) -> String {
    let mut d = String::new();
    let Some(first) = points.first() else {
        return d;
    };
    d.push_str(&format!("M {:.2} {:.2}", first.0, first.1));
    for i in 1..points.len() {
        let prev = points[i - 1];
        let corner = points[i];
        let Some(&next) = points.get(i + 1) else {
            d.push_str(&format!(" L {:.2} {:.2}", corner.0, corner.1));
            break;
        };
        let r = radius
            .min(distance(prev, corner) / 2.0)
            .min(distance(corner, next) / 2.0)
            .max(0.0);
        let (ix, iy) = normalize((corner.0 - prev.0, corner.1 - prev.1));
        let (ox, oy) = normalize((next.0 - corner.0, next.1 - corner.1));
        d.push_str(&format!(
            " L {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}",
            corner.0 - ix * r,
            corner.1 - iy * r,
            corner.0,
            corner.1,
            corner.0 + ox * r,
            corner.1 + oy * r
        ));
    }
    d
}

fn push_node(svg: &mut String, node: &NodeLayout, theme: &Theme, config: &LayoutConfig) {
    let stroke = if node.is_start {
        &theme.start_color
    } else if node.is_final && node.shape == StateShape::Oval {
        &theme.final_color
    } else {
        &theme.node_border
    };
    let width = if node.is_start { START_STROKE } else { NODE_STROKE };

    match node.shape {
        StateShape::Rectangle => {
            svg.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{RECT_CORNER}\" ry=\"{RECT_CORNER}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{width}\" filter=\"url(#node-shadow)\"/>",
                node.x - node.rx,
                node.y - node.ry,
                node.rx * 2.0,
                node.ry * 2.0,
                theme.node_fill,
                stroke
            ));
        }
        StateShape::Oval => {
            svg.push_str(&format!(
                "<ellipse cx=\"{:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{width}\" filter=\"url(#node-shadow)\"/>",
                node.x, node.y, node.rx, node.ry, theme.node_fill, stroke
            ));
            if node.is_final {
                svg.push_str(&format!(
                    "<ellipse cx=\"{:.2}\" cy=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{FINAL_INNER_STROKE}\"/>",
                    node.x,
                    node.y,
                    (node.rx - FINAL_INNER_INSET).max(0.0),
                    (node.ry - FINAL_INNER_INSET).max(0.0),
                    stroke
                ));
            }
        }
    }

    let line_height = config.line_height;
    let mut ty = node.y - node.lines.len() as f32 * line_height / 2.0 - line_height / 2.0;
    svg.push_str(&format!(
        "<text font-family=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">",
        escape_xml(&theme.font_family),
        config.font_size,
        theme.text_color
    ));
    svg.push_str(&format!(
        "<tspan x=\"{:.2}\" y=\"{ty:.2}\" font-weight=\"bold\">{}</tspan>",
        node.x,
        escape_xml(&node.title)
    ));
    for line in &node.lines {
        ty += line_height;
        svg.push_str(&format!(
            "<tspan x=\"{:.2}\" y=\"{ty:.2}\">{}</tspan>",
            node.x,
            escape_xml(line)
        ));
    }
    svg.push_str("</text>");
}

fn push_arrowhead(svg: &mut String, arrow: &ArrowHead, config: &LayoutConfig) {
    let tri = arrow_triangle(arrow.tip, arrow.dir, config.arrow.length, config.arrow.half_width);
    svg.push_str(&format!(
        "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\"/>",
        tri[0].0, tri[0].1, tri[1].0, tri[1].1, tri[2].0, tri[2].1
    ));
}

fn push_start_arrow(svg: &mut String, start: &StartArrow, theme: &Theme, config: &LayoutConfig) {
    svg.push_str(&format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{START_STROKE}\"/>",
        start.from.0, start.from.1, start.to.0, start.to.1, theme.start_color
    ));
    let tri = arrow_triangle(start.to, (1.0, 0.0), config.arrow.length, config.arrow.half_width);
    svg.push_str(&format!(
        "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{}\"/>",
        tri[0].0, tri[0].1, tri[1].0, tri[1].1, tri[2].0, tri[2].1, theme.start_color
    ));
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
