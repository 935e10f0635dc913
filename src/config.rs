use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base half-extents for one node shape before the label is taken into account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeSizing {
    pub base_rx: f32,
    pub base_ry: f32,
}

impl Default for ShapeSizing {
    fn default() -> Self {
        Self {
            base_rx: 32.0,
            base_ry: 22.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Horizontal bend of the control point away from the chord midpoint.
    pub bend_x: f32,
    pub bend_y_same_level: f32,
    pub bend_y_cross_level: f32,
    /// Perpendicular control point displacement per lane step.
    pub lane_bend: f32,
    /// Perpendicular endpoint displacement per lane step.
    pub dock_offset: f32,
    /// Vertical distance under which two nodes count as sharing a level.
    pub same_level_epsilon: f32,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            bend_x: 70.0,
            bend_y_same_level: 35.0,
            bend_y_cross_level: 60.0,
            lane_bend: 28.0,
            dock_offset: 6.0,
            same_level_epsilon: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthoConfig {
    pub stub_length: f32,
    pub lane_spacing: f32,
    pub corner_radius: f32,
    pub port_padding: f32,
    /// Offset of the two non-center slots, as a fraction of the usable side.
    pub slot_offset: f32,
    /// Ports never leave `[-clamp, clamp]` of the usable side.
    pub slot_clamp: f32,
    pub overflow_nudge: f32,
}

impl Default for OrthoConfig {
    fn default() -> Self {
        Self {
            stub_length: 40.0,
            lane_spacing: 16.0,
            corner_radius: 10.0,
            port_padding: 6.0,
            slot_offset: 0.33,
            slot_clamp: 0.48,
            overflow_nudge: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfLoopConfig {
    pub radius: f32,
    pub gap: f32,
    pub label_gap: f32,
}

impl Default for SelfLoopConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            gap: 22.0,
            label_gap: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    pub length: f32,
    pub half_width: f32,
    pub margin: f32,
    pub start_length: f32,
    pub start_gap: f32,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            length: 12.0,
            half_width: 7.0,
            margin: 2.5,
            start_length: 40.0,
            start_gap: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub min_width: f32,
    pub padding: f32,
    pub height: f32,
    pub normal_offset: f32,
    pub min_edge_t: f32,
    pub min_arc: f32,
    pub ring_step: f32,
    pub ring_max: f32,
    pub scan_step: f32,
    pub obstacle_pad: f32,
    pub max_symbols: usize,
    pub ortho_clearance: f32,
    pub ortho_bump: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            min_width: 18.0,
            padding: 8.0,
            height: 16.0,
            normal_offset: 10.0,
            min_edge_t: 0.12,
            min_arc: 70.0,
            ring_step: 0.03,
            ring_max: 0.25,
            scan_step: 0.02,
            obstacle_pad: 8.0,
            max_symbols: 6,
            ortho_clearance: 12.0,
            ortho_bump: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub font_size: f32,
    pub line_height: f32,
    pub max_label_width_chars: usize,
    pub fast_text_metrics: bool,
    pub text_pad_x: f32,
    pub text_pad_y: f32,
    pub min_text_width: f32,
    pub oval: ShapeSizing,
    pub rectangle: ShapeSizing,
    pub padding_x: f32,
    pub padding_y: f32,
    pub min_world_width: f32,
    pub level_pad_y: f32,
    pub node_margin: f32,
    pub curve: CurveConfig,
    pub ortho: OrthoConfig,
    pub self_loop: SelfLoopConfig,
    pub arrow: ArrowConfig,
    pub label: LabelConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            line_height: 14.0,
            max_label_width_chars: 25,
            fast_text_metrics: false,
            text_pad_x: 14.0,
            text_pad_y: 10.0,
            min_text_width: 20.0,
            oval: ShapeSizing::default(),
            rectangle: ShapeSizing {
                base_rx: 55.0,
                base_ry: 35.0,
            },
            padding_x: 100.0,
            padding_y: 80.0,
            min_world_width: 1200.0,
            level_pad_y: 60.0,
            node_margin: 40.0,
            curve: CurveConfig::default(),
            ortho: OrthoConfig::default(),
            self_loop: SelfLoopConfig::default(),
            arrow: ArrowConfig::default(),
            label: LabelConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Viewport size in CSS pixels.
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
    pub content_margin: f32,
    pub export_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub wheel_zoom_in: f32,
    pub wheel_zoom_out: f32,
    pub button_zoom: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            device_pixel_ratio: 1.0,
            content_margin: 40.0,
            export_scale: 2.0,
            min_scale: 0.3,
            max_scale: 3.0,
            wheel_zoom_in: 1.15,
            wheel_zoom_out: 0.85,
            button_zoom: 1.2,
        }
    }
}

impl RenderConfig {
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    node_fill: Option<String>,
    node_border: Option<String>,
    start_color: Option<String>,
    final_color: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    edge_label_background: Option<String>,
    edge_label_text: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfig>,
    render: Option<RenderConfig>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme, keeping default"),
        }
    }
    if let Some(layout) = parsed.layout {
        config.layout = layout;
    }
    if let Some(render) = parsed.render {
        config.render = render;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.layout.font_size = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_border {
            config.theme.node_border = v;
        }
        if let Some(v) = vars.start_color {
            config.theme.start_color = v;
        }
        if let Some(v) = vars.final_color {
            config.theme.final_color = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.edge_label_background {
            config.theme.edge_label_background = v;
        }
        if let Some(v) = vars.edge_label_text {
            config.theme.edge_label_text = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.font_size, 11.0);
        assert_eq!(config.render.max_scale, 3.0);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let config = parse_config(
            r##"{
                // layout and render keys use the Rust field names
                theme: "dark",
                themeVariables: { lineColor: "#ff0000", fontSize: 13 },
                layout: { node_margin: 55, curve: { lane_bend: 30 } },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.node_fill, Theme::dark().node_fill);
        assert_eq!(config.layout.font_size, 13.0);
        assert_eq!(config.layout.node_margin, 55.0);
        assert_eq!(config.layout.curve.lane_bend, 30.0);
        assert_eq!(config.layout.curve.dock_offset, 6.0);
        assert_eq!(config.theme.background, Theme::dark().background);
    }

    #[test]
    fn clamp_scale_respects_bounds() {
        let render = RenderConfig::default();
        assert_eq!(render.clamp_scale(10.0), 3.0);
        assert_eq!(render.clamp_scale(0.01), 0.3);
        assert_eq!(render.clamp_scale(1.0), 1.0);
    }
}
