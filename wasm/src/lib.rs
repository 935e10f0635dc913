use automaton_viz::{Automaton, Config, DiagramView, Theme};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanvasOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
}

fn build_config(options: CanvasOptions, width: f32, height: f32, dpr: f32) -> Config {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        config.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.layout.font_size = font_size;
    }
    // Browsers have no system font database to measure against.
    config.layout.fast_text_metrics = options.fast_text.unwrap_or(true);
    config.render.width = width;
    config.render.height = height;
    config.render.device_pixel_ratio = dpr;
    config
}

/// One interactive diagram bound to a host canvas. Every mutating method
/// returns the SVG frame to paint.
#[wasm_bindgen]
pub struct AutomatonCanvas {
    view: DiagramView,
}

#[wasm_bindgen]
impl AutomatonCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
        options_json: Option<String>,
    ) -> Result<AutomatonCanvas, JsValue> {
        let options = match options_json {
            Some(raw) => serde_json::from_str::<CanvasOptions>(&raw)
                .map_err(|error| JsValue::from_str(&error.to_string()))?,
            None => CanvasOptions::default(),
        };
        Ok(Self {
            view: DiagramView::new(build_config(options, width, height, device_pixel_ratio)),
        })
    }

    /// Loads an automaton JSON document, or clears the diagram when `None`.
    #[wasm_bindgen(js_name = setAutomaton)]
    pub fn set_automaton(&mut self, json: Option<String>) -> Result<String, JsValue> {
        let automaton = json
            .map(|raw| Automaton::from_json(&raw))
            .transpose()
            .map_err(|error| JsValue::from_str(&error.to_string()))?;
        self.view.set_automaton(automaton);
        Ok(self.view.render())
    }

    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) -> String {
        self.view.resize(width, height, device_pixel_ratio);
        self.view.render()
    }

    pub fn render(&self) -> String {
        self.view.render()
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.view.pointer_down((x, y));
    }

    /// Returns the new frame, or `undefined` when nothing moved.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<String> {
        self.view.pointer_move((x, y)).then(|| self.view.render())
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.view.pointer_up();
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) -> String {
        self.view.wheel((x, y), delta_y);
        self.view.render()
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> String {
        self.view.zoom_in();
        self.view.render()
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> String {
        self.view.zoom_out();
        self.view.render()
    }

    #[wasm_bindgen(js_name = fitToContent)]
    pub fn fit_to_content(&mut self) -> String {
        self.view.fit_to_content();
        self.view.render()
    }

    #[wasm_bindgen(js_name = clearOverrides)]
    pub fn clear_overrides(&mut self) -> String {
        self.view.clear_overrides();
        self.view.render()
    }

    #[wasm_bindgen(js_name = exportPng)]
    pub fn export_png(&mut self) -> Option<Vec<u8>> {
        self.view.export_png().map(|artifact| artifact.bytes)
    }

    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&mut self) -> Option<Vec<u8>> {
        self.view.export_pdf().map(|artifact| artifact.bytes)
    }

    #[wasm_bindgen(js_name = snapshotPng)]
    pub fn snapshot_png(&self) -> Option<Vec<u8>> {
        self.view.snapshot_png().map(|artifact| artifact.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_STATES: &str = r#"{
        "states": {
            "q0": {"transitions": {"a": ["q1"]}},
            "q1": {"transitions": {"b": ["q1"], "a": ["q2"]}},
            "q2": {"is_final": true, "transitions": {}}
        },
        "start_state": "q0"
    }"#;

    #[test]
    fn options_apply_to_config() {
        let options: CanvasOptions =
            serde_json::from_str(r#"{"theme":"dark","fontSize":13}"#).expect("options");
        let config = build_config(options, 640.0, 480.0, 2.0);
        assert_eq!(config.theme.background, Theme::dark().background);
        assert_eq!(config.layout.font_size, 13.0);
        assert!(config.layout.fast_text_metrics);
        assert_eq!(config.render.device_pixel_ratio, 2.0);
    }

    #[test]
    fn canvas_renders_loaded_automaton() {
        let config = build_config(CanvasOptions::default(), 800.0, 600.0, 1.0);
        let mut canvas = AutomatonCanvas {
            view: DiagramView::new(config),
        };
        assert!(canvas.render().contains("No automaton data"));
        canvas.view.set_automaton(Automaton::from_json(THREE_STATES).ok());
        let svg = canvas.render();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("class=\"nodes\""));
        assert!(canvas.pointer_move(1.0, 1.0).is_none());
    }
}
