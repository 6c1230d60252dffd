use physics_diagram_renderer::{Config, Theme, parse_description, try_render_diagram};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagramRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    dpi: Option<f32>,
}

fn build_config(options: DiagramRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(dpi) = options.dpi.filter(|dpi| *dpi > 0.0) {
        config.render.dpi = dpi;
    }
    config
}

fn parse_options(options_json: Option<String>) -> Result<DiagramRenderOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(DiagramRenderOptions::default()),
    }
}

/// Classification of a description as JSON (`type`, `forces`, `angle`, `description`).
#[wasm_bindgen]
pub fn parse_diagram_description(description: &str) -> Result<String, JsValue> {
    serde_json::to_string(&parse_description(description))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Renders a description to a `data:image/png;base64,...` URI.
#[wasm_bindgen]
pub fn render_diagram_png(description: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json).map_err(|error| JsValue::from_str(&error))?;
    let config = build_config(options);
    try_render_diagram(&parse_description(description), &config)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
