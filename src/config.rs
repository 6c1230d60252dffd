use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Raster resolution. Figures are laid out in points (72 per inch).
    pub dpi: f32,
    /// Padding kept around the content after trimming, in inches.
    pub pad_inches: f32,
    pub background: String,
    /// Approximate characters per line for the generic placeholder label.
    pub wrap_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            pad_inches: 0.1,
            background: "#FFFFFF".to_string(),
            wrap_chars: 60,
        }
    }
}

impl RenderConfig {
    pub fn scale(&self) -> f32 {
        self.dpi.max(1.0) / 72.0
    }

    pub fn pad_px(&self) -> u32 {
        (self.pad_inches.max(0.0) * self.dpi.max(1.0)).round() as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    title_font_size: Option<f32>,
    text_color: Option<String>,
    object_fill: Option<String>,
    object_border: Option<String>,
    plane_fill: Option<String>,
    plane_border: Option<String>,
    axis_color: Option<String>,
    label_background: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    dpi: Option<f32>,
    pad_inches: Option<f32>,
    background: Option<String>,
    wrap_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    render: Option<RenderConfigFile>,
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
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => anyhow::bail!("unknown theme '{other}'"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.title_font_size {
            config.theme.title_font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.object_fill {
            config.theme.object_fill = v;
        }
        if let Some(v) = vars.object_border {
            config.theme.object_border = v;
        }
        if let Some(v) = vars.plane_fill {
            config.theme.plane_fill = v;
        }
        if let Some(v) = vars.plane_border {
            config.theme.plane_border = v;
        }
        if let Some(v) = vars.axis_color {
            config.theme.axis_color = v;
        }
        if let Some(v) = vars.label_background {
            config.theme.label_background = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    config.render.background = config.theme.background.clone();

    if let Some(render) = parsed.render {
        if let Some(v) = render.dpi {
            anyhow::ensure!(v > 0.0, "render.dpi must be positive");
            config.render.dpi = v;
        }
        if let Some(v) = render.pad_inches {
            config.render.pad_inches = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.wrap_chars {
            config.render.wrap_chars = v;
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
        assert_eq!(config.render.dpi, 150.0);
        assert_eq!(config.theme.object_fill, "lightblue");
    }

    #[test]
    fn theme_variables_override_defaults() {
        let config = parse_config(
            r##"{"theme": "modern", "themeVariables": {"fontSize": 14, "background": "#FAFAFA"}}"##,
        )
        .unwrap();
        assert_eq!(config.theme.font_size, 14.0);
        assert_eq!(config.theme.plane_border, Theme::modern().plane_border);
        assert_eq!(config.render.background, "#FAFAFA");
    }

    #[test]
    fn explicit_render_background_wins() {
        let config = parse_config(
            r##"{"themeVariables": {"background": "#000000"}, "render": {"background": "#FFFFFF", "dpi": 72}}"##,
        )
        .unwrap();
        assert_eq!(config.render.background, "#FFFFFF");
        assert_eq!(config.render.scale(), 1.0);
    }

    #[test]
    fn rejects_unknown_theme_and_bad_dpi() {
        assert!(parse_config(r#"{"theme": "neon"}"#).is_err());
        assert!(parse_config(r#"{"render": {"dpi": 0}}"#).is_err());
    }

    #[test]
    fn pad_is_measured_in_pixels() {
        let render = RenderConfig::default();
        assert_eq!(render.pad_px(), 15);
    }
}
