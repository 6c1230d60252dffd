use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    /// Base label size in points; titles and annotations scale from it.
    pub font_size: f32,
    pub title_font_size: f32,
    pub text_color: String,
    pub object_fill: String,
    pub object_border: String,
    pub plane_fill: String,
    pub plane_border: String,
    pub axis_color: String,
    pub label_background: String,
    pub background: String,
}

impl Theme {
    /// Styling of the original matplotlib figures.
    pub fn classic() -> Self {
        Self {
            font_family: "DejaVu Sans, Bitstream Vera Sans, Arial, sans-serif".to_string(),
            font_size: 12.0,
            title_font_size: 16.0,
            text_color: "#000000".to_string(),
            object_fill: "lightblue".to_string(),
            object_border: "#000000".to_string(),
            plane_fill: "lightgray".to_string(),
            plane_border: "#000000".to_string(),
            axis_color: "#000000".to_string(),
            label_background: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            title_font_size: 16.0,
            text_color: "#1C2430".to_string(),
            object_fill: "#DCE8FA".to_string(),
            object_border: "#1C2430".to_string(),
            plane_fill: "#EEF2F8".to_string(),
            plane_border: "#7A8AA6".to_string(),
            axis_color: "#1C2430".to_string(),
            label_background: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
