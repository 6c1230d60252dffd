use crate::config::{Config, RenderConfig};
use crate::figure::{
    ArrowHead, Figure, Point, Span, TextStyle, text_block_size, typeset_latex, wrap_text,
};
use crate::ir::{DiagramSpec, DiagramType, Force};
use crate::theme::Theme;
use base64::Engine as _;
use log::{debug, error};
use once_cell::sync::Lazy;
use resvg::tiny_skia::{Color, IntRect, Pixmap, Transform};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";
const DEFAULT_INCLINE_FORCES: [Force; 3] = [Force::Weight, Force::Normal, Force::Friction];

// Read-only after initialization; shared by every render.
static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
});

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("failed to parse generated SVG: {0}")]
    Svg(#[from] usvg::Error),
    #[error("failed to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Which drawing routine a spec ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    FreeBody,
    InclinedPlane { angle: u32 },
    Generic,
}

impl Template {
    pub fn select(spec: &DiagramSpec) -> Self {
        match (spec.kind, spec.angle) {
            (DiagramType::InclinedPlane, Some(angle)) => Self::InclinedPlane { angle },
            _ if !spec.forces.is_empty() => Self::FreeBody,
            _ => Self::Generic,
        }
    }
}

/// Arrow drawn for a force in the free-body template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceArrow {
    pub dx: f32,
    pub dy: f32,
    pub color: &'static str,
    pub label: &'static str,
}

pub fn force_arrow(force: Force) -> ForceArrow {
    let (dx, dy, color, label) = match force {
        Force::Weight => (0.0, -1.5, "red", r"$\vec{F}_g = mg$"),
        Force::Normal => (0.0, 1.5, "blue", r"$\vec{N}$"),
        Force::Friction => (-1.5, 0.0, "orange", r"$\vec{f}$"),
        Force::Tension => (1.5, 0.0, "green", r"$\vec{T}$"),
        Force::Applied => (1.5, 0.0, "purple", r"$\vec{F}_{app}$"),
        Force::Drag => (-1.2, 0.0, "brown", r"$\vec{F}_D$"),
    };
    ForceArrow { dx, dy, color, label }
}

/// Renders a parsed spec to a PNG data URI, or `None` when drawing fails.
/// Failures are logged; they never reach the caller.
pub fn render_diagram(spec: &DiagramSpec, config: &Config) -> Option<String> {
    match try_render_diagram(spec, config) {
        Ok(uri) => Some(uri),
        Err(err) => {
            error!("Error generating diagram for {:?}: {err}", spec.description);
            None
        }
    }
}

pub fn try_render_diagram(spec: &DiagramSpec, config: &Config) -> Result<String, RenderError> {
    let png = render_png(spec, config)?;
    Ok(encode_data_uri(&png))
}

pub fn render_png(spec: &DiagramSpec, config: &Config) -> Result<Vec<u8>, RenderError> {
    let figure = build_figure(spec, config)?;
    rasterize(&figure, &config.render)
}

pub fn build_figure(spec: &DiagramSpec, config: &Config) -> Result<Figure, RenderError> {
    let template = Template::select(spec);
    debug!("rendering {} diagram with {:?}", spec.kind.as_str(), template);
    match template {
        Template::InclinedPlane { angle } => {
            let forces: &[Force] = if spec.forces.is_empty() {
                &DEFAULT_INCLINE_FORCES
            } else {
                &spec.forces
            };
            Ok(inclined_plane_figure(angle, forces, &config.theme))
        }
        Template::FreeBody => Ok(free_body_figure(&spec.forces, spec.angle, &config.theme)),
        Template::Generic => Ok(generic_figure(
            &spec.description,
            &config.theme,
            config.render.wrap_chars,
        )),
    }
}

/// Box at the origin with one arrow per force. `_angle` is accepted so
/// tilted variants can slot in without changing callers.
pub fn free_body_figure(forces: &[Force], _angle: Option<u32>, theme: &Theme) -> Figure {
    let mut figure = Figure::new(8.0, 8.0, (-3.0, 3.0), (-3.0, 3.0), theme).with_equal_aspect();
    figure.line(Point::new(-3.0, 0.0), Point::new(3.0, 0.0), "black", 0.5);
    figure.line(Point::new(0.0, -3.0), Point::new(0.0, 3.0), "black", 0.5);

    let half = 0.2;
    figure.polygon(
        square(Point::new(0.0, 0.0), half, 0.0),
        &theme.object_fill,
        &theme.object_border,
        2.0,
    );

    let origin = Point::new(0.0, 0.0);
    for force in forces {
        let arrow = force_arrow(*force);
        figure.arrow(
            origin,
            Point::new(arrow.dx, arrow.dy),
            arrow.color,
            3.0,
            ArrowHead::Open { length: 12.0 },
        );
        figure.rich_text(
            Point::new(arrow.dx * 1.2, arrow.dy * 1.2),
            vec![typeset_latex(arrow.label)],
            TextStyle::new(theme.font_size + 2.0, &theme.text_color)
                .centered()
                .boxed(&theme.label_background),
        );
    }

    axis_indicator(&mut figure, Point::new(2.0, -2.5), theme);
    figure.set_title("Free Body Diagram");
    figure
}

/// Ramp at `angle` degrees with a box resting halfway up it. Any angle is
/// drawn as given: 0° lies flat, 90° stands upright, wider angles lean back.
pub fn inclined_plane_figure(angle: u32, forces: &[Force], theme: &Theme) -> Figure {
    let mut figure = Figure::new(10.0, 7.0, (-1.0, 6.0), (-1.0, 4.0), theme).with_equal_aspect();
    let theta = (angle as f32).to_radians();
    let (sin, cos) = theta.sin_cos();

    let length = 5.0;
    figure.polygon(
        vec![
            Point::new(0.0, 0.0),
            Point::new(length * cos, length * sin),
            Point::new(length * cos, 0.0),
        ],
        &theme.plane_fill,
        &theme.plane_border,
        2.0,
    );

    let center = Point::new(2.5 * cos, 2.5 * sin);
    figure.polygon(square(center, 0.15, theta), &theme.object_fill, &theme.object_border, 2.0);

    let head = ArrowHead::Filled {
        width: 0.15,
        length: 0.1,
    };
    let label_style = |color: &str| TextStyle::new(theme.font_size + 2.0, color).bold();

    if forces.contains(&Force::Weight) {
        figure.arrow(center, center.offset(0.0, -1.2), "red", 2.0, head);
        figure.text(center.offset(-0.4, -0.7), "mg", label_style("red"));
    }
    if forces.contains(&Force::Normal) {
        let (dx, dy) = (-0.8 * sin, 0.8 * cos);
        figure.arrow(center, center.offset(dx, dy), "blue", 2.0, head);
        figure.text(center.offset(dx - 0.3, dy + 0.2), "N", label_style("blue"));
    }
    if forces.contains(&Force::Friction) {
        let (dx, dy) = (-0.8 * cos, -0.8 * sin);
        figure.arrow(center, center.offset(dx, dy), "orange", 2.0, head);
        figure.text(center.offset(dx, dy - 0.3), "f", label_style("orange"));
    }

    figure.arc(Point::new(0.0, 0.0), 0.5, 0.0, angle as f32, &theme.axis_color, 2.0);
    figure.text(
        Point::new(0.6, 0.15),
        &format!("{angle}°"),
        TextStyle::new(theme.font_size, &theme.text_color).bold(),
    );

    axis_indicator(&mut figure, Point::new(4.5, -0.5), theme);
    figure.set_title(format!("Inclined Plane ({angle}°)"));
    figure
}

/// Placeholder that only shows the description text.
pub fn generic_figure(description: &str, theme: &Theme, wrap_chars: usize) -> Figure {
    let mut figure = Figure::new(8.0, 6.0, (0.0, 1.0), (0.0, 1.0), theme);
    let lines: Vec<Vec<Span>> = wrap_text(description, wrap_chars)
        .into_iter()
        .map(|line| vec![Span::plain(line)])
        .collect();

    // Long descriptions grow the page so the whole block stays on it.
    let (block_w, block_h) = text_block_size(&lines, theme.font_size);
    let margin = theme.font_size * 2.0;
    figure.fit_area(block_w + margin, block_h + theme.font_size * 1.2 + margin);

    let style = TextStyle::new(theme.font_size, &theme.text_color).centered();
    let step = figure.line_height_data(theme.font_size);
    // Heading and body together stay centered on (0.5, 0.5).
    let heading_y = 0.5 + step * lines.len() as f32 / 2.0;
    let body_y = 0.5 - step / 2.0;
    figure.text(Point::new(0.5, heading_y), "Diagram:", style.clone());
    figure.rich_text(Point::new(0.5, body_y), lines, style);
    figure
}

fn axis_indicator(figure: &mut Figure, origin: Point, theme: &Theme) {
    let head = ArrowHead::Filled {
        width: 0.1,
        length: 0.1,
    };
    figure.arrow(origin, origin.offset(0.5, 0.0), &theme.axis_color, 1.0, head);
    figure.arrow(origin, origin.offset(0.0, 0.5), &theme.axis_color, 1.0, head);
    let style = TextStyle::new(theme.font_size, &theme.text_color);
    figure.text(origin.offset(0.6, 0.0), "+x", style.clone());
    figure.text(origin.offset(0.0, 0.6), "+y", style);
}

/// Corners of a square centered on `center`, rotated by `theta` radians.
fn square(center: Point, half: f32, theta: f32) -> Vec<Point> {
    let (sin, cos) = theta.sin_cos();
    [(-half, -half), (half, -half), (half, half), (-half, half)]
        .into_iter()
        .map(|(x, y)| Point::new(center.x + x * cos - y * sin, center.y + x * sin + y * cos))
        .collect()
}

/// Rasterizes a figure at the configured DPI and trims it to its content.
pub fn rasterize(figure: &Figure, render_cfg: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    if !figure.is_finite() {
        return Err(RenderError::InvalidGeometry(
            "figure contains non-finite coordinates".to_string(),
        ));
    }

    let svg = figure.to_svg();
    let mut opt = usvg::Options::default();
    opt.fontdb = Arc::clone(&*FONT_DB);
    let tree = usvg::Tree::from_str(&svg, &opt)?;

    let scale = render_cfg.scale();
    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;

    let background = parse_hex_color(&render_cfg.background).unwrap_or(Color::WHITE);
    pixmap.fill(background);
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let trimmed = trim_pixmap(&pixmap, background, render_cfg.pad_px()).unwrap_or(pixmap);
    trimmed
        .encode_png()
        .map_err(|err| RenderError::Encode(err.to_string()))
}

/// Crops to the pixels that differ from `background`, keeping `pad` pixels
/// of margin. Returns `None` when the image has no content to crop to.
fn trim_pixmap(pixmap: &Pixmap, background: Color, pad: u32) -> Option<Pixmap> {
    let bg = background.premultiply().to_color_u8();
    let width = pixmap.width();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0, 0);

    for (idx, px) in pixmap.pixels().iter().enumerate() {
        if *px == bg {
            continue;
        }
        let x = idx as u32 % width;
        let y = idx as u32 / width;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if min_x > max_x || min_y > max_y {
        return None;
    }

    let left = min_x.saturating_sub(pad);
    let top = min_y.saturating_sub(pad);
    let right = (max_x + pad).min(width - 1);
    let bottom = (max_y + pad).min(pixmap.height() - 1);
    let rect = IntRect::from_xywh(
        left as i32,
        top as i32,
        right - left + 1,
        bottom - top + 1,
    )?;
    pixmap.clone_rect(rect)
}

fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255))
}

pub fn encode_data_uri(png: &[u8]) -> String {
    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + base64::encoded_len(png.len(), true).unwrap_or_default());
    uri.push_str(DATA_URI_PREFIX);
    base64::engine::general_purpose::STANDARD.encode_string(png, &mut uri);
    uri
}

pub fn write_output_png(png: &[u8], output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_description;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn decode(uri: &str) -> Vec<u8> {
        let payload = uri.strip_prefix(DATA_URI_PREFIX).expect("data uri prefix");
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .expect("valid base64")
    }

    fn spec(kind: DiagramType, forces: &[Force], angle: Option<u32>) -> DiagramSpec {
        DiagramSpec {
            kind,
            forces: forces.to_vec(),
            angle,
            description: "test".to_string(),
        }
    }

    #[test]
    fn dispatch_prefers_incline_with_angle() {
        let s = spec(DiagramType::InclinedPlane, &[Force::Weight], Some(30));
        assert_eq!(Template::select(&s), Template::InclinedPlane { angle: 30 });
    }

    #[test]
    fn incline_without_angle_falls_back() {
        let with_forces = spec(DiagramType::InclinedPlane, &[Force::Weight], None);
        assert_eq!(Template::select(&with_forces), Template::FreeBody);
        let bare = spec(DiagramType::InclinedPlane, &[], None);
        assert_eq!(Template::select(&bare), Template::Generic);
    }

    #[test]
    fn pulley_and_projectile_use_fallback_paths() {
        let pulley = spec(DiagramType::Pulley, &[Force::Tension], None);
        assert_eq!(Template::select(&pulley), Template::FreeBody);
        let projectile = spec(DiagramType::Projectile, &[], Some(45));
        assert_eq!(Template::select(&projectile), Template::Generic);
    }

    #[test]
    fn force_table_matches_vocabulary() {
        assert_eq!(force_arrow(Force::Weight).color, "red");
        assert!(force_arrow(Force::Weight).dy < 0.0);
        assert!(force_arrow(Force::Normal).dy > 0.0);
        assert!(force_arrow(Force::Friction).dx < 0.0);
        assert!(force_arrow(Force::Tension).dx > 0.0);
        assert_eq!(force_arrow(Force::Applied).color, "purple");
        assert_eq!(force_arrow(Force::Drag).dx, -1.2);
    }

    #[test]
    fn free_body_labels_each_force() {
        let figure = free_body_figure(&[Force::Weight, Force::Tension], None, &Theme::classic());
        let texts = figure.text_contents();
        assert!(texts.contains(&"Fg = mg".to_string()));
        assert!(texts.contains(&"T".to_string()));
        assert!(texts.contains(&"+x".to_string()));
        assert_eq!(figure.title(), Some("Free Body Diagram"));
    }

    #[test]
    fn incline_draws_only_requested_forces() {
        let figure = inclined_plane_figure(30, &[Force::Normal], &Theme::classic());
        let texts = figure.text_contents();
        assert!(texts.contains(&"N".to_string()));
        assert!(!texts.contains(&"mg".to_string()));
        assert!(texts.contains(&"30°".to_string()));
        assert_eq!(figure.title(), Some("Inclined Plane (30°)"));
    }

    #[test]
    fn incline_defaults_forces_when_none_given() {
        let s = spec(DiagramType::InclinedPlane, &[], Some(20));
        let figure = build_figure(&s, &Config::default()).unwrap();
        let texts = figure.text_contents();
        for label in ["mg", "N", "f"] {
            assert!(texts.contains(&label.to_string()), "missing {label}");
        }
    }

    #[test]
    fn flat_upright_and_obtuse_ramps_still_render() {
        for description in [
            "Block on a ramp at 0°, show weight and normal force",
            "inclined plane at 90 degrees with weight",
            "ramp at 120° with weight",
        ] {
            let spec = parse_description(description);
            let angle = spec.angle.expect("angle");
            assert_eq!(Template::select(&spec), Template::InclinedPlane { angle });
            let uri = render_diagram(&spec, &Config::default());
            assert!(uri.is_some_and(|uri| decode(&uri).starts_with(PNG_MAGIC)), "{description}");
        }
    }

    #[test]
    fn free_body_draws_origin_cross_lines() {
        let figure = free_body_figure(&[Force::Weight], None, &Theme::classic());
        let svg = figure.to_svg();
        assert_eq!(svg.matches("stroke=\"black\" stroke-width=\"0.50\"").count(), 2);
    }

    #[test]
    fn force_labels_use_theme_label_background() {
        let mut theme = Theme::classic();
        theme.label_background = "#FFF8DC".to_string();
        let svg = free_body_figure(&[Force::Normal], None, &theme).to_svg();
        assert!(svg.contains("fill=\"#FFF8DC\""));
    }

    #[test]
    fn long_generic_label_fits_on_page() {
        let description = "A long walk through the problem setup, repeated to fill many lines. ".repeat(26);
        let theme = Theme::classic();
        let figure = generic_figure(&description, &theme, 60);
        let (width, height) = figure.size();
        assert!(height > 6.0 * 72.0);

        let svg = figure.to_svg();
        let lines = wrap_text(&description, 60).len() as f32;
        let baselines: Vec<f32> = svg
            .match_indices("<text ")
            .filter_map(|(idx, _)| {
                let rest = &svg[idx..];
                let start = rest.find(" y=\"")? + 4;
                let end = start + rest[start..].find('"')?;
                rest[start..end].parse().ok()
            })
            .collect();
        assert_eq!(baselines.len(), 2);
        // Heading baseline, then the body's first and last baselines.
        assert!(baselines[0] > theme.font_size);
        let last = baselines[1] + (lines - 1.0) * theme.font_size * 1.2;
        assert!(last < height, "last baseline {last} below page {height}");
        assert!(width >= 8.0 * 72.0);
        assert_eq!(figure.text_contents()[1], description);
    }

    #[test]
    fn long_generic_label_is_not_cropped_to_default_page() {
        let description = "word ".repeat(400);
        let spec = DiagramSpec::generic(&description);
        let config = Config::default();
        let figure = build_figure(&spec, &config).unwrap();
        let (_, height) = figure.size();
        assert!(height > 6.0 * 72.0);
        assert!(render_diagram(&spec, &config).is_some());
    }

    #[test]
    fn generic_label_round_trips_description() {
        let description = "Sketch two carts colliding on a track, the first moving right at 3 m/s, the second at rest & heavier";
        let figure = generic_figure(description, &Theme::classic(), 20);
        let texts = figure.text_contents();
        assert_eq!(texts[0], "Diagram:");
        assert_eq!(texts[1], description);
    }

    #[test]
    fn renders_incline_scenario_to_png() {
        let spec = parse_description(
            "Draw a box on an inclined plane at 30°. Show weight vector mg pointing down, normal force N perpendicular to plane, friction force f parallel to plane pointing up.",
        );
        let uri = render_diagram(&spec, &Config::default()).expect("diagram");
        assert!(uri.starts_with(DATA_URI_PREFIX));
        assert!(decode(&uri).starts_with(PNG_MAGIC));
    }

    #[test]
    fn generic_spec_never_faults() {
        let spec = DiagramSpec::generic("some diagram with no recognizable structure");
        let uri = render_diagram(&spec, &Config::default());
        assert!(uri.is_some());
    }

    #[test]
    fn trim_shrinks_to_content() {
        let mut pixmap = Pixmap::new(100, 80).unwrap();
        pixmap.fill(Color::WHITE);
        let mut paint = resvg::tiny_skia::Paint::default();
        paint.set_color(Color::BLACK);
        let rect = resvg::tiny_skia::Rect::from_xywh(40.0, 30.0, 10.0, 10.0).unwrap();
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);

        let trimmed = trim_pixmap(&pixmap, Color::WHITE, 5).unwrap();
        assert_eq!((trimmed.width(), trimmed.height()), (20, 20));
    }

    #[test]
    fn trim_of_blank_pixmap_is_none() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        pixmap.fill(Color::WHITE);
        assert!(trim_pixmap(&pixmap, Color::WHITE, 2).is_none());
    }

    #[test]
    fn parses_hex_background() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some(Color::WHITE));
        assert_eq!(parse_hex_color("white"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
    }

    #[test]
    fn data_uri_wraps_base64() {
        assert_eq!(encode_data_uri(b"abc"), "data:image/png;base64,YWJj");
    }
}
