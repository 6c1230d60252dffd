//! Owned drawing surface for one diagram.
//!
//! A [`Figure`] collects primitives in data coordinates (y pointing up, like
//! a plot axis) and lays them out on a page measured in points. Each render
//! builds its own figure and drops it when done; nothing is registered
//! globally.

use crate::theme::Theme;

const POINTS_PER_INCH: f32 = 72.0;
const LINE_HEIGHT: f32 = 1.2;
const SUBSCRIPT_SCALE: f32 = 0.7;

// Plot area as fractions of the page: left, right, bottom, top.
const AREA: (f32, f32, f32, f32) = (0.125, 0.9, 0.11, 0.88);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// The anchor point sits on the first line's baseline.
    Alphabetic,
    /// The anchor point is the vertical center of the text block.
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub subscript: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            subscript: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f32,
    pub color: String,
    pub bold: bool,
    pub anchor: Anchor,
    pub baseline: Baseline,
    /// Fill of a rounded, translucent box drawn behind the text.
    pub box_fill: Option<String>,
}

impl TextStyle {
    pub fn new(size: f32, color: &str) -> Self {
        Self {
            size,
            color: color.to_string(),
            bold: false,
            anchor: Anchor::Start,
            baseline: Baseline::Alphabetic,
            box_fill: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.anchor = Anchor::Middle;
        self.baseline = Baseline::Center;
        self
    }

    pub fn boxed(mut self, fill: &str) -> Self {
        self.box_fill = Some(fill.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrowHead {
    /// Two strokes meeting at the tip, `length` in points.
    Open { length: f32 },
    /// Filled triangle beyond the shaft end, sized in data units.
    Filled { width: f32, length: f32 },
}

#[derive(Debug, Clone)]
enum Element {
    Polygon {
        points: Vec<Point>,
        fill: String,
        stroke: String,
        stroke_width: f32,
    },
    Line {
        from: Point,
        to: Point,
        color: String,
        width: f32,
    },
    Arrow {
        from: Point,
        to: Point,
        color: String,
        width: f32,
        head: ArrowHead,
    },
    Arc {
        center: Point,
        radius: f32,
        start_deg: f32,
        end_deg: f32,
        color: String,
        width: f32,
    },
    Text {
        at: Point,
        lines: Vec<Vec<Span>>,
        style: TextStyle,
    },
}

#[derive(Debug, Clone)]
pub struct Figure {
    width: f32,
    height: f32,
    x_range: (f32, f32),
    y_range: (f32, f32),
    equal_aspect: bool,
    title: Option<String>,
    title_size: f32,
    font_family: String,
    text_color: String,
    background: String,
    elements: Vec<Element>,
}

/// Data-to-page mapping resolved from the figure's limits.
#[derive(Debug, Clone, Copy)]
struct Frame {
    origin_x: f32,
    origin_y: f32,
    scale_x: f32,
    scale_y: f32,
    x_min: f32,
    y_max: f32,
    area_top: f32,
    center_x: f32,
}

impl Frame {
    fn to_page(self, p: Point) -> (f32, f32) {
        (
            self.origin_x + (p.x - self.x_min) * self.scale_x,
            self.origin_y + (self.y_max - p.y) * self.scale_y,
        )
    }
}

impl Figure {
    pub fn new(
        width_in: f32,
        height_in: f32,
        x_range: (f32, f32),
        y_range: (f32, f32),
        theme: &Theme,
    ) -> Self {
        Self {
            width: width_in * POINTS_PER_INCH,
            height: height_in * POINTS_PER_INCH,
            x_range,
            y_range,
            equal_aspect: false,
            title: None,
            title_size: theme.title_font_size,
            font_family: theme.font_family.clone(),
            text_color: theme.text_color.clone(),
            background: theme.background.clone(),
            elements: Vec::new(),
        }
    }

    pub fn with_equal_aspect(mut self) -> Self {
        self.equal_aspect = true;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Page size in points.
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Grows the page until the plot area is at least `width` by `height`
    /// points. Never shrinks it.
    pub fn fit_area(&mut self, width: f32, height: f32) {
        let (left, right, bottom, top) = AREA;
        self.width = self.width.max(width / (right - left));
        self.height = self.height.max(height / (top - bottom));
    }

    pub fn polygon(&mut self, points: Vec<Point>, fill: &str, stroke: &str, stroke_width: f32) {
        self.elements.push(Element::Polygon {
            points,
            fill: fill.to_string(),
            stroke: stroke.to_string(),
            stroke_width,
        });
    }

    pub fn line(&mut self, from: Point, to: Point, color: &str, width: f32) {
        self.elements.push(Element::Line {
            from,
            to,
            color: color.to_string(),
            width,
        });
    }

    pub fn arrow(&mut self, from: Point, to: Point, color: &str, width: f32, head: ArrowHead) {
        self.elements.push(Element::Arrow {
            from,
            to,
            color: color.to_string(),
            width,
            head,
        });
    }

    /// Counter-clockwise arc from `start_deg` to `end_deg`.
    pub fn arc(
        &mut self,
        center: Point,
        radius: f32,
        start_deg: f32,
        end_deg: f32,
        color: &str,
        width: f32,
    ) {
        self.elements.push(Element::Arc {
            center,
            radius,
            start_deg,
            end_deg,
            color: color.to_string(),
            width,
        });
    }

    pub fn text(&mut self, at: Point, text: &str, style: TextStyle) {
        self.rich_text(at, vec![vec![Span::plain(text)]], style);
    }

    pub fn rich_text(&mut self, at: Point, lines: Vec<Vec<Span>>, style: TextStyle) {
        self.elements.push(Element::Text { at, lines, style });
    }

    /// Text content of every text element, in drawing order. Lines are
    /// concatenated without separators.
    pub fn text_contents(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                Element::Text { lines, .. } => Some(
                    lines
                        .iter()
                        .flatten()
                        .map(|span| span.text.as_str())
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect()
    }

    /// Whether every coordinate and size in the figure is a finite number.
    pub fn is_finite(&self) -> bool {
        let limits = [self.x_range.0, self.x_range.1, self.y_range.0, self.y_range.1];
        if limits.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.elements.iter().all(|element| match element {
            Element::Polygon { points, .. } => points.iter().all(|p| p.is_finite()),
            Element::Line { from, to, .. } | Element::Arrow { from, to, .. } => {
                from.is_finite() && to.is_finite()
            }
            Element::Arc {
                center,
                radius,
                start_deg,
                end_deg,
                ..
            } => center.is_finite() && radius.is_finite() && start_deg.is_finite() && end_deg.is_finite(),
            Element::Text { at, .. } => at.is_finite(),
        })
    }

    fn frame(&self) -> Frame {
        let (left, right, bottom, top) = AREA;
        let area_x = left * self.width;
        let area_w = (right - left) * self.width;
        let area_y = (1.0 - top) * self.height;
        let area_h = (top - bottom) * self.height;
        let span_x = (self.x_range.1 - self.x_range.0).max(f32::EPSILON);
        let span_y = (self.y_range.1 - self.y_range.0).max(f32::EPSILON);

        let (mut scale_x, mut scale_y) = (area_w / span_x, area_h / span_y);
        if self.equal_aspect {
            let scale = scale_x.min(scale_y);
            scale_x = scale;
            scale_y = scale;
        }
        Frame {
            origin_x: area_x + (area_w - scale_x * span_x) / 2.0,
            origin_y: area_y + (area_h - scale_y * span_y) / 2.0,
            scale_x,
            scale_y,
            x_min: self.x_range.0,
            y_max: self.y_range.1,
            area_top: area_y,
            center_x: area_x + area_w / 2.0,
        }
    }

    /// Height of one text line at `size` points, in data units.
    pub fn line_height_data(&self, size: f32) -> f32 {
        size * LINE_HEIGHT / self.frame().scale_y
    }

    pub fn to_svg(&self) -> String {
        let frame = self.frame();
        let (width, height) = (self.width, self.height);
        let mut svg = String::new();

        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
        ));
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            self.background
        ));

        for element in &self.elements {
            match element {
                Element::Polygon {
                    points,
                    fill,
                    stroke,
                    stroke_width,
                } => {
                    svg.push_str(&format!(
                        "<polygon points=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linejoin=\"miter\"/>",
                        points_attr(points.iter().map(|p| frame.to_page(*p))),
                        fill,
                        stroke,
                        stroke_width
                    ));
                }
                Element::Line {
                    from,
                    to,
                    color,
                    width,
                } => {
                    let (x0, y0) = frame.to_page(*from);
                    let (x1, y1) = frame.to_page(*to);
                    svg.push_str(&format!(
                        "<line x1=\"{x0:.2}\" y1=\"{y0:.2}\" x2=\"{x1:.2}\" y2=\"{y1:.2}\" stroke=\"{color}\" stroke-width=\"{width:.2}\"/>",
                    ));
                }
                Element::Arrow {
                    from,
                    to,
                    color,
                    width,
                    head,
                } => svg.push_str(&arrow_svg(frame, *from, *to, color, *width, *head)),
                Element::Arc {
                    center,
                    radius,
                    start_deg,
                    end_deg,
                    color,
                    width,
                } => svg.push_str(&arc_svg(frame, *center, *radius, *start_deg, *end_deg, color, *width)),
                Element::Text { at, lines, style } => {
                    let (x, y) = frame.to_page(*at);
                    svg.push_str(&text_block_svg(x, y, lines, style, &self.font_family));
                }
            }
        }

        if let Some(title) = &self.title {
            let style = TextStyle::new(self.title_size, &self.text_color).bold();
            let style = TextStyle {
                anchor: Anchor::Middle,
                ..style
            };
            let baseline = frame.area_top - self.title_size * 0.5;
            svg.push_str(&text_block_svg(
                frame.center_x,
                baseline,
                &[vec![Span::plain(title.as_str())]],
                &style,
                &self.font_family,
            ));
        }

        svg.push_str("</svg>");
        svg
    }
}

fn points_attr(points: impl Iterator<Item = (f32, f32)>) -> String {
    points
        .map(|(x, y)| format!("{x:.2},{y:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn arrow_svg(frame: Frame, from: Point, to: Point, color: &str, width: f32, head: ArrowHead) -> String {
    let (x0, y0) = frame.to_page(from);
    let (x1, y1) = frame.to_page(to);
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-3 {
        return String::new();
    }
    let (ux, uy) = (dx / len, dy / len);
    // Unit normal, rotated a quarter turn from the direction.
    let (nx, ny) = (-uy, ux);

    let mut svg = format!(
        "<line x1=\"{x0:.2}\" y1=\"{y0:.2}\" x2=\"{x1:.2}\" y2=\"{y1:.2}\" stroke=\"{color}\" stroke-width=\"{width:.2}\"/>",
    );
    match head {
        ArrowHead::Open { length } => {
            let back = length * 0.9;
            let spread = length * 0.45;
            let left = (x1 - ux * back + nx * spread, y1 - uy * back + ny * spread);
            let right = (x1 - ux * back - nx * spread, y1 - uy * back - ny * spread);
            svg.push_str(&format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"miter\"/>",
                points_attr([left, (x1, y1), right].into_iter()),
            ));
        }
        ArrowHead::Filled { width: head_w, length } => {
            let half = head_w * frame.scale_x / 2.0;
            let reach = length * frame.scale_x;
            let tip = (x1 + ux * reach, y1 + uy * reach);
            let corners = [
                (x1 + nx * half, y1 + ny * half),
                tip,
                (x1 - nx * half, y1 - ny * half),
            ];
            svg.push_str(&format!(
                "<polygon points=\"{}\" fill=\"{color}\" stroke=\"{color}\" stroke-width=\"1\"/>",
                points_attr(corners.into_iter()),
            ));
        }
    }
    svg
}

fn arc_svg(
    frame: Frame,
    center: Point,
    radius: f32,
    start_deg: f32,
    end_deg: f32,
    color: &str,
    width: f32,
) -> String {
    let (cx, cy) = frame.to_page(center);
    let r = radius * frame.scale_x;
    let (a0, a1) = (start_deg.to_radians(), end_deg.to_radians());
    // Page y grows downward, so counter-clockwise in data is sweep-flag 0.
    let (sx, sy) = (cx + r * a0.cos(), cy - r * a0.sin());
    let (ex, ey) = (cx + r * a1.cos(), cy - r * a1.sin());
    let large = if (end_deg - start_deg).abs() > 180.0 { 1 } else { 0 };
    format!(
        "<path d=\"M {sx:.2} {sy:.2} A {r:.2} {r:.2} 0 {large} 0 {ex:.2} {ey:.2}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\"/>",
    )
}

fn text_block_svg(x: f32, y: f32, lines: &[Vec<Span>], style: &TextStyle, font_family: &str) -> String {
    let line_height = style.size * LINE_HEIGHT;
    let first_baseline = match style.baseline {
        Baseline::Alphabetic => y,
        Baseline::Center => y - line_height * lines.len() as f32 / 2.0 + line_height / 2.0 + style.size * 0.35,
    };
    let anchor = match style.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
    };

    let mut svg = String::new();
    if let Some(fill) = &style.box_fill {
        let width = block_width(lines, style.size);
        let pad = style.size * 0.3;
        let left = match style.anchor {
            Anchor::Start => x,
            Anchor::Middle => x - width / 2.0,
        } - pad;
        let top = first_baseline - style.size * 0.95 - pad;
        let rect_w = width + pad * 2.0;
        let rect_h = line_height * (lines.len() as f32 - 1.0) + style.size * 1.2 + pad * 2.0;
        svg.push_str(&format!(
            "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{rect_w:.2}\" height=\"{rect_h:.2}\" rx=\"{pad:.2}\" ry=\"{pad:.2}\" fill=\"{fill}\" fill-opacity=\"0.8\" stroke=\"#000000\" stroke-opacity=\"0.8\" stroke-width=\"0.8\"/>",
        ));
    }

    let weight = if style.bold { "bold" } else { "normal" };
    svg.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{first_baseline:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{:.2}\" font-weight=\"{weight}\" fill=\"{}\">",
        escape_xml(font_family),
        style.size,
        style.color
    ));
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        svg.push_str(&format!("<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">"));
        let last = line.len().saturating_sub(1);
        for (span_idx, span) in line.iter().enumerate() {
            let text = if span_idx == last { span.text.trim_end() } else { span.text.as_str() };
            svg.push_str(&span_svg(text, span, style.size));
        }
        svg.push_str("</tspan>");
    }
    svg.push_str("</text>");
    svg
}

fn span_svg(text: &str, span: &Span, size: f32) -> String {
    let text = escape_xml(text);
    match (span.bold, span.subscript) {
        (false, false) => text,
        (bold, subscript) => {
            let mut attrs = String::new();
            if bold {
                attrs.push_str(" font-weight=\"bold\"");
            }
            if subscript {
                attrs.push_str(&format!(
                    " baseline-shift=\"sub\" font-size=\"{:.2}\"",
                    size * SUBSCRIPT_SCALE
                ));
            }
            format!("<tspan{attrs}>{text}</tspan>")
        }
    }
}

/// Estimated size in points of a text block: widest line by total height.
pub fn text_block_size(lines: &[Vec<Span>], size: f32) -> (f32, f32) {
    (block_width(lines, size), size * LINE_HEIGHT * lines.len() as f32)
}

fn block_width(lines: &[Vec<Span>], size: f32) -> f32 {
    lines
        .iter()
        .map(|line| estimate_line_width(line, size))
        .fold(0.0, f32::max)
}

fn estimate_line_width(line: &[Span], size: f32) -> f32 {
    line.iter()
        .map(|span| {
            let span_size = if span.subscript { size * SUBSCRIPT_SCALE } else { size };
            span.text.trim_end().chars().map(char_width_factor).sum::<f32>() * span_size
        })
        .sum()
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.32,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
        'f' | 'r' | 't' | '(' | ')' | '[' | ']' | '{' | '}' => 0.38,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.9,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_digit() => 0.62,
        _ => 0.56,
    }
}

/// Typesets the small LaTeX subset used by force labels: `$...$` math
/// delimiters, `\vec{X}` (drawn bold) and `_x` / `_{xy}` subscripts.
pub fn typeset_latex(source: &str) -> Vec<Span> {
    let body = source.trim().trim_matches('$');
    let mut spans: Vec<Span> = Vec::new();
    let mut plain = String::new();
    let mut chars = body.chars().peekable();

    let flush = |plain: &mut String, spans: &mut Vec<Span>| {
        if !plain.is_empty() {
            spans.push(Span::plain(std::mem::take(plain)));
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let command: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_alphabetic())).collect();
                let argument = take_group(&mut chars);
                flush(&mut plain, &mut spans);
                match command.as_str() {
                    "vec" | "mathbf" => spans.push(Span {
                        text: argument,
                        bold: true,
                        subscript: false,
                    }),
                    _ => spans.push(Span::plain(argument)),
                }
            }
            '_' => {
                let argument = take_group(&mut chars);
                flush(&mut plain, &mut spans);
                spans.push(Span {
                    text: argument,
                    bold: false,
                    subscript: true,
                });
            }
            other => plain.push(other),
        }
    }
    flush(&mut plain, &mut spans);
    spans
}

/// Reads `{...}` or a single character.
fn take_group(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    match chars.peek() {
        Some('{') => {
            chars.next();
            let mut depth = 1;
            let mut group = String::new();
            for c in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                group.push(c);
            }
            group
        }
        Some(_) => chars.next().map(String::from).unwrap_or_default(),
        None => String::new(),
    }
}

/// Greedy word wrap that keeps every character: concatenating the returned
/// lines gives back `text` exactly.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_inclusive(char::is_whitespace) {
        let current_len = current.trim_end().chars().count();
        let word_len = word.trim_end().chars().count();
        if !current.is_empty() && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        current.push_str(word);
        if word.ends_with('\n') {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_figure() -> Figure {
        Figure::new(8.0, 8.0, (-3.0, 3.0), (-3.0, 3.0), &Theme::classic()).with_equal_aspect()
    }

    #[test]
    fn typesets_vector_with_subscript() {
        let spans = typeset_latex(r"$\vec{F}_g = mg$");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "F");
        assert!(spans[0].bold);
        assert_eq!(spans[1].text, "g");
        assert!(spans[1].subscript);
        assert_eq!(spans[2].text, " = mg");
    }

    #[test]
    fn typesets_braced_subscript() {
        let spans = typeset_latex(r"$\vec{F}_{app}$");
        assert_eq!(spans[1].text, "app");
        assert!(spans[1].subscript);
    }

    #[test]
    fn wrap_preserves_text_verbatim() {
        let text = "Draw a  block resting on a\nfrictionless table with   a long rope attached";
        let lines = wrap_text(text, 12);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
    }

    #[test]
    fn wrap_keeps_overlong_words_whole() {
        let lines = wrap_text("supercalifragilistic word", 5);
        assert_eq!(lines[0], "supercalifragilistic ");
        assert_eq!(lines.concat(), "supercalifragilistic word");
    }

    #[test]
    fn wrap_empty_text_yields_one_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn origin_maps_to_plot_area_center_with_equal_aspect() {
        let figure = square_figure();
        let (x, y) = figure.frame().to_page(Point::new(0.0, 0.0));
        let (w, _) = figure.size();
        let area_center = (AREA.0 + AREA.1) / 2.0 * w;
        assert!((x - area_center).abs() < 0.01);
        let area_mid = (1.0 - AREA.3) * figure.height + (AREA.3 - AREA.2) * figure.height / 2.0;
        assert!((y - area_mid).abs() < 0.01);
    }

    #[test]
    fn fit_area_only_grows_the_page() {
        let mut figure = square_figure();
        figure.fit_area(10.0, 10.0);
        assert_eq!(figure.size(), (576.0, 576.0));
        figure.fit_area(10.0, 770.0);
        let (w, h) = figure.size();
        assert_eq!(w, 576.0);
        assert!((h - 1000.0).abs() < 0.1);
    }

    #[test]
    fn boxed_text_uses_given_fill() {
        let mut figure = square_figure();
        figure.text(Point::new(0.0, 0.0), "N", TextStyle::new(12.0, "black").boxed("#EEEEEE"));
        figure.text(Point::new(1.0, 0.0), "T", TextStyle::new(12.0, "black"));
        let svg = figure.to_svg();
        assert_eq!(svg.matches("<rect x=").count(), 1);
        assert!(svg.contains("fill=\"#EEEEEE\""));
    }

    #[test]
    fn text_block_size_counts_lines() {
        let lines = vec![vec![Span::plain("ab")], vec![Span::plain("abcd")]];
        let (w, h) = text_block_size(&lines, 10.0);
        assert!((w - 4.0 * 0.56 * 10.0).abs() < 0.01);
        assert!((h - 24.0).abs() < 0.01);
    }

    #[test]
    fn svg_escapes_text() {
        let mut figure = square_figure();
        figure.text(Point::new(0.0, 0.0), "a < b & c", TextStyle::new(12.0, "black"));
        let svg = figure.to_svg();
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn degenerate_arrow_emits_nothing() {
        let mut figure = square_figure();
        let p = Point::new(1.0, 1.0);
        figure.arrow(p, p, "red", 2.0, ArrowHead::Open { length: 10.0 });
        assert!(!figure.to_svg().contains("<line"));
    }

    #[test]
    fn non_finite_points_are_detected() {
        let mut figure = square_figure();
        assert!(figure.is_finite());
        figure.polygon(vec![Point::new(f32::NAN, 0.0)], "gray", "black", 1.0);
        assert!(!figure.is_finite());
    }

    #[test]
    fn text_contents_concatenate_lines() {
        let mut figure = square_figure();
        figure.rich_text(
            Point::new(0.0, 0.0),
            vec![vec![Span::plain("one ")], vec![Span::plain("two")]],
            TextStyle::new(12.0, "black").centered(),
        );
        assert_eq!(figure.text_contents(), vec!["one two".to_string()]);
    }
}
