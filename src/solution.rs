//! Request-path helpers around the diagram core: pulling `[DIAGRAM: ...]`
//! tags out of a model answer, vetting uploads, and shaping the JSON reply.

use crate::config::Config;
use crate::ir::RenderedDiagram;
use crate::parser::parse_description;
use crate::render::render_diagram;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Environment variable holding the hosted model's API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

static DIAGRAM_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[DIAGRAM:\s*([^\]]+)\]").unwrap());

/// Instructions sent with every uploaded problem image. The diagram section
/// asks for the `[DIAGRAM: ...]` tags that [`extract_diagram_tags`] reads.
pub const PHYSICS_PROMPT: &str = r###"You are an expert physics tutor specializing in AP Physics and introductory college-level physics.

Analyze the physics problem shown in the image and provide a complete, step-by-step solution.

IMPORTANT FORMATTING RULES:
- Use LaTeX for ALL mathematical expressions, equations, and variables
- Wrap inline math in single dollar signs: $v = 10 \text{ m/s}$
- Wrap display equations in double dollar signs: $$F = ma$$
- Use proper LaTeX subscripts: $v_0$, $a_x$, $F_{net}$
- Use proper LaTeX superscripts: $x^2$, $v^2$
- Use \text{} for units inside math: $10 \text{ m/s}^2$
- Use \vec{} for vectors: $\vec{F}$, $\vec{v}$

DIAGRAM INSTRUCTIONS:
If a free body diagram or any physics diagram would help understand the problem:
1. Include a section titled "## Free Body Diagram" or "## Diagram"
2. Describe the diagram in detail using this format:
   [DIAGRAM: detailed description of what to draw, including all forces, angles, coordinate system, labels]
3. Example: [DIAGRAM: Draw a box on an inclined plane at 30°. Show weight vector mg pointing down, normal force N perpendicular to plane, friction force f parallel to plane pointing up. Include coordinate axes with x along the plane.]

Follow these guidelines:
1. **Identify the Problem**: Clearly state what is being asked.
2. **Free Body Diagram / Diagram** (if applicable): provide the description in [DIAGRAM: ...] format.
3. **List Given Information**: extract all known values, constants, and conditions, in LaTeX.
4. **Determine Relevant Concepts**: identify the principles and equations needed.
5. **Solve Step-by-Step**: show all work with units and explain each step.
6. **Final Answer**: state the answer clearly with units and significant figures.

Keep explanations clear and concise. Use LaTeX for ALL math. Provide diagram descriptions when helpful.

If the image does not contain a physics problem, politely state that you can only solve physics problems."###;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No image file provided")]
    MissingFile,
    #[error("Empty filename")]
    EmptyFilename,
    #[error("Invalid file type '{0}'. Please upload PNG, JPG, JPEG, GIF or WEBP")]
    InvalidExtension(String),
}

/// Checks an uploaded file name and returns its lower-cased extension.
/// A name without a dot is treated as its own extension.
pub fn validate_upload(filename: Option<&str>) -> Result<String, UploadError> {
    let filename = filename.ok_or(UploadError::MissingFile)?;
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }
    let extension = filename
        .rsplit_once('.')
        .map_or(filename, |(_, ext)| ext)
        .to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(UploadError::InvalidExtension(extension))
    }
}

/// Inner text of every `[DIAGRAM: ...]` tag, trimmed, in order of appearance.
/// Tags with nothing but whitespace inside are dropped.
pub fn extract_diagram_tags(text: &str) -> Vec<String> {
    DIAGRAM_TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|description| !description.is_empty())
        .collect()
}

/// Parses and renders one description; `None` when the image was omitted.
pub fn render_description(description: &str, config: &Config) -> Option<RenderedDiagram> {
    let spec = parse_description(description);
    let image = render_diagram(&spec, config)?;
    Some(RenderedDiagram {
        description: description.to_string(),
        image,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionPayload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagrams: Option<Vec<RenderedDiagram>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolutionPayload {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            solution: None,
            diagrams: None,
            error: Some(message.into()),
        }
    }
}

/// Renders descriptions in order, leaving out the ones that could not be drawn.
pub fn render_descriptions<S: AsRef<str>>(descriptions: &[S], config: &Config) -> Vec<RenderedDiagram> {
    let mut diagrams = Vec::with_capacity(descriptions.len());
    for description in descriptions {
        let description = description.as_ref();
        match render_description(description, config) {
            Some(diagram) => diagrams.push(diagram),
            None => warn!("Omitting diagram: {description}"),
        }
    }
    info!(
        "Rendered {} of {} diagrams",
        diagrams.len(),
        descriptions.len()
    );
    diagrams
}

/// Renders every diagram tag in `solution`, in order, and wraps the result.
/// The solution text is returned untouched.
pub fn build_payload(solution: &str, config: &Config) -> SolutionPayload {
    let tags = extract_diagram_tags(solution);
    SolutionPayload {
        success: true,
        solution: Some(solution.to_string()),
        diagrams: Some(render_descriptions(&tags, config)),
        error: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub api_configured: bool,
}

impl HealthStatus {
    pub fn from_env(var: &str) -> Self {
        let api_configured = std::env::var(var).is_ok_and(|value| !value.is_empty());
        Self {
            status: "healthy".to_string(),
            api_configured,
        }
    }
}
