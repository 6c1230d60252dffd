pub mod config;
pub mod figure;
pub mod ir;
pub mod parser;
pub mod render;
pub mod solution;
pub mod theme;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::{Config, RenderConfig, load_config};
pub use ir::{DiagramSpec, DiagramType, Force, RenderedDiagram};
pub use parser::parse_description;
pub use render::{RenderError, Template, render_diagram, try_render_diagram};
pub use solution::{SolutionPayload, build_payload, extract_diagram_tags};
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;
