use crate::config::load_config;
use crate::parser::parse_description;
use crate::render::{render_png, write_output_png};
use crate::solution::{
    API_KEY_VAR, HealthStatus, SolutionPayload, build_payload, extract_diagram_tags,
    render_descriptions,
};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "physdiag",
    version,
    about = "Render [DIAGRAM: ...] tags from a physics explanation"
)]
pub struct Args {
    /// Model answer (text/markdown) or '-' for stdin
    #[arg(short = 'i', long = "input", conflicts_with = "description")]
    pub input: Option<PathBuf>,

    /// Render a single diagram description instead of scanning an answer
    #[arg(short = 'd', long = "description")]
    pub description: Option<String>,

    /// Output file. JSON goes to stdout when omitted; PNG needs a path.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme and render settings)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Print the health status as JSON and exit
    #[arg(long = "health")]
    pub health: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    execute(&args)
}

fn init_logging(level: &str) {
    let filter = level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        log::LevelFilter::Warn
    });
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .try_init();
}

pub fn execute(args: &Args) -> Result<()> {
    if args.health {
        let status = HealthStatus::from_env(API_KEY_VAR);
        return write_text(&serde_json::to_string_pretty(&status)?, args.output.as_deref());
    }

    let config = load_config(args.config.as_deref())?;
    // A `-d` description is taken verbatim, never re-scanned for tags.
    let (answer, descriptions) = match &args.description {
        Some(description) => (None, vec![description.clone()]),
        None => {
            let answer = read_input(args.input.as_deref())?;
            let descriptions = extract_diagram_tags(&answer);
            (Some(answer), descriptions)
        }
    };

    match args.output_format {
        OutputFormat::Json => {
            let payload = match &answer {
                Some(answer) => build_payload(answer, &config),
                None => SolutionPayload {
                    success: true,
                    solution: None,
                    diagrams: Some(render_descriptions(&descriptions, &config)),
                    error: None,
                },
            };
            let json = serde_json::to_string_pretty(&payload)?;
            write_text(&json, args.output.as_deref())
        }
        OutputFormat::Png => {
            if descriptions.is_empty() {
                return Err(anyhow::anyhow!("No diagram tags found in input"));
            }
            let output = args
                .output
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let outputs = resolve_outputs(output, descriptions.len());
            let mut written = 0;
            for (description, path) in descriptions.iter().zip(&outputs) {
                let spec = parse_description(description);
                match render_png(&spec, &config) {
                    Ok(png) => {
                        write_output_png(&png, path)?;
                        written += 1;
                    }
                    Err(err) => error!("Skipping diagram {description:?}: {err}"),
                }
            }
            info!("Wrote {written} of {} diagrams", descriptions.len());
            Ok(())
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

/// One PNG path per diagram: the path itself for a single diagram, numbered
/// siblings (`stem-N.png`) for several, or `diagram-N.png` inside a directory.
fn resolve_outputs(base: &Path, count: usize) -> Vec<PathBuf> {
    if base.is_dir() {
        return (1..=count)
            .map(|idx| base.join(format!("diagram-{idx}.png")))
            .collect();
    }
    if count == 1 {
        return vec![base.to_path_buf()];
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("diagram");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    (1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.png")))
        .collect()
}
