use crate::ir::{DiagramSpec, DiagramType, Force};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Type keywords, checked in order; the first rule with a matching keyword
/// decides the type.
const TYPE_RULES: &[(DiagramType, &[&str])] = &[
    (DiagramType::FreeBody, &["free body", "fbd"]),
    (DiagramType::InclinedPlane, &["inclined plane", "ramp"]),
    (DiagramType::Pulley, &["pulley"]),
    (DiagramType::Projectile, &["projectile", "trajectory"]),
];

// The friction alternatives accept a bare `f`, so almost any text with an
// "f" in it reports friction. Kept as-is: callers only look at membership.
static FORCE_PATTERNS: Lazy<Vec<(Force, Regex)>> = Lazy::new(|| {
    Force::ALL
        .into_iter()
        .map(|force| {
            let pattern = match force {
                Force::Weight => r"weight|gravity|mg",
                Force::Normal => r"normal force|normal",
                Force::Friction => r"friction|f[_k]?|f[_s]?",
                Force::Tension => r"tension",
                Force::Applied => r"applied force|push|pull",
                Force::Drag => r"drag|air resistance",
            };
            (force, Regex::new(pattern).unwrap())
        })
        .collect()
});

// ASCII digits only.
static ANGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((?-u:\d)+)°|((?-u:\d)+)\s*degrees").unwrap());

/// Classifies a free-text diagram description. Never fails; text with no
/// recognizable structure yields a generic spec with no forces and no angle.
pub fn parse_description(description: &str) -> DiagramSpec {
    let lowered = description.to_lowercase();
    let kind = classify(&lowered);
    let forces = extract_forces(&lowered);
    // Matched against the original casing: "30 Degrees" carries no angle.
    let angle = extract_angle(description);

    debug!(
        "parsed diagram description: type={} forces={:?} angle={:?}",
        kind.as_str(),
        forces,
        angle
    );

    DiagramSpec {
        kind,
        forces,
        angle,
        description: description.to_string(),
    }
}

fn classify(lowered: &str) -> DiagramType {
    TYPE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(kind, _)| *kind)
        .unwrap_or(DiagramType::Generic)
}

fn extract_forces(lowered: &str) -> Vec<Force> {
    FORCE_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(lowered))
        .map(|(force, _)| *force)
        .collect()
}

fn extract_angle(text: &str) -> Option<u32> {
    let caps = ANGLE_RE.captures(text)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    digits.as_str().parse().ok()
}
