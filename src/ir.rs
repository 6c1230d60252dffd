use serde::{Deserialize, Serialize};

/// Category a diagram description is classified into.
///
/// `Pulley` and `Projectile` are recognized but have no template of their
/// own; they render through the free-body or generic path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    FreeBody,
    InclinedPlane,
    Pulley,
    Projectile,
    Generic,
}

impl DiagramType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FreeBody => "free_body",
            Self::InclinedPlane => "inclined_plane",
            Self::Pulley => "pulley",
            Self::Projectile => "projectile",
            Self::Generic => "generic",
        }
    }
}

/// The closed force vocabulary. Declaration order is the scan order used by
/// the parser, so `forces` lists come out sorted by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Force {
    Weight,
    Normal,
    Friction,
    Tension,
    Applied,
    Drag,
}

impl Force {
    pub const ALL: [Force; 6] = [
        Force::Weight,
        Force::Normal,
        Force::Friction,
        Force::Tension,
        Force::Applied,
        Force::Drag,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight",
            Self::Normal => "Normal",
            Self::Friction => "Friction",
            Self::Tension => "Tension",
            Self::Applied => "Applied",
            Self::Drag => "Drag",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|force| force.label() == label)
    }
}

/// Structured classification of one diagram description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramSpec {
    #[serde(rename = "type")]
    pub kind: DiagramType,
    pub forces: Vec<Force>,
    pub angle: Option<u32>,
    pub description: String,
}

impl DiagramSpec {
    pub fn generic(description: &str) -> Self {
        Self {
            kind: DiagramType::Generic,
            forces: Vec::new(),
            angle: None,
            description: description.to_string(),
        }
    }

    pub fn has_force(&self, force: Force) -> bool {
        self.forces.contains(&force)
    }
}

/// A rendered diagram as it travels back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDiagram {
    pub description: String,
    /// `data:image/png;base64,...`
    pub image: String,
}
