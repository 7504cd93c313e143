//! Persona Registry
//!
//! The advisory team is a closed set: one team lead who aggregates the
//! specialists' findings, and five specialists. Identity is resolved from the
//! agent name carried on each turn, trimmed and case-insensitive.
//!
//! The registry also holds the static presentation profile for each persona.
//! Renderers read it; nothing in the playback path depends on it.

use serde::{Deserialize, Serialize};

/// A known member of the advisory team
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Team lead, aggregates specialist summaries
    Sarah,
    /// Residential property specialist
    Mike,
    /// Negotiation specialist
    Jessica,
    /// Legal advisor
    Robert,
    /// Lifestyle consultant
    Emma,
    /// Location expert
    Jack,
}

/// What a persona contributes to the conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    /// Bundles the other specialists' summaries
    Aggregator,
    /// Property search and recommendations
    Property,
    /// Market analysis and offer strategy
    Negotiation,
    /// Contracts, documents and closing
    Legal,
    /// Amenities and neighborhood character
    Lifestyle,
    /// Commutes and distances
    Location,
}

/// Static presentation data for an agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    /// Accent color as a hex string
    pub display_color: &'static str,
    /// Avatar emoji
    pub emoji: &'static str,
    /// Human-readable role
    pub role: &'static str,
}

/// Profile used for agents outside the team
pub const UNKNOWN_PROFILE: AgentProfile = AgentProfile {
    display_color: "#666666",
    emoji: "👤",
    role: "Advisor",
};

impl Persona {
    /// Persona that speaks when nobody else can (fallback messages)
    pub const DEFAULT: Self = Self::Sarah;

    /// Every persona, team lead first
    pub const ALL: [Self; 6] = [
        Self::Sarah,
        Self::Mike,
        Self::Jessica,
        Self::Robert,
        Self::Emma,
        Self::Jack,
    ];

    /// Resolve an agent name to a persona
    ///
    /// Matching ignores surrounding whitespace and case, so `" Mike "` and
    /// `"mike"` both resolve to [`Persona::Mike`].
    pub fn from_name(name: &str) -> Option<Self> {
        let key = identity_key(name);
        Self::ALL.into_iter().find(|p| p.name().eq_ignore_ascii_case(&key))
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Sarah => "Sarah",
            Self::Mike => "Mike",
            Self::Jessica => "Jessica",
            Self::Robert => "Robert",
            Self::Emma => "Emma",
            Self::Jack => "Jack",
        }
    }

    /// What this persona contributes
    pub fn specialty(self) -> Specialty {
        match self {
            Self::Sarah => Specialty::Aggregator,
            Self::Mike => Specialty::Property,
            Self::Jessica => Specialty::Negotiation,
            Self::Robert => Specialty::Legal,
            Self::Emma => Specialty::Lifestyle,
            Self::Jack => Specialty::Location,
        }
    }

    /// Presentation profile
    pub fn profile(self) -> AgentProfile {
        match self {
            Self::Sarah => AgentProfile {
                display_color: "#FF69B4",
                emoji: "🎭",
                role: "Real Estate Team Lead",
            },
            Self::Mike => AgentProfile {
                display_color: "#4CAF50",
                emoji: "🏠",
                role: "Residential Property Specialist",
            },
            Self::Jessica => AgentProfile {
                display_color: "#FFA500",
                emoji: "💰",
                role: "Negotiation Specialist",
            },
            Self::Robert => AgentProfile {
                display_color: "#795548",
                emoji: "⚖️",
                role: "Legal Advisor",
            },
            Self::Emma => AgentProfile {
                display_color: "#9C27B0",
                emoji: "🌟",
                role: "Lifestyle Consultant",
            },
            Self::Jack => AgentProfile {
                display_color: "#2196F3",
                emoji: "🗺️",
                role: "Location Expert",
            },
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Profile for any agent name, falling back to [`UNKNOWN_PROFILE`]
pub fn profile_for(name: &str) -> AgentProfile {
    Persona::from_name(name).map_or(UNKNOWN_PROFILE, Persona::profile)
}

/// Normalized identity used to compare agents across turns
pub fn identity_key(name: &str) -> String {
    name.trim().to_lowercase()
}
