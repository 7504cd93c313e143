//! Content Blocks
//!
//! Typed, renderer-agnostic units of structured content. Blocks are produced
//! once per response by the dispatcher and never change afterwards; a
//! renderer matches on [`ContentBlock`] and draws whatever it likes.
//!
//! Every brief carries only what the agent actually said. Empty sections are
//! empty vectors or `None`, never placeholder strings.

use serde::{Deserialize, Serialize};

/// Discriminant of a [`ContentBlock`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    /// Property cards
    PropertyListing,
    /// Negotiation strategy
    Negotiation,
    /// Closing process
    Legal,
    /// Neighborhood character
    Lifestyle,
    /// Commutes and distances
    Location,
    /// Section header inside the team lead's summary
    SummarySection,
    /// Plain text
    Text,
}

impl BlockKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PropertyListing => "property-listing",
            Self::Negotiation => "negotiation",
            Self::Legal => "legal",
            Self::Lifestyle => "lifestyle",
            Self::Location => "location",
            Self::SummarySection => "summary-section",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of structured content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum ContentBlock {
    /// Property cards from one search stage
    PropertyListing(PropertyListing),
    /// Negotiation strategy
    Negotiation(NegotiationBrief),
    /// Closing process overview
    Legal(LegalBrief),
    /// Amenities, local gems and tips
    Lifestyle(LifestyleBrief),
    /// Commute and distances
    Location(LocationBrief),
    /// Header introducing one section of the team lead's summary
    SummarySection {
        /// Which specialist's summary follows
        section: SummaryTopic,
        /// Heading text
        title: String,
    },
    /// Plain text
    Text(String),
}

impl ContentBlock {
    /// Kind of this block
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::PropertyListing(_) => BlockKind::PropertyListing,
            Self::Negotiation(_) => BlockKind::Negotiation,
            Self::Legal(_) => BlockKind::Legal,
            Self::Lifestyle(_) => BlockKind::Lifestyle,
            Self::Location(_) => BlockKind::Location,
            Self::SummarySection { .. } => BlockKind::SummarySection,
            Self::Text(_) => BlockKind::Text,
        }
    }

    /// Header block for a summary section
    pub fn summary_header(section: SummaryTopic) -> Self {
        Self::SummarySection {
            section,
            title: section.title().to_string(),
        }
    }

    /// The text of a `text` block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// Property listing
// ============================================================================

/// Which search stage a listing came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStage {
    /// First pass over the market
    InitialSearch,
    /// Final shortlist
    FinalRecommendations,
}

/// Properties found at one stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyListing {
    /// Stage the properties came from
    pub stage: ListingStage,
    /// Properties, in backend order
    pub properties: Vec<Property>,
}

/// A property card
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Listing name or address
    pub name: Option<String>,
    /// Asking price, as written
    pub price: Option<String>,
    /// Headline or description
    pub highlight: Option<String>,
    /// When it can be viewed or moved into
    pub availability: Option<String>,
    /// Neighborhood or address
    pub location: Option<String>,
    /// Feature tags
    pub features: Vec<String>,
}

impl Property {
    /// True when there is nothing to show for this property
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.highlight.is_none()
            && self.availability.is_none()
            && self.location.is_none()
            && self.features.is_empty()
    }
}

// ============================================================================
// Negotiation
// ============================================================================

/// Negotiation strategy for a property
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationBrief {
    /// Market conditions
    pub market: Option<MarketSnapshot>,
    /// Best case, realistic and walk-away, in that order, when present
    pub scenarios: Vec<OutcomeScenario>,
    /// Buyer's leverage
    pub leverage_points: Vec<KeyPoint>,
    /// Negotiation steps in order
    pub timeline: Vec<Milestone>,
    /// Opening offer
    pub opening: Option<OpeningMove>,
}

impl NegotiationBrief {
    /// True when no section has content
    pub fn is_empty(&self) -> bool {
        self.market.is_none()
            && self.scenarios.is_empty()
            && self.leverage_points.is_empty()
            && self.timeline.is_empty()
            && self.opening.is_none()
    }
}

/// Market conditions
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Headline read of the market
    pub summary: Option<String>,
    /// Comparable sales
    pub recent_sales: Option<String>,
    /// Price direction
    pub trend: Option<String>,
    /// Typical time to sell
    pub days_on_market: Option<String>,
}

/// Outcome the negotiator plans for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCase {
    /// Everything goes our way
    BestCase,
    /// Most likely result
    Realistic,
    /// Price at which to stop
    WalkAway,
}

impl OutcomeCase {
    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Self::BestCase => "Best Case",
            Self::Realistic => "Realistic",
            Self::WalkAway => "Walk Away",
        }
    }
}

/// One planned outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeScenario {
    /// Which outcome
    pub case: OutcomeCase,
    /// Target price
    pub price: Option<String>,
    /// Strategy, or the reason for walking away
    pub rationale: Option<String>,
    /// Probability, or the impact of walking away
    pub outlook: Option<String>,
}

/// A point with an optional explanation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoint {
    /// The point itself
    pub point: String,
    /// Why it matters
    pub explanation: Option<String>,
}

/// A negotiation step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// What happens
    pub action: String,
    /// When it happens
    pub timing: Option<String>,
}

/// The opening offer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningMove {
    /// Strategy narrative
    pub message: Option<String>,
    /// Offer amount
    pub amount: Option<String>,
    /// Why this amount
    pub reasoning: Option<String>,
}

// ============================================================================
// Legal
// ============================================================================

/// Closing process overview
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalBrief {
    /// Where the transaction stands
    pub status: Option<ClosingStatus>,
    /// Paperwork the buyer must provide
    pub documents: Vec<RequiredDocument>,
    /// Purchase price, earnest money and down payment
    pub transaction: Vec<LabeledValue>,
    /// Contract milestones
    pub key_dates: Vec<LabeledValue>,
    /// Closing-cost line items
    pub closing_costs: Vec<LabeledValue>,
    /// Closing steps
    pub timeline: Vec<ClosingStep>,
    /// Key legal points
    pub key_points: Vec<KeyPoint>,
}

impl LegalBrief {
    /// True when no section has content
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.documents.is_empty()
            && self.transaction.is_empty()
            && self.key_dates.is_empty()
            && self.closing_costs.is_empty()
            && self.timeline.is_empty()
            && self.key_points.is_empty()
    }
}

/// Where the transaction stands
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingStatus {
    /// Current phase name
    pub current_phase: Option<String>,
    /// Target closing date
    pub expected_closing: Option<String>,
    /// What happens next
    pub next_action: Option<String>,
}

/// Progress of a document or closing step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progress {
    /// Done, possibly with a date
    Completed {
        /// Completion date
        on: Option<String>,
    },
    /// Outstanding, possibly with a due date
    Pending {
        /// Due date
        due: Option<String>,
    },
    /// No status given
    Unspecified,
}

/// A document the buyer must provide
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    /// Document name
    pub name: String,
    /// Whether it has been provided
    pub progress: Progress,
}

/// A closing timeline step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingStep {
    /// What happens
    pub action: String,
    /// Whether it is done
    pub progress: Progress,
}

/// A label and its value, in display order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    /// Display label
    pub label: String,
    /// Value, as written
    pub value: String,
}

impl LabeledValue {
    /// Build a pair
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Lifestyle
// ============================================================================

/// Neighborhood character
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleBrief {
    /// Amenities near the property
    pub amenities: Vec<Amenity>,
    /// Local gems
    pub highlights: Vec<KeyPoint>,
    /// Insider tips
    pub tips: Vec<LocalTip>,
}

impl LifestyleBrief {
    /// True when no section has content
    pub fn is_empty(&self) -> bool {
        self.amenities.is_empty() && self.highlights.is_empty() && self.tips.is_empty()
    }
}

/// Something useful near the property
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenity {
    /// Amenity name
    pub name: String,
    /// How far away
    pub distance: Option<String>,
    /// Anything else worth saying
    pub details: Option<String>,
}

/// An insider tip
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTip {
    /// Leading emoji
    pub emoji: Option<String>,
    /// The tip
    pub tip: String,
}

// ============================================================================
// Location
// ============================================================================

/// Commute and distance analysis
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBrief {
    /// Typical commute
    pub average_commute: Option<String>,
    /// Distances with human-cased labels
    pub key_distances: Vec<LabeledValue>,
    /// Ways to get around
    pub transport_options: Vec<String>,
}

impl LocationBrief {
    /// True when no section has content
    pub fn is_empty(&self) -> bool {
        self.average_commute.is_none()
            && self.key_distances.is_empty()
            && self.transport_options.is_empty()
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Sections of the team lead's summary, in display order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryTopic {
    /// Property specialist
    Residential,
    /// Negotiator
    Negotiation,
    /// Legal advisor
    Legal,
    /// Lifestyle consultant
    Lifestyle,
    /// Location expert
    Location,
}

impl SummaryTopic {
    /// Display order
    pub const ORDER: [Self; 5] = [
        Self::Residential,
        Self::Negotiation,
        Self::Legal,
        Self::Lifestyle,
        Self::Location,
    ];

    /// Heading shown above the section
    pub fn title(self) -> &'static str {
        match self {
            Self::Residential => "Final Property Recommendations",
            Self::Negotiation => "Negotiation Strategy",
            Self::Legal => "Closing Process Overview",
            Self::Lifestyle => "Lifestyle Insights",
            Self::Location => "Location Analysis",
        }
    }
}

/// Turn a snake_case key into a title-cased label
///
/// `grocery_store` becomes `Grocery Store`.
pub fn human_case(key: &str) -> String {
    key.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
