//! Raw Agent Payloads
//!
//! Wire shapes of the structured `output` object each persona may attach to a
//! turn. Every field is optional and read leniently (see [`lenient`]); the
//! dispatcher turns these raw shapes into typed [`ContentBlock`]s.
//!
//! Keys are the backend's snake_case names. Where the backend has used more
//! than one spelling for the same thing, the alternatives are accepted as
//! aliases.
//!
//! [`ContentBlock`]: crate::blocks::ContentBlock

pub mod lenient;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Read a payload shape out of a JSON object
///
/// Anything that is not an object yields `None`. Field leniency means an
/// object always reads successfully.
pub fn read<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    if !payload.is_object() {
        return None;
    }
    T::deserialize(payload).ok()
}

/// True for `null`, `{}`, `[]` and blank strings
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// ============================================================================
// Shared entries
// ============================================================================

/// A point that is either a bare sentence or a point with an explanation
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PointEntry {
    /// Bare sentence
    Plain(String),
    /// Point plus supporting explanation
    Detailed(PointDetail),
}

/// Structured form of [`PointEntry`]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PointDetail {
    /// The point itself
    #[serde(deserialize_with = "lenient::text")]
    pub point: Option<String>,
    /// Why it matters
    #[serde(deserialize_with = "lenient::text")]
    pub explanation: Option<String>,
}

/// A timeline step, bare or structured
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum StepEntry {
    /// Bare description
    Plain(String),
    /// Structured step
    Detailed(StepDetail),
}

/// Structured form of [`StepEntry`]
///
/// Negotiation steps use `timing`; closing steps use the completion fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StepDetail {
    /// What happens
    #[serde(deserialize_with = "lenient::text")]
    pub action: Option<String>,
    /// When it happens
    #[serde(deserialize_with = "lenient::text")]
    pub timing: Option<String>,
    /// Whether the step is done
    #[serde(deserialize_with = "lenient::flag")]
    pub completed: Option<bool>,
    /// When the step was done
    #[serde(deserialize_with = "lenient::text")]
    pub completion_date: Option<String>,
    /// When the step is due
    #[serde(deserialize_with = "lenient::text")]
    pub due_date: Option<String>,
}

// ============================================================================
// Residential (property specialist)
// ============================================================================

/// Property specialist output
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResidentialPayload {
    /// First pass over the market
    #[serde(deserialize_with = "lenient::optional")]
    pub initial_search: Option<PropertyStage>,
    /// Shortlist after the team has weighed in
    #[serde(deserialize_with = "lenient::optional")]
    pub final_recommendations: Option<PropertyStage>,
}

/// One stage of the property search
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyStage {
    /// Stage narrative
    #[serde(deserialize_with = "lenient::text")]
    pub message: Option<String>,
    /// Properties found at this stage
    #[serde(deserialize_with = "lenient::list")]
    pub properties: Vec<PropertyEntry>,
    /// Alternative key for the final shortlist
    #[serde(deserialize_with = "lenient::list")]
    pub top_picks: Vec<PropertyEntry>,
}

/// A single property as the backend describes it
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyEntry {
    /// Listing name or address
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// Asking price, as written
    #[serde(deserialize_with = "lenient::text")]
    pub price: Option<String>,
    /// One-line selling point
    #[serde(deserialize_with = "lenient::text")]
    pub highlight: Option<String>,
    /// Longer description, used when there is no highlight
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    /// When it can be viewed or moved into
    #[serde(deserialize_with = "lenient::text")]
    pub availability: Option<String>,
    /// Neighborhood or address
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    /// Feature tags
    #[serde(deserialize_with = "lenient::text_list")]
    pub features: Vec<String>,
    /// Feature tags under the final shortlist's key
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_features: Vec<String>,
}

// ============================================================================
// Negotiation
// ============================================================================

/// Negotiation specialist output
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NegotiationPayload {
    /// Market conditions
    #[serde(deserialize_with = "lenient::optional")]
    pub market_analysis: Option<MarketAnalysis>,
    /// Planned outcomes
    #[serde(deserialize_with = "lenient::optional")]
    pub expected_outcome: Option<ExpectedOutcome>,
    /// Leverage analysis
    #[serde(deserialize_with = "lenient::optional")]
    pub analysis: Option<NegotiationAnalysis>,
    /// Negotiation steps in order
    #[serde(deserialize_with = "lenient::list")]
    pub timeline: Vec<StepEntry>,
    /// Opening move
    #[serde(deserialize_with = "lenient::optional")]
    pub strategy: Option<OfferStrategy>,
}

/// Market conditions around the target property
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarketAnalysis {
    /// Headline read of the market
    #[serde(deserialize_with = "lenient::text")]
    pub summary: Option<String>,
    /// Comparable sales
    #[serde(deserialize_with = "lenient::text")]
    pub recent_sales: Option<String>,
    /// Price direction
    #[serde(deserialize_with = "lenient::text")]
    pub trend: Option<String>,
    /// Typical time to sell
    #[serde(deserialize_with = "lenient::text")]
    pub days_on_market: Option<String>,
}

/// The three outcomes the negotiator plans for
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExpectedOutcome {
    /// Everything goes our way
    #[serde(deserialize_with = "lenient::optional")]
    pub best_case: Option<ScenarioEntry>,
    /// Most likely result
    #[serde(deserialize_with = "lenient::optional")]
    pub realistic: Option<ScenarioEntry>,
    /// Price at which to stop
    #[serde(alias = "walk_away", deserialize_with = "lenient::optional")]
    pub walkaway: Option<ScenarioEntry>,
}

/// One expected outcome
///
/// Best and realistic cases carry `strategy` and `probability`; the walk-away
/// case carries `reason` and `impact`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioEntry {
    /// Target price
    #[serde(deserialize_with = "lenient::text")]
    pub price: Option<String>,
    /// How to get there
    #[serde(deserialize_with = "lenient::text")]
    pub strategy: Option<String>,
    /// Why to walk away
    #[serde(deserialize_with = "lenient::text")]
    pub reason: Option<String>,
    /// Likelihood
    #[serde(deserialize_with = "lenient::text")]
    pub probability: Option<String>,
    /// Consequence of walking away
    #[serde(deserialize_with = "lenient::text")]
    pub impact: Option<String>,
}

/// Negotiation analysis
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NegotiationAnalysis {
    /// Buyer's leverage
    #[serde(deserialize_with = "lenient::list")]
    pub leverage_points: Vec<PointEntry>,
}

/// Opening move
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OfferStrategy {
    /// Strategy narrative
    #[serde(deserialize_with = "lenient::text")]
    pub message: Option<String>,
    /// First offer
    #[serde(deserialize_with = "lenient::optional")]
    pub initial_offer: Option<InitialOffer>,
}

/// First offer on the table
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct InitialOffer {
    /// Offer amount
    #[serde(deserialize_with = "lenient::text")]
    pub amount: Option<String>,
    /// Why this amount
    #[serde(deserialize_with = "lenient::text")]
    pub reasoning: Option<String>,
}

// ============================================================================
// Legal
// ============================================================================

/// Legal advisor output
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegalPayload {
    /// Where the transaction stands
    #[serde(deserialize_with = "lenient::optional")]
    pub status: Option<LegalStatus>,
    /// Paperwork the buyer must provide
    #[serde(deserialize_with = "lenient::list")]
    pub documents_needed: Vec<DocumentEntry>,
    /// Headline figures
    #[serde(deserialize_with = "lenient::optional")]
    pub transaction: Option<TransactionFigures>,
    /// Contract milestones
    #[serde(deserialize_with = "lenient::optional")]
    pub key_dates: Option<KeyDates>,
    /// Closing-cost line items
    #[serde(deserialize_with = "lenient::list")]
    pub closing_costs: Vec<CostEntry>,
    /// Closing steps
    #[serde(deserialize_with = "lenient::list")]
    pub timeline: Vec<StepEntry>,
    /// Key legal points
    #[serde(deserialize_with = "lenient::optional")]
    pub analysis: Option<LegalAnalysis>,
    /// End-of-workflow wrap-up
    #[serde(deserialize_with = "lenient::optional")]
    pub final_recommendations: Option<LegalRecommendations>,
}

/// Where the transaction stands
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegalStatus {
    /// Current phase name
    #[serde(deserialize_with = "lenient::text")]
    pub current_phase: Option<String>,
    /// Target closing date
    #[serde(deserialize_with = "lenient::text")]
    pub expected_closing_date: Option<String>,
    /// What happens next
    #[serde(deserialize_with = "lenient::text")]
    pub next_action: Option<String>,
}

/// A required document, bare name or with status
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum DocumentEntry {
    /// Just the document name
    Plain(String),
    /// Document with status and dates
    Detailed(DocumentDetail),
}

/// Structured form of [`DocumentEntry`]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocumentDetail {
    /// Document name
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// `completed` or `pending`
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    /// Due date while pending
    #[serde(deserialize_with = "lenient::text")]
    pub deadline: Option<String>,
    /// Date it was provided
    #[serde(deserialize_with = "lenient::text")]
    pub completed_date: Option<String>,
}

/// Headline transaction figures
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionFigures {
    /// Agreed price
    #[serde(deserialize_with = "lenient::text")]
    pub purchase_price: Option<String>,
    /// Deposit held in escrow
    #[serde(deserialize_with = "lenient::text")]
    pub earnest_money: Option<String>,
    /// Buyer's down payment
    #[serde(deserialize_with = "lenient::text")]
    pub down_payment: Option<String>,
}

/// Contract milestones
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyDates {
    /// End of the inspection contingency
    #[serde(deserialize_with = "lenient::text")]
    pub inspection_period: Option<String>,
    /// Title search deadline
    #[serde(deserialize_with = "lenient::text")]
    pub title_review: Option<String>,
    /// Walkthrough before closing
    #[serde(deserialize_with = "lenient::text")]
    pub final_walkthrough: Option<String>,
}

/// One closing-cost line item
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CostEntry {
    /// What the cost is for
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// Amount, as written
    #[serde(deserialize_with = "lenient::text")]
    pub amount: Option<String>,
}

/// Key legal points
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegalAnalysis {
    /// Points worth knowing
    #[serde(deserialize_with = "lenient::list")]
    pub points: Vec<PointEntry>,
}

/// Legal wrap-up at the end of the workflow
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LegalRecommendations {
    /// Outstanding paperwork
    #[serde(deserialize_with = "lenient::list")]
    pub documents_needed: Vec<DocumentEntry>,
    /// Remaining steps, as sentences
    #[serde(deserialize_with = "lenient::text_list")]
    pub legal_timeline: Vec<String>,
}

// ============================================================================
// Lifestyle
// ============================================================================

/// Lifestyle consultant output
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LifestylePayload {
    /// Amenities near the property
    #[serde(deserialize_with = "lenient::list")]
    pub nearby_amenities: Vec<AmenityEntry>,
    /// Local favourites
    #[serde(deserialize_with = "lenient::list")]
    pub neighborhood_gems: Vec<GemEntry>,
    /// Insider tips
    #[serde(deserialize_with = "lenient::list")]
    pub local_tips: Vec<TipEntry>,
}

/// Something useful near the property
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AmenityEntry {
    /// Amenity name
    #[serde(alias = "name", deserialize_with = "lenient::text")]
    pub amenity: Option<String>,
    /// How far away
    #[serde(deserialize_with = "lenient::text")]
    pub distance: Option<String>,
    /// Anything else worth saying
    #[serde(deserialize_with = "lenient::text")]
    pub details: Option<String>,
}

/// A local favourite
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GemEntry {
    /// Place name
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// Why locals like it
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
}

/// An insider tip
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TipEntry {
    /// Leading emoji
    #[serde(deserialize_with = "lenient::text")]
    pub emoji: Option<String>,
    /// The tip
    #[serde(deserialize_with = "lenient::text")]
    pub tip: Option<String>,
}

// ============================================================================
// Location
// ============================================================================

/// Location expert output
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationPayload {
    /// Typical commute
    #[serde(deserialize_with = "lenient::text")]
    pub average_commute_time: Option<String>,
    /// Named distances, sorted by key
    #[serde(deserialize_with = "lenient::text_map")]
    pub key_distances: Vec<(String, String)>,
    /// Ways to get around
    #[serde(deserialize_with = "lenient::text_list")]
    pub transport_options: Vec<String>,
}

// ============================================================================
// Aggregator
// ============================================================================

/// Team lead's bundle of specialist summaries
///
/// Sections are kept raw; each is read with the matching specialist's shape.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummaryBundle {
    /// Property specialist's section
    pub residential_summary: Option<Value>,
    /// Negotiator's section
    pub negotiation_summary: Option<Value>,
    /// Legal advisor's section
    pub legal_summary: Option<Value>,
    /// Lifestyle consultant's section
    pub lifestyle_summary: Option<Value>,
    /// Location expert's section
    pub location_summary: Option<Value>,
}

// ============================================================================
// Closing summary
// ============================================================================

/// Payload carrying a closing summary under `summary`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummaryStage {
    /// The summary itself
    #[serde(deserialize_with = "lenient::optional")]
    pub summary: Option<ClosingSummary>,
}

/// Final recommendation wrapping up a consultation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClosingSummary {
    /// Summary narrative
    #[serde(deserialize_with = "lenient::text")]
    pub message: Option<String>,
    /// Recommended properties, best first
    #[serde(alias = "top_picks", deserialize_with = "lenient::list")]
    pub top_properties: Vec<TopPickEntry>,
    /// Recommended next steps
    #[serde(deserialize_with = "lenient::text_list")]
    pub action_plan: Vec<String>,
    /// Rough schedule for viewing, offer and closing
    #[serde(deserialize_with = "lenient::text")]
    pub timeline: Option<String>,
}

/// One recommended property in a closing summary
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopPickEntry {
    /// Listing name
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// Price, when given
    #[serde(deserialize_with = "lenient::text")]
    pub price: Option<String>,
    /// Score out of ten, with explanation
    #[serde(deserialize_with = "lenient::text")]
    pub overall_score: Option<String>,
    /// Main selling points
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_advantages: Vec<String>,
}
