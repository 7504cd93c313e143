//! Output Dispatcher
//!
//! Persona-keyed extraction rules that turn an agent's structured payload into
//! ordered [`ContentBlock`]s. The switch is closed: five specialists plus the
//! team lead. Any other agent yields no blocks.
//!
//! Dispatch is pure and total. It never fails and identical input always
//! yields identical output.

use serde_json::Value;

use crate::blocks::{
    human_case, Amenity, ClosingStatus, ClosingStep, ContentBlock, KeyPoint, LabeledValue,
    LegalBrief, LifestyleBrief, LocalTip, LocationBrief, MarketSnapshot, Milestone,
    NegotiationBrief, OpeningMove, OutcomeCase, OutcomeScenario, Progress, Property,
    PropertyListing, ListingStage, RequiredDocument, SummaryTopic,
};
use crate::payload::{
    self, ClosingSummary, DocumentEntry, LegalPayload, LifestylePayload, LocationPayload,
    NegotiationPayload, PointEntry, PropertyEntry, ResidentialPayload, ScenarioEntry, StepEntry,
    SummaryBundle, SummaryStage, TopPickEntry,
};
use crate::persona::{Persona, Specialty};

/// Build the blocks for an agent's payload
///
/// Unknown agents yield an empty list.
pub fn dispatch(agent_name: &str, payload: &Value) -> Vec<ContentBlock> {
    match Persona::from_name(agent_name) {
        Some(persona) => dispatch_persona(persona, payload),
        None => Vec::new(),
    }
}

/// Top-level keys every persona may send, in precedence order
pub const STAGE_KEYS: [&str; 5] = [
    "initial_search",
    "analysis",
    "strategy",
    "final_recommendations",
    "summary",
];

/// Build the blocks for a known persona
///
/// The specialist rule runs first and a closing `summary` follows it. The
/// team lead's summary leads, ahead of the section bundle.
pub fn dispatch_persona(persona: Persona, payload: &Value) -> Vec<ContentBlock> {
    let specialty = persona.specialty();
    let specialist = dispatch_specialty(specialty, payload);
    let closing = payload::read::<SummaryStage>(payload)
        .and_then(|stage| stage.summary)
        .map(|summary| closing_summary_blocks(&summary))
        .unwrap_or_default();

    if specialty == Specialty::Aggregator {
        closing.into_iter().chain(specialist).collect()
    } else {
        specialist.into_iter().chain(closing).collect()
    }
}

/// Whether the payload carries any key this persona's rules read
///
/// Only a payload with none of them is shown raw; a known key with nothing
/// usable under it yields no blocks instead.
pub fn has_known_key(persona: Persona, payload: &Value) -> bool {
    let Value::Object(map) = payload else {
        return false;
    };
    STAGE_KEYS
        .iter()
        .chain(specialty_keys(persona.specialty()))
        .any(|key| map.contains_key(*key))
}

fn specialty_keys(specialty: Specialty) -> &'static [&'static str] {
    match specialty {
        Specialty::Property => &["initial_search", "final_recommendations"],
        Specialty::Negotiation => &[
            "market_analysis",
            "expected_outcome",
            "analysis",
            "timeline",
            "strategy",
        ],
        Specialty::Legal => &[
            "status",
            "documents_needed",
            "transaction",
            "key_dates",
            "closing_costs",
            "timeline",
            "analysis",
            "final_recommendations",
        ],
        Specialty::Lifestyle => &["nearby_amenities", "neighborhood_gems", "local_tips"],
        Specialty::Location => &["average_commute_time", "key_distances", "transport_options"],
        Specialty::Aggregator => &[
            "residential_summary",
            "negotiation_summary",
            "legal_summary",
            "lifestyle_summary",
            "location_summary",
        ],
    }
}

fn dispatch_specialty(specialty: Specialty, payload: &Value) -> Vec<ContentBlock> {
    match specialty {
        Specialty::Property => payload::read(payload)
            .map(|p| residential_blocks(&p))
            .unwrap_or_default(),
        Specialty::Negotiation => payload::read(payload)
            .map(|p| negotiation_brief(&p))
            .filter(|brief| !brief.is_empty())
            .map(ContentBlock::Negotiation)
            .into_iter()
            .collect(),
        Specialty::Legal => payload::read(payload)
            .map(|p| legal_brief(&p))
            .filter(|brief| !brief.is_empty())
            .map(ContentBlock::Legal)
            .into_iter()
            .collect(),
        Specialty::Lifestyle => payload::read(payload)
            .map(|p| lifestyle_brief(&p))
            .filter(|brief| !brief.is_empty())
            .map(ContentBlock::Lifestyle)
            .into_iter()
            .collect(),
        Specialty::Location => payload::read(payload)
            .map(|p| location_brief(&p))
            .filter(|brief| !brief.is_empty())
            .map(ContentBlock::Location)
            .into_iter()
            .collect(),
        Specialty::Aggregator => payload::read(payload)
            .map(|bundle| summary_blocks(&bundle))
            .unwrap_or_default(),
    }
}

// ============================================================================
// Property specialist
// ============================================================================

fn residential_blocks(payload: &ResidentialPayload) -> Vec<ContentBlock> {
    let stages = [
        (ListingStage::InitialSearch, payload.initial_search.as_ref()),
        (
            ListingStage::FinalRecommendations,
            payload.final_recommendations.as_ref(),
        ),
    ];

    stages
        .into_iter()
        .filter_map(|(stage, entries)| {
            let entries = entries?;
            let source = if entries.properties.is_empty() {
                &entries.top_picks
            } else {
                &entries.properties
            };
            let properties: Vec<Property> = source
                .iter()
                .map(property)
                .filter(|p| !p.is_empty())
                .collect();
            (!properties.is_empty()).then(|| {
                ContentBlock::PropertyListing(PropertyListing { stage, properties })
            })
        })
        .collect()
}

fn property(entry: &PropertyEntry) -> Property {
    let features = if entry.features.is_empty() {
        entry.key_features.clone()
    } else {
        entry.features.clone()
    };
    Property {
        name: entry.name.clone(),
        price: entry.price.clone(),
        highlight: entry.highlight.clone().or_else(|| entry.description.clone()),
        availability: entry.availability.clone(),
        location: entry.location.clone(),
        features,
    }
}

// ============================================================================
// Negotiation specialist
// ============================================================================

fn negotiation_brief(payload: &NegotiationPayload) -> NegotiationBrief {
    let market = payload
        .market_analysis
        .as_ref()
        .map(|m| MarketSnapshot {
            summary: m.summary.clone(),
            recent_sales: m.recent_sales.clone(),
            trend: m.trend.clone(),
            days_on_market: m.days_on_market.clone(),
        })
        .filter(|m| *m != MarketSnapshot::default());

    let scenarios = payload
        .expected_outcome
        .as_ref()
        .map(|outcome| {
            [
                (OutcomeCase::BestCase, outcome.best_case.as_ref()),
                (OutcomeCase::Realistic, outcome.realistic.as_ref()),
                (OutcomeCase::WalkAway, outcome.walkaway.as_ref()),
            ]
            .into_iter()
            .filter_map(|(case, entry)| entry.and_then(|e| scenario(case, e)))
            .collect()
        })
        .unwrap_or_default();

    let leverage_points = payload
        .analysis
        .as_ref()
        .map(|a| key_points(&a.leverage_points))
        .unwrap_or_default();

    let timeline = payload
        .timeline
        .iter()
        .filter_map(|step| match step {
            StepEntry::Plain(text) => non_blank(text).map(|action| Milestone {
                action,
                timing: None,
            }),
            StepEntry::Detailed(detail) => detail.action.clone().map(|action| Milestone {
                action,
                timing: detail.timing.clone(),
            }),
        })
        .collect();

    let opening = payload
        .strategy
        .as_ref()
        .map(|s| OpeningMove {
            message: s.message.clone(),
            amount: s.initial_offer.as_ref().and_then(|o| o.amount.clone()),
            reasoning: s.initial_offer.as_ref().and_then(|o| o.reasoning.clone()),
        })
        .filter(|o| *o != OpeningMove::default());

    NegotiationBrief {
        market,
        scenarios,
        leverage_points,
        timeline,
        opening,
    }
}

fn scenario(case: OutcomeCase, entry: &ScenarioEntry) -> Option<OutcomeScenario> {
    let scenario = OutcomeScenario {
        case,
        price: entry.price.clone(),
        rationale: entry.strategy.clone().or_else(|| entry.reason.clone()),
        outlook: entry.probability.clone().or_else(|| entry.impact.clone()),
    };
    let empty = scenario.price.is_none() && scenario.rationale.is_none() && scenario.outlook.is_none();
    (!empty).then_some(scenario)
}

fn key_points(entries: &[PointEntry]) -> Vec<KeyPoint> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            PointEntry::Plain(text) => non_blank(text).map(|point| KeyPoint {
                point,
                explanation: None,
            }),
            PointEntry::Detailed(detail) => detail.point.clone().map(|point| KeyPoint {
                point,
                explanation: detail.explanation.clone(),
            }),
        })
        .collect()
}

// ============================================================================
// Legal specialist
// ============================================================================

fn legal_brief(payload: &LegalPayload) -> LegalBrief {
    let status = payload
        .status
        .as_ref()
        .map(|s| ClosingStatus {
            current_phase: s.current_phase.clone(),
            expected_closing: s.expected_closing_date.clone(),
            next_action: s.next_action.clone(),
        })
        .filter(|s| *s != ClosingStatus::default());

    let wrap_up = payload.final_recommendations.as_ref();

    let documents = payload
        .documents_needed
        .iter()
        .chain(wrap_up.into_iter().flat_map(|w| w.documents_needed.iter()))
        .filter_map(document)
        .collect();

    let transaction = payload
        .transaction
        .as_ref()
        .map(|t| {
            labeled(&[
                ("Purchase Price", &t.purchase_price),
                ("Earnest Money", &t.earnest_money),
                ("Down Payment", &t.down_payment),
            ])
        })
        .unwrap_or_default();

    let key_dates = payload
        .key_dates
        .as_ref()
        .map(|d| {
            labeled(&[
                ("Inspection Period", &d.inspection_period),
                ("Title Review", &d.title_review),
                ("Final Walkthrough", &d.final_walkthrough),
            ])
        })
        .unwrap_or_default();

    let closing_costs = payload
        .closing_costs
        .iter()
        .filter_map(|cost| match (&cost.name, &cost.amount) {
            (Some(name), Some(amount)) => Some(LabeledValue::new(name, amount)),
            (Some(name), None) => Some(LabeledValue::new(name, "")),
            _ => None,
        })
        .collect();

    let timeline = payload
        .timeline
        .iter()
        .filter_map(closing_step)
        .chain(
            wrap_up
                .into_iter()
                .flat_map(|w| w.legal_timeline.iter())
                .map(|action| ClosingStep {
                    action: action.clone(),
                    progress: Progress::Unspecified,
                }),
        )
        .collect();

    let key_points = payload
        .analysis
        .as_ref()
        .map(|a| key_points(&a.points))
        .unwrap_or_default();

    LegalBrief {
        status,
        documents,
        transaction,
        key_dates,
        closing_costs,
        timeline,
        key_points,
    }
}

fn document(entry: &DocumentEntry) -> Option<RequiredDocument> {
    match entry {
        DocumentEntry::Plain(text) => non_blank(text).map(|name| RequiredDocument {
            name,
            progress: Progress::Unspecified,
        }),
        DocumentEntry::Detailed(detail) => {
            let name = detail.name.clone()?;
            let status = detail.status.as_deref().map(str::to_ascii_lowercase);
            let progress = match status.as_deref() {
                Some("completed" | "complete" | "done") => Progress::Completed {
                    on: detail.completed_date.clone(),
                },
                Some("pending") => Progress::Pending {
                    due: detail.deadline.clone(),
                },
                _ if detail.completed_date.is_some() => Progress::Completed {
                    on: detail.completed_date.clone(),
                },
                _ if detail.deadline.is_some() => Progress::Pending {
                    due: detail.deadline.clone(),
                },
                _ => Progress::Unspecified,
            };
            Some(RequiredDocument { name, progress })
        }
    }
}

fn closing_step(entry: &StepEntry) -> Option<ClosingStep> {
    match entry {
        StepEntry::Plain(text) => non_blank(text).map(|action| ClosingStep {
            action,
            progress: Progress::Unspecified,
        }),
        StepEntry::Detailed(detail) => {
            let action = detail.action.clone()?;
            let progress = match detail.completed {
                Some(true) => Progress::Completed {
                    on: detail.completion_date.clone(),
                },
                Some(false) => Progress::Pending {
                    due: detail.due_date.clone().or_else(|| detail.timing.clone()),
                },
                None if detail.completion_date.is_some() => Progress::Completed {
                    on: detail.completion_date.clone(),
                },
                None if detail.due_date.is_some() => Progress::Pending {
                    due: detail.due_date.clone(),
                },
                None => Progress::Unspecified,
            };
            Some(ClosingStep { action, progress })
        }
    }
}

fn labeled(pairs: &[(&str, &Option<String>)]) -> Vec<LabeledValue> {
    pairs
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| LabeledValue::new(*label, v)))
        .collect()
}

// ============================================================================
// Lifestyle specialist
// ============================================================================

fn lifestyle_brief(payload: &LifestylePayload) -> LifestyleBrief {
    let amenities = payload
        .nearby_amenities
        .iter()
        .filter_map(|a| {
            a.amenity.clone().map(|name| Amenity {
                name,
                distance: a.distance.clone(),
                details: a.details.clone(),
            })
        })
        .collect();

    let highlights = payload
        .neighborhood_gems
        .iter()
        .filter_map(|g| {
            g.name.clone().map(|point| KeyPoint {
                point,
                explanation: g.description.clone(),
            })
        })
        .collect();

    let tips = payload
        .local_tips
        .iter()
        .filter_map(|t| {
            t.tip.clone().map(|tip| LocalTip {
                emoji: t.emoji.clone(),
                tip,
            })
        })
        .collect();

    LifestyleBrief {
        amenities,
        highlights,
        tips,
    }
}

// ============================================================================
// Location specialist
// ============================================================================

fn location_brief(payload: &LocationPayload) -> LocationBrief {
    LocationBrief {
        average_commute: payload.average_commute_time.clone(),
        key_distances: payload
            .key_distances
            .iter()
            .map(|(key, value)| LabeledValue::new(human_case(key), value))
            .collect(),
        transport_options: payload.transport_options.clone(),
    }
}

// ============================================================================
// Team lead
// ============================================================================

/// Header plus specialist blocks for each section that has content
///
/// A section whose specialist rule yields nothing gets no header either.
fn summary_blocks(bundle: &SummaryBundle) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    for topic in SummaryTopic::ORDER {
        let (section, specialty) = match topic {
            SummaryTopic::Residential => (&bundle.residential_summary, Specialty::Property),
            SummaryTopic::Negotiation => (&bundle.negotiation_summary, Specialty::Negotiation),
            SummaryTopic::Legal => (&bundle.legal_summary, Specialty::Legal),
            SummaryTopic::Lifestyle => (&bundle.lifestyle_summary, Specialty::Lifestyle),
            SummaryTopic::Location => (&bundle.location_summary, Specialty::Location),
        };
        let Some(section) = section else { continue };

        let section_blocks = dispatch_specialty(specialty, section);
        if section_blocks.is_empty() {
            continue;
        }
        blocks.push(ContentBlock::summary_header(topic));
        blocks.extend(section_blocks);
    }
    blocks
}

// ============================================================================
// Closing summary
// ============================================================================

/// Narrative, recommended properties, then the action plan
fn closing_summary_blocks(summary: &ClosingSummary) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();

    if let Some(message) = summary.message.as_deref().and_then(non_blank) {
        blocks.push(ContentBlock::Text(message));
    }

    let properties: Vec<Property> = summary
        .top_properties
        .iter()
        .map(top_pick)
        .filter(|p| !p.is_empty())
        .collect();
    if !properties.is_empty() {
        blocks.push(ContentBlock::PropertyListing(PropertyListing {
            stage: ListingStage::FinalRecommendations,
            properties,
        }));
    }

    let mut plan: Vec<String> = summary
        .action_plan
        .iter()
        .filter_map(|step| non_blank(step))
        .map(|step| format!("• {step}"))
        .collect();
    if let Some(timeline) = summary.timeline.as_deref().and_then(non_blank) {
        plan.push(format!("Timeline: {timeline}"));
    }
    if !plan.is_empty() {
        blocks.push(ContentBlock::Text(plan.join("\n")));
    }
    blocks
}

fn top_pick(entry: &TopPickEntry) -> Property {
    Property {
        name: entry.name.clone(),
        price: entry.price.clone(),
        highlight: entry.overall_score.clone(),
        features: entry.key_advantages.clone(),
        ..Property::default()
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
