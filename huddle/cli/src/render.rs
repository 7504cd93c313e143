//! Plain-text rendering of timeline updates
//!
//! Agent messages go to stdout; transient chatter (placeholders, status)
//! goes to stderr so piped output holds only the conversation.

use huddle_core::blocks::{
    Amenity, ClosingStep, KeyPoint, LabeledValue, LegalBrief, LifestyleBrief, ListingStage,
    LocationBrief, NegotiationBrief, Progress, PropertyListing, RequiredDocument,
};
use huddle_core::{
    ContentBlock, DisplayMessage, MessageOrigin, MessageTag, PlaybackEvent, TimelineUpdate,
};

/// Where a rendered line belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Conversation content
    Stdout(String),
    /// Progress chatter
    Stderr(String),
}

/// Turn one update into output, if it shows anything
pub fn render_update(update: &TimelineUpdate) -> Option<Output> {
    match &update.event {
        PlaybackEvent::PlaceholderShown { message } => Some(Output::Stderr(format!(
            "{} {}",
            message.emoji.as_deref().unwrap_or("👤"),
            message.text
        ))),
        PlaybackEvent::HandoffMarked { to } => {
            Some(Output::Stdout(format!("   ↪ handing off to {to}\n")))
        }
        PlaybackEvent::BlockRevealed { .. } | PlaybackEvent::FallbackShown { .. } => update
            .appended
            .as_ref()
            .map(|message| Output::Stdout(render_message(message))),
        _ => None,
    }
}

/// Render an agent or user message
pub fn render_message(message: &DisplayMessage) -> String {
    let mut out = String::new();

    if message.origin == MessageOrigin::User {
        out.push_str(&format!("> {}\n", message.text));
        return out;
    }

    let speaker = format!(
        "{} {}",
        message.emoji.as_deref().unwrap_or("👤"),
        message.agent_name.as_deref().unwrap_or("Advisor")
    );
    let role = message
        .role
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default();

    if !message.text.is_empty() || message.blocks.is_empty() {
        let marker = if message.tag == MessageTag::Error { "⚠ " } else { "" };
        out.push_str(&format!("{speaker}{role}: {marker}{}\n", message.text));
    } else {
        out.push_str(&format!("{speaker}{role}:\n"));
    }

    for block in &message.blocks {
        for line in render_block(block) {
            out.push_str("   ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Render a content block as indented lines
pub fn render_block(block: &ContentBlock) -> Vec<String> {
    match block {
        ContentBlock::PropertyListing(listing) => render_listing(listing),
        ContentBlock::Negotiation(brief) => render_negotiation(brief),
        ContentBlock::Legal(brief) => render_legal(brief),
        ContentBlock::Lifestyle(brief) => render_lifestyle(brief),
        ContentBlock::Location(brief) => render_location(brief),
        ContentBlock::SummarySection { title, .. } => {
            vec![format!("══ {title} ══")]
        }
        ContentBlock::Text(text) => text.lines().map(str::to_string).collect(),
    }
}

fn render_listing(listing: &PropertyListing) -> Vec<String> {
    let heading = match listing.stage {
        ListingStage::InitialSearch => "🔍 Initial search",
        ListingStage::FinalRecommendations => "⭐ Final recommendations",
    };
    let mut lines = vec![heading.to_string()];

    for property in &listing.properties {
        let title = [property.name.as_deref(), property.price.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ");
        lines.push(format!("• {}", if title.is_empty() { "Property" } else { title.as_str() }));
        for detail in [&property.highlight, &property.location, &property.availability]
            .into_iter()
            .flatten()
        {
            lines.push(format!("  {detail}"));
        }
        if !property.features.is_empty() {
            lines.push(format!("  ✓ {}", property.features.join(", ")));
        }
    }
    lines
}

fn render_negotiation(brief: &NegotiationBrief) -> Vec<String> {
    let mut lines = vec!["🤝 Negotiation".to_string()];

    if let Some(market) = &brief.market {
        push_field(&mut lines, "Market", market.summary.as_deref());
        push_field(&mut lines, "Trend", market.trend.as_deref());
        push_field(&mut lines, "Recent sales", market.recent_sales.as_deref());
        push_field(&mut lines, "Days on market", market.days_on_market.as_deref());
    }

    for scenario in &brief.scenarios {
        let mut line = format!("{}: {}", scenario.case.label(), scenario.price.as_deref().unwrap_or("-"));
        if let Some(rationale) = &scenario.rationale {
            line.push_str(&format!(" ({rationale})"));
        }
        if let Some(outlook) = &scenario.outlook {
            line.push_str(&format!(" [{outlook}]"));
        }
        lines.push(line);
    }

    push_points(&mut lines, "Leverage", &brief.leverage_points);

    for step in &brief.timeline {
        match &step.timing {
            Some(timing) => lines.push(format!("→ {} ({timing})", step.action)),
            None => lines.push(format!("→ {}", step.action)),
        }
    }

    if let Some(opening) = &brief.opening {
        push_field(&mut lines, "Strategy", opening.message.as_deref());
        push_field(&mut lines, "Opening offer", opening.amount.as_deref());
        push_field(&mut lines, "Why", opening.reasoning.as_deref());
    }
    lines
}

fn render_legal(brief: &LegalBrief) -> Vec<String> {
    let mut lines = vec!["⚖️ Closing".to_string()];

    if let Some(status) = &brief.status {
        push_field(&mut lines, "Phase", status.current_phase.as_deref());
        push_field(&mut lines, "Expected closing", status.expected_closing.as_deref());
        push_field(&mut lines, "Next", status.next_action.as_deref());
    }

    for RequiredDocument { name, progress } in &brief.documents {
        lines.push(format!("{} {name}{}", progress_mark(progress), progress_note(progress)));
    }

    for LabeledValue { label, value } in brief
        .transaction
        .iter()
        .chain(&brief.key_dates)
        .chain(&brief.closing_costs)
    {
        lines.push(format!("{label}: {value}"));
    }

    for ClosingStep { action, progress } in &brief.timeline {
        lines.push(format!("{} {action}{}", progress_mark(progress), progress_note(progress)));
    }

    push_points(&mut lines, "Note", &brief.key_points);
    lines
}

fn render_lifestyle(brief: &LifestyleBrief) -> Vec<String> {
    let mut lines = vec!["🌳 Lifestyle".to_string()];

    for Amenity { name, distance, details } in &brief.amenities {
        let mut line = format!("• {name}");
        if let Some(distance) = distance {
            line.push_str(&format!(" ({distance})"));
        }
        if let Some(details) = details {
            line.push_str(&format!(": {details}"));
        }
        lines.push(line);
    }

    push_points(&mut lines, "Gem", &brief.highlights);

    for tip in &brief.tips {
        lines.push(format!("{} {}", tip.emoji.as_deref().unwrap_or("💡"), tip.tip));
    }
    lines
}

fn render_location(brief: &LocationBrief) -> Vec<String> {
    let mut lines = vec!["📍 Location".to_string()];
    push_field(&mut lines, "Average commute", brief.average_commute.as_deref());
    for LabeledValue { label, value } in &brief.key_distances {
        lines.push(format!("{label}: {value}"));
    }
    if !brief.transport_options.is_empty() {
        lines.push(format!("Transport: {}", brief.transport_options.join(", ")));
    }
    lines
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("{label}: {value}"));
    }
}

fn push_points(lines: &mut Vec<String>, label: &str, points: &[KeyPoint]) {
    for KeyPoint { point, explanation } in points {
        match explanation {
            Some(explanation) => lines.push(format!("{label}: {point} ({explanation})")),
            None => lines.push(format!("{label}: {point}")),
        }
    }
}

fn progress_mark(progress: &Progress) -> &'static str {
    match progress {
        Progress::Completed { .. } => "✓",
        Progress::Pending { .. } => "○",
        Progress::Unspecified => "•",
    }
}

fn progress_note(progress: &Progress) -> String {
    match progress {
        Progress::Completed { on: Some(on) } => format!(" (done {on})"),
        Progress::Pending { due: Some(due) } => format!(" (due {due})"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::blocks::{Property, SummaryTopic};
    use huddle_core::{normalize, Timeline, Turn};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_listing_lines() {
        let block = ContentBlock::PropertyListing(PropertyListing {
            stage: ListingStage::InitialSearch,
            properties: vec![Property {
                name: Some("Oak Villa".into()),
                price: Some("$450k".into()),
                features: vec!["Pool".into(), "Garage".into()],
                ..Property::default()
            }],
        });
        assert_eq!(
            render_block(&block),
            vec![
                "🔍 Initial search".to_string(),
                "• Oak Villa · $450k".to_string(),
                "  ✓ Pool, Garage".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_header() {
        let block = ContentBlock::summary_header(SummaryTopic::Location);
        assert_eq!(render_block(&block), vec!["══ Location Analysis ══".to_string()]);
    }

    #[test]
    fn test_document_progress() {
        let brief = LegalBrief {
            documents: vec![
                RequiredDocument {
                    name: "Pre-approval".into(),
                    progress: Progress::Completed { on: Some("May 1".into()) },
                },
                RequiredDocument {
                    name: "Insurance".into(),
                    progress: Progress::Pending { due: None },
                },
            ],
            ..LegalBrief::default()
        };
        let lines = render_block(&ContentBlock::Legal(brief));
        assert_eq!(lines[1], "✓ Pre-approval (done May 1)");
        assert_eq!(lines[2], "○ Insurance");
    }

    #[test]
    fn test_updates_route_to_streams() {
        use huddle_core::messages::MessageDraft;
        use huddle_core::CycleId;

        let turn = normalize(&Turn::new("Mike", "Found three homes").with_output(json!({})));
        let cycle = CycleId::new();
        let mut timeline = Timeline::new();
        let mut outputs = Vec::new();

        for event in [
            PlaybackEvent::UserSubmitted { cycle, text: "Find me a house".into() },
            PlaybackEvent::PlaceholderShown { message: MessageDraft::placeholder(&turn) },
            PlaybackEvent::PlaceholderCleared,
            PlaybackEvent::BlockRevealed {
                message: MessageDraft::agent_text(&turn, turn.text.clone()),
            },
            PlaybackEvent::HandoffMarked { to: "Jessica".into() },
        ] {
            let appended = timeline.apply(&event).unwrap();
            outputs.push(render_update(&TimelineUpdate { event, appended }));
        }

        assert_eq!(outputs[0], None);
        assert_eq!(outputs[1], Some(Output::Stderr("🏠 Mike is thinking...".into())));
        assert_eq!(outputs[2], None);
        let Some(Output::Stdout(text)) = &outputs[3] else {
            panic!("expected stdout, got {:?}", outputs[3]);
        };
        assert!(text.starts_with("🏠 Mike ("));
        assert!(text.ends_with(": Found three homes\n"));
        assert_eq!(outputs[4], Some(Output::Stdout("   ↪ handing off to Jessica\n".into())));
    }

    #[test]
    fn test_fallback_is_flagged() {
        use huddle_core::messages::MessageDraft;
        use huddle_core::CycleId;

        let cycle = CycleId::new();
        let mut timeline = Timeline::new();
        timeline
            .apply(&PlaybackEvent::UserSubmitted { cycle, text: "hi".into() })
            .unwrap();
        let message = timeline
            .apply(&PlaybackEvent::FallbackShown { cycle, reason: "boom".into() })
            .unwrap()
            .unwrap();
        assert_eq!(message.text, MessageDraft::fallback().text);

        let rendered = render_message(&message);
        assert!(rendered.contains("Sarah"));
        assert!(rendered.contains("⚠ Sorry"));
    }
}
