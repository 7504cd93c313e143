//! Huddle Core - Conversation Playback for a Multi-Persona Advisory Team
//!
//! This crate turns a batch response from a real-estate advisory backend (a
//! team lead plus five specialists) into a simulated live conversation:
//! messages from different agents appear one at a time, with typing
//! placeholders and hand-off pauses, and each agent's structured payload is
//! unpacked into typed content blocks. It is completely independent of any UI
//! framework; surfaces only observe the timeline.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           UI Surfaces                            │
//! │        ┌─────────┐     ┌──────────┐     ┌────────────────┐       │
//! │        │   CLI   │     │  WebUI   │     │    Headless    │       │
//! │        └────┬────┘     └────┬─────┘     └───────┬────────┘       │
//! │             └───────────────┼───────────────────┘                │
//! │              submit (down)  │  TimelineSnapshot / updates (up)   │
//! └─────────────────────────────┼────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┼────────────────────────────────────┐
//! │                         HUDDLE CORE                              │
//! │  ┌──────────────────────────┴─────────────────────────────────┐  │
//! │  │                          Huddle                            │  │
//! │  │  ┌───────────┐  ┌────────────┐  ┌──────────┐  ┌─────────┐  │  │
//! │  │  │  Backend  │─►│ Normalizer │─►│Scheduler │─►│Timeline │  │  │
//! │  │  │  (HTTP)   │  │+Dispatcher │  │ (Clock)  │  │(reducer)│  │  │
//! │  │  └───────────┘  └────────────┘  └──────────┘  └─────────┘  │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Huddle`]: Facade owning backend, scheduler and timeline
//! - [`Turn`]: One raw agent contribution
//! - [`NormalizedTurn`]: A turn reduced to text plus [`ContentBlock`]s
//! - [`PlaybackScheduler`]: Timed, cooperative reveal of normalized turns
//! - [`Timeline`]: Event-driven reducer owning the [`DisplayMessage`] list
//! - [`Clock`]: Abstract suspension for dwell intervals
//!
//! # Quick Start
//!
//! ```ignore
//! use huddle_core::{
//!     backend::HttpAdvisorBackend,
//!     config::load_config,
//!     Huddle, TokioClock,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = load_config()?;
//!     let backend = HttpAdvisorBackend::from_config(&settings.backend_config())?;
//!     let huddle = Huddle::new(backend, TokioClock, settings.huddle_config());
//!
//!     let mut timeline = huddle.subscribe();
//!     tokio::spawn(async move {
//!         while timeline.changed().await.is_ok() {
//!             let snapshot = timeline.borrow_and_update().clone();
//!             // render snapshot.messages
//!         }
//!     });
//!
//!     huddle.submit("Looking for a 3-bedroom near good schools").await?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod blocks;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod huddle;
pub mod messages;
pub mod normalizer;
pub mod payload;
pub mod persona;
pub mod response;
pub mod scheduler;
pub mod timeline;

// Re-exports for convenience
pub use backend::{AdvisorBackend, BackendConfig, BackendError, HttpAdvisorBackend};
pub use blocks::{BlockKind, ContentBlock};
pub use clock::{Clock, InstantClock, TokioClock};
pub use config::{ConfigError, ConfigOverrides, ConfigSource, HuddleSettings};
pub use events::{PlaybackEvent, TimelineUpdate};
pub use huddle::{CycleOutcome, Huddle, HuddleConfig, SubmitError, TimelineStore};
pub use messages::{
    CycleId, DisplayMessage, MessageId, MessageOrigin, MessageTag, PlaybackState, Transition,
    FALLBACK_TEXT,
};
pub use normalizer::{normalize, normalize_all, ExtractionGap, NormalizedTurn, Segment};
pub use persona::{AgentProfile, Persona, Specialty};
pub use response::{ConversationResponse, MessageBody, SchemaError, Turn};
pub use scheduler::{EventSink, PlaybackConfig, PlaybackReport, PlaybackScheduler};
pub use timeline::{Timeline, TimelineError, TimelineSnapshot};
