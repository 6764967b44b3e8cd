//! Pluggable external event generation with validation and static fallback.
//!
//! An external source (for example a remote text-generation service) proposes
//! an event in the same shape as the catalog. Proposals are validated before
//! anything touches the simulation; a failed, slow or malformed proposal
//! yields `None` and the caller falls back to the static event engine.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

use crate::clock::Period;
use crate::data::{CatalogError, Choice, EventCategory, EventDef, Requirements};
use crate::stats::StatBoard;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("event source unavailable: {0}")]
    Unavailable(String),
    #[error("event source timed out after {0:?}")]
    TimedOut(Duration),
    #[error("event source returned unparseable payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("event source returned malformed event: {0}")]
    Malformed(#[from] CatalogError),
}

/// Read-only snapshot handed to an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub stats: StatBoard,
    pub days_played: u32,
    pub weekday: u8,
    pub period: Period,
    pub age: u8,
    pub is_school_day: bool,
    /// NPC id and strength pairs.
    pub relationships: Vec<(String, i32)>,
    /// Newest-first activity log messages.
    pub recent_history: Vec<String>,
}

/// Payload shape accepted from external generators. Ids are assigned locally.
#[derive(Debug, Clone, Deserialize)]
struct GeneratedPayload {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "GeneratedPayload::default_category")]
    category: EventCategory,
    #[serde(default)]
    choices: Vec<Choice>,
}

impl GeneratedPayload {
    const fn default_category() -> EventCategory {
        EventCategory::Random
    }
}

/// Parse a generator response, tolerating prose around the JSON object.
///
/// # Errors
///
/// Returns a parse error for non-JSON payloads and a malformed error when the
/// event fails shape validation.
pub fn parse_generated(raw: &str, id: &str) -> Result<EventDef, SourceError> {
    let body = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw,
    };
    let payload: GeneratedPayload = serde_json::from_str(body)?;
    validate_generated(EventDef {
        id: id.to_string(),
        title: payload.title,
        description: payload.description,
        category: payload.category,
        choices: payload.choices,
        trigger_chance: 0.0,
        requirements: Requirements::default(),
        forced_only: false,
    })
}

/// Shape checks applied to every externally produced event.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] when the event lacks a title, has fewer
/// than two choices, or any choice is missing text.
pub fn validate_generated(event: EventDef) -> Result<EventDef, SourceError> {
    event.validate_shape()?;
    Ok(event)
}

/// Synchronous external event collaborator.
pub trait EventSource {
    /// Propose an event for the given context.
    ///
    /// # Errors
    ///
    /// Implementations return [`SourceError`] on any failure; callers recover
    /// by falling back to the static engine.
    fn generate(&mut self, ctx: &GenerationContext) -> Result<EventDef, SourceError>;
}

/// Ask `source` for an event, validating the result. Failures are logged and
/// reported as `None`.
pub fn generate_or_fallback<S: EventSource + ?Sized>(
    source: &mut S,
    ctx: &GenerationContext,
) -> Option<EventDef> {
    match source.generate(ctx).and_then(validate_generated) {
        Ok(event) => Some(event),
        Err(err) => {
            log::warn!("falling back to static events: {err}");
            None
        }
    }
}

#[cfg(feature = "async")]
mod remote {
    use super::{EventDef, GenerationContext, SourceError, validate_generated};
    use std::time::Duration;

    /// Asynchronous external event collaborator, bounded by a timeout.
    #[async_trait::async_trait]
    pub trait AsyncEventSource: Send + Sync {
        async fn generate(&self, ctx: &GenerationContext) -> Result<EventDef, SourceError>;
    }

    /// Await `source` for at most `limit`. Timeouts, failures and malformed
    /// payloads are logged and reported as `None`.
    pub async fn generate_with_timeout<S: AsyncEventSource + ?Sized>(
        source: &S,
        ctx: &GenerationContext,
        limit: Duration,
    ) -> Option<EventDef> {
        let result = match tokio::time::timeout(limit, source.generate(ctx)).await {
            Ok(result) => result.and_then(validate_generated),
            Err(_) => Err(SourceError::TimedOut(limit)),
        };
        match result {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("falling back to static events: {err}");
                None
            }
        }
    }
}

#[cfg(feature = "async")]
pub use remote::{AsyncEventSource, generate_with_timeout};

/// Source that replays canned JSON responses, optionally after a delay.
///
/// Used by the tester to exercise the fallback path without a network.
#[derive(Debug, Clone, Default)]
pub struct CannedEventSource {
    responses: VecDeque<Result<String, String>>,
    delay: Duration,
    issued: u32,
}

impl CannedEventSource {
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            delay: Duration::ZERO,
            issued: 0,
        }
    }

    /// Delay applied by the async implementation before answering.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }

    fn next_event(&mut self, ctx: &GenerationContext) -> Result<EventDef, SourceError> {
        self.issued = self.issued.saturating_add(1);
        let id = format!("generated_{}_{}", ctx.days_played, self.issued);
        match self.responses.pop_front() {
            Some(Ok(raw)) => parse_generated(&raw, &id),
            Some(Err(reason)) => Err(SourceError::Unavailable(reason)),
            None => Err(SourceError::Unavailable("no canned responses left".to_string())),
        }
    }
}

impl EventSource for CannedEventSource {
    fn generate(&mut self, ctx: &GenerationContext) -> Result<EventDef, SourceError> {
        self.next_event(ctx)
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncEventSource for tokio::sync::Mutex<CannedEventSource> {
    async fn generate(&self, ctx: &GenerationContext) -> Result<EventDef, SourceError> {
        let delay = self.lock().await.delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.lock().await.next_event(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"Here you go:
    {"title": "Lost Puppy", "description": "A puppy follows you home.", "category": "random",
     "choices": [
        {"text": "Find the owner", "effects": {"happiness": 5}, "result_text": "The owner thanks you."},
        {"text": "Ignore it", "effects": {"happiness": -3}, "result_text": "It whimpers as you leave."}
     ]}"#;

    fn context() -> GenerationContext {
        GenerationContext {
            stats: StatBoard::default(),
            days_played: 3,
            weekday: 3,
            period: Period::Afternoon,
            age: 13,
            is_school_day: true,
            relationships: vec![("mom".to_string(), 70)],
            recent_history: Vec::new(),
        }
    }

    #[test]
    fn well_formed_payload_is_accepted() {
        let event = parse_generated(GOOD, "generated_1").unwrap();
        assert_eq!(event.id, "generated_1");
        assert_eq!(event.title, "Lost Puppy");
        assert_eq!(event.choices.len(), 2);
        assert!(!event.forced_only);
    }

    #[test]
    fn single_choice_payload_is_rejected() {
        let raw = r#"{"title": "Meh", "choices": [{"text": "ok", "result_text": "fine"}]}"#;
        assert!(matches!(
            parse_generated(raw, "g"),
            Err(SourceError::Malformed(CatalogError::TooFewChoices { .. }))
        ));
    }

    #[test]
    fn missing_result_text_is_rejected() {
        let raw =
            r#"{"title": "Hmm", "choices": [{"text": "a"}, {"text": "b", "result_text": "x"}]}"#;
        assert!(matches!(
            parse_generated(raw, "g"),
            Err(SourceError::Malformed(CatalogError::MissingText { .. }))
        ));
    }

    #[test]
    fn prose_without_json_is_a_parse_error() {
        assert!(matches!(
            parse_generated("sorry, I can't help with that", "g"),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn failures_fall_back_to_none() {
        let mut source = CannedEventSource::new([
            Err("offline".to_string()),
            Ok("{not json".to_string()),
            Ok(GOOD.to_string()),
        ]);
        let ctx = context();
        assert!(generate_or_fallback(&mut source, &ctx).is_none());
        assert!(generate_or_fallback(&mut source, &ctx).is_none());
        let event = generate_or_fallback(&mut source, &ctx).unwrap();
        assert_eq!(event.id, "generated_3_3");
        assert!(generate_or_fallback(&mut source, &ctx).is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn slow_sources_time_out() {
        let source = tokio::sync::Mutex::new(
            CannedEventSource::new([Ok(GOOD.to_string())]).with_delay(Duration::from_millis(200)),
        );
        let ctx = context();
        assert!(
            generate_with_timeout(&source, &ctx, Duration::from_millis(10))
                .await
                .is_none()
        );
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn prompt_sources_resolve() {
        let source = tokio::sync::Mutex::new(CannedEventSource::new([Ok(GOOD.to_string())]));
        let event = generate_with_timeout(&source, &context(), Duration::from_secs(1)).await;
        assert_eq!(event.map(|e| e.title), Some("Lost Puppy".to_string()));
    }
}
