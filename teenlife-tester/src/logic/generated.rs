//! A stand-in for a remote event generator that misbehaves on purpose.
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use teenlife_game::generator::parse_generated;
use teenlife_game::{AsyncEventSource, EventDef, GenerationContext, SourceError};
use tokio::sync::Mutex;

/// Budget the simulation grants each generation request.
pub const GENERATION_TIMEOUT: Duration = Duration::from_millis(5);
const SLOW_RESPONSE: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Valid,
    Garbage,
    Unavailable,
    Slow,
}

/// Answers with a mix of valid events, truncated JSON, outages and
/// responses slower than [`GENERATION_TIMEOUT`].
#[derive(Debug)]
pub struct FlakyEventSource {
    rng: Mutex<ChaCha20Rng>,
    issued: AtomicU32,
}

impl FlakyEventSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed.rotate_left(17))),
            issued: AtomicU32::new(0),
        }
    }

    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::Relaxed)
    }

    async fn next_behaviour(&self) -> Behaviour {
        let roll: f64 = self.rng.lock().await.r#gen();
        match roll {
            r if r < 0.55 => Behaviour::Valid,
            r if r < 0.70 => Behaviour::Garbage,
            r if r < 0.85 => Behaviour::Unavailable,
            _ => Behaviour::Slow,
        }
    }
}

fn payload(ctx: &GenerationContext) -> String {
    let mood = if ctx.stats.happiness < 40 {
        "A rough"
    } else {
        "An easy"
    };
    serde_json::json!({
        "title": format!("{mood} day {}", ctx.days_played),
        "description": "Something small happens on the way home.",
        "category": "social",
        "choices": [
            {
                "text": "Go with it",
                "effects": { "happiness": 4, "energy": -5 },
                "result_text": "It turns out fine."
            },
            {
                "text": "Head home",
                "effects": { "energy": 5 },
                "result_text": "You get some rest instead."
            }
        ]
    })
    .to_string()
}

#[async_trait::async_trait]
impl AsyncEventSource for FlakyEventSource {
    async fn generate(&self, ctx: &GenerationContext) -> Result<EventDef, SourceError> {
        let issued = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("generated_{}_{issued}", ctx.days_played);
        match self.next_behaviour().await {
            Behaviour::Valid => parse_generated(&payload(ctx), &id),
            Behaviour::Garbage => parse_generated("{\"title\": \"Half a tho", &id),
            Behaviour::Unavailable => Err(SourceError::Unavailable(
                "generator returned 503".to_string(),
            )),
            Behaviour::Slow => {
                tokio::time::sleep(SLOW_RESPONSE).await;
                parse_generated(&payload(ctx), &id)
            }
        }
    }
}
