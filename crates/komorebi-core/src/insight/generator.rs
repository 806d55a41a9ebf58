use super::fallback::fallback_quote;
use super::gallery::InsightGallery;
use super::model::{InsightCard, InsightRef};
use crate::remote::{FrameCapture, HistoryEntry, InsightRequest, InsightService};
use crate::session::{Message, SceneType, SessionType};
use crate::user::UserContext;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Where the quote on a card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    Remote,
    Fallback,
}

/// Input for one card.
#[derive(Debug, Clone)]
pub struct InsightInput {
    pub messages: Vec<Message>,
    pub session_type: SessionType,
    pub scene_type: SceneType,
    /// Archived session the card belongs to; a fresh id is minted when absent.
    pub session_id: Option<String>,
    /// Whether to grab a still from the video background.
    pub capture_still: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GeneratedInsight {
    pub card: InsightCard,
    pub reference: InsightRef,
    pub source: QuoteSource,
    /// Whether the card was written to the gallery.
    pub stored: bool,
}

/// Turns a transcript into an [`InsightCard`].
///
/// Always produces a card: when the insight service fails or answers with
/// nothing, a locally matched quote is used instead.
pub struct InsightGenerator {
    service: Arc<dyn InsightService>,
    frame_capture: Arc<dyn FrameCapture>,
    gallery: InsightGallery,
}

impl InsightGenerator {
    pub fn new(
        service: Arc<dyn InsightService>,
        frame_capture: Arc<dyn FrameCapture>,
        gallery: InsightGallery,
    ) -> Self {
        Self {
            service,
            frame_capture,
            gallery,
        }
    }

    pub async fn generate_insight_card(&self, user: &UserContext, input: InsightInput) -> GeneratedInsight {
        let (quote, source) = self.quote_for(&input).await;

        let video_still_url = if input.capture_still {
            self.frame_capture.capture_still().await
        } else {
            None
        };

        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let card = InsightCard {
            id: Uuid::new_v4().to_string(),
            quote,
            session_type: input.session_type,
            session_id: session_id.clone(),
            created_at: input.now,
            scene_type: input.scene_type,
            video_still_url,
            is_pinned: false,
        };

        let stored = if user.is_authenticated() || user.is_guest() {
            match self.gallery.save(user, card.clone()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to store insight card");
                    false
                }
            }
        } else {
            false
        };

        tracing::info!(id = %card.id, ?source, stored, "Generated insight card");
        GeneratedInsight {
            reference: InsightRef {
                session_id,
                insight_id: card.id.clone(),
            },
            card,
            source,
            stored,
        }
    }

    async fn quote_for(&self, input: &InsightInput) -> (String, QuoteSource) {
        let request = InsightRequest {
            session_messages: input.messages.iter().map(HistoryEntry::from).collect(),
            session_type: input.session_type,
        };

        match self.service.generate_quote(&request).await {
            Ok(reply) => {
                let quote = clean_quote(&reply.quote);
                if !quote.is_empty() {
                    return (quote, QuoteSource::Remote);
                }
                tracing::warn!("Insight service returned an empty quote, using local fallback");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Insight service failed, using local fallback");
            }
        }

        let quote = fallback_quote(&input.messages, input.session_type, &mut rand::thread_rng());
        (quote.to_string(), QuoteSource::Fallback)
    }
}

/// Trims whitespace and a single pair of wrapping quotes.
fn clean_quote(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unwrapped.trim().to_string()
}
