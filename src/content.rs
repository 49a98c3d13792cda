//! Loads generated content for a category and hands it to a display sink.
//!
//! Each render target keeps a request token. A load only renders if its token
//! is still the newest one issued for that target when it completes, so a
//! slow response cannot overwrite content from a later request.

use crate::config::{Config, Placement, SettingsStore};
use crate::format::format_for_display;
use crate::gemini::{GenerationError, ModelInfo, TextGenerator};
use crate::moon::{
    compute_moon_phase, compute_moon_sign, moon_calendar, phase_window, CalendarDay,
    MoonPhaseResult, MoonSign,
};
use crate::prompt::{
    build_prompt, format_date, split_event_title, ContentCategory, PromptContext, PromptError,
};
use crate::zodiac::ZodiacSign;
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn, Instrument};

/// Display region a category renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderTarget {
    Horoscope,
    EventOfDay,
    MoonDescription,
    FeatureCard,
}

impl RenderTarget {
    pub fn for_category(category: ContentCategory) -> Self {
        match category {
            ContentCategory::Horoscope => Self::Horoscope,
            ContentCategory::AstroEvents => Self::EventOfDay,
            ContentCategory::Moon => Self::MoonDescription,
            ContentCategory::LoveForecast
            | ContentCategory::CareerOutlook
            | ContentCategory::WellnessGuide
            | ContentCategory::LuckyElements => Self::FeatureCard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RenderState {
    Loading,
    /// Instruction shown instead of calling the generator.
    Notice(String),
    /// Formatted markup.
    Rendered(String),
    /// Event of the day: plain title plus formatted body markup.
    Event { title: String, body: String },
    /// User-facing text of a failed generation call.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Rendered(RenderState),
    /// A newer request for the same target was issued; this result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Please enter your Gemini API key")]
    EmptyApiKey,
}

/// Receives every state change of a render target.
pub trait ContentSink: Send + Sync {
    fn render(&self, target: RenderTarget, state: RenderState);
}

/// Data for the moon panel; computed locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoonOverview {
    pub date_label: String,
    pub phase: MoonPhaseResult,
    pub sign: MoonSign,
    pub window: (NaiveDate, NaiveDate),
    pub calendar: [CalendarDay; 4],
}

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct ContentOrchestrator<G, S> {
    settings: Mutex<SettingsStore>,
    generator: G,
    sink: S,
    clock: Clock,
    current: Mutex<ContentCategory>,
    tokens: Mutex<HashMap<RenderTarget, u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<G: TextGenerator, S: ContentSink> ContentOrchestrator<G, S> {
    pub fn new(settings: SettingsStore, generator: G, sink: S) -> Self {
        Self {
            settings: Mutex::new(settings),
            generator,
            sink,
            clock: Box::new(|| Local::now().naive_local()),
            current: Mutex::new(ContentCategory::Horoscope),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> Config {
        lock(&self.settings).config().clone()
    }

    pub fn current_category(&self) -> ContentCategory {
        *lock(&self.current)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Makes `category` current and loads it when an API key is configured.
    pub async fn switch_to(&self, category: ContentCategory) -> Option<LoadOutcome> {
        *lock(&self.current) = category;
        debug!(category = %category, "Category selected");
        if !self.config().has_api_key() {
            return None;
        }
        Some(self.load(category).await)
    }

    /// Loads the current category.
    pub async fn reload(&self) -> LoadOutcome {
        self.load(self.current_category()).await
    }

    pub async fn load(&self, category: ContentCategory) -> LoadOutcome {
        let target = RenderTarget::for_category(category);
        let token = self.issue_token(target);
        let config = self.config();

        if !config.has_api_key() {
            debug!(category = %category, "No API key configured");
            let notice = GenerationError::MissingApiKey.to_string();
            return self.finish(target, token, RenderState::Notice(notice));
        }

        let now = (self.clock)();
        let ctx = PromptContext {
            today: now.date(),
            sun_sign: config.sun_sign(),
            moon_phase: compute_moon_phase(now),
            moon_sign: compute_moon_sign(now),
        };

        if category.requires_sun_sign() && ctx.sun_sign.is_none() {
            debug!(category = %category, "No sun sign selected");
            let notice = PromptError::MissingSunSign.to_string();
            return self.finish(target, token, RenderState::Notice(notice));
        }

        let prompt = match build_prompt(category, &ctx) {
            Ok(prompt) => prompt,
            Err(e) => return self.finish(target, token, RenderState::Notice(e.to_string())),
        };

        self.sink.render(target, RenderState::Loading);
        let span = tracing::info_span!(
            "content_load",
            request_id = token,
            category = %category,
            prompt_len = prompt.len()
        );
        span.in_scope(|| info!("Content requested"));

        let result = self
            .generator
            .generate(&prompt, &config.api_key)
            .instrument(span.clone())
            .await;

        let state = span.in_scope(|| match result {
            Ok(text) => {
                info!(response_len = text.len(), "Content generated");
                render_text(category, &text)
            }
            Err(e) => {
                error!(error = ?e, "Content generation failed");
                RenderState::Error(e.to_string())
            }
        });
        self.finish(target, token, state)
    }

    /// Stores a new API key and logs which models it can use.
    pub async fn save_api_key(&self, api_key: &str) -> Result<Vec<ModelInfo>> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ContentError::EmptyApiKey.into());
        }
        lock(&self.settings).set_api_key(api_key)?;

        match self.generator.list_models(api_key).await {
            Ok(models) => Ok(models),
            Err(e) => {
                warn!(error = %e, "Listing models failed");
                Ok(Vec::new())
            }
        }
    }

    /// Persists a sign selection. A new sun sign reloads the current category.
    pub async fn select_sign(
        &self,
        placement: Placement,
        sign: Option<ZodiacSign>,
    ) -> Result<Option<LoadOutcome>> {
        lock(&self.settings).set_sign(placement, sign)?;
        if placement != Placement::Sun || !self.config().has_api_key() {
            return Ok(None);
        }
        Ok(Some(self.reload().await))
    }

    pub fn moon_overview(&self) -> MoonOverview {
        let now = (self.clock)();
        let today = now.date();
        MoonOverview {
            date_label: format_date(today),
            phase: compute_moon_phase(now),
            sign: compute_moon_sign(now),
            window: phase_window(today),
            calendar: moon_calendar(today),
        }
    }

    fn issue_token(&self, target: RenderTarget) -> u64 {
        let mut tokens = lock(&self.tokens);
        let token = tokens.entry(target).or_insert(0);
        *token += 1;
        *token
    }

    fn finish(&self, target: RenderTarget, token: u64, state: RenderState) -> LoadOutcome {
        let latest = lock(&self.tokens).get(&target).copied().unwrap_or(0);
        if token != latest {
            debug!(?target, token, latest, "Discarding stale content");
            return LoadOutcome::Superseded;
        }
        self.sink.render(target, state.clone());
        LoadOutcome::Rendered(state)
    }
}

fn render_text(category: ContentCategory, text: &str) -> RenderState {
    if category == ContentCategory::AstroEvents {
        let (title, body) = split_event_title(text);
        return RenderState::Event {
            title,
            body: format_for_display(&body),
        };
    }
    RenderState::Rendered(format_for_display(text))
}
