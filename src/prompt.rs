use crate::moon::{MoonPhaseResult, MoonSign};
use crate::zodiac::ZodiacSign;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every kind of generated content the app can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentCategory {
    Horoscope,
    AstroEvents,
    Moon,
    LoveForecast,
    CareerOutlook,
    WellnessGuide,
    LuckyElements,
}

impl ContentCategory {
    pub const TABS: [ContentCategory; 3] = [
        ContentCategory::Horoscope,
        ContentCategory::AstroEvents,
        ContentCategory::Moon,
    ];

    pub const FEATURE_CARDS: [ContentCategory; 4] = [
        ContentCategory::LoveForecast,
        ContentCategory::CareerOutlook,
        ContentCategory::WellnessGuide,
        ContentCategory::LuckyElements,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Horoscope => "horoscope",
            Self::AstroEvents => "astro-events",
            Self::Moon => "moon",
            Self::LoveForecast => "love-forecast",
            Self::CareerOutlook => "career-outlook",
            Self::WellnessGuide => "wellness-guide",
            Self::LuckyElements => "lucky-elements",
        }
    }

    /// Display title of the feature card, if this category is one.
    pub fn card_title(self) -> Option<&'static str> {
        match self {
            Self::LoveForecast => Some("Love Forecast"),
            Self::CareerOutlook => Some("Career Outlook"),
            Self::WellnessGuide => Some("Wellness Guide"),
            Self::LuckyElements => Some("Lucky Elements"),
            Self::Horoscope | Self::AstroEvents | Self::Moon => None,
        }
    }

    /// Maps a feature card title to its category. Matching ignores case.
    pub fn from_card_title(title: &str) -> Option<Self> {
        let wanted = title.trim();
        Self::FEATURE_CARDS
            .into_iter()
            .find(|category| category.card_title().is_some_and(|t| t.eq_ignore_ascii_case(wanted)))
    }

    pub fn requires_sun_sign(self) -> bool {
        !matches!(self, Self::AstroEvents | Self::Moon)
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for ContentCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::TABS
            .into_iter()
            .chain(Self::FEATURE_CARDS)
            .find(|category| category.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Please select your Sun sign to get your horoscope")]
    MissingSunSign,
}

/// Everything a template may embed.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub today: NaiveDate,
    pub sun_sign: Option<ZodiacSign>,
    pub moon_phase: MoonPhaseResult,
    pub moon_sign: MoonSign,
}

impl PromptContext {
    /// Today's date as the model should read it, e.g. "Monday, October 19, 2026".
    pub fn date_label(&self) -> String {
        format_date(self.today)
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn build_prompt(category: ContentCategory, ctx: &PromptContext) -> Result<String, PromptError> {
    let today = ctx.date_label();
    let prompt = match category {
        ContentCategory::AstroEvents => format!(
            "Today is {today}. As an expert astrologer, tell me about the most significant astrological event happening today.\n\nStart your answer with a single line containing only the name of the event (e.g., Mercury Retrograde, Jupiter Transit, Full Moon).\n\nThen include:\n1. A detailed explanation of what this event means\n2. How it might affect people generally\n3. Practical advice for navigating this energy\n\nBe mystical yet practical. Use emojis appropriately and use markdown headers (##) for each section."
        ),
        ContentCategory::Moon => {
            let phase = ctx.moon_phase.phase.name();
            let moon_sign = ctx.moon_sign.name();
            format!(
                "Today is {today}. As an astrologer, explain the current {phase} moon phase and what it means.\nThe moon is currently in {moon_sign}.\n\nInclude:\n1. The meaning of this moon phase\n2. Best activities during this phase\n3. What to avoid\n4. How the moon in {moon_sign} affects the energy\n5. Ritual suggestions\n\nBe mystical and practical. Use emojis and markdown headers (##) for each section."
            )
        }
        ContentCategory::Horoscope => {
            let sign = ctx.sun_sign.ok_or(PromptError::MissingSunSign)?;
            format!(
                "Today is {today}. As a professional astrologer, provide today's horoscope for {sign}.\n\nInclude:\n1. General forecast for the day\n2. Love and relationships\n3. Career and money\n4. Health and wellness\n5. Lucky color and number\n\nFormat it in a beautiful, engaging way with emojis and markdown headers (##). Keep it positive and insightful."
            )
        }
        ContentCategory::LoveForecast => {
            let sign = ctx.sun_sign.ok_or(PromptError::MissingSunSign)?;
            format!(
                "Today is {today}. As a professional astrologer, give a love and relationships forecast for {sign}.\n\nInclude:\n1. The romantic energy of the day\n2. Advice for those in a relationship\n3. Advice for those who are single\n4. The most compatible signs today\n\nBe warm and positive. Use emojis and markdown headers (##)."
            )
        }
        ContentCategory::CareerOutlook => {
            let sign = ctx.sun_sign.ok_or(PromptError::MissingSunSign)?;
            format!(
                "Today is {today}. As a professional astrologer, give a career and money outlook for {sign}.\n\nInclude:\n1. Work and professional opportunities\n2. Financial guidance\n3. Communication with colleagues\n4. One practical action to take today\n\nBe practical and encouraging. Use emojis and markdown headers (##)."
            )
        }
        ContentCategory::WellnessGuide => {
            let sign = ctx.sun_sign.ok_or(PromptError::MissingSunSign)?;
            let phase = ctx.moon_phase.phase.name();
            format!(
                "Today is {today} and the moon is in its {phase} phase. As a holistic astrologer, give a health and wellness guide for {sign}.\n\nInclude:\n1. Physical energy levels\n2. Emotional balance\n3. A self-care ritual suited to this moon phase\n4. Foods or activities to favor\n\nBe gentle and positive. Use emojis and markdown headers (##)."
            )
        }
        ContentCategory::LuckyElements => {
            let sign = ctx.sun_sign.ok_or(PromptError::MissingSunSign)?;
            format!(
                "Today is {today}. As a professional astrologer, list today's lucky elements for {sign}.\n\nInclude:\n1. Lucky color\n2. Lucky number\n3. Lucky time of day\n4. Lucky crystal or gemstone\n5. A short affirmation\n\nKeep each item brief and mystical. Use emojis and **bold** labels."
            )
        }
    };
    Ok(prompt)
}

/// Splits an astro event answer into its heading line and the remaining body.
pub fn split_event_title(content: &str) -> (String, String) {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let title = match lines.next() {
        Some(first) => first.replace(['#', '*'], "").trim().to_string(),
        None => return (String::new(), String::new()),
    };
    let body = lines.collect::<Vec<_>>().join("\n");
    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moon::{compute_moon_phase, compute_moon_sign};

    fn context(sun_sign: Option<ZodiacSign>) -> PromptContext {
        let now = NaiveDate::from_ymd_opt(2024, 1, 11)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        PromptContext {
            today: now.date(),
            sun_sign,
            moon_phase: compute_moon_phase(now),
            moon_sign: compute_moon_sign(now),
        }
    }

    #[test]
    fn date_label_is_spelled_out() {
        assert_eq!(context(None).date_label(), "Thursday, January 11, 2024");
    }

    #[test]
    fn horoscope_embeds_date_and_capitalized_sign() {
        let prompt = build_prompt(ContentCategory::Horoscope, &context(Some(ZodiacSign::Scorpio))).unwrap();
        assert!(prompt.starts_with("Today is Thursday, January 11, 2024."));
        assert!(prompt.contains("horoscope for Scorpio"));
        assert!(prompt.contains("Lucky color and number"));
    }

    #[test]
    fn sign_based_categories_need_a_sun_sign() {
        let ctx = context(None);
        for category in ContentCategory::FEATURE_CARDS.into_iter().chain([ContentCategory::Horoscope]) {
            assert!(category.requires_sun_sign());
            assert_eq!(build_prompt(category, &ctx), Err(PromptError::MissingSunSign));
        }
    }

    #[test]
    fn moon_prompt_uses_calculated_phase_and_sign() {
        let prompt = build_prompt(ContentCategory::Moon, &context(None)).unwrap();
        assert!(prompt.contains("current New Moon moon phase"));
        // 2024-01-11 is day 11: floor(11 / 2.5) = 4.
        assert!(prompt.contains("The moon is currently in Leo."));
    }

    #[test]
    fn astro_events_does_not_need_a_sign() {
        let prompt = build_prompt(ContentCategory::AstroEvents, &context(None)).unwrap();
        assert!(prompt.contains("most significant astrological event happening today"));
    }

    #[test]
    fn card_titles_match_case_insensitively() {
        assert_eq!(
            ContentCategory::from_card_title("love forecast"),
            Some(ContentCategory::LoveForecast)
        );
        assert_eq!(
            ContentCategory::from_card_title("  LUCKY ELEMENTS "),
            Some(ContentCategory::LuckyElements)
        );
        assert_eq!(ContentCategory::from_card_title("Horoscope"), None);
    }

    #[test]
    fn category_ids_parse() {
        assert_eq!("astro-events".parse::<ContentCategory>(), Ok(ContentCategory::AstroEvents));
        assert_eq!("MOON".parse::<ContentCategory>(), Ok(ContentCategory::Moon));
        assert!("weather".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn event_title_is_first_non_blank_line() {
        let (title, body) = split_event_title("\n## **Mercury Retrograde** ☿\n\nThings slow down.\nReview plans.");
        assert_eq!(title, "Mercury Retrograde ☿");
        assert_eq!(body, "Things slow down.\nReview plans.");
    }

    #[test]
    fn event_title_of_empty_answer_is_empty() {
        assert_eq!(split_event_title("  \n\n"), (String::new(), String::new()));
    }
}
