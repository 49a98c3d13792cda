//! Synodic moon phase and approximate moon sign.
//!
//! Both calculations are closed-form approximations anchored on a known new
//! moon. They are good enough for a daily reading, not for an ephemeris.

use crate::zodiac::ZodiacSign;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use std::fmt;

/// Mean length of a lunation in days.
pub const SYNODIC_MONTH: f64 = 29.53058867;

/// Days from the common era for 2024-01-11, the reference new moon (local midnight).
const REFERENCE_NEW_MOON_DAYS_FROM_CE: i64 = 738_896;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Moon sign advances roughly every two and a half days.
const DAYS_PER_MOON_SIGN: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Buckets a cycle position in `[0, 1)` into one of the eight named phases.
    ///
    /// Each phase covers one eighth of the cycle centred on its nominal point,
    /// so New Moon wraps around both ends.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction < 0.0625 || fraction >= 0.9375 {
            Self::NewMoon
        } else if fraction < 0.1875 {
            Self::WaxingCrescent
        } else if fraction < 0.3125 {
            Self::FirstQuarter
        } else if fraction < 0.4375 {
            Self::WaxingGibbous
        } else if fraction < 0.5625 {
            Self::FullMoon
        } else if fraction < 0.6875 {
            Self::WaningGibbous
        } else if fraction < 0.8125 {
            Self::LastQuarter
        } else {
            Self::WaningCrescent
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::NewMoon => "🌑",
            Self::WaxingCrescent => "🌒",
            Self::FirstQuarter => "🌓",
            Self::WaxingGibbous => "🌔",
            Self::FullMoon => "🌕",
            Self::WaningGibbous => "🌖",
            Self::LastQuarter => "🌗",
            Self::WaningCrescent => "🌘",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoonPhaseResult {
    pub phase: MoonPhase,
    pub icon: &'static str,
    /// Position within the synodic cycle, 0 = new, 0.5 = full. Always in `[0, 1)`.
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoonSign {
    pub sign: ZodiacSign,
}

impl MoonSign {
    pub fn name(&self) -> &'static str {
        self.sign.name()
    }

    pub fn symbol(&self) -> &'static str {
        self.sign.symbol()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub icon: &'static str,
}

/// Fractional days elapsed since the reference new moon. Negative before it.
fn days_since_reference(now: NaiveDateTime) -> f64 {
    let whole_days = i64::from(now.date().num_days_from_ce()) - REFERENCE_NEW_MOON_DAYS_FROM_CE;
    let ms_into_day = f64::from(now.num_seconds_from_midnight()) * 1000.0
        + f64::from(now.nanosecond() % 1_000_000_000) / 1_000_000.0;
    whole_days as f64 + ms_into_day / MS_PER_DAY
}

pub fn compute_moon_phase(now: NaiveDateTime) -> MoonPhaseResult {
    let days = days_since_reference(now);
    let mut fraction = days.rem_euclid(SYNODIC_MONTH) / SYNODIC_MONTH;
    // rem_euclid can round up to the modulus itself for tiny negative inputs.
    if !(0.0..1.0).contains(&fraction) {
        fraction = 0.0;
    }
    let phase = MoonPhase::from_fraction(fraction);
    MoonPhaseResult {
        phase,
        icon: phase.icon(),
        fraction,
    }
}

pub fn compute_moon_sign(now: NaiveDateTime) -> MoonSign {
    // ordinal() is 1-based, matching days elapsed since "January 0".
    let day_of_year = f64::from(now.ordinal());
    let index = (day_of_year / DAYS_PER_MOON_SIGN).rem_euclid(12.0).floor() as usize;
    MoonSign {
        sign: ZodiacSign::from_index(index),
    }
}

/// Nominal span of the current phase shown alongside it.
pub fn phase_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(3), today + Duration::days(4))
}

/// Four weekly markers around today for the moon calendar strip.
pub fn moon_calendar(today: NaiveDate) -> [CalendarDay; 4] {
    const ICONS: [&str; 4] = ["🌑", "🌓", "🌕", "🌗"];
    let mut days = [CalendarDay { date: today, icon: ICONS[0] }; 4];
    for (slot, (offset, icon)) in days.iter_mut().zip((-1i64..=2).zip(ICONS)) {
        *slot = CalendarDay {
            date: today + Duration::days(offset * 7),
            icon,
        };
    }
    days
}
