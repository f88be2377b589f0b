//! Conversion of fetched UTC instants into display strings.

use anyhow::anyhow;
use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::i18n::Locale;

/// Time zone the screen renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// Whatever the host is configured with.
    #[default]
    Local,
    Named(Tz),
}

impl Zone {
    /// Parse an IANA zone name such as `America/Los_Angeles`.
    pub fn parse(name: &str) -> anyhow::Result<Self> {
        name.parse::<Tz>().map(Zone::Named).map_err(|_| {
            anyhow!(
                "Invalid time zone '{name}'.\n\
                 Hint: use an IANA name such as `America/Los_Angeles` or `Asia/Shanghai`."
            )
        })
    }

    /// Wall-clock time in this zone for the given instant.
    pub fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Local => at.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => at.with_timezone(tz).naive_local(),
        }
    }
}

/// Everything rendering depends on. Passed explicitly instead of living in
/// process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderContext {
    pub locale: Locale,
    pub zone: Zone,
}

impl RenderContext {
    pub fn new(locale: Locale, zone: Zone) -> Self {
        Self { locale, zone }
    }

    pub fn with_locale(self, locale: Locale) -> Self {
        Self { locale, ..self }
    }
}

/// Render `at` as `hh:mm <meridiem>` in the context's zone and locale.
pub fn localize(at: DateTime<Utc>, ctx: &RenderContext) -> String {
    format_clock(ctx.zone.to_local(at), ctx.locale)
}

fn format_clock(wall: NaiveDateTime, locale: Locale) -> String {
    let (is_pm, hour) = wall.hour12();
    let (am, pm) = locale.meridiem();
    let marker = if is_pm { pm } else { am };

    format!("{:02}:{:02} {}", hour, wall.minute(), marker)
}
