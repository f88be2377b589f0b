//! The single screen: two labels, two language buttons, and the controller
//! that fills the labels.

use std::{fmt::Write as _, sync::Arc, time::Duration};

use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::{
    fetcher::SunTimesFetcher,
    i18n::{Key, Locale},
    localizer::{RenderContext, localize},
    model::{EventKind, EventTime},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Idle,
    Fetching,
    Displayed,
}

/// What the user sees. Labels stay `None` until both times are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub locale: Locale,
    pub state: ScreenState,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

impl Screen {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            state: ScreenState::Idle,
            sunrise: None,
            sunset: None,
        }
    }

    /// Language buttons in display order, with the locale each one selects.
    pub fn buttons(&self) -> [(&'static str, Locale); 2] {
        [
            (self.locale.text(Key::ChineseButton), Locale::Zh),
            (self.locale.text(Key::EnglishButton), Locale::En),
        ]
    }

    /// Write both labels, but only when both events are known.
    ///
    /// A missing event leaves both labels unset and shows nothing in their
    /// place.
    pub fn apply(
        &mut self,
        sunrise: Option<EventTime>,
        sunset: Option<EventTime>,
        ctx: &RenderContext,
    ) {
        if let (Some(sunrise), Some(sunset)) = (sunrise, sunset) {
            self.sunrise = Some(label(ctx, Key::SunriseTime, sunrise));
            self.sunset = Some(label(ctx, Key::SunsetTime, sunset));
        } else {
            debug!("At least one event time missing; labels left unset");
        }
        self.state = ScreenState::Displayed;
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.sunrise.as_deref().unwrap_or_default());
        let _ = writeln!(out, "{}", self.sunset.as_deref().unwrap_or_default());
        let buttons: Vec<String> = self
            .buttons()
            .iter()
            .map(|(caption, _)| format!("[ {caption} ]"))
            .collect();
        let _ = writeln!(out, "{}", buttons.join("  "));
        out
    }
}

fn label(ctx: &RenderContext, key: Key, time: EventTime) -> String {
    format!("{} {}", ctx.locale.text(key), localize(time.at, ctx))
}

/// Drives one [`Screen`] at a time.
///
/// Creating a screen launches both fetches; switching the locale cancels
/// whatever the previous screen was still waiting on and starts over.
#[derive(Debug)]
pub struct ScreenController {
    fetcher: Arc<dyn SunTimesFetcher>,
    ctx: RenderContext,
    timeout: Duration,
    screen: Screen,
    load: Option<JoinHandle<Screen>>,
}

impl ScreenController {
    pub fn new(fetcher: Arc<dyn SunTimesFetcher>, ctx: RenderContext, timeout: Duration) -> Self {
        Self {
            fetcher,
            screen: Screen::new(ctx.locale),
            ctx,
            timeout,
            load: None,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Current screen without waiting for an in-flight load.
    pub fn current(&self) -> &Screen {
        &self.screen
    }

    /// Build a fresh screen and start fetching both events for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(&mut self) {
        self.cancel_load();

        self.screen = Screen::new(self.ctx.locale);

        let fetcher = Arc::clone(&self.fetcher);
        let ctx = self.ctx;
        let timeout = self.timeout;
        self.load = Some(tokio::spawn(async move {
            let (sunrise, sunset) = fetch_pair(fetcher, timeout).await;
            let mut screen = Screen::new(ctx.locale);
            screen.apply(sunrise, sunset, &ctx);
            screen
        }));
        self.screen.state = ScreenState::Fetching;
    }

    /// Wait for the current load to settle and return the displayed screen.
    pub async fn screen(&mut self) -> &Screen {
        if let Some(load) = self.load.take() {
            match load.await {
                Ok(screen) => self.screen = screen,
                Err(e) => {
                    warn!(error = %e, "Screen load did not complete");
                    self.screen.state = ScreenState::Displayed;
                }
            }
        }
        &self.screen
    }

    /// Change the display locale and rebuild the screen from scratch.
    pub fn switch_locale(&mut self, locale: Locale) {
        info!(from = %self.ctx.locale, to = %locale, "Switching display locale");
        self.ctx = self.ctx.with_locale(locale);
        self.create();
    }

    fn cancel_load(&mut self) {
        if let Some(load) = self.load.take() {
            if !load.is_finished() {
                debug!("Cancelling in-flight screen load");
            }
            load.abort();
        }
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.cancel_load();
    }
}

/// Fetch both events concurrently, giving up on whatever is still pending
/// after `timeout`.
async fn fetch_pair(
    fetcher: Arc<dyn SunTimesFetcher>,
    timeout: Duration,
) -> (Option<EventTime>, Option<EventTime>) {
    // Dropping the set aborts both fetches, so a cancelled load takes them down too.
    let mut tasks = JoinSet::new();
    for &kind in EventKind::all() {
        let fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move { fetcher.fetch_time(kind).await });
    }

    let mut sunrise = None;
    let mut sunset = None;

    let joined = tokio::time::timeout(timeout, async {
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Some(time)) => match time.kind {
                    EventKind::Sunrise => sunrise = Some(time),
                    EventKind::Sunset => sunset = Some(time),
                },
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Fetch task failed"),
            }
        }
    })
    .await;

    if joined.is_err() {
        warn!(timeout = ?timeout, "Timed out waiting for event times");
        tasks.abort_all();
    }

    (sunrise, sunset)
}
