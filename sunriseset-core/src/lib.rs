//! Core library for the `sunriseset` screen.
//!
//! This crate defines:
//! - Shared domain models (event kinds, fetched event times)
//! - The HTTP fetcher for sunrise-sunset.org
//! - Time zone conversion and 12-hour formatting
//! - Display locales and their strings
//! - Configuration handling
//! - The screen controller that ties fetching and rendering together
//!
//! It is used by `sunriseset-cli`, but can also be driven by other front ends.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod i18n;
pub mod localizer;
pub mod model;
pub mod screen;

pub use config::Config;
pub use error::FetchError;
pub use fetcher::{HttpSunTimesFetcher, SunTimesFetcher};
pub use i18n::Locale;
pub use localizer::{RenderContext, Zone, localize};
pub use model::{EventKind, EventTime};
pub use screen::{Screen, ScreenController, ScreenState};
