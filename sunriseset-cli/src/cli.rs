use std::{fmt, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Select};
use sunriseset_core::{
    Config, HttpSunTimesFetcher, Locale, RenderContext, ScreenController, Zone, i18n::Key,
};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "sunriseset",
    version,
    about = "Today's sunrise and sunset in San Francisco, in your time zone"
)]
pub struct Cli {
    /// IANA time zone to render in, overriding the configured one.
    #[arg(long, global = true)]
    pub time_zone: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive screen (default).
    Screen {
        /// Starting language, "en" or "zh". Defaults to the system locale.
        #[arg(long, value_parser = parse_locale)]
        lang: Option<Locale>,
    },

    /// Print the screen once and exit.
    Show {
        /// Language, "en" or "zh". Defaults to the system locale.
        #[arg(long, value_parser = parse_locale)]
        lang: Option<Locale>,
    },

    /// Store settings in the config file. Without flags, print the current ones.
    Configure {
        /// Seconds to wait for both times before giving up.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn parse_locale(value: &str) -> anyhow::Result<Locale> {
    Locale::try_from(value)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match &self.command {
            None => interactive(self.controller(&config, None)?).await,
            Some(Command::Screen { lang }) => interactive(self.controller(&config, *lang)?).await,
            Some(Command::Show { lang }) => {
                let mut controller = self.controller(&config, *lang)?;
                controller.create();
                print!("{}", controller.screen().await.render());
                Ok(())
            }
            Some(Command::Configure { timeout_secs }) => {
                if self.time_zone.is_none() && timeout_secs.is_none() {
                    let path = Config::config_file_path()?;
                    println!("# {}", path.display());
                    print!("{}", config.to_toml()?);
                    return Ok(());
                }

                if let Some(name) = &self.time_zone {
                    config.set_time_zone(name)?;
                }
                if let Some(secs) = *timeout_secs {
                    config.set_timeout_secs(secs)?;
                }

                let path = config.save()?;
                println!("Saved configuration to {}", path.display());
                Ok(())
            }
        }
    }

    fn render_context(&self, config: &Config, lang: Option<Locale>) -> anyhow::Result<RenderContext> {
        let zone = match &self.time_zone {
            Some(name) => Zone::parse(name)?,
            None => config.zone()?,
        };
        let locale = lang.unwrap_or_else(Locale::from_system);

        Ok(RenderContext::new(locale, zone))
    }

    fn controller(&self, config: &Config, lang: Option<Locale>) -> anyhow::Result<ScreenController> {
        let ctx = self.render_context(config, lang)?;
        let fetcher = HttpSunTimesFetcher::new()?;
        info!(locale = %ctx.locale, zone = ?ctx.zone, "Starting screen");

        Ok(ScreenController::new(Arc::new(fetcher), ctx, config.timeout()))
    }
}

/// One entry in the button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Button {
    Language(&'static str, Locale),
    Quit(&'static str),
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Button::Language(caption, _) | Button::Quit(caption) => f.write_str(caption),
        }
    }
}

async fn interactive(mut controller: ScreenController) -> anyhow::Result<()> {
    controller.create();

    loop {
        let screen = controller.screen().await;
        let locale = screen.locale;

        println!();
        println!("{}", screen.sunrise.as_deref().unwrap_or_default());
        println!("{}", screen.sunset.as_deref().unwrap_or_default());

        let mut buttons: Vec<Button> = screen
            .buttons()
            .into_iter()
            .map(|(caption, target)| Button::Language(caption, target))
            .collect();
        buttons.push(Button::Quit(locale.text(Key::QuitButton)));

        let pressed = Select::new(locale.text(Key::Prompt), buttons).prompt();

        match pressed {
            Ok(Button::Language(_, target)) => controller.switch_locale(target),
            Ok(Button::Quit(_))
            | Err(InquireError::OperationCanceled)
            | Err(InquireError::OperationInterrupted) => return Ok(()),
            Err(e) => return Err(e).context("Failed to read button press"),
        }
    }
}
