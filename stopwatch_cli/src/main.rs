use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stopwatch::{
    Command, Countdown, ElementId, Event, Instance, InstanceId, Manager,
    Options, Overrides, Page, ServiceHandle, StopwatchService, Surface,
    TICK_INTERVAL, TokioClock, Units, format_duration,
};
use sw_app::ContextProvider;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

type Error = Box<dyn std::error::Error + Send + Sync>;

const ENV_PREFIX: &str = "STOPWATCH_";

#[derive(Debug, Clone, Deserialize)]
struct Config {
    #[serde(flatten)]
    defaults: Options,
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default, deserialize_with = "duration_text")]
    initial_value: Option<String>,
    #[serde(default, deserialize_with = "duration_text")]
    countdown: Option<String>,
}

/// Durations arrive either as `H:M:S` text or, for bare seconds, already
/// parsed as a number.
fn duration_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Text(String),
        Seconds(u64),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|text| match text {
        Text::Text(text) => text,
        Text::Seconds(seconds) => seconds.to_string(),
    }))
}

fn default_tick_interval_ms() -> u64 {
    u64::try_from(TICK_INTERVAL.as_millis()).unwrap_or(500)
}

#[derive(Debug)]
struct AppContext {
    config: Config,
}

impl ContextProvider<Config> for AppContext {
    async fn new(config: Config) -> Self {
        Self { config }
    }
}

/// One line of stdout per tick.
#[derive(Debug, Serialize)]
struct TickLine {
    at: DateTime<Utc>,
    id: InstanceId,
    display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    left: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start,
    Pause,
    Toggle,
    Focus,
    Show,
    Destroy,
    Quit,
}

impl FromStr for Input {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" | "resume" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "toggle" | "click" => Ok(Self::Toggle),
            "focus" => Ok(Self::Focus),
            "show" => Ok(Self::Show),
            "destroy" => Ok(Self::Destroy),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

fn tick_printer(
    countdown: Option<Countdown>,
) -> impl Fn(&Instance, Units, &mut dyn Surface) + Send + Sync + 'static {
    move |instance: &Instance, units: Units, surface: &mut dyn Surface| {
        let left = countdown.map(|countdown| {
            let text = countdown.render(units);
            surface.set_value(countdown.field(), &text);
            text
        });
        let line = TickLine {
            at: Utc::now(),
            id: instance.id(),
            display: format_duration(units),
            left,
        };
        match serde_json::to_string(&line) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!("Failed to serialize tick: {}", e),
        }
    }
}

/// Apply one line of user input. Returns `false` once the user quits.
async fn apply_input(
    handle: &ServiceHandle,
    target: ElementId,
    input: Input,
) -> Result<bool, Error> {
    match input {
        Input::Start => handle.dispatch(target, Command::Start).await?,
        Input::Pause => handle.dispatch(target, Command::Pause).await?,
        Input::Destroy => handle.dispatch(target, Command::Destroy).await?,
        Input::Focus => handle.event(Event::Focus(target)).await?,
        Input::Toggle => {
            let control = handle
                .snapshot(target)
                .await?
                .and_then(|snapshot| snapshot.control);
            match control {
                Some(control) => handle.event(Event::Click(control)).await?,
                None => warn!("No stopwatch attached to {}", target),
            }
        }
        Input::Show => match handle.snapshot(target).await? {
            Some(snapshot) => println!("{}", serde_json::to_string(&snapshot)?),
            None => warn!("No stopwatch attached to {}", target),
        },
        Input::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let context =
        sw_app::create_app_context::<AppContext, Config>(ENV_PREFIX).await?;
    let config = context.config;

    let mut page = Page::new();
    let target = page.add_input(config.initial_value.as_deref().unwrap_or(""));
    let countdown = match config.countdown.as_deref() {
        Some(budget) => {
            let field = page.add_input(budget);
            match Countdown::new(field, budget) {
                Ok(countdown) => Some(countdown),
                Err(e) => {
                    warn!("Ignoring countdown: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let mut manager = Manager::new(page, TokioClock)
        .with_tick_interval(Duration::from_millis(config.tick_interval_ms));
    manager.set_defaults(&config.defaults.to_overrides());

    let (service, handle) = StopwatchService::new(manager, 64);
    let task = tokio::spawn(service.run());

    let mut overrides = Overrides::new().on_tick(tick_printer(countdown));
    if countdown.is_some() {
        overrides = overrides.count_from_input(false);
    }
    let id = handle.attach(target, overrides).await?;
    if let Some(countdown) = countdown {
        handle.pause_on_focus(countdown.field(), target).await?;
    }
    info!("Stopwatch {} ready; commands: start, pause, toggle, focus, show, destroy, quit", id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Input>() {
            Ok(input) => {
                if !apply_input(&handle, target, input).await? {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }

    handle.shutdown().await?;
    let manager = task.await?;
    info!("Exiting with {} stopwatches attached", manager.len());

    Ok(())
}
