use anyhow::Result;
use std::{thread, time::Duration};
use timetable_tracker::{
    tracking::{Notification, NotificationLevel, TrackerSnapshot},
    GenerationController, TrackerConfig,
};
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<String>,
    url: Option<String>,
    token: Option<String>,
    start: bool,
}

impl Args {
    pub fn from_env() -> Result<Self> {
        let mut args = pico_args::Arguments::from_env();
        Ok(Args {
            config: args.opt_value_from_str(["-c", "--config"])?,
            url: args.opt_value_from_str(["-u", "--url"])?,
            token: args.opt_value_from_str(["-t", "--token"])?,
            start: args.contains(["-s", "--start"]),
        })
    }

    fn tracker_config(&self) -> Result<TrackerConfig> {
        let mut config = match (&self.config, &self.url) {
            (Some(path), _) => TrackerConfig::from_toml_file(path)?,
            (None, Some(url)) => TrackerConfig::new(url.as_str()),
            (None, None) => TrackerConfig::from_env()?,
        };
        if let Some(url) = &self.url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        Ok(config)
    }
}

fn print_snapshot(snapshot: &TrackerSnapshot) {
    for (key, progress) in snapshot.algorithms.iter() {
        let details: Vec<String> = progress
            .details
            .iter()
            .map(|(field, value)| format!("{}={}", field, value))
            .collect();
        let status = format!("{:?}", progress.status);
        println!("  {:<24} {:<8} {}", key.name(), status, details.join(" "));
    }
    if let Some(entry) = snapshot.logs.last() {
        println!("  last log: {}", entry.message);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timetable_tracker=info")),
        )
        .init();

    let args = Args::from_env()?;
    let config = args.tracker_config()?;
    let mut controller = GenerationController::new(config.server()?, |notification: Notification| {
        match notification.level {
            NotificationLevel::Success => println!("✔ {}", notification.message),
            NotificationLevel::Error => eprintln!("✘ {}", notification.message),
        }
    })
    .with_poll_interval(config.poll_interval());

    if args.start {
        if controller.start().is_err() {
            return Ok(());
        }
    } else if controller.attach()?.is_none() {
        println!("No timetable generation is running. Run again with -s or --start to trigger one.");
        return Ok(());
    }

    while controller.is_polling() {
        thread::sleep(Duration::from_secs(1));
        print_snapshot(&controller.snapshot());
    }
    print_snapshot(&controller.snapshot());
    Ok(())
}
