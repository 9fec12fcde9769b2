use anyhow::{Context, Result};
use clap::Subcommand;

use super::Engine;

#[derive(Subcommand, Debug)]
pub enum DefaultsCmd {
    /// Print the active defaults generation, digest and contents summary.
    Show,

    /// Fetch a payload from a URL (http, https or file) and install it.
    Fetch {
        #[arg(long)]
        url: String,
    },
}

pub async fn run(engine: &Engine, cmd: DefaultsCmd) -> Result<()> {
    match cmd {
        DefaultsCmd::Show => {
            show(engine);
            Ok(())
        }
        DefaultsCmd::Fetch { url } => {
            let generation = engine
                .defaults()
                .refresh_now(&url)
                .await
                .with_context(|| format!("defaults fetch failed: {url}"))?;
            println!("defaults_fetch=OK");
            println!("source={url}");
            println!("installed_generation={generation}");
            show(engine);
            Ok(())
        }
    }
}

fn show(engine: &Engine) {
    let snapshot = engine.defaults().snapshot();
    println!("generation={}", snapshot.generation);
    println!("digest={}", snapshot.digest);
    println!("installed_at={}", snapshot.installed_at.to_rfc3339());
    println!("download={}", engine.defaults().download_config());
    for (name, dates) in &snapshot.data.holidays {
        println!("holiday_list={name} dates={}", dates.len());
    }
    for (name, dates) in &snapshot.data.short_days {
        println!("short_day_list={name} dates={}", dates.len());
    }
    for (name, entry) in &snapshot.data.schedules {
        let venues: Vec<&str> = entry.venues.keys().map(String::as_str).collect();
        println!("schedule={name} venues={}", venues.join(","));
    }
}
