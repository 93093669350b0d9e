mod app;
mod clock;
mod command;
mod config;
mod geocode;
mod location;
mod search;
mod settings;
mod storage;
mod store;
mod ticker;
mod view;

use crate::{
    app::{App, Flow, Screen},
    clock::SystemClock,
    config::Config,
    geocode::Geocoder,
    storage::FileStorage,
    store::LocationStore,
};
use anyhow::Context;
use log::{debug, info, LevelFilter};
use std::{io, process, sync::Arc};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, so they stay out of the rendered views
    env_logger::builder()
        .filter_module("worldclock", LevelFilter::Info)
        .parse_default_env()
        .init();

    // Every mutation is persisted as it happens, so there's nothing to flush
    ctrlc::set_handler(|| {
        info!("Exiting");
        process::exit(0);
    })
    .context("Error setting Ctrl-C handler")?;

    let config = Config::load()?;
    let storage = FileStorage::new(&config.data_dir)?;
    let store = LocationStore::load(Box::new(storage))?;
    let mut app = App::new(
        store,
        Arc::new(Geocoder::new(&config)),
        Arc::new(SystemClock),
        Screen::stdout(),
    );

    app.greet()?;
    app.prompt();
    for line in io::stdin().lines() {
        let line = line.context("Error reading input")?;
        if !line.trim().is_empty() {
            match app.handle(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                // Bad input shouldn't kill the app, just tell the user
                Err(err) => {
                    debug!("Command {line:?} failed: {err:?}");
                    println!("{err}");
                }
            }
        }
        app.prompt();
    }

    info!("Exiting");
    Ok(())
}
