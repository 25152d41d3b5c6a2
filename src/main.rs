mod app;
mod config;
mod data;
mod pager;
mod prompt;
mod stats;

#[cfg(test)]
mod test_support;

use std::io;

use anyhow::Context;
use app::BikeshareApp;
use config::CityTable;
use prompt::Console;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cities = CityTable::from_env().context("loading city table")?;
    log::debug!("city table: {cities:?}");

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout().lock());
    BikeshareApp::new(cities).run(&mut console)
}
