#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod error;
mod extract;
mod prelude;
mod profile;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Resolve OCR token artifacts into structured valuation-report records"
)]
pub struct App {
    #[command(subcommand)]
    pub command: extract::Commands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "FIELDEX_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    extract::run(app.command, app.global)
        .await
        .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
