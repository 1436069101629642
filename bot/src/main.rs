mod market;
mod negotiator;

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use negotiator::{NegotiationOutcome, Negotiator, Settings, MIN_BID};
use std::process::ExitCode;
use ubisoft::{Config, HttpClient};

/// Buys a marketplace item at the lowest price a seller accepts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Catalog URL of the item, containing its itemId
    #[arg(env = "ITEM_URL")]
    item_url: String,

    /// Never bid more than this many credits
    #[arg(long, env = "MAX_PRICE", value_parser = clap::value_parser!(u64).range(MIN_BID..))]
    max_price: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    common::setup_env();
    let args = Args::parse();

    let client = HttpClient::new(Config::from_env()?)?;
    let negotiator = Negotiator::new(
        client,
        Settings {
            max_price: args.max_price,
        },
    );

    let outcome = negotiator.run(&args.item_url).await?;
    report(&outcome);

    Ok(ExitCode::from(outcome.exit_code()))
}

fn report(outcome: &NegotiationOutcome) {
    if outcome.needs_attention() {
        error!("{outcome}");
    } else if let NegotiationOutcome::OrderRejected { .. } = outcome {
        warn!("{outcome}");
    } else {
        info!("{outcome}");
    }
}
