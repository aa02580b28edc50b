extern crate env_logger;
#[macro_use]
extern crate log;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;

use porter_client::{input, output, PredictionClient, PredictionError};

mod cli;

use cli::Cli;

async fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    info!("porter v{}", cli::VERSION);

    let sequence = match (&cli.sequence, &cli.fasta) {
        (_, Some(path)) => {
            info!("Reading sequence from {path}");
            input::read_fasta_sequence(path)?
        }
        (Some(sequence), None) => sequence.clone(),
        (None, None) => bail!("You must enter your sequence"),
    };

    if sequence.trim().is_empty() {
        bail!("The sequence is empty");
    }

    let client = PredictionClient::new(cli.client_config())?;

    // Ctrl-C stops polling instead of killing the process mid-write
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling prediction");
            let _ = cancel_tx.send(true);
        }
    });

    let prediction = client
        .predict_cancellable(&sequence, cancel_rx)
        .await
        .context("Could not fetch results from Porter/PaleAle")?;

    let mut writer = output::get_writer(&cli.output)?;
    output::write_prediction(&mut writer, &prediction, cli.format)?;

    info!("Completed successfully.");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = try_main().await {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        let code = err
            .downcast_ref::<PredictionError>()
            .map_or(1, PredictionError::exit_code);
        std::process::exit(code);
    }
}
