mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use panopto_api::{
    ApiSession, AuthSession, ClientCredentialsProvider, CollectorConfig, Folder, FolderWatcher,
    HttpTransport, SessionCollector, default_client,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client = default_client(Duration::from_secs(args.timeout));
    let provider = Arc::new(ClientCredentialsProvider::new(
        &args.server,
        &args.client_id,
        &args.client_secret,
        client.clone(),
    ));
    let auth = AuthSession::new(provider);
    let transport = Arc::new(HttpTransport::with_client(client));
    let api = Arc::new(ApiSession::new(&args.server, auth, transport));

    let cancellation = CancellationToken::new();
    spawn_signal_handler(cancellation.clone());

    match args.command {
        Commands::Export {
            folder_id,
            output,
            page_size,
            viewers,
            columns,
        } => {
            let collector = SessionCollector::new(
                api,
                CollectorConfig {
                    page_size,
                    enrich: viewers,
                    ..Default::default()
                },
                cancellation,
            );

            let sessions = collector.collect(&folder_id).await?;
            if sessions.is_empty() {
                info!(folder = %folder_id, "no recordings found");
            }

            let bytes = panopto_api::to_csv(&sessions, columns.columns(), &args.server)?;
            panopto_api::write_atomic(&output, &bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(count = sessions.len(), path = %output.display(), "export complete");
        }

        Commands::Watch {
            folder_id,
            interval,
        } => {
            let watcher = FolderWatcher::new(
                api,
                folder_id,
                Duration::from_secs(interval),
                cancellation,
            );

            let (tx, mut rx) = mpsc::channel::<Vec<Folder>>(8);
            let printer = tokio::spawn(async move {
                while let Some(folders) = rx.recv().await {
                    for folder in &folders {
                        println!("  {}: {}", folder.id, folder.name);
                    }
                }
            });

            let result = watcher.run(tx).await;
            let _ = printer.await;
            result?;
        }
    }

    Ok(())
}

fn spawn_signal_handler(cancellation: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            cancellation.cancel();
        }
    });
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
