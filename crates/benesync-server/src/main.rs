//! `benesync` command-line entry point

use anyhow::Context;
use benesync_pusher::{PushOutcome, SignatureCache, SyncClient};
use benesync_server::{routes, run_schedule, Service, ServiceConfig};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Service configuration file (TOML)")
}

fn cli() -> Command {
    Command::new("benesync")
        .version(benesync_server::VERSION)
        .about("Beneficiary record sync and report delivery")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the ingestion endpoint (and scheduled delivery, if configured)")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("deliver")
                .about("Run report delivery once")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("ingest")
                .about("Ingest a JSON batch file and print the response")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of records"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("push")
                .about("Push new or changed records to an ingestion endpoint")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of dashboard records"),
                )
                .arg(
                    Arg::new("url")
                        .long("url")
                        .required(true)
                        .help("Ingestion endpoint URL"),
                )
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .default_value("sync_cache.json")
                        .value_parser(value_parser!(PathBuf))
                        .help("Signature cache file"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

async fn load_config(args: &ArgMatches) -> anyhow::Result<ServiceConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => Ok(ServiceConfig::load(path).await?),
        None => Ok(ServiceConfig::default().apply_env()?),
    }
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let service = Arc::new(Service::from_config(config).await?);
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    let scheduler = service.config().delivery.schedule_interval().map(|period| {
        let mut stop = stop_rx.clone();
        tokio::spawn(run_schedule(service.workflow().clone(), period, async move {
            let _ = stop.changed().await;
        }))
    });

    let mut stop = stop_rx.clone();
    let (addr, server) = warp::serve(routes(service.clone()))
        .try_bind_with_graceful_shutdown(service.config().server.bind, async move {
            let _ = stop.changed().await;
        })
        .context("cannot bind ingestion endpoint")?;
    tracing::info!(%addr, "ingestion endpoint listening");
    let server = tokio::spawn(server);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    let _ = stop_tx.send(true);

    server.await?;
    if let Some(scheduler) = scheduler {
        scheduler.await?;
    }
    Ok(())
}

async fn deliver(config: ServiceConfig) -> anyhow::Result<()> {
    let service = Service::from_config(config).await?;
    let report = service.workflow().run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn ingest(config: ServiceConfig, file: &Path) -> anyhow::Result<bool> {
    let body = tokio::fs::read(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let service = Service::from_config(config).await?;
    let response = service.ingest(&body).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}

async fn push(file: &Path, url: &str, cache: &Path) -> anyhow::Result<()> {
    let body = tokio::fs::read(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let records = benesync_ingest::parse_batch(&body)?;

    let mut cache = SignatureCache::load(cache).await;
    match SyncClient::new(url).push(&mut cache, &records).await? {
        PushOutcome::UpToDate => println!("No new or changed records"),
        PushOutcome::Pushed { count, message } => println!("Pushed {count} records: {message}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("serve", args)) => serve(load_config(args).await?).await,
        Some(("deliver", args)) => deliver(load_config(args).await?).await,
        Some(("ingest", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing batch file")?;
            let ok = ingest(load_config(args).await?, file).await?;
            std::process::exit(if ok { 0 } else { 1 });
        }
        Some(("push", args)) => {
            let file = args
                .get_one::<PathBuf>("file")
                .context("missing record file")?;
            let url = args.get_one::<String>("url").context("missing --url")?;
            let cache = args
                .get_one::<PathBuf>("cache")
                .context("missing --cache")?;
            push(file, url, cache).await
        }
        _ => Ok(()),
    }
}
