use clap::Parser;
use mib_agent::{
    AccessGate, ObjectStore, Registry,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    notify::NotificationDispatcher,
    sampler::{Sampler, SamplerHandle, SystemCpu},
    util::get_port,
};
use tokio::sync::watch;
use tracing::{error, info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults apply when omitted)
    #[arg(short)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("mib_agent", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    };

    let registry = Registry::scalar_agent(&config.mib.base_oid)?;
    let gate = AccessGate::from_config(&config.communities);
    let store = ObjectStore::open(registry, gate, config.state_file.clone()).await?;

    let dispatcher = NotificationDispatcher::from_config(&config, store.registry())?;
    let sampler = Sampler::new(store.clone(), Box::new(SystemCpu::new()), dispatcher)?;
    let sampler = SamplerHandle::spawn(sampler, config.sampler.period());

    let mut api_config = ApiConfig::from(&config.api);
    if let Some(port) = get_port() {
        api_config.bind_addr.set_port(port);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let addr = spawn_api_server(api_config, ApiState::new(store.clone()), shutdown_rx).await?;

    log_catalogue(&config, &store, addr).await;

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");

    let _ = shutdown_tx.send(true);

    if let Err(e) = sampler.shutdown().await {
        error!("failed to stop sampler: {e:#}");
    }

    if let Err(e) = store.save().await {
        error!("failed to save state on shutdown: {e}");
    }

    info!("agent stopped");
    Ok(())
}

async fn log_catalogue(config: &Config, store: &ObjectStore, addr: std::net::SocketAddr) {
    info!("agent listening on {addr}");
    info!(
        "communities: read-only {:?}, read-write {:?}",
        config.communities.read_only, config.communities.read_write
    );
    info!("base OID: {}", store.registry().base());
    info!("state file: {}", config.state_file.display());
    info!(
        "sampling every {:?}, trap target: {}, mail relay: {}",
        config.sampler.period(),
        config.trap.as_ref().map_or("none", |trap| trap.url.as_str()),
        match (&config.smtp, &config.mail) {
            (Some(smtp), _) => format!("smtp://{}:{}", smtp.host, smtp.port),
            (None, Some(mail)) => mail.url.clone(),
            (None, None) => String::from("none"),
        },
    );

    let values = store.values().await;
    for (object, value) in store.registry().objects().iter().zip(&values) {
        info!(
            "  [{}] {} {} = {value}",
            object.access.short(),
            object.oid,
            object.name
        );
    }
}
