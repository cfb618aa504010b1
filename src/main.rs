use anyhow::Context;
use clap::Parser;
use ping_ferris::{
    AppState, app, argument_parsing::Args, probe::Prober, sites::load_sites, store::Store,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ping_ferris=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let sites = load_sites(&args.sites).context("failed to load the site list")?;
    info!(sites = sites.len(), path = %args.sites.display(), "loaded site list");

    let store = Store::connect(&args)
        .await
        .context("failed to connect to the database")?;
    store
        .migrate()
        .await
        .context("failed to migrate the ping_history table")?;

    let prober = Prober::new(args.probe_timeout(), args.slow_threshold())
        .context("failed to build the probe client")?;

    let app = app(AppState::new(store, prober, sites));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
