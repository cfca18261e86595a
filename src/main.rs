use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchdeck::{
    api::ListEndpoint,
    config::Config,
    models::star_rating,
    navigation::History,
    services::{AuthStatus, LoadOutcome},
    AppContext,
};

const USAGE: &str = "usage: watchdeck <endpoint> [query-string]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchdeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let mut args = std::env::args().skip(1);
    let endpoint: ListEndpoint = match args.next() {
        Some(name) => name
            .parse::<ListEndpoint>()
            .map_err(|e| anyhow::anyhow!("{}\n{}", e, USAGE))?,
        None => ListEndpoint::PopularMovies,
    };
    let location = args.next().unwrap_or_default();

    let context = AppContext::new(config)?;

    match context.gate.resolve().await {
        AuthStatus::Authenticated(user) => tracing::info!(username = %user.username, "Signed in"),
        _ => tracing::info!("Browsing anonymously"),
    }

    let history = Arc::new(History::new(format!("/{}", endpoint.name())));
    let controller = context.list_controller(endpoint, history);

    if controller.on_location_change(&location).await == LoadOutcome::Stale {
        return Ok(());
    }

    let view = controller.view();
    if let Some(error) = &view.error {
        eprintln!("Failed to load {}: {}", endpoint, error);
        return Ok(());
    }

    for item in &view.items {
        match item.vote_average() {
            Some(vote) => println!(
                "{:>8}  {:.1}★  {}",
                item.id(),
                star_rating(vote),
                item.display_name()
            ),
            None => println!("{:>8}        {}", item.id(), item.display_name()),
        }
    }
    println!("page {} of {}", view.page, view.total_pages.unwrap_or(view.page));

    Ok(())
}
