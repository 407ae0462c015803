//! Fetch one page of the popular-movies listing and print the annotated cards,
//! then the watchlist projection obtained by keeping every entry on the page.
//! Usage:
//!   cargo run --bin catalog_props -- <page> [search] [genre] [none|rating|popularity]
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinelist::config::Config;
use cinelist::tmdb::TmdbCatalog;
use cinelist::{
    project, CatalogFetcher, GenreFilter, GenreResolver, PageState, SortKey, ViewFilter, Watchlist,
};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage: cargo run --bin catalog_props -- <page> [search] [genre] [none|rating|popularity]"
        );
        std::process::exit(1);
    }
    let page: i64 = args[1].parse().context("page must be an integer")?;
    let genres = GenreResolver::english();
    let filter = ViewFilter {
        search_text: args.get(2).cloned().unwrap_or_default(),
        genre: GenreFilter::from_label(args.get(3).map(String::as_str).unwrap_or(""), &genres),
        sort: args
            .get(4)
            .map(|s| s.parse::<SortKey>())
            .transpose()?
            .unwrap_or_default(),
    };

    let config = Config::from_env()?;
    let fetcher = CatalogFetcher::new(Arc::new(TmdbCatalog::new(&config)?));
    let entries = match fetcher.fetch_page(page).await? {
        PageState::Loaded { entries, .. } => entries,
        PageState::Error { reason } => anyhow::bail!("page {} failed: {}", page, reason),
        PageState::Loading => anyhow::bail!("page {} did not complete", page),
    };

    let mut watchlist = Watchlist::new();
    for entry in &entries {
        watchlist.add(entry.clone())?;
    }
    let cards: Vec<_> = entries
        .iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "title": entry.title,
                "genre": genres.resolve(&entry.genre_ids),
                "rating": entry.rating_label(),
                "popularity": entry.popularity_label(),
                "poster": cinelist::models::poster_url(&config.image_base_url, entry.poster_path.as_deref()),
            })
        })
        .collect();
    let projected: Vec<_> = project(&watchlist.snapshot(), &filter, &genres)
        .into_iter()
        .map(|entry| json!({ "id": entry.id, "title": entry.title }))
        .collect();

    let output = json!({
        "page": page,
        "cards": cards,
        "genres_present": genres.labels_in(watchlist.iter()),
        "filter": filter,
        "projection": projected,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
