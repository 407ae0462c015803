use crate::catalog::{CatalogFetcher, CatalogSource};
use crate::config::Config;
use crate::error::{CatalogError, FailureReason};
use crate::genres::GenreResolver;
use crate::models::{EntryId, PageIndex, PageState};
use crate::pager::{CatalogCard, CatalogPager, PageTicket};
use crate::tmdb::TmdbCatalog;
use crate::view::{project, GenreFilter, SortKey, ViewFilter};
use crate::watchlist::Watchlist;
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info};

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Everything one user mutates while browsing. Dropped with the process.
#[derive(Debug, Default)]
pub struct Session {
    pub pager: CatalogPager,
    pub watchlist: Watchlist,
}

#[derive(Clone)]
pub struct AppState {
    pub fetcher: CatalogFetcher,
    pub genres: Arc<GenreResolver>,
    pub image_base: Arc<str>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        genres: GenreResolver,
        image_base: impl Into<String>,
    ) -> Self {
        Self {
            fetcher: CatalogFetcher::new(source),
            genres: Arc::new(genres),
            image_base: Arc::from(image_base.into()),
            session: Arc::new(Mutex::new(Session::default())),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let source: Arc<dyn CatalogSource> = Arc::new(TmdbCatalog::new(&config)?);
    let state = AppState::new(
        source,
        GenreResolver::english(),
        config.image_base_url.clone(),
    );
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog))
        .route("/catalog/next", post(next_page))
        .route("/catalog/previous", post(previous_page))
        .route("/catalog/retry", post(retry_page))
        .route("/genres", get(list_genres))
        .route("/watchlist", get(get_watchlist))
        .route("/watchlist/toggle/:id", post(toggle_entry))
        .route("/watchlist/:id", delete(remove_entry))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub page_index: PageIndex,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    pub cards: Vec<CatalogCard>,
}

#[derive(Debug, Serialize)]
pub struct WatchlistView {
    pub total: usize,
    pub genres: Vec<String>,
    pub filter: ViewFilter,
    pub entries: Vec<CatalogCard>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchlistQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub sort: Option<String>,
}

async fn get_catalog(State(state): State<AppState>) -> Json<CatalogView> {
    // First visit mounts the listing on page 1.
    navigate(&state, |pager| pager.is_idle().then(|| pager.start())).await
}

async fn next_page(State(state): State<AppState>) -> Json<CatalogView> {
    navigate(&state, |pager| Some(pager.next_page())).await
}

async fn previous_page(State(state): State<AppState>) -> Json<CatalogView> {
    navigate(&state, CatalogPager::previous_page).await
}

async fn retry_page(State(state): State<AppState>) -> Json<CatalogView> {
    navigate(&state, |pager| Some(pager.retry())).await
}

async fn navigate<F>(state: &AppState, action: F) -> Json<CatalogView>
where
    F: FnOnce(&mut CatalogPager) -> Option<PageTicket>,
{
    let ticket = {
        let mut session = state.session.lock().await;
        action(&mut session.pager)
    };
    if let Some(ticket) = ticket {
        // The lock is released while the request is in flight so that a
        // newer navigation can supersede this one.
        let outcome = state.fetcher.fetch(ticket.page()).await;
        let applied = state.session.lock().await.pager.resolve(ticket, outcome);
        if !applied {
            debug!("Page {} superseded before it arrived", ticket.page());
        }
    }
    Json(render_catalog(state).await)
}

async fn render_catalog(state: &AppState) -> CatalogView {
    let session = state.session.lock().await;
    let (status, reason) = match session.pager.state() {
        None => ("idle", None),
        Some(PageState::Loading) => ("loading", None),
        Some(PageState::Error { reason }) => ("error", Some(*reason)),
        Some(PageState::Loaded { .. }) => ("loaded", None),
    };
    CatalogView {
        page_index: session.pager.page_index(),
        status,
        reason,
        cards: session
            .pager
            .cards(&session.watchlist, &state.genres, &state.image_base),
    }
}

async fn list_genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.genres.list_known_labels())
}

async fn get_watchlist(
    State(state): State<AppState>,
    Query(query): Query<WatchlistQuery>,
) -> Result<Json<WatchlistView>, ApiError> {
    let sort: SortKey = query.sort.as_deref().unwrap_or_default().parse()?;
    let filter = ViewFilter {
        search_text: query.search.unwrap_or_default(),
        genre: GenreFilter::from_label(query.genre.as_deref().unwrap_or_default(), &state.genres),
        sort,
    };

    let snapshot = state.session.lock().await.watchlist.snapshot();
    let entries = project(&snapshot, &filter, &state.genres)
        .into_iter()
        .map(|entry| CatalogCard::new(entry, true, &state.genres, &state.image_base))
        .collect();
    Ok(Json(WatchlistView {
        total: snapshot.len(),
        genres: state.genres.labels_in(&snapshot),
        filter,
        entries,
    }))
}

async fn toggle_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: EntryId = id.parse()?;
    let mut session = state.session.lock().await;
    let Session { pager, watchlist } = &mut *session;
    let in_watchlist = pager.toggle_membership(&id, watchlist)?;
    info!(
        "Entry {} {} watchlist ({} kept)",
        id,
        if in_watchlist { "added to" } else { "removed from" },
        watchlist.len()
    );
    Ok(Json(json!({ "id": id, "in_watchlist": in_watchlist })))
}

async fn remove_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: EntryId = id.parse()?;
    let mut session = state.session.lock().await;
    if let Some(entry) = session.watchlist.get(&id).cloned() {
        session.watchlist.toggle(entry)?;
        info!("Entry {} removed from watchlist", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// HTTP mapping of engine errors.
#[derive(Debug)]
pub struct ApiError(CatalogError);

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Network(_)
            | CatalogError::Service { .. }
            | CatalogError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
