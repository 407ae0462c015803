use crate::error::{CatalogResult, FailureReason};
use crate::models::{Entry, PageIndex, PageState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// A paginated listing of catalog entries.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn popular_page(&self, page: PageIndex) -> CatalogResult<Vec<Entry>>;
}

/// Issues one request per page and folds the outcome into a `PageState`.
/// Never retries on its own.
#[derive(Clone)]
pub struct CatalogFetcher {
    source: Arc<dyn CatalogSource>,
}

impl CatalogFetcher {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    pub async fn fetch_page(&self, page_index: i64) -> CatalogResult<PageState> {
        let page = PageIndex::new(page_index)?;
        Ok(self.fetch(page).await)
    }

    pub async fn fetch(&self, page: PageIndex) -> PageState {
        match self.source.popular_page(page).await {
            Ok(entries) => {
                info!("Loaded catalog page {} ({} entries)", page, entries.len());
                PageState::Loaded {
                    page_index: page,
                    entries,
                }
            }
            Err(err) => {
                warn!("Failed to load catalog page {}: {}", page, err);
                // A source reporting a contract error is shown as a server failure.
                let reason = err.failure_reason().unwrap_or(FailureReason::Server);
                PageState::Error { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Outcome {
        Ok,
        Network,
        Status(u16),
    }

    struct CountingSource {
        calls: AtomicUsize,
        outcome: Outcome,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn popular_page(&self, page: PageIndex) -> CatalogResult<Vec<Entry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Ok => Ok(vec![Entry::new(i64::from(page.get()) * 100, "Entry")]),
                Outcome::Network => Err(CatalogError::Network("connection reset".into())),
                Outcome::Status(status) => Err(CatalogError::Service {
                    status,
                    message: "unavailable".into(),
                }),
            }
        }
    }

    fn counting(outcome: Outcome) -> (CatalogFetcher, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            outcome,
        });
        (CatalogFetcher::new(source.clone()), source)
    }

    #[tokio::test]
    async fn non_positive_page_is_rejected_before_any_request() {
        let (fetcher, source) = counting(Outcome::Ok);
        for bad in [0, -1, i64::MIN] {
            let err = fetcher.fetch_page(bad).await.unwrap_err();
            assert!(matches!(err, CatalogError::InvalidArgument(_)));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_yields_loaded_page() {
        let (fetcher, source) = counting(Outcome::Ok);
        match fetcher.fetch_page(2).await.unwrap() {
            PageState::Loaded {
                page_index,
                entries,
            } => {
                assert_eq!(page_index.get(), 2);
                assert_eq!(entries.len(), 1);
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn network_failure_becomes_error_state_without_retry() {
        let (fetcher, source) = counting(Outcome::Network);
        assert_eq!(
            fetcher.fetch_page(1).await.unwrap(),
            PageState::Error {
                reason: FailureReason::Network
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_failure_is_reported_as_server() {
        let (fetcher, _) = counting(Outcome::Status(503));
        assert_eq!(
            fetcher.fetch_page(4).await.unwrap(),
            PageState::Error {
                reason: FailureReason::Server
            }
        );
    }
}
