pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod genres;
pub mod models;
pub mod pager;
pub mod tmdb;
pub mod view;
pub mod watchlist;

pub use catalog::{CatalogFetcher, CatalogSource};
pub use error::{CatalogError, CatalogResult, FailureReason};
pub use genres::GenreResolver;
pub use models::{Entry, EntryId, PageIndex, PageState};
pub use pager::{CatalogCard, CatalogPager, PageTicket};
pub use view::{project, GenreFilter, SortKey, ViewFilter};
pub use watchlist::Watchlist;
