//! Turning a query plan into filtered data.
//!
//! [`select_datasets`] picks the datasets, a [`DatasetSource`] resolves each
//! one through the cache → remote → fixture chain, [`filter_table`] narrows
//! rows, and [`DataFetchOrchestrator`] ties the steps together per request.
//! [`summarize`] reduces the result to prompt-sized text.

mod fetcher;
mod filter;
mod orchestrator;
mod select;
mod summary;

pub use fetcher::{DatasetFetcher, DatasetSource, FetchOutcome};
pub use filter::{filter_payload, filter_table};
pub use orchestrator::{AggregatedResult, DataFetchOrchestrator, DatasetEntry};
pub use select::select_datasets;
pub use summary::{SUMMARY_CHAR_LIMIT, TRUNCATION_MARKER, summarize};
