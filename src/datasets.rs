//! Dataset sources: the registry, the on-disk cache, the remote API client,
//! fixtures and sample data.

mod cache;
mod fixtures;
mod registry;
mod remote;
pub mod sample_data;
mod table;

pub use cache::{CacheError, DatasetCache};
pub use fixtures::fixture;
pub use registry::{DatasetDescriptor, DatasetKey, DatasetListing, DatasetRegistry};
pub use remote::{
    DataGovClient, DataGovClientBuilder, FETCH_TIMEOUT, FetchError, RECORD_LIMIT, RemoteSource,
};
pub use table::{DatasetPayload, Row, Table, cell_text};
