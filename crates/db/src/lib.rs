pub mod attachment;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use attachment::{AttachmentFetchError, AttachmentRecord};
pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use fixtures::{SeedDataset, SeedResult};
pub use repositories::{
    CatalogRepository, InMemoryQuotationRepository, NewQuotation, QuotationRepository,
    RepositoryError, SqlCatalogRepository, SqlQuotationRepository,
};
