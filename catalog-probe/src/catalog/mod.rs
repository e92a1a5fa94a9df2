//! Remote catalog access.
//!
//! [`CatalogProvider`] is the seam between the service layer and a catalog
//! backend. [`CatalogClient`] talks to a tenant over HTTPS with OAuth bearer
//! tokens; [`MockCatalog`] serves deterministic demo data.

mod auth;
mod client;
mod error;
mod metadata;
mod mock;
mod provider;
mod types;

pub use auth::{ClientCredentials, StaticToken, TokenSource};
pub use client::CatalogClient;
pub use error::{CatalogError, CatalogResult};
pub use metadata::parse_relational_metadata;
pub use mock::MockCatalog;
pub use provider::CatalogProvider;
pub use types::{Asset, AssetRef, ColumnInfo, RelationalQuery, Space};
