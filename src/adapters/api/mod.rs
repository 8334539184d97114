//! Auction Metadata API Adapter
//!
//! Sub-modules:
//! - `metadata`: HTTP client implementing `MetadataLookup`
//! - `types`: API response types

pub mod metadata;
pub mod types;

pub use metadata::MetadataApi;
