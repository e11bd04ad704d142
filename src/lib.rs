//! Server side of the media addon protocol.
//!
//! An addon answers catalog, stream, meta and subtitle requests through
//! handlers registered per media type. The crate takes care of routing,
//! user-data decoding, the JSON envelope and HTTP caching.
//!
//! ```rust,ignore
//! let addon = Addon::builder(manifest)
//!     .catalog("movie", movie_catalog)
//!     .config(AddonConfig::load()?)
//!     .build()?;
//! addon.run().await?;
//! ```

mod addon;
pub mod api;
pub mod config;
pub mod handlers;
pub mod humanize;
pub mod metadata;
pub mod observability;
pub mod types;
pub mod userdata;

pub use addon::{Addon, AddonBuilder, AddonError};
