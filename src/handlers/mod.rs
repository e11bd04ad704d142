//! Resource handlers
//!
//! Applications answer catalog, stream, meta and subtitle requests by
//! registering one handler per resource kind and media type.
//!
//! ## Key Components
//!
//! - [`ResourceHandler`] - Trait for implementing handlers as types
//! - [`FnHandler`] - Adapter for plain async closures
//! - [`HandlerRegistry`] - Per-kind map from media type to handler
//! - [`RequestContext`] / [`ResourceRequest`] - What a handler receives
//!
//! ## Example
//!
//! ```rust,ignore
//! use addonbox::handlers::{HandlerError, RequestContext, ResourceRequest};
//!
//! let addon = Addon::builder(manifest)
//!     .stream("movie", |_ctx: RequestContext, req: ResourceRequest| async move {
//!         match req.id.as_str() {
//!             "tt1254207" => Ok(vec![stream]),
//!             _ => Err(HandlerError::NotFound),
//!         }
//!     })
//!     .build()?;
//! ```

mod registry;
mod traits;
mod types;

pub use registry::{HandlerRegistry, RegistryError};
pub(crate) use traits::Serializing;
pub use traits::{FnHandler, HandlerError, JsonHandler, ResourceHandler};
pub use types::{Extra, RequestContext, ResourceKind, ResourceRequest};
