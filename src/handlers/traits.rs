use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::types::{RequestContext, ResourceRequest};

/// Errors a resource handler can report
///
/// `NotFound` and `BadRequest` reach the client as 404 and 400. Everything
/// else is logged and answered with a bare 500.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("deadline exceeded")]
    Timeout,
    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

/// Resource handler producing results of type `T`
///
/// One handler is registered per resource kind and media type. Handlers
/// run concurrently and must honour `ctx.deadline`.
#[async_trait]
pub trait ResourceHandler<T>: Send + Sync
where
    T: Send + 'static,
{
    async fn handle(
        &self,
        ctx: RequestContext,
        request: ResourceRequest,
    ) -> Result<T, HandlerError>;
}

/// Adapter turning an async closure into a [`ResourceHandler`]
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F, Fut> ResourceHandler<T> for FnHandler<F>
where
    T: Send + 'static,
    F: Fn(RequestContext, ResourceRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: RequestContext,
        request: ResourceRequest,
    ) -> Result<T, HandlerError> {
        (self.f)(ctx, request).await
    }
}

/// Type-erased handler returning the serialized result
///
/// The registry stores these so all four kinds share one dispatch path.
#[async_trait]
pub trait JsonHandler: Send + Sync {
    async fn handle_json(
        &self,
        ctx: RequestContext,
        request: ResourceRequest,
    ) -> Result<Vec<u8>, HandlerError>;
}

pub(crate) struct Serializing<T> {
    inner: Arc<dyn ResourceHandler<T>>,
}

impl<T: Send + 'static> Serializing<T> {
    pub(crate) fn new(inner: Arc<dyn ResourceHandler<T>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T> JsonHandler for Serializing<T>
where
    T: Serialize + Send + 'static,
{
    async fn handle_json(
        &self,
        ctx: RequestContext,
        request: ResourceRequest,
    ) -> Result<Vec<u8>, HandlerError> {
        let value = self.inner.handle(ctx, request).await?;
        Ok(serde_json::to_vec(&value)?)
    }
}
