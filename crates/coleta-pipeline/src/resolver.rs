//! Option resolution for pipeline stages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ResolutionError;
use crate::stage::Choice;

/// Maps an upstream selection to the options of the next stage.
///
/// The root stage is resolved with `None`. Implementations typically wrap a
/// network client, the pipeline never cares where options come from.
#[async_trait]
pub trait StageResolver: Send + Sync {
    async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError>;
}

#[async_trait]
impl<R: StageResolver + ?Sized> StageResolver for Arc<R> {
    async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        (**self).resolve(input).await
    }
}

/// A resolver with a fixed option list, independent of its input.
///
/// Useful for stages whose options are known up front and as a building
/// block in tests.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    options: Vec<Choice>,
}

impl StaticResolver {
    pub fn new(options: Vec<Choice>) -> Self {
        Self { options }
    }

    pub fn keyed<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(keys.into_iter().map(Choice::keyed).collect())
    }
}

#[async_trait]
impl StageResolver for StaticResolver {
    async fn resolve(&self, _input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        Ok(self.options.clone())
    }
}

/// Memoizes another resolver by input key.
///
/// Region and locality listings change on the scale of years, so re-picking
/// a value the user already visited should not hit the directory again.
/// Failures are never cached, a retry always reaches the inner resolver.
pub struct CachedResolver<R> {
    inner: R,
    cache: Mutex<HashMap<Option<String>, Vec<Choice>>>,
}

impl<R> CachedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<R: StageResolver> StageResolver for CachedResolver<R> {
    async fn resolve(&self, input: Option<&Choice>) -> Result<Vec<Choice>, ResolutionError> {
        let key = input.map(|choice| choice.key.clone());
        if let Some(options) = self.cache.lock().get(&key).cloned() {
            debug!(input = key.as_deref().unwrap_or("<root>"), "serving cached options");
            return Ok(options);
        }
        let options = self.inner.resolve(input).await?;
        self.cache.lock().insert(key, options.clone());
        Ok(options)
    }
}
