//! Read strategy implementations using enum dispatch.

use std::future::Future;

use crate::error::Result;

/// Read strategy enum - determines cache/backend access pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Check cache first, fall back to the search backend on miss
    #[default]
    CacheFirst,
    /// Only query the search backend, skip cache
    BackendOnly,
    /// Only read from cache, never hit the backend
    CacheOnly,
    /// Always query the backend, populate cache on success
    ReadThrough,
}

impl ReadStrategy {
    /// Execute a read operation according to the strategy.
    ///
    /// - `cache_fn`: probe the cache; an error counts as a miss
    /// - `backend_fn`: query the source of truth; `None` means not found
    /// - `fill_fn`: store a found value; failures are logged and ignored
    ///
    /// Nothing is filled when the backend reports `None`, so absence is
    /// never cached.
    ///
    /// # Errors
    ///
    /// Returns backend errors, and cache errors under [`ReadStrategy::CacheOnly`].
    pub async fn read<T, CacheFut, BackendFut, FillFut>(
        &self,
        cache_fn: impl FnOnce() -> CacheFut,
        backend_fn: impl FnOnce() -> BackendFut,
        fill_fn: impl FnOnce(&T) -> FillFut,
    ) -> Result<Option<T>>
    where
        CacheFut: Future<Output = Result<Option<T>>>,
        BackendFut: Future<Output = Result<Option<T>>>,
        FillFut: Future<Output = Result<()>>,
    {
        match self {
            Self::CacheFirst => {
                // Try cache first
                match cache_fn().await {
                    Ok(Some(value)) => return Ok(Some(value)),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Cache error, querying backend");
                    }
                }

                let result = backend_fn().await?;
                fill(result.as_ref(), fill_fn).await;
                Ok(result)
            }

            Self::BackendOnly => backend_fn().await,

            Self::CacheOnly => cache_fn().await,

            Self::ReadThrough => {
                let result = backend_fn().await?;
                fill(result.as_ref(), fill_fn).await;
                Ok(result)
            }
        }
    }
}

async fn fill<T, FillFut>(value: Option<&T>, fill_fn: impl FnOnce(&T) -> FillFut)
where
    FillFut: Future<Output = Result<()>>,
{
    if let Some(value) = value {
        if let Err(e) = fill_fn(value).await {
            tracing::warn!(error = %e, "Failed to populate cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts every event emitted while installed
    struct EventCount(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for EventCount {
        fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn no_fill(_: &i32) -> std::future::Ready<Result<()>> {
        std::future::ready(Ok(()))
    }

    #[tokio::test]
    async fn test_cache_first_hit() {
        let strategy = ReadStrategy::CacheFirst;

        let result = strategy
            .read(|| async { Ok(Some(42)) }, || async { Ok(Some(99)) }, no_fill)
            .await
            .unwrap();

        assert_eq!(result, Some(42)); // Should return cache value
    }

    #[tokio::test]
    async fn test_cache_first_miss_fills() {
        let strategy = ReadStrategy::CacheFirst;
        let filled = AtomicBool::new(false);
        let flag = &filled;

        let result = strategy
            .read(
                || async { Ok(None) },
                || async { Ok(Some(99)) },
                |value: &i32| {
                    assert_eq!(*value, 99);
                    flag.store(true, Ordering::SeqCst);
                    async { Ok(()) }
                },
            )
            .await
            .unwrap();

        assert_eq!(result, Some(99)); // Should return backend value
        assert!(filled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_hit_and_miss_are_silent() {
        // the services log hits and misses with their key
        let events = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(EventCount(events.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);
        let strategy = ReadStrategy::CacheFirst;

        let hit = strategy
            .read(|| async { Ok(Some(1)) }, || async { Ok(Some(2)) }, no_fill)
            .await
            .unwrap();
        let miss = strategy
            .read(|| async { Ok(None) }, || async { Ok(Some(2)) }, no_fill)
            .await
            .unwrap();

        assert_eq!((hit, miss), (Some(1), Some(2)));
        assert_eq!(events.load(Ordering::SeqCst), 0);

        strategy
            .read(
                || async { Err(PersistenceError::CacheUnavailable("refused".into())) },
                || async { Ok(Some(2)) },
                no_fill,
            )
            .await
            .unwrap();
        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_error_degrades_to_miss() {
        let strategy = ReadStrategy::CacheFirst;

        let result = strategy
            .read(
                || async { Err(PersistenceError::CacheUnavailable("refused".into())) },
                || async { Ok(Some(7)) },
                no_fill,
            )
            .await
            .unwrap();

        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_fill_error_is_swallowed() {
        let strategy = ReadStrategy::CacheFirst;

        let result = strategy
            .read(
                || async { Ok(None) },
                || async { Ok(Some(7)) },
                |_: &i32| async { Err(PersistenceError::CacheUnavailable("read-only".into())) },
            )
            .await
            .unwrap();

        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_absent_is_not_filled() {
        let strategy = ReadStrategy::CacheFirst;
        let filled = AtomicBool::new(false);
        let flag = &filled;

        let result: Option<i32> = strategy
            .read(
                || async { Ok(None) },
                || async { Ok(None) },
                |_: &i32| {
                    flag.store(true, Ordering::SeqCst);
                    async { Ok(()) }
                },
            )
            .await
            .unwrap();

        assert_eq!(result, None);
        assert!(!filled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let strategy = ReadStrategy::CacheFirst;

        let result: Result<Option<i32>> = strategy
            .read(
                || async { Ok(None) },
                || async { Err(PersistenceError::BackendUnavailable("down".into())) },
                no_fill,
            )
            .await;

        assert!(matches!(result, Err(PersistenceError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_backend_only() {
        let strategy = ReadStrategy::BackendOnly;

        let result = strategy
            .read(|| async { Ok(Some(42)) }, || async { Ok(Some(99)) }, no_fill)
            .await
            .unwrap();

        assert_eq!(result, Some(99)); // Should skip cache
    }

    #[tokio::test]
    async fn test_cache_only_surfaces_cache_errors() {
        let strategy = ReadStrategy::CacheOnly;

        let result: Result<Option<i32>> = strategy
            .read(
                || async { Err(PersistenceError::CacheUnavailable("refused".into())) },
                || async { Ok(Some(99)) },
                no_fill,
            )
            .await;

        assert!(result.is_err());
    }
}
