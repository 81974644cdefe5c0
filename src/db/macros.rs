/// A macro wrapping the compute-on-miss caching pattern.
///
/// Checks the cache for `$key`; on a hit the cached value is returned
/// without running `$block`. On a miss (or a cache read failure, which
/// degrades to direct computation) `$block` is awaited, its value stored
/// under `$key` with `$ttl` seconds to live, and returned.
///
/// # Arguments
/// * `$cache`: a [`crate::db::ResultCache`]
/// * `$key`: the [`crate::db::CacheKey`] for the operation and parameters
/// * `$ttl`: time-to-live in seconds
/// * `$block`: the future computing the value on a miss
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let result: $crate::error::AppResult<_> = match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            Ok(None) => {
                let value = $block.await?;
                $cache.store(&$key, &value, $ttl).await;
                Ok(value)
            }
            Err(e) => {
                // A broken cache must not fail the request.
                tracing::warn!(error = %e, "Cache read failed, computing directly");
                let value = $block.await?;
                $cache.store(&$key, &value, $ttl).await;
                Ok(value)
            }
        };
        result
    }};
}
