use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// access code -> (professor id, professor name)
pub static CODE_CACHE: Lazy<Cache<String, (u64, String)>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Cache a resolved professor under their access code
pub async fn remember(code: &str, professor_id: u64, name: &str) {
    CODE_CACHE
        .insert(code.trim().to_string(), (professor_id, name.to_string()))
        .await;
}

/// Look up a professor by access code without touching the database
pub async fn lookup(code: &str) -> Option<(u64, String)> {
    CODE_CACHE.get(code.trim()).await
}

/// Batch insert resolved professors
async fn batch_remember(rows: &[(String, u64, String)]) {
    let futures: Vec<_> = rows
        .iter()
        .map(|(code, id, name)| {
            CODE_CACHE.insert(code.trim().to_string(), (*id, name.clone()))
        })
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load every professor into the in-memory cache (batched); the professors
/// table is small enough that a full load is cheaper than tracking recency.
pub async fn warmup_code_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String, u64, String)>(
        r#"
        SELECT unique_code, id, name
        FROM professors
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (code, id, name) = row?;
        batch.push((code, id, name));
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining professors
    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    log::info!(
        "Access-code cache warmup complete: {} professors",
        total_count
    );

    Ok(())
}
