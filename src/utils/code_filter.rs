use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Expected capacity and false-positive rate.
/// Tune these based on real professor counts.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// The filter only gives authoritative negatives once every access code has
/// been loaded; before that every code must fall through to the database.
static WARMED: AtomicBool = AtomicBool::new(false);

#[inline]
fn normalize(code: &str) -> String {
    // Access codes are case-sensitive barcode payloads; only strip whitespace.
    code.trim().to_string()
}

/// Check if an access code might exist (false positives possible)
pub fn might_exist(code: &str) -> bool {
    if !WARMED.load(Ordering::Acquire) {
        return true;
    }

    let code = normalize(code);
    CODE_FILTER
        .read()
        .expect("access-code filter poisoned")
        .contains(&code)
}

/// Warm up the access-code filter using streaming + batching
pub async fn warmup_code_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT unique_code FROM professors").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    WARMED.store(true, Ordering::Release);

    log::info!("Access-code filter warmup complete: {} professors", total);
    Ok(())
}

/// Insert a batch of normalized access codes
fn insert_batch(codes: &[String]) {
    let mut filter = CODE_FILTER
        .write()
        .expect("access-code filter poisoned");

    for code in codes {
        filter.add(code);
    }
}
