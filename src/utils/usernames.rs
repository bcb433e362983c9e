use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static USERNAME_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

/// true  => username is TAKEN
/// false => username is AVAILABLE (usually we store only taken)
static USERNAME_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn normalize(username: &str) -> String {
    username.to_lowercase()
}

/// Record a provisioned username in both layers.
pub async fn mark_taken(username: &str) {
    let username = normalize(username);
    USERNAME_FILTER
        .write()
        .expect("username filter poisoned")
        .add(&username);
    USERNAME_CACHE.insert(username, true).await;
}

/// true  => username AVAILABLE
/// false => username TAKEN
pub async fn is_available(username: &str, pool: &MySqlPool) -> bool {
    let username = normalize(username);

    // 1️⃣ Cuckoo filter — fast negative
    // if filter says not exist then it is saying true, else it may exist or not.
    let might_exist = USERNAME_FILTER
        .read()
        .expect("username filter poisoned")
        .contains(&username);
    if !might_exist {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if USERNAME_CACHE.get(&username).await.unwrap_or(false) {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Warm up the username filter using streaming + batching
pub async fn warmup_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT username FROM users").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&username));
        total += 1;

        if batch.len() == batch_size {
            insert_filter_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_filter_batch(&batch);
    }

    log::info!("Username filter warmup complete: {} users", total);
    Ok(())
}

/// Load only RECENT usernames into the in-memory cache (batched)
pub async fn warmup_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT username
        FROM users
        WHERE last_login_at >= NOW() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (username,) = row?;
        batch.push(normalize(&username));
        total_count += 1;

        if batch.len() >= batch_size {
            cache_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        cache_batch(&batch).await;
    }

    log::info!(
        "Username cache warmup complete: {} recent users (last {} days)",
        total_count,
        days
    );

    Ok(())
}

/// Insert a batch of normalized usernames into the filter
fn insert_filter_batch(usernames: &[String]) {
    let mut filter = USERNAME_FILTER
        .write()
        .expect("username filter poisoned");

    for username in usernames {
        filter.add(username);
    }
}

/// Mark a batch of normalized usernames taken in the cache
async fn cache_batch(usernames: &[String]) {
    let futures: Vec<_> = usernames
        .iter()
        .map(|u| USERNAME_CACHE.insert(u.clone(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}
