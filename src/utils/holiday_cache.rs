use anyhow::Result;
use chrono::NaiveDate;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// date => holiday label. Only gazetted holidays are stored; a miss falls
/// through to the database.
pub static HOLIDAY_CACHE: Lazy<Cache<NaiveDate, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(2_000) // a few years of calendar
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Record a single holiday (also called after an admin inserts one)
pub async fn put(date: NaiveDate, label: &str) {
    HOLIDAY_CACHE.insert(date, label.to_string()).await;
}

/// Holiday label for a date: cache first, database fallback. A database
/// error reads as "no holiday" so attendance flows keep working.
pub async fn label_for(pool: &MySqlPool, date: NaiveDate) -> Option<String> {
    if let Some(label) = HOLIDAY_CACHE.get(&date).await {
        return Some(label);
    }

    let row = sqlx::query_scalar::<_, String>("SELECT label FROM holidays WHERE date = ?")
        .bind(date)
        .fetch_optional(pool)
        .await
        .unwrap_or(None)?;

    HOLIDAY_CACHE.insert(date, row.clone()).await;
    Some(row)
}

/// Batch insert labels
async fn batch_put(entries: &[(NaiveDate, String)]) {
    let futures: Vec<_> = entries
        .iter()
        .map(|(date, label)| HOLIDAY_CACHE.insert(*date, label.clone()))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load the calendar window around today into memory (batched)
pub async fn warmup_holiday_cache(
    pool: &MySqlPool,
    days_back: u32,
    days_ahead: u32,
    batch_size: usize,
) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (NaiveDate, String)>(
        r#"
        SELECT date, label
        FROM holidays
        WHERE date BETWEEN CURDATE() - INTERVAL ? DAY AND CURDATE() + INTERVAL ? DAY
        ORDER BY date
        "#,
    )
    .bind(days_back)
    .bind(days_ahead)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let entry = row?;
        batch.push(entry);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_put(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_put(&batch).await;
    }

    log::info!(
        "Holiday cache warmup complete: {} entries (-{} / +{} days)",
        total_count,
        days_back,
        days_ahead
    );

    Ok(())
}
