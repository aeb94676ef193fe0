use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use reqwest::Client;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, warn};

use crate::harvest::{harvest_catalog, Record};
use crate::ocr::process_record;
use crate::{build_client, info_time, Config, Error, Result};

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    /// Records without a usable page count.
    pub skipped: usize,
    pub pages_written: u64,
}

/// Harvests the whole catalog, then fetches the OCR text of every record.
pub async fn process_catalog(config: &Config) -> Result<RunSummary> {
    let start_time = Local::now();
    let client = build_client()?;

    info_time!("Harvesting records from {}", config.endpoint);
    let records = harvest_catalog(client.clone(), config).await?;
    info_time!(start_time, "Finished HARVESTING {} records.", records.len());

    tokio::fs::create_dir_all(&config.output_dir).await?;
    let summary = process_records(client, &config.output_dir, records, config.workers).await?;
    info_time!(
        start_time,
        "Finished PROCESSING ALL records: {} written pages, {} skipped records.",
        summary.pages_written,
        summary.skipped
    );

    Ok(summary)
}

/// Fetches all `records` with at most `workers` records in flight at once.
///
/// Every task runs to completion. Failures are logged as they come in and the first one
/// is returned once all tasks have finished.
pub async fn process_records(
    client: Client,
    output_dir: &Path,
    records: Vec<Record>,
    workers: usize,
) -> Result<RunSummary> {
    warn_shared_dates(&records);

    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut summary = RunSummary {
        records: records.len(),
        ..RunSummary::default()
    };

    let mut task_set = JoinSet::new();
    for record in records {
        if !matches!(record.pages, Some(pages) if pages > 0) {
            summary.skipped += 1;
        }
        task_set.spawn({
            // Client uses Arc so we can clone cheaply
            let client = client.clone();
            let permits = permits.clone();
            let output_dir = output_dir.to_path_buf();

            async move { run_record(&client, &output_dir, &record, permits).await }
        });
    }

    let mut first_error = None;
    while let Some(task) = task_set.join_next().await {
        let res = match task {
            Ok(res) => res,
            Err(e) => Err(Error::RuntimeJoin(e)),
        };
        match res {
            Ok(pages) => summary.pages_written += pages,
            Err(e) => {
                error!("{e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

/// Waits for a pool slot, then fetches one record while holding it.
async fn run_record(
    client: &Client,
    output_dir: &Path,
    record: &Record,
    permits: Arc<Semaphore>,
) -> Result<u64> {
    let _permit = permits.acquire_owned().await?;
    process_record(client, output_dir, record)
        .await
        .map_err(|e| Error::Record {
            date: record.date.clone(),
            url: record.url.clone(),
            source: Box::new(e),
        })
}

/// Dates used by more than one record, sorted by date.
fn shared_dates(records: &[Record]) -> Vec<(&str, usize)> {
    let mut per_date: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *per_date.entry(record.date.as_str()).or_default() += 1;
    }
    let mut shared = per_date
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .collect::<Vec<_>>();
    shared.sort_unstable();
    shared
}

/// Records with the same date write into the same directory and overwrite each other's pages.
fn warn_shared_dates(records: &[Record]) {
    for (date, count) in shared_dates(records) {
        warn!(date, count, "Several records share a date and will write to the same directory");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tracing_test::traced_test;

    use super::*;

    fn record(date: &str, pages: Option<u64>) -> Record {
        Record {
            date: date.to_string(),
            url: format!("http://127.0.0.1:9/{date}"),
            pages,
        }
    }

    #[test]
    fn groups_records_by_shared_date() {
        let records = vec![
            record("1922", Some(1)),
            record("1923", Some(1)),
            record("1922", None),
            record("", Some(2)),
            record("", Some(2)),
            record("1922", Some(4)),
        ];
        assert_eq!(shared_dates(&records), vec![("", 2), ("1922", 3)]);
        assert!(shared_dates(&records[..2]).is_empty());
    }

    #[traced_test]
    #[test]
    fn warns_about_shared_dates() {
        warn_shared_dates(&[record("1922-03-05", Some(1)), record("1922-03-05", Some(2))]);
        assert!(logs_contain("Several records share a date"));
        assert!(logs_contain("1922-03-05"));
    }

    #[tokio::test]
    async fn closed_pool_fails_the_record() {
        let permits = Arc::new(Semaphore::new(1));
        permits.close();
        let temp_dir = TempDir::new().expect("failed to create temp dir");

        let client = build_client().unwrap();
        let result = run_record(&client, temp_dir.path(), &record("1922", Some(1)), permits).await;

        assert!(matches!(result, Err(Error::PoolClosed(_))), "{result:?}");
    }
}
