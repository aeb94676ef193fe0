use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use crate::harvest::Record;
use crate::{info_time, Error, Result, OCR_CONTAINER_ID, PAGE_PATH_SEGMENT};

/// URL of a single page of a record: `{url}/m1/{page}`.
pub fn page_url(record_url: &str, page: u64) -> String {
    format!(
        "{}/{PAGE_PATH_SEGMENT}/{page}",
        record_url.trim_end_matches('/')
    )
}

/// Directory all pages of a record with the given date are written to.
///
/// Path separators inside the date are replaced and `.`/`..` become `-`, so a date maps to
/// a single directory inside `output_dir`. An empty date is `output_dir` itself.
pub fn record_dir(output_dir: &Path, date: &str) -> PathBuf {
    let name = date.replace(['/', '\\'], "-");
    match name.as_str() {
        "." | ".." => output_dir.join("-"),
        _ => output_dir.join(name),
    }
}

/// Requests a page and returns its OCR text.
pub async fn fetch_ocr_text(client: &Client, url: &str) -> Result<String> {
    let html = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let url = url.to_string();
    let text = spawn_blocking(move || -> Result<String> {
        extract_ocr_text(&html)?.ok_or(Error::MissingOcrElement { url })
    })
    .await??;
    Ok(text)
}

/// Finds the first `<pre>` inside the OCR container and returns its stripped text.
///
/// Every text node is trimmed on its own and the non-empty pieces are joined without a
/// separator. Returns `None` when the page has no OCR container or the container has no `<pre>`.
pub fn extract_ocr_text(html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);
    let container_selector = create_selector(&format!("#{OCR_CONTAINER_ID}"))?;
    let pre_selector = create_selector("pre")?;

    let Some(container) = doc.select(&container_selector).next() else {
        return Ok(None);
    };
    let Some(pre) = container.select(&pre_selector).next() else {
        return Ok(None);
    };

    let text = pre
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<String>();
    Ok(Some(text))
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// Fetches every page of `record` and writes it to `{output_dir}/{date}/{page}.txt`.
///
/// Returns the number of pages written. A record without a page count writes nothing.
/// Existing files are replaced; each file is written to a temporary file first and then
/// renamed into place.
pub async fn process_record(client: &Client, output_dir: &Path, record: &Record) -> Result<u64> {
    let pages = match record.pages {
        Some(pages) if pages > 0 => pages,
        _ => {
            warn!(
                date = %record.date,
                url = %record.url,
                pages = ?record.pages,
                "No page count for record, skipping"
            );
            return Ok(0);
        }
    };

    let start_time = Local::now();
    let dir = record_dir(output_dir, &record.date);
    tokio::fs::create_dir_all(&dir).await?;

    for page in 1..=pages {
        let url = page_url(&record.url, page);
        let text = fetch_ocr_text(client, &url).await?;
        write_page(&dir, page, text).await?;
        debug!(%url, page, "Saved page");
    }

    info_time!(
        start_time,
        "Saved {} page(s) of {} to {}",
        pages,
        record.url,
        dir.display()
    );
    Ok(pages)
}

async fn write_page(dir: &Path, page: u64, text: String) -> Result<()> {
    let dir = dir.to_path_buf();
    spawn_blocking(move || -> Result<()> {
        use std::io::Write;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(text.as_bytes())?;
        file.persist(dir.join(format!("{page}.txt")))?;
        Ok(())
    })
    .await??;
    Ok(())
}
