//! OAI-PMH OCR harvester.
//!
//! Lists every record of an OAI-PMH collection, derives a page count from each record's
//! Dublin Core `format` field and downloads the OCR text of every page into
//! `{output_dir}/{date}/{page}.txt`.

mod error;
pub mod harvest;
mod macros;
pub mod ocr;
pub mod pages;
pub mod process;

use std::path::PathBuf;

pub use error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://texashistory.unt.edu/explore/collections/THRSH/oai/";
pub const METADATA_PREFIX: &str = "oai_dc";
pub const OUTPUT_DIR: &str = "data";
pub const WORKER_COUNT: usize = 10;
/// Path segment between a record URL and the page index.
pub const PAGE_PATH_SEGMENT: &str = "m1";
/// `id` of the element whose `<pre>` holds the OCR text.
pub const OCR_CONTAINER_ID: &str = "ocr-data";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings for a single harvest + fetch run.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub metadata_prefix: String,
    /// Optional OAI-PMH `set` to restrict the harvest to.
    pub set: Option<String>,
    pub output_dir: PathBuf,
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            metadata_prefix: METADATA_PREFIX.to_string(),
            set: None,
            output_dir: PathBuf::from(OUTPUT_DIR),
            workers: WORKER_COUNT,
        }
    }
}

/// Builds the HTTP client shared by the harvester and every fetch worker.
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    Ok(client)
}
