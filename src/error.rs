use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("No OCR text container found on page: {url}")]
    MissingOcrElement { url: String },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("Worker pool closed, couldn't acquire a slot! {0}")]
    PoolClosed(#[from] tokio::sync::AcquireError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Xml Error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("OAI-PMH error: {code} - {message}")]
    OaiPmh { code: String, message: String },
    #[error("Record {header} has {found} identifier value(s), expected at least 2")]
    MissingIdentifier { header: String, found: usize },

    #[error("Failed to process record {date} ({url}): {source}")]
    Record {
        date: String,
        url: String,
        #[source]
        source: Box<Error>,
    },
}

impl From<tempfile::PersistError> for Error {
    fn from(value: tempfile::PersistError) -> Self {
        Error::Io(value.error)
    }
}
