//! OAI-PMH `ListRecords` harvesting of Dublin Core metadata.
//!
//! The endpoint pages its answers; every response may end with a `resumptionToken` which is
//! sent back until the server returns an empty (or no) token.

use chrono::Local;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::pages::extract_number_of_pages;
use crate::{info_time, Config, Error, Result};

/// OAI-PMH error code that means "the query matched nothing".
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

/// The Dublin Core fields of a single harvested record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DcRecord {
    /// OAI identifier from the record header.
    pub header_identifier: String,
    pub deleted: bool,
    pub dates: Vec<String>,
    pub identifiers: Vec<String>,
    pub formats: Vec<String>,
}

/// One parsed `ListRecords` response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListRecordsPage {
    pub records: Vec<DcRecord>,
    pub resumption_token: Option<String>,
}

/// A record projected onto the three fields the fetch stage needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub date: String,
    pub url: String,
    pub format: String,
}

/// A record ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub date: String,
    /// Base URL of the resource; pages live under `{url}/m1/{page}`.
    pub url: String,
    /// `None` when the format description didn't mention pages.
    pub pages: Option<u64>,
}

impl DcRecord {
    /// First date, second identifier and first format of the record.
    ///
    /// The second identifier is the resource URL on the portals this tool targets, the first
    /// one being the ARK. Records with fewer identifiers are rejected.
    pub fn project(&self) -> Result<RawRecord> {
        let url = self
            .identifiers
            .get(1)
            .cloned()
            .ok_or_else(|| Error::MissingIdentifier {
                header: self.header_identifier.clone(),
                found: self.identifiers.len(),
            })?;

        Ok(RawRecord {
            date: self.dates.first().cloned().unwrap_or_default(),
            url,
            format: self.formats.first().cloned().unwrap_or_default(),
        })
    }
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        let pages = extract_number_of_pages(&raw.format);
        Record {
            date: raw.date,
            url: raw.url,
            pages,
        }
    }
}

/// Pulls successive `ListRecords` pages from an OAI-PMH endpoint.
pub struct ListRecords {
    client: Client,
    endpoint: String,
    metadata_prefix: String,
    set: Option<String>,
    resumption_token: Option<String>,
    done: bool,
}

impl ListRecords {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            metadata_prefix: config.metadata_prefix.clone(),
            set: config.set.clone(),
            resumption_token: None,
            done: false,
        }
    }

    /// Requests the next page of records, `None` once the list is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<DcRecord>>> {
        if self.done {
            return Ok(None);
        }

        // A resumption token is an exclusive argument: it replaces prefix and set.
        let mut query = vec![("verb", "ListRecords".to_string())];
        match &self.resumption_token {
            Some(token) => query.push(("resumptionToken", token.clone())),
            None => {
                query.push(("metadataPrefix", self.metadata_prefix.clone()));
                if let Some(set) = &self.set {
                    query.push(("set", set.clone()));
                }
            }
        }

        debug!(endpoint = %self.endpoint, ?query, "Requesting ListRecords");
        let xml = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let page = spawn_blocking(move || parse_list_records(&xml)).await??;

        self.resumption_token = page.resumption_token;
        self.done = self.resumption_token.is_none();
        Ok(Some(page.records))
    }
}

/// Harvests the whole collection and turns it into fetchable records, in harvest order.
///
/// Deleted records are skipped. A live record without a resource URL aborts the harvest.
pub async fn harvest_catalog(client: Client, config: &Config) -> Result<Vec<Record>> {
    let start_time = Local::now();
    let mut list = ListRecords::new(client, config);
    let mut catalog = Vec::new();

    let mut page_num = 0;
    while let Some(records) = list.next_page().await? {
        page_num += 1;
        debug!(page = page_num, records = records.len(), "Harvested page");
        for record in records {
            if record.deleted {
                debug!(header = %record.header_identifier, "Skipping deleted record");
                continue;
            }
            catalog.push(Record::from(record.project()?));
        }
    }

    info_time!(
        start_time,
        "Harvested {} records in {} page(s)",
        catalog.len(),
        page_num
    );
    Ok(catalog)
}

/// Where the parser currently is inside a `<record>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    HeaderIdentifier,
    Date,
    Identifier,
    Format,
    ResumptionToken,
    Error,
}

/// Parses a `ListRecords` response body.
///
/// Element names are matched without their namespace prefix, so `dc:date` and `date` are the
/// same thing. An OAI-PMH `noRecordsMatch` error is an empty page; any other error code is
/// returned as [`Error::OaiPmh`].
pub fn parse_list_records(xml: &str) -> Result<ListRecordsPage> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut page = ListRecordsPage::default();
    let mut record: Option<DcRecord> = None;
    let mut in_header = false;
    let mut in_metadata = false;
    let mut field: Option<Field> = None;
    let mut text = String::new();
    let mut error_code: Option<String> = None;
    let mut error_message = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                text.clear();
                match e.local_name().as_ref() {
                    b"record" => record = Some(DcRecord::default()),
                    b"header" => {
                        in_header = true;
                        if let Some(record) = record.as_mut() {
                            record.deleted = attribute(&e, b"status").as_deref() == Some("deleted");
                        }
                    }
                    b"metadata" => in_metadata = true,
                    b"identifier" if in_header => field = Some(Field::HeaderIdentifier),
                    b"date" if in_metadata => field = Some(Field::Date),
                    b"identifier" if in_metadata => field = Some(Field::Identifier),
                    b"format" if in_metadata => field = Some(Field::Format),
                    b"resumptionToken" => field = Some(Field::ResumptionToken),
                    b"error" => {
                        error_code = Some(attribute(&e, b"code").unwrap_or_default());
                        field = Some(Field::Error);
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"header" => {
                    if let Some(record) = record.as_mut() {
                        record.deleted = attribute(&e, b"status").as_deref() == Some("deleted");
                    }
                }
                b"error" => error_code = Some(attribute(&e, b"code").unwrap_or_default()),
                _ => {}
            },
            Event::Text(e) => {
                if field.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"record" => {
                    if let Some(record) = record.take() {
                        page.records.push(record);
                    }
                }
                b"header" => in_header = false,
                b"metadata" => in_metadata = false,
                _ => {
                    if let Some(done) = field.take() {
                        let value = std::mem::take(&mut text);
                        store_field(done, value, record.as_mut(), &mut page, &mut error_message);
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(code) = error_code {
        if code == NO_RECORDS_MATCH {
            return Ok(ListRecordsPage::default());
        }
        return Err(Error::OaiPmh {
            code,
            message: error_message,
        });
    }

    Ok(page)
}

fn store_field(
    field: Field,
    value: String,
    record: Option<&mut DcRecord>,
    page: &mut ListRecordsPage,
    error_message: &mut String,
) {
    match field {
        Field::ResumptionToken => {
            if !value.is_empty() {
                page.resumption_token = Some(value);
            }
        }
        Field::Error => *error_message = value,
        _ => {
            let Some(record) = record else { return };
            match field {
                Field::HeaderIdentifier => record.header_identifier = value,
                Field::Date => record.dates.push(value),
                Field::Identifier => record.identifiers.push(value),
                Field::Format => record.formats.push(value),
                Field::ResumptionToken | Field::Error => {}
            }
        }
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}
