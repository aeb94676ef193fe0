//! Shared helpers for building mock OAI-PMH and OCR page responses.

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One `<record>` element with the given Dublin Core fields.
pub fn dc_record(id: &str, date: Option<&str>, identifiers: &[&str], format: Option<&str>) -> String {
    let mut dc = String::new();
    if let Some(date) = date {
        dc.push_str(&format!("<dc:date>{date}</dc:date>"));
    }
    for identifier in identifiers {
        dc.push_str(&format!("<dc:identifier>{identifier}</dc:identifier>"));
    }
    if let Some(format) = format {
        dc.push_str(&format!("<dc:format>{format}</dc:format>"));
    }
    format!(
        r#"<record>
  <header><identifier>{id}</identifier><datestamp>2020-01-01</datestamp></header>
  <metadata>
    <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/">{dc}</oai_dc:dc>
  </metadata>
</record>"#
    )
}

pub fn deleted_record(id: &str) -> String {
    format!(r#"<record><header status="deleted"><identifier>{id}</identifier></header></record>"#)
}

/// A full `ListRecords` response around `records`.
pub fn list_records(records: &[String], token: Option<&str>) -> String {
    let token = match token {
        Some(token) => format!("<resumptionToken>{token}</resumptionToken>"),
        None => "<resumptionToken/>".to_string(),
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/">
  <responseDate>2024-01-01T00:00:00Z</responseDate>
  <ListRecords>{}{token}</ListRecords>
</OAI-PMH>"#,
        records.join("\n")
    )
}

pub fn ocr_page(text: &str) -> String {
    format!(
        r#"<html><body><div id="ocr-data"><h3>OCR</h3><pre>
{text}
</pre></div></body></html>"#
    )
}

/// Serves `text` as the OCR page at `page_path`.
pub async fn mount_page(server: &MockServer, page_path: &str, text: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(ocr_page(text)))
        .mount(server)
        .await;
}
