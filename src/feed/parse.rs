//! Decoding of feed payloads into import records.
//!
//! Both parsers produce the same uniform [`ImportRecord`] shape. Malformed
//! records are yielded as per-record errors so one bad row never aborts the
//! surrounding feed; only an undecodable or empty document is fatal.

use std::io::Cursor;

use calamine::{Data, Reader as _, open_workbook_auto_from_rs};
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

use crate::domain::import::ImportRecord;
use crate::domain::types::{ProductDescription, ProductName, ProductPrice, StockCount};
use crate::feed::FeedFormat;

/// Fatal, feed-level parse failures. These abort the whole run.
#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("feed is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("feed is not valid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("feed is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("feed is not a readable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("spreadsheet has no worksheet")]
    MissingSheet,
    #[error("feed contains no records")]
    Empty,
}

/// Non-fatal problems with a single record; the record is skipped and the
/// rest of the feed continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record {record}: missing required field `{field}`")]
    MissingField { record: usize, field: &'static str },
    #[error("record {record}: invalid `{field}`: {message}")]
    InvalidField {
        record: usize,
        field: &'static str,
        message: String,
    },
}

/// The records of one parsed feed, interleaved with per-record errors.
///
/// Finite and consumed once; parsing again requires re-fetching the feed.
#[derive(Debug)]
pub struct FeedRecords {
    inner: std::vec::IntoIter<Result<ImportRecord, RecordError>>,
}

impl Iterator for FeedRecords {
    type Item = Result<ImportRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Decode a feed payload into a sequence of import records.
pub fn parse_feed(bytes: &[u8], format: FeedFormat) -> Result<FeedRecords, FeedParseError> {
    let outcomes = match format {
        FeedFormat::Xml => parse_xml(bytes)?,
        FeedFormat::Csv | FeedFormat::Xlsx => {
            let rows = match format {
                FeedFormat::Csv => csv_rows(bytes)?,
                _ => xlsx_rows(bytes)?,
            };
            // The first row is a header and is dropped by position alone,
            // whatever its content.
            rows.into_iter()
                .skip(1)
                .enumerate()
                .map(|(index, row)| row_to_record(index, &row))
                .collect()
        }
    };

    if outcomes.is_empty() {
        return Err(FeedParseError::Empty);
    }

    Ok(FeedRecords {
        inner: outcomes.into_iter(),
    })
}

#[derive(Default)]
struct RawProduct {
    title: Option<String>,
    description: Option<String>,
    price: Option<String>,
    discount_price: Option<String>,
    images: Vec<String>,
}

impl RawProduct {
    fn into_record(self, record: usize) -> Result<ImportRecord, RecordError> {
        let title = self
            .title
            .filter(|value| !value.is_empty())
            .ok_or(RecordError::MissingField {
                record,
                field: "Baslik",
            })?;
        let title = ProductName::new(title).map_err(|e| RecordError::InvalidField {
            record,
            field: "Baslik",
            message: e.to_string(),
        })?;

        let price = self
            .price
            .filter(|value| !value.is_empty())
            .ok_or(RecordError::MissingField {
                record,
                field: "Fiyat",
            })?;
        let price = parse_price(&price, record, "Fiyat")?;

        let discount_price = self
            .discount_price
            .filter(|value| !value.is_empty())
            .map(|value| parse_price(&value, record, "Indirimli_Fiyati"))
            .transpose()?;

        let description = self
            .description
            .filter(|value| !value.is_empty())
            .map(ProductDescription::new)
            .transpose()
            .map_err(|e| RecordError::InvalidField {
                record,
                field: "Aciklama",
                message: e.to_string(),
            })?;

        Ok(ImportRecord {
            title,
            description,
            price,
            discount_price,
            stock: StockCount::default(),
            images: self.images,
        })
    }
}

/// Decode a document of shape `Urunler/Urun[]` with nested
/// `Resimler/Resim[]` image URLs.
fn parse_xml(bytes: &[u8]) -> Result<Vec<Result<ImportRecord, RecordError>>, FeedParseError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut outcomes = Vec::new();
    let mut current: Option<RawProduct> = None;
    let mut buf = String::new();
    let mut capture = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Urun" => current = Some(RawProduct::default()),
                b"Baslik" | b"Aciklama" | b"Fiyat" | b"Indirimli_Fiyati" | b"Resim"
                    if current.is_some() =>
                {
                    buf.clear();
                    capture = true;
                }
                _ => capture = false,
            },
            Event::Text(e) if capture => {
                buf.push_str(&e.xml_content().unwrap_or_default());
            }
            Event::CData(e) if capture => {
                buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(ref e) => {
                let field = match e.local_name().as_ref() {
                    b"Urun" => {
                        if let Some(raw) = current.take() {
                            outcomes.push(raw.into_record(outcomes.len()));
                        }
                        continue;
                    }
                    b"Baslik" => Field::Title,
                    b"Aciklama" => Field::Description,
                    b"Fiyat" => Field::Price,
                    b"Indirimli_Fiyati" => Field::DiscountPrice,
                    b"Resim" => Field::Image,
                    _ => continue,
                };
                capture = false;
                let Some(raw) = &mut current else { continue };
                let value = buf.trim().to_string();
                match field {
                    Field::Title => raw.title = Some(value),
                    Field::Description => raw.description = Some(value),
                    Field::Price => raw.price = Some(value),
                    Field::DiscountPrice => raw.discount_price = Some(value),
                    Field::Image => {
                        if !value.is_empty() {
                            raw.images.push(value);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(outcomes)
}

enum Field {
    Title,
    Description,
    Price,
    DiscountPrice,
    Image,
}

fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, FeedParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(rows)
}

fn xlsx_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, FeedParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FeedParseError::MissingSheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell.to_string(),
    }
}

/// Positional columns: name, description, price, discount price, stock.
fn row_to_record(record: usize, row: &[String]) -> Result<ImportRecord, RecordError> {
    let cell = |index: usize| row.get(index).map(|s| s.trim()).unwrap_or_default();

    let name = cell(0);
    if name.is_empty() {
        return Err(RecordError::MissingField {
            record,
            field: "name",
        });
    }
    let title = ProductName::new(name).map_err(|e| RecordError::InvalidField {
        record,
        field: "name",
        message: e.to_string(),
    })?;

    let description = match cell(1) {
        "" => None,
        value => Some(
            ProductDescription::new(value).map_err(|e| RecordError::InvalidField {
                record,
                field: "description",
                message: e.to_string(),
            })?,
        ),
    };

    let price = match cell(2) {
        "" => ProductPrice::default(),
        value => parse_price(value, record, "price")?,
    };

    let discount_price = match cell(3) {
        "" => None,
        value => Some(parse_price(value, record, "discount_price")?),
    };

    let stock = match cell(4) {
        "" => StockCount::default(),
        value => {
            let count: f64 = value
                .replace(',', ".")
                .parse()
                .map_err(|_| RecordError::InvalidField {
                    record,
                    field: "stock",
                    message: format!("`{value}` is not a number"),
                })?;
            StockCount::new(count as i32).map_err(|e| RecordError::InvalidField {
                record,
                field: "stock",
                message: e.to_string(),
            })?
        }
    };

    Ok(ImportRecord {
        title,
        description,
        price,
        discount_price,
        stock,
        images: vec![],
    })
}

fn parse_price(raw: &str, record: usize, field: &'static str) -> Result<ProductPrice, RecordError> {
    // Feeds write decimals with either separator.
    let value: f64 = raw
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| RecordError::InvalidField {
            record,
            field,
            message: format!("`{raw}` is not a number"),
        })?;

    ProductPrice::new(value).map_err(|e| RecordError::InvalidField {
        record,
        field,
        message: e.to_string(),
    })
}
