//! Catalog export rendering.

use thiserror::Error;

use crate::domain::product::Product;

const EXPORT_BASE_NAME: &str = "urunler";

const EXPORT_HEADERS: [&str; 8] = [
    "id",
    "name",
    "slug",
    "description",
    "price",
    "discount_price",
    "stock",
    "status",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl TryFrom<&str> for ExportFormat {
    type Error = ExportError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export format: {0}")]
    InvalidFormat(String),
    #[error("failed to render csv")]
    CsvRender,
    #[error("failed to render xlsx")]
    XlsxRender,
}

/// Render the product catalog to a downloadable CSV or XLSX file.
pub fn export_products(
    products: &[Product],
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let rows: Vec<Vec<String>> = products.iter().map(product_row).collect();

    match format {
        ExportFormat::Csv => render_csv(&rows),
        ExportFormat::Xlsx => render_xlsx(&rows),
    }
}

fn product_row(product: &Product) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.name.as_str().to_string(),
        product.slug.as_str().to_string(),
        product
            .description
            .as_ref()
            .map(|d| d.as_str().to_string())
            .unwrap_or_default(),
        product.price.to_string(),
        product
            .discount_price
            .map(|p| p.to_string())
            .unwrap_or_default(),
        product.stock.to_string(),
        if product.status { "1" } else { "0" }.to_string(),
    ]
}

fn render_csv(rows: &[Vec<String>]) -> Result<ExportFile, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(EXPORT_HEADERS)
        .map_err(|_| ExportError::CsvRender)?;
    for row in rows {
        let escaped_row: Vec<String> = row.iter().map(|value| escape_csv_cell(value)).collect();
        writer
            .write_record(&escaped_row)
            .map_err(|_| ExportError::CsvRender)?;
    }

    let bytes = writer.into_inner().map_err(|_| ExportError::CsvRender)?;
    Ok(ExportFile {
        file_name: format!("{EXPORT_BASE_NAME}.csv"),
        content_type: "text/csv; charset=utf-8",
        bytes,
    })
}

fn render_xlsx(rows: &[Vec<String>]) -> Result<ExportFile, ExportError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col_idx, header) in EXPORT_HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *header)
            .map_err(|_| ExportError::XlsxRender)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(sheet_row, col_idx as u16, value)
                .map_err(|_| ExportError::XlsxRender)?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|_| ExportError::XlsxRender)?;
    Ok(ExportFile {
        file_name: format!("{EXPORT_BASE_NAME}.xlsx"),
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        bytes,
    })
}

/// Defuse spreadsheet formula injection in CSV output.
fn escape_csv_cell(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some('=' | '+' | '-' | '@') => format!("'{value}"),
        _ => value.to_string(),
    }
}
