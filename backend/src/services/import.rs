//! Bulk product import from CSV

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::product::{NewProduct, ProductService};
use shared::ids::generate_product_id;
use shared::models::LedgerSource;
use shared::validation::parse_short_date;

/// Column order for header-less bulk uploads
pub const COLUMN_ORDER: [&str; 10] = [
    "productName",
    "productId",
    "category",
    "costPrice",
    "sellingPrice",
    "quantity",
    "unit",
    "expiryDate",
    "thresholdValue",
    "description",
];

/// Columns a validation upload must carry in its header row
pub const REQUIRED_HEADERS: [&str; 8] = [
    "productName",
    "category",
    "costPrice",
    "sellingPrice",
    "quantity",
    "unit",
    "expiryDate",
    "thresholdValue",
];

/// Bulk import service
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
}

// ============================================================================
// CSV format description
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CsvFormat {
    pub column_order: Vec<&'static str>,
    pub description: &'static str,
    pub requirements: BTreeMap<&'static str, &'static str>,
    pub example: Vec<&'static str>,
    pub notes: Vec<&'static str>,
}

pub fn csv_format() -> CsvFormat {
    let requirements = BTreeMap::from([
        ("productName", "Text - Name of the product (required)"),
        ("productId", "Text - Product ID (leave empty for auto-generation)"),
        ("category", "Text - Product category (required)"),
        ("costPrice", "Number - Cost price for internal calculations (required)"),
        ("sellingPrice", "Number - Selling price displayed in inventory (required)"),
        ("quantity", "Number - Current stock quantity (defaults to 1 when empty)"),
        ("unit", "Text - Unit of measurement (piece, kg, liter, etc.) (required)"),
        ("expiryDate", "Date - Format: DD/MM/YY (e.g., 31/12/25) (required)"),
        ("thresholdValue", "Number - Minimum stock threshold (required)"),
        ("description", "Text - Product description (optional)"),
    ]);

    CsvFormat {
        column_order: COLUMN_ORDER.to_vec(),
        description: "CSV body should contain only data rows without headers, in the column order below",
        requirements,
        example: vec![
            "Laptop Pro,,Electronics,800,1200,15,piece,31/12/26,5,High-performance laptop for professionals",
            "Gaming Mouse,,Electronics,40,75,50,piece,30/06/27,10,Wireless gaming mouse with RGB lighting",
            "Office Chair,,Furniture,200,350,25,piece,15/03/28,3,Ergonomic office chair with lumbar support",
        ],
        notes: vec![
            "No header row",
            "Each row represents one product",
            "Rows with a different number of columns are skipped",
            "Leave productId empty for auto-generation",
            "Date format must be DD/MM/YY",
            "Empty lines are skipped",
        ],
    }
}

// ============================================================================
// Validation of a headed CSV
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: u64,
    pub message: String,
}

/// A row that passed the offline checks and still needs the duplicate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub row: u64,
    pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineValidation {
    pub total_rows: usize,
    pub candidates: Vec<CandidateRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Serialize)]
pub struct CsvValidationReport {
    pub valid_products: usize,
    pub total_rows: usize,
    pub errors: Vec<RowError>,
}

fn header_key(header: &str) -> String {
    header
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_lowercase()
}

fn line_of(record: &csv::StringRecord, fallback: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback as u64 + 1)
}

/// Parse a CSV with a header row and check every row that needs no database
pub fn validate_headed_csv(content: &str, today: NaiveDate) -> AppResult<OfflineValidation> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::ValidationError(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(header_key)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::ValidationError("CSV file is empty".to_string()));
    }

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !headers.contains(&header_key(required)))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut result = OfflineValidation {
        total_rows: 0,
        candidates: Vec::new(),
        errors: Vec::new(),
    };

    for (index, record) in reader.records().enumerate() {
        result.total_rows += 1;
        let record = record
            .map_err(|e| AppError::ValidationError(format!("Malformed CSV row: {}", e)))?;
        let row = line_of(&record, index + 1);

        if record.len() != headers.len() {
            result.errors.push(RowError {
                row,
                message: "Incorrect number of columns".to_string(),
            });
            continue;
        }

        let values: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();

        match check_headed_row(&values, today) {
            Ok(product_name) => result.candidates.push(CandidateRow { row, product_name }),
            Err(message) => result.errors.push(RowError { row, message }),
        }
    }

    Ok(result)
}

fn column<'a>(values: &'a HashMap<String, String>, name: &str) -> &'a str {
    values
        .get(&header_key(name))
        .map(String::as_str)
        .unwrap_or("")
}

fn check_headed_row(values: &HashMap<String, String>, today: NaiveDate) -> Result<String, String> {
    let field = |name: &str| column(values, name);
    let empty: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|name| column(values, name).is_empty())
        .copied()
        .collect();
    if !empty.is_empty() {
        return Err(format!("Empty required fields: {}", empty.join(", ")));
    }

    let non_negative_decimal = |name: &str, label: &str| {
        Decimal::from_str(field(name))
            .ok()
            .filter(|v| *v >= Decimal::ZERO)
            .ok_or_else(|| format!("Invalid {} (must be positive number)", label))
    };
    let non_negative_int = |name: &str, label: &str| {
        field(name)
            .parse::<i32>()
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| format!("Invalid {} (must be positive number)", label))
    };

    let cost_price = non_negative_decimal("costPrice", "cost price")?;
    let selling_price = non_negative_decimal("sellingPrice", "selling price")?;
    let quantity = non_negative_int("quantity", "quantity")?;
    let threshold = non_negative_int("thresholdValue", "threshold value")?;

    if selling_price < cost_price {
        return Err("Selling price should be greater than or equal to cost price".to_string());
    }
    if threshold > quantity {
        return Err("Threshold value should not exceed quantity".to_string());
    }

    let expiry = parse_short_date(field("expiryDate"))
        .map_err(|e| format!("Invalid expiry date: {}", e))?;
    if expiry < today {
        return Err("Expiry date must be in the future".to_string());
    }

    Ok(field("productName").to_string())
}

// ============================================================================
// Header-less bulk upload
// ============================================================================

/// Classification of a rejected bulk row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportErrorType {
    MissingFields,
    InvalidFormat,
    DateFormatError,
    DatabaseError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportFailure {
    pub row_number: u64,
    pub product_name: String,
    pub error: String,
    pub error_type: ImportErrorType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSuccess {
    pub row_number: u64,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub message: String,
}

/// A parsed bulk row, either ready for insertion or already rejected
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRow {
    pub row_number: u64,
    pub outcome: Result<NewProduct, ImportFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBulk {
    pub rows: Vec<BulkRow>,
    pub skipped_rows: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct ImportTotals {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub summary: Vec<String>,
    pub results: ImportTotals,
    pub successful: Vec<ImportSuccess>,
    pub failed: Vec<ImportFailure>,
    pub errors_by_type: BTreeMap<ImportErrorType, Vec<u64>>,
    pub skipped_rows: Vec<u64>,
}

/// Parse header-less rows in [`COLUMN_ORDER`]
pub fn parse_bulk_csv(content: &str) -> AppResult<ParsedBulk> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut parsed = ParsedBulk {
        rows: Vec::new(),
        skipped_rows: Vec::new(),
    };

    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::ValidationError(format!("Malformed CSV row: {}", e)))?;
        let row_number = line_of(&record, index);

        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != COLUMN_ORDER.len() {
            tracing::warn!(
                row = row_number,
                columns = record.len(),
                "Skipping CSV row with wrong column count"
            );
            parsed.skipped_rows.push(row_number);
            continue;
        }

        let values: Vec<&str> = record.iter().collect();
        parsed.rows.push(BulkRow {
            row_number,
            outcome: classify_bulk_row(row_number, &values),
        });
    }

    Ok(parsed)
}

fn classify_bulk_row(row_number: u64, values: &[&str]) -> Result<NewProduct, ImportFailure> {
    let get = |name: &str| {
        COLUMN_ORDER
            .iter()
            .position(|c| *c == name)
            .and_then(|i| values.get(i).copied())
            .unwrap_or("")
    };
    let product_name = get("productName");
    let display_name = if product_name.is_empty() {
        "Unknown".to_string()
    } else {
        product_name.to_string()
    };
    let failure = |error_type, error: String, fields: Vec<String>| ImportFailure {
        row_number,
        product_name: display_name.clone(),
        error: format!("Row {}: {}", row_number, error),
        error_type,
        fields,
    };

    let missing: Vec<String> = [
        "productName",
        "category",
        "costPrice",
        "sellingPrice",
        "unit",
        "expiryDate",
        "thresholdValue",
    ]
    .iter()
    .filter(|name| get(**name).is_empty())
    .map(|name| name.to_string())
    .collect();
    if !missing.is_empty() {
        return Err(failure(
            ImportErrorType::MissingFields,
            format!("Missing required fields: {}", missing.join(", ")),
            missing,
        ));
    }

    let cost_price = Decimal::from_str(get("costPrice")).ok().filter(|v| *v >= Decimal::ZERO);
    let selling_price = Decimal::from_str(get("sellingPrice"))
        .ok()
        .filter(|v| *v >= Decimal::ZERO);
    let quantity = match get("quantity") {
        "" => Some(1),
        raw => raw.parse::<i32>().ok().filter(|v| *v >= 0),
    };
    let threshold = get("thresholdValue").parse::<i32>().ok().filter(|v| *v >= 0);

    let mut invalid = Vec::new();
    if cost_price.is_none() {
        invalid.push("costPrice (must be a valid number)".to_string());
    }
    if selling_price.is_none() {
        invalid.push("sellingPrice (must be a valid number)".to_string());
    }
    if quantity.is_none() {
        invalid.push("quantity (must be a valid number)".to_string());
    }
    if threshold.is_none() {
        invalid.push("thresholdValue (must be a valid number)".to_string());
    }
    let (Some(cost_price), Some(selling_price), Some(quantity), Some(threshold_value)) =
        (cost_price, selling_price, quantity, threshold)
    else {
        return Err(failure(
            ImportErrorType::InvalidFormat,
            format!("Invalid field format: {}", invalid.join(", ")),
            invalid,
        ));
    };

    let expiry_date = parse_short_date(get("expiryDate")).map_err(|e| {
        failure(
            ImportErrorType::DateFormatError,
            format!(
                "Date format error - {}. Expected format: DD/MM/YY (e.g., 31/12/25)",
                e
            ),
            vec!["expiryDate".to_string()],
        )
    })?;

    let product_id = match get("productId") {
        "" => generate_product_id(Utc::now()),
        id => id.to_string(),
    };

    Ok(NewProduct {
        product_id,
        product_name: product_name.to_string(),
        category: get("category").to_string(),
        description: get("description").to_string(),
        cost_price,
        selling_price,
        quantity,
        unit: get("unit").to_string(),
        expiry_date,
        threshold_value,
        image_url: None,
    })
}

fn duplicate_id_failure(row_number: u64, product: &NewProduct) -> ImportFailure {
    ImportFailure {
        row_number,
        product_name: product.product_name.clone(),
        error: format!(
            "Row {}: Duplicate product ID '{}' already exists",
            row_number, product.product_id
        ),
        error_type: ImportErrorType::DatabaseError,
        fields: vec!["productId".to_string()],
    }
}

fn row_text(rows: &[u64]) -> String {
    match rows {
        [single] => format!("row {}", single),
        _ => format!(
            "rows {}",
            rows.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Build the per-type summary of a finished import
pub fn build_report(
    successful: Vec<ImportSuccess>,
    failed: Vec<ImportFailure>,
    skipped_rows: Vec<u64>,
) -> ImportReport {
    let total = successful.len() + failed.len();
    let mut errors_by_type: BTreeMap<ImportErrorType, Vec<u64>> = BTreeMap::new();
    for failure in &failed {
        errors_by_type
            .entry(failure.error_type)
            .or_default()
            .push(failure.row_number);
    }

    let mut summary = Vec::new();
    if !successful.is_empty() {
        summary.push(format!("{} products added successfully", successful.len()));
    }
    for (error_type, rows) in &errors_by_type {
        let rows = row_text(rows);
        summary.push(match error_type {
            ImportErrorType::MissingFields => format!("Missing required fields in {}", rows),
            ImportErrorType::DateFormatError => {
                format!("Invalid date format in {} (use DD/MM/YY)", rows)
            }
            ImportErrorType::InvalidFormat => format!("Invalid field format in {}", rows),
            ImportErrorType::DatabaseError => format!("Processing errors in {}", rows),
        });
    }
    if !skipped_rows.is_empty() {
        summary.push(format!(
            "Skipped {} with the wrong number of columns",
            row_text(&skipped_rows)
        ));
    }

    let success = failed.is_empty();
    let message = if success {
        format!("All {} products uploaded successfully", successful.len())
    } else {
        format!("{}/{} products uploaded successfully", successful.len(), total)
    };

    ImportReport {
        success,
        message,
        summary,
        results: ImportTotals {
            total,
            successful: successful.len(),
            failed: failed.len(),
            skipped: skipped_rows.len(),
        },
        successful,
        failed,
        errors_by_type,
        skipped_rows,
    }
}

impl ImportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate a headed CSV, including duplicate names already in the catalog
    pub async fn validate_csv(&self, content: &str) -> AppResult<CsvValidationReport> {
        let offline = validate_headed_csv(content, Utc::now().date_naive())?;

        let names: Vec<String> = offline
            .candidates
            .iter()
            .map(|c| c.product_name.clone())
            .collect();
        let existing = ProductService::new(self.db.clone())
            .existing_names(&names)
            .await?;

        let mut errors = offline.errors;
        let mut valid_products = 0;
        for candidate in offline.candidates {
            if existing.contains(&candidate.product_name.trim().to_lowercase()) {
                errors.push(RowError {
                    row: candidate.row,
                    message: format!(
                        "Product \"{}\" already exists in database",
                        candidate.product_name
                    ),
                });
            } else {
                valid_products += 1;
            }
        }
        errors.sort_by_key(|e| e.row);

        Ok(CsvValidationReport {
            valid_products,
            total_rows: offline.total_rows,
            errors,
        })
    }

    /// Insert every well-formed row; each success records a bulk purchase
    pub async fn add_multiple(&self, content: &str) -> AppResult<ImportReport> {
        let parsed = parse_bulk_csv(content)?;
        if parsed.rows.is_empty() && parsed.skipped_rows.is_empty() {
            return Err(AppError::ValidationError("CSV file is empty".to_string()));
        }

        let products = ProductService::new(self.db.clone());
        let ids: Vec<String> = parsed
            .rows
            .iter()
            .filter_map(|row| row.outcome.as_ref().ok())
            .map(|p| p.product_id.clone())
            .collect();
        let mut taken_ids = products.existing_ids(&ids).await?;
        let mut successful = Vec::new();
        let mut failed = Vec::new();

        for row in parsed.rows {
            let new_product = match row.outcome {
                Ok(new_product) => new_product,
                Err(failure) => {
                    failed.push(failure);
                    continue;
                }
            };
            if !taken_ids.insert(new_product.product_id.clone()) {
                failed.push(duplicate_id_failure(row.row_number, &new_product));
                continue;
            }

            match products
                .insert_with_purchase(&new_product, LedgerSource::BulkUpload)
                .await
            {
                Ok(product) => successful.push(ImportSuccess {
                    row_number: row.row_number,
                    message: format!(
                        "Row {}: Successfully added '{}' with ID {}",
                        row.row_number, product.product_name, product.product_id
                    ),
                    product_id: product.product_id,
                    product_name: product.product_name,
                    category: product.category,
                }),
                Err(e) => {
                    tracing::error!(row = row.row_number, error = %e, "Bulk row insert failed");
                    failed.push(ImportFailure {
                        row_number: row.row_number,
                        product_name: new_product.product_name.clone(),
                        error: format!("Row {}: Database error - {}", row.row_number, e),
                        error_type: ImportErrorType::DatabaseError,
                        fields: Vec::new(),
                    });
                }
            }
        }

        let report = build_report(successful, failed, parsed.skipped_rows);
        tracing::info!(
            successful = report.results.successful,
            failed = report.results.failed,
            skipped = report.results.skipped,
            "Bulk product import finished"
        );
        Ok(report)
    }
}
