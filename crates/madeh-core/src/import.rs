//! # Bulk CSV Import
//!
//! Validation of product upload and update files. Nothing here touches the
//! database: callers pass in the names or IDs that already exist and get back
//! a plan (rows to write) plus a per-row error list.
//!
//! ## Upload file
//! ```text
//! Name,Category,Price,Stock
//! Claw Hammer,Tools,1200.00,15      ← row 2
//! ,Tools,5,1                        ← row 3: Name must not be empty
//! ```
//!
//! ## Update file
//! ```text
//! ID,Name,Category,Price,Stock      Name is informational only
//! 5f0c…,Claw Hammer,,1350.00,       blank cells leave the field unchanged
//! ```
//!
//! Row numbers count the header as row 1, matching what a spreadsheet shows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{NewProduct, ProductUpdate};
use crate::validation::{validate_category, validate_price_cents, validate_product_name};

const PRICE_MESSAGE: &str = "Price must be a positive number";
const STOCK_MESSAGE: &str = "Stock must be a whole number ≥ 0";

/// One rejected cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub message: String,
    pub value: String,
}

impl RowError {
    fn new(row: usize, field: &str, message: &str, value: &str) -> Self {
        RowError {
            row,
            field: field.to_string(),
            message: message.to_string(),
            value: value.to_string(),
        }
    }
}

/// Outcome of a bulk upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UploadReport {
    pub success: usize,
    pub errors: Vec<RowError>,
}

/// Outcome of a bulk update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateReport {
    pub success: usize,
    pub errors: Vec<RowError>,
    pub not_found: Vec<String>,
}

// =============================================================================
// Upload
// =============================================================================

#[derive(Debug, Deserialize)]
struct UploadRow {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Category", default)]
    category: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Stock", default)]
    stock: Option<String>,
}

/// Validated upload: rows to insert plus rejected rows.
#[derive(Debug, Clone, Default)]
pub struct UploadPlan {
    pub products: Vec<NewProduct>,
    pub errors: Vec<RowError>,
}

/// Validates an upload file.
///
/// `existing_names` holds the catalog's product names, lowercased.
/// A row with any error is excluded from `products`.
pub fn plan_upload(csv_text: &str, existing_names: &HashSet<String>) -> CoreResult<UploadPlan> {
    let mut plan = UploadPlan::default();
    let mut seen_names = HashSet::new();

    for (index, row) in read_rows::<UploadRow>(csv_text)?.into_iter().enumerate() {
        let row_num = index + 2;
        let errors_before = plan.errors.len();

        let raw_name = row.name.as_deref().unwrap_or("");
        let name = raw_name.trim();
        if name.is_empty() {
            plan.errors.push(RowError::new(row_num, "Name", "Name must not be empty", raw_name));
        } else if let Err(e) = validate_product_name(name) {
            plan.errors.push(RowError::new(row_num, "Name", &e.to_string(), name));
        } else {
            let key = name.to_lowercase();
            if existing_names.contains(&key) {
                plan.errors.push(RowError::new(
                    row_num,
                    "Name",
                    "Product already exists in database",
                    name,
                ));
            }
            if !seen_names.insert(key) {
                plan.errors.push(RowError::new(
                    row_num,
                    "Name",
                    "Duplicate product name within this file",
                    name,
                ));
            }
        }

        let raw_category = row.category.as_deref().unwrap_or("");
        let category = raw_category.trim();
        if category.is_empty() {
            plan.errors.push(RowError::new(
                row_num,
                "Category",
                "Category must not be empty",
                raw_category,
            ));
        } else if let Err(e) = validate_category(category) {
            plan.errors.push(RowError::new(row_num, "Category", &e.to_string(), category));
        }

        let raw_price = row.price.as_deref().unwrap_or("");
        let price = parse_price(raw_price);
        if price.is_none() {
            plan.errors.push(RowError::new(row_num, "Price", PRICE_MESSAGE, raw_price));
        }

        let raw_stock = row.stock.as_deref().unwrap_or("");
        let stock = parse_stock(raw_stock);
        if stock.is_none() {
            plan.errors.push(RowError::new(row_num, "Stock", STOCK_MESSAGE, raw_stock));
        }

        if plan.errors.len() != errors_before {
            continue;
        }
        if let (Some(price), Some(stock)) = (price, stock) {
            plan.products.push(NewProduct {
                name: name.to_string(),
                category: category.to_string(),
                price_cents: price.cents(),
                cost_cents: None,
                stock,
            });
        }
    }

    Ok(plan)
}

// =============================================================================
// Update
// =============================================================================

#[derive(Debug, Deserialize)]
struct UpdateRow {
    #[serde(rename = "ID", default)]
    id: Option<String>,
    #[serde(rename = "Category", default)]
    category: Option<String>,
    #[serde(rename = "Price", default)]
    price: Option<String>,
    #[serde(rename = "Stock", default)]
    stock: Option<String>,
}

/// Validated update: per-product changes plus rejected and unknown rows.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    pub updates: Vec<(String, ProductUpdate)>,
    pub errors: Vec<RowError>,
    pub not_found: Vec<String>,
}

/// Validates an update file against the set of existing product IDs.
///
/// Rows that change nothing are left out of `updates`.
pub fn plan_update(csv_text: &str, existing_ids: &HashSet<String>) -> CoreResult<UpdatePlan> {
    let mut plan = UpdatePlan::default();

    for (index, row) in read_rows::<UpdateRow>(csv_text)?.into_iter().enumerate() {
        let row_num = index + 2;

        let id = row.id.as_deref().map(str::trim).unwrap_or("");
        if id.is_empty() {
            plan.not_found.push(format!("Missing ID in row {row_num}"));
            continue;
        }
        if !existing_ids.contains(id) {
            plan.not_found.push(id.to_string());
            continue;
        }

        let errors_before = plan.errors.len();
        let mut update = ProductUpdate::default();

        if let Some(raw) = provided(&row.category) {
            let category = raw.trim();
            if category.is_empty() {
                plan.errors.push(RowError::new(
                    row_num,
                    "Category",
                    "Category cannot be an empty string if provided",
                    raw,
                ));
            } else if let Err(e) = validate_category(category) {
                plan.errors.push(RowError::new(row_num, "Category", &e.to_string(), category));
            } else {
                update.category = Some(category.to_string());
            }
        }

        if let Some(raw) = provided(&row.price).filter(|v| !v.trim().is_empty()) {
            match parse_price(raw) {
                Some(price) => update.price_cents = Some(price.cents()),
                None => plan.errors.push(RowError::new(row_num, "Price", PRICE_MESSAGE, raw)),
            }
        }

        if let Some(raw) = provided(&row.stock).filter(|v| !v.trim().is_empty()) {
            match parse_stock(raw) {
                Some(stock) => update.stock = Some(stock),
                None => plan.errors.push(RowError::new(row_num, "Stock", STOCK_MESSAGE, raw)),
            }
        }

        if plan.errors.len() == errors_before && !update.is_empty() {
            plan.updates.push((id.to_string(), update));
        }
    }

    Ok(plan)
}

// =============================================================================
// Helpers
// =============================================================================

fn read_rows<T: for<'de> Deserialize<'de>>(csv_text: &str) -> CoreResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_text.as_bytes());

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| CoreError::Csv(e.to_string()))
}

/// A cell that is present and not the empty string. Whitespace counts as present.
fn provided(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|v| !v.is_empty())
}

fn parse_price(raw: &str) -> Option<Money> {
    Money::parse_decimal(raw)
        .ok()
        .filter(|price| validate_price_cents(price.cents()).is_ok())
}

fn parse_stock(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|n| n.to_lowercase()).collect()
    }

    #[test]
    fn test_upload_valid_and_invalid_rows() {
        let csv = "Name,Category,Price,Stock\n\
                   Claw Hammer,Tools,1200.00,15\n\
                   ,Tools,5,1\n\
                   Pliers,Tools,0,3\n\
                   Spanner,Tools,450,-2\n\
                   Tape,Tools,99.5,2.5\n\
                   Paint Roller,Painting,350,0\n";

        let plan = plan_upload(csv, &HashSet::new()).unwrap();

        let inserted: Vec<&str> = plan.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(inserted, vec!["Claw Hammer", "Paint Roller"]);
        assert_eq!(plan.products[0].price_cents, 120000);
        assert_eq!(plan.products[1].stock, 0);

        let rejected: Vec<(usize, &str)> = plan.errors.iter().map(|e| (e.row, e.field.as_str())).collect();
        assert_eq!(rejected, vec![(3, "Name"), (4, "Price"), (5, "Stock"), (6, "Stock")]);
        assert_eq!(plan.errors[2].message, "Stock must be a whole number ≥ 0");
        assert_eq!(plan.errors[2].value, "-2");
    }

    #[test]
    fn test_upload_duplicate_names() {
        let csv = "Name,Category,Price,Stock\n\
                   Claw Hammer,Tools,1200,1\n\
                   wire brush,Tools,300,4\n\
                   Wire Brush,Tools,300,4\n";

        let plan = plan_upload(csv, &names(&["Claw Hammer"])).unwrap();

        assert_eq!(plan.products.len(), 1);
        assert_eq!(plan.products[0].name, "wire brush");
        assert_eq!(plan.errors.len(), 2);
        assert_eq!(plan.errors[0].message, "Product already exists in database");
        assert_eq!(plan.errors[1].row, 4);
        assert_eq!(plan.errors[1].message, "Duplicate product name within this file");
    }

    #[test]
    fn test_upload_missing_category_column() {
        let csv = "Name,Price,Stock\nSaw,800,2\n";
        let plan = plan_upload(csv, &HashSet::new()).unwrap();
        assert!(plan.products.is_empty());
        assert_eq!(plan.errors[0].message, "Category must not be empty");
    }

    #[test]
    fn test_update_plan() {
        let ids: HashSet<String> = ["p1", "p2", "p3"].iter().map(|s| s.to_string()).collect();
        let csv = "ID,Name,Category,Price,Stock\n\
                   p1,Claw Hammer,,1350.00,\n\
                   ,Orphan,Tools,10,1\n\
                   ghost,Ghost,Tools,10,1\n\
                   p2,Pliers,\"  \",abc,\n\
                   p3,Spanner,,,\n";

        let plan = plan_update(csv, &ids).unwrap();

        assert_eq!(plan.updates.len(), 1);
        let (id, update) = &plan.updates[0];
        assert_eq!(id, "p1");
        assert_eq!(update.price_cents, Some(135000));
        assert_eq!(update.category, None);
        assert_eq!(update.stock, None);

        assert_eq!(plan.not_found, vec!["Missing ID in row 3".to_string(), "ghost".to_string()]);

        let fields: Vec<(usize, &str)> = plan.errors.iter().map(|e| (e.row, e.field.as_str())).collect();
        assert_eq!(fields, vec![(5, "Category"), (5, "Price")]);
    }

    #[test]
    fn test_update_negative_stock() {
        let ids: HashSet<String> = ["p1".to_string()].into_iter().collect();
        let plan = plan_update("ID,Stock\np1,-4\n", &ids).unwrap();
        assert!(plan.updates.is_empty());
        assert_eq!(plan.errors[0].message, "Stock must be a whole number ≥ 0");
    }

    #[test]
    fn test_upload_overlong_name() {
        let csv = format!("Name,Category,Price,Stock\n{},Tools,10,1\n", "x".repeat(201));
        let plan = plan_upload(&csv, &HashSet::new()).unwrap();
        assert!(plan.products.is_empty());
        assert_eq!(plan.errors[0].field, "Name");
        assert_eq!(plan.errors[0].message, "name must be at most 200 characters");
    }

    #[test]
    fn test_update_price_above_maximum() {
        let ids: HashSet<String> = ["p1".to_string()].into_iter().collect();
        let plan = plan_update("ID,Price\np1,100000000.01\n", &ids).unwrap();
        assert!(plan.updates.is_empty());
        assert_eq!(plan.errors[0].field, "Price");

        let plan = plan_update("ID,Price\np1,100000000\n", &ids).unwrap();
        assert_eq!(plan.updates[0].1.price_cents, Some(crate::MAX_PRICE_CENTS));
    }
}
