//! Parser for the catalog export files.
//!
//! - products.dat: id::name::description::price::image_url::category
//! - order_items.dat: order_id::product_id::quantity
//!
//! Empty optional fields (description, price, image_url) become `None`.

use crate::error::{CatalogError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::Split;

/// Read a file as lines, replacing invalid UTF-8 instead of failing.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = String::from_utf8_lossy(&bytes);
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Pull the next `::` field or report which one is missing
fn next_field<'a>(
    parts: &mut Split<'a, &str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

fn parse_number<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse the products.dat file
pub fn parse_products(path: &Path) -> Result<Vec<CatalogItem>> {
    const FILE: &str = "products.dat";
    let lines = read_lines(path)?;
    let mut items = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let id = next_field(&mut parts, FILE, line_no, "id")?;
        let name = next_field(&mut parts, FILE, line_no, "name")?;
        let description = next_field(&mut parts, FILE, line_no, "description")?;
        let price = next_field(&mut parts, FILE, line_no, "price")?;
        let image_url = next_field(&mut parts, FILE, line_no, "image_url")?;
        let category = next_field(&mut parts, FILE, line_no, "category")?;

        let price = match price.trim() {
            "" => None,
            p => Some(parse_number::<f64>(p, FILE, line_no, "price")?),
        };

        items.push(CatalogItem {
            id: parse_number(id, FILE, line_no, "id")?,
            name: name.trim().to_string(),
            description: optional(description),
            price,
            image_url: optional(image_url),
            category: category.trim().to_string(),
        });
    }

    Ok(items)
}

/// Parse the order_items.dat file
pub fn parse_order_lines(path: &Path) -> Result<Vec<OrderLine>> {
    const FILE: &str = "order_items.dat";
    let lines = read_lines(path)?;
    let mut order_lines = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let order_id = next_field(&mut parts, FILE, line_no, "order_id")?;
        let product_id = next_field(&mut parts, FILE, line_no, "product_id")?;
        let quantity = next_field(&mut parts, FILE, line_no, "quantity")?;

        order_lines.push(OrderLine {
            order_id: parse_number(order_id, FILE, line_no, "order_id")?,
            product_id: parse_number(product_id, FILE, line_no, "product_id")?,
            quantity: parse_number(quantity, FILE, line_no, "quantity")?,
        });
    }

    Ok(order_lines)
}
