//! Column extraction from OData `$metadata` documents.
//!
//! Only the first `EntityType` is read. The parser is deliberately shallow:
//! attribute order inside a tag does not matter, unknown elements are
//! skipped, and a document without any `Property` yields an error so callers
//! can fall back to sample inference.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{CatalogError, CatalogResult};
use super::types::ColumnInfo;

#[allow(clippy::expect_used)]
static ENTITY_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?EntityType\b[^>]*>(.*?)</(?:\w+:)?EntityType>")
        .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?Property\b([^>]*?)(?:/>|>(.*?)</(?:\w+:)?Property>)")
        .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static PROPERTY_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:\w+:)?PropertyRef\b[^>]*\bName="([^"]*)""#)
        .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w:.]+)\s*=\s*"([^"]*)""#).expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:\w+:)?Summary>(.*?)</(?:\w+:)?Summary>")
        .expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static LABEL_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<Annotation\b[^>]*Term="[^"]*Label"[^>]*String="([^"]*)""#)
        .expect("Hard-coded regex pattern should be valid")
});

/// Extracts column definitions from a metadata document.
///
/// # Errors
///
/// Returns `CatalogError::Metadata` when no entity type or no property is found.
pub fn parse_relational_metadata(document: &str) -> CatalogResult<Vec<ColumnInfo>> {
    let entity = ENTITY_TYPE
        .captures(document)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CatalogError::Metadata {
            message: "no EntityType element in metadata document".to_string(),
        })?;

    let keys: HashSet<String> = PROPERTY_REF
        .captures_iter(entity)
        .filter_map(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .collect();

    let columns: Vec<ColumnInfo> = PROPERTY
        .captures_iter(entity)
        .filter_map(|caps| {
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            property_to_column(attrs, body, &keys)
        })
        .collect();

    if columns.is_empty() {
        return Err(CatalogError::Metadata {
            message: "metadata document declares no properties".to_string(),
        });
    }

    Ok(columns)
}

fn property_to_column(attrs: &str, body: &str, keys: &HashSet<String>) -> Option<ColumnInfo> {
    let mut name = None;
    let mut data_type = None;
    let mut nullable = true;
    let mut label = None;

    for caps in ATTRIBUTE.captures_iter(attrs) {
        let value = unescape(&caps[2]);
        match &caps[1] {
            "Name" => name = Some(value),
            "Type" => data_type = Some(value),
            "Nullable" => nullable = !value.eq_ignore_ascii_case("false"),
            "sap:label" => label = Some(value),
            _ => {}
        }
    }

    let name = name?;
    let is_key = keys.contains(&name);
    let description = SUMMARY
        .captures(body)
        .or_else(|| LABEL_ANNOTATION.captures(body))
        .map(|c| unescape(c[1].trim()))
        .or(label)
        .filter(|d| !d.is_empty());

    Some(ColumnInfo {
        data_type: data_type.unwrap_or_else(|| "unknown".to_string()),
        nullable: nullable && !is_key,
        is_key,
        description,
        name,
    })
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
