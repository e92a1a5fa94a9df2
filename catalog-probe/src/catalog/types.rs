use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::security::InputSecurity;

/// A logical catalog space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl Space {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            raw: Value::Null,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds a space from one entry of a catalog `value` array.
    ///
    /// Returns `None` when the entry carries no usable identifier.
    pub fn from_json(raw: Value) -> Option<Self> {
        let id = first_string(&raw, &["id", "name", "spaceId", "technicalName"])?;
        let name = first_string(&raw, &["businessName", "label", "name"]).unwrap_or_else(|| id.clone());
        let description = first_string(&raw, &["description"]);
        Some(Self {
            id,
            name,
            description,
            raw,
        })
    }
}

/// A tabular or analytical asset inside a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub space_id: String,
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl Asset {
    pub fn new(
        space_id: impl Into<String>,
        id: impl Into<String>,
        asset_type: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            space_id: space_id.into(),
            asset_type: asset_type.into(),
            description: None,
            raw: Value::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }

    /// Builds an asset from one entry of a catalog `value` array.
    ///
    /// `space_id` is used when the payload does not name its space.
    pub fn from_json(space_id: &str, raw: Value) -> Option<Self> {
        let id = first_string(&raw, &["id", "name", "technicalName"])?;
        let name = first_string(&raw, &["businessName", "label", "name"]).unwrap_or_else(|| id.clone());
        let space_id = first_string(&raw, &["spaceName", "spaceId", "space"])
            .unwrap_or_else(|| space_id.to_string());
        let asset_type = first_string(&raw, &["type", "assetType", "kind"])
            .unwrap_or_else(|| "unknown".to_string());
        let description = first_string(&raw, &["description"]);
        Some(Self {
            id,
            name,
            space_id,
            asset_type,
            description,
            raw,
        })
    }

    /// Whether the catalog advertises row-level (relational) consumption.
    pub fn supports_relational(&self) -> bool {
        flag_or_url(&self.raw, "supportsRelationalConsumption", "assetRelationalDataUrl")
    }

    /// Whether the catalog advertises analytical (cube) consumption.
    pub fn supports_analytical(&self) -> bool {
        flag_or_url(&self.raw, "supportsAnalyticalQueries", "assetAnalyticalDataUrl")
    }

    /// True when `query` appears in the id, name or description, ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.id.to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Column definition from an asset's metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_key: false,
            description: None,
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.nullable = false;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Identifies one asset inside one space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub space_id: String,
    pub asset_name: String,
}

impl AssetRef {
    pub fn new(space_id: impl Into<String>, asset_name: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            asset_name: asset_name.into(),
        }
    }

    /// Rejects names that cannot be safely embedded in request paths.
    pub fn validate(&self) -> Result<()> {
        InputSecurity::validate_identifier(&self.space_id, "space")?;
        InputSecurity::validate_identifier(&self.asset_name, "asset")
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.space_id, self.asset_name)
    }
}

/// Options of a relational row request.
///
/// `filter` and `order_by` are passed to the server verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationalQuery {
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    pub top: usize,
    #[serde(default)]
    pub skip: usize,
}

impl RelationalQuery {
    pub fn new(top: usize) -> Self {
        Self {
            select: Vec::new(),
            filter: None,
            order_by: None,
            top,
            skip: 0,
        }
    }

    pub fn with_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Validates column names and expressions before they reach the server.
    pub fn validate(&self) -> Result<()> {
        for column in &self.select {
            InputSecurity::validate_identifier(column, "column")?;
        }
        if let Some(filter) = &self.filter {
            InputSecurity::validate_expression(filter, "filter")?;
        }
        if let Some(order_by) = &self.order_by {
            InputSecurity::validate_expression(order_by, "order_by")?;
        }
        Ok(())
    }

    /// OData system query options for this request.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if !self.select.is_empty() {
            pairs.push(("$select", self.select.join(",")));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push(("$orderby", order_by.clone()));
        }
        pairs.push(("$top", self.top.to_string()));
        if self.skip > 0 {
            pairs.push(("$skip", self.skip.to_string()));
        }
        pairs
    }
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

fn flag_or_url(raw: &Value, flag: &str, url_key: &str) -> bool {
    match raw.get(flag).and_then(Value::as_bool) {
        Some(flag) => flag,
        None => raw
            .get(url_key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty()),
    }
}
