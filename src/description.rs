//! Resource descriptions: the metadata every artifact carries.
//!
//! A [`ResourceDescription`] is an open mapping from property name to a typed
//! [`PropertyValue`]. A handful of names are well known and get typed
//! accessors (`title`, `description`, `published-on`, `content-type`,
//! `copyright`, `order`); anything else is an ad-hoc property, by convention
//! namespaced with a colon (`image:width`).
//!
//! ## Sources
//!
//! Descriptions are assembled once, at plan time, from up to three sources.
//! Each property is resolved independently and the first source that
//! provides it wins:
//!
//! 1. **Sidecar**: `<file name>.meta.toml` beside the file, a flat table of
//!    properties. The author wrote it on purpose, so it overrides everything.
//! 2. **Embedded**: what the file says about itself: a markdown `# heading`,
//!    an HTML `<title>`, image dimensions.
//! 3. **File name**: the `NNN-name` convention (see [`crate::naming`]).
//!
//! ## Typing
//!
//! Sidecar values are typed through a [`PropertyTypeTable`]: a list of
//! property-name patterns, each mapped to the type its values must parse as.
//! Names ending in `-on`/`On` are dates, `order` is an integer,
//! `content-type` is a media type. Names that match no rule take the type of
//! the TOML value as written. A value that fails to parse is reported with
//! the property name and the raw value.

use crate::types::MediaType;
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const PUBLISHED_ON: &str = "published-on";
pub const CONTENT_TYPE: &str = "content-type";
pub const COPYRIGHT: &str = "copyright";
pub const ORDER: &str = "order";

/// Suffix appended to a file name to find its sidecar.
pub const SIDECAR_SUFFIX: &str = ".meta.toml";

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value {value} for property `{name}`: expected {expected}")]
    InvalidProperty {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    MediaType(MediaType),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_media_type(&self) -> Option<&MediaType> {
        match self {
            Self::MediaType(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::MediaType(m) => write!(f, "{m}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Property name → value mapping for one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceDescription {
    properties: BTreeMap<String, PropertyValue>,
}

impl ResourceDescription {
    pub const fn new() -> Self {
        Self {
            properties: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.insert(name.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set a property only if no higher-priority source already did.
    pub fn set_if_absent(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.properties.entry(name.into()).or_insert(value);
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn title(&self) -> Option<&str> {
        self.get(TITLE).and_then(PropertyValue::as_text)
    }

    pub fn description(&self) -> Option<&str> {
        self.get(DESCRIPTION).and_then(PropertyValue::as_text)
    }

    pub fn published_on(&self) -> Option<NaiveDate> {
        self.get(PUBLISHED_ON).and_then(PropertyValue::as_date)
    }

    pub fn content_type(&self) -> Option<&MediaType> {
        self.get(CONTENT_TYPE).and_then(PropertyValue::as_media_type)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.get(COPYRIGHT).and_then(PropertyValue::as_text)
    }

    pub fn order(&self) -> Option<i64> {
        self.get(ORDER).and_then(PropertyValue::as_integer)
    }
}

/// The type a property's values must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Text,
    Integer,
    Boolean,
    Date,
    MediaType,
}

impl PropertyType {
    fn expected(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "an integer",
            Self::Boolean => "a boolean",
            Self::Date => "a date (YYYY-MM-DD)",
            Self::MediaType => "a media type (type/subtype)",
        }
    }
}

/// Property-name patterns mapped to property types. First match wins.
#[derive(Debug, Clone)]
pub struct PropertyTypeTable {
    rules: Vec<(Regex, PropertyType)>,
}

impl Default for PropertyTypeTable {
    fn default() -> Self {
        let rule = |pattern: &str, ty| (Regex::new(pattern).expect("built-in pattern"), ty);
        Self {
            rules: vec![
                rule(r"^order$", PropertyType::Integer),
                rule(r"^content-type$", PropertyType::MediaType),
                rule(r"(-on|On)$", PropertyType::Date),
            ],
        }
    }
}

impl PropertyTypeTable {
    /// A table with no rules: every value keeps its written TOML type.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule ahead of the existing ones.
    pub fn with_rule(mut self, pattern: &str, ty: PropertyType) -> Result<Self, regex::Error> {
        self.rules.insert(0, (Regex::new(pattern)?, ty));
        Ok(self)
    }

    pub fn type_for(&self, name: &str) -> Option<PropertyType> {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, ty)| *ty)
    }

    /// Parse a raw TOML value for `name` according to the table.
    pub fn parse(&self, name: &str, value: &toml::Value) -> Result<PropertyValue, DescriptionError> {
        match self.type_for(name) {
            Some(ty) => parse_typed(name, value, ty),
            None => parse_untyped(name, value),
        }
    }
}

fn invalid(name: &str, value: &toml::Value, expected: &'static str) -> DescriptionError {
    DescriptionError::InvalidProperty {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn parse_typed(
    name: &str,
    value: &toml::Value,
    ty: PropertyType,
) -> Result<PropertyValue, DescriptionError> {
    let parsed = match (ty, value) {
        (PropertyType::Text, toml::Value::String(s)) => Some(PropertyValue::Text(s.clone())),
        (PropertyType::Integer, toml::Value::Integer(i)) => Some(PropertyValue::Integer(*i)),
        (PropertyType::Integer, toml::Value::String(s)) => {
            s.trim().parse().ok().map(PropertyValue::Integer)
        }
        (PropertyType::Boolean, toml::Value::Boolean(b)) => Some(PropertyValue::Boolean(*b)),
        (PropertyType::Date, toml::Value::String(s)) => parse_date(s).map(PropertyValue::Date),
        (PropertyType::Date, toml::Value::Datetime(dt)) => dt
            .date
            .filter(|_| dt.time.is_none())
            .and_then(|d| NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into()))
            .map(PropertyValue::Date),
        (PropertyType::MediaType, toml::Value::String(s)) => {
            s.parse().ok().map(PropertyValue::MediaType)
        }
        _ => None,
    };
    parsed.ok_or_else(|| invalid(name, value, ty.expected()))
}

fn parse_untyped(name: &str, value: &toml::Value) -> Result<PropertyValue, DescriptionError> {
    Ok(match value {
        toml::Value::String(s) => PropertyValue::Text(s.clone()),
        toml::Value::Integer(i) => PropertyValue::Integer(*i),
        toml::Value::Float(x) => PropertyValue::Float(*x),
        toml::Value::Boolean(b) => PropertyValue::Boolean(*b),
        toml::Value::Datetime(_) => parse_typed(name, value, PropertyType::Date)?,
        toml::Value::Array(items) => PropertyValue::List(
            items
                .iter()
                .map(|item| parse_untyped(name, item))
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(_) => return Err(invalid(name, value, "a scalar or a list")),
    })
}

/// Resolve a text field from several sources in priority order.
///
/// Returns the first non-empty value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Where the sidecar for `source` lives: `post.md` → `post.md.meta.toml`.
pub fn sidecar_path(source: &Path) -> PathBuf {
    let mut name = source.file_name().unwrap_or_default().to_os_string();
    name.push(SIDECAR_SUFFIX);
    source.with_file_name(name)
}

pub fn is_sidecar(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(SIDECAR_SUFFIX))
}

/// Load the sidecar description for `source`, empty if there is none.
pub fn load_sidecar(
    source: &Path,
    table: &PropertyTypeTable,
) -> Result<ResourceDescription, DescriptionError> {
    let path = sidecar_path(source);
    if !path.is_file() {
        return Ok(ResourceDescription::new());
    }
    let content = std::fs::read_to_string(&path)?;
    let raw: toml::Table =
        toml::from_str(&content).map_err(|source| DescriptionError::Toml { path, source })?;

    let mut description = ResourceDescription::new();
    for (name, value) in &raw {
        description.set(name.as_str(), table.parse(name, value)?);
    }
    Ok(description)
}
