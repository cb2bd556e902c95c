//! Filter Set Module
//!
//! Typed search filters. Every field is declared once in [`FilterField`] and
//! carries a fixed [`FieldKind`], so the matcher never probes for properties at
//! runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// == Field Kind ==
/// How a field participates in compatibility matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Cached and requested values must agree
    Exact,
    /// Numeric floor; a lower cached floor is broader
    RangeMin,
    /// Numeric ceiling; a higher cached ceiling is broader
    RangeMax,
}

// == Filter Field ==
/// Every filter the explorer understands.
///
/// Variant order is the canonical serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Platform,
    Country,
    Language,
    Gender,
    Category,
    Keyword,
    Page,
    Size,
    MinFollowers,
    MinEngagement,
    MinAge,
    MaxFollowers,
    MaxEngagement,
    MaxAge,
}

impl FilterField {
    /// All fields in canonical order.
    pub const ALL: [FilterField; 14] = [
        FilterField::Platform,
        FilterField::Country,
        FilterField::Language,
        FilterField::Gender,
        FilterField::Category,
        FilterField::Keyword,
        FilterField::Page,
        FilterField::Size,
        FilterField::MinFollowers,
        FilterField::MinEngagement,
        FilterField::MinAge,
        FilterField::MaxFollowers,
        FilterField::MaxEngagement,
        FilterField::MaxAge,
    ];

    /// The schema entry for this field.
    pub const fn kind(self) -> FieldKind {
        match self {
            FilterField::Platform
            | FilterField::Country
            | FilterField::Language
            | FilterField::Gender
            | FilterField::Category
            | FilterField::Keyword
            | FilterField::Page
            | FilterField::Size => FieldKind::Exact,
            FilterField::MinFollowers | FilterField::MinEngagement | FilterField::MinAge => {
                FieldKind::RangeMin
            }
            FilterField::MaxFollowers | FilterField::MaxEngagement | FilterField::MaxAge => {
                FieldKind::RangeMax
            }
        }
    }

    /// Wire name, as accepted in request bodies.
    pub const fn name(self) -> &'static str {
        match self {
            FilterField::Platform => "platform",
            FilterField::Country => "country",
            FilterField::Language => "language",
            FilterField::Gender => "gender",
            FilterField::Category => "category",
            FilterField::Keyword => "keyword",
            FilterField::Page => "page",
            FilterField::Size => "size",
            FilterField::MinFollowers => "minFollowers",
            FilterField::MinEngagement => "minEngagement",
            FilterField::MinAge => "minAge",
            FilterField::MaxFollowers => "maxFollowers",
            FilterField::MaxEngagement => "maxEngagement",
            FilterField::MaxAge => "maxAge",
        }
    }

    /// Fields of one kind, in canonical order.
    pub fn of_kind(kind: FieldKind) -> impl Iterator<Item = FilterField> {
        Self::ALL.into_iter().filter(move |f| f.kind() == kind)
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Filter Value ==
/// A single filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    /// Numeric view, None for text values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(_) => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Number(f64::from(value))
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Number(f64::from(value))
    }
}

// == Filter Set ==
/// An ordered mapping from filter field to value.
///
/// Backed by a `BTreeMap`, so two sets built in different insertion orders are
/// equal and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    fields: BTreeMap<FilterField, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: FilterField, value: impl Into<FilterValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: FilterField, value: impl Into<FilterValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn remove(&mut self, field: FilterField) -> Option<FilterValue> {
        self.fields.remove(&field)
    }

    pub fn get(&self, field: FilterField) -> Option<&FilterValue> {
        self.fields.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &FilterValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    /// Copy of this set pinned to one result page.
    pub fn with_page(&self, page: u32, size: u32) -> Self {
        self.clone()
            .with(FilterField::Page, page)
            .with(FilterField::Size, size)
    }

    /// Copy of this set with pagination removed; identifies the logical query.
    pub fn without_pagination(&self) -> Self {
        let mut logical = self.clone();
        logical.remove(FilterField::Page);
        logical.remove(FilterField::Size);
        logical
    }
}

impl FromIterator<(FilterField, FilterValue)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (FilterField, FilterValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
