use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Gender – numeric code as published in the registration data
// ---------------------------------------------------------------------------

/// Gender of a registration. The source encodes it as `1` (male) / `2` (female)
/// and the dashboard consumes the same numeric code, so it serializes as a `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    Male = 1,
    Female = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown gender code {0} (expected 1 or 2)")]
pub struct UnknownGender(pub u8);

impl TryFrom<u8> for Gender {
    type Error = UnknownGender;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            other => Err(UnknownGender(other)),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender as u8
    }
}

// ---------------------------------------------------------------------------
// District – ISO code or free-form label, normalized to text
// ---------------------------------------------------------------------------

/// A district as it may appear on the wire or in a source file: the official
/// data uses numeric ISO codes, hand-made files tend to use strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DistrictValue {
    Code(i64),
    Label(String),
}

impl From<DistrictValue> for String {
    fn from(value: DistrictValue) -> Self {
        match value {
            DistrictValue::Code(code) => code.to_string(),
            DistrictValue::Label(label) => label,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the registration table
// ---------------------------------------------------------------------------

/// A single registration row. Several rows may share
/// (year, district, gender, name); their counts add up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub year: i32,
    pub district: String,
    pub gender: Gender,
    pub name: String,
    pub count: u64,
}

impl Record {
    pub fn key(&self) -> NameKey<'_> {
        NameKey {
            name: &self.name,
            gender: self.gender,
        }
    }
}

/// The (name, gender) pair every aggregation groups by. Identically spelled
/// names of different gender are different entities.
///
/// Ordering is name first, then gender; ranked output relies on it as the
/// tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameKey<'a> {
    pub name: &'a str,
    pub gender: Gender,
}

// ---------------------------------------------------------------------------
// NamesDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded registration table. Built once at startup and never mutated
/// afterwards; every query borrows it.
#[derive(Debug, Clone, Default)]
pub struct NamesDataset {
    records: Vec<Record>,
    districts: BTreeSet<String>,
    year_span: Option<(i32, i32)>,
}

impl NamesDataset {
    /// Freeze the records and build the district / year indices.
    pub fn from_records(records: Vec<Record>) -> Self {
        let districts: BTreeSet<String> = records.iter().map(|r| r.district.clone()).collect();
        let year_span = records.iter().fold(None, |span, r| match span {
            None => Some((r.year, r.year)),
            Some((lo, hi)) => Some((lo.min(r.year), hi.max(r.year))),
        });
        NamesDataset {
            records,
            districts,
            year_span,
        }
    }

    /// All records, in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// A fresh working set referencing every record.
    pub fn rows(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    /// The first `n` records, for debug previews.
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }

    /// Sorted set of distinct districts.
    pub fn districts(&self) -> &BTreeSet<String> {
        &self.districts
    }

    /// Smallest and largest year present, `None` for an empty table.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        self.year_span
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
