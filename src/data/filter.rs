use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::aggregate::{distinct_districts, group_sum};
use super::model::{NameKey, Record};

// ---------------------------------------------------------------------------
// Filter bounds
// ---------------------------------------------------------------------------
//
// Every bound is optional. An absent bound (or an absent bounds struct) never
// filters anything. Bounds are taken as given: `min > max` or a negative
// maximum is not rejected, it just matches nothing. A negative minimum matches
// everything.

/// Inclusive year window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    #[serde(default, rename = "year_min")]
    pub min: Option<i32>,
    #[serde(default, rename = "year_max")]
    pub max: Option<i32>,
}

impl YearRange {
    pub fn new(min: Option<i32>, max: Option<i32>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min.map_or(true, |min| year >= min) && self.max.map_or(true, |max| year <= max)
    }
}

/// Upper limits on how popular a name may be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxBounds {
    /// Limit on the summed count over all (surviving) years.
    #[serde(default, rename = "maxtotal")]
    pub max_total: Option<i64>,
    /// Limit on the count within any single year.
    #[serde(default, rename = "maxperyear")]
    pub max_per_year: Option<i64>,
}

impl MaxBounds {
    pub fn is_unbounded(&self) -> bool {
        self.max_total.is_none() && self.max_per_year.is_none()
    }
}

/// Inclusive bounds on the number of distinct districts a name appears in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCountBounds {
    #[serde(default, rename = "minDistricts")]
    pub min: Option<i64>,
    #[serde(default, rename = "maxDistricts")]
    pub max: Option<i64>,
}

impl DistrictCountBounds {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, districts: usize) -> bool {
        let districts = districts as u64;
        self.min.map_or(true, |min| at_least(districts, min))
            && self.max.map_or(true, |max| at_most(districts, max))
    }
}

fn at_least(value: u64, min: i64) -> bool {
    u64::try_from(min).map_or(true, |min| value >= min)
}

fn at_most(value: u64, max: i64) -> bool {
    u64::try_from(max).is_ok_and(|max| value <= max)
}

/// The dashboard's filter panel. Each query reads the dimensions it supports
/// and ignores the rest; the name filter is passed separately to the queries
/// that need one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub years: Option<YearRange>,
    pub district: Option<String>,
    pub maxes: Option<MaxBounds>,
    pub district_counts: Option<DistrictCountBounds>,
}

// ---------------------------------------------------------------------------
// Filter stages
// ---------------------------------------------------------------------------
//
// Each stage borrows the current working set and returns a new one; the
// input slice is left untouched.

/// Keep rows inside the year window.
pub fn filter_years<'a>(rows: &[&'a Record], range: Option<&YearRange>) -> Vec<&'a Record> {
    match range {
        None => rows.to_vec(),
        Some(range) => rows.iter().copied().filter(|r| range.contains(r.year)).collect(),
    }
}

/// Keep rows of exactly this district.
pub fn filter_district<'a>(rows: &[&'a Record], district: Option<&str>) -> Vec<&'a Record> {
    match district {
        None => rows.to_vec(),
        Some(district) => rows.iter().copied().filter(|r| r.district == district).collect(),
    }
}

/// Keep rows whose name equals `name`, ignoring case.
pub fn filter_name<'a>(rows: &[&'a Record], name: Option<&str>) -> Vec<&'a Record> {
    match name {
        None => rows.to_vec(),
        Some(name) => {
            let wanted = name.to_lowercase();
            rows.iter()
                .copied()
                .filter(|r| r.name.to_lowercase() == wanted)
                .collect()
        }
    }
}

/// Drop names that are too popular.
///
/// Per (year, name, gender) the counts are summed first; years above
/// `max_per_year` are discarded (only that year, not the whole name). The
/// remaining years are summed per (name, gender) and compared to `max_total`.
///
/// Rows are kept by name alone: if one gender of a name survives, rows of the
/// other gender with the same spelling survive too.
pub fn filter_maxes<'a>(rows: &[&'a Record], maxes: Option<&MaxBounds>) -> Vec<&'a Record> {
    let Some(bounds) = maxes.filter(|b| !b.is_unbounded()) else {
        return rows.to_vec();
    };

    let per_year = group_sum(rows, |r| (r.year, r.key()));

    let mut totals: BTreeMap<NameKey<'a>, u64> = BTreeMap::new();
    for ((_, key), count) in per_year {
        if bounds.max_per_year.is_some_and(|max| !at_most(count, max)) {
            continue;
        }
        *totals.entry(key).or_insert(0) += count;
    }

    let surviving: BTreeSet<&str> = totals
        .into_iter()
        .filter(|(_, total)| bounds.max_total.map_or(true, |max| at_most(*total, max)))
        .map(|(key, _)| key.name)
        .collect();

    rows.iter()
        .copied()
        .filter(|r| surviving.contains(r.name.as_str()))
        .collect()
}

/// Keep rows whose (name, gender) appears in a number of distinct districts
/// within the bounds. Districts are counted over `rows` itself.
pub fn filter_district_counts<'a>(
    rows: &[&'a Record],
    bounds: Option<&DistrictCountBounds>,
) -> Vec<&'a Record> {
    let Some(bounds) = bounds.filter(|b| !b.is_unbounded()) else {
        return rows.to_vec();
    };

    let counts = distinct_districts(rows);
    rows.iter()
        .copied()
        .filter(|r| counts.get(&r.key()).is_some_and(|n| bounds.contains(*n)))
        .collect()
}
