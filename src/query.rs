//! The four dashboard queries.
//!
//! Every query starts from the full dataset and runs the filter stages in a
//! fixed order. The order is part of the contract: the district-count filter
//! sees the whole year-filtered population, the district filter only narrows
//! afterwards, and the maxes filter judges popularity inside the selected
//! district.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::data::aggregate::{
    distinct_districts, group_max, left_join, sum_by_district, sum_by_name, sum_by_year,
};
use crate::data::filter::{
    filter_district, filter_district_counts, filter_maxes, filter_name, filter_years, FilterSpec,
    YearRange,
};
use crate::data::model::{Gender, NamesDataset, Record};

/// Number of rows in the ranked name table.
pub const TOP_N: usize = 8;

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

/// One row of the ranked name table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedName {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    /// Count after every filter.
    #[serde(rename = "Count")]
    pub count: u64,
    /// Distinct districts the name appears in within the year window.
    #[serde(rename = "DistrictCount")]
    pub district_count: usize,
    /// Nationwide count within the year window.
    #[serde(rename = "Count_total")]
    pub count_total: u64,
}

/// Line chart data for one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearTrend {
    pub name: String,
    pub yearly_counts: BTreeMap<i32, u64>,
}

/// One point of the rarity scatterplot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RarityPoint {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Count_district")]
    pub count_district: u64,
    #[serde(rename = "Count_total")]
    pub count_total: u64,
}

/// Map data for one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictChoropleth {
    pub name: String,
    pub district_counts: BTreeMap<String, u64>,
    /// Largest value in `district_counts`, `0` when it is empty.
    pub max_count: u64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Shared head of the table and scatterplot pipelines: district-count,
/// district and maxes filters applied to an already year-filtered set.
fn narrow<'a>(year_rows: &[&'a Record], filters: &FilterSpec) -> Vec<&'a Record> {
    let rows = filter_district_counts(year_rows, filters.district_counts.as_ref());
    let rows = filter_district(&rows, filters.district.as_deref());
    filter_maxes(&rows, filters.maxes.as_ref())
}

/// The ranked name table: the [`TOP_N`] most frequent (name, gender) pairs
/// surviving all filters, largest count first. Equal counts keep name, then
/// gender order.
pub fn ranked_name_table(dataset: &NamesDataset, filters: &FilterSpec) -> Vec<RankedName> {
    let all = dataset.rows();
    let year_rows = filter_years(&all, filters.years.as_ref());

    let totals = sum_by_name(&year_rows);
    let district_counts = distinct_districts(&year_rows);

    let rows = narrow(&year_rows, filters);
    let counts = sum_by_name(&rows);
    let widest = group_max(
        left_join(rows, &district_counts, |r| r.key())
            .into_iter()
            .map(|(r, districts)| (r.key(), districts.copied().unwrap_or(0))),
    );

    let counted: Vec<_> = counts.into_iter().collect();
    let mut table: Vec<RankedName> = left_join(counted, &totals, |(key, _)| *key)
        .into_iter()
        .map(|((key, count), total)| RankedName {
            name: key.name.to_string(),
            gender: key.gender,
            count,
            district_count: widest.get(&key).copied().unwrap_or(0),
            count_total: total.copied().unwrap_or(0),
        })
        .collect();

    debug!("name table: {} candidates before top-{TOP_N} cut", table.len());

    table.sort_by(|a, b| b.count.cmp(&a.count));
    table.truncate(TOP_N);
    table
}

/// Per-year counts of `name` (any case) within the year window and district.
/// Years without registrations are left out.
pub fn year_trend(dataset: &NamesDataset, name: &str, filters: &FilterSpec) -> YearTrend {
    let all = dataset.rows();
    let rows = filter_years(&all, filters.years.as_ref());
    let rows = filter_district(&rows, filters.district.as_deref());
    let rows = filter_name(&rows, Some(name));

    YearTrend {
        name: name.to_string(),
        yearly_counts: sum_by_year(&rows),
    }
}

/// Scatterplot data: for every (name, gender) surviving the filters, its
/// count in the selected district next to its nationwide count.
///
/// Both counts are taken from the year-filtered population before the
/// district-count and maxes filters run.
pub fn rarity_scatter(dataset: &NamesDataset, filters: &FilterSpec) -> Vec<RarityPoint> {
    let all = dataset.rows();
    let year_rows = filter_years(&all, filters.years.as_ref());

    let in_district = sum_by_name(&filter_district(&year_rows, filters.district.as_deref()));
    let totals = sum_by_name(&year_rows);

    let rows = narrow(&year_rows, filters);
    let survivors: Vec<_> = sum_by_name(&rows).into_keys().collect();

    let points: Vec<RarityPoint> = left_join(survivors, &in_district, |key| *key)
        .into_iter()
        .map(|(key, local)| RarityPoint {
            name: key.name.to_string(),
            gender: key.gender,
            count_district: local.copied().unwrap_or(0),
            count_total: totals.get(&key).copied().unwrap_or(0),
        })
        .collect();

    debug!("rarity scatter: {} points", points.len());
    points
}

/// Map data: per-district counts of `name` (any case) within the year window.
pub fn district_choropleth(
    dataset: &NamesDataset,
    name: &str,
    years: Option<&YearRange>,
) -> DistrictChoropleth {
    let all = dataset.rows();
    let rows = filter_years(&all, years);
    let rows = filter_name(&rows, Some(name));

    let district_counts: BTreeMap<String, u64> = sum_by_district(&rows)
        .into_iter()
        .map(|(district, count)| (district.to_string(), count))
        .collect();
    let max_count = district_counts.values().copied().max().unwrap_or(0);

    DistrictChoropleth {
        name: name.to_string(),
        district_counts,
        max_count,
    }
}
