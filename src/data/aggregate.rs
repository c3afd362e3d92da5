use std::collections::{BTreeMap, BTreeSet};

use super::model::{NameKey, Record};

// ---------------------------------------------------------------------------
// Grouped sums
// ---------------------------------------------------------------------------

/// Sum `count` per group key.
///
/// The result is an ordered map, so iteration order only depends on the keys
/// and never on the order of `rows`.
pub fn group_sum<'a, K, F>(rows: &[&'a Record], key: F) -> BTreeMap<K, u64>
where
    K: Ord,
    F: Fn(&'a Record) -> K,
{
    let mut sums = BTreeMap::new();
    for &row in rows {
        *sums.entry(key(row)).or_insert(0) += row.count;
    }
    sums
}

/// Count per (name, gender).
pub fn sum_by_name<'a>(rows: &[&'a Record]) -> BTreeMap<NameKey<'a>, u64> {
    group_sum(rows, Record::key)
}

/// Count per year.
pub fn sum_by_year(rows: &[&Record]) -> BTreeMap<i32, u64> {
    group_sum(rows, |r| r.year)
}

/// Count per district.
pub fn sum_by_district<'a>(rows: &[&'a Record]) -> BTreeMap<&'a str, u64> {
    group_sum(rows, |r| r.district.as_str())
}

/// Number of distinct districts each (name, gender) appears in.
pub fn distinct_districts<'a>(rows: &[&'a Record]) -> BTreeMap<NameKey<'a>, usize> {
    let mut seen: BTreeMap<NameKey<'a>, BTreeSet<&'a str>> = BTreeMap::new();
    for &row in rows {
        seen.entry(row.key()).or_default().insert(&row.district);
    }
    seen.into_iter().map(|(key, set)| (key, set.len())).collect()
}

/// Largest value per group key.
pub fn group_max<K, V, I>(items: I) -> BTreeMap<K, V>
where
    K: Ord,
    V: Ord + Copy,
    I: IntoIterator<Item = (K, V)>,
{
    let mut maxes = BTreeMap::new();
    for (key, value) in items {
        maxes
            .entry(key)
            .and_modify(|current: &mut V| *current = (*current).max(value))
            .or_insert(value);
    }
    maxes
}

// ---------------------------------------------------------------------------
// Joins
// ---------------------------------------------------------------------------

/// Left join `left` against a keyed side table.
///
/// Every left item is kept, in order, paired with the matching right value or
/// `None`. The right side is a map, so it holds at most one value per key and
/// the join can neither duplicate nor drop left items.
pub fn left_join<'r, L, K, V, F>(left: Vec<L>, right: &'r BTreeMap<K, V>, key: F) -> Vec<(L, Option<&'r V>)>
where
    K: Ord,
    F: Fn(&L) -> K,
{
    left.into_iter()
        .map(|item| {
            let matched = right.get(&key(&item));
            (item, matched)
        })
        .collect()
}
