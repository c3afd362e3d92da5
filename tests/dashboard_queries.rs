use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use namescope::data::loader::load_file;
use namescope::query::{district_choropleth, ranked_name_table, rarity_scatter, year_trend, TOP_N};
use namescope::{call_fn, DistrictCountBounds, FilterSpec, MaxBounds, NamesDataset, YearRange};
use serde_json::{json, Value};

const FIXTURE: &str = "\
C-JAHR-0;C-WOHNBEZIRK-0;C-GESCHLECHT-0;F-VORNAME_NORMALISIERT;F-ANZAHL_LGEB
2000;101;2;Maria;5
2006;101;2;Maria;3
2001;102;2;Maria;4
2000;101;1;Alex;2
2000;102;1;Alex;3
2001;103;1;Alex;1
2000;101;2;Alex;1
2002;103;1;Quirin;1
2002;101;1;Lukas;9
2003;101;1;Lukas;8
2003;102;1;Lukas;7
2004;101;2;Anna;6
2004;101;2;Anna;6
2005;102;2;Emma;2
2005;101;1;Jonas;3
2005;102;1;Florian;4
2005;103;2;Lena;2
";

fn load_fixture() -> NamesDataset {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("OGDEXT_VORNAMEN_1.csv");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(FIXTURE.as_bytes())
        .unwrap();
    load_file(&path).unwrap()
}

#[test]
fn fixture_loads_every_row() {
    let ds = load_fixture();
    assert_eq!(ds.len(), 17);
    assert_eq!(ds.year_span(), Some((2000, 2006)));
    assert_eq!(ds.districts().len(), 3);
}

#[test]
fn duplicate_rows_are_summed() {
    let ds = load_fixture();
    let trend = year_trend(&ds, "anna", &FilterSpec::default());
    assert_eq!(trend.yearly_counts, BTreeMap::from([(2004, 12)]));
}

#[test]
fn ranked_table_is_capped_and_sorted() {
    let ds = load_fixture();
    let table = ranked_name_table(&ds, &FilterSpec::default());
    assert_eq!(table.len(), TOP_N);
    assert!(table.windows(2).all(|w| w[0].count >= w[1].count));
    assert_eq!(table[0].name, "Lukas");
    assert_eq!(table[0].count, 24);
    assert_eq!(table[0].district_count, 2);
}

#[test]
fn ranked_table_total_ignores_district_but_not_years() {
    let ds = load_fixture();
    let filters = FilterSpec {
        years: Some(YearRange::new(Some(2000), Some(2001))),
        district: Some("101".into()),
        ..FilterSpec::default()
    };
    let table = ranked_name_table(&ds, &filters);
    let maria = table.iter().find(|r| r.name == "Maria").unwrap();
    assert_eq!(maria.count, 5);
    assert_eq!(maria.count_total, 9);
}

#[test]
fn rarity_totals_equal_year_filtered_totals() {
    let ds = load_fixture();
    let years = YearRange::new(Some(2000), Some(2005));
    let filters = FilterSpec {
        years: Some(years),
        district: Some("101".into()),
        maxes: Some(MaxBounds { max_total: Some(20), max_per_year: Some(10) }),
        district_counts: Some(DistrictCountBounds { min: Some(1), max: None }),
    };

    let points = rarity_scatter(&ds, &filters);
    assert!(!points.is_empty());
    for point in points {
        let expected: u64 = ds
            .records()
            .iter()
            .filter(|r| years.contains(r.year) && r.name == point.name && r.gender == point.gender)
            .map(|r| r.count)
            .sum();
        assert_eq!(point.count_total, expected, "{}", point.name);
        assert!(point.count_district <= point.count_total);
    }
    // Anna has 12 in 2004, above the per-year limit.
    assert!(!rarity_scatter(&ds, &filters).iter().any(|p| p.name == "Anna"));
}

#[test]
fn district_count_bounds_use_the_whole_population() {
    let ds = load_fixture();
    let filters = FilterSpec {
        district_counts: Some(DistrictCountBounds { min: Some(3), max: None }),
        ..FilterSpec::default()
    };
    let names: Vec<String> = rarity_scatter(&ds, &filters).into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Alex".to_string()]);
}

#[test]
fn choropleth_for_unknown_name_is_empty() {
    let ds = load_fixture();
    let map = district_choropleth(&ds, "Nobody", None);
    assert!(map.district_counts.is_empty());
    assert_eq!(map.max_count, 0);
}

#[test]
fn concurrent_queries_share_one_dataset() {
    let ds = Arc::new(load_fixture());
    let expected = call_fn(&ds, "name_count", "[]").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ds = Arc::clone(&ds);
            thread::spawn(move || call_fn(&ds, "name_count", "[]").unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn dispatch_round_trip_for_every_view() {
    let ds = load_fixture();

    let trend: Value = serde_json::from_str(
        &call_fn(&ds, "name_year_count", r#"["Maria", {"year_min": 2000, "year_max": 2005}, null]"#).unwrap(),
    )
    .unwrap();
    assert_eq!(trend, json!({"name": "Maria", "yearly_counts": {"2000": 5, "2001": 4}}));

    let map: Value =
        serde_json::from_str(&call_fn(&ds, "name_district_count", r#"["alex", null]"#).unwrap()).unwrap();
    assert_eq!(
        map,
        json!({"name": "alex", "district_counts": {"101": 3, "102": 3, "103": 1}, "max_count": 3})
    );

    let rarity: Value = serde_json::from_str(
        &call_fn(&ds, "name_region_rarity", r#"[null, 103, null, null]"#).unwrap(),
    )
    .unwrap();
    assert_eq!(
        rarity,
        json!([
            {"Name": "Alex", "Gender": 1, "Count_district": 1, "Count_total": 6},
            {"Name": "Lena", "Gender": 2, "Count_district": 2, "Count_total": 2},
            {"Name": "Quirin", "Gender": 1, "Count_district": 1, "Count_total": 1}
        ])
    );

    assert!(call_fn(&ds, "load_names_data", "[]").is_err());
}
