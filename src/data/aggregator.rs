//! Pure aggregation passes over loaded indicator rows
//!
//! Everything here works on already-expanded record maps or on distinct
//! tuples produced by the handlers' scans. No accumulator outlives a
//! request; each call builds its result locally and returns it by value.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::models::{Menu, SeriesEntry};

/// Distinct values the filter map sources from outside the current
/// result set: table-wide lists for sector, series_name and subsector_1,
/// and the subsector_1-restricted list for subsector_2.
#[derive(Debug, Default)]
pub struct GlobalFilterValues {
    pub sector: Vec<String>,
    pub series_name: Vec<String>,
    pub subsector_1: Vec<String>,
    pub subsector_2: Vec<String>,
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Union of record keys in discovery order
fn collect_keys(records: &[Map<String, Value>]) -> Vec<String> {
    let mut keys = Vec::new();
    let mut seen = HashSet::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

/// Remove every column that is empty or absent across all records.
/// Callers guarantee at least one record.
pub fn prune_empty_columns(records: &mut [Map<String, Value>]) {
    let keys = collect_keys(records);

    for key in keys {
        let all_empty = records
            .iter()
            .all(|r| r.get(&key).map(is_empty_value).unwrap_or(true));

        if all_empty {
            for record in records.iter_mut() {
                record.remove(&key);
            }
        }
    }
}

/// Distinct non-empty values of one column within the result set,
/// discovery order preserved
pub fn distinct_values(records: &[Map<String, Value>], key: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut seen = HashSet::new();

    for record in records {
        if let Some(value) = record.get(key) {
            if !is_empty_value(value) && seen.insert(value.to_string()) {
                values.push(value.clone());
            }
        }
    }

    values
}

/// Build the companion available-filter map for a pruned result set.
///
/// sector / series_name / subsector_1 come from table-wide scans and
/// subsector_2 from the subsector_1-restricted scan, all carried in
/// `global`; every other surviving column is computed from the result set
/// itself. Keys whose value list ends up empty are dropped, as are the
/// non-filterable id and indicator_value columns.
pub fn available_filters(
    records: &[Map<String, Value>],
    global: &GlobalFilterValues,
) -> Map<String, Value> {
    let mut filters = Map::new();

    let pinned: [(&str, &Vec<String>); 4] = [
        ("sector", &global.sector),
        ("series_name", &global.series_name),
        ("subsector_1", &global.subsector_1),
        ("subsector_2", &global.subsector_2),
    ];

    // Pinned keys come from their dedicated scans whether or not the
    // column survived pruning
    for (key, values) in pinned {
        if !values.is_empty() {
            let values: Vec<Value> = values.iter().cloned().map(Value::String).collect();
            filters.insert(key.to_string(), Value::Array(values));
        }
    }

    for key in collect_keys(records) {
        if key == "id" || key == "indicator_value" || pinned.iter().any(|(k, _)| *k == key) {
            continue;
        }

        let values = distinct_values(records, &key);
        if !values.is_empty() {
            filters.insert(key, Value::Array(values));
        }
    }

    filters
}

/// Build one sector table's menu from its three distinct scans.
///
/// A subsector_1's series list is attached under every sector that pairs
/// with it, so a subsector shared by two sectors carries its series list
/// under both. The flat list pairs each series with the sector it was
/// reached through, deduplicated in discovery order.
pub fn build_menu(
    sectors: &[String],
    sector_subsectors: &[(String, String)],
    subsector_series: &[(String, String)],
) -> (Menu, Vec<SeriesEntry>) {
    let mut menu: Menu = Menu::new();
    let mut flat = Vec::new();
    let mut seen = HashSet::new();

    for sector in sectors {
        let entry = menu.entry(sector.clone()).or_default();

        for (paired_sector, subsector) in sector_subsectors {
            if paired_sector != sector {
                continue;
            }

            let series: Vec<String> = subsector_series
                .iter()
                .filter(|(sub, _)| sub == subsector)
                .map(|(_, series_name)| series_name.clone())
                .collect();

            for series_name in &series {
                let pair = SeriesEntry {
                    series_name: series_name.clone(),
                    sector: sector.clone(),
                };
                if seen.insert(pair.clone()) {
                    flat.push(pair);
                }
            }

            entry.insert(subsector.clone(), series);
        }
    }

    (menu, flat)
}

/// Deep-merge per-table menus: same sector/subsector keys concatenate
/// their series lists without dedup, and flat lists concatenate as-is
pub fn merge_menus(parts: Vec<(Menu, Vec<SeriesEntry>)>) -> (Menu, Vec<SeriesEntry>) {
    let mut merged: Menu = Menu::new();
    let mut flat = Vec::new();

    for (menu, series_list) in parts {
        for (sector, subsectors) in menu {
            let sector_entry = merged.entry(sector).or_default();
            for (subsector, series) in subsectors {
                sector_entry.entry(subsector).or_default().extend(series);
            }
        }
        flat.extend(series_list);
    }

    (merged, flat)
}
