//! Shared fixtures for the nest integration tests.

#![allow(dead_code)]

use nest::impl_prop_lookup;
use serde::Serialize;
use serde_json::{json, Value};

/// Barley yields from Minnesota, 1931-2 (subset).
pub fn barley_yields() -> Vec<Value> {
    vec![
        json!({"yield": 27.00, "variety": "Manchuria", "year": 1931, "site": "University Farm"}),
        json!({"yield": 48.87, "variety": "Manchuria", "year": 1931, "site": "Waseca"}),
        json!({"yield": 27.43, "variety": "Manchuria", "year": 1931, "site": "Morris"}),
        json!({"yield": 43.07, "variety": "Glabron",   "year": 1931, "site": "University Farm"}),
        json!({"yield": 55.20, "variety": "Glabron",   "year": 1931, "site": "Waseca"}),
        json!({"yield": 16.18, "variety": "Glabron",   "year": 1932, "site": "University Farm"}),
    ]
}

/// The three-record example: two years, two varieties.
pub fn small_sample() -> Vec<Value> {
    vec![
        json!({"y": 1931, "v": "A"}),
        json!({"y": 1931, "v": "B"}),
        json!({"y": 1932, "v": "A"}),
    ]
}

/// Attribute-style record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Harvest {
    pub year: i64,
    pub variety: String,
    pub site: String,
    pub bushels: f64,
}

impl_prop_lookup!(Harvest { year, variety, site, bushels });

pub fn harvests() -> Vec<Harvest> {
    barley_yields()
        .iter()
        .map(|v| Harvest {
            year: v["year"].as_i64().unwrap_or_default(),
            variety: v["variety"].as_str().unwrap_or_default().to_string(),
            site: v["site"].as_str().unwrap_or_default().to_string(),
            bushels: v["yield"].as_f64().unwrap_or_default(),
        })
        .collect()
}

/// Identity of a record inside `data`, by address.
pub fn position_of<T>(data: &[T], record: &T) -> usize {
    data.iter()
        .position(|r| std::ptr::eq(r, record))
        .expect("record does not point into the dataset")
}

pub fn positions<T>(data: &[T], records: &[&T]) -> Vec<usize> {
    records.iter().map(|r| position_of(data, r)).collect()
}
