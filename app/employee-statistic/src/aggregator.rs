//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Statistic aggregation over employee records

use crate::{error::StatisticError, types::EmployeeRecord, StatisticResult};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Mean tenure in days; current employees count up to `today`.
///
/// Fails with `EmptyInput` for an empty collection.
pub fn average_tenure(records: &[EmployeeRecord], today: NaiveDate) -> StatisticResult<f64> {
    if records.is_empty() {
        return Err(StatisticError::EmptyInput);
    }

    let total: i64 = records.iter().map(|r| r.tenure_days(today)).sum();
    Ok(total as f64 / records.len() as f64)
}

/// Every department whose headcount equals the maximum, alphabetically
pub fn departments_with_max_headcount(records: &[EmployeeRecord]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.department.as_str()).or_insert(0) += 1;
    }

    let max = match counts.values().max() {
        Some(max) => *max,
        None => return Vec::new(),
    };

    counts
        .into_iter()
        .filter(|(_, count)| *count == max)
        .map(|(department, _)| department.to_string())
        .collect()
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
