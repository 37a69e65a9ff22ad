/*
 * Copyright 2026 sukawasatoru
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Guess how many rows somebody wants from free-form chat text.
//!
//! Two patterns are tried in order and the first one that matches anywhere in the text wins:
//!
//! 1. a quantity followed by a unit word: `1,200 records`, `10k rows`, `1.5k-samples`,
//!    `300 data points`
//! 2. an action verb followed by a bare quantity: `generate 500`, `create 3k`
//!
//! A quantity is digits with optional `,` separators and an optional decimal fraction, then an
//! optional `k` (thousand) or `m` (million). The value is rounded to the nearest integer and
//! never goes below 1.

use crate::model::RowCount;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static QUANTITY_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)(k|m)?[\s-]*(?:rows?|records?|samples?|data\s*points?)\b",
    )
    .expect("valid regex")
});

static VERB_WITH_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:generate|create|produce|make)\s+(\d[\d,]*(?:\.\d+)?)(?:(k|m)\b)?")
        .expect("valid regex")
});

static GENERATION_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:generate|create|produce|make)").expect("valid regex")
});

/// `None` means "unknown". Callers pick their own default.
pub fn extract_rows(text: &str) -> Option<RowCount> {
    QUANTITY_WITH_UNIT
        .captures(text)
        .and_then(|data| quantity_from_captures(&data))
        .or_else(|| {
            VERB_WITH_QUANTITY
                .captures(text)
                .and_then(|data| quantity_from_captures(&data))
        })
}

pub fn has_generation_verb(text: &str) -> bool {
    GENERATION_VERB.is_match(text)
}

pub fn mentions_download(text: &str) -> bool {
    text.to_lowercase().contains("download")
}

fn quantity_from_captures(captures: &Captures) -> Option<RowCount> {
    let number = captures.get(1)?.as_str().replace(',', "");
    let value = number.parse::<f64>().ok()?;
    let multiplier = match captures.get(2).map(|data| data.as_str()) {
        Some("k" | "K") => 1_000.0,
        Some("m" | "M") => 1_000_000.0,
        _ => 1.0,
    };

    Some(RowCount::from_f64_clamped(value * multiplier))
}
