//! Response normalization: free-form model text to [`AnalysisResult`].
//!
//! Vision models are asked for JSON but answer with whatever they like:
//! prose around the object, markdown fences, strings where numbers belong,
//! confidences of 1.5. [`parse_analysis`] is a pure function that locates the
//! JSON, coerces every field into the fixed schema and reports a [`Degraded`]
//! value when nothing usable is found. [`normalize`] wraps it and substitutes
//! [`AnalysisResult::degraded`], so normalization never fails a request.
//!
//! Coercion rules:
//!
//! | Field | Accepted | Missing / invalid |
//! |-------|----------|-------------------|
//! | counts | integers, floats (rounded), numeric strings; negatives become 0 | derived (see below) |
//! | confidences | numbers, numeric strings, percent strings | 0.0; always clamped to [0, 1] |
//! | strings | strings, numbers, booleans | `"unknown"` for type/arrangement, `""` for position |
//! | labels | arrays of strings/numbers or a single string; trimmed, deduplicated | empty |
//!
//! `total_count` is never lower than the number of box details and defaults to
//! it. `box_id`s are kept when they are unique positive integers, otherwise
//! every box is renumbered `1..=n`. `common_labels` defaults to the detail
//! labels ranked by frequency, ties broken by first occurrence.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::defaults;
use crate::logging::{self, components};
use crate::models::{AnalysisResult, BoxDetail, Summary};

/// Top-level keys that identify an analysis object.
const ANALYSIS_KEYS: &[&str] = &["total_count", "box_details", "summary", "confidence_score"];

/// First fenced block, with an optional language tag.
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex"));

/// Opening fence without a matching close (truncated replies).
static OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*)$").expect("valid regex"));

/// Why a reply could not be turned into an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No `{...}` or `[...]` span in the text.
    NoJson,
    /// Candidate spans existed but none parsed.
    Malformed(String),
    /// JSON parsed but is not an analysis object.
    UnexpectedShape(String),
}

/// Normalization outcome when the reply carries no usable analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded {
    pub reason: DegradeReason,
}

impl Degraded {
    fn new(reason: DegradeReason) -> Self {
        Self { reason }
    }
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DegradeReason::NoJson => write!(f, "no JSON found in reply"),
            DegradeReason::Malformed(e) => write!(f, "malformed JSON: {}", e),
            DegradeReason::UnexpectedShape(what) => write!(f, "unexpected JSON shape: {}", what),
        }
    }
}

impl std::error::Error for Degraded {}

/// Normalize a raw model reply, falling back to a degraded result.
pub fn normalize(raw: &str) -> AnalysisResult {
    match parse_analysis(raw) {
        Ok(result) => {
            debug!(
                { logging::COMPONENT } = components::NORMALIZER,
                { logging::BOX_COUNT } = result.total_count,
                details = result.box_details.len(),
                { logging::DEGRADED } = false,
                "Normalized provider reply"
            );
            result
        }
        Err(degraded) => {
            warn!(
                { logging::COMPONENT } = components::NORMALIZER,
                { logging::DEGRADED } = true,
                reason = %degraded,
                { logging::RESPONSE_LEN } = raw.len(),
                preview = %preview(raw),
                "Provider reply unusable, returning degraded analysis"
            );
            AnalysisResult::degraded()
        }
    }
}

/// Parse a raw model reply into an [`AnalysisResult`].
///
/// Pure: no I/O, no logging.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, Degraded> {
    let fenced = unfence(raw);

    let mut last = Degraded::new(DegradeReason::NoJson);
    for text in fenced.into_iter().chain(std::iter::once(raw)) {
        match locate_analysis(text) {
            Ok(value) => return analysis_from_value(value).map_err(Degraded::new),
            Err(reason) => {
                if reason != DegradeReason::NoJson || last.reason == DegradeReason::NoJson {
                    last = Degraded::new(reason);
                }
            }
        }
    }
    Err(last)
}

/// Body of the first markdown code fence, if any.
fn unfence(raw: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(raw)
        .or_else(|| OPEN_FENCE.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Find the JSON value holding the analysis within `text`.
fn locate_analysis(text: &str) -> Result<Value, DegradeReason> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        if let Some(end) = balanced_end(trimmed, 0, b'[', b']') {
            if let Ok(value @ Value::Array(_)) = serde_json::from_str(&trimmed[..=end]) {
                return Ok(value);
            }
        }
    }

    let mut outcome = DegradeReason::NoJson;
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(text, start, b'{', b'}') else {
            if outcome == DegradeReason::NoJson {
                outcome = DegradeReason::Malformed("unbalanced braces".to_string());
            }
            continue;
        };
        match serde_json::from_str::<Value>(&text[start..=end]) {
            Ok(Value::Object(map)) if has_analysis_keys(&map) => return Ok(Value::Object(map)),
            Ok(_) => {
                outcome = DegradeReason::UnexpectedShape("object without analysis fields".into());
            }
            Err(e) => {
                if !matches!(outcome, DegradeReason::UnexpectedShape(_)) {
                    outcome = DegradeReason::Malformed(e.to_string());
                }
            }
        }
    }
    Err(outcome)
}

fn has_analysis_keys(map: &Map<String, Value>) -> bool {
    ANALYSIS_KEYS.iter().any(|k| map.contains_key(*k))
}

/// Index of the bracket closing the one at `start`, honoring JSON strings.
fn balanced_end(text: &str, start: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open => depth += 1,
            _ if b == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn analysis_from_value(value: Value) -> Result<AnalysisResult, DegradeReason> {
    match value {
        Value::Object(map) => Ok(analysis_from_object(&map)),
        Value::Array(items) => {
            let mut map = Map::new();
            map.insert("box_details".to_string(), Value::Array(items));
            Ok(analysis_from_object(&map))
        }
        other => Err(DegradeReason::UnexpectedShape(format!(
            "expected object, found {}",
            json_kind(&other)
        ))),
    }
}

fn analysis_from_object(map: &Map<String, Value>) -> AnalysisResult {
    let box_details = map
        .get("box_details")
        .map(details_from_value)
        .unwrap_or_default();
    let detail_count = box_details.len() as u64;

    let total_count = map
        .get("total_count")
        .and_then(as_count)
        .map_or(detail_count, |c| c.max(detail_count));

    let summary_map = map.get("summary").and_then(Value::as_object);
    let summary_field = |key: &str| summary_map.and_then(|s| s.get(key));

    let total_boxes = summary_field("total_boxes")
        .and_then(as_count)
        .unwrap_or(total_count);
    let labelled = box_details.iter().filter(|b| !b.labels.is_empty()).count() as u64;
    let boxes_with_labels = summary_field("boxes_with_labels")
        .and_then(as_count)
        .unwrap_or(labelled)
        .min(total_boxes);
    let common_labels = match summary_field("common_labels") {
        Some(v @ (Value::Array(_) | Value::String(_))) => as_labels(v),
        _ => rank_labels(&box_details),
    };
    let arrangement = summary_field("arrangement")
        .and_then(as_text)
        .unwrap_or_else(|| defaults::ARRANGEMENT_UNKNOWN.to_string());

    let confidence_score = map
        .get("confidence_score")
        .and_then(as_confidence)
        .unwrap_or(0.0);

    AnalysisResult {
        total_count,
        box_details,
        summary: Summary {
            total_boxes,
            boxes_with_labels,
            common_labels,
            arrangement,
        },
        confidence_score,
    }
}

fn details_from_value(value: &Value) -> Vec<BoxDetail> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut claimed_ids = Vec::with_capacity(items.len());
    let mut details: Vec<BoxDetail> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            claimed_ids.push(obj.get("box_id").and_then(as_count).filter(|id| *id > 0));
            BoxDetail {
                box_id: 0,
                box_type: obj
                    .get("type")
                    .and_then(as_text)
                    .unwrap_or_else(|| defaults::BOX_TYPE_UNKNOWN.to_string()),
                labels: obj.get("labels").map(as_labels).unwrap_or_default(),
                confidence: obj.get("confidence").and_then(as_confidence).unwrap_or(0.0),
                position: obj.get("position").and_then(as_text).unwrap_or_default(),
            }
        })
        .collect();

    // Provider ids survive only as a permutation of 1..=n
    let n = details.len() as u64;
    let mut seen = vec![false; details.len()];
    let ids_usable = claimed_ids.iter().all(|id| match id {
        Some(id) if *id <= n && !seen[(*id - 1) as usize] => {
            seen[(*id - 1) as usize] = true;
            true
        }
        _ => false,
    });

    for (i, detail) in details.iter_mut().enumerate() {
        detail.box_id = match claimed_ids[i] {
            Some(id) if ids_usable => id,
            _ => i as u64 + 1,
        };
    }
    details
}

/// Labels across all details, most frequent first, ties by first occurrence.
pub fn rank_labels(details: &[BoxDetail]) -> Vec<String> {
    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, label) in details.iter().flat_map(|d| d.labels.iter()).enumerate() {
        stats.entry(label.as_str()).or_insert((0, order)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .map(|(label, (count, first))| (label, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(label, _, _)| label.to_string()).collect()
}

fn as_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.max(0.0).round() as u64)
}

fn as_confidence(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
                None => s.parse::<f64>().ok()?,
            }
        }
        _ => return None,
    };
    if n.is_nan() {
        return None;
    }
    Some(n.clamp(0.0, 1.0))
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn as_labels(value: &Value) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut push = |v: &Value| {
        if let Some(label) = as_text(v) {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
    };
    match value {
        Value::Array(items) => items.iter().for_each(&mut push),
        Value::String(_) => push(value),
        _ => {}
    }
    labels
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(defaults::RAW_PREVIEW_CHARS).collect()
}
