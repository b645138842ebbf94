//! Analysis result types returned to clients.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Structured outcome of one image analysis.
///
/// Produced once per request by the normalizer and discarded after the
/// response is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Number of boxes counted; never less than `box_details.len()`.
    pub total_count: u64,
    pub box_details: Vec<BoxDetail>,
    pub summary: Summary,
    /// Overall confidence in `[0, 1]`.
    pub confidence_score: f64,
}

/// One detected box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxDetail {
    /// 1-based, unique within a result.
    pub box_id: u64,
    #[serde(rename = "type")]
    pub box_type: String,
    /// Visible text labels, deduplicated in reading order.
    pub labels: Vec<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-text spatial descriptor ("top left", "second row").
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_boxes: u64,
    /// Always `<= total_boxes`.
    pub boxes_with_labels: u64,
    /// Most frequent labels first.
    pub common_labels: Vec<String>,
    pub arrangement: String,
}

impl AnalysisResult {
    /// Structurally valid, zero-confidence result for unparseable replies.
    pub fn degraded() -> Self {
        Self {
            total_count: 0,
            box_details: Vec::new(),
            summary: Summary {
                total_boxes: 0,
                boxes_with_labels: 0,
                common_labels: Vec::new(),
                arrangement: defaults::ARRANGEMENT_UNPARSEABLE.to_string(),
            },
            confidence_score: 0.0,
        }
    }

    /// Whether this is the degraded fallback.
    pub fn is_degraded(&self) -> bool {
        self.total_count == 0
            && self.box_details.is_empty()
            && self.summary.arrangement == defaults::ARRANGEMENT_UNPARSEABLE
    }

    /// Every distinct label, summary ranking first, then detail labels in
    /// reading order.
    pub fn all_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        let candidates = self
            .summary
            .common_labels
            .iter()
            .chain(self.box_details.iter().flat_map(|b| b.labels.iter()));
        for label in candidates {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }

    /// Abbreviated projection for `/count-boxes-simple`.
    pub fn to_simple(&self) -> SimpleAnalysis {
        SimpleAnalysis {
            total_count: self.total_count,
            labels: self.all_labels(),
        }
    }
}

/// `{total_count, labels}` projection of an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleAnalysis {
    pub total_count: u64,
    pub labels: Vec<String>,
}

/// An image received from a client. Lives for one request only.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: Option<String>,
    /// Canonical MIME type after validation.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(id: u64, labels: &[&str]) -> BoxDetail {
        BoxDetail {
            box_id: id,
            box_type: "box".to_string(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            confidence: 0.9,
            position: "left".to_string(),
        }
    }

    #[test]
    fn test_degraded_shape() {
        let result = AnalysisResult::degraded();
        assert_eq!(result.total_count, 0);
        assert!(result.box_details.is_empty());
        assert_eq!(result.summary.total_boxes, 0);
        assert_eq!(result.summary.boxes_with_labels, 0);
        assert!(result.summary.common_labels.is_empty());
        assert_eq!(result.summary.arrangement, "unparseable");
        assert_eq!(result.confidence_score, 0.0);
        assert!(result.is_degraded());
    }

    #[test]
    fn test_box_type_serializes_as_type() {
        let json = serde_json::to_value(detail(1, &["FRAGILE"])).unwrap();
        assert_eq!(json["type"], "box");
        assert!(json.get("box_type").is_none());
    }

    #[test]
    fn test_simple_projection_merges_labels() {
        let result = AnalysisResult {
            total_count: 3,
            box_details: vec![
                detail(1, &["FRAGILE", "THIS SIDE UP"]),
                detail(2, &["ACME"]),
                detail(3, &[]),
            ],
            summary: Summary {
                total_boxes: 3,
                boxes_with_labels: 2,
                common_labels: vec!["ACME".to_string()],
                arrangement: "stacked".to_string(),
            },
            confidence_score: 0.8,
        };

        let simple = result.to_simple();
        assert_eq!(simple.total_count, 3);
        assert_eq!(simple.labels, vec!["ACME", "FRAGILE", "THIS SIDE UP"]);
    }

    #[test]
    fn test_simple_projection_of_degraded_is_empty() {
        let simple = AnalysisResult::degraded().to_simple();
        assert_eq!(simple.total_count, 0);
        assert!(simple.labels.is_empty());
    }
}
