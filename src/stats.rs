//! Extraction statistics sink
//!
//! The pipeline never talks to a sink. Callers record one
//! `ExtractionRecord` per attempt after the result is in hand; a sink must
//! return quickly and swallow its own failures.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::ArchiveError;
use crate::pipeline::{CoverResult, DetectionMethod};

/// One extraction attempt as seen by the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub method: Option<DetectionMethod>,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ExtractionRecord {
    pub fn from_outcome<I>(
        outcome: &Result<CoverResult<I>, ArchiveError>,
        elapsed: Duration,
    ) -> Self {
        let (method, error) = match outcome {
            Ok(result) => (result.method(), result.failure_reason().map(str::to_string)),
            Err(e) => (None, Some(e.to_string())),
        };

        ExtractionRecord {
            success: method.is_some(),
            method,
            duration_ms: elapsed.as_millis() as u64,
            error,
            recorded_at: Utc::now(),
        }
    }
}

/// Destination for extraction records; must tolerate concurrent appends
pub trait StatsSink: Send + Sync {
    fn record(&self, record: ExtractionRecord);
}

/// Forward one attempt to an optional sink
pub fn record_attempt<I>(
    sink: Option<&dyn StatsSink>,
    outcome: &Result<CoverResult<I>, ArchiveError>,
    elapsed: Duration,
) {
    if let Some(sink) = sink {
        sink.record(ExtractionRecord::from_outcome(outcome, elapsed));
    }
}

/// Append-only in-memory sink
#[derive(Debug, Default)]
pub struct MemoryStatsSink {
    records: Mutex<Vec<ExtractionRecord>>,
}

/// Counts over everything a `MemoryStatsSink` has seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total: usize,
    pub succeeded: usize,
    pub by_method: BTreeMap<String, usize>,
    pub total_duration_ms: u64,
}

impl MemoryStatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExtractionRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> StatsSummary {
        let records = self.records.lock();
        let mut summary = StatsSummary {
            total: records.len(),
            ..StatsSummary::default()
        };

        for record in records.iter() {
            summary.total_duration_ms += record.duration_ms;
            if let Some(method) = record.method {
                summary.succeeded += 1;
                *summary.by_method.entry(method.as_str().to_string()).or_default() += 1;
            }
        }

        summary
    }
}

impl StatsSink for MemoryStatsSink {
    fn record(&self, record: ExtractionRecord) {
        tracing::trace!(
            "Recorded extraction: method={:?} success={} {}ms",
            record.method,
            record.success,
            record.duration_ms
        );
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn success(method: DetectionMethod) -> Result<CoverResult<()>, ArchiveError> {
        Ok(CoverResult::Success {
            path: "cover.jpg".to_string(),
            image: (),
            method,
        })
    }

    #[test]
    fn test_record_from_outcomes() {
        let ok = ExtractionRecord::from_outcome(
            &success(DetectionMethod::FuzzySearch),
            Duration::from_millis(12),
        );
        assert!(ok.success);
        assert_eq!(ok.method, Some(DetectionMethod::FuzzySearch));
        assert_eq!(ok.duration_ms, 12);
        assert!(ok.error.is_none());

        let failed: Result<CoverResult<()>, ArchiveError> =
            Ok(CoverResult::failure("no suitable cover image found"));
        let rec = ExtractionRecord::from_outcome(&failed, Duration::ZERO);
        assert!(!rec.success);
        assert_eq!(rec.error.as_deref(), Some("no suitable cover image found"));

        let missing: Result<CoverResult<()>, ArchiveError> =
            Err(ArchiveError::NotFound(PathBuf::from("x.epub")));
        let rec = ExtractionRecord::from_outcome(&missing, Duration::ZERO);
        assert!(!rec.success);
        assert!(rec.error.unwrap().contains("x.epub"));
    }

    #[test]
    fn test_absent_sink_is_a_no_op() {
        record_attempt(None, &success(DetectionMethod::MetadataCoverId), Duration::ZERO);
    }

    #[test]
    fn test_summary() {
        let sink = MemoryStatsSink::new();
        assert!(sink.is_empty());

        record_attempt(Some(&sink), &success(DetectionMethod::MetadataCoverId), Duration::from_millis(5));
        record_attempt(Some(&sink), &success(DetectionMethod::MetadataCoverId), Duration::from_millis(7));
        record_attempt(
            Some(&sink),
            &Ok::<_, ArchiveError>(CoverResult::<()>::failure("none")),
            Duration::from_millis(1),
        );

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].method, Some(DetectionMethod::MetadataCoverId));
        assert_eq!(records[1].duration_ms, 7);
        assert!(!records[2].success);
        assert_eq!(records[2].error.as_deref(), Some("none"));

        let summary = sink.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.by_method.get("METADATA_COVER_ID"), Some(&2));
        assert_eq!(summary.total_duration_ms, 13);
    }

    #[test]
    fn test_concurrent_appends() {
        let sink = Arc::new(MemoryStatsSink::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        sink.record(ExtractionRecord::from_outcome(
                            &success(DetectionMethod::FuzzySearch),
                            Duration::ZERO,
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sink.len(), 400);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let rec = ExtractionRecord::from_outcome(
            &success(DetectionMethod::ImageInHtml),
            Duration::from_millis(3),
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["method"], "IMAGE_IN_HTML");
        assert_eq!(json["durationMs"], 3);
        assert!(json.get("error").is_none());
    }
}
