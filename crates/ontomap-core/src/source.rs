//! BAS runtime boundary.
//!
//! The building-automation runtime is consumed through two capabilities:
//! point enumeration and an optional historical-sample read. File-backed and
//! in-memory implementations are provided for adapters and tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::point::{PointId, PointRecord, Sample};
use crate::{Error, Result};

/// Closed time window in unix millis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Window ending now and spanning `duration`.
    pub fn last(duration: chrono::Duration) -> Self {
        let end = Utc::now().timestamp_millis();
        Self {
            start: end - duration.num_milliseconds(),
            end,
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// Enumerates the current set of points.
#[async_trait]
pub trait PointSource: Send + Sync {
    /// Current point set. Identifiers are stable across calls.
    async fn enumerate(&self) -> Result<Vec<PointRecord>>;
}

/// Reads historical samples for a point.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Samples for `point` inside `window`, oldest first.
    async fn read_history(&self, point: &PointId, window: &TimeWindow) -> Result<Vec<Sample>>;
}

/// In-memory point set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPointSource {
    points: Vec<PointRecord>,
}

impl InMemoryPointSource {
    pub fn new(points: Vec<PointRecord>) -> Self {
        Self { points }
    }
}

#[async_trait]
impl PointSource for InMemoryPointSource {
    async fn enumerate(&self) -> Result<Vec<PointRecord>> {
        Ok(self.points.clone())
    }
}

/// In-memory sample store keyed by point.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistorySource {
    samples: HashMap<PointId, Vec<Sample>>,
}

impl InMemoryHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(mut self, point: impl Into<PointId>, samples: Vec<Sample>) -> Self {
        self.samples.insert(point.into(), samples);
        self
    }
}

#[async_trait]
impl HistorySource for InMemoryHistorySource {
    async fn read_history(&self, point: &PointId, window: &TimeWindow) -> Result<Vec<Sample>> {
        let mut samples: Vec<Sample> = self
            .samples
            .get(point)
            .map(|s| s.iter().copied().filter(|s| window.contains(s.timestamp)).collect())
            .unwrap_or_default();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }
}

/// File layout accepted by [`JsonPointSource`]: a bare array or `{ "points": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PointFile {
    Bare(Vec<PointRecord>),
    Wrapped { points: Vec<PointRecord> },
}

/// Point set exported from the BAS as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPointSource {
    path: PathBuf,
}

impl JsonPointSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse a point export.
    pub fn parse(json: &str) -> Result<Vec<PointRecord>> {
        let file: PointFile = serde_json::from_str(json)?;
        let points = match file {
            PointFile::Bare(points) => points,
            PointFile::Wrapped { points } => points,
        };
        Ok(points)
    }
}

#[async_trait]
impl PointSource for JsonPointSource {
    async fn enumerate(&self) -> Result<Vec<PointRecord>> {
        let raw = std::fs::read_to_string(&self.path)?;
        let points = Self::parse(&raw)
            .map_err(|e| Error::Source(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(
            category = "source",
            path = %self.path.display(),
            count = points.len(),
            "Loaded point export"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_window_filtering() {
        let source = InMemoryHistorySource::new().with_samples(
            "p1",
            vec![Sample::new(300, 3.0), Sample::new(100, 1.0), Sample::new(200, 2.0)],
        );

        let samples = source
            .read_history(&PointId::new("p1"), &TimeWindow::new(150, 300))
            .await
            .unwrap();
        assert_eq!(samples, vec![Sample::new(200, 2.0), Sample::new(300, 3.0)]);

        let none = source
            .read_history(&PointId::new("p2"), &TimeWindow::new(0, 1000))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_parse_both_layouts() {
        let bare = JsonPointSource::parse(r#"[{"id":"p1","name":"AHU1_SAT"}]"#).unwrap();
        let wrapped = JsonPointSource::parse(r#"{"points":[{"id":"p1","name":"AHU1_SAT"}]}"#).unwrap();
        assert_eq!(bare, wrapped);
    }

    #[tokio::test]
    async fn test_json_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");
        std::fs::write(&path, r#"[{"id":"p1","name":"AHU1_SAT","units":"°F"}]"#).unwrap();

        let points = JsonPointSource::new(&path).enumerate().await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].effective_units(), Some("°F"));
    }
}
