//! Columnar reshaping of raw metric points.
//!
//! The raw endpoint returns a flat list of observations across all metrics.
//! `get_metrics` regroups them into one frame per metric name so callers can
//! plot a series indexed by step, timestamp, or timestamp + offset.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::client::{CometClient, MetricPoint};
use crate::error::{CometError, Result};

/// One metric's observations as parallel columns, in service order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricFrame {
    pub values: Vec<f64>,
    pub steps: Vec<Option<i64>>,
    pub timestamps: Vec<i64>,
    pub offsets: Vec<i64>,
}

/// One row of a [`MetricFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRow {
    pub value: f64,
    pub step: Option<i64>,
    pub timestamp: i64,
    pub offset: i64,
}

impl MetricFrame {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = MetricRow> + '_ {
        (0..self.len()).map(|i| MetricRow {
            value: self.values[i],
            step: self.steps[i],
            timestamp: self.timestamps[i],
            offset: self.offsets[i],
        })
    }

    fn push(&mut self, value: f64, step: Option<i64>, timestamp: i64, offset: i64) {
        self.values.push(value);
        self.steps.push(step);
        self.timestamps.push(timestamp);
        self.offsets.push(offset);
    }
}

/// Coerce a reported metric value to `f64`.
///
/// The service reports values as strings; plain JSON numbers are accepted
/// too. Anything else fails the whole reshape.
fn coerce_value(name: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CometError::NonNumericMetric {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Group raw points into one frame per metric name.
///
/// Names keep first-encounter order; rows keep the original record order.
/// No sorting is applied.
pub fn build_metric_frames(points: Vec<MetricPoint>) -> Result<IndexMap<String, MetricFrame>> {
    let mut frames: IndexMap<String, MetricFrame> = IndexMap::new();
    for point in points {
        let value = coerce_value(&point.metric_name, &point.metric_value)?;
        frames
            .entry(point.metric_name)
            .or_default()
            .push(value, point.step, point.timestamp, point.offset);
    }
    Ok(frames)
}

impl CometClient {
    /// Fetch raw metric points and reshape them into one frame per metric.
    pub async fn get_metrics(&self, experiment_key: &str) -> Result<IndexMap<String, MetricFrame>> {
        let points = self.get_raw_metrics(experiment_key).await?;
        debug!(experiment_key, points = points.len(), "reshaping metric points");
        build_metric_frames(points)
    }
}
