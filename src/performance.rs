use crate::config::PerformanceThresholds;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Runtime metrics measured for one page by an external probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Milliseconds
    pub load_time: f64,
    /// Milliseconds
    pub first_contentful_paint: f64,
    /// Milliseconds
    pub largest_contentful_paint: f64,
    /// Milliseconds
    pub first_input_delay: f64,
    pub cumulative_layout_shift: f64,
    /// Milliseconds
    pub total_blocking_time: f64,
}

/// Source of performance measurements (a lab runner, a field-data API, ...)
#[async_trait]
pub trait PerformanceProbe: Send + Sync {
    async fn measure(&self, url: &str) -> Result<PerformanceMetrics>;
}

/// Pass/fail outcome of the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceVerdict {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Checks measured metrics against the Core Web Vitals thresholds
#[derive(Debug, Clone)]
pub struct PerformanceGate {
    thresholds: PerformanceThresholds,
}

impl PerformanceGate {
    pub fn new(thresholds: PerformanceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn evaluate(&self, metrics: &PerformanceMetrics) -> PerformanceVerdict {
        let t = &self.thresholds;
        let mut failures = Vec::new();

        if metrics.largest_contentful_paint > t.max_lcp_ms {
            failures.push(format!(
                "LCP {:.0}ms exceeds {:.0}ms",
                metrics.largest_contentful_paint, t.max_lcp_ms
            ));
        }
        if metrics.first_input_delay > t.max_fid_ms {
            failures.push(format!(
                "FID {:.0}ms exceeds {:.0}ms",
                metrics.first_input_delay, t.max_fid_ms
            ));
        }
        if metrics.cumulative_layout_shift > t.max_cls {
            failures.push(format!(
                "CLS {:.3} exceeds {:.3}",
                metrics.cumulative_layout_shift, t.max_cls
            ));
        }

        PerformanceVerdict {
            passed: failures.is_empty(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(lcp: f64, fid: f64, cls: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            largest_contentful_paint: lcp,
            first_input_delay: fid,
            cumulative_layout_shift: cls,
            ..PerformanceMetrics::default()
        }
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let gate = PerformanceGate::new(PerformanceThresholds::default());
        assert!(gate.evaluate(&metrics(2500.0, 100.0, 0.1)).passed);
    }

    #[test]
    fn test_each_threshold_fails_independently() {
        let gate = PerformanceGate::new(PerformanceThresholds::default());
        let verdict = gate.evaluate(&metrics(2600.0, 50.0, 0.05));
        assert!(!verdict.passed);
        assert_eq!(verdict.failures.len(), 1);
        assert!(verdict.failures[0].starts_with("LCP"));

        let verdict = gate.evaluate(&metrics(3000.0, 150.0, 0.3));
        assert_eq!(verdict.failures.len(), 3);
    }

    #[test]
    fn test_metrics_json_uses_camel_case() {
        let json = r#"{"loadTime": 1200, "firstContentfulPaint": 800, "largestContentfulPaint": 1900,
            "firstInputDelay": 40, "cumulativeLayoutShift": 0.02, "totalBlockingTime": 90}"#;
        let m: PerformanceMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(m.largest_contentful_paint, 1900.0);
        assert_eq!(m.total_blocking_time, 90.0);
    }
}
