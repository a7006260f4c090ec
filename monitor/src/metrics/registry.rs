//! Prometheus-backed gauge registry.

use std::collections::HashMap;
use std::sync::Mutex;

use prometheus::{self, Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// A family of gauges sharing a name and a label schema.
///
/// Label values are passed positionally, in the order the family was
/// created with.
pub trait GaugeFamily: Clone + Send + Sync {
    /// Sets the series identified by `labels` to `value`, creating it if needed.
    fn set(&self, labels: &[&str], value: f64);
    /// Drops the series identified by `labels`, if it exists.
    fn remove(&self, labels: &[&str]);
    /// Drops every series in the family.
    fn reset(&self);
}

/// Source of gauge families.
pub trait GaugeRegistry {
    type Family: GaugeFamily;

    /// Returns the family called `name`, registering it on first use.
    ///
    /// Requesting an existing name with a different label schema fails.
    fn gauge(&self, name: &str, help: &str, labels: &[&str])
    -> Result<Self::Family, prometheus::Error>;
}

impl GaugeFamily for GaugeVec {
    fn set(&self, labels: &[&str], value: f64) {
        match self.get_metric_with_label_values(labels) {
            Ok(gauge) => gauge.set(value),
            Err(e) => tracing::warn!(?labels, error = %e, "failed to set gauge"),
        }
    }

    fn remove(&self, labels: &[&str]) {
        match self.remove_label_values(labels) {
            // Series was never set.
            Ok(()) | Err(prometheus::Error::Msg(_)) => {}
            Err(e) => tracing::warn!(?labels, error = %e, "failed to remove gauge"),
        }
    }

    fn reset(&self) {
        GaugeVec::reset(self);
    }
}

/// Wrapper around a Prometheus registry that hands out gauge families.
///
/// This is the handle shared (behind an [`std::sync::Arc`]) between the
/// reconcilers, which write, and the HTTP exporter, which reads.
pub struct MetricsRegistry {
    registry: Registry,
    gauges: Mutex<HashMap<String, (Vec<String>, GaugeVec)>>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            registry: Registry::new(),
            gauges: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a registry that also exports process metrics (CPU, memory,
    /// open fds) for the exporter itself.
    pub fn with_process_metrics() -> Result<Self, prometheus::Error> {
        let metrics = Self::new()?;
        #[cfg(target_os = "linux")]
        metrics
            .registry
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;
        #[cfg(not(target_os = "linux"))]
        tracing::warn!("process metrics are only available on linux");
        Ok(metrics)
    }

    /// Content type of [`MetricsRegistry::encode`] output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn encode(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Current value of the gauge series `name{labels}`, if published.
    ///
    /// `labels` must name every label of the series, in any order.
    pub fn sample(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let families = self.registry.gather();
        let family = families.iter().find(|f| f.get_name() == name)?;
        family
            .get_metric()
            .iter()
            .find(|metric| {
                let pairs = metric.get_label();
                pairs.len() == labels.len()
                    && labels.iter().all(|(k, v)| {
                        pairs
                            .iter()
                            .any(|p| p.get_name() == *k && p.get_value() == *v)
                    })
            })
            .map(|metric| metric.get_gauge().get_value())
    }
}

impl GaugeRegistry for MetricsRegistry {
    type Family = GaugeVec;

    fn gauge(&self, name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec, prometheus::Error> {
        let mut gauges = self
            .gauges
            .lock()
            .map_err(|_| prometheus::Error::Msg("gauge cache lock poisoned".to_string()))?;

        if let Some((known_labels, family)) = gauges.get(name) {
            if known_labels.iter().map(String::as_str).ne(labels.iter().copied()) {
                return Err(prometheus::Error::Msg(format!(
                    "gauge {name} already registered with labels {known_labels:?}"
                )));
            }
            return Ok(family.clone());
        }

        let family = GaugeVec::new(Opts::new(name, help), labels)?;
        self.registry.register(Box::new(family.clone()))?;
        gauges.insert(
            name.to_string(),
            (labels.iter().map(|l| l.to_string()).collect(), family.clone()),
        );
        Ok(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::LogCapture;

    #[test]
    fn gauge_is_get_or_create() {
        let metrics = MetricsRegistry::new().expect("create registry");
        let first = metrics
            .gauge("rippled_fee", "Fee in drops (1e-6 XRP)", &["type"])
            .expect("register gauge");
        let second = metrics
            .gauge("rippled_fee", "Fee in drops (1e-6 XRP)", &["type"])
            .expect("same gauge again");

        GaugeFamily::set(&first, &["base"], 10.0);
        assert_eq!(second.with_label_values(&["base"]).get(), 10.0);
    }

    #[test]
    fn gauge_rejects_conflicting_labels() {
        let metrics = MetricsRegistry::new().expect("create registry");
        metrics
            .gauge("rippled_peers", "Peer count", &["version"])
            .expect("register gauge");
        let err = metrics
            .gauge("rippled_peers", "Peer count", &["name", "topic"])
            .unwrap_err();
        assert!(err.to_string().contains("already registered"), "got {err}");
    }

    #[test]
    fn remove_and_reset_drop_series() {
        let metrics = MetricsRegistry::new().expect("create registry");
        let peers = metrics
            .gauge("rippled_peers", "Peer count", &["version"])
            .expect("register gauge");

        GaugeFamily::set(&peers, &["all"], 3.0);
        GaugeFamily::set(&peers, &["1.2.3"], 3.0);
        GaugeFamily::remove(&peers, &["1.2.3"]);
        GaugeFamily::remove(&peers, &["never-set"]);

        let text = metrics.encode();
        assert!(text.contains(r#"rippled_peers{version="all"} 3"#), "{text}");
        assert!(!text.contains("1.2.3"), "{text}");

        GaugeFamily::reset(&peers);
        assert!(!metrics.encode().contains("rippled_peers{"));
    }

    #[test]
    fn remove_with_wrong_label_count_is_logged() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let metrics = MetricsRegistry::new().expect("create registry");
        let peers = metrics
            .gauge("rippled_peers", "Peer count", &["version"])
            .expect("register gauge");

        GaugeFamily::set(&peers, &["1.2.3"], 3.0);
        GaugeFamily::remove(&peers, &["hub-1", "1.2.3"]);
        GaugeFamily::remove(&peers, &["never-set"]);

        assert!(metrics.encode().contains(r#"rippled_peers{version="1.2.3"} 3"#));
        assert_eq!(logs.matching("failed to remove gauge").len(), 1, "{:?}", logs.lines());
    }

    #[test]
    fn encode_uses_text_format() {
        let metrics = MetricsRegistry::new().expect("create registry");
        let version = metrics
            .gauge("rippled_version", "Client version", &["value"])
            .expect("register gauge");
        GaugeFamily::set(&version, &["1.2.3"], 1.0);

        assert_eq!(metrics.content_type(), "text/plain; version=0.0.4");
        let text = metrics.encode();
        assert!(text.contains("# HELP rippled_version Client version"));
        assert!(text.contains("# TYPE rippled_version gauge"));
        assert!(text.contains(r#"rippled_version{value="1.2.3"} 1"#));
    }
}
