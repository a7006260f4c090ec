//! In-memory fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;

use crate::metrics::{GaugeFamily, GaugeRegistry};
use crate::rpc::{NodeRpc, RpcError};

/// Builds a `server_info` result.
pub(crate) fn server_info(version: &str, ledgers: &str, base_fee_xrp: Option<f64>) -> Value {
    let mut info = json!({
        "build_version": version,
        "complete_ledgers": ledgers,
        "server_state": "full",
    });
    if let Some(fee) = base_fee_xrp {
        info["validated_ledger"] = json!({ "base_fee_xrp": fee, "seq": 200 });
    }
    json!({ "info": info, "status": "success" })
}

/// Builds a `peers` result with one peer per version.
pub(crate) fn peers(versions: &[&str]) -> Value {
    let peers: Vec<Value> = versions
        .iter()
        .enumerate()
        .map(|(i, v)| json!({ "address": format!("10.0.0.{i}:51235"), "version": v }))
        .collect();
    json!({ "peers": peers, "status": "success" })
}

/// Scriptable [`NodeRpc`] keyed by `(url, method)`.
#[derive(Default)]
pub(crate) struct FakeRpc {
    responses: Mutex<HashMap<(String, String), Value>>,
    failing: Mutex<HashSet<(String, String)>>,
    delay: Duration,
    calls: Mutex<Vec<(String, String, Instant)>>,
}

impl FakeRpc {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, url: &str, method: &str, result: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert((url.to_string(), method.to_string()), result);
    }

    pub(crate) fn fail(&self, url: &str, method: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert((url.to_string(), method.to_string()));
    }

    /// Start instants of calls to `method`, in call order.
    pub(crate) fn call_starts(&self, method: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, m, _)| m == method)
            .map(|(_, _, at)| *at)
            .collect()
    }
}

#[async_trait]
impl NodeRpc for FakeRpc {
    async fn call(&self, url: &str, method: &str, _params: Value) -> Result<Value, RpcError> {
        let key = (url.to_string(), method.to_string());
        self.calls
            .lock()
            .unwrap()
            .push((key.0.clone(), key.1.clone(), Instant::now()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.lock().unwrap().contains(&key) {
            return Err(RpcError::Rpc {
                url: url.to_string(),
                code: "17".to_string(),
                message: "Not synced to the network.".to_string(),
            });
        }

        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| RpcError::MissingResult {
                url: url.to_string(),
            })
    }
}

/// One registry mutation seen by [`RecordingRegistry`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Write {
    Set {
        family: String,
        labels: Vec<String>,
        value: f64,
    },
    Remove {
        family: String,
        labels: Vec<String>,
    },
    Reset {
        family: String,
    },
}

impl Write {
    pub(crate) fn family(&self) -> &str {
        match self {
            Write::Set { family, .. } | Write::Remove { family, .. } | Write::Reset { family } => {
                family
            }
        }
    }
}

/// Gauge registry that only logs mutations.
#[derive(Clone, Default)]
pub(crate) struct RecordingRegistry {
    log: Arc<Mutex<Vec<Write>>>,
}

impl RecordingRegistry {
    pub(crate) fn writes(&self) -> Vec<Write> {
        self.log.lock().unwrap().clone()
    }

    /// Returns and forgets all writes so far.
    pub(crate) fn take(&self) -> Vec<Write> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }
}

#[derive(Clone)]
pub(crate) struct RecordingFamily {
    name: String,
    log: Arc<Mutex<Vec<Write>>>,
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

impl GaugeFamily for RecordingFamily {
    fn set(&self, labels: &[&str], value: f64) {
        self.log.lock().unwrap().push(Write::Set {
            family: self.name.clone(),
            labels: owned(labels),
            value,
        });
    }

    fn remove(&self, labels: &[&str]) {
        self.log.lock().unwrap().push(Write::Remove {
            family: self.name.clone(),
            labels: owned(labels),
        });
    }

    fn reset(&self) {
        self.log.lock().unwrap().push(Write::Reset {
            family: self.name.clone(),
        });
    }
}

impl GaugeRegistry for RecordingRegistry {
    type Family = RecordingFamily;

    fn gauge(
        &self,
        name: &str,
        _help: &str,
        _labels: &[&str],
    ) -> Result<RecordingFamily, prometheus::Error> {
        Ok(RecordingFamily {
            name: name.to_string(),
            log: self.log.clone(),
        })
    }
}

/// Collects formatted log output written while its guard is installed.
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes INFO and above on this thread into the buffer until the guard
    /// is dropped.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Lines containing `message`.
    pub(crate) fn matching(&self, message: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(message))
            .collect()
    }

    pub(crate) fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
