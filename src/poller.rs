use crate::client::Fetch;
use crate::config::AppConfig;
use crate::extractors::Extractor;
use crate::models::field::ValueType;
use crate::models::target::PollTarget;
use crate::publisher;
use crate::store::{NodeDescriptor, StateStore};
use log::{debug, error, warn};
use serde_json::Value;
use std::time::{Duration, Instant};

const INFO_CHANNEL: &str = "info";
const CONNECTION_STATE: &str = "info.connection";
const LAST_POLL_STATE: &str = "info.lastPoll";

/// Outcome of one pass over all targets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub targets: usize,
    pub failed: usize,
    pub sensors: usize,
    pub values: usize,
    pub write_errors: usize,
}

impl CycleReport {
    /// Whether every fetch of the cycle succeeded.
    pub fn connected(&self) -> bool {
        self.failed == 0
    }
}

/// All targets share one loop, so the most frequent cadence drives it.
pub fn poll_period(targets: &[PollTarget]) -> Option<Duration> {
    targets.iter().map(|target| target.interval).min()
}

/// Runs the fetch, extract and publish pipeline for every target.
pub struct Poller<'a, F: Fetch, S: StateStore> {
    config: &'a AppConfig,
    fetcher: F,
    store: S,
    extractor: Extractor,
}

impl<'a, F: Fetch, S: StateStore> Poller<'a, F, S> {
    pub fn new(config: &'a AppConfig, fetcher: F, store: S) -> Self {
        Self {
            config,
            fetcher,
            store,
            extractor: Extractor::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn poll_cycle(&mut self, targets: &[PollTarget]) -> CycleReport {
        let start = Instant::now();
        let mut report = CycleReport::default();

        for target in targets {
            report.targets += 1;

            let markup = match self.fetcher.fetch(target).await {
                Ok(markup) => markup,
                Err(e) => {
                    error!("Failed to fetch phone id {}: {}", target.phone_id, e);
                    report.failed += 1;
                    continue;
                }
            };

            let readings = match self.extractor.extract(&markup) {
                Ok(readings) => readings,
                Err(e) => {
                    warn!("Phone id {}: {}", target.phone_id, e);
                    continue;
                }
            };

            let stats = publisher::publish(&mut self.store, target, &readings, &self.config.sensors);
            report.sensors += stats.sensors;
            report.values += stats.values;
            report.write_errors += stats.failures;
        }

        self.write_info(&report);
        if let Err(e) = self.store.flush() {
            error!("Failed to persist states: {}", e);
            report.write_errors += 1;
        }

        debug!("Poll cycle took: {} ms", start.elapsed().as_millis());
        report
    }

    fn write_info(&mut self, report: &CycleReport) {
        let last_poll = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let states = [
            (
                CONNECTION_STATE,
                NodeDescriptor::state("Portal reachable", ValueType::Boolean, "indicator.connected", ""),
                Value::Bool(report.connected()),
            ),
            (
                LAST_POLL_STATE,
                NodeDescriptor::state("Last poll", ValueType::String, "date", ""),
                Value::String(last_poll),
            ),
        ];

        if let Err(e) = self.store.ensure_node(INFO_CHANNEL, &NodeDescriptor::channel("Information")) {
            error!("Failed to create {}: {}", INFO_CHANNEL, e);
            return;
        }

        for (path, descriptor, value) in states {
            let result = self
                .store
                .ensure_node(path, &descriptor)
                .and_then(|_| self.store.write_value(path, value));
            if let Err(e) = result {
                error!("Failed to write {}: {}", path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::NetworkError;
    use crate::normalizer::wind::WindUnit;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves canned pages; unknown phone ids time out.
    struct FakePortal {
        pages: HashMap<String, String>,
    }

    impl FakePortal {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(id, page)| (id.to_string(), page.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetch for FakePortal {
        async fn fetch(&self, target: &PollTarget) -> Result<String, NetworkError> {
            self.pages
                .get(&target.phone_id)
                .cloned()
                .ok_or_else(|| NetworkError::Timeout {
                    url: format!("http://portal/?phoneid={}", target.phone_id),
                })
        }
    }

    fn targets(ids: &[&str]) -> Vec<PollTarget> {
        ids.iter()
            .map(|id| PollTarget::new(id, Duration::from_secs(300)))
            .collect()
    }

    const KITCHEN: &str = r#"
        <div class="sensor"><h3>Küche</h3>
          <h5>ID</h5><h4>0A1B2C3D4E5F</h4>
          <h5>Zeitpunkt</h5><h4>05.06.2024 07:30</h4>
          <h5>Temperatur</h5><h4>21,3 C</h4>
          <h5>Luftfeuchte</h5><h4>55%</h4>
        </div>"#;

    #[tokio::test]
    async fn test_failed_target_does_not_stop_others() {
        let config = AppConfig::default();
        let portal = FakePortal::new(&[("222222222222", KITCHEN)]);
        let mut poller = Poller::new(&config, portal, MemoryStore::new());

        let report = poller.poll_cycle(&targets(&["111111111111", "222222222222"])).await;

        assert_eq!(report.targets, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.sensors, 1);
        assert!(!report.connected());

        let store = poller.store();
        assert!(!store.paths().any(|path| path.starts_with("Phone_111111111111")));
        assert_eq!(store.value("Phone_222222222222.Kueche.temperature"), Some(&json!(21.3)));
        assert_eq!(store.value("Phone_222222222222.Kueche.humidity"), Some(&json!(55.0)));
        assert_eq!(store.value(CONNECTION_STATE), Some(&json!(false)));
        assert!(store.value(LAST_POLL_STATE).is_some());
    }

    #[tokio::test]
    async fn test_wind_in_beaufort() {
        let mut config = AppConfig::default();
        config.sensors.wind_unit = WindUnit::Beaufort;
        let page = r#"
            <div class="sensor"><h3>Windmesser</h3>
              <h5>Windgeschwindigkeit</h5><h4>5 m/s</h4>
            </div>"#;
        let mut poller = Poller::new(&config, FakePortal::new(&[("333333333333", page)]), MemoryStore::new());

        let report = poller.poll_cycle(&targets(&["333333333333"])).await;
        assert!(report.connected());

        let store = poller.store();
        let speed = store.value("Phone_333333333333.Windmesser.wind_speed").unwrap();
        assert_eq!(speed.as_f64(), Some(3.0));
        let node = store.node("Phone_333333333333.Windmesser.wind_speed").unwrap();
        assert_eq!(node.common.unit.as_deref(), Some("bft"));
        assert_eq!(store.value(CONNECTION_STATE), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_page_without_sensors() {
        let config = AppConfig::default();
        let portal = FakePortal::new(&[("444444444444", "<html><body>Wartungsarbeiten</body></html>")]);
        let mut poller = Poller::new(&config, portal, MemoryStore::new());

        let report = poller.poll_cycle(&targets(&["444444444444"])).await;

        assert!(report.connected());
        assert_eq!(report.sensors, 0);
        assert!(poller.store().node("Phone_444444444444").is_none());
    }

    #[test]
    fn test_poll_period_follows_targets() {
        let mut targets = targets(&["111111111111", "222222222222"]);
        targets[1].interval = Duration::from_secs(120);

        assert_eq!(poll_period(&targets), Some(Duration::from_secs(120)));
        assert_eq!(poll_period(&[]), None);
    }

    #[tokio::test]
    async fn test_repeated_cycles_overwrite_values() {
        let config = AppConfig::default();
        let mut poller = Poller::new(&config, FakePortal::new(&[("555555555555", KITCHEN)]), MemoryStore::new());
        let targets = targets(&["555555555555"]);

        poller.poll_cycle(&targets).await;
        let nodes = poller.store().len();
        poller.poll_cycle(&targets).await;

        assert_eq!(poller.store().len(), nodes);
    }
}
