use std::{fs, path::PathBuf};

use async_trait::async_trait;

use super::{MetricSink, Publication};

/// Writes the publication as JSON for other processes to pick up.
pub struct LiveFileSink {
    file: PathBuf,
}

impl LiveFileSink {
    pub fn new(file: PathBuf) -> Self {
        Self { file }
    }
}

#[async_trait]
impl MetricSink for LiveFileSink {
    fn name(&self) -> &str {
        "live file"
    }

    async fn publish(&self, publication: &Publication) -> Result<(), String> {
        let json = serde_json::to_string_pretty(publication)
            .map_err(|e| format!("Failed to serialize publication: {}", e))?;

        if let Some(parent) = self.file.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create {:?}: {}", parent, e))?;
        }

        // Write then rename so readers never see a partial file.
        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| format!("Failed to write {:?}: {}", tmp, e))?;
        fs::rename(&tmp, &self.file).map_err(|e| format!("Failed to replace {:?}: {}", self.file, e))
    }
}

#[cfg(test)]
mod test {
    use serde_json::Value;

    use super::*;
    use crate::io::sinks::PublishedMetric;
    use crate::time_util::test_utils::utc_midday;

    #[tokio::test]
    async fn test_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_data").join("metrics.json");
        let sink = LiveFileSink::new(path.clone());

        let publication = Publication {
            computed_at: Some(utc_midday(2024, 6, 15)),
            last_error: None,
            degraded: vec!["price_per_unit (sensor.price_per_kwh) is invalid, using 0".to_owned()],
            metrics: vec![PublishedMetric {
                unique_id: "fve_payback_prediction_daily_savings".to_owned(),
                name: "Daily Savings".to_owned(),
                value: 0.0,
                unit: "CZK".to_owned(),
                icon: "mdi:currency-usd".to_owned(),
                degraded: vec!["price_per_unit (sensor.price_per_kwh) is invalid, using 0".to_owned()],
            }],
        };
        sink.publish(&publication).await.unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["computed_at"], "2024-06-15T12:00:00Z");
        assert_eq!(written["metrics"][0]["unique_id"], "fve_payback_prediction_daily_savings");
        assert_eq!(written["metrics"][0]["value"], 0.0);
        assert_eq!(written["degraded"].as_array().unwrap().len(), 1);
    }
}
