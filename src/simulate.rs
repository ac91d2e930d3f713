use std::collections::HashMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use log::*;
use tokio::runtime::Builder;

use crate::config::Config;
use crate::evaluator::Evaluator;
use crate::io::dummy::DummyIO;
use crate::io::sinks::console::LogSink;
use crate::io::states::dummy::{Dummy, ModifyState};
use crate::io::IOBundle;
use crate::run_cycle;
use crate::time_util::mytime::{DummyTimeProvider, TimeProvider};

const SIMULATION_CONFIG: &str = r#"
[source]
type = "LiveFile"
path = "simulated"

[metrics]
enabled = ["daily_savings", "monthly_savings", "yearly_savings", "estimated_payback"]
install_date = "2024-03-01"

[metrics.bindings]
energy_today = "sensor.solar_energy_today"
price_per_unit = "sensor.price_per_kwh"
total_energy = "sensor.solar_energy_total"

[metrics.params]
investment = 250000.0
estimated_daily_production = 12.0
"#;

const ENERGY_TODAY: &str = "sensor.solar_energy_today";
const PRICE: &str = "sensor.price_per_kwh";
const TOTAL_ENERGY: &str = "sensor.solar_energy_total";

/// Runs a day of hourly cycles against an in-memory registry, logging what would be published.
pub fn simulate() {
    debug!("{}", SIMULATION_CONFIG);
    let config: Config = match toml::from_str(SIMULATION_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to deserialize simulation config: {}", e);
            return;
        }
    };

    let mut evaluator = Evaluator::new();
    if let Err(e) = evaluator.configure(config.get_metrics()) {
        error!("{}", e);
        return;
    }

    let initial = HashMap::from([
        (ENERGY_TODAY.to_owned(), "0".to_owned()),
        (PRICE.to_owned(), "4.2".to_owned()),
        (TOTAL_ENERGY.to_owned(), "1500".to_owned()),
    ]);
    let (states, handle) = Dummy::create(&initial);
    let io_bundle = IOBundle::new(states).with_sink(LogSink::default());

    let rt = match Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build runtime: {}", e);
            return;
        }
    };

    let start = match NaiveDate::from_ymd_opt(2024, 6, 15).and_then(|date| date.and_hms_opt(0, 0, 0)) {
        Some(start) => Utc.from_utc_datetime(&start),
        None => return,
    };
    let mut time = DummyTimeProvider::new(start);

    for hour in 0..24u32 {
        println!("## {}", time.get_utc_time());
        let produced = match hour {
            6..=20 => (hour - 5) as f64 * 0.9,
            _ => 0.0,
        };
        let send = |message| {
            if handle.send(message).is_err() {
                warn!("Simulated registry has gone away");
            }
        };
        send(ModifyState::SetState(ENERGY_TODAY.to_owned(), format!("{:.1}", produced)));
        match hour {
            // The price integration drops out for an hour.
            12 => send(ModifyState::SetState(PRICE.to_owned(), "unavailable".to_owned())),
            13 => send(ModifyState::SetState(PRICE.to_owned(), "4.2".to_owned())),
            // So does the whole registry.
            18 => send(ModifyState::SetReachable(false)),
            19 => send(ModifyState::SetReachable(true)),
            _ => {}
        }

        if let Err(e) = rt.block_on(run_cycle(&mut evaluator, &io_bundle, &config, &time)) {
            error!("Evaluator Failure: {}", e);
            return;
        }
        time.advance(Duration::hours(1));
    }

    info!("Simulation finished with {:?}", evaluator.current_values());
}
