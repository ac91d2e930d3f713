use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::formula;

/// Decimal places kept in every published value.
const PRECISION: i32 = 2;

/// A named external value a metric reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Input {
    EnergyToday,
    PricePerUnit,
    /// Energy produced over the projection period.
    TotalEnergy,
}

/// A static numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Param {
    Investment,
    EstimatedDailyProduction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    DailySavings,
    MonthlySavings,
    YearlySavings,
    EstimatedPayback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Currency,
    Days,
}

/// Everything a formula may look at during one refresh, after zero-fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInputs {
    pub energy_today: f64,
    pub price_per_unit: f64,
    pub total_energy: f64,
    pub investment: f64,
    pub estimated_daily_production: f64,
    pub today: NaiveDate,
    pub install_date: Option<NaiveDate>,
}

pub struct DerivedMetric {
    kind: MetricKind,
    name: &'static str,
    icon: &'static str,
    unit: Unit,
    inputs: &'static [Input],
    params: &'static [Param],
    needs_install_date: bool,
    formula: fn(&MetricInputs) -> f64,
}

impl DerivedMetric {
    /// Human readable name, used as the display name of the published value.
    pub fn get_name(&self) -> &'static str {
        self.name
    }

    pub fn get_icon(&self) -> &'static str {
        self.icon
    }

    pub fn get_unit(&self) -> Unit {
        self.unit
    }

    pub fn get_inputs(&self) -> &'static [Input] {
        self.inputs
    }

    pub fn get_params(&self) -> &'static [Param] {
        self.params
    }

    pub fn needs_install_date(&self) -> bool {
        self.needs_install_date
    }

    /// Computes the published value: rounded, with anything non-finite reported as 0.
    pub fn evaluate(&self, inputs: &MetricInputs) -> f64 {
        // Rounding scales the value up, so it can overflow a finite result.
        let value = formula::round_to((self.formula)(inputs), PRECISION);
        if value.is_finite() { value } else { 0.0 }
    }
}

static METRICS: [DerivedMetric; 4] = [
    DerivedMetric {
        kind: MetricKind::DailySavings,
        name: "Daily Savings",
        icon: "mdi:currency-usd",
        unit: Unit::Currency,
        inputs: &[Input::EnergyToday, Input::PricePerUnit],
        params: &[],
        needs_install_date: false,
        formula: |i| formula::daily_savings(i.energy_today, i.price_per_unit),
    },
    DerivedMetric {
        kind: MetricKind::MonthlySavings,
        name: "Monthly Savings",
        icon: "mdi:calendar-month",
        unit: Unit::Currency,
        inputs: &[Input::TotalEnergy, Input::PricePerUnit],
        params: &[],
        needs_install_date: false,
        formula: |i| formula::monthly_savings(i.total_energy, i.today.day(), formula::days_in_month(i.today), i.price_per_unit),
    },
    DerivedMetric {
        kind: MetricKind::YearlySavings,
        name: "Yearly Savings",
        icon: "mdi:calendar",
        unit: Unit::Currency,
        inputs: &[Input::TotalEnergy, Input::PricePerUnit],
        params: &[],
        needs_install_date: true,
        formula: |i| match i.install_date {
            Some(install_date) => formula::yearly_savings(i.total_energy, formula::days_since(install_date, i.today), i.price_per_unit),
            None => 0.0,
        },
    },
    DerivedMetric {
        kind: MetricKind::EstimatedPayback,
        name: "Estimated Payback",
        icon: "mdi:timer-sand",
        unit: Unit::Days,
        inputs: &[Input::PricePerUnit],
        params: &[Param::Investment, Param::EstimatedDailyProduction],
        needs_install_date: false,
        formula: |i| formula::estimated_payback(i.investment, i.price_per_unit, i.estimated_daily_production),
    },
];

impl MetricKind {
    pub fn metric(&self) -> &'static DerivedMetric {
        match self {
            MetricKind::DailySavings => &METRICS[0],
            MetricKind::MonthlySavings => &METRICS[1],
            MetricKind::YearlySavings => &METRICS[2],
            MetricKind::EstimatedPayback => &METRICS[3],
        }
    }

    /// Stable identifier for the published value, derived only from the metric name.
    pub fn unique_id(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            return self.to_string();
        }
        format!("{}_{}", prefix, self)
    }
}
