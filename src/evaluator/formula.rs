use chrono::{Datelike, NaiveDate};

pub const DAYS_PER_YEAR: f64 = 365.0;

pub fn daily_savings(energy_today: f64, price_per_unit: f64) -> f64 {
    energy_today * price_per_unit
}

/// Projects the month-to-date energy over the whole month.
pub fn monthly_savings(total_energy: f64, day_of_month: u32, days_in_month: u32, price_per_unit: f64) -> f64 {
    if day_of_month == 0 {
        return 0.0;
    }
    (total_energy / day_of_month as f64) * days_in_month as f64 * price_per_unit
}

/// Projects the energy produced since installation over a whole year.
pub fn yearly_savings(total_energy: f64, days_since_install: i64, price_per_unit: f64) -> f64 {
    if days_since_install <= 0 {
        return 0.0;
    }
    (total_energy / days_since_install as f64) * DAYS_PER_YEAR * price_per_unit
}

/// Days until the savings cover the investment.
pub fn estimated_payback(investment: f64, price_per_unit: f64, estimated_daily_production: f64) -> f64 {
    let daily_return = price_per_unit * estimated_daily_production;
    if price_per_unit == 0.0 || estimated_daily_production == 0.0 || daily_return == 0.0 {
        return 0.0;
    }
    investment / daily_return
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(year, month, 1);
    let first_of_this = date.with_day(1);
    match (first_of_this, first_of_next) {
        (Some(this), Some(next)) => next.signed_duration_since(this).num_days() as u32,
        // Only reachable at the very end of chrono's date range.
        _ => 31,
    }
}

pub fn days_since(install_date: NaiveDate, today: NaiveDate) -> i64 {
    today.signed_duration_since(install_date).num_days()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
