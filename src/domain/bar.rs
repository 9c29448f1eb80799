//! Daily price/volume observation for one instrument.

use chrono::NaiveDate;

/// One row of an instrument's price file. The instrument itself is
/// carried by whoever holds the bar list.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}
