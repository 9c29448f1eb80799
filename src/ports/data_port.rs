//! Price data access port.

use crate::domain::bar::DailyBar;
use crate::domain::error::IndexError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` in `db` between the two dates inclusive, ascending.
    fn fetch_bars(
        &self,
        code: &str,
        db: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DailyBar>, IndexError>;

    fn list_symbols(&self, db: &str) -> Result<Vec<String>, IndexError>;
}
