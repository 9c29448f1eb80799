//! Configuration access port.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// `None` when the key is absent or blank; a value that does not parse
    /// is reported back verbatim as `Err`.
    fn get_opt_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => s.trim().parse().map(Some).map_err(|_| s),
        }
    }
}
