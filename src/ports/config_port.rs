//! Configuration access port trait.

use chrono::NaiveDate;

/// Sectioned key/value lookup, as read from an INI file.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `YYYY-MM-DD` value; `None` when missing or blank, `Err` with the raw
    /// text when malformed.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, String> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| raw),
        }
    }
}
