//! Calendar date source used to stamp backups.

/// Supplies today's date as `YYYY-MM-DD`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Today's date, formatted `YYYY-MM-DD`.
    fn today(&self) -> String;
}

/// A [`Clock`] that always reports the same date.
///
/// The CLI pins the date once at start-up with [`FixedClock::local_today`],
/// so every backup taken during one run carries the same stamp even if the
/// run crosses midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock {
    date: String,
}

impl FixedClock {
    /// Pin the clock to `date` (expected `YYYY-MM-DD`).
    #[must_use]
    pub fn new(date: impl Into<String>) -> Self {
        Self { date: date.into() }
    }

    /// Pin the clock to the current local date.
    #[must_use]
    pub fn local_today() -> Self {
        Self::new(chrono::Local::now().format("%Y-%m-%d").to_string())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> String {
        self.date.clone()
    }
}
