use chrono::{DateTime, FixedOffset, Offset, Utc};

/// UTC+07:00, the offset the recommendation service's users live in
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 420;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Renders `dd/mm/yyyy` date labels and `HH:MM` time labels in a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLabeler {
    offset: FixedOffset,
}

impl DateLabeler {
    /// Out-of-range offsets fall back to UTC
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn date_label(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(DATE_FORMAT).to_string()
    }

    pub fn time_label(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(TIME_FORMAT).to_string()
    }

    pub fn today_label(&self) -> String {
        self.date_label(Utc::now())
    }

    /// Date label for a persisted turn; turns without a timestamp count as today
    pub fn turn_date_label(&self, timestamp: Option<DateTime<Utc>>) -> String {
        match timestamp {
            Some(at) => self.date_label(at),
            None => self.today_label(),
        }
    }
}

impl Default for DateLabeler {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_MINUTES)
    }
}
