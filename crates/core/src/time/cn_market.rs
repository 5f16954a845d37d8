use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

const CST_OFFSET_SECS: i32 = 8 * 3600;

fn cst() -> FixedOffset {
    FixedOffset::east_opt(CST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Calendar date in China Standard Time; used to scope per-day cache keys.
pub fn screening_date(now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&cst()).date_naive()
}

/// Report timestamp (`YYYY-MM-DD HH:MM`, CST) embedded in generation prompts.
pub fn report_timestamp(now_utc: DateTime<Utc>) -> String {
    now_utc
        .with_timezone(&cst())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
