use chrono::{DateTime, TimeZone, Utc};
use time::OffsetDateTime;

pub fn utc_to_offset(value: DateTime<Utc>) -> OffsetDateTime {
    let nanos = i128::from(value.timestamp_millis()).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn offset_to_utc(value: OffsetDateTime) -> DateTime<Utc> {
    let millis = (value.unix_timestamp_nanos() / 1_000_000) as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_keeps_millisecond_precision() {
        let value = Utc.timestamp_millis_opt(1_707_191_412_345).unwrap();
        assert_eq!(offset_to_utc(utc_to_offset(value)), value);
    }
}
