//! Human readable booking references: `MG-YYYYMMDD-XXXX`.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rand::Rng;
use regex::Regex;

pub const REFERENCE_PREFIX: &str = "MG";
pub const MAX_REFERENCE_ATTEMPTS: usize = 5;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MG-\d{8}-[A-Z0-9]{4}$").expect("reference pattern is valid")
});

pub fn generate_reference_number<R: Rng + ?Sized>(created_on: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("{}-{}-{}", REFERENCE_PREFIX, created_on.format("%Y%m%d"), suffix)
}

/// Day a booking made at `now` is stamped with, as seen on the clinic's calendar.
pub fn reference_date(now: DateTime<Utc>, clinic_offset: &FixedOffset) -> NaiveDate {
    now.with_timezone(clinic_offset).date_naive()
}

pub fn is_valid_reference_number(candidate: &str) -> bool {
    REFERENCE_PATTERN.is_match(candidate)
}
