//! Persisted bearer token and expiry arithmetic.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token together with the instant it stops being usable.
///
/// A record is created by a successful login and replaced wholesale on
/// refresh; it is never mutated in place. Token and expiry are always
/// persisted together, as one JSON object:
///
/// ```json
/// { "token": "abc", "tokenExpiry": "1760000000000" }
/// ```
///
/// Validity is computed on demand against a clock reading:
///
/// ```
/// use alist_models::TokenRecord;
/// use chrono::{TimeDelta, Utc};
///
/// let now = Utc::now();
/// let record = TokenRecord::new("abc", now + TimeDelta::minutes(10));
/// assert!(record.is_valid_at(now, TimeDelta::minutes(5)));
/// assert!(!record.is_valid_at(now, TimeDelta::minutes(15)));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Opaque bearer token presented in the `Authorization` header.
    pub token: String,
    /// Absolute expiry, stored as epoch milliseconds in a string.
    #[serde(rename = "tokenExpiry", with = "epoch_millis")]
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Create a record from a token and its absolute expiry.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Create a record that expires `ttl` after `issued_at`, saturating at
    /// the latest representable instant.
    pub fn issued(token: impl Into<String>, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(token, expires_at)
    }

    /// `now < expires_at - buffer`, and the token is non-empty.
    ///
    /// An expiry so early that the buffer cannot be subtracted is invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>, buffer: TimeDelta) -> bool {
        !self.token.is_empty() && self.buffered_expiry(buffer).is_some_and(|limit| now < limit)
    }

    /// Time left before the buffered expiry, or `None` once it has passed.
    pub fn remaining_at(&self, now: DateTime<Utc>, buffer: TimeDelta) -> Option<TimeDelta> {
        let left = self.buffered_expiry(buffer)?.signed_duration_since(now);
        (left > TimeDelta::zero()).then_some(left)
    }

    fn buffered_expiry(&self, buffer: TimeDelta) -> Option<DateTime<Utc>> {
        self.expires_at.checked_sub_signed(buffer)
    }
}

/// Validity of an optional record, so callers can ask about "no record" too.
pub fn is_valid(record: Option<&TokenRecord>, now: DateTime<Utc>, buffer: TimeDelta) -> bool {
    record.is_some_and(|r| r.is_valid_at(now, buffer))
}

mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Text(String),
        Number(i64),
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.timestamp_millis().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let millis = match Millis::deserialize(deserializer)? {
            Millis::Text(text) => text.trim().parse::<i64>().map_err(de::Error::custom)?,
            Millis::Number(n) => n,
        };
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| de::Error::custom(format!("expiry out of range: {millis}")))
    }
}
