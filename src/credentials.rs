//! Credential data structures.

use chrono::{DateTime, Utc};

/// Temporary access credentials with an expiration instant.
///
/// A record is only ever constructed fully populated: every string field is
/// non-empty and the expiration is finite. Partial data is represented as
/// "no record" (`None`) by the code that reads it.
#[derive(Clone, PartialEq)]
pub struct CredentialRecord {
    /// Access key identifier
    pub access_key_id: String,
    /// Secret access key
    pub secret_key: String,
    /// Session token
    pub session_token: String,
    /// Expiration as epoch seconds with fractional precision
    pub expiration: f64,
}

impl CredentialRecord {
    /// Creates a record, returning `None` if any field is empty or the
    /// expiration is not a finite number.
    ///
    /// # Example
    ///
    /// ```
    /// use locauth::CredentialRecord;
    ///
    /// assert!(CredentialRecord::new("AKIA", "secret", "token", 1_700_000_000.5).is_some());
    /// assert!(CredentialRecord::new("AKIA", "", "token", 1_700_000_000.5).is_none());
    /// ```
    pub fn new(
        access_key_id: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: f64,
    ) -> Option<Self> {
        let record = Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            session_token: session_token.into(),
            expiration,
        };
        record.is_complete().then_some(record)
    }

    /// Returns true when all four fields are populated.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty()
            && !self.secret_key.is_empty()
            && !self.session_token.is_empty()
            && self.expiration.is_finite()
    }

    /// Expiration as a UTC timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.expiration.floor();
        let nanos = ((self.expiration - secs) * 1e9).round() as u32;
        DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
    }

    /// Returns true iff `now` is strictly before the expiration.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        epoch_seconds(now) < self.expiration
    }

    /// Validity against the current wall clock.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Credentials as returned by an externally supplied resolver.
#[derive(Clone, PartialEq)]
pub struct ResolvedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl ResolvedCredentials {
    /// Converts into a [`CredentialRecord`].
    ///
    /// Returns `None` when the session token or expiration is missing, since
    /// a record without them cannot be validated or persisted.
    pub fn into_record(self) -> Option<CredentialRecord> {
        let expiration = epoch_seconds(self.expiration?);
        CredentialRecord::new(
            self.access_key_id,
            self.secret_access_key,
            self.session_token?,
            expiration,
        )
    }
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Converts a timestamp into fractional epoch seconds.
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_expiring_at(expiration: f64) -> CredentialRecord {
        CredentialRecord::new("A", "S", "T", expiration).unwrap()
    }

    #[test]
    fn test_incomplete_records_are_rejected() {
        assert!(CredentialRecord::new("", "S", "T", 1.0).is_none());
        assert!(CredentialRecord::new("A", "", "T", 1.0).is_none());
        assert!(CredentialRecord::new("A", "S", "", 1.0).is_none());
        assert!(CredentialRecord::new("A", "S", "T", f64::NAN).is_none());
    }

    #[test]
    fn test_validity_boundary() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let at_now = record_expiring_at(epoch_seconds(now));

        assert!(!at_now.is_valid_at(now));
        assert!(at_now.is_valid_at(now - Duration::milliseconds(1)));
        assert!(!at_now.is_valid_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_validity_against_wall_clock() {
        let future = record_expiring_at(epoch_seconds(Utc::now() + Duration::seconds(10)));
        let past = record_expiring_at(epoch_seconds(Utc::now() - Duration::seconds(10)));

        assert!(future.is_valid());
        assert!(!past.is_valid());
    }

    #[test]
    fn test_expires_at_keeps_fraction() {
        let record = record_expiring_at(1_700_000_000.25);
        let at = record.expires_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert_eq!(at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let record = CredentialRecord::new("AKIA", "very-secret", "tok", 1.0).unwrap();
        let debug = format!("{:?}", record);
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("tok\""));
    }

    #[test]
    fn test_resolved_credentials_require_token_and_expiration() {
        let expiration = Utc::now() + Duration::seconds(60);
        let full = ResolvedCredentials {
            access_key_id: "A".to_string(),
            secret_access_key: "S".to_string(),
            session_token: Some("T".to_string()),
            expiration: Some(expiration),
        };
        let record = full.clone().into_record().unwrap();
        assert_eq!(record.secret_key, "S");
        assert!(record.is_valid());

        let no_token = ResolvedCredentials {
            session_token: None,
            ..full.clone()
        };
        assert!(no_token.into_record().is_none());

        let no_expiration = ResolvedCredentials {
            expiration: None,
            ..full
        };
        assert!(no_expiration.into_record().is_none());
    }
}
