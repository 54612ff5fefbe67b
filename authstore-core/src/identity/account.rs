//! Account records and the inputs that create or change them

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Store-assigned account identifier, strictly increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `createdAt` exactly as stored.
///
/// Accounts created here get an RFC 3339 string with millisecond precision
/// and a `Z` suffix, e.g. `2024-05-01T09:30:00.000Z`. Text written by other
/// writers is kept byte for byte, whatever its shape, so rewriting the
/// directory never alters another account's timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedAt(String);

impl CreatedAt {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The stored text as a UTC instant, `None` when it is not RFC 3339
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl From<String> for CreatedAt {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CreatedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered identity as persisted in the directory and the session key.
///
/// Field names on the wire are camelCase (`fullName`, `createdAt`). Fields
/// this type does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    /// Stored and compared verbatim.
    pub password: String,
    #[serde(default)]
    pub phone: String,
    /// Absent on records from writers that never set it; such records are
    /// written back without the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<CreatedAt>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    /// Build a fresh account from signup input
    pub fn create(id: AccountId, request: SignupRequest) -> Self {
        Self {
            id,
            full_name: request.full_name,
            email: request.email,
            password: request.password,
            phone: request.phone,
            created_at: Some(CreatedAt::now()),
            extra: Map::new(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .field("created_at", &self.created_at)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Input to signup. Format checks (non-empty, email shape, password length)
/// belong to the caller; the store only enforces email uniqueness.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl SignupRequest {
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            password: password.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Partial profile change.
///
/// Only the fields listed here can be changed; `id` and `createdAt` are not
/// representable, and unknown keys in a deserialized payload are ignored.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_name(mut self, value: impl Into<String>) -> Self {
        self.full_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.password = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.phone.is_none()
    }

    /// Shallow merge over `account`; absent fields keep their current value
    pub fn apply_to(&self, account: &Account) -> Account {
        let mut merged = account.clone();
        if let Some(full_name) = &self.full_name {
            merged.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            merged.email = email.clone();
        }
        if let Some(password) = &self.password {
            merged.password = password.clone();
        }
        if let Some(phone) = &self.phone {
            merged.phone = phone.clone();
        }
        merged
    }
}

impl fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("phone", &self.phone)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Account {
        Account {
            id: AccountId(1),
            full_name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
            phone: "1234567890".to_string(),
            created_at: Some(CreatedAt::from_datetime(
                Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            )),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let json: Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["fullName"], "A");
        assert_eq!(json["createdAt"], "2024-05-01T09:30:00.000Z");
        assert!(json.get("full_name").is_none());
    }

    #[test]
    fn test_parses_browser_written_record() {
        let raw = r#"{"id":1714555800000,"fullName":"Jo","email":"jo@x.com","password":"secret1","phone":"1234567890","createdAt":"2024-05-01T09:30:00.000Z"}"#;
        let account = Account::from_json(raw).unwrap();

        assert_eq!(account.id, AccountId(1_714_555_800_000));
        assert_eq!(account.full_name, "Jo");
        assert_eq!(
            account.created_at.as_ref().and_then(CreatedAt::to_datetime),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let raw = r#"{"id":5,"fullName":"B","email":"b@x.com","password":"p","phone":"1","createdAt":"2024-05-01T09:30:00.000Z","avatar":"b.png","newsletter":true}"#;
        let account = Account::from_json(raw).unwrap();
        assert_eq!(account.extra["avatar"], "b.png");

        let reparsed = Account::from_json(&account.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, account);
        assert_eq!(reparsed.extra["newsletter"], true);
    }

    #[test]
    fn test_rejects_records_without_identity() {
        assert!(Account::from_json(r#"{"email":"a@x.com"}"#).is_err());
        assert!(Account::from_json("not json").is_err());
        assert!(Account::from_json(r#"{"id":1,"password":"p","createdAt":"x"}"#).is_err());
        assert!(Account::from_json(r#"{"id":1,"email":"a","createdAt":"x"}"#).is_err());
    }

    #[test]
    fn test_created_at_is_kept_verbatim() {
        for raw in [
            "2024-05-01T09:30:00.123456+02:00",
            "Wed May 01 2024",
            "",
        ] {
            let json = format!(
                r#"{{"id":1,"email":"a@x.com","password":"p","createdAt":{}}}"#,
                serde_json::to_string(raw).unwrap()
            );
            let account = Account::from_json(&json).unwrap();
            assert_eq!(account.created_at.as_ref().map(CreatedAt::as_str), Some(raw));

            let written: Value = serde_json::from_str(&account.to_json().unwrap()).unwrap();
            assert_eq!(written["createdAt"], raw);
        }
    }

    #[test]
    fn test_created_at_parsing() {
        let offset = CreatedAt::from("2024-05-01T09:30:00.123+02:00".to_string());
        assert_eq!(
            offset.to_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap() + chrono::Duration::milliseconds(123))
        );
        assert_eq!(CreatedAt::from("Wed May 01 2024".to_string()).to_datetime(), None);
    }

    #[test]
    fn test_create_stamps_millisecond_utc() {
        let account = Account::create(AccountId(9), SignupRequest::new("Jo", "jo@x.com", "pw", "1"));
        let stamp = account.created_at.expect("creation stamps createdAt");

        // 2024-05-01T09:30:00.000Z
        assert_eq!(stamp.as_str().len(), 24);
        assert!(stamp.as_str().ends_with('Z'));
        assert!(stamp.to_datetime().is_some());
    }

    #[test]
    fn test_missing_created_at_stays_missing() {
        let account = Account::from_json(r#"{"id":2,"email":"b@x.com","password":"p"}"#).unwrap();
        assert_eq!(account.created_at, None);
        assert!(!account.to_json().unwrap().contains("createdAt"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("secret1"));
        assert!(rendered.contains("<redacted>"));

        let update = ProfileUpdate::new().password("hunter2");
        assert!(!format!("{:?}", update).contains("hunter2"));
    }

    #[test]
    fn test_profile_update_merges_only_supplied_fields() {
        let account = sample();
        let merged = ProfileUpdate::new().full_name("B").apply_to(&account);

        assert_eq!(merged.id, AccountId(1));
        assert_eq!(merged.full_name, "B");
        assert_eq!(merged.email, "a@x.com");
        assert_eq!(merged.password, account.password);
        assert_eq!(merged.created_at, account.created_at);
    }

    #[test]
    fn test_profile_update_ignores_identity_fields_in_payload() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"id":99,"createdAt":"2000-01-01T00:00:00.000Z","fullName":"B"}"#)
                .unwrap();
        assert_eq!(update, ProfileUpdate::new().full_name("B"));

        let merged = update.apply_to(&sample());
        assert_eq!(merged.id, AccountId(1));
        assert_eq!(merged.created_at, sample().created_at);
    }

    #[test]
    fn test_profile_update_is_empty() {
        assert!(ProfileUpdate::new().is_empty());
        assert!(!ProfileUpdate::new().phone("5").is_empty());
    }
}
