use serde::{Deserialize, Serialize};

/// Identity decoded from the launch payload's `user` field.
///
/// Only `id` is required; every other field falls back to the platform's
/// documented defaults when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    #[serde(default = "default_first_name")]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub photo_url: String,
}

/// What the web app gets back after a successful launch: identity plus the
/// current preference value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserView {
    pub user_id: i64,
    pub first_name: String,
    pub username: String,
    pub photo_url: String,
    pub bpm: i64,
}

fn default_first_name() -> String {
    "Unknown".to_string()
}

fn default_language_code() -> String {
    "en".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_user_json_gets_defaults() {
        let identity: UserIdentity = serde_json::from_str(r#"{"id":42}"#).expect("id only");
        assert_eq!(identity.id, 42);
        assert_eq!(identity.first_name, "Unknown");
        assert_eq!(identity.last_name, "");
        assert_eq!(identity.username, "");
        assert_eq!(identity.language_code, "en");
        assert!(!identity.is_premium);
        assert!(!identity.is_bot);
        assert_eq!(identity.photo_url, "");
    }

    #[test]
    fn full_user_json_round_trips() {
        let identity: UserIdentity = serde_json::from_str(
            r#"{
                "id": 7,
                "first_name": "Ann",
                "last_name": "Lee",
                "username": "ann",
                "language_code": "de",
                "is_premium": true,
                "is_bot": false,
                "photo_url": "https://example.com/a.jpg"
            }"#,
        )
        .expect("full identity");
        assert_eq!(identity.first_name, "Ann");
        assert_eq!(identity.language_code, "de");
        assert!(identity.is_premium);
    }

    #[test]
    fn missing_id_is_an_error() {
        assert!(serde_json::from_str::<UserIdentity>(r#"{"first_name":"Ann"}"#).is_err());
    }
}
