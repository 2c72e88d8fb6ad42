use serde::{Deserialize, Serialize};
use std::fmt;

/// User ID type, derived from country code and phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user identified by phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub country_code: String,
    pub phone: String,
}

impl User {
    pub fn new(country_code: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            phone: phone.into(),
        }
    }

    /// Stable identifier used to namespace all stored state: `{country_code}_{phone}`
    pub fn id(&self) -> UserId {
        UserId(format!("{}_{}", self.country_code, self.phone))
    }

    pub fn matches(&self, country_code: &str, phone: &str) -> bool {
        self.country_code == country_code && self.phone == phone
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.country_code, self.phone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        let user = User::new("+91", "9876543210");
        assert_eq!(user.id().as_str(), "+91_9876543210");
        assert_eq!(user.id().to_string(), "+91_9876543210");
    }

    #[test]
    fn test_user_json_uses_camel_case() {
        let user = User::new("+1", "5550001111");
        let value = serde_json::to_value(&user).expect("serializable");
        assert_eq!(value["countryCode"], "+1");
        assert_eq!(value["phone"], "5550001111");
    }
}
