//! Data models for roster
//!
//! Defines the user record as served by the remote directory API, plus the
//! id-less payload used for create and update operations.

use serde::{Deserialize, Serialize};

/// Postal address attached to a user record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
}

/// Company attached to a user record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "catchPhrase", skip_serializing_if = "Option::is_none")]
    pub catch_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bs: Option<String>,
}

/// A user record
///
/// `id` is the primary key for every engine operation. `avatar_url` is never
/// authoritative on the remote record; it is resolved from the local avatar
/// store, which overrides whatever the remote returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique identifier, stable once assigned
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    /// Data-URI avatar, resolved locally
    #[serde(default, rename = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// Build a record from a payload and a final id
    pub fn from_payload(id: u64, payload: NewUser) -> Self {
        Self {
            id,
            name: payload.name,
            username: payload.username,
            email: payload.email,
            phone: payload.phone,
            website: payload.website,
            address: payload.address,
            company: payload.company,
            avatar_url: payload.avatar_url,
        }
    }

    /// Company name, if one is set
    pub fn company_name(&self) -> Option<&str> {
        self.company.as_ref().and_then(|c| c.name.as_deref())
    }

    /// Case-insensitive substring match over the searchable fields
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        [
            Some(self.name.as_str()),
            Some(self.username.as_str()),
            Some(self.email.as_str()),
            Some(self.phone.as_str()),
            self.company_name(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&q))
    }
}

/// Payload for create and update operations: every user field except `id`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    #[serde(default, rename = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl NewUser {
    /// Create a payload with the required fields
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            email: email.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    /// Set the website
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Set the company by name
    pub fn with_company(mut self, name: impl Into<String>) -> Self {
        self.company = Some(Company {
            name: Some(name.into()),
            ..Company::default()
        });
        self
    }

    /// Set the avatar data URI
    pub fn with_avatar(mut self, data_uri: impl Into<String>) -> Self {
        self.avatar_url = Some(data_uri.into());
        self
    }
}

impl From<User> for NewUser {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            website: user.website,
            address: user.address,
            company: user.company,
            avatar_url: user.avatar_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> NewUser {
        NewUser::new("Leanne Graham", "Bret", "leanne@example.com", "1-770-736-8031")
            .with_website("hildegard.org")
            .with_company("Romaguera-Crona")
    }

    #[test]
    fn test_from_payload() {
        let user = User::from_payload(7, sample_payload());
        assert_eq!(user.id, 7);
        assert_eq!(user.name, "Leanne Graham");
        assert_eq!(user.company_name(), Some("Romaguera-Crona"));
        assert!(user.avatar_url.is_none());
    }

    #[test]
    fn test_payload_round_trip() {
        let user = User::from_payload(3, sample_payload().with_avatar("data:image/png;base64,AAAA"));
        let back: NewUser = user.clone().into();
        assert_eq!(User::from_payload(3, back), user);
    }

    #[test]
    fn test_matches_fields() {
        let user = User::from_payload(1, sample_payload());
        assert!(user.matches("leanne"));
        assert!(user.matches("BRET"));
        assert!(user.matches("romaguera"));
        assert!(user.matches("770"));
        assert!(!user.matches("nobody"));
    }

    #[test]
    fn test_wire_field_names() {
        let mut user = User::from_payload(1, sample_payload());
        user.company = Some(Company {
            name: Some("Acme".to_string()),
            catch_phrase: Some("Multi-layered".to_string()),
            bs: None,
        });
        user.avatar_url = Some("data:image/png;base64,AAAA".to_string());

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["company"]["catchPhrase"], "Multi-layered");
        assert_eq!(json["avatarUrl"], "data:image/png;base64,AAAA");
        assert!(json["company"].get("bs").is_none());
    }

    #[test]
    fn test_deserialize_remote_shape() {
        // JSONPlaceholder records carry nested fields we keep optional
        let json = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "address": {"street": "Kulas Light", "suite": "Apt. 556", "city": "Gwenborough", "zipcode": "92998-3874"},
            "company": {"name": "Romaguera-Crona", "catchPhrase": "Multi-layered client-server neural-net", "bs": "harness real-time e-markets"}
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.company_name(), Some("Romaguera-Crona"));
        assert!(user.avatar_url.is_none());
        assert_eq!(
            user.address.as_ref().and_then(|a| a.city.as_deref()),
            Some("Gwenborough")
        );
    }

    #[test]
    fn test_serialization_round_trip() {
        let user = User::from_payload(42, sample_payload());
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(user, back);
    }
}
