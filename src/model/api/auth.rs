use chrono::{serde::ts_seconds, DateTime, Utc};
use data_encoding::BASE64;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite},
    time::Duration,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{db::User, mongodb::Id};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Login credentials, either from the login request body or from an
/// `Authorization: Basic` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parse credentials out of an `Authorization: Basic` header value.
    pub fn from_basic_header(header: &str) -> Result<Self, Error> {
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| Error::bad_request("Unsupported Authorization scheme"))?;
        let decoded = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|_| Error::bad_request("Invalid base64 in Authorization header"))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| Error::bad_request("Invalid UTF-8 in Authorization header"))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| Error::bad_request("Malformed basic credentials"))?;
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// A user's session: JWT claims carried by the auth token cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated user.
    pub id: Id,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Session {
    /// Open a new session for the given user.
    pub fn for_user(user: &User, config: &Config) -> Self {
        Self {
            id: user.id,
            expire_at: Utc::now() + config.auth_ttl(),
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialise this session into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let max_age = Duration::seconds(config.auth_ttl().num_seconds());
        let token = jsonwebtoken::encode(
            &Header::default(),
            &self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(max_age)
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialise a session from a cookie, verifying the signature and
    /// expiry.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, Error> {
        let session = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Session>| data.claims)?;
        Ok(session)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use crate::model::db::{EXAMPLE_PASSWORD, SUPERUSER_PASSWORD};

    impl Credentials {
        pub fn example() -> Self {
            Self {
                username: "alice".to_string(),
                password: EXAMPLE_PASSWORD.to_string(),
            }
        }

        pub fn example2() -> Self {
            Self {
                username: "bob".to_string(),
                password: EXAMPLE_PASSWORD.to_string(),
            }
        }

        pub fn superuser_example() -> Self {
            Self {
                username: "overseer".to_string(),
                password: SUPERUSER_PASSWORD.to_string(),
            }
        }

        pub fn bad_example() -> Self {
            Self {
                username: "alice".to_string(),
                password: "letmein".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_header_round_trip() {
        let encoded = BASE64.encode(b"alice:rosebud");
        let credentials = Credentials::from_basic_header(&format!("Basic {encoded}")).unwrap();
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, "rosebud");
    }

    #[test]
    fn basic_header_allows_colons_in_password() {
        let encoded = BASE64.encode(b"alice:ro:se:bud");
        let credentials = Credentials::from_basic_header(&format!("Basic {encoded}")).unwrap();
        assert_eq!(credentials.password, "ro:se:bud");
    }

    #[test]
    fn basic_header_rejects_other_schemes() {
        assert!(Credentials::from_basic_header("Bearer abcdef").is_err());
        assert!(Credentials::from_basic_header("Basic $$$not-base64$$$").is_err());
    }
}
