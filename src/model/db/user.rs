use std::ops::{Deref, DerefMut};

use mongodb::{bson::doc, Database};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::auth::{Credentials, Session, AUTH_TOKEN_COOKIE},
    mongodb::{Coll, Id},
};

/// Core user account data.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub username: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

impl UserCore {
    /// A user with the given credentials, hashing the password.
    pub fn new(username: impl Into<String>, password: impl AsRef<[u8]>, is_superuser: bool) -> Self {
        let salt: [u8; 16] = rand::random();
        let password_hash =
            argon2::hash_encoded(password.as_ref(), &salt, &argon2::Config::default())
                .expect("Argon2 hashing with the default config is infallible");
        Self {
            username: username.into(),
            password_hash,
            is_superuser,
        }
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe because the only way to create a UserCore is via
        // `UserCore::new`, so the hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// A user without an ID, for insertion.
pub type NewUser = UserCore;

/// A user account from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = Error;

    /// Authenticate from the session cookie if present, otherwise from
    /// `Authorization: Basic` credentials.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwraps are safe as `Config` and the `Database` are always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();
        let db = req.guard::<&State<Database>>().await.unwrap();
        let users = Coll::<User>::from_db(db);

        // Session cookie takes precedence.
        if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
            let session = match Session::from_cookie(cookie, config) {
                Ok(session) => session,
                Err(err) => return Outcome::Failure((Status::Unauthorized, err)),
            };
            return match users.find_one(session.id.as_doc(), None).await {
                Ok(Some(user)) => Outcome::Success(user),
                Ok(None) => Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Session user no longer exists"),
                )),
                Err(err) => Outcome::Failure((Status::InternalServerError, err.into())),
            };
        }

        // Fall back to basic credentials.
        if let Some(header) = req.headers().get_one("Authorization") {
            let credentials = match Credentials::from_basic_header(header) {
                Ok(credentials) => credentials,
                Err(err) => return Outcome::Failure((Status::BadRequest, err)),
            };
            let filter = doc! { "username": &credentials.username };
            return match users.find_one(filter, None).await {
                Ok(Some(user)) if user.verify_password(&credentials.password) => {
                    Outcome::Success(user)
                }
                Ok(_) => Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("Bad username or password"),
                )),
                Err(err) => Outcome::Failure((Status::InternalServerError, err.into())),
            };
        }

        Outcome::Failure((
            Status::Unauthorized,
            Error::unauthorized("No session cookie or basic credentials"),
        ))
    }
}

/// Request guard for routes restricted to superusers.
///
/// Forwards when authenticated as a regular user, so a lower-ranked route can
/// handle the request instead.
pub struct Superuser(pub User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Superuser {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match User::from_request(req).await {
            Outcome::Success(user) if user.is_superuser => Outcome::Success(Superuser(user)),
            Outcome::Success(_) => Outcome::Forward(()),
            Outcome::Failure(failure) => Outcome::Failure(failure),
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}

/// Ensure the configured superuser account exists.
///
/// This operation is idempotent; an existing account with the configured
/// username is left alone.
pub async fn ensure_superuser_exists(users: &Coll<NewUser>, config: &Config) -> Result<()> {
    let filter = doc! { "username": config.superuser_username() };
    if users.find_one(filter, None).await?.is_none() {
        let superuser = NewUser::new(
            config.superuser_username(),
            config.superuser_password(),
            true,
        );
        users.insert_one(superuser, None).await?;
        info!("Created superuser account '{}'", config.superuser_username());
    }
    Ok(())
}

#[cfg(test)]
pub use examples::{EXAMPLE_PASSWORD, SUPERUSER_PASSWORD};
