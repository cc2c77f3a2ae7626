use std::io::Cursor;

use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use mongodb::error::Error as DbError;
use rocket::{
    http::{ContentType, Status},
    response::Responder,
    Response,
};
use thiserror::Error;

use crate::model::common::VoteRejection;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("Vote rejected: {0}")]
    Vote(#[from] VoteRejection),
    #[error("{0}: {1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, msg.into())
    }

    /// A 400 with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, msg.into())
    }

    /// A 401 with the given message.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, msg.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        match self {
            // Vote rejections carry their reason string as the body.
            Self::Vote(rejection) => {
                warn!("{self}");
                let reason = rejection.reason();
                Response::build()
                    .status(Status::Forbidden)
                    .header(ContentType::Plain)
                    .sized_body(reason.len(), Cursor::new(reason))
                    .ok()
            }
            Self::Status(status, ref msg) => {
                warn!("{status}: {msg}");
                Err(status)
            }
            Self::Db(_) => {
                error!("{self}");
                Err(Status::InternalServerError)
            }
            Self::Jwt(err) => Err(match err.into_kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            }),
            Self::Argon2(_) => Err(Status::BadRequest),
        }
    }
}
