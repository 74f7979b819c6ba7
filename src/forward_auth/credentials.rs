//! Packed two-factor credentials carried in a Basic `Authorization` header.
//!
//! The client sends `Basic base64(username:password<code>)` where `<code>` is the
//! trailing six characters of the secret, so any HTTP client that can do Basic
//! auth can complete a password + TOTP login in one request.

use base64ct::{Base64, Encoding};
use secrecy::SecretString;
use thiserror::Error;

/// Length of the one-time code appended to the password.
pub const TOTP_LENGTH: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unrecognized authorization header format")]
    HeaderFormat,
    #[error("authorization scheme is not Basic")]
    NotBasic,
    #[error("invalid base64 encoding")]
    Base64,
    #[error("credentials are not valid UTF-8")]
    Utf8,
    #[error("unrecognized credential format")]
    ContentFormat,
    #[error("secret must carry a password followed by a six character code")]
    SecretTooShort,
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub totp: SecretString,
}

impl Credentials {
    /// Decode the literal value of an `Authorization` header.
    ///
    /// # Errors
    /// Returns a [`CredentialError`] describing the first rule the value breaks.
    pub fn decode(header: &str) -> Result<Self, CredentialError> {
        let mut parts = header.split(' ');
        let (Some(scheme), Some(encoded), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialError::HeaderFormat);
        };

        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(CredentialError::NotBasic);
        }

        let decoded = Base64::decode_vec(encoded).map_err(|_| CredentialError::Base64)?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::Utf8)?;

        let mut fields = decoded.split(':');
        let (Some(username), Some(secret), None) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(CredentialError::ContentFormat);
        };

        let (password, totp) = split_secret(secret)?;

        Ok(Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            totp: SecretString::from(totp.to_string()),
        })
    }
}

// The code is counted in characters, the password must keep at least one.
fn split_secret(secret: &str) -> Result<(&str, &str), CredentialError> {
    if secret.chars().count() <= TOTP_LENGTH {
        return Err(CredentialError::SecretTooShort);
    }

    let index = secret
        .char_indices()
        .rev()
        .nth(TOTP_LENGTH - 1)
        .map(|(index, _)| index)
        .ok_or(CredentialError::SecretTooShort)?;

    Ok(secret.split_at(index))
}
