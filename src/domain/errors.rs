// Domain-level errors for the client workflows.

use std::fmt;

/// Failure while acquiring or refreshing the access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingRefreshToken,
    Rejected { status: u16 },
    Transport(String),
    Decode(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingRefreshToken => write!(f, "no refresh token stored"),
            AuthError::Rejected { status } => write!(f, "credential refresh rejected ({status})"),
            AuthError::Transport(err) => write!(f, "auth transport error: {err}"),
            AuthError::Decode(err) => write!(f, "auth response decode error: {err}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Failure to establish a battle channel.
#[derive(Debug)]
pub enum SessionError {
    CredentialRefresh(AuthError),
    InvalidUrl(String),
    Connect(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::CredentialRefresh(err) => write!(f, "failed to refresh credential: {err}"),
            SessionError::InvalidUrl(url) => write!(f, "invalid battle url: {url}"),
            SessionError::Connect(err) => write!(f, "failed to connect: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Failure to load one entry of the sprite manifest.
#[derive(Debug)]
pub struct AssetError {
    pub name: String,
    pub kind: AssetErrorKind,
}

#[derive(Debug)]
pub enum AssetErrorKind {
    Read(std::io::Error),
    Decode(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AssetErrorKind::Read(err) => write!(f, "failed to load image {}: {err}", self.name),
            AssetErrorKind::Decode(err) => write!(f, "failed to decode image {}: {err}", self.name),
        }
    }
}

impl std::error::Error for AssetError {}
