//! Where usernames and passwords come from.

use crate::errors::AuthError;
use crate::types::Username;
use async_trait::async_trait;
use std::fmt;

/// A LaBB-CAT username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: Username,
    pub password: String,
}

impl Credentials {
    pub fn new(username: Username, password: String) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Supplies credentials when the server asks for them and none are known,
/// or the known ones were rejected.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn prompt_username(&self) -> Result<Username, AuthError>;

    async fn prompt_password(&self, username: &Username) -> Result<String, AuthError>;
}

/// Never supplies credentials: authorization fails instead of prompting.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchMode;

#[async_trait]
impl CredentialProvider for BatchMode {
    async fn prompt_username(&self) -> Result<Username, AuthError> {
        Err(AuthError::CredentialsRequired)
    }

    async fn prompt_password(&self, _username: &Username) -> Result<String, AuthError> {
        Err(AuthError::CredentialsRequired)
    }
}

/// Asks for credentials on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl CredentialProvider for TerminalPrompt {
    async fn prompt_username(&self) -> Result<Username, AuthError> {
        let input = tokio::task::spawn_blocking(|| {
            dialoguer::Input::<String>::new()
                .with_prompt("LaBB-CAT username")
                .allow_empty(true)
                .interact_text()
        })
        .await
        .map_err(|_| AuthError::Cancelled)?
        .map_err(|_| AuthError::Cancelled)?;
        let input = input.trim();
        if input.is_empty() {
            Err(AuthError::Cancelled)
        } else {
            Ok(Username::from(input))
        }
    }

    async fn prompt_password(&self, username: &Username) -> Result<String, AuthError> {
        let prompt = format!("Password for {}", username);
        tokio::task::spawn_blocking(move || {
            dialoguer::Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(|_| AuthError::Cancelled)?
        .map_err(|_| AuthError::Cancelled)
    }
}
