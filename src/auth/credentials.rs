//! Login credential checking

use std::collections::HashMap;

use crate::auth::models::{Credential, User, UserRole};
use crate::config::{Config, UserConfig};
use crate::error::{Error, Result};

/// Checks submitted credentials against the configured accounts.
///
/// Holds only the immutable account table; `validate` has no side effects.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    accounts: HashMap<String, Account>,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    role: UserRole,
}

impl CredentialValidator {
    pub fn new(users: &[UserConfig]) -> Self {
        let accounts = users
            .iter()
            .map(|u| {
                (
                    u.username.clone(),
                    Account {
                        password: u.password.clone(),
                        role: u.role,
                    },
                )
            })
            .collect();
        Self { accounts }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.users)
    }

    /// Validate a username/password pair.
    ///
    /// Empty fields, unknown users and wrong passwords all yield
    /// [`Error::InvalidCredentials`].
    pub fn validate(&self, credential: &Credential) -> Result<User> {
        if credential.username.is_empty() || credential.password.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        match self.accounts.get(&credential.username) {
            Some(account) if account.password == credential.password => {
                Ok(User::new(credential.username.clone(), account.role))
            }
            _ => Err(Error::InvalidCredentials),
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}
