//! This file defines types that handle password validation and hashing.
//! `ValidatedPassword` wraps a string and ensures it meets the length policy.
//! `PasswordHash` converts a `ValidatedPassword` into a salted and hashed password.

use std::fmt::Display;

use bcrypt::{BcryptError, hash, verify};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The minimum number of characters a password must have.
pub const PASSWORD_MIN_LENGTH: usize = 4;
/// The maximum number of characters a password may have.
pub const PASSWORD_MAX_LENGTH: usize = 20;

/// A password that has been validated, but not yet hashed.
///
/// This struct can be used to construct a [PasswordHash].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Create and validate a new password from a string.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidPasswordLength] if the
    /// password is shorter than [PASSWORD_MIN_LENGTH] or longer than
    /// [PASSWORD_MAX_LENGTH] characters.
    pub fn new(raw_password_string: &str) -> Result<Self, Error> {
        let length = raw_password_string.chars().count();

        if (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&length) {
            Ok(Self(raw_password_string.to_string()))
        } else {
            Err(Error::InvalidPasswordLength)
        }
    }

    /// Create a new `ValidatedPassword` without any validation.
    ///
    /// The caller should ensure that `raw_password_string` is a valid password.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid password is provided it may cause incorrect behaviour but will not affect memory safety.
    pub fn new_unchecked(raw_password_string: &str) -> Self {
        Self(raw_password_string.to_string())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default encryption cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Create a hashed password from a validated password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed to verify a password.
    /// A value of at least 12 is recommended. Pass in [PasswordHash::DEFAULT_COST] to use the recommended cost.
    ///
    /// # Errors
    ///
    /// This function will return an error if the password could not be hashed.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        match hash(&password.0, cost) {
            Ok(password_hash) => Ok(Self(password_hash)),
            Err(e) => Err(Error::HashingError(e.to_string())),
        }
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_string())
    }

    /// Check that `raw_password` matches the stored password.
    ///
    /// The comparison is performed by bcrypt in constant time.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, password::ValidatedPassword};

    #[test]
    fn new_fails_on_empty() {
        let result = ValidatedPassword::new("");

        assert_eq!(result, Err(Error::InvalidPasswordLength));
    }

    #[test]
    fn new_fails_on_three_characters() {
        let result = ValidatedPassword::new("abc");

        assert_eq!(result, Err(Error::InvalidPasswordLength));
    }

    #[test]
    fn new_succeeds_on_four_characters() {
        let result = ValidatedPassword::new("abcd");

        assert!(result.is_ok());
    }

    #[test]
    fn new_succeeds_on_twenty_characters() {
        let result = ValidatedPassword::new("a".repeat(20).as_str());

        assert!(result.is_ok());
    }

    #[test]
    fn new_fails_on_twenty_one_characters() {
        let result = ValidatedPassword::new("a".repeat(21).as_str());

        assert_eq!(result, Err(Error::InvalidPasswordLength));
    }
}
