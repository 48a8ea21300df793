//! Registration and login with domain-derived roles.
//!
//! Roles come from the email domain at registration time: institute staff
//! addresses become instructors, student-mail addresses become students and
//! every other domain is rejected. Passwords are bcrypt-hashed before they
//! touch the profile; the plaintext is never stored.

use crate::models::{ParticipantRole, UserProfile};
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

const BCRYPT_COST: u32 = 12;

const INSTRUCTOR_DOMAIN: &str = "@iitpkd.ac.in";
const STUDENT_DOMAIN: &str = "@smail.iitpkd.ac.in";

/// Error type for authentication operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The email is already registered
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// The email domain maps to no role
    #[error("Unsupported email domain: {0}")]
    UnsupportedDomain(String),

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// In-memory registry of registered users, keyed by email.
#[derive(Default)]
pub struct AuthService {
    users: HashMap<String, UserProfile>,
}

impl AuthService {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user, deriving the role from the email domain.
    ///
    /// # Errors
    ///
    /// Fails if the email is already registered, the domain maps to no
    /// role, or password hashing fails.
    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
        logo_url: Option<String>,
    ) -> Result<UserProfile, AuthError> {
        if self.users.contains_key(email) {
            return Err(AuthError::DuplicateEmail(email.to_string()));
        }
        let role = Self::role_for_email(email)?;

        let hashed = bcrypt::hash(password, BCRYPT_COST)
            .map_err(|err| AuthError::Hashing(err.to_string()))?;
        let mut profile = UserProfile::new(email, display_name, logo_url, role);
        profile.password_hash = Some(SecretString::from(hashed));

        self.users.insert(email.to_string(), profile.clone());
        info!(target: "controller.auth", email = %email, role = ?role, "Registered user");
        Ok(profile)
    }

    /// Verify credentials and return the stored profile.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::InvalidCredentials`] on unknown email or
    /// password mismatch; the two cases are deliberately indistinguishable.
    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let user = self.users.get(email).ok_or(AuthError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_ref()
            .ok_or(AuthError::InvalidCredentials)?;
        if bcrypt::verify(password, hash.expose_secret()).unwrap_or(false) {
            Ok(user.clone())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Look up a registered user by email.
    #[must_use]
    pub fn user(&self, email: &str) -> Option<&UserProfile> {
        self.users.get(email)
    }

    fn role_for_email(email: &str) -> Result<ParticipantRole, AuthError> {
        if email.ends_with(INSTRUCTOR_DOMAIN) {
            Ok(ParticipantRole::Instructor)
        } else if email.ends_with(STUDENT_DOMAIN) {
            Ok(ParticipantRole::Student)
        } else {
            Err(AuthError::UnsupportedDomain(email.to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_domain_becomes_instructor() {
        let mut auth = AuthService::new();
        let profile = auth
            .register("prof@iitpkd.ac.in", "pw123456", "Prof", None)
            .unwrap();
        assert_eq!(profile.role, ParticipantRole::Instructor);
    }

    #[test]
    fn test_student_mail_domain_becomes_student() {
        let mut auth = AuthService::new();
        let profile = auth
            .register("stud@smail.iitpkd.ac.in", "pw123456", "Stud", None)
            .unwrap();
        assert_eq!(profile.role, ParticipantRole::Student);
    }

    #[test]
    fn test_outside_domain_is_rejected() {
        let mut auth = AuthService::new();
        let result = auth.register("x@gmail.com", "pw123456", "X", None);
        assert_eq!(
            result.unwrap_err(),
            AuthError::UnsupportedDomain("x@gmail.com".to_string())
        );
        assert!(auth.user("x@gmail.com").is_none());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let mut auth = AuthService::new();
        auth.register("prof@iitpkd.ac.in", "pw123456", "Prof", None)
            .unwrap();
        let result = auth.register("prof@iitpkd.ac.in", "other", "Prof II", None);
        assert!(matches!(result, Err(AuthError::DuplicateEmail(_))));
    }

    #[test]
    fn test_password_is_hashed_not_stored() {
        let mut auth = AuthService::new();
        let profile = auth
            .register("prof@iitpkd.ac.in", "pw123456", "Prof", None)
            .unwrap();
        let hash = profile.password_hash.unwrap();
        assert_ne!(hash.expose_secret(), "pw123456");
        assert!(hash.expose_secret().starts_with("$2"));
    }

    #[test]
    fn test_login_verifies_password() {
        let mut auth = AuthService::new();
        auth.register("stud@smail.iitpkd.ac.in", "pw123456", "Stud", None)
            .unwrap();

        let ok = auth.login("stud@smail.iitpkd.ac.in", "pw123456").unwrap();
        assert_eq!(ok.email, "stud@smail.iitpkd.ac.in");

        assert_eq!(
            auth.login("stud@smail.iitpkd.ac.in", "wrong").unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.login("nobody@smail.iitpkd.ac.in", "pw123456").unwrap_err(),
            AuthError::InvalidCredentials
        );
    }
}
