//! Self-registration gate. Authentication itself is delegated; this only
//! decides whether a new account may be created.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("registration is locked by the administrator")]
    Locked,

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("{email} is not an address in {domain}")]
    DomainNotAllowed { email: String, domain: String },

    #[error("{0} is reserved")]
    ReservedIdentifier(String),

    #[error("{0} is already registered")]
    EmailTaken(String),
}

/// Account keys compare trimmed and case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct RegistrationPolicy {
    /// Suffix every self-registered address must carry, e.g. `@estapar.com.br`.
    pub required_domain: String,
    /// Identifier of the bootstrap administrative account.
    pub admin_identifier: String,
}

impl RegistrationPolicy {
    pub fn new(required_domain: &str, admin_identifier: &str) -> Self {
        Self {
            required_domain: normalize_email(required_domain),
            admin_identifier: normalize_email(admin_identifier),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        normalize_email(email) == self.admin_identifier
    }

    /// Whether `email` is shaped like an address in the organization domain.
    pub fn domain_allows(&self, email: &str) -> bool {
        let email = normalize_email(email);
        email
            .strip_suffix(&self.required_domain)
            .is_some_and(|local| !local.is_empty() && !local.contains(char::is_whitespace))
    }

    /// Checks a registration request. `email_taken` reports whether an account
    /// already holds the (normalized) address.
    pub fn check(
        &self,
        name: &str,
        email: &str,
        password: &str,
        locked: bool,
        email_taken: bool,
    ) -> Result<(), RegistrationError> {
        if locked {
            return Err(RegistrationError::Locked);
        }
        if name.trim().is_empty() {
            return Err(RegistrationError::MissingField("name"));
        }
        if email.trim().is_empty() {
            return Err(RegistrationError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(RegistrationError::MissingField("password"));
        }
        let email = normalize_email(email);
        if self.is_admin(&email) {
            return Err(RegistrationError::ReservedIdentifier(email));
        }
        if !self.domain_allows(&email) {
            return Err(RegistrationError::DomainNotAllowed {
                email,
                domain: self.required_domain.clone(),
            });
        }
        if email_taken {
            return Err(RegistrationError::EmailTaken(email));
        }
        Ok(())
    }
}
