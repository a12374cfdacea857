use rand::RngCore;

use crate::error::CoreError;

const CREDENTIAL_CONTEXT: &str = "vistoria 2024 account credential v1";

/// Salted password digest. The plaintext is never kept.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHandle {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl CredentialHandle {
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::derive_with_salt(password, salt)
    }

    fn derive_with_salt(password: &str, salt: [u8; 16]) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(CREDENTIAL_CONTEXT);
        hasher.update(&salt);
        hasher.update(password.as_bytes());
        Self {
            salt,
            digest: *hasher.finalize().as_bytes(),
        }
    }

    pub fn from_parts(salt: &[u8], digest: &[u8]) -> Result<Self, CoreError> {
        let salt: [u8; 16] = salt
            .try_into()
            .map_err(|_| CoreError::InvalidData("credential salt must be 16 bytes".into()))?;
        let digest: [u8; 32] = digest
            .try_into()
            .map_err(|_| CoreError::InvalidData("credential digest must be 32 bytes".into()))?;
        Ok(Self { salt, digest })
    }

    pub fn salt(&self) -> &[u8; 16] {
        &self.salt
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::derive_with_salt(password, self.salt);
        // blake3::Hash equality is constant time.
        blake3::Hash::from(candidate.digest) == blake3::Hash::from(self.digest)
    }
}

impl std::fmt::Debug for CredentialHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialHandle({:02x}{:02x}...)", self.salt[0], self.salt[1])
    }
}

/// The signed-in user on whose behalf edits and commits are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub email: String,
}

impl Actor {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    /// Collaborator label used on maintenance records.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }
}
