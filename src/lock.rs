use crate::error::{JournalError, Result};
use crate::store::{Store, HAS_PASSWORD_KEY};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub trait CredentialStore {
    fn set_password(&mut self, password: &str) -> Result<()>;
    fn verify_password(&self, password: &str) -> Result<bool>;
}

pub trait Biometrics {
    fn is_available(&self) -> bool;
    fn authenticate(&mut self, prompt: &str) -> bool;
}

/// Terminals have no fingerprint reader.
pub struct NoBiometrics;

impl Biometrics for NoBiometrics {
    fn is_available(&self) -> bool {
        false
    }

    fn authenticate(&mut self, _prompt: &str) -> bool {
        false
    }
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    salt: String,
    digest: String,
}

/// Keeps a salted SHA-256 digest of the password in a file next to the journal.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialStore { path: path.into() }
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl CredentialStore for FileCredentialStore {
    fn set_password(&mut self, password: &str) -> Result<()> {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = hex::encode(salt);
        let stored = StoredCredential {
            digest: Self::digest(&salt, password),
            salt,
        };
        let serialized = serde_json::to_string(&stored)?;
        fs::write(&self.path, serialized).map_err(|e| JournalError::storage(&self.path, e))
    }

    fn verify_password(&self, password: &str) -> Result<bool> {
        let serialized = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(JournalError::storage(&self.path, e)),
        };
        let stored: StoredCredential = serde_json::from_str(&serialized)
            .map_err(|e| JournalError::Credential(format!("unreadable credential file: {e}")))?;
        Ok(Self::digest(&stored.salt, password) == stored.digest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockMethod {
    Biometric,
    Password,
}

/// The password/biometric gate in front of the journal.
pub struct LockGate {
    credentials: Box<dyn CredentialStore>,
    biometrics: Box<dyn Biometrics>,
    min_password_len: usize,
    password_set: bool,
    locked: bool,
}

impl LockGate {
    /// Locked at start when a password was ever set.
    pub fn load(
        store: &Store,
        credentials: Box<dyn CredentialStore>,
        biometrics: Box<dyn Biometrics>,
        min_password_len: usize,
    ) -> Result<Self> {
        let password_set = store.get::<bool>(HAS_PASSWORD_KEY)?.unwrap_or(false);
        Ok(LockGate {
            credentials,
            biometrics,
            min_password_len,
            password_set,
            locked: password_set,
        })
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_password_set(&self) -> bool {
        self.password_set
    }

    pub fn biometrics_available(&self) -> bool {
        self.biometrics.is_available()
    }

    pub fn set_password(&mut self, store: &Store, password: &str) -> Result<()> {
        if password.chars().count() < self.min_password_len {
            return Err(JournalError::InvalidPassword {
                min: self.min_password_len,
            });
        }
        self.credentials.set_password(password)?;
        store.set(HAS_PASSWORD_KEY, &true)?;
        self.password_set = true;
        self.locked = false;
        tracing::info!("Journal password set");
        Ok(())
    }

    /// Tries biometrics first when available, then the password.
    pub fn unlock(&mut self, password: &str) -> Result<Option<UnlockMethod>> {
        if self.biometrics.is_available()
            && self.biometrics.authenticate("Authenticate to access your diary")
        {
            self.locked = false;
            return Ok(Some(UnlockMethod::Biometric));
        }
        if self.credentials.verify_password(password)? {
            self.locked = false;
            return Ok(Some(UnlockMethod::Password));
        }
        tracing::warn!("Unlock attempt rejected");
        Ok(None)
    }

    pub fn lock(&mut self) {
        if self.password_set {
            self.locked = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FakeBiometrics {
        accept: bool,
    }

    impl Biometrics for FakeBiometrics {
        fn is_available(&self) -> bool {
            true
        }

        fn authenticate(&mut self, _prompt: &str) -> bool {
            self.accept
        }
    }

    fn open_gate(temp: &TempDir, biometrics: Box<dyn Biometrics>) -> (Store, LockGate) {
        let store = Store::open(temp.path()).unwrap();
        let creds = FileCredentialStore::new(temp.path().join("credentials.json"));
        let gate = LockGate::load(&store, Box::new(creds), biometrics, 4).unwrap();
        (store, gate)
    }

    #[test]
    fn file_store_never_keeps_plain_password() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.json");
        let mut creds = FileCredentialStore::new(&path);
        assert!(!creds.verify_password("secret").unwrap());

        creds.set_password("secret").unwrap();
        assert!(creds.verify_password("secret").unwrap());
        assert!(!creds.verify_password("Secret").unwrap());
        assert!(!fs::read_to_string(path).unwrap().contains("secret"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        let temp = TempDir::new().unwrap();
        let (store, mut gate) = open_gate(&temp, Box::new(NoBiometrics));
        assert!(!gate.is_locked());
        assert!(matches!(
            gate.set_password(&store, "abc"),
            Err(JournalError::InvalidPassword { min: 4 })
        ));
        assert!(!gate.is_password_set());
    }

    #[test]
    fn password_survives_restart_and_locks() {
        let temp = TempDir::new().unwrap();
        {
            let (store, mut gate) = open_gate(&temp, Box::new(NoBiometrics));
            gate.set_password(&store, "hunter22").unwrap();
            assert!(!gate.is_locked());
        }
        let (_store, mut gate) = open_gate(&temp, Box::new(NoBiometrics));
        assert!(gate.is_locked());
        assert_eq!(gate.unlock("wrong").unwrap(), None);
        assert!(gate.is_locked());
        assert_eq!(gate.unlock("hunter22").unwrap(), Some(UnlockMethod::Password));
        assert!(!gate.is_locked());
    }

    #[test]
    fn biometrics_are_tried_first() {
        let temp = TempDir::new().unwrap();
        let (store, mut gate) = open_gate(&temp, Box::new(FakeBiometrics { accept: true }));
        gate.set_password(&store, "hunter22").unwrap();
        gate.lock();
        assert_eq!(gate.unlock("").unwrap(), Some(UnlockMethod::Biometric));

        let (_, mut gate) = open_gate(&temp, Box::new(FakeBiometrics { accept: false }));
        assert_eq!(gate.unlock("hunter22").unwrap(), Some(UnlockMethod::Password));
    }
}
