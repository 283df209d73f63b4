//! Encrypted password cache for the terminal client.
//!
//! The admin password is kept AES-256-CBC encrypted (base64 on disk) in the
//! data directory so the client can log in again when its session expires
//! without prompting every time. Key material is embedded at build time.

use super::data_storage::DataStorage;
use aes::Aes256;
use anyhow::{anyhow, Result};
use base64::prelude::*;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use std::path::{Path, PathBuf};

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

#[derive(Clone, Debug)]
pub struct Secret {
    prompt: String,
    secret_file_path: PathBuf,
}

impl Secret {
    pub fn new(secret_name: &str, prompt: &str) -> Self {
        let secret_file_path = DataStorage::new().get_path(secret_name).unwrap_or_else(|_| PathBuf::from(secret_name));
        Self::at(secret_file_path, prompt)
    }

    pub fn at(secret_file_path: PathBuf, prompt: &str) -> Self {
        Self {
            prompt: prompt.to_owned(),
            secret_file_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.secret_file_path
    }

    /// Returns the cached password, prompting when there is none.
    pub fn get_or_prompt(&self) -> Result<String> {
        if let Ok(password) = self.read() {
            return Ok(password);
        }
        self.prompt()
    }

    /// Always asks for the password and caches the answer.
    pub fn prompt(&self) -> Result<String> {
        let password = Password::with_theme(&ColorfulTheme::default()).with_prompt(&self.prompt).interact()?;
        self.store(&password)?;
        Ok(password)
    }

    pub fn store(&self, password: &str) -> Result<()> {
        let cipher = Self::cipher()?;
        let encoded = BASE64_STANDARD.encode(cipher.encrypt_vec(password.as_bytes()));

        if let Some(parent) = self.secret_file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.secret_file_path, encoded)?;
        Ok(())
    }

    pub fn read(&self) -> Result<String> {
        let encoded = fs::read_to_string(&self.secret_file_path)?;
        let ciphertext = BASE64_STANDARD.decode(encoded.trim())?;
        let plaintext = Self::cipher()?.decrypt_vec(&ciphertext).map_err(|e| anyhow!("cannot decrypt cached password: {}", e))?;
        Ok(String::from_utf8(plaintext)?)
    }

    /// Forgets the cached password. A missing cache is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.secret_file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn cipher() -> Result<Aes256Cbc> {
        Aes256Cbc::new_from_slices(APP_METADATA_SECRET_KEY, APP_METADATA_SECRET_IV).map_err(|e| anyhow!("invalid cache key: {}", e))
    }
}
