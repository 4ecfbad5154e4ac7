//! The favorites list: an ordered, deduplicated set of uppercase airport
//! codes stored as a JSON array. The core never sees this type, only the
//! codes it yields.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Favorites {
    codes: Vec<String>,
    path: PathBuf,
}

impl Favorites {
    /// Load the favorites file, or start empty when it does not exist.
    /// Codes are case-normalized and deduplicated on the way in.
    pub fn load(path: &Path) -> Result<Self> {
        let codes = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read favorites file: {}", path.display()))?;
            let raw: Vec<String> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse favorites file: {}", path.display()))?;
            let mut codes = Vec::with_capacity(raw.len());
            for code in raw {
                let code = code.trim().to_uppercase();
                if !code.is_empty() && !codes.contains(&code) {
                    codes.push(code);
                }
            }
            codes
        } else {
            Vec::new()
        };
        Ok(Favorites { codes, path: path.to_path_buf() })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(&self.codes)
            .context("Failed to serialize favorites")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favorites file: {}", self.path.display()))
    }

    /// Append a code; false if it was already present.
    pub fn add(&mut self, code: &str) -> bool {
        let code = code.trim().to_uppercase();
        if code.is_empty() || self.codes.contains(&code) {
            return false;
        }
        self.codes.push(code);
        true
    }

    /// Remove a code; false if it was not present.
    pub fn remove(&mut self, code: &str) -> bool {
        let code = code.trim().to_uppercase();
        let before = self.codes.len();
        self.codes.retain(|c| c != &code);
        self.codes.len() != before
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
