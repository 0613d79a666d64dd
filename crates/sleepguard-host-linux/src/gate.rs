//! File-backed enforcement gate
//!
//! The platform enforcement helper watches a single JSON rules file. The file
//! is present exactly while blocking is active. Writes go to a sibling temp
//! file that is renamed over the target, so a reader sees either the previous
//! rule set or the new one, never a partial file.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sleepguard_api::AllowList;
use sleepguard_host_api::{EnforcementGate, HostError, HostResult, ShieldRules};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Contents of the rules file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldRulesFile {
    pub applied_at: DateTime<Local>,
    pub rules: ShieldRules,
}

/// Enforcement gate that commits shield rules to a file
pub struct FileShieldGate {
    path: PathBuf,
}

impl FileShieldGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rules currently committed, if any
    pub fn current(&self) -> Option<ShieldRulesFile> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read rules file");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Rules file is corrupt");
                None
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn commit(&self, file: &ShieldRulesFile) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let temp = self.temp_path();
        {
            let mut out = fs::File::create(&temp)?;
            out.write_all(&json)?;
            out.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        Ok(())
    }
}

impl EnforcementGate for FileShieldGate {
    fn activate(&self, allow_list: &AllowList) -> HostResult<()> {
        let file = ShieldRulesFile {
            applied_at: sleepguard_util::now(),
            rules: ShieldRules::from_allow_list(allow_list),
        };

        self.commit(&file)
            .map_err(|e| HostError::ActivationFailed(format!("{}: {}", self.path.display(), e)))?;

        info!(
            path = %self.path.display(),
            allowed = allow_list.len(),
            "Shield rules applied"
        );
        Ok(())
    }

    fn deactivate(&self) -> HostResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Shield rules cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No shield rules to clear");
                Ok(())
            }
            Err(e) => Err(HostError::DeactivationFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn is_active(&self) -> bool {
        self.path.exists()
    }
}
