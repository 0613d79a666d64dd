//! Local blocking authorization
//!
//! On Linux the only permission that matters is being able to write the
//! rules directory the enforcement helper watches. Requesting authorization
//! creates that directory.

use async_trait::async_trait;
use nix::unistd::{AccessFlags, access};
use sleepguard_host_api::{AuthorizationProvider, AuthorizationStatus, HostError, HostResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct LocalAuthorization {
    rules_dir: PathBuf,
}

impl LocalAuthorization {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    /// Authorization for the directory holding `rules_path`
    pub fn for_rules_path(rules_path: &Path) -> Self {
        Self::new(
            rules_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        )
    }
}

#[async_trait]
impl AuthorizationProvider for LocalAuthorization {
    fn status(&self) -> AuthorizationStatus {
        match std::fs::metadata(&self.rules_dir) {
            // Creating the rules file needs write and search on the directory
            // for this user, not just some write bit in the mode
            Ok(meta) if meta.is_dir() => {
                match access(&self.rules_dir, AccessFlags::W_OK | AccessFlags::X_OK) {
                    Ok(()) => AuthorizationStatus::Approved,
                    Err(errno) => {
                        debug!(dir = %self.rules_dir.display(), error = %errno, "Rules directory not writable");
                        AuthorizationStatus::Denied
                    }
                }
            }
            Ok(_) => AuthorizationStatus::Denied,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                AuthorizationStatus::NotDetermined
            }
            Err(_) => AuthorizationStatus::Denied,
        }
    }

    async fn request_authorization(&self) -> HostResult<()> {
        if let Err(e) = tokio::fs::create_dir_all(&self.rules_dir).await {
            warn!(dir = %self.rules_dir.display(), error = %e, "Cannot create rules directory");
            return Err(HostError::PermissionDenied(format!(
                "{}: {}",
                self.rules_dir.display(),
                e
            )));
        }

        match self.status() {
            AuthorizationStatus::Approved => {
                info!(dir = %self.rules_dir.display(), "Blocking authorized");
                Ok(())
            }
            status => Err(HostError::PermissionDenied(format!(
                "{} is not writable ({:?})",
                self.rules_dir.display(),
                status
            ))),
        }
    }
}
