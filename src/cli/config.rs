use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{CredentialStore, FileCredentialStore};

const CREDENTIAL_FILE: &str = "credential.json";

/// Persistent configuration directory; "remember me" credentials live here
pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("EDCCTL_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("edcctl")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Per-login-session directory; cleared by the OS on logout or reboot
pub fn get_runtime_dir() -> PathBuf {
    if let Ok(custom_dir) = std::env::var("EDCCTL_RUNTIME_DIR") {
        return PathBuf::from(custom_dir);
    }
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join("edcctl");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "default".to_string());
    std::env::temp_dir().join(format!("edcctl-{}", user))
}

pub fn persistent_store() -> anyhow::Result<FileCredentialStore> {
    Ok(FileCredentialStore::new(get_config_dir()?.join(CREDENTIAL_FILE)))
}

pub fn session_store() -> FileCredentialStore {
    FileCredentialStore::new(get_runtime_dir().join(CREDENTIAL_FILE))
}

/// Store holding the current credential: the session one wins over a
/// remembered one, and a fresh login defaults to session scope.
pub fn active_store() -> anyhow::Result<Arc<dyn CredentialStore>> {
    let session = session_store();
    if session.path().exists() {
        return Ok(Arc::new(session));
    }

    let persistent = persistent_store()?;
    if persistent.path().exists() {
        return Ok(Arc::new(persistent));
    }

    Ok(Arc::new(session))
}

/// Store for a new login, after dropping whatever either store held
pub fn login_store(remember: bool) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let session = session_store();
    let persistent = persistent_store()?;
    session.clear()?;
    persistent.clear()?;

    if remember {
        Ok(Arc::new(persistent))
    } else {
        Ok(Arc::new(session))
    }
}
