//! Service configuration

use anyhow::{bail, Context, Result};
use boardvault_common::{AuditSeverity, Identity, BOARD_SIZE};
use boardvault_custody::{ReleasePolicy, ReleaseTrigger, VaultOptions};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// BoardVault service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Board settings
    pub board: BoardSettings,
    /// Release policy settings
    pub release: ReleaseSettings,
    /// Minimum audit severity written to the log
    pub audit_min_severity: AuditSeverity,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            board: BoardSettings::default(),
            release: ReleaseSettings::default(),
            audit_min_severity: AuditSeverity::Info,
        }
    }
}

/// Board composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Required number of members
    pub size: usize,
    /// Member identities given inline
    pub members: Vec<String>,
    /// Path to a JSON array of member identities (takes priority over `members`)
    pub members_file: Option<String>,
    /// Privileged initiator identity
    pub initiator: Option<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            size: BOARD_SIZE,
            members: vec![],
            members_file: None,
            initiator: None,
        }
    }
}

/// Release policy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseSettings {
    pub trigger: ReleaseTrigger,
    pub allow_cancel: bool,
}

impl ServiceConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("BOARDVAULT_HOST") {
            cfg.host = host;
        }
        if let Some(port) = lookup("BOARDVAULT_PORT") {
            cfg.port = port.parse().context("BOARDVAULT_PORT must be a port number")?;
        }

        // Board settings
        if let Some(size) = lookup("BOARDVAULT_BOARD_SIZE") {
            cfg.board.size = size
                .parse()
                .context("BOARDVAULT_BOARD_SIZE must be a positive integer")?;
        }
        if let Some(members) = lookup("BOARDVAULT_BOARD_MEMBERS") {
            cfg.board.members = members
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        cfg.board.members_file = lookup("BOARDVAULT_BOARD_FILE");
        cfg.board.initiator = lookup("BOARDVAULT_INITIATOR");

        // Release settings
        if let Some(trigger) = lookup("BOARDVAULT_RELEASE_TRIGGER") {
            cfg.release.trigger = trigger.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(allow) = lookup("BOARDVAULT_ALLOW_CANCEL") {
            cfg.release.allow_cancel = allow
                .parse()
                .context("BOARDVAULT_ALLOW_CANCEL must be true or false")?;
        }

        if let Some(severity) = lookup("BOARDVAULT_AUDIT_MIN_SEVERITY") {
            cfg.audit_min_severity = severity.parse().map_err(anyhow::Error::msg)?;
        }

        if cfg.board.size == 0 {
            bail!("BOARDVAULT_BOARD_SIZE must be a positive integer");
        }

        Ok(cfg)
    }

    /// Vault construction options
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            board_size: self.board.size,
            policy: ReleasePolicy {
                trigger: self.release.trigger,
                allow_cancel: self.release.allow_cancel,
            },
        }
    }

    /// Resolve board members and initiator
    ///
    /// Without configured members a throwaway `did:key` board is generated,
    /// which is only useful for local development.
    pub fn resolve_identities(&self) -> Result<(Vec<Identity>, Identity)> {
        let raw: Vec<String> = match &self.board.members_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read board file {}", path))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse board file {}", path))?
            }
            None => self.board.members.clone(),
        };

        let members = if raw.is_empty() {
            warn!(size = self.board.size, "No board configured, generating a development board");
            (0..self.board.size).map(|_| Identity::generate().0).collect()
        } else {
            raw.into_iter()
                .map(Identity::new)
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Invalid board member identity")?
        };

        let initiator = match &self.board.initiator {
            Some(id) => Identity::new(id.as_str()).context("Invalid initiator identity")?,
            None => {
                let (id, _) = Identity::generate();
                warn!(initiator = %id, "No initiator configured, generated one");
                id
            }
        };

        Ok((members, initiator))
    }
}
