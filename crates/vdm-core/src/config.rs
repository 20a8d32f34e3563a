//! Global configuration loaded from `~/.config/vdm/config.toml`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::store::RetentionPolicy;

/// Retention section (optional in config.toml).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Artifacts older than this many seconds are evicted.
    pub ttl_secs: u64,
}

/// Extractor section (optional in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp binary; `None` uses `yt-dlp` from `$PATH`.
    #[serde(default)]
    pub bin: Option<PathBuf>,
    /// Extra arguments appended to every yt-dlp invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Service configuration, created with defaults on first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdmConfig {
    /// Address the HTTP binding listens on.
    pub listen_addr: String,
    /// Deadline for a whole extract-and-persist sequence, in seconds.
    pub fetch_timeout_secs: u64,
    /// Read buffer size when serving artifact bytes.
    pub stream_buffer_bytes: usize,
    /// Artifact directory; `None` uses the XDG data dir (`~/.local/share/vdm/downloads`).
    #[serde(default)]
    pub downloads_dir: Option<PathBuf>,
    /// Optional retention policy; if missing, artifacts are kept forever.
    #[serde(default)]
    pub retention: Option<RetentionConfig>,
    /// Optional extractor overrides.
    #[serde(default)]
    pub extractor: Option<ExtractorConfig>,
}

impl Default for VdmConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            fetch_timeout_secs: 120,
            stream_buffer_bytes: 64 * 1024,
            downloads_dir: None,
            retention: None,
            extractor: None,
        }
    }
}

impl VdmConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            ttl: self.retention.map(|r| Duration::from_secs(r.ttl_secs)),
        }
    }

    /// Resolved artifact directory (configured or XDG data dir).
    pub fn downloads_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.downloads_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("vdm")?;
        Ok(xdg_dirs.get_data_home().join("downloads"))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = std::fs::read_to_string(&path)?;
    let cfg: VdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = VdmConfig::default();
        assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(120));
        assert_eq!(cfg.stream_buffer_bytes, 64 * 1024);
        assert!(cfg.retention_policy().ttl.is_none());
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = VdmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: VdmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.listen_addr, cfg.listen_addr);
        assert_eq!(parsed.fetch_timeout_secs, cfg.fetch_timeout_secs);
        assert_eq!(parsed.stream_buffer_bytes, cfg.stream_buffer_bytes);
    }

    #[test]
    fn custom_values() {
        let toml = r#"
            listen_addr = "0.0.0.0:9000"
            fetch_timeout_secs = 30
            stream_buffer_bytes = 8192
            downloads_dir = "/srv/vdm/downloads"
        "#;
        let cfg: VdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(
            cfg.downloads_dir().unwrap(),
            PathBuf::from("/srv/vdm/downloads")
        );
        assert!(cfg.retention.is_none());
        assert!(cfg.extractor.is_none());
    }

    #[test]
    fn retention_and_extractor_sections() {
        let toml = r#"
            listen_addr = "127.0.0.1:8080"
            fetch_timeout_secs = 120
            stream_buffer_bytes = 65536

            [retention]
            ttl_secs = 3600

            [extractor]
            bin = "/usr/local/bin/yt-dlp"
            extra_args = ["--proxy", "socks5://127.0.0.1:9050"]
        "#;
        let cfg: VdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.retention_policy().ttl,
            Some(Duration::from_secs(3600))
        );
        let extractor = cfg.extractor.as_ref().unwrap();
        assert_eq!(
            extractor.bin.as_deref(),
            Some(std::path::Path::new("/usr/local/bin/yt-dlp"))
        );
        assert_eq!(extractor.extra_args.len(), 2);
    }
}
