use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SpongebookConfig {
    pub api_port: u16,
    pub paths: SpongebookPaths,
    pub remote: RemoteConfig,
}

impl SpongebookConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match env::var("SPONGEBOOK_HOME") {
            Ok(raw) if !raw.trim().is_empty() => SpongebookPaths::from_base_dir(raw.trim())?,
            _ => SpongebookPaths::discover()?,
        };
        let api_port = env::var("SPONGEBOOK_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        let remote = RemoteConfig::from_env();
        Ok(Self {
            api_port,
            paths,
            remote,
        })
    }

    pub fn new(api_port: u16, paths: SpongebookPaths) -> Self {
        Self {
            api_port,
            paths,
            remote: RemoteConfig::default(),
        }
    }

    pub fn with_remote(api_port: u16, paths: SpongebookPaths, remote: RemoteConfig) -> Self {
        Self {
            api_port,
            paths,
            remote,
        }
    }
}

/// Other nodes whose public posts are merged into the public listing.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub nodes: Vec<String>,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Self {
        let nodes = env::var("SPONGEBOOK_REMOTE_NODES")
            .map(|raw| parse_node_list(&raw))
            .unwrap_or_default();
        let timeout = env::var("SPONGEBOOK_REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10));
        Self { nodes, timeout }
    }
}

fn parse_node_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().trim_end_matches('/').to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SpongebookPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl SpongebookPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("spongebook.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            logs_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_list_is_trimmed() {
        let nodes = parse_node_list(" https://a.example/ , ,https://b.example");
        assert_eq!(nodes, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn paths_hang_off_base() {
        let paths = SpongebookPaths::from_base_dir("/srv/spongebook").unwrap();
        assert_eq!(paths.db_path, PathBuf::from("/srv/spongebook/data/spongebook.db"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/spongebook/logs"));
    }
}
