// Process-level settings from environment variables

use cmdrelay_api_rpc::server::DEFAULT_RPC_PORT;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "~/.cmdrelay";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonEnv {
    /// Holds `config.json` and `queue.json`
    pub data_dir: PathBuf,
    pub rpc_port: u16,
}

impl DaemonEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("CMDRELAY_DATA_DIR")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let rpc_port = lookup("CMDRELAY_RPC_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_RPC_PORT);

        Self {
            data_dir: shellexpand::tilde(&data_dir).into_owned().into(),
            rpc_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> DaemonEnv {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonEnv::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let resolved = env(&[]);
        assert_eq!(resolved.rpc_port, DEFAULT_RPC_PORT);
        assert!(resolved.data_dir.ends_with(".cmdrelay"));
    }

    #[test]
    fn test_overrides_and_bad_port() {
        let resolved = env(&[("CMDRELAY_DATA_DIR", "/srv/relay"), ("CMDRELAY_RPC_PORT", "x")]);
        assert_eq!(resolved.data_dir, PathBuf::from("/srv/relay"));
        assert_eq!(resolved.rpc_port, DEFAULT_RPC_PORT);

        assert_eq!(env(&[("CMDRELAY_RPC_PORT", "9800")]).rpc_port, 9800);
    }
}
