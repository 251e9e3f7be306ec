use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub api_base: Option<String>,
    pub table: Option<String>,
    pub token_env: Option<String>,
    pub base_id_env: Option<String>,
    pub timeout: Option<u64>,
    #[serde(alias = "proxy")]
    pub proxy_url: Option<String>,
    pub products_url: Option<String>,
    pub paypal_business: Option<String>,
    pub return_url: Option<String>,
    pub theme_file: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn config_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".vitrine"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(config_dir()?.join("config.yml"))
}

pub fn default_theme_path() -> Option<PathBuf> {
    Some(config_dir()?.join("theme"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn default_config_yaml() -> String {
    r#"# Vitrine config
#
# Location (default):
#   ~/.vitrine/config.yml
#
# Credentials never live here. Only the names of the environment
# variables that hold them do.

# Proxy server
bind: 127.0.0.1
port: 3000

# Record store
api_base: https://api.airtable.com/v0/
table: Produits
token_env: AIRTABLE_PERSONAL_ACCESS_TOKEN
base_id_env: AIRTABLE_BASE_ID

# HTTP (optional)
timeout: 10
# proxy_url: http://127.0.0.1:8080

# Storefront
products_url: http://localhost:3000/api/products
# paypal_business: votre-email@paypal.com
# return_url: https://boutique.example/
# theme_file: ~/.vitrine/theme

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_parses_with_expected_values() {
        let cfg: ConfigFile = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(cfg.port, Some(3000));
        assert_eq!(cfg.table.as_deref(), Some("Produits"));
        assert_eq!(cfg.token_env.as_deref(), Some("AIRTABLE_PERSONAL_ACCESS_TOKEN"));
        assert_eq!(cfg.paypal_business, None);
    }

    #[test]
    fn missing_file_is_allowed_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn proxy_alias_is_accepted() {
        let cfg: ConfigFile = serde_yaml::from_str("proxy: http://127.0.0.1:8080\n").unwrap();
        assert_eq!(cfg.proxy_url.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        std::fs::write(&path, "port: 8080\n").unwrap();
        assert!(!ensure_default_config_file(&path).unwrap());
        assert_eq!(load_config(&path, false).unwrap().port, Some(8080));
    }

    #[test]
    fn tilde_expands_against_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x.yml"), home.join("x.yml"));
        }
        assert_eq!(expand_tilde("/abs/x.yml"), PathBuf::from("/abs/x.yml"));
    }
}
