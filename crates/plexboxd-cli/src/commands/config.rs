use color_eyre::eyre::eyre;
use std::path::{Path, PathBuf};

use plex_export_config::{Config, CredentialStore, PathManager};

use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;

/// Load the effective config: the explicit `--config` path when given, the
/// platform config file when present, built-in defaults otherwise.
pub fn load_config(path_override: Option<&Path>) -> color_eyre::Result<Config> {
    let path = match path_override {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathManager::default().config_file();
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };
    Config::load_from_file(&path)
        .map_err(|e| eyre!("Failed to load config from {}: {e:#}", path.display()))
}

/// Server URL, token and timeout for the Plex connection. The config file
/// wins; the credential store backfills what the config leaves out.
pub fn plex_connection(config: &Config) -> color_eyre::Result<(String, String, u64)> {
    let plex = config.plex.clone().unwrap_or_default();

    if config.is_plex_configured() {
        return Ok((plex.url, plex.token, plex.timeout));
    }

    let paths = PathManager::default();
    let mut store = CredentialStore::new(paths.credentials_file());
    store.load().map_err(|e| eyre!("{e:#}"))?;

    let token = store.get_plex_token().cloned().ok_or_else(|| {
        eyre!("No Plex token configured. Set [plex].token in the config file or run 'plexboxd config plex'")
    })?;
    let url = store.get_plex_server_url().cloned().unwrap_or(plex.url);
    Ok((url, token, plex.timeout))
}

pub async fn run_config(
    cmd: ConfigCommands,
    config_path: Option<PathBuf>,
    output: &Output,
) -> color_eyre::Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(config_path.as_deref(), full, output),
        ConfigCommands::Plex { token, server_url } => configure_plex(token, server_url, output),
    }
}

fn show_config(
    path_override: Option<&Path>,
    full: bool,
    output: &Output,
) -> color_eyre::Result<()> {
    let mut config = load_config(path_override)?;

    if !full {
        if let Some(plex) = config.plex.as_mut() {
            if !plex.token.is_empty() {
                plex.token = mask(&plex.token);
            }
        }
    }

    match output.format() {
        OutputFormat::Human => {
            let rendered = toml::to_string_pretty(&config).map_err(|e| eyre!("{e}"))?;
            output.println(rendered);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let value = serde_json::to_value(&config).map_err(|e| eyre!("{e}"))?;
            output.json(&value);
        }
    }
    Ok(())
}

fn configure_plex(
    token: Option<String>,
    server_url: Option<String>,
    output: &Output,
) -> color_eyre::Result<()> {
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Plex API token: ").map_err(|e| eyre!("{e}"))?,
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(eyre!("Token cannot be empty"));
    }

    let paths = PathManager::default();
    paths.ensure_directories().map_err(|e| eyre!("{e:#}"))?;

    let mut store = CredentialStore::new(paths.credentials_file());
    store.load().map_err(|e| eyre!("{e:#}"))?;
    store.set_plex_token(token.to_string());
    if let Some(url) = server_url {
        store.set_plex_server_url(url.trim_end_matches('/').to_string());
    }
    store.save().map_err(|e| eyre!("{e:#}"))?;

    output.success("Plex credentials saved");
    Ok(())
}

// Keep a short suffix visible so tokens stay distinguishable. Counted in
// chars, not bytes, so a multi-byte tail never splits.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("****{suffix}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_suffix_of_long_secrets() {
        assert_eq!(mask("abcdefghijkl"), "****ijkl");
        assert_eq!(mask("short"), "****");
    }

    #[test]
    fn test_mask_handles_multibyte_tails() {
        assert_eq!(mask("sécrets-ünïcodé"), "****codé");
        assert_eq!(mask("tökén"), "****");
    }
}
