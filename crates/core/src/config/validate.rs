use super::{types::Config, ConfigError};

/// Largest page IGDB will return for a single query.
const IGDB_MAX_LIMIT: u32 = 500;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - IGDB credentials are non-empty when the section is present
/// - Import limits and per-game tag caps are within what IGDB accepts
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if let Some(igdb) = &config.igdb {
        if igdb.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "igdb.client_id cannot be empty".to_string(),
            ));
        }
        if igdb.access_token.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "igdb.access_token cannot be empty".to_string(),
            ));
        }
    }

    let import = &config.import;
    if import.game_limit == 0 || import.game_limit > IGDB_MAX_LIMIT {
        return Err(ConfigError::ValidationError(format!(
            "import.game_limit must be between 1 and {}",
            IGDB_MAX_LIMIT
        )));
    }
    for (name, cap) in [
        ("max_genres_per_game", import.max_genres_per_game),
        ("max_platforms_per_game", import.max_platforms_per_game),
    ] {
        if cap == 0 || cap > IGDB_MAX_LIMIT as usize {
            return Err(ConfigError::ValidationError(format!(
                "import.{} must be between 1 and {}",
                name, IGDB_MAX_LIMIT
            )));
        }
    }
    if import.genre_ids.len() > IGDB_MAX_LIMIT as usize
        || import.platform_ids.len() > IGDB_MAX_LIMIT as usize
    {
        return Err(ConfigError::ValidationError(format!(
            "import id lists cannot exceed {} entries",
            IGDB_MAX_LIMIT
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IgdbConfig, ServerConfig};

    fn igdb(client_id: &str, access_token: &str) -> IgdbConfig {
        IgdbConfig {
            client_id: client_id.to_string(),
            access_token: access_token.to_string(),
            base_url: "https://api.igdb.com/v4".to_string(),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_igdb_token_fails() {
        let config = Config {
            igdb: Some(igdb("client", "  ")),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_igdb_ok() {
        let config = Config {
            igdb: Some(igdb("client", "token")),
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_game_limit_bounds() {
        let mut config = Config::default();
        config.import.game_limit = 0;
        assert!(validate_config(&config).is_err());

        config.import.game_limit = 501;
        assert!(validate_config(&config).is_err());

        config.import.game_limit = 500;
        assert!(validate_config(&config).is_ok());

        config.import.max_genres_per_game = 0;
        assert!(validate_config(&config).is_err());
        config.import.max_genres_per_game = 501;
        assert!(validate_config(&config).is_err());
        config.import.max_genres_per_game = 3;

        config.import.max_platforms_per_game = 0;
        assert!(validate_config(&config).is_err());
        config.import.max_platforms_per_game = 501;
        assert!(validate_config(&config).is_err());
        config.import.max_platforms_per_game = 500;
        assert!(validate_config(&config).is_ok());
    }
}
