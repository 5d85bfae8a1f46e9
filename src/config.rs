use crate::error::AppError;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PREFIX_SEPARATOR: &str = "| ";

#[derive(Debug, Clone)]
pub struct Config {
    pub player_data_path: PathBuf,
    pub matches_path: PathBuf,
    pub name_mappings_path: PathBuf,
    pub artifact_path: PathBuf,
    pub prefix_separator: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let player_data_path = path_var("PLAYER_DATA_PATH", "data/playerDataPoints.json");
        let matches_path = path_var("MATCHES_PATH", "data/matches.json");
        let name_mappings_path = path_var("NAME_MAPPINGS_PATH", "data/nameMappings.json");

        let artifact_path = match env::var("ARTIFACT_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => default_artifact_path()?,
        };

        let prefix_separator = env::var("NAME_PREFIX_SEPARATOR")
            .unwrap_or_else(|_| DEFAULT_PREFIX_SEPARATOR.to_string());
        if prefix_separator.trim().is_empty() {
            return Err(AppError::ConfigError(
                "NAME_PREFIX_SEPARATOR must contain a visible token".to_string(),
            ));
        }

        Ok(Config {
            player_data_path,
            matches_path,
            name_mappings_path,
            artifact_path,
            prefix_separator,
        })
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn default_artifact_path() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or_else(|| {
        AppError::ConfigError(
            "could not resolve a home directory; set ARTIFACT_PATH in .env".to_string(),
        )
    })?;
    Ok(home.join(".matchup_predict").join("model.json"))
}

/// Knobs for the logistic regression trainer.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub test_ratio: f64,
    pub seed: u64,
    /// Inverse L2 strength, as in `C` of a regularised logistic regression.
    pub inverse_regularization: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            test_ratio: 0.2,
            seed: 42,
            inverse_regularization: 1.0,
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..1.0).contains(&self.test_ratio) {
            return Err(AppError::ConfigError(format!(
                "test ratio must be in [0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.inverse_regularization <= 0.0 {
            return Err(AppError::ConfigError(format!(
                "regularisation strength C must be positive, got {}",
                self.inverse_regularization
            )));
        }
        if self.max_iterations == 0 {
            return Err(AppError::ConfigError(
                "max iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trainer_config_is_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, 42);
        assert!((config.test_ratio - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_out_of_range_test_ratio() {
        let config = TrainerConfig {
            test_ratio: 1.0,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn rejects_non_positive_regularization() {
        let config = TrainerConfig {
            inverse_regularization: 0.0,
            ..TrainerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
