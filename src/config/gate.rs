use std::env;

/// Deployment mode. Controls which operational endpoints (docs, health
/// check, root) are reachable without a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployMode {
    Development,
    Production,
}

/// Configuration for the request gate's public-path set.
///
/// Built once at startup and handed to the gate's path classifier; the
/// per-request logic never reads the environment.
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub mode: DeployMode,
    /// Extra exact-match paths to treat as public, beyond the built-in set.
    pub extra_public_paths: Vec<String>,
}

impl GateConfig {
    pub fn from_env() -> Self {
        let mode = match env::var("APP_ENV").as_deref() {
            Ok("production") => DeployMode::Production,
            _ => DeployMode::Development,
        };

        let extra_public_paths = env::var("EXTRA_PUBLIC_PATHS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            mode,
            extra_public_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gate_config_shape() {
        let config = GateConfig {
            mode: DeployMode::Development,
            extra_public_paths: vec!["/metrics".to_string()],
        };
        assert_eq!(config.mode, DeployMode::Development);
        assert_eq!(config.extra_public_paths.len(), 1);
    }
}
