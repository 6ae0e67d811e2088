use crate::non_empty;

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_origins = non_empty(lookup, "ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup;

    #[test]
    fn test_origins_are_trimmed() {
        let config = CorsConfig::from_lookup(&lookup(&[(
            "ALLOWED_ORIGINS",
            "https://app.contacthub.io , ,https://admin.contacthub.io",
        )]));
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.contacthub.io", "https://admin.contacthub.io"]
        );
    }

    #[test]
    fn test_default_origins() {
        let config = CorsConfig::from_lookup(&lookup(&[]));
        assert_eq!(config.allowed_origins.len(), 2);
    }
}
