use crate::domain::Address;
use crate::engine::ZeroDenominatorPolicy;
use std::collections::HashMap;
use thiserror::Error;

/// Canonical wrapped native token (mainnet WETH).
pub const DEFAULT_WRAPPED_NATIVE: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

/// Seaport fee recipients recognised out of the box.
pub const DEFAULT_MARKETPLACE_FEE_RECIPIENTS: [&str; 3] = [
    "0x5b3256965e7c3cf26e11fcaf296dfc8807c01073",
    "0x8de9c5a032463c561423387a9648c5c7bcc5bc90",
    "0x0000a26b00c1f0df003000390027140000faa719",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rpc_url: String,
    pub wrapped_native_contract: Address,
    pub marketplace_fee_recipients: Vec<Address>,
    /// ERC-20 contracts besides the wrapped native token whose `transferFrom` moves balances.
    pub fungible_token_contracts: Vec<Address>,
    pub missing_royalty_threshold_bps: u64,
    pub zero_denominator_policy: ZeroDenominatorPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let wrapped_native_contract = parse_address(
            "WRAPPED_NATIVE_CONTRACT",
            env_map
                .get("WRAPPED_NATIVE_CONTRACT")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_WRAPPED_NATIVE),
        )?;

        let missing_royalty_threshold_bps = env_map
            .get("MISSING_ROYALTY_THRESHOLD_BPS")
            .map(|s| s.as_str())
            .unwrap_or("1000")
            .parse::<u64>()
            .ok()
            .filter(|bps| *bps <= 10_000)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MISSING_ROYALTY_THRESHOLD_BPS".to_string(),
                    "must be an integer between 0 and 10000".to_string(),
                )
            })?;

        let zero_denominator_policy = match env_map
            .get("ZERO_DENOMINATOR_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("sale-price")
        {
            "sale-price" => ZeroDenominatorPolicy::SalePrice,
            "fail" => ZeroDenominatorPolicy::Fail,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ZERO_DENOMINATOR_POLICY".to_string(),
                    format!("must be sale-price or fail, got {}", other),
                ))
            }
        };

        let marketplace_fee_recipients = parse_fee_recipients_from_map(&env_map)?;

        let fungible_token_contracts = env_map
            .get("FUNGIBLE_TOKEN_CONTRACTS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| parse_address("FUNGIBLE_TOKEN_CONTRACTS", s))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Config {
            port,
            database_path,
            rpc_url,
            wrapped_native_contract,
            marketplace_fee_recipients,
            fungible_token_contracts,
            missing_royalty_threshold_bps,
            zero_denominator_policy,
        })
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    value
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_fee_recipients_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<Address>, ConfigError> {
    let raw: Vec<String> = if let Some(list) = env_map.get("MARKETPLACE_FEE_RECIPIENTS") {
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else if let Some(file_path) = env_map.get("MARKETPLACE_FEE_RECIPIENTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "MARKETPLACE_FEE_RECIPIENTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
            .collect()
    } else {
        DEFAULT_MARKETPLACE_FEE_RECIPIENTS
            .iter()
            .map(|s| s.to_string())
            .collect()
    };

    raw.iter()
        .map(|s| parse_address("MARKETPLACE_FEE_RECIPIENTS", s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("RPC_URL".to_string(), "http://localhost:8545".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.wrapped_native_contract.to_string(), DEFAULT_WRAPPED_NATIVE);
        assert_eq!(config.marketplace_fee_recipients.len(), 3);
        assert_eq!(config.missing_royalty_threshold_bps, 1000);
        assert_eq!(config.zero_denominator_policy, ZeroDenominatorPolicy::SalePrice);
        assert!(config.fungible_token_contracts.is_empty());
    }

    #[test]
    fn test_fungible_token_contracts() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "FUNGIBLE_TOKEN_CONTRACTS".to_string(),
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48, ".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.fungible_token_contracts,
            vec!["0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse::<Address>().unwrap()]
        );
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_rpc_url() {
        let mut env_map = setup_required_env();
        env_map.remove("RPC_URL");
        match Config::from_env_map(env_map) {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "RPC_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_fee_recipients_from_list() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "MARKETPLACE_FEE_RECIPIENTS".to_string(),
            " 0x1111111111111111111111111111111111111111 ,,0x2222222222222222222222222222222222222222".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.marketplace_fee_recipients.len(), 2);
    }

    #[test]
    fn test_fee_recipients_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# blur").unwrap();
        writeln!(file, "0x39da41747a83aee658334415666f3ef92dd0d541").unwrap();
        writeln!(file).unwrap();

        let mut env_map = setup_required_env();
        env_map.insert(
            "MARKETPLACE_FEE_RECIPIENTS_FILE".to_string(),
            file.path().to_string_lossy().to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.marketplace_fee_recipients,
            vec!["0x39da41747a83aee658334415666f3ef92dd0d541".parse::<Address>().unwrap()]
        );
    }

    #[test]
    fn test_invalid_fee_recipient() {
        let mut env_map = setup_required_env();
        env_map.insert("MARKETPLACE_FEE_RECIPIENTS".to_string(), "0xdead".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "MARKETPLACE_FEE_RECIPIENTS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_threshold() {
        let mut env_map = setup_required_env();
        env_map.insert("MISSING_ROYALTY_THRESHOLD_BPS".to_string(), "20000".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "MISSING_ROYALTY_THRESHOLD_BPS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_denominator_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("ZERO_DENOMINATOR_POLICY".to_string(), "fail".to_string());
        let config = Config::from_env_map(env_map.clone()).unwrap();
        assert_eq!(config.zero_denominator_policy, ZeroDenominatorPolicy::Fail);

        env_map.insert("ZERO_DENOMINATOR_POLICY".to_string(), "nan".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
