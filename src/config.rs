//! Multicall configuration.
use crate::{
    constants::DEFAULT_REQUEST_TIMEOUT, signers::DynSigner, transport::http_provider,
};
use alloy::{primitives::Address, providers::DynProvider};
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};
use url::Url;

/// Multicall configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticallConfig {
    /// The RPC endpoint of the chain.
    pub endpoint: Url,
    /// Address of the batching contract.
    ///
    /// Results are composed from direct requests if there is no code at this address.
    /// Low addresses may be written unquoted, even though YAML reads them as integers.
    #[serde(with = "crate::serde::address")]
    pub contract: Address,
    /// Timeout for a single RPC request.
    #[serde(with = "crate::serde::duration", default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Secrets.
    #[serde(skip_serializing, default)]
    pub secrets: SecretsConfig,
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl MulticallConfig {
    /// Creates a new [`MulticallConfig`] with the default request timeout and no signer.
    pub fn new(endpoint: Url, contract: Address) -> Self {
        Self {
            endpoint,
            contract,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            secrets: SecretsConfig::default(),
        }
    }

    /// Sets the RPC endpoint.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the address of the batching contract.
    pub fn with_contract(mut self, contract: Address) -> Self {
        self.contract = contract;
        self
    }

    /// Sets the timeout for a single RPC request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the private key mutating batches are signed with.
    pub fn with_signer_key(mut self, key: impl Into<String>) -> Self {
        self.secrets.signer_key = Some(key.into());
        self
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Builds a provider for the configured endpoint, bounded by the request timeout.
    pub fn provider(&self) -> DynProvider {
        http_provider(self.endpoint.clone(), self.request_timeout)
    }

    /// Loads the configured signer, if any.
    pub fn signer(&self) -> eyre::Result<Option<DynSigner>> {
        self.secrets
            .signer_key
            .as_deref()
            .map(DynSigner::from_signing_key)
            .transpose()
            .wrap_err("invalid signer key")
    }
}

/// Secrets.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsConfig {
    /// Hex encoded private key to sign transactions with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_key: Option<String>,
}

impl fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("signer_key", &self.signer_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const CONFIG: &str = r#"
endpoint: http://localhost:8545/
contract: 0xcA11bde05977b3631167028862bE2a173976CA11
requestTimeout: 5
secrets:
  signerKey: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#;

    #[test]
    fn parses_yaml() {
        let config = serde_yaml::from_str::<MulticallConfig>(CONFIG).unwrap();
        assert_eq!(config.endpoint.as_str(), "http://localhost:8545/");
        assert_eq!(config.contract, address!("cA11bde05977b3631167028862bE2a173976CA11"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let signer = config.signer().unwrap().unwrap();
        assert_eq!(signer.address(), address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(!format!("{config:?}").contains("ac0974"));
    }

    #[test]
    fn does_not_serialize_secrets() {
        let config = serde_yaml::from_str::<MulticallConfig>(CONFIG).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("signerKey"));

        let from_yaml = serde_yaml::from_str::<MulticallConfig>(&yaml).unwrap();
        assert_eq!(from_yaml.secrets, SecretsConfig::default());
        assert_eq!(from_yaml.with_signer_key("0x01").secrets.signer_key.as_deref(), Some("0x01"));
    }

    #[test]
    fn defaults_request_timeout() {
        let config = serde_yaml::from_str::<MulticallConfig>(
            "endpoint: http://localhost:8545\ncontract: 0x0000000000000000000000000000000000000001\n",
        )
        .unwrap();
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.contract, Address::with_last_byte(1));
        assert!(config.signer().unwrap().is_none());
    }

    #[test]
    fn roundtrips_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multicall.yaml");

        let config = MulticallConfig::new(
            "http://localhost:8545".parse().unwrap(),
            Address::repeat_byte(1),
        )
        .with_request_timeout(Duration::from_secs(3));
        config.save_to_file(&path).unwrap();

        assert_eq!(MulticallConfig::load_from_file(&path).unwrap(), config);
        assert!(MulticallConfig::load_from_file(dir.path().join("missing.yaml")).is_err());
    }
}
