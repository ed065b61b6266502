//! Type-erased transaction signer.
use alloy::{
    network::{EthereumWallet, FullSigner, TxSigner},
    primitives::{Address, Signature},
    signers::local::PrivateKeySigner,
};
use std::{fmt, ops::Deref, str::FromStr, sync::Arc};

/// Abstraction over a transaction signer.
#[derive(Clone)]
pub struct DynSigner(pub Arc<dyn FullSigner<Signature> + Send + Sync>);

impl fmt::Debug for DynSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynSigner").field(&self.address()).finish()
    }
}

impl DynSigner {
    /// Load a hex encoded private key.
    pub fn from_signing_key(key: &str) -> eyre::Result<Self> {
        Ok(Self(Arc::new(PrivateKeySigner::from_str(key)?)))
    }

    /// Returns the signer's Ethereum Address.
    pub fn address(&self) -> Address {
        TxSigner::address(&self.0)
    }

    /// Returns an [`EthereumWallet`] signing with this signer.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::new(self.0.clone())
    }
}

impl From<PrivateKeySigner> for DynSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self(Arc::new(signer))
    }
}

impl Deref for DynSigner {
    type Target = dyn FullSigner<Signature> + Send + Sync;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
