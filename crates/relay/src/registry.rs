//! Relayer selection and caching

use crate::relayer::{Relayer, RelayerFactory};
use alloy::signers::Signer;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Resolves and caches, per chain, the first adapter that supports it.
///
/// One registry instance exclusively owns its chain-to-adapter cache;
/// the cache is created lazily, lives for the registry's lifetime, and
/// is never invalidated, since a chain's support does not change at
/// runtime.
pub struct RelayerRegistry<S>
where
    S: Signer + Send + Sync + 'static,
{
    factories: Vec<Box<dyn RelayerFactory<S>>>,
    cache: Mutex<HashMap<u64, Arc<dyn Relayer>>>,
}

impl<S> RelayerRegistry<S>
where
    S: Signer + Send + Sync + 'static,
{
    /// Create a registry over an ordered list of adapter factories
    pub fn new(factories: Vec<Box<dyn RelayerFactory<S>>>) -> Self {
        Self {
            factories,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of configured factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factories are configured
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Resolve an adapter for a chain.
    ///
    /// A cached adapter is returned immediately without re-probing.
    /// Otherwise factories are materialized in list order and the first
    /// adapter reporting chain support wins; a candidate that fails to
    /// build or to answer the capability check is skipped, never aborting
    /// the probe of later candidates. `None` means no relay route is
    /// available for the chain, which is not an error.
    ///
    /// The cache lock is never held across an await: concurrent first
    /// resolutions for one chain may probe redundantly, and the cache
    /// converges to whichever write lands last.
    pub async fn resolve(&self, chain_id: u64, signer: &Arc<S>) -> Option<Arc<dyn Relayer>> {
        if let Some(relayer) = self.cached(chain_id) {
            return Some(relayer);
        }

        for factory in &self.factories {
            let relayer = match factory.build(chain_id, Arc::clone(signer)).await {
                Ok(relayer) => relayer,
                Err(error) => {
                    tracing::warn!(chain_id, %error, "relayer construction failed, trying next candidate");
                    continue;
                }
            };

            match relayer.supports_chain(chain_id).await {
                Ok(true) => {
                    tracing::info!(chain_id, relayer = relayer.name(), "resolved relayer for chain");
                    self.cache
                        .lock()
                        .expect("relayer cache lock poisoned")
                        .insert(chain_id, Arc::clone(&relayer));
                    return Some(relayer);
                }
                Ok(false) => {
                    tracing::debug!(chain_id, relayer = relayer.name(), "chain not supported");
                }
                Err(error) => {
                    tracing::warn!(chain_id, relayer = relayer.name(), %error, "capability check failed, trying next candidate");
                }
            }
        }

        tracing::debug!(chain_id, "no relay route available");
        None
    }

    fn cached(&self, chain_id: u64) -> Option<Arc<dyn Relayer>> {
        self.cache
            .lock()
            .expect("relayer cache lock poisoned")
            .get(&chain_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::U256, rpc::types::TransactionRequest, signers::local::PrivateKeySigner,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use types::{RelayError, RelayResponse, RelayStatus, Result};

    struct StubRelayer {
        name: &'static str,
        supported: &'static [u64],
        probes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Relayer for StubRelayer {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(&self, _tx: &TransactionRequest) -> Result<RelayResponse> {
            Ok(RelayResponse::new("stub-task"))
        }

        async fn lookup(&self, _task_id: &str) -> Result<RelayStatus> {
            Ok(RelayStatus::pending())
        }

        async fn supports_chain(&self, chain_id: u64) -> Result<bool> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            Ok(self.supported.contains(&chain_id))
        }

        async fn get_balance(&self) -> Result<U256> {
            Err(RelayError::Unsupported {
                relayer: self.name.to_string(),
                operation: "get_balance",
            })
        }

        async fn fund(&self, _amount: U256) -> Result<()> {
            Err(RelayError::Unsupported {
                relayer: self.name.to_string(),
                operation: "fund",
            })
        }
    }

    struct StubFactory {
        name: &'static str,
        supported: &'static [u64],
        probes: Arc<AtomicUsize>,
        fail_build: bool,
    }

    impl StubFactory {
        fn new(name: &'static str, supported: &'static [u64]) -> (Self, Arc<AtomicUsize>) {
            let probes = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    supported,
                    probes: Arc::clone(&probes),
                    fail_build: false,
                },
                probes,
            )
        }
    }

    #[async_trait]
    impl RelayerFactory<PrivateKeySigner> for StubFactory {
        async fn build(
            &self,
            _chain_id: u64,
            _signer: Arc<PrivateKeySigner>,
        ) -> Result<Arc<dyn Relayer>> {
            if self.fail_build {
                return Err(RelayError::Config("broken factory".to_string()));
            }
            Ok(Arc::new(StubRelayer {
                name: self.name,
                supported: self.supported,
                probes: Arc::clone(&self.probes),
            }))
        }
    }

    fn signer() -> Arc<PrivateKeySigner> {
        Arc::new(PrivateKeySigner::random())
    }

    #[tokio::test]
    async fn second_resolve_returns_the_cached_instance() {
        let (factory, probes) = StubFactory::new("a", &[10]);
        let registry = RelayerRegistry::new(vec![
            Box::new(factory) as Box<dyn RelayerFactory<PrivateKeySigner>>
        ]);
        let signer = signer();

        let first = registry.resolve(10, &signer).await.unwrap();
        let second = registry.resolve(10, &signer).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        // No re-probing for a cached chain
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn probing_follows_list_order_and_skips_unsupporting_adapters() {
        let (a, a_probes) = StubFactory::new("a", &[1]);
        let (b, b_probes) = StubFactory::new("b", &[10]);
        let registry = RelayerRegistry::new(vec![
            Box::new(a) as Box<dyn RelayerFactory<PrivateKeySigner>>,
            Box::new(b),
        ]);
        let signer = signer();

        let resolved = registry.resolve(10, &signer).await.unwrap();
        assert_eq!(resolved.name(), "b");
        assert_eq!(a_probes.load(Ordering::SeqCst), 1);
        assert_eq!(b_probes.load(Ordering::SeqCst), 1);

        // The first factory wins for a chain it supports
        let resolved = registry.resolve(1, &signer).await.unwrap();
        assert_eq!(resolved.name(), "a");
        assert_eq!(b_probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_failing_factory_does_not_abort_probing() {
        let (mut broken, _) = StubFactory::new("broken", &[10]);
        broken.fail_build = true;
        let (b, _) = StubFactory::new("b", &[10]);
        let registry =
            RelayerRegistry::new(vec![
            Box::new(broken) as Box<dyn RelayerFactory<PrivateKeySigner>>,
            Box::new(b),
        ]);

        let resolved = registry.resolve(10, &signer()).await.unwrap();
        assert_eq!(resolved.name(), "b");
    }

    #[tokio::test]
    async fn no_supporting_adapter_resolves_to_none() {
        let (a, _) = StubFactory::new("a", &[1]);
        let registry = RelayerRegistry::new(vec![Box::new(a) as Box<dyn RelayerFactory<PrivateKeySigner>>]);

        assert!(registry.resolve(10, &signer()).await.is_none());
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
