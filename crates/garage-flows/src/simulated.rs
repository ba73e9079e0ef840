//! In-memory backend with artificial latency and failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use garage_core::{CommitRequest, StepError};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::backend::{
    CollectionReceipt, DecodedVin, FactorySpecs, GarageBackend, MintReceipt, UpgradeReceipt,
};
use crate::sponsorship::SponsorshipStage;
use crate::upgrade::UpgradeType;

/// VIN returned by the simulated photo decoder.
pub const SAMPLE_VIN: &str = "WP0AF2A95RS123456";

/// Configuration for the simulated backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedBackendConfig {
    /// Delay applied to every call, in milliseconds.
    pub latency_ms: u64,

    /// Collection names that are already taken.
    pub taken_names: Vec<String>,
}

impl Default for SimulatedBackendConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1_500,
            taken_names: vec!["Apex Racing".to_string(), "Midnight Club".to_string()],
        }
    }
}

/// A [`GarageBackend`] kept entirely in memory.
///
/// Side-effecting calls are deduplicated on the request's idempotency key.
/// Injected failures are reported as commit errors and never replaced with
/// fabricated results.
pub struct SimulatedBackend {
    latency: Duration,
    failures: AtomicU32,
    next_token: AtomicU64,
    taken_names: RwLock<HashSet<String>>,
    registered_vins: RwLock<HashSet<String>>,
    receipts: RwLock<HashMap<String, serde_json::Value>>,
}

impl SimulatedBackend {
    /// Create a backend from its configuration.
    pub fn new(config: SimulatedBackendConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            failures: AtomicU32::new(0),
            next_token: AtomicU64::new(1),
            taken_names: RwLock::new(
                config
                    .taken_names
                    .iter()
                    .map(|name| normalize(name))
                    .collect(),
            ),
            registered_vins: RwLock::new(HashSet::new()),
            receipts: RwLock::new(HashMap::new()),
        }
    }

    /// A backend with no latency.
    pub fn instant() -> Self {
        Self::new(SimulatedBackendConfig {
            latency_ms: 0,
            ..Default::default()
        })
    }

    /// Make the next `count` calls fail.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Mark a VIN as already registered.
    pub async fn register_vin(&self, vin: &str) {
        self.registered_vins.write().await.insert(vin.to_string());
    }

    /// Returns true if the VIN has been registered.
    pub async fn is_registered(&self, vin: &str) -> bool {
        self.registered_vins.read().await.contains(vin)
    }

    /// Number of distinct side-effecting submissions performed.
    pub async fn submissions(&self) -> usize {
        self.receipts.read().await.len()
    }

    async fn call(&self, operation: &str) -> Result<(), StepError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!(operation, "injected failure");
            return Err(StepError::commit(format!(
                "{} failed: network request was rejected",
                operation
            )));
        }
        Ok(())
    }

    /// Return the receipt stored under the request's key, or create and store one.
    async fn once<T, F>(&self, request: &CommitRequest, create: F) -> Result<T, StepError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let mut receipts = self.receipts.write().await;
        if let Some(existing) = receipts.get(&request.idempotency_key) {
            info!(key = %request.idempotency_key, "replaying stored receipt");
            return serde_json::from_value(existing.clone())
                .map_err(|e| StepError::commit(format!("Corrupt stored receipt: {}", e)));
        }

        let receipt = create();
        let stored = serde_json::to_value(&receipt)
            .map_err(|e| StepError::commit(format!("Unserializable receipt: {}", e)))?;
        receipts.insert(request.idempotency_key.clone(), stored);
        Ok(receipt)
    }

    async fn has_receipt(&self, request: &CommitRequest) -> bool {
        self.receipts
            .read()
            .await
            .contains_key(&request.idempotency_key)
    }

    fn next_token_id(&self) -> String {
        self.next_token.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(SimulatedBackendConfig::default())
    }
}

#[async_trait]
impl GarageBackend for SimulatedBackend {
    async fn decode_vin(
        &self,
        _request: &CommitRequest,
        image: &str,
    ) -> Result<DecodedVin, StepError> {
        self.call("VIN decode").await?;
        debug!(image_len = image.len(), "decoding VIN photo");

        Ok(DecodedVin {
            vin: SAMPLE_VIN.to_string(),
            factory_specs: FactorySpecs {
                make: "Porsche".to_string(),
                model: "911 GT3 RS".to_string(),
                year: 2024,
                engine: "4.0L naturally aspirated flat-six".to_string(),
                horsepower: 518,
                transmission: "7-speed PDK".to_string(),
                drivetrain: "RWD".to_string(),
            },
        })
    }

    async fn check_vehicle_unregistered(&self, vin: &str) -> Result<(), StepError> {
        self.call("Registration lookup").await?;
        if self.is_registered(vin).await {
            return Err(StepError::conflict(
                "vin",
                "This vehicle is already registered",
            ));
        }
        Ok(())
    }

    async fn mint_vehicle(
        &self,
        request: &CommitRequest,
        vin: &str,
        owner: &str,
    ) -> Result<MintReceipt, StepError> {
        self.call("Vehicle mint").await?;
        if !self.has_receipt(request).await && self.is_registered(vin).await {
            return Err(StepError::conflict(
                "vin",
                "This vehicle is already registered",
            ));
        }
        let receipt = self
            .once(request, || MintReceipt {
                token_id: self.next_token_id(),
                tx_hash: random_hex(32),
            })
            .await?;
        self.register_vin(vin).await;

        info!(vin, owner, token_id = %receipt.token_id, "vehicle minted");
        Ok(receipt)
    }

    async fn record_upgrade(
        &self,
        request: &CommitRequest,
        token_id: &str,
        upgrade: UpgradeType,
    ) -> Result<UpgradeReceipt, StepError> {
        self.call("Upgrade").await?;
        let receipt = self
            .once(request, || UpgradeReceipt {
                upgrade_id: format!("upg_{}", random_hex(6).trim_start_matches("0x")),
                tx_hash: random_hex(32),
                value_increase: upgrade.estimated_value_increase(),
            })
            .await?;

        info!(token_id, upgrade = ?upgrade, "upgrade recorded");
        Ok(receipt)
    }

    async fn check_collection_name(&self, name: &str) -> Result<(), StepError> {
        self.call("Name lookup").await?;
        if self.taken_names.read().await.contains(&normalize(name)) {
            return Err(StepError::conflict(
                "collectionName",
                format!("A collection named '{}' already exists", name.trim()),
            ));
        }
        Ok(())
    }

    async fn create_collection(
        &self,
        request: &CommitRequest,
        name: &str,
        symbol: &str,
    ) -> Result<CollectionReceipt, StepError> {
        self.call("Collection deployment").await?;
        let taken = self.taken_names.read().await.contains(&normalize(name));
        if taken && !self.has_receipt(request).await {
            return Err(StepError::conflict(
                "collectionName",
                format!("A collection named '{}' already exists", name.trim()),
            ));
        }
        let receipt = self
            .once(request, || CollectionReceipt {
                collection_address: random_hex(20),
                tx_hash: random_hex(32),
            })
            .await?;
        self.taken_names.write().await.insert(normalize(name));

        info!(name, symbol, address = %receipt.collection_address, "collection created");
        Ok(receipt)
    }

    async fn mint_sponsorship(
        &self,
        request: &CommitRequest,
        stage: &SponsorshipStage,
        wallet: &str,
    ) -> Result<MintReceipt, StepError> {
        self.call("Sponsorship mint").await?;
        let receipt = self
            .once(request, || MintReceipt {
                token_id: self.next_token_id(),
                tx_hash: random_hex(32),
            })
            .await?;

        info!(stage = %stage.name, wallet, token_id = %receipt.token_id, "sponsorship minted");
        Ok(receipt)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `0x`-prefixed hex string of `bytes` random bytes.
fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..bytes)
        .map(|_| format!("{:02x}", rng.gen::<u8>()))
        .collect();
    format!("0x{}", digits)
}
