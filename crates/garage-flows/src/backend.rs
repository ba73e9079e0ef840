//! Backend trait used by the flows' commits, and the records it returns.

use async_trait::async_trait;
use garage_core::{CommitRequest, StepError};
use serde::{Deserialize, Serialize};

use crate::sponsorship::SponsorshipStage;
use crate::upgrade::UpgradeType;

/// Factory specification decoded from a VIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorySpecs {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub engine: String,
    pub horsepower: u32,
    pub transmission: String,
    pub drivetrain: String,
}

/// Result of decoding a VIN photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVin {
    pub vin: String,
    pub factory_specs: FactorySpecs,
}

/// Result of a mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub token_id: String,
    pub tx_hash: String,
}

/// Result of recording an upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeReceipt {
    pub upgrade_id: String,
    pub tx_hash: String,
    /// Estimated value added, in USD.
    pub value_increase: u64,
}

/// Result of creating a sponsorship collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReceipt {
    pub collection_address: String,
    pub tx_hash: String,
}

/// The endpoints and wallet calls behind the flows.
///
/// Side-effecting calls receive the [`CommitRequest`] so they can deduplicate
/// on its idempotency key: a retry with the same key must return the original
/// result instead of submitting again.
#[async_trait]
pub trait GarageBackend: Send + Sync {
    /// Read the VIN off a photo and look up its factory specification.
    async fn decode_vin(&self, request: &CommitRequest, image: &str)
        -> Result<DecodedVin, StepError>;

    /// Fail with a conflict on `vin` if the vehicle is already registered.
    async fn check_vehicle_unregistered(&self, vin: &str) -> Result<(), StepError>;

    /// Mint the vehicle NFT.
    async fn mint_vehicle(
        &self,
        request: &CommitRequest,
        vin: &str,
        owner: &str,
    ) -> Result<MintReceipt, StepError>;

    /// Record an upgrade against a minted vehicle.
    async fn record_upgrade(
        &self,
        request: &CommitRequest,
        token_id: &str,
        upgrade: UpgradeType,
    ) -> Result<UpgradeReceipt, StepError>;

    /// Fail with a conflict on `collectionName` if the name is taken.
    async fn check_collection_name(&self, name: &str) -> Result<(), StepError>;

    /// Deploy a sponsorship collection.
    async fn create_collection(
        &self,
        request: &CommitRequest,
        name: &str,
        symbol: &str,
    ) -> Result<CollectionReceipt, StepError>;

    /// Mint a sponsorship slot of `stage` to `wallet`.
    async fn mint_sponsorship(
        &self,
        request: &CommitRequest,
        stage: &SponsorshipStage,
        wallet: &str,
    ) -> Result<MintReceipt, StepError>;
}
