use crate::{error::Result, models::AssetRef};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Source of the reference assets that make up a matrix's columns.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Returns the assets found, in the order of `ids`. Unknown ids are
    /// skipped rather than reported.
    async fn get_assets_by_ids(&self, ids: &[String]) -> Result<Vec<AssetRef>>;
}

#[derive(Debug, Default)]
pub struct InMemoryAssetRepository {
    assets: RwLock<HashMap<String, AssetRef>>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = AssetRef>) -> Self {
        let repo = Self::new();
        for asset in assets {
            repo.insert(asset);
        }
        repo
    }

    pub fn insert(&self, asset: AssetRef) {
        if let Ok(mut assets) = self.assets.write() {
            assets.insert(asset.id.clone(), asset);
        }
    }

    pub fn len(&self) -> usize {
        self.assets.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn get_assets_by_ids(&self, ids: &[String]) -> Result<Vec<AssetRef>> {
        let assets = match self.assets.read() {
            Ok(assets) => assets,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(ids.iter().filter_map(|id| assets.get(id).cloned()).collect())
    }
}
