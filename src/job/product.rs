//! Products emitted by ProcessJob.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetId, AssetType};
use crate::legacy::{infer_asset_type, infer_sub_id};

use super::dependency::normalize_separators;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ProductOutputFlags: u8 {
        /// Final product persisted to the cache.
        const PRODUCT_ASSET = 1 << 0;
        /// Fed back into the pipeline as a new source.
        const INTERMEDIATE_ASSET = 1 << 1;
    }
}

impl Default for ProductOutputFlags {
    fn default() -> Self {
        ProductOutputFlags::PRODUCT_ASSET
    }
}

/// A product-to-product dependency by asset id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductDependency {
    pub dependency_id: AssetId,
    /// Opaque load-behaviour bits owned by the consumer.
    #[serde(default)]
    pub flags: u64,
}

impl ProductDependency {
    pub fn new(dependency_id: AssetId, flags: u64) -> Self {
        Self { dependency_id, flags }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProductPathDependencyType {
    #[default]
    ProductFile,
    SourceFile,
}

/// A dependency on a file that could not be resolved to an asset id yet.
///
/// Paths compare equal regardless of separator style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPathDependency {
    pub path: String,
    #[serde(default)]
    pub kind: ProductPathDependencyType,
}

impl ProductPathDependency {
    pub fn new(path: impl Into<String>, kind: ProductPathDependencyType) -> Self {
        Self { path: path.into(), kind }
    }
}

impl PartialEq for ProductPathDependency {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && normalize_separators(&self.path) == normalize_separators(&other.path)
    }
}

impl Eq for ProductPathDependency {}

impl Hash for ProductPathDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        normalize_separators(&self.path).hash(state);
        self.kind.hash(state);
    }
}

/// One output of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProduct {
    pub product_file_name: String,
    pub product_asset_type: AssetType,
    pub product_sub_id: u32,
    /// Earlier sub ids that named this same product.
    #[serde(default)]
    pub legacy_sub_ids: Vec<u32>,
    #[serde(default)]
    pub dependencies: Vec<ProductDependency>,
    #[serde(default)]
    pub path_dependencies: HashSet<ProductPathDependency>,
    /// The builder has reported every dependency this product has.
    #[serde(default)]
    pub dependencies_handled: bool,
    #[serde(default)]
    pub output_flags: ProductOutputFlags,
    #[serde(default)]
    pub output_path_override: Option<String>,
}

impl JobProduct {
    /// A product whose null type or zero sub id is inferred from its file name.
    pub fn new(product_file_name: impl Into<String>, asset_type: AssetType, sub_id: u32) -> Self {
        let product_file_name = product_file_name.into();
        let asset_type =
            if asset_type.is_null() { infer_asset_type(&product_file_name) } else { asset_type };
        let sub_id =
            if sub_id == 0 { infer_sub_id(asset_type, &product_file_name) } else { sub_id };
        Self::declared(product_file_name, asset_type, sub_id)
    }

    /// A product taken exactly as declared.
    pub fn declared(product_file_name: impl Into<String>, asset_type: AssetType, sub_id: u32) -> Self {
        Self {
            product_file_name: product_file_name.into(),
            product_asset_type: asset_type,
            product_sub_id: sub_id,
            legacy_sub_ids: Vec::new(),
            dependencies: Vec::new(),
            path_dependencies: HashSet::new(),
            dependencies_handled: false,
            output_flags: ProductOutputFlags::default(),
            output_path_override: None,
        }
    }

    pub fn is_intermediate(&self) -> bool {
        self.output_flags.contains(ProductOutputFlags::INTERMEDIATE_ASSET)
    }
}
