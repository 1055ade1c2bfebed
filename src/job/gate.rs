//! Sub id collision detection over a job's products.

use std::collections::HashMap;

use crate::diagnostics;

use super::product::JobProduct;

/// Two products of one response that share a sub id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCollision {
    pub sub_id: u32,
    /// The later product, which lost the sub id.
    pub conflicting_file: String,
    /// The product that already held the sub id.
    pub existing_file: String,
}

impl std::fmt::Display for ProductCollision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SubId ({}) conflicts with file1 ({}) and file2 ({})",
            self.sub_id, self.conflicting_file, self.existing_file
        )
    }
}

/// Every collision, each naming the product that repeats a sub id and the
/// first product that held it.
pub fn find_collisions(products: &[JobProduct]) -> Vec<ProductCollision> {
    let mut first_by_sub_id: HashMap<u32, &str> = HashMap::with_capacity(products.len());
    let mut collisions = Vec::new();

    for product in products {
        match first_by_sub_id.get(&product.product_sub_id) {
            Some(first) => collisions.push(ProductCollision {
                sub_id: product.product_sub_id,
                conflicting_file: product.product_file_name.clone(),
                existing_file: (*first).to_string(),
            }),
            None => {
                first_by_sub_id.insert(product.product_sub_id, product.product_file_name.as_str());
            }
        }
    }

    collisions
}

/// Report every collision on the Error channel; `true` when there are none.
pub fn report_collisions(products: &[JobProduct]) -> bool {
    let collisions = find_collisions(products);
    for collision in &collisions {
        diagnostics::error(collision.to_string());
    }
    collisions.is_empty()
}
