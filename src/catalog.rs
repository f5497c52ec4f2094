// src/catalog.rs
use crate::errors::MockitError;
use crate::models::{Placement, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered, immutable product catalog. Declared order is the generation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

fn placement(id: &str, name: &str, description: &str) -> Placement {
    Placement {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn product(id: &str, name: &str, description: &str, placements: Vec<Placement>) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        placements,
    }
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, MockitError> {
        let mut product_ids = HashSet::new();
        for p in &products {
            if !product_ids.insert(p.id.as_str()) {
                return Err(MockitError::Config(format!(
                    "duplicate product id '{}' in catalog",
                    p.id
                )));
            }
            let mut placement_ids = HashSet::new();
            for pl in &p.placements {
                if !placement_ids.insert(pl.id.as_str()) {
                    return Err(MockitError::Config(format!(
                        "duplicate placement id '{}' in product '{}'",
                        pl.id, p.id
                    )));
                }
            }
        }
        Ok(Self { products })
    }

    pub fn builtin() -> Self {
        Self {
            products: vec![
                product(
                    "t-shirt",
                    "T-Shirt",
                    "A classic cotton t-shirt, perfect for any design.",
                    vec![
                        placement(
                            "center-chest",
                            "Center Chest",
                            "The logo is placed in the center of the chest area.",
                        ),
                        placement(
                            "left-pocket",
                            "Left Pocket",
                            "A smaller version of the logo is placed on the left pocket area.",
                        ),
                        placement(
                            "full-front",
                            "Full Front",
                            "A large version of the logo covers most of the front of the shirt.",
                        ),
                    ],
                ),
                product(
                    "mug-ceramic",
                    "Ceramic Mug",
                    "A sturdy and stylish ceramic mug for coffee or tea.",
                    vec![
                        placement(
                            "front-center",
                            "Front and Center",
                            "The logo is placed on one side of the mug, facing outwards.",
                        ),
                        placement(
                            "wrap-around",
                            "Wrap-around",
                            "The logo is printed to wrap around the mug.",
                        ),
                    ],
                ),
                product(
                    "cap",
                    "Baseball Cap",
                    "A sleek baseball cap with an adjustable strap.",
                    vec![
                        placement(
                            "front-panel",
                            "Front Panel",
                            "The logo is embroidered on the main front panel of the cap.",
                        ),
                        placement(
                            "side-panel",
                            "Side Panel",
                            "A smaller logo is placed on the side of the cap.",
                        ),
                    ],
                ),
                product(
                    "tote-bag-canvas",
                    "Canvas Tote Bag",
                    "An eco-friendly canvas tote bag, great for shopping.",
                    vec![
                        placement(
                            "center",
                            "Center",
                            "The logo is placed in the middle of the tote bag.",
                        ),
                        placement(
                            "high-center",
                            "High Center",
                            "The logo is placed on the upper half of the tote bag.",
                        ),
                    ],
                ),
                product(
                    "hoodie",
                    "Hoodie",
                    "A comfortable hoodie for a casual look.",
                    vec![
                        placement(
                            "center-chest",
                            "Center Chest",
                            "The logo is placed in the center of the chest.",
                        ),
                        placement(
                            "back-center",
                            "Back Center",
                            "A large logo is placed in the center of the back.",
                        ),
                    ],
                ),
            ],
        }
    }

    /// Load a catalog from a JSON array of products.
    pub fn from_json_file(path: &Path) -> Result<Self, MockitError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MockitError::Config(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&raw).map_err(|e| MockitError::Serialization(e.to_string()))?;
        Self::new(products)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn contains(&self, product_id: &str, placement_id: &str) -> bool {
        self.product(product_id)
            .and_then(|p| p.placement(placement_id))
            .is_some()
    }
}
