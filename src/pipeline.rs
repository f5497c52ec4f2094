// src/pipeline.rs
// Expansion of placement selections into generation tasks, and the sequential batch run.
use crate::catalog::Catalog;
use crate::errors::{GenerationError, MockitError};
use crate::models::{GenerationTask, Mockup, Placement, Product};
use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The remote capability that renders one logo onto one product placement.
#[async_trait]
pub trait MockupGenerator: Send + Sync {
    /// Returns the rendered image as a data URI.
    async fn generate_one(
        &self,
        logo: &str,
        product: &Product,
        placement: &Placement,
    ) -> Result<String, GenerationError>;
}

/// Selected placement ids per product id, in the order the user picked them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionMatrix {
    selected: HashMap<String, Vec<String>>,
}

impl SelectionMatrix {
    /// Empty selection for every product in the catalog.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self {
            selected: catalog
                .products()
                .iter()
                .map(|p| (p.id.clone(), Vec::new()))
                .collect(),
        }
    }

    /// Adds the pair if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, product_id: &str, placement_id: &str) -> bool {
        let placements = self.selected.entry(product_id.to_string()).or_default();
        if let Some(pos) = placements.iter().position(|id| id == placement_id) {
            placements.remove(pos);
            false
        } else {
            placements.push(placement_id.to_string());
            true
        }
    }

    pub fn is_selected(&self, product_id: &str, placement_id: &str) -> bool {
        self.selected
            .get(product_id)
            .is_some_and(|ids| ids.iter().any(|id| id == placement_id))
    }

    #[cfg(test)]
    pub fn selected_for(&self, product_id: &str) -> &[String] {
        self.selected
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of selected ids, resolvable or not.
    pub fn len(&self) -> usize {
        self.selected.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expand a selection matrix into tasks.
///
/// Products come in catalog order and, within a product, placements come in
/// the product's declared order, independent of the order they were selected.
/// Ids that do not resolve against the catalog are dropped.
pub fn expand_selections(catalog: &Catalog, selection: &SelectionMatrix) -> Vec<GenerationTask> {
    catalog
        .products()
        .iter()
        .flat_map(|product| {
            product
                .placements
                .iter()
                .filter(|placement| selection.is_selected(&product.id, &placement.id))
                .map(move |placement| GenerationTask {
                    product: product.clone(),
                    placement: placement.clone(),
                })
        })
        .collect()
}

/// Run a batch strictly sequentially.
///
/// Failed tasks are logged and skipped. `on_progress(completed, total)` fires once
/// after every task. A non-empty batch with no successes fails as a whole.
pub async fn run<G, F>(
    tasks: &[GenerationTask],
    logo: &str,
    generator: &G,
    mut on_progress: F,
) -> Result<Vec<Mockup>, MockitError>
where
    G: MockupGenerator + ?Sized,
    F: FnMut(usize, usize),
{
    let total = tasks.len();
    let mut mockups = Vec::with_capacity(total);

    info!("Generating {} mockup(s)", total);

    for (index, task) in tasks.iter().enumerate() {
        match generator
            .generate_one(logo, &task.product, &task.placement)
            .await
        {
            Ok(image_url) => {
                debug!(
                    "Generated mockup for {} ({})",
                    task.product.name, task.placement.name
                );
                mockups.push(Mockup {
                    product: task.product.clone(),
                    placement: task.placement.clone(),
                    image_url,
                    generated_at: chrono::Utc::now(),
                });
            }
            Err(e) => {
                error!(
                    "Error generating mockup for {} ({}): {}",
                    task.product.name, task.placement.name, e
                );
            }
        }
        on_progress(index + 1, total);
    }

    if total > 0 && mockups.is_empty() {
        return Err(MockitError::AllGenerationsFailed { attempted: total });
    }

    info!("Generated {} of {} mockup(s)", mockups.len(), total);
    Ok(mockups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn placement(id: &str) -> Placement {
        Placement {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
        }
    }

    fn small_catalog() -> Catalog {
        Catalog::new(vec![
            Product {
                id: "P1".into(),
                name: "Product One".into(),
                description: String::new(),
                placements: vec![placement("A"), placement("B")],
            },
            Product {
                id: "P2".into(),
                name: "Product Two".into(),
                description: String::new(),
                placements: vec![placement("C")],
            },
        ])
        .unwrap()
    }

    /// Fails for the placements listed in `failing` and records every call.
    struct ScriptedGenerator {
        failing: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(failing: Vec<&'static str>) -> Self {
            Self {
                failing,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MockupGenerator for ScriptedGenerator {
        async fn generate_one(
            &self,
            _logo: &str,
            product: &Product,
            placement: &Placement,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}/{}", product.id, placement.id));
            if self.failing.contains(&placement.id.as_str()) {
                Err(GenerationError::NoImage)
            } else {
                Ok(format!("data:image/png;base64,{}", placement.id))
            }
        }
    }

    fn pairs(tasks: &[GenerationTask]) -> Vec<(String, String)> {
        tasks
            .iter()
            .map(|t| (t.product.id.clone(), t.placement.id.clone()))
            .collect()
    }

    #[test]
    fn expansion_follows_catalog_order() {
        let catalog = small_catalog();
        let mut selection = SelectionMatrix::for_catalog(&catalog);
        selection.toggle("P2", "C");
        selection.toggle("P1", "B");
        selection.toggle("P1", "A");

        let tasks = expand_selections(&catalog, &selection);
        assert_eq!(
            pairs(&tasks),
            vec![
                ("P1".to_string(), "A".to_string()),
                ("P1".to_string(), "B".to_string()),
                ("P2".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn expansion_drops_unknown_ids() {
        let catalog = small_catalog();
        let mut selection = SelectionMatrix::default();
        selection.toggle("P1", "Z");
        selection.toggle("P9", "A");
        selection.toggle("P2", "C");

        assert_eq!(selection.len(), 3);
        let tasks = expand_selections(&catalog, &selection);
        assert_eq!(pairs(&tasks), vec![("P2".to_string(), "C".to_string())]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionMatrix::default();
        assert!(selection.toggle("P1", "A"));
        assert!(selection.toggle("P1", "B"));
        assert_eq!(selection.selected_for("P1"), ["A", "B"]);
        assert!(!selection.toggle("P1", "A"));
        assert_eq!(selection.selected_for("P1"), ["B"]);
        assert!(selection.selected_for("P2").is_empty());
    }

    #[tokio::test]
    async fn partial_failure_keeps_order_and_reports_every_task() {
        let catalog = small_catalog();
        let mut selection = SelectionMatrix::for_catalog(&catalog);
        selection.toggle("P1", "A");
        selection.toggle("P1", "B");
        selection.toggle("P2", "C");
        let tasks = expand_selections(&catalog, &selection);

        let generator = ScriptedGenerator::new(vec!["B"]);
        let mut progress = Vec::new();
        let mockups = run(&tasks, "data:image/png;base64,AAAA", &generator, |done, total| {
            progress.push((done, total))
        })
        .await
        .unwrap();

        assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
        let ids: Vec<_> = mockups.iter().map(|m| m.placement.id.as_str()).collect();
        assert_eq!(ids, ["A", "C"]);
        assert_eq!(mockups[1].image_url, "data:image/png;base64,C");
        assert_eq!(*generator.calls.lock().unwrap(), ["P1/A", "P1/B", "P2/C"]);
    }

    #[tokio::test]
    async fn all_failures_escape_as_one_error() {
        let catalog = small_catalog();
        let mut selection = SelectionMatrix::default();
        selection.toggle("P1", "A");
        selection.toggle("P1", "B");
        let tasks = expand_selections(&catalog, &selection);

        let generator = ScriptedGenerator::new(vec!["A", "B"]);
        let mut calls = 0;
        let result = run(&tasks, "logo", &generator, |_, _| calls += 1).await;

        assert!(matches!(
            result,
            Err(MockitError::AllGenerationsFailed { attempted: 2 })
        ));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn empty_batch_is_not_an_error() {
        let generator = ScriptedGenerator::new(vec![]);
        let mut calls = 0;
        let mockups = run(&[], "logo", &generator, |_, _| calls += 1)
            .await
            .unwrap();
        assert!(mockups.is_empty());
        assert_eq!(calls, 0);
    }
}
