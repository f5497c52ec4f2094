// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub placements: Vec<Placement>,
}

impl Product {
    pub fn placement(&self, placement_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == placement_id)
    }
}

/// One unit of generation work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub product: Product,
    pub placement: Placement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mockup {
    pub product: Product,
    pub placement: Placement,
    /// Self-contained data URI of the rendered image.
    pub image_url: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logo {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub data_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingState {
    pub active: bool,
    pub progress: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorialStep {
    pub title: &'static str,
    pub content: &'static str,
}

pub const TUTORIAL_STEPS: [TutorialStep; 4] = [
    TutorialStep {
        title: "Step 1: Upload Your Logo",
        content: "Start by dragging and dropping your logo or clicking the upload area. We recommend a high-quality PNG with a transparent background for the best results.",
    },
    TutorialStep {
        title: "Step 2: Customize Products",
        content: "Select the products you want to see your logo on. For each product, choose from the various placement options available.",
    },
    TutorialStep {
        title: "Step 3: Generate & View",
        content: "Once you're ready, hit \"Generate Mockups\". Our AI will create your designs. Click \"View\" on any mockup to zoom in for a closer look.",
    },
    TutorialStep {
        title: "Step 4: Download Your Mockups",
        content: "Happy with the results? Download individual images or get them all in a handy .zip file. You're all set to showcase your brand!",
    },
];
