// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub const ALL_FAILED_MESSAGE: &str = "All mockup generations failed. This may be due to a network issue or an error with the image generation service.";
pub const ARCHIVE_FAILED_MESSAGE: &str =
    "Sorry, we couldn't create the zip file. Please try downloading images individually.";

/// Failure of a single generation task. Never escapes the pipeline run.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Invalid base64 string for logo")]
    InvalidLogo,

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation service error: {0}")]
    Service(String),

    #[error("No image was generated for the mockup")]
    NoImage,
}

#[derive(Error, Debug)]
pub enum MockitError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{}", ALL_FAILED_MESSAGE)]
    AllGenerationsFailed { attempted: usize },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResponseError for MockitError {
    fn error_response(&self) -> HttpResponse {
        match self {
            MockitError::Redis(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Database error",
                "message": self.to_string()
            })),
            MockitError::Generation(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Image generation error",
                    "message": self.to_string()
                }))
            }
            MockitError::AllGenerationsFailed { .. } => {
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "Generation failed",
                    "message": self.to_string()
                }))
            }
            MockitError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            MockitError::Archive(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Archive error",
                "message": ARCHIVE_FAILED_MESSAGE
            })),
            MockitError::Serialization(_) | MockitError::Config(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Data processing error",
                    "message": self.to_string()
                }))
            }
            MockitError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            MockitError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "Not found",
                "message": self.to_string()
            })),
        }
    }
}
