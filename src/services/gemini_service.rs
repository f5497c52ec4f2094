// src/services/gemini_service.rs
use crate::errors::GenerationError;
use crate::models::{Placement, Product};
use crate::pipeline::MockupGenerator;
use crate::services::image_processor::split_data_uri;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiService {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

/// Instructions sent alongside the logo for one product placement.
pub fn mockup_prompt(product: &Product, placement: &Placement) -> String {
    format!(
        r#"You are an expert photorealistic mockup designer. You will be given a logo.
Your task is to create a photorealistic product shot of a "{name}" with the provided logo placed on it.
- Product: {name}. Context: {description}.
- Logo Placement: "{placement}". Details: {details}.
The logo must look naturally integrated onto the product's surface.
The final output must be only the generated image of the product. The background of the image MUST be transparent. Do not add any shadows that extend outside the product itself."#,
        name = product.name,
        description = product.description,
        placement = placement.name,
        details = placement.description,
    )
}

/// First inline image of the first candidate, as a data URI.
fn extract_image(response: &Value) -> Result<String, GenerationError> {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|part| {
            let inline = part.get("inlineData").or_else(|| part.get("inline_data"))?;
            let data = inline["data"].as_str().filter(|d| !d.is_empty())?;
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or("image/png");
            Some(format!("data:{};base64,{}", mime, data))
        })
        .ok_or(GenerationError::NoImage)
}

impl GeminiService {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(logo_mime: &str, logo_data: &str, prompt: &str) -> Value {
        json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": logo_mime,
                            "data": logo_data
                        }
                    },
                    { "text": prompt }
                ]
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"]
            }
        })
    }
}

#[async_trait]
impl MockupGenerator for GeminiService {
    async fn generate_one(
        &self,
        logo: &str,
        product: &Product,
        placement: &Placement,
    ) -> Result<String, GenerationError> {
        let (logo_mime, logo_data) = split_data_uri(logo).ok_or(GenerationError::InvalidLogo)?;
        let prompt = mockup_prompt(product, placement);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(logo_mime, logo_data, &prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service(format!("{}: {}", status, error_text)));
        }

        let result: Value = response.json().await.map_err(|e| {
            GenerationError::Service(format!("Failed to parse generation response: {}", e))
        })?;

        extract_image(&result)
    }
}
