pub mod archive;
pub mod gemini_service;
pub mod image_processor;
pub mod redis_service;

pub use gemini_service::GeminiService;
pub use image_processor::ImageProcessor;
pub use redis_service::RedisService;
