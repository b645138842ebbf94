//! OpenAI-compatible vision backend.
//!
//! Sends one chat-completions request per analysis with the prompt as a text
//! part and the image inlined as a base64 `data:` URL. Works with the OpenAI
//! cloud API and any endpoint that accepts the same vision message shape.
//!
//! # Example
//!
//! ```rust,no_run
//! use boxsight_core::ProviderSettings;
//! use boxsight_inference::openai::OpenAIVisionBackend;
//! use boxsight_inference::VisionBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = ProviderSettings {
//!         api_key: Some("sk-...".to_string()),
//!         ..ProviderSettings::default()
//!     };
//!     let backend = OpenAIVisionBackend::from_settings(&settings)
//!         .unwrap()
//!         .expect("api key is set");
//!
//!     let jpeg = std::fs::read("pallet.jpg").unwrap();
//!     let reply = backend
//!         .describe_image(&jpeg, "image/jpeg", "Count the boxes")
//!         .await
//!         .unwrap();
//!     println!("{reply}");
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIVisionBackend, OpenAIVisionConfig};
pub use error::{to_provider_error, OpenAIErrorCode};
pub use types::*;
