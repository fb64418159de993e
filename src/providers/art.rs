//! Background art sources.

use super::{ArtSource, Artwork, ProviderError, status_error};
use crate::config::ArtConfig;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

const PROVIDER: &str = "imagen";

pub const NATURE_PROMPTS: &[&str] = &[
    "serene mountain landscape at golden hour with soft clouds, dreamy atmosphere, muted colors",
    "peaceful forest path with morning mist, soft sunlight filtering through trees, ethereal mood",
    "calm ocean waves at sunset with pastel sky colors, minimalist composition",
    "gentle rolling hills with wildflowers, soft focus background, warm lighting",
    "tranquil lake reflection at dawn, misty mountains in distance, peaceful atmosphere",
    "autumn forest with golden leaves, soft bokeh effect, warm tones",
    "desert sand dunes at sunrise, soft shadows, minimalist and serene",
    "cherry blossom trees in soft focus, gentle pink tones, dreamy spring day",
    "northern lights over snowy landscape, soft purple and green hues",
    "meadow with morning dew, soft sunlight, peaceful and calming",
];

const PROMPT_SUFFIX: &str = "suitable as background for text overlay, no text or letters in image, soft and not too busy, professional photography style";

/// Full prompt sent to the model for a style hint.
pub fn background_prompt(style: &str) -> String {
    format!("{style}, {PROMPT_SUFFIX}")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
    parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

fn decode_prediction(response: PredictResponse) -> Result<Vec<u8>, ProviderError> {
    let encoded = response
        .predictions
        .into_iter()
        .find_map(|p| p.bytes_base64_encoded)
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "no image generated"))?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProviderError::malformed(PROVIDER, format!("invalid base64: {e}")))?;
    if bytes.is_empty() {
        return Err(ProviderError::malformed(PROVIDER, "empty image payload"));
    }
    Ok(bytes)
}

/// Google Imagen via the Generative Language REST `:predict` endpoint.
pub struct ImagenArt {
    client: reqwest::Client,
    api_key: Option<String>,
    config: ArtConfig,
}

impl ImagenArt {
    pub fn new(client: reqwest::Client, api_key: Option<String>, config: ArtConfig) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            config,
        }
    }

    /// Reads the key from `GEMINI_API_KEY`.
    pub fn from_env(client: reqwest::Client, config: ArtConfig) -> Self {
        Self::new(client, std::env::var("GEMINI_API_KEY").ok(), config)
    }
}

#[async_trait]
impl ArtSource for ImagenArt {
    async fn generate(&self, prompt_hint: Option<&str>) -> Result<Artwork, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("GEMINI_API_KEY".to_string()))?;

        let style = match prompt_hint {
            Some(hint) => hint.to_string(),
            None => NATURE_PROMPTS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(NATURE_PROMPTS[0])
                .to_string(),
        };
        let prompt = background_prompt(&style);

        let body = PredictRequest {
            instances: vec![PredictInstance { prompt: &prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: &self.config.aspect_ratio,
            },
        };
        let url = format!(
            "{}/models/{}:predict",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::request(PROVIDER, e))?;
        if !response.status().is_success() {
            return Err(status_error(PROVIDER, response).await);
        }
        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(PROVIDER, e.to_string()))?;
        let bytes = decode_prediction(parsed)?;

        info!(bytes = bytes.len(), "generated background image");
        Ok(Artwork { bytes, prompt })
    }
}

/// Offline source: a solid colour canvas, no network involved.
#[derive(Debug, Clone)]
pub struct FlatArt {
    pub width: u32,
    pub height: u32,
    pub color: [u8; 3],
}

impl FlatArt {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            color: [60, 100, 140],
        }
    }

    pub fn render_png(&self) -> Result<Vec<u8>, ProviderError> {
        let canvas = image::RgbImage::from_pixel(self.width, self.height, image::Rgb(self.color));
        let mut bytes = std::io::Cursor::new(Vec::new());
        canvas
            .write_to(&mut bytes, image::ImageFormat::Png)
            .map_err(|e| ProviderError::request("flat art", e))?;
        Ok(bytes.into_inner())
    }
}

#[async_trait]
impl ArtSource for FlatArt {
    async fn generate(&self, _prompt_hint: Option<&str>) -> Result<Artwork, ProviderError> {
        let [r, g, b] = self.color;
        Ok(Artwork {
            bytes: self.render_png()?,
            prompt: format!("flat colour rgb({r}, {g}, {b})"),
        })
    }
}
