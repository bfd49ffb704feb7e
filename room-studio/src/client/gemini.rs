use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use egui_inpaint::SourceImage;
use futures::{FutureExt, future::BoxFuture};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ClientError, GenerationClient, RenderRequest};
use crate::config::ApiConfig;

const ANALYZE_INSTRUCTION: &str = "You are an interior designer. Describe this room for an \
    image-generation prompt: layout, furniture, materials, lighting and color palette, in one \
    dense paragraph. No preamble, no lists.";

const MASK_INSTRUCTION: &str = "Repaint only the regions marked white in the second image (the \
    mask); everything under black mask pixels must stay pixel-identical to the first image.";

/// Client for Google's `generateContent` endpoint. Requests are plain JSON
/// with base64 inline images; the API key travels as a query parameter.
pub struct GeminiClient {
    base_url: String,
    analyze_model: String,
    image_model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig, api_key: String) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            analyze_model: config.analyze_model.clone(),
            image_model: config.image_model.clone(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }
}

/// Runs request building and the blocking HTTP call on a worker thread and
/// hands back a pollable future. Payload encoding stays off the UI thread;
/// multi-megapixel photos take a noticeable moment to PNG-encode.
fn dispatch<T: Send + 'static>(
    work: impl FnOnce() -> Result<T, ClientError> + Send + 'static,
) -> BoxFuture<'static, Result<T, ClientError>> {
    let (tx, rx) = futures::channel::oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(work());
    });
    async move { rx.await.map_err(|_| ClientError::WorkerGone)? }.boxed()
}

fn post_blocking(url: &str, body: &Value) -> Result<GenerateContentResponse, ClientError> {
    let response = reqwest::blocking::Client::new().post(url).json(body).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        });
    }
    Ok(response.json()?)
}

fn inline_png(png: &[u8]) -> Value {
    json!({
        "inline_data": {
            "mime_type": "image/png",
            "data": BASE64.encode(png),
        }
    })
}

impl GenerationClient for GeminiClient {
    fn analyze(&self, photo: &SourceImage) -> BoxFuture<'static, Result<String, ClientError>> {
        let url = self.endpoint(&self.analyze_model);
        let photo = photo.clone();
        dispatch(move || {
            let body = json!({
                "contents": [{
                    "parts": [
                        { "text": ANALYZE_INSTRUCTION },
                        inline_png(&photo.to_png()?),
                    ]
                }],
            });
            let text = post_blocking(&url, &body)?
                .into_text()
                .ok_or(ClientError::MissingText)?;
            info!("Analyzed room photo ({} prompt chars)", text.len());
            Ok(text)
        })
    }

    fn render(&self, request: RenderRequest) -> BoxFuture<'static, Result<Vec<u8>, ClientError>> {
        let url = self.endpoint(&self.image_model);
        dispatch(move || {
            let mut parts = vec![json!({ "text": request.prompt })];
            if let Some(photo) = &request.photo {
                parts.push(inline_png(&photo.to_png()?));
            }
            if let Some(mask) = &request.mask_png {
                parts.push(json!({ "text": MASK_INSTRUCTION }));
                parts.push(inline_png(mask));
            }
            let body = json!({
                "contents": [{ "parts": parts }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
            });
            let png = post_blocking(&url, &body)?.into_image()?;
            info!("Received render ({} bytes)", png.len());
            Ok(png)
        })
    }

    fn upscale(
        &self,
        photo: &SourceImage,
        factor: u8,
    ) -> BoxFuture<'static, Result<Vec<u8>, ClientError>> {
        let url = self.endpoint(&self.image_model);
        let photo = photo.clone();
        dispatch(move || {
            let body = json!({
                "contents": [{
                    "parts": [
                        { "text": format!(
                            "Upscale this image to {factor}x its resolution. Reproduce the \
                             content exactly, only sharper and more detailed. Do not restyle."
                        ) },
                        inline_png(&photo.to_png()?),
                    ]
                }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
            });
            post_blocking(&url, &body)?.into_image()
        })
    }

    fn label(&self) -> &'static str {
        "gemini"
    }
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Debug)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    fn into_parts(self) -> impl Iterator<Item = Part> {
        self.candidates
            .into_iter()
            .flatten()
            .filter_map(|c| c.content)
            .filter_map(|c| c.parts)
            .flatten()
    }

    fn into_text(self) -> Option<String> {
        self.into_parts().find_map(|p| p.text)
    }

    /// First image part, decoded and normalized to PNG regardless of the
    /// mime type the backend picked.
    fn into_image(self) -> Result<Vec<u8>, ClientError> {
        let inline = self
            .into_parts()
            .filter_map(|p| p.inline_data)
            .find(|d| d.mime_type.starts_with("image/"))
            .ok_or(ClientError::MissingImage)?;
        let bytes = BASE64
            .decode(&inline.data)
            .map_err(|e| ClientError::Payload(format!("invalid base64 image: {e}")))?;
        debug!("Decoded {} inline bytes ({})", bytes.len(), inline.mime_type);
        let img = image::load_from_memory(&bytes)?;
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_model_and_key() {
        let client = GeminiClient::new(&ApiConfig::default(), "k123".into());
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=k123"
        );
    }

    #[test]
    fn response_text_extraction_skips_empty_candidates() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    { "content": null },
                    { "content": { "parts": [
                        { "inlineData": { "mimeType": "image/png", "data": "" } },
                        { "text": "a cozy living room" }
                    ] } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("a cozy living room"));
    }

    #[test]
    fn image_extraction_reports_missing_part() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{ "candidates": [] }"#).unwrap();
        assert!(matches!(response.into_image(), Err(ClientError::MissingImage)));
    }

    #[test]
    fn image_extraction_normalizes_to_png() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]));
        let mut jpeg = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let response = GenerateContentResponse {
            candidates: Some(vec![Candidate {
                content: Some(Content {
                    parts: Some(vec![Part {
                        inline_data: Some(InlineData {
                            mime_type: "image/jpeg".into(),
                            data: BASE64.encode(&jpeg),
                        }),
                        text: None,
                    }]),
                }),
            }]),
        };
        let png = response.into_image().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 2);
        assert!(image::guess_format(&png).is_ok_and(|f| f == image::ImageFormat::Png));
    }
}
