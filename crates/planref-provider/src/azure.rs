//! Azure Computer Vision printed-text OCR (`/vision/v3.2/ocr`).
//!
//! The service answers with `regions[].lines[].words[]`; each line becomes one
//! text box whose text is its words joined by single spaces.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use planref_core::config::OcrSettings;
use planref_core::traits::OcrProvider;
use planref_core::{BBox, Error, Result, TextBox};

pub struct AzureOcr {
    client: Client,
    url: String,
    key: String,
}

impl AzureOcr {
    pub fn new(settings: &OcrSettings) -> Result<Self> {
        if settings.endpoint.is_empty() {
            return Err(Error::InvalidConfig("ocr.endpoint is not set".to_string()));
        }
        if settings.key.is_empty() {
            return Err(Error::InvalidConfig("ocr.key is not set (APP_OCR__KEY)".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        let url = format!(
            "{}/vision/v3.2/ocr?language={}&detectOrientation=true",
            settings.endpoint.trim_end_matches('/'),
            settings.language
        );
        Ok(Self { client, url, key: settings.key.clone() })
    }
}

#[async_trait]
impl OcrProvider for AzureOcr {
    fn provider_id(&self) -> &str { "azure:vision-v3.2-ocr" }

    async fn recognize(&self, page_image: &Path) -> Result<Vec<TextBox>> {
        let bytes = tokio::fs::read(page_image)
            .await
            .map_err(|e| Error::PermanentProvider(format!("cannot read {}: {e}", page_image.display())))?;

        let response = self
            .client
            .post(&self.url)
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::TransientProvider(format!("OCR request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::TransientProvider(format!("OCR response unreadable: {e}")))?;
        if !status.is_success() {
            let message = format!("OCR failed ({status}): {body}");
            return Err(if is_retryable_status(status) {
                Error::TransientProvider(message)
            } else {
                Error::PermanentProvider(message)
            });
        }
        let boxes = parse_ocr_response(&body)?;
        debug!(page = %page_image.display(), lines = boxes.len(), "OCR complete");
        Ok(boxes)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT || status.is_server_error()
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    regions: Vec<OcrRegion>,
}

#[derive(Debug, Deserialize)]
struct OcrRegion {
    #[serde(default)]
    lines: Vec<OcrLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OcrLine {
    bounding_box: String,
    #[serde(default)]
    words: Vec<OcrWord>,
}

#[derive(Debug, Deserialize)]
struct OcrWord {
    text: String,
}

/// Lines of an OCR response as text boxes, in response order.
pub fn parse_ocr_response(body: &str) -> Result<Vec<TextBox>> {
    let response: OcrResponse =
        serde_json::from_str(body).map_err(|e| Error::PermanentProvider(format!("unexpected OCR payload: {e}")))?;
    let mut boxes = Vec::new();
    for line in response.regions.iter().flat_map(|r| &r.lines) {
        let bbox = parse_ltwh(&line.bounding_box)?;
        let text = line.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
        boxes.push(TextBox::new(bbox, text.trim_end()));
    }
    Ok(boxes)
}

/// `"left,top,width,height"` as reported by the service.
fn parse_ltwh(raw: &str) -> Result<BBox> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::PermanentProvider(format!("bad boundingBox {raw:?}: {e}")))?;
    match parts.as_slice() {
        &[l, t, w, h] => BBox::from_ltwh(l, t, w, h)
            .ok_or_else(|| Error::PermanentProvider(format!("boundingBox {raw:?} is negative or out of range"))),
        _ => Err(Error::PermanentProvider(format!("bad boundingBox {raw:?}"))),
    }
}
