//! Baidu OCR client.
//!
//! Two endpoints are used:
//! - `general_basic`: plain text
//! - `accurate_basic`: text plus the location of every word
//!
//! Each endpoint has its own credentials and its own cached access token.

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use super::encode::image_to_base64_png;
use crate::automation::error::SessionError;
use crate::automation::geometry::{PositionedWord, WordBox};
use crate::automation::ports::{OcrMode, Recognition, TextRecognizer};

const TOKEN_URL: &str = "https://aip.baidubce.com/oauth/2.0/token";
const OCR_URL: &str = "https://aip.baidubce.com/rest/2.0/ocr/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error codes meaning the access token is invalid or expired.
const TOKEN_ERROR_CODES: [i64; 2] = [110, 111];

/// API key / secret key pair for one OCR endpoint.
#[derive(Clone, Debug, Default)]
pub struct BaiduCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl BaiduCredentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.secret_key.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    error_code: Option<i64>,
    error_msg: Option<String>,
    words_result: Option<Vec<WordEntry>>,
}

#[derive(Debug, Deserialize)]
struct WordEntry {
    words: String,
    location: Option<WordBox>,
}

/// Extracts the access token from a token endpoint response body.
fn parse_token_response(body: &str) -> Result<String> {
    let response: TokenResponse =
        serde_json::from_str(body).context("authentication failed: malformed token response")?;

    if let Some(error) = response.error {
        let description = response.error_description.unwrap_or(error);
        return Err(anyhow!("authentication failed: {}", description));
    }

    response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("authentication failed: no access token in response"))
}

/// Failure reported by the OCR endpoint itself.
#[derive(Debug)]
struct ApiFailure {
    code: i64,
    message: String,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OCR error {} - {}", self.code, self.message)
    }
}

impl std::error::Error for ApiFailure {}

/// Turns an OCR response body into a recognition result shaped by `mode`.
///
/// Lines are joined with '\n'. In accurate mode, entries without a location
/// still contribute text but are left out of the word list.
fn parse_ocr_response(body: &str, mode: OcrMode) -> Result<Recognition> {
    let response: OcrResponse =
        serde_json::from_str(body).context("malformed OCR response")?;

    if let Some(code) = response.error_code {
        return Err(ApiFailure {
            code,
            message: response.error_msg.unwrap_or_else(|| "unknown error".to_string()),
        }
        .into());
    }

    let entries = response
        .words_result
        .ok_or_else(|| anyhow!("OCR response has no words_result"))?;

    let text = entries
        .iter()
        .map(|entry| entry.words.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    match mode {
        OcrMode::Basic => Ok(Recognition::Plain(text)),
        OcrMode::Accurate => {
            let words = entries
                .into_iter()
                .filter_map(|entry| {
                    entry
                        .location
                        .map(|bounds| PositionedWord::new(entry.words, bounds))
                })
                .collect();
            Ok(Recognition::Positioned { text, words })
        }
    }
}

pub struct BaiduOcr {
    client: Client,
    basic: BaiduCredentials,
    accurate: BaiduCredentials,
    basic_token: Option<String>,
    accurate_token: Option<String>,
}

impl BaiduOcr {
    pub fn new(basic: BaiduCredentials, accurate: BaiduCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            basic,
            accurate,
            basic_token: None,
            accurate_token: None,
        })
    }

    fn token_slot(&mut self, mode: OcrMode) -> &mut Option<String> {
        match mode {
            OcrMode::Basic => &mut self.basic_token,
            OcrMode::Accurate => &mut self.accurate_token,
        }
    }

    fn access_token(&mut self, mode: OcrMode) -> Result<String> {
        if let Some(token) = self.token_slot(mode).clone() {
            return Ok(token);
        }

        let credentials = match mode {
            OcrMode::Basic => &self.basic,
            OcrMode::Accurate => &self.accurate,
        };
        if !credentials.is_complete() {
            return Err(anyhow!(
                "authentication failed: Baidu OCR API key and secret key for {} are not set",
                mode
            ));
        }

        let body = self
            .client
            .post(TOKEN_URL)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.api_key.as_str()),
                ("client_secret", credentials.secret_key.as_str()),
            ])
            .send()
            .context("network connection failed")?
            .text()
            .context("failed to read token response")?;

        let token = parse_token_response(&body)?;
        crate::log(&format!("OCR: obtained access token for {}", mode));
        *self.token_slot(mode) = Some(token.clone());
        Ok(token)
    }

    fn request(&mut self, image: &RgbaImage, mode: OcrMode) -> Result<Recognition> {
        let token = self.access_token(mode)?;
        let encoded = image_to_base64_png(image).context("failed to encode image")?;

        let body = self
            .client
            .post(format!("{}/{}", OCR_URL, mode.endpoint()))
            .query(&[("access_token", token.as_str())])
            .header("Accept", "application/json")
            .form(&[("image", encoded.as_str())])
            .send()
            .context("network connection failed")?
            .text()
            .context("failed to read OCR response")?;

        let result = parse_ocr_response(&body, mode);
        if let Err(e) = &result {
            if e
                .downcast_ref::<ApiFailure>()
                .is_some_and(|failure| TOKEN_ERROR_CODES.contains(&failure.code))
            {
                // Fetch a fresh token on the next call
                *self.token_slot(mode) = None;
            }
        }
        result
    }
}

impl TextRecognizer for BaiduOcr {
    fn recognize(
        &mut self,
        image: &RgbaImage,
        mode: OcrMode,
    ) -> std::result::Result<Recognition, SessionError> {
        self.request(image, mode)
            .map_err(|e| SessionError::Recognition(format!("{:#}", e)))
    }
}
