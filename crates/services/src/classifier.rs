//! Gesture recognition seam: frames in, digits out.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use signplay_core::model::Digit;
use tracing::debug;

use crate::error::{CaptureError, ClassifierError};

pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:5001";
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);

//
// ─── FRAMES ────────────────────────────────────────────────────────────────────
//

/// One still image of the player's hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    mime: String,
}

impl Frame {
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// `data:` URL form, as browsers produce from a canvas snapshot.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Supplies frames on demand (webcam, files on disk, test fixtures).
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Grab the next frame.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::NoFrame` when nothing can be captured right now.
    async fn next_frame(&self) -> Result<Frame, CaptureError>;
}

/// Maps a frame to the digit it shows.
#[async_trait]
pub trait GestureClassifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `ClassifierError` for transport failures, non-success replies,
    /// or a prediction that is missing or not a digit.
    async fn classify(&self, frame: &Frame) -> Result<Digit, ClassifierError>;
}

//
// ─── HTTP CLASSIFIER ───────────────────────────────────────────────────────────
//

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClassifierConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLASSIFIER_URL, DEFAULT_CLASSIFIER_TIMEOUT)
    }
}

/// Talks to the prediction service over `POST {base}/predict`.
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    /// # Errors
    ///
    /// Returns `ClassifierError::Http` if the HTTP client cannot be built.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

#[async_trait]
impl GestureClassifier for HttpClassifier {
    async fn classify(&self, frame: &Frame) -> Result<Digit, ClassifierError> {
        let url = format!("{}/predict", self.config.base_url.trim_end_matches('/'));
        let payload = PredictRequest {
            image: frame.data_url(),
        };

        let response = self.client.post(url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ClassifierError::HttpStatus(response.status()));
        }

        let body: PredictResponse = response.json().await?;
        let raw = body.digit().ok_or(ClassifierError::MissingPrediction)?;
        let digit = Digit::new(raw)?;
        debug!(digit = digit.value(), confidence = ?body.confidence, "gesture classified");
        Ok(digit)
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    prediction: Option<i64>,
    #[serde(default)]
    predicted_number: Option<i64>,
    #[serde(default, rename = "predictedDigit")]
    predicted_digit: Option<i64>,
    #[serde(default)]
    confidence: Option<f64>,
}

impl PredictResponse {
    /// First digit field present, in `prediction`, `predicted_number`,
    /// `predictedDigit` order.
    fn digit(&self) -> Option<i64> {
        self.prediction
            .or(self.predicted_number)
            .or(self.predicted_digit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn classifier(url: String) -> HttpClassifier {
        HttpClassifier::new(ClassifierConfig::new(url, Duration::from_secs(2))).unwrap()
    }

    #[test]
    fn data_url_is_base64_with_mime() {
        let frame = Frame::jpeg(b"hi".to_vec());
        assert_eq!(frame.data_url(), "data:image/jpeg;base64,aGk=");
    }

    #[tokio::test]
    async fn reads_prediction_field() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/predict")
            .match_body(Matcher::PartialJson(json!({"image": "data:image/jpeg;base64,AQI="})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"prediction": 7, "confidence": 0.9}).to_string())
            .create_async()
            .await;

        let digit = classifier(server.url())
            .classify(&Frame::jpeg(vec![1, 2]))
            .await
            .unwrap();
        assert_eq!(digit.value(), 7);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn accepts_alternate_field_names() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(json!({"predicted_number": 3}).to_string())
            .create_async()
            .await;

        let digit = classifier(format!("{}/", server.url()))
            .classify(&Frame::jpeg(vec![0]))
            .await
            .unwrap();
        assert_eq!(digit.value(), 3);
    }

    #[tokio::test]
    async fn reply_carrying_several_digit_fields_uses_prediction() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(
                json!({"prediction": 4, "predicted_number": 4, "predictedDigit": 9}).to_string(),
            )
            .create_async()
            .await;

        let digit = classifier(server.url())
            .classify(&Frame::jpeg(vec![0]))
            .await
            .unwrap();
        assert_eq!(digit.value(), 4);
    }

    #[test]
    fn digit_falls_back_through_field_names() {
        let reply: PredictResponse =
            serde_json::from_value(json!({"predicted_number": 2, "predictedDigit": 5})).unwrap();
        assert_eq!(reply.digit(), Some(2));
        let reply: PredictResponse = serde_json::from_value(json!({"predictedDigit": 5})).unwrap();
        assert_eq!(reply.digit(), Some(5));
        let reply: PredictResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reply.digit(), None);
    }

    #[tokio::test]
    async fn rejects_bad_replies() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(500)
            .with_body(json!({"error": "boom"}).to_string())
            .create_async()
            .await;
        let err = classifier(server.url())
            .classify(&Frame::jpeg(vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::HttpStatus(s) if s.as_u16() == 500));

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(json!({"prediction": 12}).to_string())
            .create_async()
            .await;
        let err = classifier(server.url())
            .classify(&Frame::jpeg(vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidDigit(_)));

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/predict")
            .with_status(200)
            .with_body(json!({"confidence": 0.1}).to_string())
            .create_async()
            .await;
        let err = classifier(server.url())
            .classify(&Frame::jpeg(vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MissingPrediction));
    }
}
