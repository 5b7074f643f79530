//! Asset retrieval: page identifier gate, payload decoding, thumbnail loading.
//!
//! The asset service is keyed by a 6-character slug read from the page query
//! string. The slug is validated before any request is made.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Required slug length, in characters.
pub const SLUG_LEN: usize = 6;

/// Shown to the user when the slug is missing or malformed.
pub const SLUG_ALERT: &str = "Please provide a valid 6-letter slug in the URL (?f=XXXXXX)";

/// Shown to the user when the asset payload cannot be retrieved.
pub const RETRIEVAL_ALERT: &str = "Failed to load assets. Please try again.";

/// Validated page identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self> {
        let n = raw.chars().count();
        if n != SLUG_LEN {
            return Err(Error::ConfigError(format!(
                "slug must be exactly {} characters, got {}",
                SLUG_LEN, n
            )));
        }
        Ok(Slug(raw.to_string()))
    }

    /// Read `param` from a query string (leading `?` optional).
    pub fn from_query(query: &str, param: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let raw = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == param)
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Error::ConfigError(format!("missing '{}' query parameter", param)))?;
        Self::parse(&raw)
    }

    /// Read `param` from a full page URL.
    pub fn from_page_url(page_url: &str, param: &str) -> Result<Self> {
        let url = url::Url::parse(page_url)
            .map_err(|e| Error::ConfigError(format!("invalid page URL: {}", e)))?;
        Self::from_query(url.query().unwrap_or_default(), param)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire payload returned by the asset service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPayload {
    pub mind_file_url: String,
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

/// Media for one session, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub mind_url: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub customer_name: Option<String>,
}

impl MediaAsset {
    /// Page title: the customer name, or `default` when unset.
    pub fn title<'a>(&'a self, default: &'a str) -> &'a str {
        self.customer_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(default)
    }
}

impl TryFrom<AssetPayload> for MediaAsset {
    type Error = Error;

    fn try_from(p: AssetPayload) -> Result<Self> {
        if p.mind_file_url.trim().is_empty() || p.video_url.trim().is_empty() {
            return Err(Error::RetrievalError(
                "malformed payload: mind_file_url and video_url are required".into(),
            ));
        }
        Ok(MediaAsset {
            mind_url: p.mind_file_url,
            video_url: p.video_url,
            thumbnail_url: p.thumbnail_url.filter(|u| !u.trim().is_empty()),
            customer_name: p.customer_name,
        })
    }
}

/// Decode a JSON payload body into a [`MediaAsset`].
pub fn decode_payload(body: &str) -> Result<MediaAsset> {
    let payload: AssetPayload = serde_json::from_str(body)
        .map_err(|e| Error::RetrievalError(format!("malformed payload: {}", e)))?;
    MediaAsset::try_from(payload)
}

pub trait AssetSource: Send + Sync {
    fn fetch(&self, slug: &Slug) -> Result<MediaAsset>;
}

/// Serves a fixed result and counts how often it was asked.
pub struct StaticAssetSource {
    result: Result<MediaAsset>,
    calls: AtomicUsize,
}

impl StaticAssetSource {
    pub fn new(asset: MediaAsset) -> Self {
        Self { result: Ok(asset), calls: AtomicUsize::new(0) }
    }

    pub fn failing(err: Error) -> Self {
        Self { result: Err(err), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetSource for StaticAssetSource {
    fn fetch(&self, _slug: &Slug) -> Result<MediaAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[cfg(feature = "http")]
pub use http::{HttpAssetSource, HttpThumbnailLoader};

#[cfg(feature = "http")]
mod http {
    use super::{
        decode_payload, decode_thumbnail, AssetSource, MediaAsset, Slug, ThumbnailCallback, ThumbnailLoader,
    };
    use crate::{Error, Result};
    use log::{debug, warn};
    use reqwest::blocking::Client;
    use std::time::Duration;

    fn build_client(timeout_ms: u64, user_agent: &str) -> Result<Client> {
        Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))
    }

    /// Fetches `GET {api_base}?slug={slug}`.
    pub struct HttpAssetSource {
        client: Client,
        api_base: String,
    }

    impl HttpAssetSource {
        pub fn new(api_base: &str, timeout_ms: u64, user_agent: &str) -> Result<Self> {
            url::Url::parse(api_base)
                .map_err(|e| Error::Other(format!("invalid api base '{}': {}", api_base, e)))?;
            Ok(Self {
                client: build_client(timeout_ms, user_agent)?,
                api_base: api_base.to_string(),
            })
        }

        pub fn from_config(cfg: &crate::SessionConfig) -> Result<Self> {
            Self::new(&cfg.api_base, cfg.timeout_ms, &cfg.user_agent)
        }

        fn endpoint(&self, slug: &Slug) -> Result<url::Url> {
            url::Url::parse_with_params(&self.api_base, &[("slug", slug.as_str())])
                .map_err(|e| Error::RetrievalError(format!("invalid endpoint '{}': {}", self.api_base, e)))
        }
    }

    impl AssetSource for HttpAssetSource {
        fn fetch(&self, slug: &Slug) -> Result<MediaAsset> {
            let url = self.endpoint(slug)?;
            debug!("fetching assets from {}", url);
            let res = self
                .client
                .get(url)
                .send()
                .map_err(|e| Error::RetrievalError(format!("HTTP GET failed: {}", e)))?;
            let status = res.status();
            if !status.is_success() {
                return Err(Error::RetrievalError(format!("asset service returned {}", status)));
            }
            let body = res
                .text()
                .map_err(|e| Error::RetrievalError(format!("Failed to read response body: {}", e)))?;
            decode_payload(&body)
        }
    }

    /// Downloads thumbnails on a background thread and reports via callback.
    pub struct HttpThumbnailLoader {
        client: Client,
    }

    impl HttpThumbnailLoader {
        pub fn new(timeout_ms: u64, user_agent: &str) -> Result<Self> {
            Ok(Self { client: build_client(timeout_ms, user_agent)? })
        }

        fn get(client: &Client, url: &str) -> Result<Vec<u8>> {
            let res = client
                .get(url)
                .send()
                .map_err(|e| Error::AssetDegradation(format!("thumbnail GET failed: {}", e)))?;
            if !res.status().is_success() {
                return Err(Error::AssetDegradation(format!("thumbnail returned {}", res.status())));
            }
            res.bytes()
                .map(|b| b.to_vec())
                .map_err(|e| Error::AssetDegradation(format!("thumbnail body: {}", e)))
        }
    }

    impl ThumbnailLoader for HttpThumbnailLoader {
        fn load(&self, url: &str, done: ThumbnailCallback) {
            let client = self.client.clone();
            let url = url.to_string();
            std::thread::spawn(move || {
                let res = Self::get(&client, &url).and_then(|bytes| decode_thumbnail(&url, bytes));
                if let Err(e) = &res {
                    warn!("{}", e);
                }
                done(res);
            });
        }
    }
}

/// Accept `bytes` as a thumbnail only if they decode as an image.
///
/// A body that is not an image (an HTML error page served with 200, a
/// truncated download) is reported as [`Error::AssetDegradation`], the same
/// as a failed request.
pub fn decode_thumbnail(url: &str, bytes: Vec<u8>) -> Result<Arc<Vec<u8>>> {
    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::AssetDegradation(format!("thumbnail {} did not decode: {}", url, e)))?;
    log::debug!("thumbnail {} decoded ({}x{})", url, img.width(), img.height());
    Ok(Arc::new(bytes))
}

/// Completion callback for a thumbnail load.
pub type ThumbnailCallback = Box<dyn FnOnce(Result<Arc<Vec<u8>>>) + Send>;

/// Loads thumbnail images; completion is reported through the callback,
/// which may run on another thread or before `load` returns.
pub trait ThumbnailLoader: Send + Sync {
    fn load(&self, url: &str, done: ThumbnailCallback);
}

/// Resolves thumbnails from an in-memory table, synchronously.
#[derive(Default)]
pub struct MemoryThumbnails {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryThumbnails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.images.insert(url.into(), bytes);
        self
    }
}

impl ThumbnailLoader for MemoryThumbnails {
    fn load(&self, url: &str, done: ThumbnailCallback) {
        let res = self
            .images
            .get(url)
            .cloned()
            .ok_or_else(|| Error::AssetDegradation(format!("thumbnail not found: {}", url)))
            .and_then(|bytes| decode_thumbnail(url, bytes));
        done(res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_must_be_six_characters() {
        assert_eq!(Slug::parse("ABCDEF").unwrap().as_str(), "ABCDEF");
        assert!(matches!(Slug::parse("ABC"), Err(Error::ConfigError(_))));
        assert!(matches!(Slug::parse("ABCDEFG"), Err(Error::ConfigError(_))));
        assert!(matches!(Slug::parse(""), Err(Error::ConfigError(_))));
    }

    #[test]
    fn slug_counts_characters_not_bytes() {
        assert!(Slug::parse("ÄBCDEF").is_ok());
    }

    #[test]
    fn slug_from_query_and_url() {
        assert_eq!(Slug::from_query("?f=ABCDEF", "f").unwrap().as_str(), "ABCDEF");
        assert_eq!(Slug::from_query("x=1&f=ZZZ999", "f").unwrap().as_str(), "ZZZ999");
        assert!(matches!(Slug::from_query("?g=ABCDEF", "f"), Err(Error::ConfigError(_))));
        let s = Slug::from_page_url("https://ar.example/view?f=QWERTY", "f").unwrap();
        assert_eq!(s.to_string(), "QWERTY");
        assert!(matches!(Slug::from_page_url("https://ar.example/view", "f"), Err(Error::ConfigError(_))));
    }

    #[test]
    fn payload_decodes_with_optional_fields() {
        let a = decode_payload(
            r#"{"mind_file_url":"m.mind","video_url":"v.mp4","thumbnail_url":"","customer_name":"Acme"}"#,
        )
        .unwrap();
        assert_eq!(a.mind_url, "m.mind");
        assert_eq!(a.thumbnail_url, None);
        assert_eq!(a.title("AR Experience"), "Acme");

        let b = decode_payload(r#"{"mind_file_url":"m.mind","video_url":"v.mp4","thumbnail_url":null}"#).unwrap();
        assert_eq!(b.title("AR Experience"), "AR Experience");
    }

    #[test]
    fn malformed_payload_is_retrieval_error() {
        assert!(matches!(decode_payload("not json"), Err(Error::RetrievalError(_))));
        assert!(matches!(decode_payload(r#"{"video_url":"v.mp4"}"#), Err(Error::RetrievalError(_))));
        assert!(matches!(
            decode_payload(r#"{"mind_file_url":" ","video_url":"v.mp4"}"#),
            Err(Error::RetrievalError(_))
        ));
    }

    #[test]
    fn static_source_counts_calls() {
        let src = StaticAssetSource::failing(Error::RetrievalError("down".into()));
        let slug = Slug::parse("ABCDEF").unwrap();
        assert!(src.fetch(&slug).is_err());
        assert_eq!(src.calls(), 1);
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([20, 20, 20, 255]),
        ));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn memory_thumbnails_report_missing_as_degradation() {
        let bytes = png(4, 3);
        let len = bytes.len();
        let loader = MemoryThumbnails::new().with_image("ok.png", bytes);
        let (tx, rx) = std::sync::mpsc::channel();
        let tx2 = tx.clone();
        loader.load("ok.png", Box::new(move |r| tx.send(r.map(|b| b.len())).unwrap()));
        loader.load("missing.png", Box::new(move |r| tx2.send(r.map(|b| b.len())).unwrap()));
        assert_eq!(rx.recv().unwrap(), Ok(len));
        assert!(matches!(rx.recv().unwrap(), Err(Error::AssetDegradation(_))));
    }

    #[test]
    fn undecodable_thumbnail_is_degradation() {
        let err = decode_thumbnail("t.jpg", b"<html>404 page</html>".to_vec()).unwrap_err();
        assert!(matches!(err, Error::AssetDegradation(ref m) if m.contains("t.jpg")));
        // a bare JPEG signature with no image data is not enough
        assert!(decode_thumbnail("t.jpg", vec![0xff, 0xd8, 0xff, 0xe0]).is_err());
        assert_eq!(decode_thumbnail("t.png", png(2, 2)).unwrap().len(), png(2, 2).len());
    }
}
