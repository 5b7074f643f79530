//! Asset service and thumbnail retrieval over real HTTP.
#![cfg(feature = "http")]

use framerz::assets::{AssetSource, HttpAssetSource, HttpThumbnailLoader, ThumbnailLoader, RETRIEVAL_ALERT};
use framerz::overlay::Backing;
use framerz::platform::{FixedPolicy, GesturePolicy, MemoryVideo};
use framerz::scene::HeadlessScene;
use framerz::session::{RecordingSurface, INIT_FAILED_TEXT};
use framerz::tracker::ScriptedTracker;
use framerz::{ArSession, Error, SessionConfig, SessionDeps, Slug};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};
use tiny_http::{Header, Response, Server};

const PAYLOAD: &str = r#"{
    "mind_file_url": "https://cdn.example/targets.mind",
    "video_url": "https://cdn.example/clip.mp4",
    "thumbnail_url": "",
    "customer_name": "Acme Posters"
}"#;

/// Serve every request from `route` on an ephemeral port; returns the base URL.
fn start_server(route: fn(&str) -> (u16, Vec<u8>)) -> String {
    let server = Server::http("127.0.0.1:0").expect("bind test server");
    let addr = server.server_addr().to_ip().expect("ip listener");
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let (status, body) = route(request.url());
            let resp = Response::from_data(body)
                .with_status_code(status)
                .with_header("Content-Type: application/json".parse::<Header>().unwrap());
            let _ = request.respond(resp);
        }
    });
    format!("http://{}", addr)
}

fn assets_route(url: &str) -> (u16, Vec<u8>) {
    match url {
        "/api?slug=ABCDEF" => (200, PAYLOAD.as_bytes().to_vec()),
        "/api?slug=BROKEN" => (200, b"{not json".to_vec()),
        "/api?slug=NOURLS" => (200, br#"{"mind_file_url":"","video_url":""}"#.to_vec()),
        "/thumb.png" => (200, png()),
        "/error-page.jpg" => (200, b"<html><body>Service unavailable</body></html>".to_vec()),
        _ => (404, b"{\"error\":\"not found\"}".to_vec()),
    }
}

fn png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 255])));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn source(base: &str) -> HttpAssetSource {
    HttpAssetSource::new(&format!("{}/api", base), 5_000, "framerz-tests").expect("client")
}

#[test]
fn fetches_and_decodes_asset_payload() {
    let base = start_server(assets_route);
    let asset = source(&base).fetch(&Slug::parse("ABCDEF").unwrap()).expect("fetch");
    assert_eq!(asset.mind_url, "https://cdn.example/targets.mind");
    assert_eq!(asset.video_url, "https://cdn.example/clip.mp4");
    assert_eq!(asset.thumbnail_url, None);
    assert_eq!(asset.title("AR Experience"), "Acme Posters");
}

#[test]
fn non_success_status_is_retrieval_error() {
    let base = start_server(assets_route);
    let err = source(&base).fetch(&Slug::parse("ZZZZZZ").unwrap()).unwrap_err();
    assert!(matches!(err, Error::RetrievalError(ref m) if m.contains("404")), "{:?}", err);
}

#[test]
fn malformed_and_incomplete_payloads_are_retrieval_errors() {
    let base = start_server(assets_route);
    let src = source(&base);
    for slug in ["BROKEN", "NOURLS"] {
        let err = src.fetch(&Slug::parse(slug).unwrap()).unwrap_err();
        assert!(matches!(err, Error::RetrievalError(_)), "{}: {:?}", slug, err);
    }
}

#[test]
fn unreachable_service_is_retrieval_error() {
    // nothing listens on the discard port
    let src = HttpAssetSource::new("http://127.0.0.1:9/api", 500, "framerz-tests").unwrap();
    let err = src.fetch(&Slug::parse("ABCDEF").unwrap()).unwrap_err();
    assert!(matches!(err, Error::RetrievalError(_)));
}

#[test]
fn invalid_api_base_is_rejected_up_front() {
    assert!(matches!(HttpAssetSource::new("not a url", 1_000, "ua"), Err(Error::Other(_))));
}

#[test]
fn failed_fetch_surfaces_alert_and_failure_text() {
    let base = start_server(assets_route);
    let surface = Arc::new(RecordingSurface::new());
    let tracker = ScriptedTracker::new();
    let config = SessionConfig { api_base: format!("{}/api", base), ..Default::default() };
    let deps = SessionDeps {
        assets: Arc::new(HttpAssetSource::from_config(&config).unwrap()),
        tracker: Box::new(tracker.clone()),
        scene: Box::new(HeadlessScene::new()),
        video: Arc::new(MemoryVideo::new()),
        thumbnails: Arc::new(HttpThumbnailLoader::new(1_000, "framerz-tests").unwrap()),
        surface: surface.clone(),
        classifier: Arc::new(FixedPolicy(GesturePolicy::AutoplayAllowed)),
    };

    let res = ArSession::launch("?f=QQQQQQ", config, deps);
    assert!(matches!(res, Err(Error::RetrievalError(_))));
    assert!(!tracker.is_started());
    let snap = surface.snapshot();
    assert_eq!(snap.alerts, vec![RETRIEVAL_ALERT.to_string()]);
    assert_eq!(snap.loader_text, INIT_FAILED_TEXT);
}

#[test]
fn thumbnail_loader_reports_bytes_and_failures() {
    let base = start_server(assets_route);
    let loader = HttpThumbnailLoader::new(5_000, "framerz-tests").unwrap();
    let (tx, rx) = mpsc::channel();

    for (which, path) in [("ok", "/thumb.png"), ("missing", "/missing.jpg"), ("html", "/error-page.jpg")] {
        let tx = tx.clone();
        loader.load(&format!("{}{}", base, path), Box::new(move |res| tx.send((which, res)).unwrap()));
    }

    for _ in 0..3 {
        let (which, res) = rx.recv_timeout(Duration::from_secs(10)).expect("callback");
        match which {
            "ok" => assert_eq!(res.unwrap().as_slice(), png().as_slice()),
            _ => assert!(matches!(res, Err(Error::AssetDegradation(_))), "{}", which),
        }
    }
}

#[test]
fn gesture_session_waits_for_remote_thumbnail() {
    let base = start_server(assets_route);
    let surface = Arc::new(RecordingSurface::new());
    let video = Arc::new(MemoryVideo::new());
    let deps = SessionDeps {
        assets: Arc::new(framerz::assets::StaticAssetSource::new(framerz::MediaAsset {
            mind_url: "https://cdn.example/targets.mind".into(),
            video_url: "https://cdn.example/clip.mp4".into(),
            thumbnail_url: Some(format!("{}/thumb.png", base)),
            customer_name: None,
        })),
        tracker: Box::new(ScriptedTracker::new()),
        scene: Box::new(HeadlessScene::new()),
        video: video.clone(),
        thumbnails: Arc::new(HttpThumbnailLoader::new(5_000, "framerz-tests").unwrap()),
        surface,
        classifier: Arc::new(FixedPolicy(GesturePolicy::RequiresGesture)),
    };

    let session = ArSession::launch("?f=ABCDEF", SessionConfig::default(), deps).unwrap();
    video.load_metadata(640, 360);
    session.on_video_metadata().unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !session.has_overlay() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(matches!(session.overlay_backing(), Some(Backing::Thumbnail { .. })));
}
