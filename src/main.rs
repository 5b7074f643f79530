use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use framerz::assets::{HttpAssetSource, HttpThumbnailLoader};
use framerz::platform::{MemoryVideo, ReadyState, UserAgentClassifier, VideoElement};
use framerz::scene::{HeadlessScene, Ndc, NdcRect};
use framerz::session::LoaderSurface;
use framerz::tracker::ScriptedTracker;
use framerz::{ArSession, PointerEvent, SessionConfig, SessionDeps, Viewport};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Replay a tracking timeline against a live asset payload, headless.
#[derive(Parser, Debug)]
#[command(name = "framerz", version, about)]
struct Args {
    /// Page URL carrying the slug, e.g. https://ar.example/?f=ABCDEF
    #[arg(long, conflicts_with = "slug")]
    page_url: Option<String>,

    /// Slug to use directly instead of a page URL
    #[arg(long)]
    slug: Option<String>,

    #[arg(long, default_value = framerz::DEFAULT_API_BASE)]
    api_base: String,

    #[arg(long)]
    user_agent: Option<String>,

    #[arg(long, default_value_t = 0)]
    touch_points: u8,

    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Natural video size as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    video_size: String,

    /// Window size as WIDTHxHEIGHT
    #[arg(long, default_value = "390x844")]
    viewport: String,

    /// Reject unmuted play until the first tap
    #[arg(long)]
    block_autoplay: bool,

    /// Comma-separated timeline: found, lost, tap[:X:Y], frame, tick
    #[arg(long, default_value = "found,tap,frame,tick,lost,found,tick")]
    events: String,
}

struct ConsoleSurface;

impl LoaderSurface for ConsoleSurface {
    fn hide_loader(&self) {
        println!("[ui] loader hidden");
    }

    fn set_loader_text(&self, text: &str) {
        println!("[ui] loader: {}", text);
    }

    fn set_title(&self, title: &str) {
        println!("[ui] title: {}", title);
    }

    fn alert(&self, message: &str) {
        println!("[ui] alert: {}", message);
    }
}

fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{}'", s))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn page_query(args: &Args) -> Result<String> {
    match (&args.page_url, &args.slug) {
        (Some(u), _) => {
            let url = url::Url::parse(u).with_context(|| format!("invalid page URL '{}'", u))?;
            Ok(url.query().unwrap_or_default().to_string())
        }
        (None, Some(s)) => Ok(url::form_urlencoded::Serializer::new(String::new())
            .append_pair("f", s)
            .finish()),
        (None, None) => Ok(String::new()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (vw, vh) = parse_size(&args.video_size)?;
    let (ww, wh) = parse_size(&args.viewport)?;

    let mut config = SessionConfig {
        api_base: args.api_base.clone(),
        timeout_ms: args.timeout_ms,
        touch_points: args.touch_points,
        viewport: Viewport { width: ww, height: wh },
        ..Default::default()
    };
    if let Some(ua) = &args.user_agent {
        config.user_agent = ua.clone();
    }

    let tracker = ScriptedTracker::new();
    let scene = HeadlessScene::new();
    let video = Arc::new(MemoryVideo::new());
    video.set_block_unmuted_play(args.block_autoplay);

    let deps = SessionDeps {
        assets: Arc::new(HttpAssetSource::from_config(&config)?),
        tracker: Box::new(tracker.clone()),
        scene: Box::new(scene.clone()),
        video: video.clone(),
        thumbnails: Arc::new(HttpThumbnailLoader::new(config.timeout_ms, &config.user_agent)?),
        surface: Arc::new(ConsoleSurface),
        classifier: Arc::new(UserAgentClassifier),
    };

    let session = ArSession::launch(&page_query(&args)?, config, deps)?;
    println!("policy: {:?}", session.policy());

    video.load_metadata(vw, vh);
    session.on_video_metadata()?;
    if session.policy().requires_gesture() {
        // thumbnail download completes on a background thread
        let deadline = Instant::now() + Duration::from_millis(args.timeout_ms);
        while !session.has_overlay() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }
    }
    let group = session.anchor().group();

    for raw in args.events.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = raw.split(':');
        match parts.next().unwrap_or_default() {
            "found" => {
                scene.set_projection(
                    group,
                    Some(NdcRect { min: Ndc { x: -0.5, y: -0.5 }, max: Ndc { x: 0.5, y: 0.5 } }),
                );
                tracker.found(0);
            }
            "lost" => {
                scene.set_projection(group, None);
                tracker.lost(0);
            }
            "tap" => {
                let x = parts.next().map(str::parse::<f32>).transpose()?.unwrap_or(ww as f32 / 2.0);
                let y = parts.next().map(str::parse::<f32>).transpose()?.unwrap_or(wh as f32 / 2.0);
                // a tap is a user activation, which lifts the autoplay block
                video.set_block_unmuted_play(false);
                let unlocked = session.pointer_down(PointerEvent::new(x, y));
                println!("tap ({}, {}) unlocked={}", x, y, unlocked);
            }
            "frame" => video.set_ready_state(ReadyState::HaveEnoughData),
            "tick" => {
                let marked = session.tick();
                println!("tick texture_marked={} renders={}", marked, scene.renders());
            }
            other => bail!("unknown event '{}'", other),
        }
        println!(
            "{:<8} state={:?} overlay={:?} muted={} paused={}",
            raw,
            session.playback_state(),
            session.overlay_visibility(),
            video.muted(),
            video.paused()
        );
    }

    session.close();
    Ok(())
}
