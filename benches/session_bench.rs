use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use framerz::frame_sync::FrameSync;
use framerz::platform::{MemoryVideo, ReadyState};
use framerz::rendering::{render_overlay, OverlayLayout};
use framerz::scene::{HeadlessScene, Material, Mesh, PlaneGeometry, SceneHost, SceneNode, VideoTexture, GroupId};

fn bench_render_overlay(c: &mut Criterion) {
    let layout = OverlayLayout::new(512, "TAP TO PLAY");
    c.bench_function("render_overlay_512", |b| {
        b.iter(|| black_box(render_overlay(&layout)))
    });
}

fn bench_frame_sync_tick(c: &mut Criterion) {
    let video = MemoryVideo::new();
    video.load_metadata(1920, 1080);
    video.set_ready_state(ReadyState::HaveEnoughData);

    let texture = Arc::new(VideoTexture::new());
    let mut scene = HeadlessScene::new();
    let geometry = PlaneGeometry::from_video_size(1920, 1080).unwrap();
    scene.attach(
        GroupId(0),
        SceneNode::Mesh(Mesh { geometry, material: Material::Video(texture.clone()), depth: 0.0 }),
    );
    let sync = FrameSync::new(texture);

    c.bench_function("frame_sync_tick", |b| {
        b.iter(|| black_box(sync.tick(&video, &mut scene)))
    });
}

criterion_group!(benches, bench_render_overlay, bench_frame_sync_tick);
criterion_main!(benches);
