use super::*;
use crate::export::progress::RecordingProgress;
use crate::scene::layout::scene_for_viewport;

fn gray(w: u32, h: u32) -> SourceImage {
    SourceImage::from_rgba8(w, h, [128u8, 128, 128, 255].repeat((w * h) as usize)).unwrap()
}

fn scene_for(src: &SourceImage, side: u32) -> Scene {
    scene_for_viewport(
        src,
        Canvas {
            width: side,
            height: side,
        },
        Settings::default().block_size,
    )
    .unwrap()
    .unwrap()
}

#[test]
fn default_clip_is_sixty_frames() {
    let src = gray(64, 64);
    let scene = scene_for(&src, 64);
    let settings = Settings::default();
    let inputs = CaptureInputs {
        source: Some(&src),
        scene: Some(&scene),
        settings: &settings,
        theme: Rgb8::new(50, 255, 100),
        now_ms: 1234.0,
    };

    let set = capture_frames(
        inputs,
        RenderMode::Composite,
        &ExportConfig::default(),
        ProgressRange::FULL,
        &mut RecordingProgress::default(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(set.frames.len(), 60);
    assert!(set.frames.iter().all(|f| f.len() == 64 * 64 * 4));
    assert_eq!((set.width, set.height), (64, 64));
    assert_eq!(set.delay_ms, 50);
    assert_eq!(set.duration_secs, 3.0);
    assert_eq!(set.encode_range, ProgressRange::new(45, 100));
}

#[test]
fn duration_respects_cap_and_floor() {
    let capped = ExportConfig {
        max_seconds: Some(1.0),
        ..ExportConfig::default()
    };
    assert_eq!(capped.duration_secs(), 1.0);

    let tiny = ExportConfig {
        seconds: 0.1,
        ..ExportConfig::default()
    };
    assert_eq!(tiny.duration_secs(), 0.5);

    let tiny_cap = ExportConfig {
        max_seconds: Some(0.0),
        ..ExportConfig::default()
    };
    assert_eq!(tiny_cap.duration_secs(), 0.5);
    assert_eq!(tiny_cap.fps.frames_for_secs(tiny_cap.duration_secs()), 10);
}

#[test]
fn dimensions_are_even_and_bounded() {
    assert_eq!(export_dimensions(64, 64, 1920), (64, 64));
    assert_eq!(export_dimensions(101, 57, 1920), (100, 56));
    assert_eq!(export_dimensions(4000, 2000, 1920), (1920, 960));
    assert_eq!(export_dimensions(3001, 1999, 1920), (1920, 1278));
    assert_eq!(export_dimensions(1, 1, 1920), (2, 2));

    for (w, h) in [(7, 5), (2500, 2501), (1921, 3), (640, 479)] {
        let (ew, eh) = export_dimensions(w, h, 1920);
        assert_eq!(ew % 2, 0);
        assert_eq!(eh % 2, 0);
        assert!(ew <= 1920 && eh <= 1920);
    }
}

#[test]
fn dimensions_stay_within_smallest_max_side() {
    for max_side in [2, 3] {
        for (w, h) in [(64, 64), (64, 33), (100, 7), (1, 1), (3, 2)] {
            let (ew, eh) = export_dimensions(w, h, max_side);
            assert_eq!((ew % 2, eh % 2), (0, 0));
            assert!(ew <= max_side && eh <= max_side, "{ew}x{eh} over {max_side}");
        }
    }
}

fn capture_with(config: ExportConfig) -> ScanResult<Option<BuiltFrameSet>> {
    let src = gray(16, 16);
    let scene = scene_for(&src, 16);
    let settings = Settings::default();
    capture_frames(
        CaptureInputs {
            source: Some(&src),
            scene: Some(&scene),
            settings: &settings,
            theme: Rgb8::new(50, 255, 100),
            now_ms: 0.0,
        },
        RenderMode::Overlay,
        &config,
        ProgressRange::FULL,
        &mut RecordingProgress::default(),
    )
}

#[test]
fn zero_fps_is_rejected() {
    for fps in [Fps { num: 20, den: 0 }, Fps { num: 0, den: 1 }] {
        let err = capture_with(ExportConfig {
            fps,
            ..ExportConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)), "{err}");
    }
}

#[test]
fn max_side_below_two_is_rejected() {
    for max_side in [0, 1] {
        let config = ExportConfig {
            max_side,
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(capture_with(config), Err(ScanError::Validation(_))));
    }

    let set = capture_with(ExportConfig {
        seconds: 0.5,
        max_side: 2,
        ..ExportConfig::default()
    })
    .unwrap()
    .unwrap();
    assert_eq!((set.width, set.height), (2, 2));
}

#[test]
fn overlay_motion_packs_cycles() {
    assert_eq!(motion_scale(RenderMode::Composite, 3, 9000.0, 3000.0), 1.0);
    assert_eq!(motion_scale(RenderMode::Overlay, 3, 9000.0, 3000.0), 9.0);
    assert_eq!(motion_scale(RenderMode::Overlay, 3, 100.0, 3000.0), 1.0);
    assert_eq!(motion_scale(RenderMode::Overlay, 3, f64::INFINITY, 3000.0), 1.0);
    assert_eq!(motion_scale(RenderMode::Overlay, 3, 0.0, 3000.0), 1.0);
}

#[test]
fn missing_scene_or_source_yields_none() {
    let src = gray(8, 8);
    let settings = Settings::default();
    let inputs = CaptureInputs {
        source: Some(&src),
        scene: None,
        settings: &settings,
        theme: Rgb8::new(0, 0, 0),
        now_ms: 0.0,
    };
    let out = capture_frames(
        inputs,
        RenderMode::Overlay,
        &ExportConfig::default(),
        ProgressRange::FULL,
        &mut RecordingProgress::default(),
    )
    .unwrap();
    assert!(out.is_none());

    let scene = scene_for(&src, 8);
    let out = capture_frames(
        CaptureInputs {
            source: None,
            scene: Some(&scene),
            ..inputs
        },
        RenderMode::Overlay,
        &ExportConfig::default(),
        ProgressRange::FULL,
        &mut RecordingProgress::default(),
    )
    .unwrap();
    assert!(out.is_none());
}

#[test]
fn progress_stays_inside_capture_share() {
    let src = gray(32, 32);
    let scene = scene_for(&src, 32);
    let settings = Settings::default();
    let mut rec = RecordingProgress::default();
    let range = ProgressRange::new(50, 100);

    capture_frames(
        CaptureInputs {
            source: Some(&src),
            scene: Some(&scene),
            settings: &settings,
            theme: Rgb8::new(255, 50, 50),
            now_ms: 0.0,
        },
        RenderMode::Overlay,
        &ExportConfig::default(),
        range,
        &mut rec,
    )
    .unwrap()
    .unwrap();

    assert_eq!(rec.progress.len(), 30);
    assert_eq!(rec.yields, 30);
    assert_eq!(rec.progress[0], 50);
    assert!(rec.progress.iter().all(|&p| (50..=73).contains(&p)));
    assert!(rec.progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(rec.previews.first(), Some(&Some(0)));
    assert_eq!(rec.previews.last(), Some(&Some(100)));
}

#[test]
fn session_snapshot_uses_last_tick() {
    let mut session = PreviewSession::new(
        Canvas {
            width: 16,
            height: 16,
        },
        Settings::default(),
        crate::settings::theme::Theme::Cyan,
    );
    let fresh = CaptureInputs::from_session(&session, 99.0);
    assert!(fresh.scene.is_none());
    assert_eq!(fresh.now_ms, 99.0);

    session.set_source(gray(16, 16)).unwrap();
    session.start(0.0);
    session.tick(500.0).unwrap();
    let snap = CaptureInputs::from_session(&session, 99.0);
    assert_eq!(snap.now_ms, 500.0);
    assert_eq!(snap.theme, Rgb8::new(0, 255, 240));
    assert!(snap.scene.is_some());
}
