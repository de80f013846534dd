use super::*;
use std::path::Path;

use crate::deliver::artifact::BUNDLE_NAME;
use crate::deliver::target::{NoShare, ShareResult};
use crate::export::progress::RecordingProgress;
use crate::foundation::core::{Canvas, Fps, Rgb8};
use crate::scene::build::Scene;
use crate::scene::layout::scene_for_viewport;
use crate::scene::source::SourceImage;
use crate::settings::normalize::Settings;

#[derive(Debug, Default)]
struct FakeCodec {
    fail: bool,
    runs: usize,
}

impl CodecBackend for FakeCodec {
    fn probe(&mut self) -> ScanResult<()> {
        Ok(())
    }

    fn exec(&mut self, workdir: &Path, args: &[String]) -> ScanResult<()> {
        self.runs += 1;
        if self.fail {
            return Err(ScanError::encode("broken codec"));
        }
        let name = args.last().map(String::as_str).unwrap_or("out.mp4");
        std::fs::write(workdir.join(name), b"mp4-bytes").unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct Collect(Vec<ExportArtifact>);

impl DownloadTarget for Collect {
    fn download(&mut self, file: &ExportArtifact) -> ScanResult<()> {
        self.0.push(file.clone());
        Ok(())
    }
}

struct Canceling;

impl ShareTarget for Canceling {
    fn share(&mut self, _files: &[ExportArtifact], _title: &str) -> ShareResult {
        ShareResult::Canceled
    }
}

struct Fixture {
    src: SourceImage,
    scene: Scene,
    settings: Settings,
}

impl Fixture {
    fn new() -> Self {
        let src =
            SourceImage::from_rgba8(16, 16, [90u8, 160, 200, 255].repeat(16 * 16)).unwrap();
        let scene = scene_for_viewport(
            &src,
            Canvas {
                width: 16,
                height: 16,
            },
            4.0,
        )
        .unwrap()
        .unwrap();
        Self {
            src,
            scene,
            settings: Settings::default(),
        }
    }

    fn inputs(&self) -> CaptureInputs<'_> {
        CaptureInputs {
            source: Some(&self.src),
            scene: Some(&self.scene),
            settings: &self.settings,
            theme: Rgb8::new(50, 255, 100),
            now_ms: 0.0,
        }
    }
}

fn short_config() -> ExportConfig {
    ExportConfig {
        seconds: 0.5,
        ..ExportConfig::default()
    }
}

fn exporter(fail: bool) -> Exporter<FakeCodec> {
    Exporter::new(
        short_config(),
        VideoEngine::new(FakeCodec {
            fail,
            ..FakeCodec::default()
        }),
    )
}

#[test]
fn tasks_are_format_major_without_duplicates() {
    let req = ExportRequest {
        formats: vec![ExportFormat::Gif, ExportFormat::Mp4, ExportFormat::Gif],
        types: vec![ExportType::Overlay, ExportType::Render],
    };
    assert_eq!(
        req.tasks(),
        vec![
            (ExportFormat::Gif, ExportType::Overlay),
            (ExportFormat::Gif, ExportType::Render),
            (ExportFormat::Mp4, ExportType::Overlay),
            (ExportFormat::Mp4, ExportType::Render),
        ]
    );
    assert_eq!(
        artifact_name(ExportFormat::Mp4, ExportType::Render),
        "scanfield-render.mp4"
    );
    assert_eq!(ExportType::Render.mode(), RenderMode::Composite);
    assert_eq!("GIF".parse::<ExportFormat>().unwrap(), ExportFormat::Gif);
    assert!("webm".parse::<ExportFormat>().is_err());
    assert_eq!("overlay".parse::<ExportType>().unwrap(), ExportType::Overlay);
}

#[test]
fn two_formats_are_zipped() {
    let fx = Fixture::new();
    let mut ex = exporter(false);
    let mut dl = Collect::default();
    let mut rec = RecordingProgress::default();
    let req = ExportRequest {
        formats: vec![ExportFormat::Gif, ExportFormat::Mp4],
        types: vec![ExportType::Overlay],
    };

    let outcome = ex.run(fx.inputs(), &req, &mut NoShare, &mut dl, &mut rec);
    assert_eq!(outcome, ExportOutcome::Downloaded);
    assert_eq!(dl.0.len(), 1);
    assert_eq!(dl.0[0].filename, BUNDLE_NAME);

    let archive = zip::ZipArchive::new(std::io::Cursor::new(dl.0[0].bytes.clone())).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["scanfield-overlay.gif", "scanfield-overlay.mp4"]);

    assert_eq!(rec.progress.first(), Some(&0));
    assert_eq!(rec.progress.last(), Some(&100));
    assert_eq!(rec.previews.last(), Some(&None));
    assert_eq!(ex.engine().backend().runs, 1);
}

#[test]
fn single_artifact_is_delivered_directly() {
    let fx = Fixture::new();
    let mut ex = exporter(false);
    let mut dl = Collect::default();
    let req = ExportRequest {
        formats: vec![ExportFormat::Gif],
        types: vec![ExportType::Render],
    };
    let outcome = ex.run(
        fx.inputs(),
        &req,
        &mut NoShare,
        &mut dl,
        &mut RecordingProgress::default(),
    );
    assert_eq!(outcome, ExportOutcome::Downloaded);
    assert_eq!(dl.0.len(), 1);
    assert_eq!(dl.0[0].filename, "scanfield-render.gif");
    assert_eq!(dl.0[0].media_type, "image/gif");
    assert!(!ex.engine().is_loaded());
    assert_eq!(outcome.note(false), "export file ready.");
}

#[test]
fn empty_selection_is_rejected_up_front() {
    let fx = Fixture::new();
    let mut ex = exporter(false);
    let mut rec = RecordingProgress::default();
    let outcome = ex.run(
        fx.inputs(),
        &ExportRequest {
            formats: vec![],
            types: vec![ExportType::Overlay],
        },
        &mut NoShare,
        &mut Collect::default(),
        &mut rec,
    );
    assert_eq!(outcome, ExportOutcome::Invalid("select at least one format".into()));
    assert!(rec.progress.is_empty());

    let outcome = ex.run(
        fx.inputs(),
        &ExportRequest {
            formats: vec![ExportFormat::Gif],
            types: vec![],
        },
        &mut NoShare,
        &mut Collect::default(),
        &mut rec,
    );
    assert_eq!(outcome, ExportOutcome::Invalid("select at least one type".into()));
}

#[test]
fn no_scene_means_nothing_to_export() {
    let fx = Fixture::new();
    let mut ex = exporter(false);
    let inputs = CaptureInputs {
        scene: None,
        ..fx.inputs()
    };
    let outcome = ex.run(
        inputs,
        &ExportRequest {
            formats: vec![ExportFormat::Gif],
            types: vec![ExportType::Overlay],
        },
        &mut NoShare,
        &mut Collect::default(),
        &mut RecordingProgress::default(),
    );
    assert_eq!(outcome, ExportOutcome::NothingToExport);
}

#[test]
fn codec_failure_maps_to_failed() {
    let fx = Fixture::new();
    let mut ex = exporter(true);
    let mut dl = Collect::default();
    let mut rec = RecordingProgress::default();
    let outcome = ex.run(
        fx.inputs(),
        &ExportRequest {
            formats: vec![ExportFormat::Mp4],
            types: vec![ExportType::Overlay],
        },
        &mut NoShare,
        &mut dl,
        &mut rec,
    );
    assert!(matches!(outcome, ExportOutcome::Failed(_)));
    assert!(dl.0.is_empty());
    assert_eq!(ex.engine().backend().runs, 2);
    assert_eq!(rec.previews.last(), Some(&None));
}

#[test]
fn unusable_config_maps_to_failed() {
    let fx = Fixture::new();
    for config in [
        ExportConfig {
            fps: Fps { num: 20, den: 0 },
            ..short_config()
        },
        ExportConfig {
            max_side: 1,
            ..short_config()
        },
    ] {
        let mut ex = Exporter::new(config, VideoEngine::new(FakeCodec::default()));
        let mut dl = Collect::default();
        let outcome = ex.run(
            fx.inputs(),
            &ExportRequest {
                formats: vec![ExportFormat::Gif],
                types: vec![ExportType::Render],
            },
            &mut NoShare,
            &mut dl,
            &mut RecordingProgress::default(),
        );
        assert!(matches!(outcome, ExportOutcome::Failed(_)));
        assert!(dl.0.is_empty());
    }
}

#[test]
fn canceled_share_is_reported() {
    let fx = Fixture::new();
    let mut ex = exporter(false);
    let mut dl = Collect::default();
    let outcome = ex.run(
        fx.inputs(),
        &ExportRequest {
            formats: vec![ExportFormat::Gif],
            types: vec![ExportType::Overlay],
        },
        &mut Canceling,
        &mut dl,
        &mut RecordingProgress::default(),
    );
    assert_eq!(outcome, ExportOutcome::Canceled);
    assert!(dl.0.is_empty());
}
