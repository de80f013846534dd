use super::*;
use crate::export::progress::{ProgressRange, RecordingProgress};
use crate::foundation::core::Fps;

/// Which command lines should "produce" a file.
#[derive(Debug, Default)]
struct FakeCodec {
    h264_works: bool,
    mpeg4_works: bool,
    probe_fails: bool,
    probes: usize,
    runs: Vec<Vec<String>>,
    frames_seen: Vec<usize>,
}

impl CodecBackend for FakeCodec {
    fn probe(&mut self) -> ScanResult<()> {
        self.probes += 1;
        if self.probe_fails {
            return Err(ScanError::encode("no codec"));
        }
        Ok(())
    }

    fn exec(&mut self, workdir: &Path, args: &[String]) -> ScanResult<()> {
        self.runs.push(args.to_vec());
        let frames = std::fs::read_dir(workdir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("frame_"))
            .count();
        self.frames_seen.push(frames);

        let out = workdir.join(args.last().unwrap());
        let works = if args.iter().any(|a| a == "libx264") {
            self.h264_works
        } else {
            self.mpeg4_works
        };
        if works {
            std::fs::write(out, b"fake-mp4").unwrap();
            Ok(())
        } else {
            std::fs::write(out, b"").unwrap();
            Err(ScanError::encode("codec unavailable"))
        }
    }
}

fn frame_set(count: usize) -> BuiltFrameSet {
    BuiltFrameSet {
        frames: vec![[10u8, 20, 30, 255].repeat(4 * 4); count],
        width: 4,
        height: 4,
        fps: Fps { num: 20, den: 1 },
        delay_ms: 50,
        duration_secs: count as f64 / 20.0,
        encode_range: ProgressRange::new(45, 100),
    }
}

fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn h264_success_cleans_up() {
    let mut engine = VideoEngine::new(FakeCodec {
        h264_works: true,
        ..FakeCodec::default()
    });
    let mut rec = RecordingProgress::default();
    let bytes = engine.encode_mp4(&frame_set(5), "out.mp4", &mut rec).unwrap();
    assert_eq!(bytes, b"fake-mp4");

    let runs = &engine.backend().runs;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0], h264_args(Fps { num: 20, den: 1 }, "out.mp4"));
    assert_eq!(engine.backend().frames_seen, vec![5]);

    let dir = engine.workdir().unwrap().to_path_buf();
    assert_eq!(leftover_files(&dir), 0);

    // write phase ends at 45 + round(55 * 0.7) = 84
    assert_eq!(rec.progress, vec![45, 61, 76, 84, 100]);
}

#[test]
fn falls_back_to_mpeg4_once() {
    let mut engine = VideoEngine::new(FakeCodec {
        mpeg4_works: true,
        ..FakeCodec::default()
    });
    let bytes = engine
        .encode_mp4(&frame_set(2), "clip.mp4", &mut RecordingProgress::default())
        .unwrap();
    assert_eq!(bytes, b"fake-mp4");
    let runs = &engine.backend().runs;
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1], mpeg4_args(Fps { num: 20, den: 1 }, "clip.mp4"));
    assert_eq!(leftover_files(engine.workdir().unwrap()), 0);
}

#[test]
fn double_empty_output_is_an_error_and_still_cleans_up() {
    let mut engine = VideoEngine::new(FakeCodec::default());
    let err = engine
        .encode_mp4(&frame_set(3), "x.mp4", &mut RecordingProgress::default())
        .unwrap_err();
    assert!(matches!(err, ScanError::Encode(_)));
    assert_eq!(engine.backend().runs.len(), 2);
    assert_eq!(leftover_files(engine.workdir().unwrap()), 0);
}

#[test]
fn load_is_idempotent_and_teardown_removes_dir() {
    let mut engine = VideoEngine::new(FakeCodec::default());
    assert!(!engine.is_loaded());
    let first = engine.load().unwrap().to_path_buf();
    let second = engine.load().unwrap().to_path_buf();
    assert_eq!(first, second);
    assert_eq!(engine.backend().probes, 1);
    assert!(first.is_dir());

    engine.teardown().unwrap();
    assert!(!engine.is_loaded());
    assert!(!first.exists());
    engine.teardown().unwrap();
}

#[test]
fn drop_removes_work_dir() {
    let dir = {
        let mut engine = VideoEngine::new(FakeCodec::default());
        engine.load().unwrap().to_path_buf()
    };
    assert!(!dir.exists());
}

#[test]
fn failed_probe_leaves_engine_unloaded() {
    let mut engine = VideoEngine::new(FakeCodec {
        probe_fails: true,
        ..FakeCodec::default()
    });
    assert!(engine.load().is_err());
    assert!(!engine.is_loaded());
    assert!(
        engine
            .encode_mp4(&frame_set(1), "a.mp4", &mut RecordingProgress::default())
            .is_err()
    );
}

#[test]
fn command_lines_match_encoder_contract() {
    let h264 = h264_args(Fps { num: 20, den: 1 }, "o.mp4").join(" ");
    assert_eq!(
        h264,
        "-y -framerate 20 -i frame_%05d.png -c:v libx264 -crf 14 -preset slow -pix_fmt yuv420p o.mp4"
    );
    let mpeg4 = mpeg4_args(Fps { num: 20, den: 1 }, "o.mp4").join(" ");
    assert_eq!(mpeg4, "-y -framerate 20 -i frame_%05d.png -c:v mpeg4 -q:v 2 o.mp4");
}

#[test]
fn fractional_rate_is_passed_exactly() {
    let ntsc = Fps::new(30000, 1001).unwrap();
    let h264 = h264_args(ntsc, "o.mp4");
    assert_eq!(&h264[1..3], ["-framerate", "30000/1001"]);
    let mpeg4 = mpeg4_args(ntsc, "o.mp4");
    assert_eq!(&mpeg4[1..3], ["-framerate", "30000/1001"]);
}
