use super::*;

#[test]
fn range_at_rounds_and_clamps() {
    let r = ProgressRange::new(10, 30);
    assert_eq!(r.span(), 20);
    assert_eq!(r.at(0.0), 10);
    assert_eq!(r.at(0.45), 19);
    assert_eq!(r.at(1.0), 30);
    assert_eq!(r.at(2.0), 30);
    assert_eq!(r.at(f64::NAN), 10);
}

#[test]
fn tasks_partition_the_bar() {
    let ranges: Vec<_> = (0..4).map(|i| ProgressRange::FULL.task(i, 4)).collect();
    assert_eq!(ranges[0], ProgressRange::new(0, 25));
    assert_eq!(ranges[3], ProgressRange::new(75, 100));
    for w in ranges.windows(2) {
        assert_eq!(w[0].end, w[1].start);
    }

    let thirds: Vec<_> = (0..3).map(|i| ProgressRange::FULL.task(i, 3)).collect();
    assert_eq!(thirds[0], ProgressRange::new(0, 33));
    assert_eq!(thirds[1], ProgressRange::new(33, 67));
    assert_eq!(thirds[2], ProgressRange::new(67, 100));
}

#[test]
fn inverted_range_collapses() {
    let r = ProgressRange::new(50, 40);
    assert_eq!(r.end, 50);
    assert_eq!(r.span(), 0);
}

#[test]
fn recording_sink_keeps_order() {
    let mut p = RecordingProgress::default();
    p.progress(3);
    p.capture_preview(Some(50));
    p.yield_now();
    p.capture_preview(None);
    p.progress(9);
    assert_eq!(p.progress, vec![3, 9]);
    assert_eq!(p.previews, vec![Some(50), None]);
    assert_eq!(p.yields, 1);

    let mut n = NoProgress;
    n.progress(1);
    n.capture_preview(Some(1));
    n.yield_now();
}
