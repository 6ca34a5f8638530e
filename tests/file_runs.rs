//! End-to-end sampling against real files.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use renzoku::{sample_runs_with_rng, DirFilerFactory, FilerSink, Sink, Slot};
use std::path::Path;

fn line(i: u32) -> Vec<u8> {
    format!("{i:08}\n").into_bytes()
}

fn read_lines(path: &str) -> Vec<u32> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.parse().unwrap())
        .collect()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn two_file_sinks_commit_independent_full_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut slots = vec![
        Slot::new(FilerSink::new(DirFilerFactory::new(dir.path(), "s0")), 15),
        Slot::new(FilerSink::new(DirFilerFactory::new(dir.path(), "s1")), 15),
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(123);
    sample_runs_with_rng((0..100_000).map(line), &mut slots, &mut rng).unwrap();

    let mut names = Vec::new();
    for slot in &mut slots {
        let name = slot
            .sink_mut()
            .finalize()
            .unwrap()
            .expect("100k records always fill a 15-record run");
        let picked = read_lines(&name);
        assert_eq!(picked.len(), 15);
        for pair in picked.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "run is not contiguous in {name}");
        }
        names.push(name);
    }
    assert_ne!(names[0], names[1]);

    // Only the two committed files survive; reverted and superseded runs
    // are gone from disk.
    assert_eq!(files_in(dir.path()).len(), 2);
}

#[test]
fn short_stream_leaves_the_directory_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut slots = vec![Slot::new(
        FilerSink::new(DirFilerFactory::new(dir.path(), "s")),
        15,
    )];

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    sample_runs_with_rng((0..5).map(line), &mut slots, &mut rng).unwrap();

    assert_eq!(slots[0].sink_mut().finalize().unwrap(), None);
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn exactly_one_committed_file_remains_per_sink() {
    let dir = tempfile::tempdir().unwrap();
    let mut slots = vec![Slot::new(
        FilerSink::new(DirFilerFactory::new(dir.path(), "s")),
        3,
    )];

    let mut rng = ChaCha8Rng::seed_from_u64(99);
    sample_runs_with_rng((0..2_000).map(line), &mut slots, &mut rng).unwrap();

    let name = slots[0].sink_mut().finalize().unwrap().unwrap();
    let files = files_in(dir.path());
    assert_eq!(files.len(), 1);
    assert!(name.ends_with(&files[0]));
    assert_eq!(read_lines(&name).len(), 3);
}
