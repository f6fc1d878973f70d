use std::fs;
use std::path::{Path, PathBuf};

use face_patches::{DatasetBuilder, DatasetConfig, FsImageStore, IdAllocator, SourceSpec};
use image::{GenericImageView, Rgb, RgbImage};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("face-patches-it-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("failed to create {}: {e}", dir.display()));
    dir
}

fn save_image(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    img.save(path).unwrap();
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|r| r.flatten().count()).unwrap_or(0)
}

#[test]
fn builds_faces_and_nonfaces_across_sources() {
    let base = scratch_dir("full");
    save_image(&base.join("mom/m1.png"), 160, 120);
    save_image(&base.join("dad/d1.png"), 200, 200);
    save_image(&base.join("dad/d2.png"), 100, 100);
    fs::write(base.join("mom_annotations.txt"), "m1.png 10 10 40 50 mom\nmissing.png 0 0 5 5 mom\n").unwrap();
    fs::write(
        base.join("dad_annotations.txt"),
        "d1.png 20 20 60 60 dad\nd1.png 120 120 160 170\nd2.png 0 0 100 100 dad\n",
    )
    .unwrap();

    let cfg = DatasetConfig {
        base_dir: base.clone(),
        output_dir: base.join("out"),
        sources: vec![SourceSpec::from_folder("mom"), SourceSpec::from_folder("dad")],
        resize: [32, 32],
        seed: Some(1234),
        ..Default::default()
    };
    let mut ids = IdAllocator::new(cfg.first_face_id, cfg.first_nonface_id);
    let mut builder = DatasetBuilder::new(&cfg, FsImageStore::default(), StdRng::seed_from_u64(1234));
    let summary = builder.run(&mut ids).unwrap();

    assert_eq!(summary.sources.len(), 2);
    assert_eq!(summary.sources[0].images_skipped, 1);
    assert_eq!(summary.totals.faces_written, 4);
    // the whole-image face on d2 can never get a background patch
    assert!(summary.sources[1].nonfaces_exhausted >= 3);
    assert_eq!(
        summary.totals.nonfaces_written + summary.totals.nonfaces_exhausted,
        4 * cfg.patches_per_face as usize
    );

    let faces_dir = base.join("out/faces");
    let non_faces_dir = base.join("out/non_faces");
    assert_eq!(count_files(&faces_dir), 4);
    assert_eq!(count_files(&non_faces_dir), summary.totals.nonfaces_written);

    // numbering continues across sources
    for id in 1..=4 {
        let face = image::open(faces_dir.join(format!("{id}.jpg"))).unwrap();
        assert_eq!(face.dimensions(), (32, 32));
    }
    assert_eq!(summary.next_face_id, 5);
    assert_eq!(summary.next_nonface_id, 1 + summary.totals.nonfaces_written as u64);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn same_seed_gives_same_summary() {
    let base = scratch_dir("seeded");
    save_image(&base.join("deedee/a.png"), 120, 80);
    fs::write(base.join("deedee_annotations.txt"), "a.png 30 10 70 50 deedee\n").unwrap();

    let run = |out: &str| {
        let cfg = DatasetConfig {
            base_dir: base.clone(),
            output_dir: base.join(out),
            sources: vec![SourceSpec::from_folder("deedee")],
            ..Default::default()
        };
        let mut builder = DatasetBuilder::new(&cfg, FsImageStore::default(), StdRng::seed_from_u64(99));
        builder.run(&mut IdAllocator::default()).unwrap().totals
    };
    let first = run("out1");
    let second = run("out2");
    assert_eq!(first.nonfaces_written, second.nonfaces_written);
    assert_eq!(first.nonfaces_exhausted, second.nonfaces_exhausted);
    assert_eq!(first.faces_written, 1);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn config_file_round_trips_through_loader() {
    let base = scratch_dir("config");
    let path = base.join("dataset.json");
    fs::write(
        &path,
        r#"{"base_dir": "train", "sources": [{"folder": "mom", "annotations": "mom_annotations.txt"}], "resize": [48, 48]}"#,
    )
    .unwrap();
    let cfg = DatasetConfig::from_file(&path).unwrap();
    assert_eq!(cfg.resize, [48, 48]);
    assert_eq!(cfg.max_attempts, 10);
    assert!(cfg.validate().is_ok());

    fs::write(&path, "{not json").unwrap();
    assert!(DatasetConfig::from_file(&path).is_err());
    let _ = fs::remove_dir_all(&base);
}
