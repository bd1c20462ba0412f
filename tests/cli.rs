use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

const BIN: &str = env!("CARGO_BIN_EXE_feature-dump");

fn scene(dir: &Path) -> PathBuf {
    let mut img = GrayImage::from_fn(120, 96, |x, y| Luma([(40 + (x + 2 * y) % 32) as u8]));
    draw_filled_rect_mut(&mut img, Rect::at(20, 20).of_size(30, 24), Luma([230]));
    draw_filled_circle_mut(&mut img, (85, 55), 12, Luma([5]));
    draw_filled_circle_mut(&mut img, (40, 72), 6, Luma([180]));
    let path = dir.join("scene.png");
    img.save(&path).unwrap();
    path
}

fn feature_dump(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

/// Parses a descriptor dump into its header and the per-line (keypoint, values) fields.
fn parse_dump(text: &str) -> ((usize, usize), Vec<(Vec<String>, Vec<String>)>) {
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    let (count, cols) = header.split_once(' ').unwrap();
    let rows = lines
        .map(|line| {
            assert!(line.ends_with(' '), "line without trailing space: {line:?}");
            let (kp, values) = line.split_once("   ").unwrap();
            (
                kp.split(' ').map(str::to_string).collect(),
                values.split_whitespace().map(str::to_string).collect(),
            )
        })
        .collect();
    ((count.parse().unwrap(), cols.parse().unwrap()), rows)
}

fn str_path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn dense_sift_dump_is_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let desc = dir.path().join("desc.txt");
    let out = feature_dump(&[
        "-d", "Dense", "-s", "SIFT", "-e", "12", "-V", "false",
        "-i", str_path(&input), "-p", str_path(&desc),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());

    let ((count, cols), rows) = parse_dump(&fs::read_to_string(&desc).unwrap());
    // x in 12..108, y in 12..84 with step 12
    assert_eq!(count, 8 * 6);
    assert_eq!(cols, 128);
    assert_eq!(rows.len(), count);
    for (kp, values) in &rows {
        assert_eq!(kp.len(), 4);
        assert_eq!(kp[2], "24");
        assert_eq!(kp[3], "-1");
        assert_eq!(values.len(), cols);
        assert!(values.iter().all(|v| v.parse::<f32>().is_ok()));
    }
    // column major
    assert_eq!(rows[0].0[..2], ["12", "12"]);
    assert_eq!(rows[1].0[..2], ["12", "24"]);
}

#[test]
fn sift_detector_finds_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let desc = dir.path().join("desc.txt");
    let out = feature_dump(&["-V", "false", "-i", str_path(&input), "-p", str_path(&desc)]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let ((count, cols), rows) = parse_dump(&fs::read_to_string(&desc).unwrap());
    assert!(count > 0);
    assert_eq!(cols, 128);
    assert_eq!(rows.len(), count);
    for (kp, values) in &rows {
        let angle: f32 = kp[3].parse().unwrap();
        assert!((0.0..360.0).contains(&angle));
        assert_eq!(values.len(), 128);
    }
}

#[test]
fn binary_descriptors_are_integers() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let desc = dir.path().join("desc.txt");
    let out = feature_dump(&[
        "-d", "FAST", "-s", "BRIEF", "-V", "false",
        "-i", str_path(&input), "-p", str_path(&desc),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let ((count, cols), rows) = parse_dump(&fs::read_to_string(&desc).unwrap());
    assert_eq!(cols, 32);
    assert_eq!(rows.len(), count);
    for (_, values) in &rows {
        assert_eq!(values.len(), 32);
        assert!(values.iter().all(|v| v.parse::<u8>().is_ok()));
    }
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    for (detector, descriptor) in [("Dense", "BRIEF"), ("SIFT", "SIFT")] {
        let dumps: Vec<Vec<u8>> = (0..2)
            .map(|i| {
                let desc = dir.path().join(format!("{detector}-{descriptor}-{i}.txt"));
                let out = feature_dump(&[
                    "-d", detector, "-s", descriptor, "-e", "8", "-V", "false",
                    "-i", str_path(&input), "-p", str_path(&desc),
                ]);
                assert!(out.status.success(), "{detector}+{descriptor}");
                fs::read(&desc).unwrap()
            })
            .collect();
        assert_eq!(dumps[0], dumps[1], "{detector}+{descriptor}");
        assert!(dumps[0].len() > 10);
    }
}

#[test]
fn no_outputs_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let out = feature_dump(&["-d", "Dense", "-V", "false", "-i", str_path(&input)]);
    assert!(out.status.success());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn annotated_image_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let annotated = dir.path().join("annotated.png");
    let out = feature_dump(&[
        "-d", "Dense", "-V", "false", "-i", str_path(&input), "-o", str_path(&annotated),
    ]);
    assert!(out.status.success());
    let img = image::open(&annotated).unwrap().into_rgb8();
    assert_eq!(img.dimensions(), (120, 96));
    assert!(img.pixels().any(|p| p.0[0] != p.0[1] || p.0[1] != p.0[2]));
}

#[test]
fn unsupported_detector_exits_with_minus_one() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let desc = dir.path().join("desc.txt");
    let out = feature_dump(&[
        "-d", "Nonexistent", "-V", "false",
        "-i", str_path(&input), "-p", str_path(&desc),
    ]);
    assert!(!out.status.success());
    #[cfg(unix)]
    assert_eq!(out.status.code(), Some(255));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Nonexistent"));
    assert!(!desc.exists());
}

#[test]
fn unsupported_descriptor_names_it() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let out = feature_dump(&["-s", "Bogus", "-V", "false", "-i", str_path(&input)]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("DescriptorExtractor failed for Bogus"));
}

#[test]
fn missing_input_prints_usage() {
    let out = feature_dump(&["-d", "SIFT"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("--input1"));
    assert!(stdout.contains("--descfile"));
}

#[test]
fn help_exits_with_one() {
    let out = feature_dump(&["--help"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("--densesize"));
}

#[test]
fn malformed_flags_exit_with_one() {
    for args in [
        &["-i", "x.png", "--bogus"][..],
        &["-i", "x.png", "-e", "0"],
        &["-i", "x.png", "-e", "abc"],
        &["-i", "x.png", "-V", "perhaps"],
    ] {
        let out = feature_dump(args);
        assert_eq!(out.status.code(), Some(1), "{args:?}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("Error!!!"));
    }
}

#[test]
fn unreadable_input_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let out = feature_dump(&[
        "-V", "false", "-i", str_path(&dir.path().join("missing.png")),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("missing.png"));
}

// With OpenCV the preview opens a real window and waits for a key.
#[cfg(not(feature = "opencv"))]
#[test]
fn verbose_reports_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let input = scene(dir.path());
    let desc = dir.path().join("desc.txt");
    let mut child = Command::new(BIN)
        .args([
            "-d", "Dense", "-s", "BRIEF", "-e", "8",
            "-i", str_path(&input), "-p", str_path(&desc),
        ])
        .env("RUST_LOG", "off")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .unwrap();
    // EOF answers the preview prompt
    drop(child.stdin.take());
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let ((count, _), _) = parse_dump(&fs::read_to_string(&desc).unwrap());
    assert!(stdout.starts_with(&format!(
        "Feature statistics:\n-- Features in scene1: {count}\nPress key to continue...\n"
    )));
    assert!(stdout.contains(&format!("Saving the descriptors to {}...", desc.display())));
}
