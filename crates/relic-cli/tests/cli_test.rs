//! Integration tests for the relic binary

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use predicates::prelude::*;
use relic_test_utils::cabinet::{CabinetFixture, FixtureFile, FixtureGroup};
use relic_test_utils::movie::{MovieBuilder, pack_control};
use relic_test_utils::sample_bytes;

fn relic() -> Command {
    Command::cargo_bin("relic").unwrap()
}

fn plain_archive(files: &[&[u8]]) -> Vec<u8> {
    let mut out = b"BIFFV1  ".to_vec();
    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&20u32.to_le_bytes());
    let mut offset = (20 + files.len() * 16) as u32;
    for (i, data) in files.iter().enumerate() {
        out.extend_from_slice(&(i as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        offset += data.len() as u32;
    }
    for data in files {
        out.extend_from_slice(data);
    }
    out
}

fn key_file(archive: &str, resources: &[(&str, u16, u32)]) -> Vec<u8> {
    let names_offset = 24 + 12;
    let mut out = b"KEY V1  ".to_vec();
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(resources.len() as u32).to_le_bytes());
    out.extend_from_slice(&24u32.to_le_bytes());
    out.extend_from_slice(&((names_offset + archive.len() + 1) as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(names_offset as u32).to_le_bytes());
    out.extend_from_slice(&((archive.len() + 1) as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(archive.as_bytes());
    out.push(0);
    for (name, ty, locator) in resources {
        let mut raw = [0u8; 8];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        out.extend_from_slice(&raw);
        out.extend_from_slice(&ty.to_le_bytes());
        out.extend_from_slice(&locator.to_le_bytes());
    }
    out
}

fn movie() -> Vec<u8> {
    MovieBuilder::new()
        .timing(8_000, 125)
        .init_video(1, 1)
        .palette(0, &[[10, 0, 0], [0, 10, 0]])
        .end_chunk()
        .control(&pack_control(1, &[14]))
        .decode_blocks(0, 0, 1, 1, false, &[0])
        .show_frame()
        .end_chunk()
        .control(&pack_control(1, &[14]))
        .decode_blocks(0, 0, 1, 1, false, &[1])
        .show_frame()
        .finish()
}

#[test]
fn test_help_lists_commands() {
    relic()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bif"))
        .stdout(predicate::str::contains("key"))
        .stdout(predicate::str::contains("cab"))
        .stdout(predicate::str::contains("mve"));
}

#[test]
fn test_bif_get_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("movies.bif");
    std::fs::write(&archive, plain_archive(&[b"first", b"second"])).unwrap();

    let out = dir.path().join("second.bin");
    relic()
        .args(["bif", "get"])
        .arg(&archive)
        .args(["--index", "1", "-o"])
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out).unwrap(), b"second");

    relic()
        .args(["bif", "list", "--format", "json"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"Plain""#))
        .stdout(predicate::str::contains(r#""size":6"#));
}

#[test]
fn test_key_export_through_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(
        dir.path().join("data/movies.bif"),
        plain_archive(&[b"not a movie", &movie()]),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("chitin.key"),
        key_file("data\\MOVIES.BIF", &[("BLANK", 2, 0), ("INTRO", 2, 1)]),
    )
    .unwrap();

    relic()
        .args(["key", "list", "--type", "mve"])
        .arg(dir.path().join("chitin.key"))
        .assert()
        .success()
        .stdout(predicate::str::contains("INTRO.mve"));

    let out = dir.path().join("intro.mve");
    relic()
        .args(["key", "export"])
        .arg(dir.path().join("chitin.key"))
        .args(["intro", "mve", "-o"])
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out).unwrap(), movie());

    relic()
        .args(["key", "export"])
        .arg(dir.path().join("chitin.key"))
        .args(["intro", "xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource type"));
}

#[test]
fn test_cab_extract_and_install() {
    let dir = tempfile::tempdir().unwrap();
    let payload = sample_bytes(3000);
    CabinetFixture::new(900)
        .with_directories(&["", "Data"])
        .with_file(FixtureFile::new("Game.exe", 0, b"MZ".to_vec()))
        .with_file(FixtureFile::new("World.dat", 1, payload.clone()).compressed(1024))
        .with_group(FixtureGroup::new("Main", 0, 1).with_destination("<TARGETDIR>"))
        .with_component("Program", "", &["Main"])
        .split_at(1, 100)
        .write_to(dir.path())
        .unwrap();

    relic()
        .args(["cab", "list"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Data\\World.dat"));

    let out = dir.path().join("world.bin");
    relic()
        .args(["cab", "extract"])
        .arg(dir.path())
        .arg("1")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(std::fs::read(&out).unwrap(), payload);

    let target = tempfile::tempdir().unwrap();
    relic()
        .args(["cab", "install"])
        .arg(dir.path())
        .arg(target.path())
        .assert()
        .success();
    assert_eq!(std::fs::read(target.path().join("game.exe")).unwrap(), b"MZ");
    assert_eq!(
        std::fs::read(target.path().join("data/world.dat")).unwrap(),
        payload
    );
}

#[test]
fn test_cab_missing_header_fails() {
    let dir = tempfile::tempdir().unwrap();
    relic()
        .args(["cab", "list"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open cabinet"));
}

#[test]
fn test_mve_info_and_frames() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("intro.mve");
    std::fs::write(&file, movie()).unwrap();

    relic()
        .args(["mve", "info", "--format", "json"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""frames":2"#))
        .stdout(predicate::str::contains(r#""delay_ms":1000"#));

    let frames = dir.path().join("frames");
    relic()
        .args(["mve", "frames"])
        .arg(&file)
        .arg(&frames)
        .assert()
        .success();
    assert!(frames.join("frame_00000.png").is_file());
    assert!(frames.join("frame_00001.png").is_file());
    assert!(!frames.join("frame_00002.png").exists());
}
