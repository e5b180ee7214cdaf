use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_cli_compress_list_decompress_cycle() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Setup: a directory with a nested file
    let source_dir = tempdir()?;
    let project = source_dir.path().join("project");
    fs::create_dir_all(project.join("nested"))?;
    let mut file1 = fs::File::create(project.join("file1.txt"))?;
    writeln!(file1, "Hello, this is the first file.")?;
    fs::write(project.join("nested").join("data.bin"), [0u8, 1, 2, 3, 4, 5])?;

    let archive_dir = tempdir()?;

    // 2. Compress
    let mut cmd = Command::cargo_bin("omnipack")?;
    cmd.arg("compress")
        .arg(&project)
        .arg("-o")
        .arg(archive_dir.path())
        .arg("-f")
        .arg("7z")
        .arg("--name")
        .arg("snapshot")
        .env_remove("OMNIPACK_PASSWORD")
        .env_remove("OMNIPACK_LEVEL");
    cmd.assert().success().stdout(predicate::str::contains("snapshot.7z"));
    let archive_path = archive_dir.path().join("snapshot.7z");
    assert!(archive_path.exists());

    // 3. List
    let mut cmd = Command::cargo_bin("omnipack")?;
    cmd.arg("list").arg(&archive_path);
    cmd.assert().success().stdout(
        predicate::str::contains("project/file1.txt").and(predicate::str::contains("project/nested/data.bin")),
    );

    // 4. Decompress
    let extract_dir = tempdir()?;
    let mut cmd = Command::cargo_bin("omnipack")?;
    cmd.arg("x").arg(&archive_path).arg("-o").arg(extract_dir.path());
    cmd.assert().success();

    assert_eq!(
        fs::read_to_string(extract_dir.path().join("project/file1.txt"))?,
        "Hello, this is the first file.\n"
    );
    assert_eq!(fs::read(extract_dir.path().join("project/nested/data.bin"))?, vec![0u8, 1, 2, 3, 4, 5]);
    Ok(())
}

#[test]
fn test_cli_password_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("secret.txt");
    fs::write(&input, "classified")?;

    Command::cargo_bin("omnipack")?
        .args(["c", "-f", "zip", "--name", "locked"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path())
        .env("OMNIPACK_PASSWORD", "hunter2")
        .assert()
        .success();
    let archive = dir.path().join("locked.zip");

    let out = tempdir()?;
    Command::cargo_bin("omnipack")?
        .arg("x")
        .arg(&archive)
        .arg("-o")
        .arg(out.path())
        .env_remove("OMNIPACK_PASSWORD")
        .env_remove("RUST_LOG")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:").and(predicate::str::contains("password")));

    Command::cargo_bin("omnipack")?
        .arg("x")
        .arg(&archive)
        .arg("-o")
        .arg(out.path())
        .env("OMNIPACK_PASSWORD", "hunter2")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(out.path().join("secret.txt"))?, "classified");
    Ok(())
}

#[test]
fn test_cli_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("log.txt");
    fs::write(&input, "line\n".repeat(100))?;

    let output = Command::cargo_bin("omnipack")?
        .args(["compress", "-f", "xz", "--level", "12", "--json"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path())
        .env_remove("OMNIPACK_LEVEL")
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["format"], "xz");
    assert_eq!(report["level"], 9);
    assert_eq!(report["entries"], 1);
    assert_eq!(report["bytes_in"], 500);
    assert!(report["path"].as_str().unwrap().ends_with(".xz"));
    Ok(())
}

#[test]
fn test_cli_level_from_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("a.txt");
    fs::write(&input, "a")?;

    Command::cargo_bin("omnipack")?
        .args(["compress", "-f", "gz", "--json"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path())
        .env("OMNIPACK_LEVEL", "2")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"level\": 2"));

    Command::cargo_bin("omnipack")?
        .args(["compress", "-f", "gz"])
        .arg(&input)
        .arg("-o")
        .arg(dir.path())
        .env("OMNIPACK_LEVEL", "fast")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OMNIPACK_LEVEL"));
    Ok(())
}

#[test]
fn test_cli_errors_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "a")?;
    fs::write(&b, "b")?;

    Command::cargo_bin("omnipack")?
        .args(["compress", "-f", "bz2"])
        .arg(&a)
        .arg(&b)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("bzip2 compresses exactly one file"));

    Command::cargo_bin("omnipack")?
        .args(["compress", "-f", "rar"])
        .arg(&a)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format 'rar'"));

    Command::cargo_bin("omnipack")?
        .arg("decompress")
        .arg(dir.path().join("missing.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.zip"));
    Ok(())
}

#[test]
fn test_cli_formats_lists_every_tag() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("omnipack")?;
    cmd.arg("formats");
    cmd.assert().success().stdout(
        predicate::str::contains("zip")
            .and(predicate::str::contains("7z"))
            .and(predicate::str::contains(".gz"))
            .and(predicate::str::contains(".bz2"))
            .and(predicate::str::contains(".xz"))
            .and(predicate::str::contains("AES-256")),
    );
    Ok(())
}
