use omnipack::{CompressRequest, DecompressRequest, Engine, Format};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper: a directory with random binary files, a text file and an empty subdirectory.
fn create_test_tree(root: &Path) -> std::io::Result<PathBuf> {
    let dir = root.join("payload");
    fs::create_dir_all(dir.join("nested").join("deeper"))?;
    fs::create_dir_all(dir.join("empty"))?;
    let mut rng = StdRng::seed_from_u64(7);
    for (i, size) in [0usize, 1, 4096, 70_000].into_iter().enumerate() {
        let mut buffer = vec![0u8; size];
        rng.fill(&mut buffer[..]);
        File::create(dir.join(format!("blob_{}.bin", i)))?.write_all(&buffer)?;
    }
    fs::write(dir.join("nested").join("readme.txt"), "plain text ".repeat(500))?;
    fs::write(dir.join("nested").join("deeper").join("z.dat"), [9u8; 300])?;
    Ok(dir)
}

// Helper: compares every file under `expected` with its counterpart under `actual`.
fn assert_trees_equal(expected: &Path, actual: &Path) {
    for entry in walkdir::WalkDir::new(expected) {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(expected).unwrap();
        let other = actual.join(relative);
        if entry.file_type().is_dir() {
            assert!(other.is_dir(), "missing directory {:?}", other);
        } else {
            assert_eq!(fs::read(entry.path()).unwrap(), fs::read(&other).unwrap(), "content differs: {:?}", relative);
        }
    }
}

#[test]
fn containers_round_trip_at_both_level_extremes_with_and_without_password() {
    let src = tempdir().unwrap();
    let tree = create_test_tree(src.path()).unwrap();
    let engine = Engine::default();

    for tag in ["zip", "7z"] {
        for level in [0, 9] {
            for password in [None, Some("secret")] {
                let out = tempdir().unwrap();
                let mut request = CompressRequest::new([&tree], out.path(), tag).name("bundle").level(level);
                if let Some(pw) = password {
                    request = request.password(pw);
                }
                let outcome = engine.compress(&request).unwrap();
                assert_eq!(outcome.path, out.path().canonicalize().unwrap().join(format!("bundle.{}", tag)));

                let dest = tempdir().unwrap();
                let mut unpack = DecompressRequest::new(&outcome.path).dest_dir(dest.path());
                if let Some(pw) = password {
                    unpack = unpack.password(pw);
                }
                engine.decompress(&unpack).unwrap();

                assert_trees_equal(&tree, &dest.path().join("payload"));
            }
        }
    }
}

#[test]
fn single_stream_codecs_round_trip_and_ignore_passwords() {
    let src = tempdir().unwrap();
    let input = src.path().join("data.bin");
    let mut payload = vec![0u8; 100_000];
    StdRng::seed_from_u64(11).fill(&mut payload[..]);
    fs::write(&input, &payload).unwrap();
    let engine = Engine::default();

    for tag in ["gz", "bz2", "xz"] {
        for level in [0, 9] {
            for password in [None, Some("secret")] {
                let out = tempdir().unwrap();
                let mut request = CompressRequest::new([&input], out.path(), tag).name("data.bin").level(level);
                if let Some(pw) = password {
                    request = request.password(pw);
                }
                let outcome = engine.compress(&request).unwrap();
                assert_eq!(outcome.entries, 1);

                let dest = tempdir().unwrap();
                // The password given back is irrelevant for these formats.
                let outcome = engine
                    .decompress(&DecompressRequest::new(&outcome.path).dest_dir(dest.path()).password("other"))
                    .unwrap();
                assert_eq!(outcome.written, vec![dest.path().join("data.bin")]);
                assert_eq!(fs::read(dest.path().join("data.bin")).unwrap(), payload, "{} level {}", tag, level);
            }
        }
    }
}

#[test]
fn multiple_inputs_share_the_archive_root() {
    let src = tempdir().unwrap();
    let tree = create_test_tree(src.path()).unwrap();
    let loose = src.path().join("loose.txt");
    fs::write(&loose, b"loose").unwrap();

    let engine = Engine::default();
    for tag in ["zip", "7z"] {
        let out = tempdir().unwrap();
        let archive = engine.compress(&CompressRequest::new([&tree, &loose], out.path(), tag).name("multi")).unwrap().path;
        let names: Vec<_> = engine.list(&archive, None).unwrap().into_iter().map(|e| e.name).collect();
        assert!(names.contains(&"loose.txt".to_string()), "{:?}", names);
        assert!(names.contains(&"payload/nested/readme.txt".to_string()), "{:?}", names);
        assert!(names.contains(&"payload/empty".to_string()), "{:?}", names);

        let dest = tempdir().unwrap();
        engine.decompress(&DecompressRequest::new(&archive).dest_dir(dest.path())).unwrap();
        assert_eq!(fs::read(dest.path().join("loose.txt")).unwrap(), b"loose");
        assert!(dest.path().join("payload").join("empty").is_dir());
    }
}

#[test]
fn archive_written_inside_its_own_input_is_not_included() {
    let src = tempdir().unwrap();
    let tree = create_test_tree(src.path()).unwrap();
    let engine = Engine::default();

    for format in [Format::Zip, Format::SevenZ] {
        let archive = engine
            .compress(&CompressRequest::new([&tree], &tree, format.tag()).name("self"))
            .unwrap()
            .path;
        let names: Vec<_> = engine.list(&archive, None).unwrap().into_iter().map(|e| e.name).collect();
        assert!(!names.iter().any(|n| n.ends_with(&format!("self.{}", format.extension()))), "{:?}", names);
        fs::remove_file(&archive).unwrap();
    }
}
