use alamo_meg::{
    error::{CorruptionError, Error},
    BuildEntry, BuildOptions, DuplicatePolicy, EngineNormalizer, MegArchive, MegBuilder,
};
use miette::{IntoDiagnostic, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};
use tracing_test::traced_test;

fn source_archive(dir: &Path) -> Result<std::path::PathBuf> {
    let files = [
        ("a.txt", b"alpha".as_slice()),
        ("b.txt", b"bravo!".as_slice()),
        ("test.txt", b"Hello World".as_slice()),
    ];

    let mut entries = Vec::new();
    for (name, data) in files {
        let path = dir.join(name);
        fs::write(&path, data).into_diagnostic()?;
        entries.push(BuildEntry::file(name, path));
    }

    let destination = dir.join("source.meg");
    MegBuilder::new(BuildOptions::default()).build(&destination, entries, false)?;
    Ok(destination)
}

#[instrument(skip_all, fields(file = %path.display()))]
fn validate_meg_repack(path: &Path, destination: &Path) -> Result<()> {
    let mut input = MegArchive::new(File::open(path).into_diagnostic()?)?;

    let entries = input
        .archive()
        .iter()
        .map(|e| BuildEntry::from_archive(format!("Repacked/{}", e.path), path, e.clone()))
        .collect::<Vec<_>>();
    MegBuilder::new(BuildOptions::default()).build(destination, entries, false)?;

    let mut output = MegArchive::new(File::open(destination).into_diagnostic()?)?;
    assert_eq!(output.len(), input.len());

    let paths: Vec<_> = input.archive().iter().map(|e| e.path.clone()).collect();
    for path in paths {
        info!("comparing {path}");
        let mut expected = Vec::new();
        input.by_path(&path)?.read_to_end(&mut expected).into_diagnostic()?;

        let mut actual = Vec::new();
        output
            .by_path(&format!("REPACKED/{path}"))?
            .read_to_end(&mut actual)
            .into_diagnostic()?;

        assert_eq!(expected, actual);
    }

    Ok(())
}

#[traced_test]
#[test]
fn validate_meg_writer() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let source = source_archive(dir.path())?;
    validate_meg_repack(&source, &dir.path().join("repacked.meg"))
}

#[test]
fn engine_paths() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let data = dir.path().join("constants.xml");
    fs::write(&data, b"<GameConstants/>").into_diagnostic()?;

    let destination = dir.path().join("engine.meg");
    MegBuilder::new(
        BuildOptions::builder()
            .normalizer(Box::new(EngineNormalizer))
            .build(),
    )
    .build(
        &destination,
        vec![BuildEntry::file("/Data/Xml/GameConstants.xml", &data)],
        false,
    )?;

    let meg = MegArchive::new(File::open(&destination).into_diagnostic()?)?;
    let entry = &meg.archive().entries()[0];
    assert_eq!(entry.path, "DATA\\XML\\GAMECONSTANTS.XML");
    assert_eq!(entry.location.offset, 8 + 2 + 26 + 20);

    Ok(())
}

#[test]
fn failed_build_keeps_destination() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let source = source_archive(dir.path())?;
    let input = MegArchive::new(File::open(&source).into_diagnostic()?)?;

    let mut entry = input.archive().entries()[0].clone();
    entry.location.size += 1000;

    let destination = dir.path().join("out.meg");
    fs::write(&destination, [9, 9, 9]).into_diagnostic()?;

    let result = MegBuilder::new(BuildOptions::default()).build(
        &destination,
        vec![BuildEntry::from_archive("broken.txt", &source, entry)],
        true,
    );
    assert!(matches!(
        result,
        Err(Error::Corruption(CorruptionError::SourceTruncated { .. }))
    ));
    assert_eq!(fs::read(&destination).into_diagnostic()?, vec![9, 9, 9]);

    let leftovers = fs::read_dir(dir.path())
        .into_diagnostic()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);

    Ok(())
}

#[test]
fn merging_archives_with_overlapping_entries() -> Result<()> {
    let dir = tempfile::tempdir().into_diagnostic()?;
    let first = source_archive(dir.path())?;

    let patch = dir.path().join("patch.txt");
    fs::write(&patch, b"patched").into_diagnostic()?;

    let input = MegArchive::new(File::open(&first).into_diagnostic()?)?;
    let mut entries: Vec<_> = input
        .archive()
        .iter()
        .map(|e| BuildEntry::from_archive(e.path.clone(), &first, e.clone()))
        .collect();
    entries.push(BuildEntry::file("B.TXT", &patch));

    let destination = dir.path().join("merged.meg");
    let rejected =
        MegBuilder::new(BuildOptions::default()).build(&destination, entries.clone(), false);
    assert!(matches!(rejected, Err(Error::InvalidArgument(_))));
    assert!(!destination.exists());

    MegBuilder::new(
        BuildOptions::builder()
            .duplicates(DuplicatePolicy::Overwrite)
            .build(),
    )
    .build(&destination, entries, false)?;

    let mut merged = MegArchive::new(File::open(&destination).into_diagnostic()?)?;
    assert_eq!(merged.len(), 3);

    let mut data = String::new();
    merged
        .by_path("B.TXT")?
        .read_to_string(&mut data)
        .into_diagnostic()?;
    assert_eq!(data, "patched");

    Ok(())
}
