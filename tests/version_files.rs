use std::fs;
use std::str::FromStr;

use tempfile::TempDir;

use gbm_release::release::notes;
use gbm_release::version::Version;

fn version() -> Version {
    Version::from_str("1.2.0").unwrap()
}

#[test]
fn changelog_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("CHANGELOG.md");
    fs::write(
        &path,
        "# Changelog\n\n## Unreleased\n\n## 1.1.0\n- older change\n",
    )
    .unwrap();

    notes::update_changelog_file(&path, &version()).unwrap();

    let updated = fs::read_to_string(&path).unwrap();
    assert!(updated.contains("## Unreleased\n\n## 1.2.0\n"));
    assert!(updated.contains("## 1.1.0\n- older change"));
}

#[test]
fn release_notes_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("RELEASE-NOTES.txt");
    fs::write(&path, "Unreleased\n- a pending note\n---\n\n1.1.0\n- old\n").unwrap();

    notes::update_release_notes_file(&path, &version()).unwrap();

    let updated = fs::read_to_string(&path).unwrap();
    assert!(updated.starts_with("Unreleased\n---\n\n1.2.0\n"));
    assert!(updated.contains("1.1.0\n- old"));
}

#[test]
fn rerunning_the_changelog_update_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("CHANGELOG.md");
    fs::write(&path, "# Changelog\n\n## Unreleased\n\n## 1.1.0\n- older\n").unwrap();

    notes::update_changelog_file(&path, &version()).unwrap();
    let once = fs::read_to_string(&path).unwrap();
    notes::update_changelog_file(&path, &version()).unwrap();
    let twice = fs::read_to_string(&path).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.matches("## 1.2.0").count(), 1);
}

#[test]
fn missing_file_surfaces_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing/CHANGELOG.md");
    let err = notes::update_changelog_file(&path, &version()).unwrap_err();
    assert!(err.to_string().contains("CHANGELOG.md"));
}
