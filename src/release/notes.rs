use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{ReleaseError, Result};
use crate::version::Version;

/// Inserts a `## <version>` heading right under `## Unreleased`. A file
/// that already carries the heading is returned unchanged, so reruns on a
/// prepared branch do not duplicate it.
pub fn add_changelog_entry(changelog: &str, version: &Version) -> Result<String> {
    let heading = format!("## {}", version);
    if changelog.lines().any(|line| line.trim() == heading) {
        return Ok(changelog.to_string());
    }
    let re = Regex::new(r"(##\s*Unreleased\s*\n)").map_err(regex_error)?;
    if !re.is_match(changelog) {
        return Err(ReleaseError::version_file(
            "no Unreleased section found in the changelog",
        ));
    }
    let replacement = format!("${{1}}\n## {}\n", version);
    Ok(re.replace(changelog, replacement.as_str()).into_owned())
}

/// Inserts a `<version>` block under the `Unreleased` heading of the
/// plain-text release notes. Idempotent like [`add_changelog_entry`].
pub fn add_release_notes_entry(notes: &str, version: &Version) -> Result<String> {
    let heading = version.to_string();
    if notes.lines().any(|line| line.trim() == heading) {
        return Ok(notes.to_string());
    }
    let re = Regex::new(r"(?m)(^Unreleased\s*\n)").map_err(regex_error)?;
    if !re.is_match(notes) {
        return Err(ReleaseError::version_file(
            "no Unreleased section found in the release notes",
        ));
    }
    let replacement = format!("${{1}}---\n\n{}\n", version);
    Ok(re.replace(notes, replacement.as_str()).into_owned())
}

/// The body of the `## <version>` changelog section, without the heading.
pub fn extract_version_section(changelog: &str, version: &Version) -> Option<String> {
    let heading = format!("## {}", version);
    let start = changelog.find(&heading)?;
    let body = &changelog[start + heading.len()..];
    let end = body.find("\n## ").unwrap_or(body.len());
    let section = body[..end].trim();
    if section.is_empty() {
        None
    } else {
        Some(section.to_string())
    }
}

/// Pull request references mentioned in release notes text: `#1234` style
/// numbers and full pull request URLs, deduplicated in order of appearance.
pub fn collect_pr_references(text: &str) -> Result<Vec<String>> {
    let re = Regex::new(r"https://github\.com/[\w.-]+/[\w.-]+/pull/\d+|#\d+")
        .map_err(regex_error)?;
    let mut refs: Vec<String> = Vec::new();
    for found in re.find_iter(text) {
        let reference = found.as_str().to_string();
        if !refs.contains(&reference) {
            refs.push(reference);
        }
    }
    Ok(refs)
}

pub fn update_changelog_file(path: &Path, version: &Version) -> Result<()> {
    rewrite(path, |contents| add_changelog_entry(contents, version))
}

pub fn update_release_notes_file(path: &Path, version: &Version) -> Result<()> {
    rewrite(path, |contents| add_release_notes_entry(contents, version))
}

fn rewrite(path: &Path, transform: impl FnOnce(&str) -> Result<String>) -> Result<()> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ReleaseError::version_file(format!("could not read {}: {}", path.display(), e))
    })?;
    let updated = transform(&contents)?;
    fs::write(path, updated)?;
    Ok(())
}

fn regex_error(e: regex::Error) -> ReleaseError {
    ReleaseError::version_file(format!("bad version pattern: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn version(s: &str) -> Version {
        Version::from_str(s).unwrap()
    }

    #[test]
    fn test_changelog_entry_lands_under_unreleased() {
        let before = "# Changelog\n\n## Unreleased\n\n## 1.1.0\n- older\n";
        let after = add_changelog_entry(before, &version("1.2.0")).unwrap();
        assert!(after.contains("## Unreleased\n\n## 1.2.0\n"));
        assert!(after.contains("## 1.1.0"));
    }

    #[test]
    fn test_changelog_without_unreleased_is_an_error() {
        assert!(add_changelog_entry("# Changelog\n", &version("1.2.0")).is_err());
    }

    #[test]
    fn test_release_notes_entry() {
        let before = "Unreleased\n- pending change\n";
        let after = add_release_notes_entry(before, &version("1.2.0")).unwrap();
        assert!(after.starts_with("Unreleased\n---\n\n1.2.0\n"));
    }

    #[test]
    fn test_changelog_entry_is_not_duplicated_on_rerun() {
        let before = "# Changelog\n\n## Unreleased\n\n## 1.1.0\n- older\n";
        let once = add_changelog_entry(before, &version("1.2.0")).unwrap();
        let twice = add_changelog_entry(&once, &version("1.2.0")).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches("## 1.2.0").count(), 1);
    }

    #[test]
    fn test_release_notes_entry_is_not_duplicated_on_rerun() {
        let before = "Unreleased\n- pending change\n";
        let once = add_release_notes_entry(before, &version("1.2.0")).unwrap();
        let twice = add_release_notes_entry(&once, &version("1.2.0")).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches("1.2.0").count(), 1);
    }

    #[test]
    fn test_collect_pr_references() {
        let notes = "- Fix crash [#1234]\n- https://github.com/WordPress/gutenberg/pull/555\n- Another mention of #1234\n";
        let refs = collect_pr_references(notes).unwrap();
        assert_eq!(
            refs,
            vec![
                "#1234".to_string(),
                "https://github.com/WordPress/gutenberg/pull/555".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_version_section() {
        let changelog = "## Unreleased\n\n## 1.2.0\n- one\n- two\n\n## 1.1.0\n- old\n";
        let section = extract_version_section(changelog, &version("1.2.0")).unwrap();
        assert_eq!(section, "- one\n- two");
        assert!(extract_version_section(changelog, &version("9.9.9")).is_none());
    }
}
