//! The organizations file: a CSV with one organization login per row.

use crate::Result;
use camino::Utf8Path;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};

/// Header of the column holding organization logins.
pub const ORG_COLUMN: &str = "github_org_name";

#[derive(Debug, Deserialize, Serialize)]
struct OrgRow {
    github_org_name: String,
}

/// Read organization logins from a CSV file with a `github_org_name` column.
///
/// Blank cells are skipped. A file that yields no organization is an error.
pub fn read_organizations(path: &Utf8Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .into_app_err_with(|| format!("opening organizations file '{path}'"))?;

    let mut organizations = Vec::new();
    for row in reader.deserialize::<OrgRow>() {
        let row = row.into_app_err_with(|| format!("reading organizations file '{path}', expected a '{ORG_COLUMN}' column"))?;
        if !row.github_org_name.is_empty() {
            organizations.push(row.github_org_name);
        }
    }

    if organizations.is_empty() {
        bail!("organizations file '{path}' lists no organization; add rows under a '{ORG_COLUMN}' header or pass --org");
    }

    Ok(organizations)
}

/// Write organization logins as an organizations file.
pub fn write_organizations(path: &Utf8Path, organizations: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).into_app_err_with(|| format!("creating organizations file '{path}'"))?;
    for name in organizations {
        writer
            .serialize(OrgRow {
                github_org_name: name.clone(),
            })
            .into_app_err_with(|| format!("writing organizations file '{path}'"))?;
    }

    if organizations.is_empty() {
        writer.write_record([ORG_COLUMN]).into_app_err_with(|| format!("writing organizations file '{path}'"))?;
    }

    writer.flush().into_app_err_with(|| format!("writing organizations file '{path}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;

    fn temp_file(name: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join(name)).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_read_organizations() {
        let (_tmp, path) = temp_file("orgs.csv");
        fs::write(&path, "github_org_name\ncodeforamerica\n\n  mysociety \n").unwrap();
        assert_eq!(read_organizations(&path).unwrap(), ["codeforamerica", "mysociety"]);
    }

    #[test]
    fn test_read_organizations_with_extra_columns() {
        let (_tmp, path) = temp_file("orgs.csv");
        fs::write(&path, "country,github_org_name\nUS,codeforamerica\n").unwrap();
        assert_eq!(read_organizations(&path).unwrap(), ["codeforamerica"]);
    }

    #[test]
    fn test_read_empty_organizations_fails() {
        let (_tmp, path) = temp_file("orgs.csv");
        fs::write(&path, "github_org_name\n").unwrap();
        let err = read_organizations(&path).unwrap_err();
        assert!(err.to_string().contains("no organization"));
    }

    #[test]
    fn test_read_missing_column_fails() {
        let (_tmp, path) = temp_file("orgs.csv");
        fs::write(&path, "name\ncodeforamerica\n").unwrap();
        assert!(read_organizations(&path).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let (_tmp, path) = temp_file("orgs.csv");
        write_organizations(&path, &["a".into(), "b".into()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "github_org_name\na\nb\n");
        assert_eq!(read_organizations(&path).unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_write_empty_keeps_header() {
        let (_tmp, path) = temp_file("orgs.csv");
        write_organizations(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "github_org_name\n");
    }
}
