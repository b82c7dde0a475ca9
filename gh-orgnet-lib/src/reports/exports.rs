use crate::Result;
use crate::facts::{Failure, Harvest, Record, ScrapeTable};
use crate::graph::DirectedGraph;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::IntoAppError;
use std::fs;
use std::io::BufWriter;

const LOG_TARGET: &str = "   reports";

pub const CONTRIBUTOR_NETWORK: &str = "contributor_network";
pub const FULL_FOLLOWER_NETWORK: &str = "full-follower-network";
pub const NARROW_FOLLOWER_NETWORK: &str = "narrow-follower-network";
pub const MEMBERSHIP_NETWORK: &str = "membership_network";

/// Write every table and graph of a harvest into `dir`.
///
/// Returns the paths of the files written.
pub fn export_harvest(harvest: &Harvest, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let files = match harvest {
        Harvest::Memberships {
            members,
            memberships,
            network,
        } => vec![
            write_table(members, dir)?,
            write_table(memberships, dir)?,
            write_graph(network, MEMBERSHIP_NETWORK, dir)?,
        ],
        Harvest::Repositories { repositories } => vec![write_table(repositories, dir)?],
        Harvest::Contributors { contributions, network } => vec![
            write_table(contributions, dir)?,
            write_graph(network, CONTRIBUTOR_NETWORK, dir)?,
        ],
        Harvest::MemberRepos { repositories } => vec![write_table(repositories, dir)?],
        Harvest::MemberInfos { profiles } => vec![write_table(profiles, dir)?],
        Harvest::Starred { starred } => vec![write_table(starred, dir)?],
        Harvest::Followers {
            follows,
            full_network,
            narrow_network,
        } => vec![
            write_table(follows, dir)?,
            write_graph(full_network, FULL_FOLLOWER_NETWORK, dir)?,
            write_graph(narrow_network, NARROW_FOLLOWER_NETWORK, dir)?,
        ],
    };

    Ok(files)
}

/// Write the failure manifest into `dir`, unless there is nothing to report.
pub fn export_failures(failures: &[Failure], dir: &Utf8Path) -> Result<Option<Utf8PathBuf>> {
    if failures.is_empty() {
        return Ok(None);
    }

    let path = dir.join(format!("{}.csv", Failure::TABLE_NAME));
    let file = fs::File::create(&path).into_app_err_with(|| format!("creating '{path}'"))?;
    super::csv::generate_rows(Failure::COLUMNS, failures, BufWriter::new(file))?;

    log::info!(target: LOG_TARGET, "Wrote {} failure(s) to '{path}'", failures.len());
    Ok(Some(path))
}

fn write_table<R: Record>(table: &ScrapeTable<R>, dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let path = dir.join(format!("{}.csv", R::TABLE_NAME));
    let file = fs::File::create(&path).into_app_err_with(|| format!("creating '{path}'"))?;
    super::csv::generate(table, BufWriter::new(file))?;

    log::info!(target: LOG_TARGET, "Wrote {} row(s) to '{path}'", table.len());
    Ok(path)
}

fn write_graph(graph: &DirectedGraph, name: &str, dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let path = dir.join(format!("{name}.gexf"));
    let mut gexf = String::new();
    super::gexf::generate(graph, &mut gexf)?;
    fs::write(&path, gexf).into_app_err_with(|| format!("writing '{path}'"))?;

    log::info!(
        target: LOG_TARGET,
        "Wrote {} node(s) and {} edge(s) to '{path}'",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Follow, OrgRepository, ScrapeKind};

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    fn names(files: &[Utf8PathBuf]) -> Vec<&str> {
        files.iter().filter_map(|p| p.file_name()).collect()
    }

    #[test]
    fn test_export_repositories() {
        let (_tmp, dir) = temp_dir();
        let harvest = Harvest::Repositories {
            repositories: ScrapeTable::<OrgRepository>::new(),
        };

        let files = export_harvest(&harvest, &dir).unwrap();
        assert_eq!(names(&files), ["org_repositories.csv"]);
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.starts_with("organization,name,full_name,"));
    }

    #[test]
    fn test_export_followers() {
        let (_tmp, dir) = temp_dir();
        let follows: ScrapeTable<_> = [Follow {
            follower: "a".into(),
            followed: "b".into(),
            weight: 1,
        }]
        .into_iter()
        .collect();
        let harvest = Harvest::Followers {
            follows,
            full_network: DirectedGraph::default(),
            narrow_network: DirectedGraph::default(),
        };

        let files = export_harvest(&harvest, &dir).unwrap();
        assert_eq!(
            names(&files),
            ["follower_list.csv", "full-follower-network.gexf", "narrow-follower-network.gexf"]
        );
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), "follower,followed,weight\na,b,1\n");
        assert!(fs::read_to_string(&files[1]).unwrap().contains("<gexf"));
    }

    #[test]
    fn test_export_failures() {
        let (_tmp, dir) = temp_dir();
        assert!(export_failures(&[], &dir).unwrap().is_none());
        assert!(!dir.join("failures.csv").exists());

        let failures = [Failure::missing_dependency(ScrapeKind::Starred)];
        let path = export_failures(&failures, &dir).unwrap().unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("kind,unit,reason\nstarred,*,"));
    }
}
