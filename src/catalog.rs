use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    error::{AppError, Result},
    status::classify,
    structs::{
        package::{FOREIGN_REPOSITORY, LocalInstall, PackageRecord},
        raw::{RawLocalPackage, RawPackage},
    },
    utils::natural_cmp,
};

/// A source that could not be read while building. The build carried on without it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source_name: String,
    pub reason: String,
}

/// Every package of one session, one record per name, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    generation: u64,
    records: Vec<PackageRecord>,
    index: HashMap<String, usize>,
    repositories: Vec<String>,
    failures: Vec<SourceFailure>,
}

impl Catalog {
    /// Id of the refresh that produced this catalog, see `CatalogStore`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut PackageRecord> {
        self.index.get(name).map(|&i| &mut self.records[i])
    }

    /// Repositories that loaded, in priority order, followed by `foreign`
    /// when there are foreign packages.
    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    /// True when some source was skipped.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Group name -> member package names.
    pub fn groups(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for record in &self.records {
            for group in record.groups() {
                groups.entry(group).or_default().push(record.name());
            }
        }
        groups
    }

    /// Per repository package counts and installed size.
    pub fn stats(&self) -> CatalogStats {
        let mut repos: Vec<RepoStats> = self
            .repositories
            .iter()
            .map(|r| RepoStats::empty(r))
            .collect();
        let mut total = RepoStats::empty("Total");

        for record in &self.records {
            let Some(stats) = repos.iter_mut().find(|s| s.repository == record.repository())
            else {
                continue;
            };
            for s in [stats, &mut total] {
                s.count += 1;
                if record.is_installed() {
                    s.installed += 1;
                    s.installed_size += record.install_size();
                }
            }
        }
        CatalogStats { repos, total }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepoStats {
    pub repository: String,
    pub count: usize,
    pub installed: usize,
    pub installed_size: u64,
}

impl RepoStats {
    fn empty(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            count: 0,
            installed: 0,
            installed_size: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
    pub repos: Vec<RepoStats>,
    pub total: RepoStats,
}

/// Merges repository databases and the local database into a `Catalog`.
/// Sources that failed to load are recorded and skipped.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    repos: Vec<(String, Result<Vec<RawPackage>>)>,
    local: Option<Result<Vec<RawLocalPackage>>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository. Earlier repositories win on name collisions.
    pub fn repository(mut self, name: &str, packages: Result<Vec<RawPackage>>) -> Self {
        self.repos.push((name.to_string(), packages));
        self
    }

    pub fn local(mut self, packages: Result<Vec<RawLocalPackage>>) -> Self {
        self.local = Some(packages);
        self
    }

    pub fn build(self) -> Catalog {
        let mut failures = vec![];
        let mut skip = |source_name: &str, err: AppError| {
            log::warn!("Skipping {source_name}: {err}");
            let reason = match err {
                AppError::SourceUnavailable { reason, .. } => reason,
                e => e.to_string(),
            };
            failures.push(SourceFailure {
                source_name: source_name.to_string(),
                reason,
            });
        };

        let mut locals = match self.local {
            Some(Ok(locals)) => locals,
            Some(Err(e)) => {
                skip("local", e);
                vec![]
            }
            None => vec![],
        };

        //first writer wins
        let mut repositories = vec![];
        let mut repo_map: HashMap<String, (usize, RawPackage)> = HashMap::new();
        for (repo, packages) in self.repos {
            let packages = match packages {
                Ok(p) => p,
                Err(e) => {
                    skip(&repo, e);
                    continue;
                }
            };
            repositories.push(repo);
            let repo_idx = repositories.len() - 1;
            for pack in packages {
                if !repo_map.contains_key(&pack.name) {
                    repo_map.insert(pack.name.clone(), (repo_idx, pack));
                }
            }
        }

        //first writer wins here too
        let mut seen = HashSet::new();
        locals.retain(|l| seen.insert(l.name().to_string()));

        let local_map: HashMap<&str, &RawLocalPackage> =
            locals.iter().map(|l| (l.name(), l)).collect();

        //installed but in no repository
        let foreign: Vec<&RawLocalPackage> = locals
            .iter()
            .filter(|l| !repo_map.contains_key(l.name()))
            .collect();
        let has_foreign = !foreign.is_empty();

        let mut records: Vec<PackageRecord> = Vec::with_capacity(repo_map.len() + foreign.len());
        for (name, (repo_idx, meta)) in repo_map {
            let local = local_map.get(name.as_str()).copied();
            records.push(PackageRecord::new(
                &repositories[repo_idx],
                meta,
                local.map(LocalInstall::from),
                classify(local, &locals),
            ));
        }
        for local in foreign {
            records.push(PackageRecord::new(
                FOREIGN_REPOSITORY,
                local.package.clone(),
                Some(LocalInstall::from(local)),
                classify(Some(local), &locals),
            ));
        }
        if has_foreign {
            repositories.push(FOREIGN_REPOSITORY.to_string());
        }

        records.sort_by(|a, b| natural_cmp(a.name(), b.name()));
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name().to_string(), i))
            .collect();

        log::info!(
            "Catalog built: {} packages from {} repositories, {} skipped",
            records.len(),
            repositories.len(),
            failures.len()
        );

        Catalog {
            generation: 0,
            records,
            index,
            repositories,
            failures,
        }
    }
}

/// Build from already loaded sources, in repository priority order.
pub fn build(
    repo_sources: Vec<(String, Vec<RawPackage>)>,
    local_source: Vec<RawLocalPackage>,
) -> Catalog {
    repo_sources
        .into_iter()
        .fold(CatalogBuilder::new(), |b, (name, packages)| {
            b.repository(&name, Ok(packages))
        })
        .local(Ok(local_source))
        .build()
}
