use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::{
    catalog::{Catalog, CatalogBuilder},
    error::{AppError, Result},
    store::CatalogStore,
    structs::{
        packageupdate::UpdateCheck,
        raw::{RawLocalPackage, RawPackage},
    },
};

/// Name a failed repository listing is recorded under.
pub const SYNC_SOURCE: &str = "sync";

/// One repository as a source returned it. A repository that failed to load
/// carries its error here instead of failing the whole listing.
#[derive(Debug)]
pub struct RepoLoad {
    pub name: String,
    pub packages: Result<Vec<RawPackage>>,
}

/// Where repository and local package metadata comes from.
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Every configured repository, in priority order.
    async fn sync_databases(&self) -> Result<Vec<RepoLoad>>;

    async fn local_database(&self) -> Result<Vec<RawLocalPackage>>;
}

#[async_trait]
pub trait UpdateChecker: Send + Sync {
    async fn check(&self) -> UpdateCheck;
}

/// Load both databases concurrently and build a catalog. Either call taking
/// longer than `limit` fails the refresh with `Timeout`; any other failure
/// is recorded in the catalog and the build goes on without that source.
pub async fn refresh(source: &dyn PackageSource, limit: Duration) -> Result<Catalog> {
    let (repos, local) = tokio::join!(
        bounded("repository databases", limit, source.sync_databases()),
        bounded("local database", limit, source.local_database()),
    );

    let builder = match repos {
        Ok(repos) => repos.into_iter().fold(CatalogBuilder::new(), |b, load| {
            b.repository(&load.name, load.packages)
        }),
        Err(e @ AppError::Timeout { .. }) => return Err(e),
        Err(e) => CatalogBuilder::new().repository(SYNC_SOURCE, Err(e)),
    };

    let local = match local {
        Err(e @ AppError::Timeout { .. }) => return Err(e),
        local => local,
    };
    Ok(builder.local(local).build())
}

/// Run the update checker, turning a timeout into `UpdateCheck::Failed`.
pub async fn check_updates(checker: &dyn UpdateChecker, limit: Duration) -> UpdateCheck {
    match tokio::time::timeout(limit, checker.check()).await {
        Ok(UpdateCheck::Failed(reason)) => {
            log::warn!("{}", AppError::UpdateCheckFailed(reason.clone()));
            UpdateCheck::Failed(reason)
        }
        Ok(check) => check,
        Err(_) => {
            let e = AppError::Timeout {
                what: "update check".to_string(),
                seconds: limit.as_secs(),
            };
            log::warn!("{e}");
            UpdateCheck::Failed(e.to_string())
        }
    }
}

async fn bounded<T, F>(what: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::Timeout {
            what: what.to_string(),
            seconds: limit.as_secs(),
        })?
}

/// Refresh in the background. The task resolves to whether the new catalog
/// was installed, false when a newer refresh got there first.
pub fn spawn_refresh(
    store: Arc<CatalogStore>,
    source: Arc<dyn PackageSource>,
    limit: Duration,
) -> JoinHandle<Result<bool>> {
    let ticket = store.begin_refresh();
    tokio::spawn(async move {
        let catalog = refresh(source.as_ref(), limit).await?;
        Ok(store.install(ticket, catalog))
    })
}

/// What a background update check produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    pub check: UpdateCheck,
    /// Names marked as updated, `None` when the catalog was replaced while
    /// the check ran or there was nothing to apply.
    pub applied: Option<Vec<String>>,
}

/// Check for updates against the current catalog generation and merge the
/// result into the store, unless a refresh superseded it meanwhile.
pub fn spawn_update_check(
    store: Arc<CatalogStore>,
    checker: Arc<dyn UpdateChecker>,
    limit: Duration,
) -> JoinHandle<UpdateReport> {
    let generation = store.generation();
    tokio::spawn(async move {
        let check = check_updates(checker.as_ref(), limit).await;
        let applied = match &check {
            UpdateCheck::Available(_) => store.apply_updates(generation, &check.to_map()),
            _ => None,
        };
        UpdateReport { check, applied }
    })
}
