use std::fmt::Display;

use crate::{
    format::{DateStyle, format_date, format_size},
    specifier::{bare_name, markup_link, render_list},
    structs::{
        flags::{StatusFlags, Validation},
        raw::{Backup, InstallReason, RawLocalPackage, RawPackage},
    },
};

/// Pseudo repository for installed packages no configured repository knows.
pub const FOREIGN_REPOSITORY: &str = "foreign";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Depends,
    Optdepends,
    Provides,
    Conflicts,
    Replaces,
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationKind::Depends => "Depends On",
            RelationKind::Optdepends => "Optional Deps",
            RelationKind::Provides => "Provides",
            RelationKind::Conflicts => "Conflicts With",
            RelationKind::Replaces => "Replaces",
        };
        f.write_str(s)
    }
}

/// What only the local database knows about an installed package.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalInstall {
    pub version: String,
    pub install_date: i64,
    pub install_size: u64,
    pub reason: InstallReason,
    pub files: Vec<String>,
    pub backup: Vec<Backup>,
}

impl From<&RawLocalPackage> for LocalInstall {
    fn from(raw: &RawLocalPackage) -> Self {
        let mut files = raw.files.clone();
        files.sort_unstable();
        let mut backup = raw.backup.clone();
        backup.sort();
        LocalInstall {
            version: raw.package.version.clone(),
            install_date: raw.install_date,
            install_size: raw.package.install_size,
            reason: raw.reason,
            files,
            backup,
        }
    }
}

/// One package of the catalog: repository metadata merged with the local
/// install record, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRecord {
    name: String,
    repository: String,
    meta: RawPackage,
    local: Option<LocalInstall>,
    status: StatusFlags,

    //updates for available updates
    update_version: Option<String>,
}

impl PackageRecord {
    pub fn new(
        repository: &str,
        meta: RawPackage,
        local: Option<LocalInstall>,
        status: StatusFlags,
    ) -> Self {
        Self {
            name: meta.name.clone(),
            repository: repository.to_string(),
            meta,
            local,
            status: status.difference(StatusFlags::HAS_UPDATE),
            update_version: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Repository name, or `foreign` for local-only packages.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn is_foreign(&self) -> bool {
        self.repository == FOREIGN_REPOSITORY
    }

    pub fn base(&self) -> &str {
        if self.meta.base.is_empty() {
            &self.name
        } else {
            &self.meta.base
        }
    }

    pub fn description(&self) -> &str {
        &self.meta.description
    }

    pub fn url(&self) -> &str {
        &self.meta.url
    }

    pub fn licenses(&self) -> impl Iterator<Item = &String> {
        self.meta.licenses.iter()
    }

    pub fn groups(&self) -> impl Iterator<Item = &String> {
        self.meta.groups.iter()
    }

    pub fn architecture(&self) -> &str {
        &self.meta.architecture
    }

    pub fn packager(&self) -> &str {
        &self.meta.packager
    }

    pub fn build_date(&self) -> i64 {
        self.meta.build_date
    }

    pub fn has_script(&self) -> bool {
        self.meta.has_script
    }

    pub fn sha256sum(&self) -> Option<&str> {
        self.meta.sha256sum.as_deref()
    }

    pub fn md5sum(&self) -> Option<&str> {
        self.meta.md5sum.as_deref()
    }

    pub fn validation(&self) -> Validation {
        self.meta.validation
    }

    pub fn relations(&self, kind: RelationKind) -> &[String] {
        match kind {
            RelationKind::Depends => &self.meta.depends,
            RelationKind::Optdepends => &self.meta.optdepends,
            RelationKind::Provides => &self.meta.provides,
            RelationKind::Conflicts => &self.meta.conflicts,
            RelationKind::Replaces => &self.meta.replaces,
        }
    }

    pub fn depends(&self) -> &[String] {
        &self.meta.depends
    }

    pub fn optdepends(&self) -> &[String] {
        &self.meta.optdepends
    }

    pub fn provides(&self) -> &[String] {
        &self.meta.provides
    }

    /// Bare names of everything this package provides.
    pub fn provided_names(&self) -> impl Iterator<Item = &str> {
        self.meta.provides.iter().map(|p| bare_name(p))
    }

    //installed
    pub fn local(&self) -> Option<&LocalInstall> {
        self.local.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.local.is_some()
    }

    pub fn reason(&self) -> Option<InstallReason> {
        self.local.as_ref().map(|l| l.reason)
    }

    pub fn install_date(&self) -> i64 {
        self.local.as_ref().map_or(0, |l| l.install_date)
    }

    pub fn files(&self) -> &[String] {
        self.local.as_ref().map_or(&[][..], |l| l.files.as_slice())
    }

    pub fn backup(&self) -> &[Backup] {
        self.local.as_ref().map_or(&[][..], |l| l.backup.as_slice())
    }

    /// Installed version when installed, repository version otherwise.
    pub fn version(&self) -> &str {
        self.local
            .as_ref()
            .map_or(&self.meta.version, |l| &l.version)
    }

    pub fn repository_version(&self) -> &str {
        &self.meta.version
    }

    /// Classified status, plus `HAS_UPDATE` once an update was applied.
    pub fn status(&self) -> StatusFlags {
        if self.update_version.is_some() {
            self.status | StatusFlags::HAS_UPDATE
        } else {
            self.status
        }
    }

    pub fn status_text(&self) -> &'static str {
        self.status.text()
    }

    pub fn has_update(&self) -> bool {
        self.update_version.is_some()
    }

    pub fn update_version(&self) -> Option<&str> {
        self.update_version.as_deref()
    }

    /// `1.0-1 → 1.1-1` while an update is pending.
    pub fn version_display(&self) -> String {
        match &self.update_version {
            Some(new) => format!("{} \u{2192} {new}", self.version()),
            None => self.version().to_string(),
        }
    }

    /// Record a pending update. Only installed packages can have one, returns
    /// false (and changes nothing) otherwise.
    pub fn apply_update(&mut self, new_version: &str) -> bool {
        if self.local.is_none() {
            return false;
        }
        self.update_version = Some(new_version.to_string());
        true
    }

    pub fn install_size(&self) -> u64 {
        self.local
            .as_ref()
            .map_or(self.meta.install_size, |l| l.install_size)
    }

    /// Not known for foreign packages.
    pub fn download_size(&self) -> Option<u64> {
        (!self.is_foreign()).then_some(self.meta.download_size)
    }

    pub fn install_size_display(&self, decimals: u8) -> String {
        format_size(self.install_size(), decimals)
    }

    pub fn download_size_display(&self, decimals: u8) -> String {
        self.download_size()
            .map(|s| format_size(s, decimals))
            .unwrap_or_default()
    }

    pub fn install_date_display(&self, style: DateStyle) -> String {
        format_date(self.install_date(), style)
    }

    pub fn build_date_display(&self, style: DateStyle) -> String {
        format_date(self.meta.build_date, style)
    }

    pub fn licenses_display(&self) -> String {
        //BTreeSet iterates sorted
        self.licenses().cloned().collect::<Vec<_>>().join(", ")
    }

    pub fn group_display(&self) -> String {
        self.groups().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Sorted list with every package name wrapped as a link, `None` when empty.
    pub fn dependency_list_display(&self, kind: RelationKind) -> String {
        render_list(self.relations(kind), markup_link)
    }

    /// archlinux.org page for repository packages, empty for foreign ones.
    pub fn package_url(&self) -> String {
        if self.is_foreign() {
            return String::new();
        }
        format!(
            "https://archlinux.org/packages/{}/{}/{}/",
            self.repository, self.meta.architecture, self.name
        )
    }
}
