use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::structs::flags::Validation;

/// Package metadata as a repository (or the local database) describes it.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPackage {
    pub name: String,
    pub base: String,
    pub version: String,
    pub description: String,
    pub url: String,
    pub licenses: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub architecture: String,
    pub packager: String,
    pub build_date: i64,
    pub download_size: u64,
    pub install_size: u64,
    pub depends: Vec<String>,
    pub optdepends: Vec<String>,
    pub provides: Vec<String>,
    pub conflicts: Vec<String>,
    pub replaces: Vec<String>,
    pub has_script: bool,
    pub sha256sum: Option<String>,
    pub md5sum: Option<String>,
    pub validation: Validation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallReason {
    #[default]
    Explicit,
    Dependency,
}

impl InstallReason {
    /// libalpm reason codes: 0 explicit, 1 installed as a dependency.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => InstallReason::Dependency,
            _ => InstallReason::Explicit,
        }
    }
}

/// A config file pacman keeps a copy of. `path` is relative to the install
/// root, `hash` is the md5 of the file as packaged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Backup {
    pub path: String,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    Unmodified,
    Modified,
    /// The file on disk could not be read.
    Error,
}

impl BackupStatus {
    pub fn text(&self) -> &'static str {
        match self {
            BackupStatus::Unmodified => "unmodified",
            BackupStatus::Modified => "modified",
            BackupStatus::Error => "read error",
        }
    }
}

impl Backup {
    /// Compare the file under `/` with its packaged hash.
    pub fn status(&self) -> BackupStatus {
        self.status_in(Path::new("/"))
    }

    pub fn status_in(&self, root: &Path) -> BackupStatus {
        let path = root.join(self.path.trim_start_matches('/'));
        match std::fs::read(&path) {
            Ok(bytes) => {
                let digest = format!("{:x}", md5::compute(&bytes));
                if digest.eq_ignore_ascii_case(self.hash.trim()) {
                    BackupStatus::Unmodified
                } else {
                    BackupStatus::Modified
                }
            }
            Err(e) => {
                log::debug!("Reading backup file {}: {e}", path.display());
                BackupStatus::Error
            }
        }
    }
}

/// An installed package: the metadata recorded at install time plus what
/// only the local database knows.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLocalPackage {
    pub package: RawPackage,
    pub install_date: i64,
    pub reason: InstallReason,
    pub files: Vec<String>,
    pub backup: Vec<Backup>,
}

impl RawLocalPackage {
    pub fn name(&self) -> &str {
        &self.package.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup() -> Backup {
        Backup {
            path: "etc/ssh/sshd_config".to_string(),
            hash: format!("{:x}", md5::compute(b"Port 22\n")),
        }
    }

    #[test]
    fn test_backup_status() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("etc/ssh/sshd_config");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();

        std::fs::write(&file, "Port 22\n").unwrap();
        assert_eq!(backup().status_in(root.path()), BackupStatus::Unmodified);

        std::fs::write(&file, "Port 2222\n").unwrap();
        assert_eq!(backup().status_in(root.path()), BackupStatus::Modified);
        assert_eq!(BackupStatus::Modified.text(), "modified");
    }

    #[test]
    fn test_backup_status_unreadable() {
        let root = tempfile::tempdir().unwrap();
        let status = backup().status_in(root.path());
        assert_eq!(status, BackupStatus::Error);
        assert_eq!(status.text(), "read error");
    }

    #[test]
    fn test_backup_hash_case() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("etc")).unwrap();
        std::fs::write(root.path().join("etc/motd"), "").unwrap();
        let backup = Backup {
            path: "/etc/motd".to_string(),
            hash: "D41D8CD98F00B204E9800998ECF8427E".to_string(),
        };
        assert_eq!(backup.status_in(root.path()), BackupStatus::Unmodified);
    }
}
