use std::{
    path::{Path, PathBuf},
    process::Output,
};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    config::Config,
    error::{AppError, Result},
    format::{parse_date, parse_size},
    source::{PackageSource, RepoLoad, UpdateChecker},
    structs::{
        flags::Validation,
        packageupdate::UpdateCheck,
        raw::{Backup, InstallReason, RawLocalPackage, RawPackage},
    },
    updates::parse_update_lines,
};

/// Package data read through the pacman command line and the local database
/// directory.
#[derive(Debug, Clone)]
pub struct Pacman {
    program: String,
    db_path: PathBuf,
    update_command: Vec<String>,
    no_updates_exit_code: i32,
}

impl Pacman {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.pacman.clone(),
            db_path: config.db_path.clone(),
            update_command: config.update_command.clone(),
            no_updates_exit_code: config.no_updates_exit_code,
        }
    }

    pub async fn exists(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .is_ok()
    }

    async fn run(&self, arg: &str) -> Result<Output> {
        let output = Command::new(&self.program)
            .env("LC_TIME", "C")
            .arg(arg)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(output)
    }

    /// `%FILES%` and `%BACKUP%` of an installed package.
    async fn read_files(&self, name: &str, version: &str) -> (Vec<String>, Vec<Backup>) {
        let path = self
            .db_path
            .join("local")
            .join(format!("{name}-{version}"))
            .join("files");
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_files(&contents),
            Err(e) => {
                log::debug!("Could not read {}: {e}", path.display());
                (vec![], vec![])
            }
        }
    }
}

#[async_trait]
impl PackageSource for Pacman {
    async fn sync_databases(&self) -> Result<Vec<RepoLoad>> {
        let output = self.run("-Si").await?;
        if !output.status.success() && output.stdout.is_empty() {
            return Err(AppError::unavailable(
                "sync",
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        let stdout = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(group_by_repository(&stdout, &stderr))
    }

    async fn local_database(&self) -> Result<Vec<RawLocalPackage>> {
        let output = self.run("-Qi").await?;
        if !output.status.success() {
            return Err(AppError::unavailable(
                "local",
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        let stdout = String::from_utf8(output.stdout)?;

        let mut locals = parse_local(&stdout);
        for local in locals.iter_mut() {
            let (files, backup) = self
                .read_files(&local.package.name, &local.package.version)
                .await;
            local.files = files;
            local.backup = backup;
        }
        Ok(locals)
    }
}

#[async_trait]
impl UpdateChecker for Pacman {
    async fn check(&self) -> UpdateCheck {
        let Some((program, args)) = self.update_command.split_first() else {
            return UpdateCheck::Failed("No update command configured".to_string());
        };
        let output = match Command::new(program)
            .args(args)
            .env("LC_TIME", "C")
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => return UpdateCheck::Failed(format!("{program}: {e}")),
        };
        update_check_result(&output, self.no_updates_exit_code)
    }
}

fn update_check_result(output: &Output, no_updates_exit_code: i32) -> UpdateCheck {
    let code = output.status.code();
    if output.status.success() {
        let updates = parse_update_lines(&String::from_utf8_lossy(&output.stdout));
        if updates.is_empty() {
            UpdateCheck::NoUpdates
        } else {
            UpdateCheck::Available(updates)
        }
    } else if code == Some(no_updates_exit_code) {
        UpdateCheck::NoUpdates
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.is_empty() {
            UpdateCheck::Failed(format!("Update command exited with {}", output.status))
        } else {
            UpdateCheck::Failed(stderr)
        }
    }
}

type Field = (String, Vec<String>);

/// Split `Key : value` info output into one block per package. Indented lines
/// continue the previous key.
fn parse_blocks(output: &str) -> Vec<Vec<Field>> {
    let mut blocks = vec![];
    let mut block: Vec<Field> = vec![];
    for line in output.lines() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                blocks.push(std::mem::take(&mut block));
            }
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            if let Some((_, values)) = block.last_mut() {
                values.push(line.trim().to_string());
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        block.push((key.trim().to_string(), vec![value.trim().to_string()]));
    }
    if !block.is_empty() {
        blocks.push(block);
    }
    blocks
}

fn words(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split_whitespace())
        .filter(|w| *w != "None")
        .map(|w| w.to_string())
        .collect()
}

fn optional_deps(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim_end_matches("[installed]").trim())
        .filter(|v| !v.is_empty() && *v != "None")
        .map(|v| v.to_string())
        .collect()
}

/// Fill the fields common to sync and local output. Returns false for keys
/// it doesn't know.
fn apply_field(pack: &mut RawPackage, key: &str, values: &[String]) -> bool {
    let value = values.first().map(String::as_str).unwrap_or_default();
    let text = || if value == "None" { String::new() } else { value.to_string() };
    match key {
        "Name" => pack.name = value.to_string(),
        "Version" => pack.version = value.to_string(),
        "Description" => pack.description = text(),
        "Architecture" => pack.architecture = value.to_string(),
        "URL" => pack.url = text(),
        "Licenses" => pack.licenses = words(values).into_iter().collect(),
        "Groups" => pack.groups = words(values).into_iter().collect(),
        "Provides" => pack.provides = words(values),
        "Depends On" => pack.depends = words(values),
        "Optional Deps" => pack.optdepends = optional_deps(values),
        "Conflicts With" => pack.conflicts = words(values),
        "Replaces" => pack.replaces = words(values),
        "Download Size" => pack.download_size = parse_size(value).unwrap_or_default(),
        "Installed Size" => pack.install_size = parse_size(value).unwrap_or_default(),
        "Packager" => pack.packager = value.to_string(),
        "Build Date" => pack.build_date = parse_date(value).unwrap_or_default(),
        "Install Script" => pack.has_script = value == "Yes",
        "Validated By" => pack.validation = Validation::from_pacman(value),
        "Base" => pack.base = value.to_string(),
        _ => return false,
    }
    true
}

/// `pacman -Si` output grouped by its `Repository` field, in the order the
/// repositories first appear. Repositories pacman warned about on stderr are
/// appended as failed loads.
fn group_by_repository(stdout: &str, stderr: &str) -> Vec<RepoLoad> {
    let mut repos: Vec<(String, Vec<RawPackage>)> = vec![];
    for block in parse_blocks(stdout) {
        let mut repo = String::new();
        let mut pack = RawPackage::default();
        for (key, values) in &block {
            if key == "Repository" {
                repo = values.first().cloned().unwrap_or_default();
            } else {
                apply_field(&mut pack, key, values);
            }
        }
        if pack.name.is_empty() {
            continue;
        }
        match repos.iter_mut().find(|(name, _)| *name == repo) {
            Some((_, packages)) => packages.push(pack),
            None => repos.push((repo, vec![pack])),
        }
    }

    let mut loads: Vec<RepoLoad> = repos
        .into_iter()
        .map(|(name, packages)| RepoLoad {
            name,
            packages: Ok(packages),
        })
        .collect();

    for line in stderr.lines() {
        //warning: database file for 'testing' does not exist (use '-Sy' to download)
        let Some(rest) = line.strip_prefix("warning: database file for '") else {
            continue;
        };
        let Some((name, _)) = rest.split_once('\'') else {
            continue;
        };
        loads.push(RepoLoad {
            name: name.to_string(),
            packages: Err(AppError::unavailable(name, "database file does not exist")),
        });
    }
    loads
}

fn parse_local(stdout: &str) -> Vec<RawLocalPackage> {
    parse_blocks(stdout)
        .into_iter()
        .filter_map(|block| {
            let mut local = RawLocalPackage::default();
            for (key, values) in &block {
                let value = values.first().map(String::as_str).unwrap_or_default();
                match key.as_str() {
                    "Install Date" => local.install_date = parse_date(value).unwrap_or_default(),
                    "Install Reason" => {
                        local.reason = match value {
                            "Installed as a dependency for another package" => {
                                InstallReason::Dependency
                            }
                            _ => InstallReason::Explicit,
                        }
                    }
                    _ => {
                        apply_field(&mut local.package, key, values);
                    }
                }
            }
            (!local.package.name.is_empty()).then_some(local)
        })
        .collect()
}

/// Sections of a local database `files` entry. Paths are made absolute.
fn parse_files(contents: &str) -> (Vec<String>, Vec<Backup>) {
    let mut files = vec![];
    let mut backup = vec![];
    let mut section = "";
    for line in contents.lines() {
        if line.starts_with('%') && line.ends_with('%') {
            section = line;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        match section {
            "%FILES%" => files.push(absolute(line)),
            "%BACKUP%" => {
                let (path, hash) = line.split_once('\t').unwrap_or((line, ""));
                backup.push(Backup {
                    path: absolute(path),
                    hash: hash.to_string(),
                });
            }
            _ => {}
        }
    }
    (files, backup)
}

fn absolute(path: &str) -> String {
    Path::new("/").join(path).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use super::*;

    const SYNC: &str = "\
Repository      : core
Name            : bash
Version         : 5.2.026-2
Description     : The GNU Bourne Again shell
Architecture    : x86_64
URL             : https://www.gnu.org/software/bash/bash.html
Licenses        : GPL-3.0-or-later
Groups          : None
Provides        : sh
Depends On      : readline  libreadline.so=8-64  glibc  ncurses
Optional Deps   : bash-completion: for tab completion
                  bash-docs: documentation
Conflicts With  : None
Replaces        : None
Download Size   : 1.80 MiB
Installed Size  : 8.18 MiB
Packager        : Someone <someone@archlinux.org>
Build Date      : Sat Feb 10 12:34:56 2024
Validated By    : MD5 Sum  SHA-256 Sum  Signature

Repository      : extra
Name            : vim
Version         : 9.1.0-1
Description     : Vi Improved
Architecture    : x86_64
URL             : None
Licenses        : custom:vim
Groups          : editors  base-devel
Provides        : xxd
Depends On      : vim-runtime=9.1.0-1  gpm  acl
Optional Deps   : None
Conflicts With  : gvim
Replaces        : None
Download Size   : 2.00 KiB
Installed Size  : 4.00 KiB
Packager        : Someone Else
Build Date      : Sat Feb 10 12:34:56 2024
Validated By    : Signature

Repository      : core
Name            : glibc
Version         : 2.39-1
Description     : GNU C Library
Architecture    : x86_64
URL             : https://www.gnu.org/software/libc
Licenses        : GPL-2.0-or-later  LGPL-2.1-or-later
Groups          : None
Provides        : None
Depends On      : linux-api-headers>=4.10  tzdata  filesystem
Optional Deps   : gd: for memusagestat
Conflicts With  : None
Replaces        : None
Download Size   : 9.00 MiB
Installed Size  : 48.00 MiB
Packager        : Someone <someone@archlinux.org>
Build Date      : Sat Feb 10 12:34:56 2024
Validated By    : Signature
";

    const LOCAL: &str = "\
Name            : bash
Version         : 5.2.026-2
Description     : The GNU Bourne Again shell
Architecture    : x86_64
URL             : https://www.gnu.org/software/bash/bash.html
Licenses        : GPL-3.0-or-later
Groups          : None
Provides        : sh
Depends On      : readline  glibc
Optional Deps   : bash-completion: for tab completion [installed]
Required By     : base
Optional For    : None
Conflicts With  : None
Replaces        : None
Installed Size  : 8.18 MiB
Packager        : Someone <someone@archlinux.org>
Build Date      : Sat Feb 10 12:34:56 2024
Install Date    : Sun Feb 11 08:00:00 2024
Install Reason  : Installed as a dependency for another package
Install Script  : No
Validated By    : Signature

Name            : yay
Version         : 12.3.1-1
Description     : Yet another yogurt
Architecture    : x86_64
URL             : https://github.com/Jguer/yay
Licenses        : GPL-3.0-or-later
Groups          : None
Provides        : None
Depends On      : pacman>5  git
Optional Deps   : sudo
Required By     : None
Optional For    : None
Conflicts With  : None
Replaces        : None
Installed Size  : 8.00 MiB
Packager        : Unknown Packager
Build Date      : Sat Feb 10 12:34:56 2024
Install Date    : Sun Feb 11 08:00:00 2024
Install Reason  : Explicitly installed
Install Script  : Yes
Validated By    : None
";

    #[test]
    fn test_sync_grouped_by_repository() {
        let stderr = "warning: database file for 'testing' does not exist (use '-Sy' to download)\n";
        let loads = group_by_repository(SYNC, stderr);
        let names: Vec<&str> = loads.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["core", "extra", "testing"]);
        assert!(loads[2].packages.is_err());

        let core = loads[0].packages.as_ref().unwrap();
        assert_eq!(core.len(), 2);
        let bash = &core[0];
        assert_eq!(bash.name, "bash");
        assert_eq!(bash.version, "5.2.026-2");
        assert_eq!(bash.provides, ["sh"]);
        assert_eq!(bash.depends, ["readline", "libreadline.so=8-64", "glibc", "ncurses"]);
        assert_eq!(
            bash.optdepends,
            ["bash-completion: for tab completion", "bash-docs: documentation"]
        );
        assert!(bash.conflicts.is_empty());
        assert!(bash.groups.is_empty());
        assert_eq!(bash.download_size, parse_size("1.80 MiB").unwrap());
        assert_eq!(bash.validation, Validation::all().difference(Validation::NONE));
        assert!(bash.build_date > 0);

        let vim = &loads[1].packages.as_ref().unwrap()[0];
        assert_eq!(vim.url, "");
        assert!(vim.optdepends.is_empty());
        assert_eq!(vim.groups.len(), 2);
        assert_eq!(vim.conflicts, ["gvim"]);
    }

    #[test]
    fn test_local() {
        let locals = parse_local(LOCAL);
        assert_eq!(locals.len(), 2);
        let bash = &locals[0];
        assert_eq!(bash.name(), "bash");
        assert_eq!(bash.reason, InstallReason::Dependency);
        assert_eq!(bash.package.optdepends, ["bash-completion: for tab completion"]);
        assert!(bash.install_date > bash.package.build_date);
        assert!(!bash.package.has_script);

        let yay = &locals[1];
        assert_eq!(yay.reason, InstallReason::Explicit);
        assert!(yay.package.has_script);
        assert_eq!(yay.package.depends, ["pacman>5", "git"]);
        assert_eq!(yay.package.validation, Validation::NONE);
    }

    #[test]
    fn test_files() {
        let contents = "%FILES%\netc/\netc/bash.bashrc\nusr/bin/bash\n\n%BACKUP%\netc/bash.bashrc\t027d5e1a\n";
        let (files, backup) = parse_files(contents);
        assert_eq!(files, ["/etc/", "/etc/bash.bashrc", "/usr/bin/bash"]);
        assert_eq!(
            backup,
            [Backup {
                path: "/etc/bash.bashrc".to_string(),
                hash: "027d5e1a".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_read_files_from_db() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("local").join("bash-5.2.026-2");
        std::fs::create_dir_all(&entry).unwrap();
        std::fs::write(entry.join("files"), "%FILES%\nusr/bin/bash\n").unwrap();

        let config = Config {
            db_path: dir.path().to_path_buf(),
            ..Default::default()
        };
        let pacman = Pacman::new(&config);
        let (files, _) = pacman.read_files("bash", "5.2.026-2").await;
        assert_eq!(files, ["/usr/bin/bash"]);
        let (files, backup) = pacman.read_files("missing", "1").await;
        assert!(files.is_empty() && backup.is_empty());
    }

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_update_check_result() {
        let check = update_check_result(&output(0, "bash 5.2.026-1 -> 5.2.026-2\n", ""), 2);
        assert!(matches!(check, UpdateCheck::Available(ref u) if u.len() == 1));
        assert_eq!(update_check_result(&output(0, "", ""), 2), UpdateCheck::NoUpdates);
        assert_eq!(update_check_result(&output(2, "", ""), 2), UpdateCheck::NoUpdates);
        assert_eq!(
            update_check_result(&output(1, "", "==> ERROR: Cannot fetch updates\n"), 2),
            UpdateCheck::Failed("==> ERROR: Cannot fetch updates".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_update_command() {
        let config = Config {
            update_command: vec!["/nonexistent/checkupdates".to_string()],
            ..Default::default()
        };
        assert!(Pacman::new(&config).check().await.is_failed());
    }
}
