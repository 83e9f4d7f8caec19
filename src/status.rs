use crate::{
    resolver::mentions,
    specifier::bare_name,
    structs::{
        flags::StatusFlags,
        raw::{InstallReason, RawLocalPackage},
    },
};

/// Status of a package given its local install record and the full set of
/// installed packages. Reverse dependencies only count installed packages;
/// a hard dependency wins over an optional one.
pub fn classify(local: Option<&RawLocalPackage>, installed: &[RawLocalPackage]) -> StatusFlags {
    let Some(local) = local else {
        return StatusFlags::NOT_INSTALLED;
    };
    if local.reason == InstallReason::Explicit {
        return StatusFlags::EXPLICIT;
    }

    let name = local.name();
    let mut tokens = vec![name];
    tokens.extend(local.package.provides.iter().map(|p| bare_name(p)));

    let wanted_by = |optional: bool| {
        installed.iter().any(|other| {
            let list = if optional {
                &other.package.optdepends
            } else {
                &other.package.depends
            };
            other.name() != name && mentions(list, &tokens)
        })
    };

    if wanted_by(false) {
        StatusFlags::DEPENDENCY
    } else if wanted_by(true) {
        StatusFlags::OPTIONAL
    } else {
        StatusFlags::ORPHAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::raw::RawPackage;

    fn pkg(name: &str, reason: InstallReason, depends: &[&str], optdepends: &[&str]) -> RawLocalPackage {
        RawLocalPackage {
            package: RawPackage {
                name: name.to_string(),
                version: "1.0-1".to_string(),
                depends: depends.iter().map(|s| s.to_string()).collect(),
                optdepends: optdepends.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            reason,
            ..Default::default()
        }
    }

    #[test]
    fn test_not_installed() {
        assert_eq!(classify(None, &[]), StatusFlags::NOT_INSTALLED);
    }

    #[test]
    fn test_each_state() {
        use InstallReason::*;
        let installed = vec![
            pkg("app", Explicit, &["libfoo>=2", "glibc"], &["extras: more things"]),
            pkg("libfoo", Dependency, &[], &[]),
            pkg("glibc", Dependency, &[], &[]),
            pkg("extras", Dependency, &[], &[]),
            pkg("leftover", Dependency, &[], &[]),
        ];
        let status = |name: &str| {
            let local = installed.iter().find(|p| p.name() == name);
            classify(local, &installed)
        };
        assert_eq!(status("app"), StatusFlags::EXPLICIT);
        assert_eq!(status("libfoo"), StatusFlags::DEPENDENCY);
        assert_eq!(status("glibc"), StatusFlags::DEPENDENCY);
        assert_eq!(status("extras"), StatusFlags::OPTIONAL);
        assert_eq!(status("leftover"), StatusFlags::ORPHAN);
    }

    #[test]
    fn test_hard_dependency_wins() {
        use InstallReason::*;
        let installed = vec![
            pkg("a", Explicit, &["shared"], &[]),
            pkg("b", Explicit, &[], &["shared: optional support"]),
            pkg("shared", Dependency, &[], &[]),
        ];
        assert_eq!(classify(installed.get(2), &installed), StatusFlags::DEPENDENCY);
    }

    #[test]
    fn test_required_through_provides() {
        use InstallReason::*;
        let mut provider = pkg("openssh-hpn", Dependency, &[], &[]);
        provider.package.provides = vec!["openssh=9.6".to_string()];
        let installed = vec![pkg("tool", Explicit, &["openssh"], &[]), provider];
        assert_eq!(classify(installed.get(1), &installed), StatusFlags::DEPENDENCY);
    }

    #[test]
    fn test_substring_matching_is_loose() {
        use InstallReason::*;
        //"lib" is contained in "libfoo>=2", so it counts as required
        let installed = vec![
            pkg("app", Explicit, &["libfoo>=2"], &[]),
            pkg("lib", Dependency, &[], &[]),
        ];
        assert_eq!(classify(installed.get(1), &installed), StatusFlags::DEPENDENCY);
    }

    #[test]
    fn test_self_reference_ignored() {
        use InstallReason::*;
        let installed = vec![pkg("loop", Dependency, &["loop"], &[])];
        assert_eq!(classify(installed.first(), &installed), StatusFlags::ORPHAN);
    }
}
