use std::collections::HashMap;

use crate::{catalog::Catalog, structs::packageupdate::PackageUpdate};

/// Mark every installed catalog package named in `updates` as having that new
/// version. Returns the names that were changed, sorted. Unknown or not
/// installed names are ignored.
pub fn apply_updates(catalog: &mut Catalog, updates: &HashMap<String, String>) -> Vec<String> {
    let mut affected = vec![];
    for (name, new_version) in updates {
        match catalog.get_mut(name) {
            Some(record) => {
                if record.apply_update(new_version) {
                    affected.push(name.clone())
                } else {
                    log::debug!("Update for {name} ignored, not installed")
                }
            }
            None => log::debug!("Update for unknown package {name}"),
        }
    }
    affected.sort();
    log::info!("Applied {} of {} updates", affected.len(), updates.len());
    affected
}

/// Parse `name old -> new` lines as printed by checkupdates and `pacman -Qu`.
/// Lines that don't have that shape are skipped.
pub fn parse_update_lines(output: &str) -> Vec<PackageUpdate> {
    output
        .lines()
        .filter_map(|line| {
            //pacman -Qu may append " [ignored]"
            let line = line.trim().trim_end_matches("[ignored]").trim();
            let (left, new_version) = line.split_once(" -> ")?;
            let (name, current_version) = left.trim().split_once(' ')?;
            let new_version = new_version.trim();
            if name.is_empty() || new_version.is_empty() {
                log::debug!("Skipping update line '{line}'");
                return None;
            }
            Some(PackageUpdate::new(name, current_version.trim(), new_version))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::build,
        structs::{
            flags::StatusFlags,
            raw::{RawLocalPackage, RawPackage},
        },
        version::ChangeType,
    };

    fn catalog() -> Catalog {
        let raw = |name: &str, version: &str| RawPackage {
            name: name.to_string(),
            version: version.to_string(),
            ..Default::default()
        };
        build(
            vec![(
                "core".to_string(),
                vec![raw("bar", "1.0-1"), raw("baz", "3.1-2"), raw("qux", "0.9-1")],
            )],
            vec![
                RawLocalPackage {
                    package: raw("bar", "1.0-1"),
                    ..Default::default()
                },
                RawLocalPackage {
                    package: raw("baz", "3.1-2"),
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_absent_name_changes_nothing() {
        let mut catalog = catalog();
        let before = catalog.records().to_vec();
        let updates = HashMap::from([("foo".to_string(), "2.0-1".to_string())]);
        assert!(apply_updates(&mut catalog, &updates).is_empty());
        assert_eq!(catalog.records(), before);
    }

    #[test]
    fn test_only_named_records_change() {
        let mut catalog = catalog();
        let baz_before = catalog.get("baz").unwrap().clone();
        let updates = HashMap::from([
            ("bar".to_string(), "1.1-1".to_string()),
            ("foo".to_string(), "2.0-1".to_string()),
        ]);
        assert_eq!(apply_updates(&mut catalog, &updates), ["bar"]);

        let bar = catalog.get("bar").unwrap();
        assert!(bar.has_update());
        assert_eq!(bar.update_version(), Some("1.1-1"));
        assert!(bar.status().contains(StatusFlags::HAS_UPDATE));
        assert_eq!(catalog.get("baz").unwrap(), &baz_before);
    }

    #[test]
    fn test_not_installed_never_updated() {
        let mut catalog = catalog();
        let updates = HashMap::from([("qux".to_string(), "1.0-1".to_string())]);
        assert!(apply_updates(&mut catalog, &updates).is_empty());

        let qux = catalog.get("qux").unwrap();
        assert!(!qux.has_update());
        assert_eq!(qux.status(), StatusFlags::NOT_INSTALLED);
    }

    #[test]
    fn test_parse_update_lines() {
        let output = "linux 6.7.4.arch1-1 -> 6.7.5.arch1-1\n\
                      mesa 1:23.3.5-1 -> 1:24.0.1-1\n\
                      firefox 122.0.1-1 -> 123.0-1 [ignored]\n\
                      \n\
                      garbage line\n";
        let updates = parse_update_lines(output);
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].name, "linux");
        assert_eq!(updates[0].current_version, "6.7.4.arch1-1");
        assert_eq!(updates[0].new_version, "6.7.5.arch1-1");
        assert_eq!(updates[0].change_type, ChangeType::Patch);
        assert_eq!(updates[1].change_type, ChangeType::Major);
        assert_eq!(updates[2].name, "firefox");
        assert_eq!(updates[2].new_version, "123.0-1");
    }
}
