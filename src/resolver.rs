use crate::{
    catalog::Catalog,
    specifier::{Specifier, bare_name, markup_link_marked, render_list},
    structs::package::{PackageRecord, RelationKind},
};

/// True when any specifier of `list` contains any of `tokens`.
///
/// This is plain substring containment, so `lib` matches `libfoo>=2`.
pub fn mentions(list: &[String], tokens: &[&str]) -> bool {
    list.iter()
        .any(|spec| tokens.iter().any(|token| spec.contains(token)))
}

/// Package a dependency token points at: the package with that exact name,
/// otherwise the first package (by catalog order) providing it.
pub fn find_target<'a>(catalog: &'a Catalog, token: &str) -> Option<&'a PackageRecord> {
    let name = bare_name(token);
    if name.is_empty() {
        return None;
    }
    catalog
        .get(name)
        .or_else(|| catalog.iter().find(|r| r.provided_names().any(|p| p == name)))
}

/// Whether an installed package meets `spec`, either by name and version or
/// through a provision carrying a satisfying version.
pub fn has_local_satisfier(catalog: &Catalog, spec: &Specifier) -> bool {
    catalog.iter().filter(|r| r.is_installed()).any(|r| {
        (r.name() == spec.name && spec.satisfied_by(Some(r.version())))
            || r.provides().iter().any(|p| {
                let provision = Specifier::parse(p);
                provision.name == spec.name
                    && spec.satisfied_by(provision.constraint.map(|(_, v)| v))
            })
    })
}

/// Every other package whose depends (or optdepends) mention `name` or
/// anything it provides.
pub fn reverse_deps<'a>(catalog: &'a Catalog, name: &str, optional: bool) -> Vec<&'a PackageRecord> {
    let mut tokens = vec![name];
    if let Some(record) = catalog.get(name) {
        tokens.extend(record.provided_names());
    }
    let kind = if optional {
        RelationKind::Optdepends
    } else {
        RelationKind::Depends
    };

    catalog
        .iter()
        .filter(|other| other.name() != name && mentions(other.relations(kind), &tokens))
        .collect()
}

impl PackageRecord {
    /// Packages that hard depend on this one.
    pub fn required_by<'a>(&self, catalog: &'a Catalog) -> Vec<&'a PackageRecord> {
        reverse_deps(catalog, self.name(), false)
    }

    pub fn optional_for<'a>(&self, catalog: &'a Catalog) -> Vec<&'a PackageRecord> {
        reverse_deps(catalog, self.name(), true)
    }

    /// Names of `required_by`, sorted, `None` when empty.
    pub fn required_by_display(&self, catalog: &Catalog) -> String {
        names_display(self.required_by(catalog))
    }

    pub fn optional_for_display(&self, catalog: &Catalog) -> String {
        names_display(self.optional_for(catalog))
    }

    /// Link markup for a relationship list, with entries nothing installed
    /// satisfies set in italics.
    pub fn dependency_list_markup(&self, kind: RelationKind, catalog: &Catalog) -> String {
        render_list(self.relations(kind), |spec| {
            markup_link_marked(spec, has_local_satisfier(catalog, spec))
        })
    }
}

fn names_display(records: Vec<&PackageRecord>) -> String {
    if records.is_empty() {
        return "None".to_string();
    }
    //catalog order is already sorted by name
    records
        .iter()
        .map(|r| r.name())
        .collect::<Vec<_>>()
        .join("\n")
}
