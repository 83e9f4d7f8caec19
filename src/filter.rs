use std::{cmp::Ordering, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    error::AppError,
    structs::{flags::StatusFlags, package::PackageRecord},
    utils::natural_cmp,
    version::vercmp,
};

/// Record field the search text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SearchField {
    Name,
    Description,
    Group,
    Depends,
    Optdepends,
    Provides,
    Files,
}

impl SearchField {
    pub const ALL: [SearchField; 7] = [
        SearchField::Name,
        SearchField::Description,
        SearchField::Group,
        SearchField::Depends,
        SearchField::Optdepends,
        SearchField::Provides,
        SearchField::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Description => "description",
            SearchField::Group => "group",
            SearchField::Depends => "depends",
            SearchField::Optdepends => "optdepends",
            SearchField::Provides => "provides",
            SearchField::Files => "files",
        }
    }

    /// Comma separated list, e.g. `name,files`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, AppError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Does the lowercase `term` match this field of `record`.
    fn matches(&self, record: &PackageRecord, term: &str, exact: bool) -> bool {
        let hit = |value: &str| {
            let value = value.to_lowercase();
            if exact {
                value == term
            } else {
                value.contains(term)
            }
        };
        match self {
            SearchField::Name => hit(record.name()),
            SearchField::Description => hit(record.description()),
            SearchField::Group => hit(record.group_display().as_str()),
            SearchField::Depends => record.depends().iter().any(|s| hit(s.as_str())),
            SearchField::Optdepends => record.optdepends().iter().any(|s| hit(s.as_str())),
            SearchField::Provides => record.provides().iter().any(|s| hit(s.as_str())),
            SearchField::Files => record.files().iter().any(|s| hit(s.as_str())),
        }
    }
}

impl Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.to_lowercase().as_str() {
            "name" => SearchField::Name,
            "description" | "desc" => SearchField::Description,
            "group" | "groups" => SearchField::Group,
            "depends" => SearchField::Depends,
            "optdepends" => SearchField::Optdepends,
            "provides" => SearchField::Provides,
            "files" => SearchField::Files,
            _ => return Err(AppError::UnknownFilterField(s.to_string())),
        };
        Ok(field)
    }
}

impl TryFrom<String> for SearchField {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SearchField> for String {
    fn from(value: SearchField) -> Self {
        value.as_str().to_string()
    }
}

/// How the search text is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    ///whole text, as typed, is contained in a field
    #[default]
    Substring,
    ///every word must match some field
    All,
    ///any word matches
    Any,
    ///whole text equals a field
    Exact,
}

impl FromStr for SearchMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(SearchMode::Substring),
            "all" => Ok(SearchMode::All),
            "any" => Ok(SearchMode::Any),
            "exact" => Ok(SearchMode::Exact),
            _ => Err(AppError::Other(format!("Unknown search mode: '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilterConfig {
    pub fields: Vec<SearchField>,
    pub mode: SearchMode,
}

impl Default for SearchFilterConfig {
    fn default() -> Self {
        Self {
            fields: vec![SearchField::Name, SearchField::Description],
            mode: SearchMode::Substring,
        }
    }
}

/// Current repository, status and search selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    ///empty for all repositories
    pub repository: String,
    pub status_mask: StatusFlags,
    pub search_text: String,
    pub search: SearchFilterConfig,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            repository: String::new(),
            status_mask: StatusFlags::ALL,
            search_text: String::new(),
            search: SearchFilterConfig::default(),
        }
    }
}

impl FilterState {
    pub fn matches(&self, record: &PackageRecord) -> bool {
        self.matches_repository(record) && self.matches_status(record) && self.matches_search(record)
    }

    pub fn matches_repository(&self, record: &PackageRecord) -> bool {
        self.repository.is_empty() || self.repository.eq_ignore_ascii_case(record.repository())
    }

    /// Any flag in common is enough, so composite masks like `INSTALLED` work.
    pub fn matches_status(&self, record: &PackageRecord) -> bool {
        record.status().intersects(self.status_mask)
    }

    /// Empty text matches everything. Otherwise any enabled field must match.
    pub fn matches_search(&self, record: &PackageRecord) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        let text = self.search_text.to_lowercase();
        let fields = &self.search.fields;
        let any_field = |term: &str, exact: bool| fields.iter().any(|f| f.matches(record, term, exact));

        match self.search.mode {
            SearchMode::Substring => any_field(&text, false),
            SearchMode::Exact => any_field(&text, true),
            SearchMode::All => text.split_whitespace().all(|t| any_field(t, false)),
            SearchMode::Any => text.split_whitespace().any(|t| any_field(t, false)),
        }
    }
}

impl Catalog {
    /// Records matching `state`, in catalog order.
    pub fn filter(&self, state: &FilterState) -> Vec<&PackageRecord> {
        self.iter().filter(|r| state.matches(r)).collect()
    }
}

/// Column a package list can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    #[default]
    Name,
    Version,
    Repository,
    Status,
    InstallDate,
    BuildDate,
    InstallSize,
    DownloadSize,
}

impl SortField {
    pub fn compare(&self, a: &PackageRecord, b: &PackageRecord) -> Ordering {
        let ord = match self {
            SortField::Name => Ordering::Equal,
            SortField::Version => vercmp(a.version(), b.version()),
            SortField::Repository => a.repository().cmp(b.repository()),
            SortField::Status => a.status().bits().cmp(&b.status().bits()),
            SortField::InstallDate => a.install_date().cmp(&b.install_date()),
            SortField::BuildDate => a.build_date().cmp(&b.build_date()),
            SortField::InstallSize => a.install_size().cmp(&b.install_size()),
            SortField::DownloadSize => a.download_size().cmp(&b.download_size()),
        };
        ord.then_with(|| natural_cmp(a.name(), b.name()))
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.to_lowercase().as_str() {
            "name" => SortField::Name,
            "version" => SortField::Version,
            "repository" | "repo" => SortField::Repository,
            "status" => SortField::Status,
            "install-date" | "installed" => SortField::InstallDate,
            "build-date" | "built" => SortField::BuildDate,
            "install-size" | "size" => SortField::InstallSize,
            "download-size" => SortField::DownloadSize,
            _ => return Err(AppError::UnknownFilterField(s.to_string())),
        };
        Ok(field)
    }
}

pub fn sort_records(records: &mut [&PackageRecord], field: SortField, reverse: bool) {
    records.sort_by(|a, b| {
        let ord = field.compare(a, b);
        if reverse { ord.reverse() } else { ord }
    });
}
