use std::collections::HashMap;

use crate::version::{ChangeType, change_type};

#[derive(Debug, Clone, PartialEq)]
pub struct PackageUpdate {
    pub name: String,
    pub current_version: String,
    pub new_version: String,
    pub change_type: ChangeType,
}

impl PackageUpdate {
    pub fn new(name: &str, current_version: &str, new_version: &str) -> Self {
        Self {
            name: name.to_string(),
            current_version: current_version.to_string(),
            new_version: new_version.to_string(),
            change_type: change_type(current_version, new_version),
        }
    }
}

/// Outcome of asking the update checker. "Nothing to update" and "could not
/// check" are different answers and stay different.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCheck {
    Available(Vec<PackageUpdate>),
    NoUpdates,
    Failed(String),
}

impl UpdateCheck {
    /// name -> new version, empty unless updates are available.
    pub fn to_map(&self) -> HashMap<String, String> {
        match self {
            UpdateCheck::Available(updates) => updates
                .iter()
                .map(|u| (u.name.clone(), u.new_version.clone()))
                .collect(),
            _ => HashMap::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateCheck::Failed(_))
    }
}
