use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

bitflags! {
    /// Installation status of a package. The four installed states are
    /// mutually exclusive; `HAS_UPDATE` combines with any of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        const ALL           = Self::INSTALLED.bits() | Self::NOT_INSTALLED.bits() | Self::HAS_UPDATE.bits();
        const INSTALLED     = Self::EXPLICIT.bits() | Self::DEPENDENCY.bits() | Self::OPTIONAL.bits() | Self::ORPHAN.bits();
        const EXPLICIT      = 1 << 0;
        const DEPENDENCY    = 1 << 1;
        const OPTIONAL      = 1 << 2;
        const ORPHAN        = 1 << 3;
        const NOT_INSTALLED = 1 << 4;
        const HAS_UPDATE    = 1 << 5;
    }
}

bitflags! {
    /// How a repository package can be verified.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Validation: u32 {
        const NONE      = 1 << 0;
        const MD5SUM    = 1 << 1;
        const SHA256SUM = 1 << 2;
        const SIGNATURE = 1 << 3;
    }
}

impl StatusFlags {
    /// Parse a comma separated list such as `explicit,orphan` or `installed`.
    pub fn from_names(list: &str) -> Result<Self, AppError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(StatusFlags::empty(), |acc, name| {
                let flag = match name.to_lowercase().as_str() {
                    "all" => StatusFlags::ALL,
                    "installed" => StatusFlags::INSTALLED,
                    "explicit" => StatusFlags::EXPLICIT,
                    "dependency" => StatusFlags::DEPENDENCY,
                    "optional" => StatusFlags::OPTIONAL,
                    "orphan" => StatusFlags::ORPHAN,
                    "not-installed" | "none" => StatusFlags::NOT_INSTALLED,
                    "updates" | "has-update" => StatusFlags::HAS_UPDATE,
                    _ => return Err(AppError::UnknownFilterField(name.to_string())),
                };
                Ok(acc | flag)
            })
    }

    /// The installed state (or not installed), ignoring `HAS_UPDATE`.
    pub fn text(&self) -> &'static str {
        let base = self.difference(StatusFlags::HAS_UPDATE);
        if base == StatusFlags::EXPLICIT {
            "explicit"
        } else if base == StatusFlags::DEPENDENCY {
            "dependency"
        } else if base == StatusFlags::OPTIONAL {
            "optional"
        } else if base == StatusFlags::ORPHAN {
            "orphan"
        } else {
            "not installed"
        }
    }
}

impl Validation {
    /// From pacman's `Validated By` field, e.g. `MD5 Sum  SHA-256 Sum  Signature`.
    pub fn from_pacman(value: &str) -> Self {
        let mut flags = Validation::empty();
        if value.contains("MD5 Sum") {
            flags |= Validation::MD5SUM;
        }
        if value.contains("SHA-256 Sum") {
            flags |= Validation::SHA256SUM;
        }
        if value.contains("Signature") {
            flags |= Validation::SIGNATURE;
        }
        if flags.is_empty() {
            Validation::NONE
        } else {
            flags
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composites() {
        assert!(StatusFlags::INSTALLED.contains(StatusFlags::ORPHAN));
        assert!(!StatusFlags::INSTALLED.contains(StatusFlags::NOT_INSTALLED));
        assert!(StatusFlags::ALL.contains(StatusFlags::INSTALLED | StatusFlags::HAS_UPDATE));
    }

    #[test]
    fn test_from_names() {
        assert_eq!(
            StatusFlags::from_names("explicit, orphan").unwrap(),
            StatusFlags::EXPLICIT | StatusFlags::ORPHAN
        );
        assert_eq!(StatusFlags::from_names("Installed").unwrap(), StatusFlags::INSTALLED);
        assert_eq!(StatusFlags::from_names("").unwrap(), StatusFlags::empty());
        assert!(matches!(
            StatusFlags::from_names("explicit,bogus"),
            Err(AppError::UnknownFilterField(f)) if f == "bogus"
        ));
    }

    #[test]
    fn test_text() {
        assert_eq!(StatusFlags::EXPLICIT.text(), "explicit");
        assert_eq!((StatusFlags::ORPHAN | StatusFlags::HAS_UPDATE).text(), "orphan");
        assert_eq!(StatusFlags::NOT_INSTALLED.text(), "not installed");
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            Validation::from_pacman("MD5 Sum  SHA-256 Sum  Signature"),
            Validation::MD5SUM | Validation::SHA256SUM | Validation::SIGNATURE
        );
        assert_eq!(Validation::from_pacman("None"), Validation::NONE);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&(StatusFlags::EXPLICIT | StatusFlags::ORPHAN)).unwrap();
        let back: StatusFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusFlags::EXPLICIT | StatusFlags::ORPHAN);
        let all: StatusFlags = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(all, StatusFlags::ALL);
    }
}
