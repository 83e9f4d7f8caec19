use std::{cmp::Ordering, fmt::Display};

/// A version split the way pacman splits it: `epoch:pkgver-pkgrel`.
/// Epoch defaults to "0", the release is absent when there is no `-`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacmanVersion {
    pub raw: String,
    pub epoch: String,
    pub pkgver: String,
    pub pkgrel: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Hash, Ord)]
pub enum ChangeType {
    Pkgrel,
    Revision,
    Patch,
    Minor,
    Major,
    Epoch,
}

impl Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<&str> for PacmanVersion {
    fn from(s: &str) -> Self {
        let raw = s.to_string();
        let digits = s.bytes().take_while(u8::is_ascii_digit).count();

        let (epoch, rest) = if s.as_bytes().get(digits) == Some(&b':') {
            let epoch = if digits == 0 { "0" } else { &s[..digits] };
            (epoch.to_string(), &s[digits + 1..])
        } else {
            ("0".to_string(), s)
        };

        let (pkgver, pkgrel) = match rest.rsplit_once('-') {
            Some((ver, rel)) => (ver.to_string(), Some(rel.to_string())),
            None => (rest.to_string(), None),
        };

        PacmanVersion {
            raw,
            epoch,
            pkgver,
            pkgrel,
        }
    }
}

impl Display for PacmanVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialOrd for PacmanVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PacmanVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.raw == other.raw {
            return Ordering::Equal;
        }
        segment_cmp(&self.epoch, &other.epoch)
            .then_with(|| segment_cmp(&self.pkgver, &other.pkgver))
            .then_with(|| match (&self.pkgrel, &other.pkgrel) {
                //release only counts when both sides carry one
                (Some(a), Some(b)) => segment_cmp(a, b),
                _ => Ordering::Equal,
            })
    }
}

/// Compare two full package versions with pacman ordering rules.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    PacmanVersion::from(a).cmp(&PacmanVersion::from(b))
}

/// Segment-wise comparison of a single version component.
/// Digit runs compare numerically, letter runs lexically; a numeric
/// segment is always newer than an alpha one, and a trailing alpha
/// segment never beats an empty remainder ("1.0rc" < "1.0").
pub fn segment_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let one = a.as_bytes();
    let two = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < one.len() && j < two.len() {
        let (sep_i, sep_j) = (i, j);
        while i < one.len() && !one[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < two.len() && !two[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if i >= one.len() || j >= two.len() {
            break;
        }
        //separator runs of different length decide
        if i - sep_i != j - sep_j {
            return (i - sep_i).cmp(&(j - sep_j));
        }

        let isnum = one[i].is_ascii_digit();
        let (start_i, start_j) = (i, j);
        if isnum {
            while i < one.len() && one[i].is_ascii_digit() {
                i += 1;
            }
            while j < two.len() && two[j].is_ascii_digit() {
                j += 1;
            }
        } else {
            while i < one.len() && one[i].is_ascii_alphabetic() {
                i += 1;
            }
            while j < two.len() && two[j].is_ascii_alphabetic() {
                j += 1;
            }
        }

        //segments of different types: numeric wins
        if start_j == j {
            return if isnum {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg_a = &one[start_i..i];
        let mut seg_b = &two[start_j..j];
        if isnum {
            while seg_a.first() == Some(&b'0') {
                seg_a = &seg_a[1..];
            }
            while seg_b.first() == Some(&b'0') {
                seg_b = &seg_b[1..];
            }
            match seg_a.len().cmp(&seg_b.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match seg_a.cmp(seg_b) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }

    let rest_a = &one[i.min(one.len())..];
    let rest_b = &two[j.min(two.len())..];
    if rest_a.is_empty() && rest_b.is_empty() {
        return Ordering::Equal;
    }
    let alpha = |s: &[u8]| s.first().is_some_and(u8::is_ascii_alphabetic);
    if (rest_a.is_empty() && !alpha(rest_b)) || alpha(rest_a) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Classify how big a jump `current` -> `new` is.
pub fn change_type(current: &str, new: &str) -> ChangeType {
    let curr = PacmanVersion::from(current);
    let new = PacmanVersion::from(new);

    if segment_cmp(&curr.epoch, &new.epoch) != Ordering::Equal {
        return ChangeType::Epoch;
    }
    if curr.pkgver == new.pkgver {
        return ChangeType::Pkgrel;
    }

    let c_parts: Vec<&str> = curr.pkgver.split('.').collect();
    let n_parts: Vec<&str> = new.pkgver.split('.').collect();
    let first_diff = c_parts
        .iter()
        .zip(n_parts.iter())
        .position(|(c, n)| c != n)
        .unwrap_or(c_parts.len().min(n_parts.len()));

    match first_diff {
        0 => ChangeType::Major,
        1 => ChangeType::Minor,
        2 => ChangeType::Patch,
        _ => ChangeType::Revision,
    }
}
