//! Dependency specifiers: `name[<op><version>][:description]`.

use std::{cmp::Ordering, fmt::Display};

use crate::version::vercmp;

const NAME_TERMINATORS: [char; 4] = ['=', '>', '<', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Lt => "<",
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier<'a> {
    pub raw: &'a str,
    pub name: &'a str,
    pub constraint: Option<(Op, &'a str)>,
    pub description: Option<&'a str>,
}

/// The package name part: everything before the first operator or colon.
pub fn bare_name(spec: &str) -> &str {
    let end = spec.find(NAME_TERMINATORS).unwrap_or(spec.len());
    spec[..end].trim()
}

impl<'a> Specifier<'a> {
    /// Never fails. Anything that doesn't tokenize cleanly becomes a
    /// specifier whose name is the whole (trimmed) string.
    pub fn parse(raw: &'a str) -> Self {
        match Self::try_parse(raw) {
            Some(spec) => spec,
            None => {
                log::debug!("Malformed specifier '{raw}', using it as a bare name");
                Specifier {
                    raw,
                    name: raw.trim(),
                    constraint: None,
                    description: None,
                }
            }
        }
    }

    /// Whether a package at `version` meets the constraint. `None` is an
    /// unversioned provision, which only satisfies an unconstrained specifier.
    pub fn satisfied_by(&self, version: Option<&str>) -> bool {
        let Some((op, wanted)) = self.constraint else {
            return true;
        };
        let Some(version) = version else {
            return false;
        };
        let ord = vercmp(version, wanted);
        match op {
            Op::Eq => ord == Ordering::Equal,
            Op::Ge => ord != Ordering::Less,
            Op::Le => ord != Ordering::Greater,
            Op::Gt => ord == Ordering::Greater,
            Op::Lt => ord == Ordering::Less,
        }
    }

    fn try_parse(raw: &'a str) -> Option<Self> {
        let name = bare_name(raw);
        if name.is_empty() {
            return None;
        }
        let end = raw.find(NAME_TERMINATORS).unwrap_or(raw.len());
        let rest = &raw[end..];

        if rest.is_empty() {
            return Some(Specifier {
                raw,
                name,
                constraint: None,
                description: None,
            });
        }
        if let Some(desc) = rest.strip_prefix(':') {
            return Some(Specifier {
                raw,
                name,
                constraint: None,
                description: Some(desc.trim()),
            });
        }

        let op = [Op::Ge, Op::Le, Op::Eq, Op::Gt, Op::Lt]
            .into_iter()
            .find(|op| rest.starts_with(op.as_str()))?;
        let rest = &rest[op.as_str().len()..];

        //versions may carry an epoch colon, descriptions are separated by ": "
        let (version, description) = match rest.split_once(": ") {
            Some((v, d)) => (v.trim(), Some(d.trim())),
            None => (rest.trim(), None),
        };
        if version.is_empty() || version.contains(['=', '>', '<']) {
            return None;
        }

        Some(Specifier {
            raw,
            name,
            constraint: Some((op, version)),
            description,
        })
    }
}

/// Render a relationship list sorted, one entry per line, with `link`
/// applied to each entry. An empty list renders as `None`.
pub fn render_list<F>(list: &[String], link: F) -> String
where
    F: Fn(&Specifier) -> String,
{
    if list.is_empty() {
        return "None".to_string();
    }
    let mut sorted: Vec<&String> = list.iter().collect();
    sorted.sort();
    sorted
        .into_iter()
        .map(|s| link(&Specifier::parse(s)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `<a href="name">name</a>` followed by the escaped constraint and description.
pub fn markup_link(spec: &Specifier) -> String {
    markup_link_marked(spec, true)
}

/// Like `markup_link`, but the name is set in italics when nothing
/// installed satisfies the specifier.
pub fn markup_link_marked(spec: &Specifier, satisfied: bool) -> String {
    let name = escape(spec.name);
    let mut out = if satisfied {
        format!("<a href=\"{name}\">{name}</a>")
    } else {
        format!("<a href=\"{name}\"><i>{name}</i></a>")
    };
    if let Some((op, version)) = spec.constraint {
        out.push_str(&escape(op.as_str()));
        out.push_str(&escape(version));
    }
    if let Some(desc) = spec.description {
        out.push_str(": ");
        out.push_str(&escape(desc));
    }
    out
}

pub fn plain(spec: &Specifier) -> String {
    spec.raw.to_string()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
