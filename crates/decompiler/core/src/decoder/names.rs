//! Compound name fields.
//!
//! File-name columns hold `short|long` or a single name. Directory
//! `DefaultDir` values hold `target[:source]`, each part in that same
//! form, and `.` as a part means the directory adds no path segment.

use msi_document::Attributes;

/// A short/long name pair. Either may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamePair {
    pub short: Option<String>,
    pub long: Option<String>,
}

impl NamePair {
    /// Split `short|long`. A single value is the long name.
    pub fn parse(value: &str) -> Self {
        match value.split_once('|') {
            Some((short, long)) => Self {
                short: non_empty(short),
                long: non_empty(long),
            },
            None => Self {
                short: None,
                long: non_empty(value),
            },
        }
    }

    /// Like [`NamePair::parse`], but `.` yields an empty pair.
    pub fn parse_directory_part(value: &str) -> Self {
        if value == "." {
            Self::default()
        } else {
            Self::parse(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }

    /// Long name if present, otherwise the short one.
    pub fn preferred(&self) -> Option<&str> {
        self.long.as_deref().or(self.short.as_deref())
    }

    /// Write the pair into `short_attr` / `long_attr`.
    pub fn apply(&self, attrs: &mut Attributes, short_attr: &str, long_attr: &str) {
        attrs.set_opt(short_attr, self.short.clone());
        attrs.set_opt(long_attr, self.long.clone());
    }
}

/// The four names packed into a `DefaultDir` value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultDirNames {
    pub target: NamePair,
    pub source: NamePair,
}

impl DefaultDirNames {
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((target, source)) => Self {
                target: NamePair::parse_directory_part(target),
                source: NamePair::parse_directory_part(source),
            },
            None => Self {
                target: NamePair::parse_directory_part(value),
                source: NamePair::default(),
            },
        }
    }

    /// Name of the directory on the source media: the source name when one
    /// is given, else the target name.
    pub fn source_segment(&self) -> Option<&str> {
        self.source.preferred().or_else(|| self.target.preferred())
    }

    pub fn apply(&self, attrs: &mut Attributes) {
        self.target.apply(attrs, "ShortName", "Name");
        self.source.apply(attrs, "ShortSourceName", "SourceName");
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
