//! File source paths and folder references of file operations.

use std::collections::{BTreeMap, HashSet};

use crate::decoder::names::{DefaultDirNames, NamePair};
use crate::error::DecompileResult;

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Root of every source path.
const SOURCE_ROOT: &str = "SourceDir";

// ── File Source ─────────────────────────────────────────────────────

/// Gives each file the path it has on the source media, and turns a
/// version that names another file into a companion-file reference.
pub struct FileSourceUnit;

/// `Directory` rows by key: parent key and `DefaultDir` value.
struct DirectoryRows {
    rows: BTreeMap<String, (Option<String>, Option<String>)>,
}

impl DirectoryRows {
    fn load(cx: &LinkContext<'_, '_>) -> Self {
        let rows = cx
            .rows("Directory")
            .into_iter()
            .filter_map(|row| {
                let id = row.get("Directory")?;
                Some((id, (row.get("Directory_Parent"), row.get("DefaultDir"))))
            })
            .collect();
        Self { rows }
    }

    /// Source-media segments from the top directory down to `directory`.
    /// The top directory stands for the source root and adds no segment.
    fn source_segments(&self, directory: &str) -> Vec<String> {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut current = directory.to_string();
        while seen.insert(current.clone()) {
            let Some((parent, default_dir)) = self.rows.get(&current) else {
                break;
            };
            let parent = parent.as_ref().filter(|p| **p != current);
            let Some(parent) = parent else {
                break;
            };
            if let Some(segment) = default_dir
                .as_deref()
                .map(DefaultDirNames::parse)
                .as_ref()
                .and_then(|names| names.source_segment())
            {
                segments.push(segment.to_string());
            }
            current = parent.clone();
        }
        segments.reverse();
        segments
    }
}

impl LinkingUnit for FileSourceUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::FileSource
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let directories = DirectoryRows::load(cx);
        let component_directory: BTreeMap<String, String> = cx
            .rows("Component")
            .into_iter()
            .filter_map(|row| Some((row.get("Component")?, row.get("Directory_")?)))
            .collect();

        let mut sourced = 0u32;
        let mut companions = 0u32;
        for row in cx.rows("File") {
            let Some(file) = row.get("File") else {
                continue;
            };
            let Some(node) = cx.index.get_one("File", &file) else {
                continue;
            };

            let companion = row
                .get("Version")
                .filter(|version| cx.index.contains("File", &[version.as_str()]));
            if let Some(companion) = companion {
                let attrs = cx.tree.attributes_mut(node)?;
                attrs.remove("DefaultVersion");
                attrs.set("CompanionFile", companion);
                companions += 1;
            }

            let directory = row
                .get("Component_")
                .and_then(|c| component_directory.get(&c).cloned());
            let name = row
                .get("FileName")
                .and_then(|n| NamePair::parse(&n).preferred().map(str::to_string));
            if let (Some(directory), Some(name)) = (directory, name) {
                let mut path = vec![SOURCE_ROOT.to_string()];
                path.extend(directories.source_segments(&directory));
                path.push(name);
                cx.tree.attributes_mut(node)?.set("Source", path.join("\\"));
                sourced += 1;
            }
        }
        Ok(UnitReport::new(
            UnitId::FileSource,
            sourced + companions,
            format!("{} source paths, {} companion files", sourced, companions),
        ))
    }
}

// ── Remove File Directory ───────────────────────────────────────────

/// Resolves the folder of a file removal: a directory when `DirProperty`
/// names one, otherwise a property holding the path.
pub struct RemoveFileDirectoryUnit;

impl LinkingUnit for RemoveFileDirectoryUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::RemoveFileDirectory
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let mut resolved = 0u32;
        for row in cx.rows("RemoveFile") {
            let (Some(key), Some(folder)) = (row.get("FileKey"), row.get("DirProperty")) else {
                continue;
            };
            let Some(node) = cx.index.get_one("RemoveFile", &key) else {
                continue;
            };
            let attribute = if cx.index.contains("Directory", &[folder.as_str()]) {
                "Directory"
            } else {
                "Property"
            };
            cx.tree.attributes_mut(node)?.set(attribute, folder);
            resolved += 1;
        }
        Ok(UnitReport::new(
            UnitId::RemoveFileDirectory,
            resolved,
            format!("{} removal folders resolved", resolved),
        ))
    }
}
