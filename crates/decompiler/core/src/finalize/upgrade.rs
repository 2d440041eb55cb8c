//! Upgrade detection groups.

use msi_document::{NodeId, NodeKind};

use crate::error::DecompileResult;

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Groups `UpgradeVersion` nodes under one `Upgrade` per upgrade code, in
/// order of first appearance.
///
/// A property that only receives the detected product codes carries no
/// value of its own; the `UpgradeVersion` implies it, so the bare
/// `Property` node is removed.
pub struct UpgradeGroupsUnit;

impl LinkingUnit for UpgradeGroupsUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::UpgradeGroups
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let root = cx.tree.root();
        let mut groups: Vec<(String, NodeId)> = Vec::new();
        let mut pruned = 0u32;

        for row in cx.rows("Upgrade") {
            let key = row.row.key_values(row.definition);
            let lookup: Vec<&str> = key.iter().map(String::as_str).collect();
            let Some(version) = cx.index.get("Upgrade", &lookup) else {
                continue;
            };
            let code = row.get("UpgradeCode").unwrap_or_default();

            let group = match groups.iter().find(|(c, _)| *c == code) {
                Some((_, group)) => *group,
                None => {
                    let group = cx
                        .tree
                        .create_child(root, NodeKind::Upgrade, [("Id", code.as_str())].into())?;
                    groups.push((code, group));
                    group
                }
            };
            cx.tree.attach(group, version)?;

            if let Some(property) = row.get("ActionProperty") {
                let bare = cx
                    .index
                    .get_one("Property", &property)
                    .filter(|p| {
                        cx.tree
                            .get(*p)
                            .map(|n| !n.attributes.contains("Value"))
                            .unwrap_or(false)
                    });
                if let Some(node) = bare {
                    cx.tree.prune(node)?;
                    cx.index.remove(node);
                    pruned += 1;
                }
            }
        }

        Ok(UnitReport::new(
            UnitId::UpgradeGroups,
            groups.len() as u32 + pruned,
            format!("{} upgrade groups, {} implied properties removed", groups.len(), pruned),
        ))
    }
}
