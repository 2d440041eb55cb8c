//! Component key paths.

use crate::decoder::{COMPONENT_ODBC_KEY_PATH, COMPONENT_REGISTRY_KEY_PATH};
use crate::error::DecompileResult;

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Marks the element a component's `KeyPath` names with `KeyPath="yes"`.
///
/// The key-path kind bits of the component's attributes select the table
/// the key is looked up in. A null key path makes the component's
/// directory the key path, which the component itself records.
pub struct ComponentKeyPathUnit;

impl LinkingUnit for ComponentKeyPathUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::ComponentKeyPath
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let mut marked = 0u32;
        for row in cx.rows("Component") {
            let Some(component) = row.get("Component") else {
                continue;
            };
            let Some(component_node) = cx.index.get_one("Component", &component) else {
                continue;
            };

            let Some(key_path) = row.get("KeyPath") else {
                cx.tree.attributes_mut(component_node)?.set("KeyPath", "yes");
                marked += 1;
                continue;
            };

            let bits = cx.integer(&row, "Attributes").unwrap_or(0);
            let table = if bits & COMPONENT_REGISTRY_KEY_PATH != 0 {
                "Registry"
            } else if bits & COMPONENT_ODBC_KEY_PATH != 0 {
                "ODBCDataSource"
            } else {
                "File"
            };

            match cx.index.get_one(table, &key_path) {
                Some(target) => {
                    cx.tree.attributes_mut(target)?.set("KeyPath", "yes");
                    marked += 1;
                }
                None => cx.missing_row(&row, table, &key_path),
            }
        }
        Ok(UnitReport::new(
            UnitId::ComponentKeyPath,
            marked,
            format!("{} key paths marked", marked),
        ))
    }
}
