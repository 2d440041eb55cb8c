//! Secure public properties.

use tracing::debug;

use crate::error::DecompileResult;

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Property whose value lists the secure public properties.
pub const SECURE_CUSTOM_PROPERTIES: &str = "SecureCustomProperties";

/// Marks every property listed in `SecureCustomProperties` with
/// `Secure="yes"` and removes the list itself from the document.
pub struct SecurePropertiesUnit;

impl LinkingUnit for SecurePropertiesUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::SecureProperties
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let Some(list) = cx.index.get_one("Property", SECURE_CUSTOM_PROPERTIES) else {
            return Ok(UnitReport::new(UnitId::SecureProperties, 0, "no secure properties"));
        };
        let value = cx
            .tree
            .get(list)?
            .attributes
            .get("Value")
            .unwrap_or_default()
            .to_string();

        let mut marked = 0u32;
        for name in value.split(';').map(str::trim).filter(|n| !n.is_empty()) {
            let property = cx.ensure_property(name)?;
            cx.tree.attributes_mut(property)?.set("Secure", "yes");
            marked += 1;
        }

        cx.tree.prune(list)?;
        cx.index.remove(list);
        debug!(properties = marked, "pruned {}", SECURE_CUSTOM_PROPERTIES);

        Ok(UnitReport::new(
            UnitId::SecureProperties,
            marked,
            format!("{} properties marked secure", marked),
        ))
    }
}
