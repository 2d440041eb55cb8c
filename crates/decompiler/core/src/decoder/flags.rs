//! Bit-flag decomposition.

use msi_document::Attributes;

/// One bit (or bit group) mapped to an attribute value.
#[derive(Clone, Copy, Debug)]
pub struct BitFlag {
    pub mask: i64,
    pub attribute: &'static str,
    pub value: &'static str,
}

pub const fn flag(mask: i64, attribute: &'static str, value: &'static str) -> BitFlag {
    BitFlag {
        mask,
        attribute,
        value,
    }
}

/// Set the attribute of every flag whose bits are all present.
///
/// Returns the bits not covered by `flags` or `consumed`; callers report
/// a non-zero remainder as unknown bits.
pub fn apply_flags(bits: i64, flags: &[BitFlag], consumed: i64, attrs: &mut Attributes) -> i64 {
    let mut known = consumed;
    for f in flags {
        known |= f.mask;
        if bits & f.mask == f.mask {
            attrs.set(f.attribute, f.value);
        }
    }
    bits & !known
}

/// Whether more than one of the mutually exclusive masks is set.
pub fn conflicting(bits: i64, masks: &[i64]) -> bool {
    masks.iter().filter(|m| bits & **m != 0).count() > 1
}
