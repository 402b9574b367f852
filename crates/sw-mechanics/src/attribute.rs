//! Attribute value to modifier conversion.

use sw_core::{AttributeModifiers, AttributeSet};

/// The modifier for an attribute value: `floor((value - 10) / 2)`.
///
/// No bounds are enforced; values outside 3..=18 simply follow the formula.
pub fn modifier_of(value: i32) -> i32 {
    // i64 so extreme values cannot overflow the subtraction.
    (i64::from(value) - 10).div_euclid(2) as i32
}

/// Modifiers for every attribute in the set.
pub fn attribute_modifiers(attributes: &AttributeSet) -> AttributeModifiers {
    AttributeModifiers::from_set(attributes, modifier_of)
}
