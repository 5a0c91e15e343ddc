use core::ops::BitOr;

use bitfield_struct::bitfield;

use crate::keycode::HidKeyCode;

/// Modifiers attached to a chord, e.g. `Ctrl+Shift` in `Ctrl+Shift+Grave`.
///
/// Left and right modifiers can be mixed freely, the layout is LSB first:
///
/// | bit7 | bit6 | bit5 | bit4 | bit3 | bit2 | bit1 | bit0 |
/// | --- | --- | --- | --- | --- | --- | --- | --- |
/// | RGUI | RALT | RSHIFT | RCTRL | LGUI | LALT | LSHIFT | LCTRL |
///
/// This is exactly the modifier byte of a HID boot keyboard report.
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Eq, PartialEq)]
pub struct ModifierCombination {
    pub left_ctrl: bool,
    pub left_shift: bool,
    pub left_alt: bool,
    pub left_gui: bool,
    pub right_ctrl: bool,
    pub right_shift: bool,
    pub right_alt: bool,
    pub right_gui: bool,
}

impl BitOr for ModifierCombination {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

impl ModifierCombination {
    pub const LCTRL: Self = Self::new().with_left_ctrl(true);
    pub const LSHIFT: Self = Self::new().with_left_shift(true);
    pub const LALT: Self = Self::new().with_left_alt(true);
    pub const LGUI: Self = Self::new().with_left_gui(true);
    pub const RCTRL: Self = Self::new().with_right_ctrl(true);
    pub const RSHIFT: Self = Self::new().with_right_shift(true);
    pub const RALT: Self = Self::new().with_right_alt(true);
    pub const RGUI: Self = Self::new().with_right_gui(true);

    /// `const` version of `|`, usable in static keymaps
    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.into_bits() | other.into_bits())
    }

    pub const fn is_empty(self) -> bool {
        self.into_bits() == 0
    }

    /// Modifier keycodes of the combination, in press order (LCtrl first, RGui last).
    pub fn keycodes(self) -> impl DoubleEndedIterator<Item = HidKeyCode> + Clone {
        let bits = self.into_bits();
        MODIFIER_KEYCODES
            .iter()
            .enumerate()
            .filter(move |(i, _)| bits & (1 << i) != 0)
            .map(|(_, k)| *k)
    }
}

const MODIFIER_KEYCODES: [HidKeyCode; 8] = [
    HidKeyCode::LCtrl,
    HidKeyCode::LShift,
    HidKeyCode::LAlt,
    HidKeyCode::LGui,
    HidKeyCode::RCtrl,
    HidKeyCode::RShift,
    HidKeyCode::RAlt,
    HidKeyCode::RGui,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bits_match_hid_byte() {
        let m = ModifierCombination::LCTRL | ModifierCombination::LSHIFT;
        assert_eq!(m.into_bits(), 0b0000_0011);
        assert_eq!(ModifierCombination::RGUI.into_bits(), 0b1000_0000);
        assert_eq!(
            ModifierCombination::LGUI.union(ModifierCombination::LSHIFT),
            ModifierCombination::LGUI | ModifierCombination::LSHIFT
        );
    }

    #[test]
    fn test_modifier_keycodes_order() {
        let m = ModifierCombination::LGUI | ModifierCombination::LCTRL;
        let mut it = m.keycodes();
        assert_eq!(it.next(), Some(HidKeyCode::LCtrl));
        assert_eq!(it.next(), Some(HidKeyCode::LGui));
        assert_eq!(it.next(), None);
        assert_eq!(m.keycodes().rev().next(), Some(HidKeyCode::LGui));
        assert!(ModifierCombination::new().keycodes().next().is_none());
    }
}
