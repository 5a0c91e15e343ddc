/// Create a layer in keymap
#[macro_export]
macro_rules! layer {
    ([$([$($x: expr), +]), +]) => {
        [$([$($x), +]),+]
    };
}

/// Create a normal key. For example, `k!(A)` represents `Action::Emit(KeyCode::Hid(HidKeyCode::A))`
#[macro_export]
macro_rules! k {
    ($k: ident) => {
        $crate::action::Action::Emit($crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$k))
    };
}

/// Create a media (consumer page) key, e.g. `media!(VolumeIncrement)`
#[macro_export]
macro_rules! media {
    ($k: ident) => {
        $crate::action::Action::Emit($crate::keycode::KeyCode::Consumer($crate::keycode::ConsumerKey::$k))
    };
}

/// Create a normal key with modifier action, e.g. `wm!(C, ModifierCombination::LCTRL)` for `Ctrl+C`
#[macro_export]
macro_rules! wm {
    ($x: ident, $m: expr) => {
        $crate::action::Action::EmitWithModifier(
            $crate::keycode::KeyCode::Hid($crate::keycode::HidKeyCode::$x),
            $m,
        )
    };
}

/// Create a normal action: `Action`
#[macro_export]
macro_rules! a {
    ($a: ident) => {
        $crate::action::Action::$a
    };
}

/// Create a layer activate action. For example, `mo!(1)` activates layer 1 while held.
#[macro_export]
macro_rules! mo {
    ($x: literal) => {
        $crate::action::Action::Momentary($x)
    };
}

/// Create a macro action from a static [`MacroSequence`](crate::action::MacroSequence)
#[macro_export]
macro_rules! mc {
    ($seq: expr) => {
        $crate::action::Action::Macro(&$seq)
    };
}

/// Create an encoder binding: `encoder!(counter_clockwise, clockwise)`.
///
/// Only usable in `static`/`const` items, where the inner actions are promoted to `'static`.
#[macro_export]
macro_rules! encoder {
    ($ccw: expr, $cw: expr) => {
        $crate::action::Action::EncoderBinding { ccw: &$ccw, cw: &$cw }
    };
}
