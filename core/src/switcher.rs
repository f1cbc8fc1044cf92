//! Seams to the outside world: input method switching and user feedback.

use crate::model::InputMethodKind;

/// The input-method switching capability.
///
/// Every operation is safe to call on any platform. A backend that cannot
/// switch reports `false` from both switch calls, `Latin` from
/// `current_method` and `false` from `is_supported`.
pub trait InputMethodSwitcher {
    /// Switch to the Latin input mode. Returns `true` only if a transition
    /// was actually performed; `false` covers both "already Latin" and
    /// "could not switch".
    fn switch_to_latin(&self) -> bool;

    /// Switch to the native input mode, same return contract as
    /// `switch_to_latin`.
    fn switch_to_native(&self) -> bool;

    /// Best-effort reading of the active input method.
    fn current_method(&self) -> InputMethodKind;

    /// Whether this backend can switch at all on the running system.
    fn is_supported(&self) -> bool;

    /// Switch to `target`.
    fn switch_to(&self, target: InputMethodKind) -> bool {
        match target {
            InputMethodKind::Latin => self.switch_to_latin(),
            InputMethodKind::Native => self.switch_to_native(),
        }
    }
}

impl<T: InputMethodSwitcher + ?Sized> InputMethodSwitcher for &T {
    fn switch_to_latin(&self) -> bool {
        (**self).switch_to_latin()
    }

    fn switch_to_native(&self) -> bool {
        (**self).switch_to_native()
    }

    fn current_method(&self) -> InputMethodKind {
        (**self).current_method()
    }

    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }
}

/// Transient user feedback, e.g. a hint next to the caret.
///
/// Fire-and-forget: implementations swallow their own failures and must not
/// block.
pub trait Notifier {
    fn notify(&self, text: &str);
}

impl<F: Fn(&str)> Notifier for F {
    fn notify(&self, text: &str) {
        self(text)
    }
}

/// A notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _text: &str) {}
}

/// A notifier that logs feedback through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, text: &str) {
        tracing::info!(hint = text, "input method switched");
    }
}
