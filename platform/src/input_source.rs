//! macOS backend: Text Input Source selection.
//!
//! Switching to Latin selects the current ASCII-capable keyboard source.
//! There is no equivalent single call for "the native source", so switching
//! to native is not performed and always reports `false`.

use imeswitch_core::{InputMethodKind, InputMethodSwitcher};

/// Text Input Source operations the backend is built from.
pub trait InputSources {
    /// A retained source reference. Compared by identity.
    type Source: Copy + PartialEq;

    fn copy_current(&self) -> Option<Self::Source>;

    fn copy_ascii_capable(&self) -> Option<Self::Source>;

    fn select(&self, source: Self::Source) -> bool;

    /// Release a reference obtained from one of the `copy_*` calls.
    fn release(&self, source: Self::Source);
}

/// A copied source, released on drop.
struct Retained<'p, P: InputSources> {
    prims: &'p P,
    source: P::Source,
}

impl<'p, P: InputSources> Retained<'p, P> {
    fn wrap(prims: &'p P, source: Option<P::Source>) -> Option<Self> {
        source.map(|source| Self { prims, source })
    }
}

impl<P: InputSources> Drop for Retained<'_, P> {
    fn drop(&mut self) {
        self.prims.release(self.source);
    }
}

#[derive(Debug, Default)]
pub struct InputSourceBackend<P> {
    prims: P,
}

impl<P: InputSources> InputSourceBackend<P> {
    pub fn new(prims: P) -> Self {
        Self { prims }
    }

    pub fn primitives(&self) -> &P {
        &self.prims
    }

    fn current(&self) -> Option<Retained<'_, P>> {
        Retained::wrap(&self.prims, self.prims.copy_current())
    }

    fn ascii_capable(&self) -> Option<Retained<'_, P>> {
        Retained::wrap(&self.prims, self.prims.copy_ascii_capable())
    }
}

impl<P: InputSources> InputMethodSwitcher for InputSourceBackend<P> {
    fn switch_to_latin(&self) -> bool {
        let Some(ascii) = self.ascii_capable() else {
            tracing::warn!("no ASCII-capable input source");
            return false;
        };
        if let Some(current) = self.current() {
            if current.source == ascii.source {
                return false;
            }
        }
        let selected = self.prims.select(ascii.source);
        if !selected {
            tracing::warn!("TISSelectInputSource failed");
        }
        selected
    }

    fn switch_to_native(&self) -> bool {
        tracing::trace!("switching to a native input source is not supported on macOS");
        false
    }

    fn current_method(&self) -> InputMethodKind {
        // Latin only when the active source is known to be the ASCII-capable one
        match (self.current(), self.ascii_capable()) {
            (Some(current), Some(ascii)) if current.source == ascii.source => {
                InputMethodKind::Latin
            }
            _ => InputMethodKind::Native,
        }
    }

    fn is_supported(&self) -> bool {
        true
    }
}

#[cfg(target_os = "macos")]
pub use carbon::CarbonTis;

#[cfg(target_os = "macos")]
mod carbon {
    use super::InputSources;
    use std::ffi::c_void;

    #[link(name = "Carbon", kind = "framework")]
    unsafe extern "C" {
        fn TISCopyCurrentKeyboardInputSource() -> *const c_void;
        fn TISCopyCurrentASCIICapableKeyboardInputSource() -> *const c_void;
        fn TISSelectInputSource(inputSource: *const c_void) -> i32;
    }

    #[link(name = "CoreFoundation", kind = "framework")]
    unsafe extern "C" {
        fn CFRelease(cf: *const c_void);
    }

    /// Carbon Text Input Source Services.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct CarbonTis;

    impl InputSources for CarbonTis {
        type Source = *const c_void;

        fn copy_current(&self) -> Option<*const c_void> {
            let source = unsafe { TISCopyCurrentKeyboardInputSource() };
            (!source.is_null()).then_some(source)
        }

        fn copy_ascii_capable(&self) -> Option<*const c_void> {
            let source = unsafe { TISCopyCurrentASCIICapableKeyboardInputSource() };
            (!source.is_null()).then_some(source)
        }

        fn select(&self, source: *const c_void) -> bool {
            // noErr
            unsafe { TISSelectInputSource(source) == 0 }
        }

        fn release(&self, source: *const c_void) {
            unsafe { CFRelease(source) }
        }
    }
}
