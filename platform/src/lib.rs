//! imeswitch-platform
//!
//! Native input method switching. `Dispatcher` picks the backend for the
//! running OS once per process:
//! - Windows: IME conversion-mode toggling (`ImeToggleBackend` over IMM32)
//! - macOS: ASCII-capable input source selection (`InputSourceBackend` over Carbon TIS)
//! - anything else: a steady no-op
//!
//! Both backends are generic over their primitive operations, so their
//! logic is exercised on every OS with fakes.

use imeswitch_core::{InputMethodKind, InputMethodSwitcher};
use once_cell::sync::Lazy;

pub mod ime_toggle;
pub use ime_toggle::{ImeToggleBackend, ImmPrimitives, IME_CMODE_NATIVE};

pub mod input_source;
pub use input_source::{InputSourceBackend, InputSources};

#[cfg(windows)]
pub use ime_toggle::Win32Imm;

#[cfg(target_os = "macos")]
pub use input_source::CarbonTis;

static GLOBAL: Lazy<Dispatcher> = Lazy::new(|| {
    let dispatcher = Dispatcher::detect();
    tracing::debug!(backend = dispatcher.backend_name(), "input method dispatcher selected");
    dispatcher
});

/// The input method switcher for the running OS.
#[derive(Debug)]
pub enum Dispatcher {
    #[cfg(windows)]
    Windows(ImeToggleBackend<Win32Imm>),
    #[cfg(target_os = "macos")]
    MacOs(InputSourceBackend<CarbonTis>),
    Unsupported,
}

impl Dispatcher {
    /// Select the backend for the OS this binary was built for.
    #[allow(unreachable_code)]
    pub fn detect() -> Self {
        #[cfg(windows)]
        return Dispatcher::Windows(ImeToggleBackend::new(Win32Imm));
        #[cfg(target_os = "macos")]
        return Dispatcher::MacOs(InputSourceBackend::new(CarbonTis));
        Dispatcher::Unsupported
    }

    /// Process-wide dispatcher, detected on first use.
    pub fn global() -> &'static Dispatcher {
        &GLOBAL
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(windows)]
            Dispatcher::Windows(_) => "windows-imm",
            #[cfg(target_os = "macos")]
            Dispatcher::MacOs(_) => "macos-tis",
            Dispatcher::Unsupported => "unsupported",
        }
    }
}

impl InputMethodSwitcher for Dispatcher {
    fn switch_to_latin(&self) -> bool {
        match self {
            #[cfg(windows)]
            Dispatcher::Windows(backend) => backend.switch_to_latin(),
            #[cfg(target_os = "macos")]
            Dispatcher::MacOs(backend) => backend.switch_to_latin(),
            Dispatcher::Unsupported => false,
        }
    }

    fn switch_to_native(&self) -> bool {
        match self {
            #[cfg(windows)]
            Dispatcher::Windows(backend) => backend.switch_to_native(),
            #[cfg(target_os = "macos")]
            Dispatcher::MacOs(backend) => backend.switch_to_native(),
            Dispatcher::Unsupported => false,
        }
    }

    fn current_method(&self) -> InputMethodKind {
        match self {
            #[cfg(windows)]
            Dispatcher::Windows(backend) => backend.current_method(),
            #[cfg(target_os = "macos")]
            Dispatcher::MacOs(backend) => backend.current_method(),
            Dispatcher::Unsupported => InputMethodKind::Latin,
        }
    }

    fn is_supported(&self) -> bool {
        match self {
            #[cfg(windows)]
            Dispatcher::Windows(backend) => backend.is_supported(),
            #[cfg(target_os = "macos")]
            Dispatcher::MacOs(backend) => backend.is_supported(),
            Dispatcher::Unsupported => false,
        }
    }
}
