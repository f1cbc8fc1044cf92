//! Windows backend: toggles the IME conversion mode of the foreground window.
//!
//! The IME's Latin/native mode is a conversion flag of the window's input
//! context. Reading it is reliable; writing it directly is ignored by many
//! TSF-era IMEs, so the switch is done by synthesizing the Shift toggle the
//! user would press, and only when the flag differs from the target.

use imeswitch_core::{InputMethodKind, InputMethodSwitcher};

/// Native-mode bit of the IME conversion status.
pub const IME_CMODE_NATIVE: u32 = 0x0001;

/// Primary language ids treated as native input (Chinese, Japanese, Korean).
const NATIVE_PRIMARY_LANGUAGES: [u16; 3] = [0x04, 0x11, 0x12];

/// Raw IMM operations the backend is built from.
///
/// Implemented over Win32 on Windows and by fakes in tests.
pub trait ImmPrimitives {
    type Window: Copy;
    type Context: Copy;

    fn foreground_window(&self) -> Option<Self::Window>;

    /// Acquire the input context of `window`. Every acquired context is
    /// handed back through `release_context`.
    fn get_context(&self, window: Self::Window) -> Option<Self::Context>;

    fn release_context(&self, window: Self::Window, context: Self::Context);

    /// Conversion status flags, `None` if the query failed.
    fn conversion_status(&self, context: Self::Context) -> Option<u32>;

    fn set_open_status(&self, context: Self::Context, open: bool) -> bool;

    /// Press and release Shift. Returns whether both key events were injected.
    fn send_shift_toggle(&self) -> bool;

    /// Language id of the foreground keyboard layout.
    fn keyboard_layout_language(&self) -> Option<u16>;
}

/// An acquired input context, released on drop.
struct InputContext<'p, P: ImmPrimitives> {
    prims: &'p P,
    window: P::Window,
    context: P::Context,
}

impl<'p, P: ImmPrimitives> InputContext<'p, P> {
    fn acquire(prims: &'p P) -> Option<Self> {
        let window = prims.foreground_window()?;
        let context = prims.get_context(window)?;
        Some(Self {
            prims,
            window,
            context,
        })
    }

    fn conversion_status(&self) -> Option<u32> {
        self.prims.conversion_status(self.context)
    }
}

impl<P: ImmPrimitives> Drop for InputContext<'_, P> {
    fn drop(&mut self) {
        self.prims.release_context(self.window, self.context);
    }
}

/// Conversion-mode toggling over any `ImmPrimitives`.
#[derive(Debug, Default)]
pub struct ImeToggleBackend<P> {
    prims: P,
}

impl<P: ImmPrimitives> ImeToggleBackend<P> {
    pub fn new(prims: P) -> Self {
        Self { prims }
    }

    pub fn primitives(&self) -> &P {
        &self.prims
    }

    fn toggle_to(&self, native: bool) -> bool {
        let Some(ctx) = InputContext::acquire(&self.prims) else {
            tracing::trace!("no foreground input context");
            return false;
        };

        if native && !self.prims.set_open_status(ctx.context, true) {
            tracing::warn!("failed to open the IME");
        }

        let Some(status) = ctx.conversion_status() else {
            tracing::warn!("failed to read IME conversion status");
            return false;
        };
        if (status & IME_CMODE_NATIVE != 0) == native {
            return false;
        }

        let sent = self.prims.send_shift_toggle();
        if !sent {
            tracing::warn!("failed to inject the Shift toggle");
        }
        sent
    }
}

impl<P: ImmPrimitives> InputMethodSwitcher for ImeToggleBackend<P> {
    fn switch_to_latin(&self) -> bool {
        self.toggle_to(false)
    }

    fn switch_to_native(&self) -> bool {
        self.toggle_to(true)
    }

    fn current_method(&self) -> InputMethodKind {
        let status = InputContext::acquire(&self.prims).and_then(|ctx| ctx.conversion_status());
        match status {
            Some(flags) if flags & IME_CMODE_NATIVE != 0 => InputMethodKind::Native,
            Some(_) => InputMethodKind::Latin,
            None => match self.prims.keyboard_layout_language() {
                Some(lang) if NATIVE_PRIMARY_LANGUAGES.contains(&(lang & 0x3FF)) => {
                    InputMethodKind::Native
                }
                _ => InputMethodKind::Latin,
            },
        }
    }

    fn is_supported(&self) -> bool {
        true
    }
}

#[cfg(windows)]
pub use win32::Win32Imm;

#[cfg(windows)]
mod win32 {
    use super::ImmPrimitives;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Globalization::HIMC;
    use windows::Win32::UI::Input::Ime::{
        ImmGetContext, ImmGetConversionStatus, ImmReleaseContext, ImmSetOpenStatus,
        IME_CONVERSION_MODE, IME_SENTENCE_MODE,
    };
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetKeyboardLayout, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT,
        KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP, VK_SHIFT,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};

    /// IMM32 and user32 calls.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Win32Imm;

    fn shift_input(flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VK_SHIFT,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl ImmPrimitives for Win32Imm {
        type Window = HWND;
        type Context = HIMC;

        fn foreground_window(&self) -> Option<HWND> {
            let hwnd = unsafe { GetForegroundWindow() };
            (!hwnd.is_invalid()).then_some(hwnd)
        }

        fn get_context(&self, window: HWND) -> Option<HIMC> {
            let himc = unsafe { ImmGetContext(window) };
            (!himc.is_invalid()).then_some(himc)
        }

        fn release_context(&self, window: HWND, context: HIMC) {
            let released = unsafe { ImmReleaseContext(window, context) };
            if !released.as_bool() {
                tracing::warn!("ImmReleaseContext failed");
            }
        }

        fn conversion_status(&self, context: HIMC) -> Option<u32> {
            let mut conversion = IME_CONVERSION_MODE(0);
            let mut sentence = IME_SENTENCE_MODE(0);
            let ok = unsafe {
                ImmGetConversionStatus(context, Some(&mut conversion), Some(&mut sentence))
            };
            ok.as_bool().then_some(conversion.0)
        }

        fn set_open_status(&self, context: HIMC, open: bool) -> bool {
            unsafe { ImmSetOpenStatus(context, open) }.as_bool()
        }

        fn send_shift_toggle(&self) -> bool {
            let inputs = [
                shift_input(KEYBD_EVENT_FLAGS(0)),
                shift_input(KEYEVENTF_KEYUP),
            ];
            let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
            sent as usize == inputs.len()
        }

        fn keyboard_layout_language(&self) -> Option<u16> {
            let thread = self
                .foreground_window()
                .map(|hwnd| unsafe { GetWindowThreadProcessId(hwnd, None) })
                .unwrap_or(0);
            let hkl = unsafe { GetKeyboardLayout(thread) };
            let lang = (hkl.0 as usize & 0xFFFF) as u16;
            (lang != 0).then_some(lang)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Scriptable IMM with call counters.
    #[derive(Default)]
    struct FakeImm {
        no_window: bool,
        no_context: bool,
        status_fails: bool,
        native: Cell<bool>,
        layout: Option<u16>,
        acquired: Cell<u32>,
        released: Cell<u32>,
        toggles: Cell<u32>,
        opened: Cell<u32>,
    }

    impl ImmPrimitives for FakeImm {
        type Window = u32;
        type Context = u32;

        fn foreground_window(&self) -> Option<u32> {
            (!self.no_window).then_some(1)
        }

        fn get_context(&self, _window: u32) -> Option<u32> {
            if self.no_context {
                return None;
            }
            self.acquired.set(self.acquired.get() + 1);
            Some(7)
        }

        fn release_context(&self, _window: u32, context: u32) {
            assert_eq!(context, 7);
            self.released.set(self.released.get() + 1);
        }

        fn conversion_status(&self, _context: u32) -> Option<u32> {
            if self.status_fails {
                return None;
            }
            Some(if self.native.get() { IME_CMODE_NATIVE | 0x8 } else { 0x8 })
        }

        fn set_open_status(&self, _context: u32, _open: bool) -> bool {
            self.opened.set(self.opened.get() + 1);
            true
        }

        fn send_shift_toggle(&self) -> bool {
            self.toggles.set(self.toggles.get() + 1);
            self.native.set(!self.native.get());
            true
        }

        fn keyboard_layout_language(&self) -> Option<u16> {
            self.layout
        }
    }

    #[test]
    fn test_toggle_only_when_mode_differs() {
        let backend = ImeToggleBackend::new(FakeImm::default());
        assert!(!backend.switch_to_latin());
        assert_eq!(backend.primitives().toggles.get(), 0);

        assert!(backend.switch_to_native());
        assert_eq!(backend.current_method(), InputMethodKind::Native);
        assert!(!backend.switch_to_native());
        assert!(backend.switch_to_latin());

        let prims = backend.primitives();
        assert_eq!(prims.toggles.get(), 2);
        assert_eq!(prims.opened.get(), 2);
        assert_eq!(prims.acquired.get(), prims.released.get());
    }

    #[test]
    fn test_context_released_when_status_fails() {
        let backend = ImeToggleBackend::new(FakeImm {
            status_fails: true,
            ..FakeImm::default()
        });
        assert!(!backend.switch_to_native());
        assert!(!backend.switch_to_latin());
        let prims = backend.primitives();
        assert_eq!(prims.acquired.get(), 2);
        assert_eq!(prims.released.get(), 2);
        assert_eq!(prims.toggles.get(), 0);
    }

    #[test]
    fn test_no_window_is_a_quiet_failure() {
        let backend = ImeToggleBackend::new(FakeImm {
            no_window: true,
            ..FakeImm::default()
        });
        assert!(!backend.switch_to_native());
        assert_eq!(backend.primitives().acquired.get(), 0);
        assert_eq!(backend.primitives().released.get(), 0);
    }

    #[test]
    fn test_current_method_falls_back_to_layout() {
        let chinese = ImeToggleBackend::new(FakeImm {
            no_context: true,
            layout: Some(0x0804),
            ..FakeImm::default()
        });
        assert_eq!(chinese.current_method(), InputMethodKind::Native);

        let korean = ImeToggleBackend::new(FakeImm {
            no_context: true,
            layout: Some(0x0412),
            ..FakeImm::default()
        });
        assert_eq!(korean.current_method(), InputMethodKind::Native);

        let english = ImeToggleBackend::new(FakeImm {
            no_context: true,
            layout: Some(0x0409),
            ..FakeImm::default()
        });
        assert_eq!(english.current_method(), InputMethodKind::Latin);

        let unknown = ImeToggleBackend::new(FakeImm {
            no_context: true,
            ..FakeImm::default()
        });
        assert_eq!(unknown.current_method(), InputMethodKind::Latin);
    }
}
