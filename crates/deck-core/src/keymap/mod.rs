//! Key catalogue and platform key code translation tables.
//!
//! The canonical representation is [`Key`], identified by its lowercase name.
//! Platform-specific codes are produced only at the injection boundary and
//! read back only at the keyboard hook boundary.

pub mod key;
pub mod linux_x11;
pub mod windows_vk;

pub use key::{Key, UnknownKey, MAX_FUNCTION_KEY, PRESS_KEY_CATALOGUE};

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a Windows Virtual Key code to a [`Key`].
    ///
    /// Returns `None` if `vk` is outside the key catalogue.
    pub fn windows_vk_to_key(vk: u8) -> Option<Key> {
        windows_vk::vk_to_key(vk)
    }

    /// Translates a [`Key`] to a Windows Virtual Key code.
    ///
    /// Returns `None` if the key has no Windows VK equivalent.
    pub fn key_to_windows_vk(key: Key) -> Option<u8> {
        windows_vk::key_to_vk(key)
    }

    /// Translates a [`Key`] to an X11 KeySym value for the Linux injector.
    pub fn key_to_x11_keysym(key: Key) -> Option<u32> {
        linux_x11::key_to_keysym(key)
    }

    /// Translates a text character to the X11 KeySym that types it.
    pub fn char_to_x11_keysym(c: char) -> u32 {
        linux_x11::char_to_keysym(c)
    }
}
