//! Logical keypad codes.
use crate::constants::KEY_COUNT;

/// One of the 16 keys of the COSMAC VIP hexadecimal keypad.
///
/// Hosts map their own physical input onto these codes. The "no key"
/// case is expressed as `Option::None` wherever the VM accepts a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    /// All keys, in keycode order.
    #[rustfmt::skip]
    pub const ALL: [KeyCode; KEY_COUNT as usize] = [
        Self::Key0, Self::Key1, Self::Key2, Self::Key3,
        Self::Key4, Self::Key5, Self::Key6, Self::Key7,
        Self::Key8, Self::Key9, Self::KeyA, Self::KeyB,
        Self::KeyC, Self::KeyD, Self::KeyE, Self::KeyF,
    ];

    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Bit of this key in a 16-bit keypad state.
    #[inline(always)]
    pub(crate) fn mask(&self) -> u16 {
        1 << self.as_u8()
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(key_id as usize)
            .copied()
            .ok_or(InvalidKeyCode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < 16")
    }
}

#[cfg(feature = "serde")]
mod de {
    use std::fmt::Display;

    use num_traits::AsPrimitive;
    use serde::de::{Deserialize, Error, Expected, Unexpected, Visitor};

    use super::*;

    impl Expected for InvalidKeyCode {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            <Self as Display>::fmt(self, f)
        }
    }

    impl<'de> Deserialize<'de> for KeyCode {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            // YAML integer type
            deserializer.deserialize_i64(KeyCodeVisitor)
        }
    }

    struct KeyCodeVisitor;

    impl KeyCodeVisitor {
        /// Narrow any integer into a keycode, rejecting values outside 0x0-0xF.
        #[inline]
        fn to_key<N, E>(val: N) -> Result<KeyCode, E>
        where
            N: AsPrimitive<i64>,
            E: Error,
        {
            let n = val.as_();
            if (0..KEY_COUNT as i64).contains(&n) {
                KeyCode::try_from(n as u8)
                    .map_err(|err| E::invalid_value(Unexpected::Signed(n), &err))
            } else {
                Err(E::invalid_value(Unexpected::Signed(n), &InvalidKeyCode))
            }
        }
    }

    impl<'de> Visitor<'de> for KeyCodeVisitor {
        type Value = KeyCode;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "an integer key code between 0 and 15")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Self::to_key(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if v >= KEY_COUNT as u64 {
                return Err(E::invalid_value(Unexpected::Unsigned(v), &InvalidKeyCode));
            }
            Self::to_key(v)
        }
    }
}
