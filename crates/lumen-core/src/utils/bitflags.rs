// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A macro declaring strongly typed flag sets over an integer.
//!
//! Every flag type in the renderer contracts (usages, clear masks, shader stage
//! masks, pool flags) is declared through [`lumen_bitflags!`](crate::lumen_bitflags).

/// Declares a `Copy` flag-set struct with named constants and a union operator.
#[macro_export]
#[doc(hidden)]
macro_rules! lumen_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// The set with no flag.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Returns `true` when no bit is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Returns `true` if every flag of `other` is set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Returns `true` if `self` and `other` share at least one flag.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags of `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut remaining = self.bits;
                let mut first = true;
                write!(f, "{}(", stringify!($name))?;
                $(
                    if ($flag_value != 0) && (remaining & $flag_value) == $flag_value {
                        if !first {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}", stringify!($flag_name))?;
                        remaining &= !$flag_value;
                        first = false;
                    }
                )*
                if first {
                    write!(f, "EMPTY")?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::lumen_bitflags;

    lumen_bitflags! {
        /// Flags used only by these tests.
        pub struct Access: u8 {
            const READ = 1 << 0;
            const WRITE = 1 << 1;
            const EXECUTE = 1 << 2;
            const READ_WRITE = (1 << 0) | (1 << 1);
        }
    }

    #[test]
    fn test_empty_set() {
        let access = Access::default();
        assert!(access.is_empty());
        assert!(access.contains(Access::EMPTY));
        assert!(!access.intersects(Access::READ));
        assert_eq!(format!("{access:?}"), "Access(EMPTY)");
    }

    #[test]
    fn test_composite_constant_contains_parts() {
        assert!(Access::READ_WRITE.contains(Access::READ));
        assert!(Access::READ_WRITE.contains(Access::WRITE));
        assert!(!Access::READ_WRITE.contains(Access::EXECUTE));
        assert_eq!(format!("{:?}", Access::READ_WRITE), "Access(READ | WRITE)");
    }

    #[test]
    fn test_insert_and_union() {
        let mut access = Access::READ;
        access.insert(Access::EXECUTE);
        assert_eq!(access, Access::READ | Access::EXECUTE);
        assert!(access.intersects(Access::READ_WRITE));
        assert!(!access.contains(Access::READ_WRITE));
        assert_eq!(format!("{access:?}"), "Access(READ | EXECUTE)");
    }
}
