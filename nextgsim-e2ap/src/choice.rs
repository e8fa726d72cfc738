//! ASN.1 CHOICE container
//!
//! Every "one of N alternatives" field of an E2AP message is represented by a
//! plain Rust enum generated with the [`choice!`](crate::choice!) macro. The
//! macro adds a uniform, type-driven access layer on top of the enum:
//!
//! - [`Choice`] exposes the discriminant, `is::<T>()`, `get::<T>()`,
//!   `get_if::<T>()`, `set()` and `into_inner::<T>()`
//! - [`Alternative`] is implemented for every declared alternative type, so
//!   reading or constructing a type that is not part of the choice fails to
//!   compile
//! - `visit` / `visit_mut` dispatch to a [`Visit`] / [`VisitMut`] handler by
//!   matching over the declared alternatives in order
//!
//! Construction, assignment, cloning and dropping are the native enum
//! operations, so the active alternative is always dropped exactly once.
//!
//! # Example
//!
//! ```
//! use nextgsim_e2ap::choice::{Choice, Visit};
//!
//! nextgsim_e2ap::choice! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum Value {
//!         Number(u32),
//!         Text(String),
//!     }
//! }
//!
//! let mut v = Value::from(7u32);
//! assert!(v.is::<u32>());
//! assert_eq!(v.get::<u32>(), Ok(&7));
//! assert!(v.get::<String>().is_err());
//!
//! v.set(String::from("seven"));
//! assert_eq!(v.alternative_name(), "Text");
//!
//! struct Len;
//! impl Visit<u32> for Len {
//!     type Output = usize;
//!     fn visit(&mut self, _: &u32) -> usize { 4 }
//! }
//! impl Visit<String> for Len {
//!     type Output = usize;
//!     fn visit(&mut self, s: &String) -> usize { s.len() }
//! }
//! assert_eq!(v.visit(&mut Len), 5);
//! ```

use thiserror::Error;

/// Access to an alternative that is not the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bad choice access on {choice}: requested {requested}, active alternative is {actual}")]
pub struct BadChoiceAccess {
    /// Name of the choice type
    pub choice: &'static str,
    /// Alternative that was requested
    pub requested: &'static str,
    /// Alternative that is actually stored
    pub actual: &'static str,
}

/// A closed set of alternative types, exactly one of which is active.
pub trait Choice: Sized {
    /// Name of the choice type, used for diagnostics.
    const NAME: &'static str;
    /// Alternative names in declaration order. The position of a name is the
    /// discriminant of that alternative.
    const ALTERNATIVES: &'static [&'static str];

    /// Returns the discriminant of the active alternative.
    fn index(&self) -> usize;

    /// Returns the name of the active alternative.
    fn alternative_name(&self) -> &'static str {
        Self::ALTERNATIVES
            .get(self.index())
            .copied()
            .unwrap_or("<invalid>")
    }

    /// Returns true if `T` is the active alternative.
    fn is<T: Alternative<Self>>(&self) -> bool {
        self.index() == T::INDEX
    }

    /// Returns a reference to the active alternative if it is a `T`.
    fn get<T: Alternative<Self>>(&self) -> Result<&T, BadChoiceAccess> {
        let actual = self.alternative_name();
        T::project(self).ok_or(BadChoiceAccess {
            choice: Self::NAME,
            requested: T::NAME,
            actual,
        })
    }

    /// Returns a mutable reference to the active alternative if it is a `T`.
    fn get_mut<T: Alternative<Self>>(&mut self) -> Result<&mut T, BadChoiceAccess> {
        let actual = self.alternative_name();
        T::project_mut(self).ok_or(BadChoiceAccess {
            choice: Self::NAME,
            requested: T::NAME,
            actual,
        })
    }

    /// Non-faulting variant of [`Choice::get`].
    fn get_if<T: Alternative<Self>>(&self) -> Option<&T> {
        T::project(self)
    }

    /// Non-faulting variant of [`Choice::get_mut`].
    fn get_if_mut<T: Alternative<Self>>(&mut self) -> Option<&mut T> {
        T::project_mut(self)
    }

    /// Replaces the active alternative, dropping the previous one.
    fn set<T: Alternative<Self>>(&mut self, value: T) {
        *self = value.inject();
    }

    /// Consumes the choice and returns the stored `T`, or gives the choice
    /// back unchanged if another alternative is active.
    fn into_inner<T: Alternative<Self>>(self) -> Result<T, Self> {
        T::extract(self)
    }
}

/// Membership of a type in a [`Choice`].
///
/// Implemented by the [`choice!`](crate::choice!) macro for every declared
/// alternative.
pub trait Alternative<C: Choice>: Sized {
    /// Discriminant of this alternative within `C`.
    const INDEX: usize;
    /// Name of this alternative within `C`.
    const NAME: &'static str;

    /// Wraps the value into the choice.
    fn inject(self) -> C;
    /// Borrows the value out of the choice if it is active.
    fn project(choice: &C) -> Option<&Self>;
    /// Mutably borrows the value out of the choice if it is active.
    fn project_mut(choice: &mut C) -> Option<&mut Self>;
    /// Moves the value out of the choice if it is active.
    fn extract(choice: C) -> Result<Self, C>;
}

/// Handler invoked with the active alternative of a choice.
pub trait Visit<T> {
    /// Result of the visit
    type Output;

    /// Called with a reference to the active alternative.
    fn visit(&mut self, value: &T) -> Self::Output;
}

/// Handler invoked with a mutable reference to the active alternative.
pub trait VisitMut<T> {
    /// Result of the visit
    type Output;

    /// Called with a mutable reference to the active alternative.
    fn visit_mut(&mut self, value: &mut T) -> Self::Output;
}

/// Position of `name` in `names`.
///
/// Evaluated at compile time by [`choice!`](crate::choice!); an undeclared
/// name aborts compilation.
#[doc(hidden)]
pub const fn position(names: &[&str], name: &str) -> usize {
    let mut i = 0;
    while i < names.len() {
        if str_eq(names[i], name) {
            return i;
        }
        i += 1;
    }
    panic!("alternative is not declared in this choice");
}

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Declares a choice enum and implements [`Choice`], [`Alternative`],
/// `From<T>` and the `visit` / `visit_mut` dispatchers for it.
///
/// Every alternative must carry a distinct type.
#[macro_export]
macro_rules! choice {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($ty:ty)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($ty),
            )+
        }

        impl $crate::choice::Choice for $name {
            const NAME: &'static str = ::core::stringify!($name);
            const ALTERNATIVES: &'static [&'static str] = &[$(::core::stringify!($variant)),+];

            fn index(&self) -> usize {
                match self {
                    $(
                        $name::$variant(_) => <$ty as $crate::choice::Alternative<$name>>::INDEX,
                    )+
                }
            }
        }

        $(
            impl $crate::choice::Alternative<$name> for $ty {
                const INDEX: usize = $crate::choice::position(
                    <$name as $crate::choice::Choice>::ALTERNATIVES,
                    ::core::stringify!($variant),
                );
                const NAME: &'static str = ::core::stringify!($variant);

                fn inject(self) -> $name {
                    $name::$variant(self)
                }

                fn project(choice: &$name) -> ::core::option::Option<&Self> {
                    match choice {
                        $name::$variant(value) => ::core::option::Option::Some(value),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    }
                }

                fn project_mut(choice: &mut $name) -> ::core::option::Option<&mut Self> {
                    match choice {
                        $name::$variant(value) => ::core::option::Option::Some(value),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    }
                }

                fn extract(choice: $name) -> ::core::result::Result<Self, $name> {
                    match choice {
                        $name::$variant(value) => ::core::result::Result::Ok(value),
                        #[allow(unreachable_patterns)]
                        other => ::core::result::Result::Err(other),
                    }
                }
            }

            impl ::core::convert::From<$ty> for $name {
                fn from(value: $ty) -> Self {
                    $name::$variant(value)
                }
            }
        )+

        impl $name {
            /// Invokes `visitor` with the active alternative.
            #[allow(dead_code)]
            pub fn visit<V, R>(&self, visitor: &mut V) -> R
            where
                $( V: $crate::choice::Visit<$ty, Output = R>, )+
            {
                match self {
                    $(
                        $name::$variant(value) => {
                            <V as $crate::choice::Visit<$ty>>::visit(visitor, value)
                        }
                    )+
                }
            }

            /// Invokes `visitor` with a mutable reference to the active alternative.
            #[allow(dead_code)]
            pub fn visit_mut<V, R>(&mut self, visitor: &mut V) -> R
            where
                $( V: $crate::choice::VisitMut<$ty, Output = R>, )+
            {
                match self {
                    $(
                        $name::$variant(value) => {
                            <V as $crate::choice::VisitMut<$ty>>::visit_mut(visitor, value)
                        }
                    )+
                }
            }
        }
    };
}
