// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros shared by the conveyor crates.

/// `Display` for enums whose variants map to fixed strings.
///
/// Data-carrying variants ignore their fields with `(..)`.
///
/// ```ignore
/// crate::simple_display! {
///     TaskStatus {
///         Passed => "passed",
///         Failed => "failed",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let name = match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                };
                f.write_str(name)
            }
        }
    };
}

/// Fixture builder for a record type, compiled only for tests and the
/// `test-support` feature.
///
/// `into` fields get `impl Into<T>` setters, `set` fields plain setters, and
/// `computed` fields are filled in by `build()` with no setter.
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            into { $( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)? }
            set { $( $set_field:ident : $set_ty:ty = $set_default:expr ),* $(,)? }
            computed { $( $comp_field:ident : $comp_ty:ty = $comp_expr:expr ),* $(,)? }
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $( $into_field: $into_ty, )*
            $( $set_field: $set_ty, )*
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $( $into_field: $into_default.into(), )*
                    $( $set_field: $set_default, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $(
                pub fn $into_field(self, v: impl Into<$into_ty>) -> Self {
                    Self { $into_field: v.into(), ..self }
                }
            )*
            $(
                pub fn $set_field(self, v: $set_ty) -> Self {
                    Self { $set_field: v, ..self }
                }
            )*

            pub fn build(self) -> $target {
                $target {
                    $( $into_field: self.$into_field, )*
                    $( $set_field: self.$set_field, )*
                    $( $comp_field: $comp_expr, )*
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}

/// Chained `with`-style setters, expanded inside an `impl` block.
///
/// ```ignore
/// impl CompileContext {
///     cv_core::setters! {
///         into { default_image: String }
///         set { task_id: i64 }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $( into { $( $into_field:ident : $into_ty:ty ),* $(,)? } )?
        $( set { $( $set_field:ident : $set_ty:ty ),* $(,)? } )?
    ) => {
        $($(
            pub fn $into_field(self, v: impl Into<$into_ty>) -> Self {
                Self { $into_field: v.into(), ..self }
            }
        )*)?
        $($(
            pub fn $set_field(self, v: $set_ty) -> Self {
                Self { $set_field: v, ..self }
            }
        )*)?
    };
}
