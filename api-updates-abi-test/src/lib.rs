//! Layout checks for every type that crosses the boundary.
//!
//! A revision that changes a published layout must live in a new scope, and
//! anything extended in place (argument blocks, vtables) may only grow at
//! the end. The macros assert sizes and offsets at compile time; the helpers
//! compare whole layouts so tests can state "old is a prefix of new".

use core::mem::{align_of, size_of};
use core::ops::Range;

#[doc(hidden)]
pub use memoffset;

/// Pin the size of a published boundary type. Fails the build if it moves.
#[macro_export]
macro_rules! verify_size {
    ($type:ty, $published:expr) => {
        const _: () = assert!(
            ::core::mem::size_of::<$type>() == $published,
            concat!("published size of `", stringify!($type), "` changed")
        );
    };
}

/// Pin where a published field lives. Fields a shim or an older binary reads
/// must never move.
#[macro_export]
macro_rules! verify_offset {
    ($type:path, $field:ident, $published:expr) => {
        const _: () = assert!(
            $crate::memoffset::offset_of!($type, $field) == $published,
            concat!(
                "`",
                stringify!($type),
                "::",
                stringify!($field),
                "` moved from its published offset"
            )
        );
    };
}

/// Pin the alignment of a published boundary type.
#[macro_export]
macro_rules! verify_align {
    ($type:ty, $published:expr) => {
        const _: () = assert!(
            ::core::mem::align_of::<$type>() == $published,
            concat!("published alignment of `", stringify!($type), "` changed")
        );
    };
}

/// Collect the field spans of `$type` in declaration order.
#[macro_export]
macro_rules! layout_of {
    ($type:path { $($field:ident),* $(,)? }) => {
        $crate::StructLayout::new(
            stringify!($type),
            ::core::mem::size_of::<$type>(),
            ::core::mem::align_of::<$type>(),
            vec![$($crate::FieldLayout::new(
                stringify!($field),
                $crate::memoffset::span_of!($type, $field),
            )),*],
        )
    };
}

/// Where a field sits inside its struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub span: Range<usize>,
}

impl FieldLayout {
    pub fn new(name: &'static str, span: Range<usize>) -> Self {
        Self { name, span }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: &'static str,
    pub size: usize,
    pub align: usize,
    pub fields: Vec<FieldLayout>,
}

impl StructLayout {
    pub fn new(name: &'static str, size: usize, align: usize, fields: Vec<FieldLayout>) -> Self {
        Self {
            name,
            size,
            align,
            fields,
        }
    }

    /// Whether every field of `self` sits at the same place in `newer`.
    ///
    /// This is what lets a shim read an old layout as the head of a new one.
    pub fn is_prefix_of(&self, newer: &StructLayout) -> bool {
        self.fields.len() <= newer.fields.len()
            && self
                .fields
                .iter()
                .zip(&newer.fields)
                .all(|(old, new)| old == new)
            && newer.fields[self.fields.len()..]
                .iter()
                .all(|appended| appended.span.start >= self.fields_end())
    }

    /// End of the last field, ignoring tail padding.
    pub fn fields_end(&self) -> usize {
        self.fields.iter().map(|f| f.span.end).max().unwrap_or(0)
    }
}

/// Outcome of comparing a type against its published layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCheck {
    pub type_name: &'static str,
    pub size_ok: bool,
    pub align_ok: bool,
    /// Every published field is still where older binaries expect it.
    pub fields_ok: bool,
}

impl LayoutCheck {
    pub fn is_compatible(&self) -> bool {
        self.size_ok && self.align_ok && self.fields_ok
    }

    /// Names of the properties that broke, for assertion messages.
    pub fn mismatches(&self) -> Vec<&'static str> {
        [
            (self.size_ok, "size"),
            (self.align_ok, "alignment"),
            (self.fields_ok, "field placement"),
        ]
        .into_iter()
        .filter_map(|(ok, what)| (!ok).then_some(what))
        .collect()
    }
}

/// Compare a frozen type against its published size and alignment.
///
/// Frozen types have no appended fields, so field placement is covered by
/// [`verify_offset!`] alone.
pub fn verify_frozen_layout<T>(
    type_name: &'static str,
    published_size: usize,
    published_align: usize,
) -> LayoutCheck {
    LayoutCheck {
        type_name,
        size_ok: size_of::<T>() == published_size,
        align_ok: align_of::<T>() == published_align,
        fields_ok: true,
    }
}

/// Compare a revision against the layout it must extend. The revision may
/// grow but never shrink, realign, or move a published field.
pub fn verify_extension(old: &StructLayout, new: &StructLayout) -> LayoutCheck {
    LayoutCheck {
        type_name: new.name,
        size_ok: new.size >= old.size,
        align_ok: new.align == old.align,
        fields_ok: old.is_prefix_of(new),
    }
}
