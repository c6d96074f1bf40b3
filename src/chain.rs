//! Walking a cause chain from the outermost error toward its root.
//!
//! `is` answers "is this exact instance somewhere in the chain" and
//! `find::<V>()` answers "is any node in the chain a `V`". Both stop after
//! [`WalkLimits::max_depth`] hops.

use crate::error::{
    ApiError, DatabaseError, Error, ErrorKind, PlainError, ValidationError, WrappedError,
};
use log::warn;
use serde::Deserialize;

/// Hops followed past the outermost node before a walk gives up.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Bounds for chain traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkLimits {
    pub max_depth: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Iterator over an error and its causes, outermost first.
///
/// Yields at most `max_depth + 1` nodes.
pub struct Chain<'a> {
    next: Option<&'a Error>,
    hops_left: usize,
}

impl<'a> Chain<'a> {
    pub fn new(err: &'a Error, limits: WalkLimits) -> Self {
        Self {
            next: Some(err),
            hops_left: limits.max_depth,
        }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Error;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        match current.cause() {
            Some(cause) if self.hops_left == 0 => {
                warn!(
                    "error chain exceeds walk limit, stopping before: {}",
                    cause.kind().name()
                );
            }
            Some(cause) => {
                self.hops_left -= 1;
                self.next = Some(cause);
            }
            None => {}
        }
        Some(current)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// One of the five concrete variant types, selectable by `find::<V>()`.
pub trait Variant: sealed::Sealed {
    fn from_kind(kind: &ErrorKind) -> Option<&Self>;
}

macro_rules! impl_variant {
    ($($ty:ident => $tag:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Variant for $ty {
                fn from_kind(kind: &ErrorKind) -> Option<&Self> {
                    match kind {
                        ErrorKind::$tag(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_variant!(
    ValidationError => Validation,
    DatabaseError => Database,
    ApiError => Api,
    WrappedError => Wrapped,
    PlainError => Plain,
);

impl Error {
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(self, WalkLimits::default())
    }

    pub fn chain_with(&self, limits: WalkLimits) -> Chain<'_> {
        Chain::new(self, limits)
    }

    /// Deepest error reachable within the default walk limit.
    pub fn root_cause(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    /// True if `target` itself (not an equal copy) appears in the chain.
    pub fn is(&self, target: &Error) -> bool {
        self.is_within(target, WalkLimits::default())
    }

    pub fn is_within(&self, target: &Error, limits: WalkLimits) -> bool {
        self.chain_with(limits).any(|node| node.same_instance(target))
    }

    /// First node, starting from `self`, whose variant is `V`.
    pub fn find<V: Variant>(&self) -> Option<&V> {
        self.find_within(WalkLimits::default())
    }

    pub fn find_within<V: Variant>(&self, limits: WalkLimits) -> Option<&V> {
        self.chain_with(limits)
            .find_map(|node| V::from_kind(node.kind()))
    }
}

/// Free-function form of [`Error::is`].
pub fn is(err: &Error, target: &Error) -> bool {
    err.is(target)
}

/// Free-function form of [`Error::find`].
pub fn find<V: Variant>(err: &Error) -> Option<&V> {
    err.find::<V>()
}
