// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud variable naming.
//!
//! Cloud variables are conventionally named with a cloud symbol and a space
//! in front of the user-visible name (e.g. `☁ score`). Public accessors accept
//! either form and normalize to the prefixed one.

use std::borrow::Cow;

/// Prefix carried by every cloud variable name.
pub const CLOUD_PREFIX: &str = "☁ ";

/// Returns `name` with [`CLOUD_PREFIX`] prepended if it is missing.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if name.starts_with(CLOUD_PREFIX) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{}{}", CLOUD_PREFIX, name))
    }
}

/// Returns `name` without [`CLOUD_PREFIX`], for display.
pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(CLOUD_PREFIX).unwrap_or(name)
}

#[cfg(test)]
#[path = "variable_tests.rs"]
mod tests;
