//! Plain-text output for terminals and pipes that ask for it.

use std::ffi::OsStr;

/// `NO_COLOR` only counts when it holds a value.
fn plain_output_requested(no_color: Option<&OsStr>) -> bool {
    no_color.is_some_and(|value| !value.is_empty())
}

/// Switch `colored` off for the rest of the process when `NO_COLOR` is set.
pub fn init_color() {
    if plain_output_requested(std::env::var_os("NO_COLOR").as_deref()) {
        colored::control::set_override(false);
    }
}
