//! Subcommands of frappe-porter.

pub(crate) mod common;
pub(crate) mod print_formats;
pub(crate) mod reports;
