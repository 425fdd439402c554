//! This module provides utility functions needed throughout frappe-porter.
//!
//! Currently these are the file system helpers used to lay out app packages.

pub(crate) mod file_fs;
