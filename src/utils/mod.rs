//! Cross-platform utilities
//!
//! - [`fs`] - directory and file primitives used by the install pipeline
//! - [`platform`] - platform directories and POSIX path normalization

pub mod fs;
pub mod platform;

pub use fs::{clean_dir, copy_files_filtered, ensure_dir, remove_dir_all, write_text_file};
pub use platform::{
    command_exists, get_cache_dir, get_data_dir, is_windows, resolve_path, to_posix_path,
};
