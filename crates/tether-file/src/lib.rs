//! tether-file - Filesystem-backed credential store.

mod store;

pub use store::{FileCredentialStore, SESSION_FILE, default_path};
