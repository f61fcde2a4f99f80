//! # Token store: client-side persistence of the auth token
//!
//! The BlueberryBooks client persists exactly one value between runs: the bearer
//! token returned by the backend on login or registration. Everything else is
//! re-fetched from the backend on every read.
//!
//! | Store | Platform | Backing |
//! |-------|----------|---------|
//! | [`MemoryStore`] | all | shared in-process cell (tests, fallback) |
//! | [`FileStore`] | native | one file per key under a data directory |
//! | [`LocalStorageStore`] | wasm32 + `web` | browser `localStorage` |

mod token;
pub use token::{TokenStore, TOKEN_KEY};

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStorageStore;
