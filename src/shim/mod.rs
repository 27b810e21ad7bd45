/*!
 * ABI Shim
 * IPC surface offered to launched homebrew processes
 */

pub mod abi;
pub mod errors;
pub mod loader_config;

pub use abi::HbAbiShim;
pub use errors::{ShimError, ShimResult};
pub use loader_config::{AppletType, LoaderConfigEntry, LoaderConfigKey};
