/*!
 * Virtual File System Module
 * Pluggable source of executable images
 */

pub mod local;
pub mod memory;
pub mod paths;
pub mod traits;
pub mod types;

// Re-exports
pub use local::LocalFS;
pub use memory::MemFS;
pub use paths::translate_sdmc_path;
pub use traits::{FileSystem, OpenFile};
pub use types::{VfsError, VfsResult};
