//! 对象存储
//!
//! 核心流程只依赖 [`ObjectStore`] trait：
//! - `LocalObjectStore`：以本地目录模拟 bucket
//! - `MemoryObjectStore`：进程内存储，用于测试和演示模式

mod local;
mod memory;
mod object_store;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use object_store::{validate_key, ObjectStore, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
pub(crate) use object_store::join_key;
