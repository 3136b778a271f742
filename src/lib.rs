pub mod block_array;
pub mod clipboard;
pub mod compression;
pub mod copier;
pub mod error;
pub mod fill_session;
pub mod math;
pub mod nbt;
pub mod rotation;
pub mod session;
pub mod world;

pub use crate::block_array::BlockArray;
pub use crate::clipboard::{Clipboard, ClipboardManager};
pub use crate::copier::{Actor, Copier, EditorResult, StackDirection};
pub use crate::error::VoxStreamError;
pub use crate::fill_session::FillSession;
pub use crate::session::{OfflineSession, SessionSaver};
pub use crate::world::{MemoryWorld, World};

/// VoxStream版本号常量
pub const VXS_VERSION: u16 = 0x0100; // 1.0版本

/// 离线会话文件魔数常量
pub const VXS_MAGIC: &[u8; 8] = b"VXSTRM\0\0";

/// 空气方块ID
pub const AIR: u16 = 0;

/// 压缩算法枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    None = 0,
    Zstandard = 1,
    LZ4 = 2,
    Brotli = 3,
}
