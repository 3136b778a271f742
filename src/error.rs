use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum VoxStreamError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("无效的魔数")]
    InvalidMagic,

    #[error("不支持的版本: {0}")]
    UnsupportedVersion(u16),

    #[error("不支持的压缩类型: {0}")]
    UnsupportedCompression(u8),

    #[error("剪贴板为空")]
    EmptyClipboard,

    #[error("无效的旋转角度: {0}（必须是90的倍数）")]
    InvalidRotation(i32),

    #[error("无效的参数: {0}")]
    InvalidArgument(String),

    #[error("数据损坏: {0}")]
    CorruptData(String),

    #[error("填充会话已关闭")]
    SessionClosed,

    #[error("方块数据未解压")]
    NotDecompressed,

    #[error("方块数据未压缩")]
    NotCompressed,

    #[error("会话载荷过大，超过4GB限制")]
    PayloadTooLarge,

    #[error("标签流解析错误: {0}")]
    TagError(String),

    #[error("校验错误: {0}")]
    ValidationError(String),
}
