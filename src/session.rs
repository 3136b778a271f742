use crate::clipboard::Clipboard;
use crate::error::VoxStreamError;
use crate::math::BlockPos;
use crate::nbt::{self, Tag};
use crate::{CompressionType, VXS_MAGIC, VXS_VERSION};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use crossbeam_channel::Sender;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

/// 离线会话文件所在的子目录
pub const OFFLINE_DATA_DIR: &str = "offline_data";

/// 离线会话文件扩展名
pub const SESSION_EXTENSION: &str = "vxsession";

/// 每个操作者一份的离线会话数据，全部按值持有
///
/// 剪贴板、撤销与重做数据均为压缩态的定宽二进制，在标签流中
/// 存为ByteArray（4字节长度前缀）而不是字符串标签——字符串的
/// 2字节长度上限放不下大选区。空字段不写入文件；全部为空时
/// 整个文件都不产生。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfflineSession {
    pub player_id: String,
    pub clipboard: Vec<u8>,
    pub clipboard_relative_position: Option<BlockPos>,
    pub clipboard_duplicate_detection: bool,
    pub undo_data: Vec<u8>,
    pub redo_data: Vec<u8>,
}

/// 会话文件路径：offline_data/<id>.vxsession
pub fn session_file_path(data_folder: &Path, player_id: &str) -> PathBuf {
    data_folder
        .join(OFFLINE_DATA_DIR)
        .join(format!("{}.{}", player_id, SESSION_EXTENSION))
}

/// 载荷长度必须能放进头部的4字节长度字段
fn validate_payload_size(len: usize) -> Result<(), VoxStreamError> {
    if len > u32::MAX as usize {
        return Err(VoxStreamError::PayloadTooLarge);
    }
    Ok(())
}

impl OfflineSession {
    pub fn new(player_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            ..Self::default()
        }
    }

    /// 从剪贴板捕获会话内容（剪贴板本身不变）
    pub fn with_clipboard(mut self, clipboard: &Clipboard) -> Result<Self, VoxStreamError> {
        if clipboard.is_compressed() {
            return Err(VoxStreamError::NotDecompressed);
        }
        self.clipboard = clipboard.to_blob()?;
        self.clipboard_relative_position = clipboard.relative_position();
        self.clipboard_duplicate_detection = clipboard.duplicate_detection();
        Ok(self)
    }

    /// 还原为压缩态剪贴板；会话中没有剪贴板时返回None
    pub fn into_clipboard(self) -> Option<Clipboard> {
        if self.clipboard.is_empty() {
            return None;
        }
        Some(Clipboard::from_parts(
            self.clipboard,
            self.clipboard_relative_position,
            self.clipboard_duplicate_detection,
        ))
    }

    /// 所有可选字段均为空
    pub fn is_empty(&self) -> bool {
        self.clipboard.is_empty() && self.undo_data.is_empty() && self.redo_data.is_empty()
    }

    /// 序列化为完整的会话文件：头部 + 压缩载荷 + SHA-256校验
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        compression: CompressionType,
    ) -> Result<(), VoxStreamError> {
        let mut entries: Vec<(&str, Tag)> = Vec::new();

        if !self.clipboard.is_empty() {
            entries.push(("Clipboard", Tag::ByteArray(self.clipboard.clone())));
            if let Some(anchor) = self.clipboard_relative_position {
                entries.push((
                    "ClipboardRelativePosition",
                    Tag::IntArray(vec![anchor.x, anchor.y, anchor.z]),
                ));
            }
            entries.push((
                "ClipboardDuplicateDetection",
                Tag::Byte(self.clipboard_duplicate_detection as i8),
            ));
        }
        if !self.undo_data.is_empty() {
            entries.push(("UndoData", Tag::ByteArray(self.undo_data.clone())));
        }
        if !self.redo_data.is_empty() {
            entries.push(("RedoData", Tag::ByteArray(self.redo_data.clone())));
        }

        let mut payload = Vec::new();
        nbt::write_compound(&mut payload, &entries)?;
        let compressed = compression.compress(&payload)?;
        validate_payload_size(compressed.len())?;

        writer.write_all(VXS_MAGIC)?;
        writer.write_u16::<BigEndian>(VXS_VERSION)?;
        writer.write_u8(compression as u8)?;
        writer.write_u32::<LittleEndian>(compressed.len() as u32)?;
        writer.write_all(&compressed)?;

        let hash: [u8; 32] = Sha256::digest(&compressed).into();
        writer.write_all(&hash)?;

        Ok(())
    }

    /// 写入会话文件；会话为空时不产生文件并返回false
    pub fn save(
        &self,
        data_folder: &Path,
        compression: CompressionType,
    ) -> Result<bool, VoxStreamError> {
        if self.is_empty() {
            return Ok(false);
        }

        let path = session_file_path(data_folder, &self.player_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, compression)?;
        writer.flush()?;

        Ok(true)
    }

    /// 从会话文件内容还原，校验魔数、版本与哈希
    pub fn read_from<R: Read>(reader: &mut R, player_id: &str) -> Result<Self, VoxStreamError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != *VXS_MAGIC {
            return Err(VoxStreamError::InvalidMagic);
        }

        let version = reader.read_u16::<BigEndian>()?;
        if version != VXS_VERSION {
            return Err(VoxStreamError::UnsupportedVersion(version));
        }

        let compression = CompressionType::from_u8(reader.read_u8()?)?;
        let payload_len = reader.read_u32::<LittleEndian>()?;

        let mut compressed = vec![0u8; payload_len as usize];
        reader.read_exact(&mut compressed)?;

        let mut expected_hash = [0u8; 32];
        reader.read_exact(&mut expected_hash)?;
        let actual_hash: [u8; 32] = Sha256::digest(&compressed).into();
        if actual_hash != expected_hash {
            return Err(VoxStreamError::CorruptData("会话文件校验和不匹配".to_string()));
        }

        let payload = compression.decompress(&compressed)?;
        let entries = nbt::read_compound(&mut payload.as_slice())?;

        let mut session = OfflineSession::new(player_id);
        for (name, tag) in entries {
            match (name.as_str(), tag) {
                ("Clipboard", Tag::ByteArray(data)) => session.clipboard = data,
                ("ClipboardRelativePosition", Tag::IntArray(values)) if values.len() == 3 => {
                    session.clipboard_relative_position =
                        Some(BlockPos::new(values[0], values[1], values[2]));
                }
                ("ClipboardDuplicateDetection", Tag::Byte(value)) => {
                    session.clipboard_duplicate_detection = value != 0;
                }
                ("UndoData", Tag::ByteArray(data)) => session.undo_data = data,
                ("RedoData", Tag::ByteArray(data)) => session.redo_data = data,
                (other, _) => log::debug!("忽略未知会话字段: {}", other),
            }
        }

        Ok(session)
    }

    /// 按操作者ID加载会话文件
    pub fn load(data_folder: &Path, player_id: &str) -> Result<Self, VoxStreamError> {
        let path = session_file_path(data_folder, player_id);
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader, player_id)
    }

    /// 并行加载offline_data目录下的全部会话文件
    ///
    /// 单个文件损坏不影响其余文件，失败项记录日志后跳过。
    pub fn load_all(data_folder: &Path) -> Result<Vec<OfflineSession>, VoxStreamError> {
        let dir = data_folder.join(OFFLINE_DATA_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(SESSION_EXTENSION) {
                paths.push(path);
            }
        }

        let sessions = paths
            .par_iter()
            .filter_map(|path| {
                let player_id = path.file_stem()?.to_str()?.to_string();
                let file = match File::open(path) {
                    Ok(file) => file,
                    Err(err) => {
                        log::warn!("无法打开会话文件 {}: {}", path.display(), err);
                        return None;
                    }
                };
                match Self::read_from(&mut BufReader::new(file), &player_id) {
                    Ok(session) => Some(session),
                    Err(err) => {
                        log::warn!("会话文件损坏 {}: {}", path.display(), err);
                        None
                    }
                }
            })
            .collect();

        Ok(sessions)
    }
}

/// 保存任务：全部内容按值传递，提交后调用方不再持有任何引用
struct SaveJob {
    session: OfflineSession,
    data_folder: PathBuf,
    compression: CompressionType,
}

/// 离线会话的异步保存器
///
/// 单工作线程顺序处理保存任务；写盘失败只记录日志，不回传。
/// 同一操作者的多次提交以最后一次写入为准。Drop时关闭队列
/// 并等待剩余任务完成。
pub struct SessionSaver {
    sender: Option<Sender<SaveJob>>,
    handle: Option<JoinHandle<()>>,
}

impl SessionSaver {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<SaveJob>();

        let handle = std::thread::spawn(move || {
            for job in receiver {
                let player_id = job.session.player_id.clone();
                match job.session.save(&job.data_folder, job.compression) {
                    Ok(true) => log::debug!("离线会话已保存: {}", player_id),
                    Ok(false) => log::debug!("离线会话为空，跳过: {}", player_id),
                    Err(err) => log::warn!("离线会话保存失败 {}: {}", player_id, err),
                }
            }
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
        }
    }

    /// 提交一个保存任务（不阻塞，不反馈结果）
    pub fn submit(
        &self,
        session: OfflineSession,
        data_folder: &Path,
        compression: CompressionType,
    ) {
        let job = SaveJob {
            session,
            data_folder: data_folder.to_path_buf(),
            compression,
        };

        if let Some(sender) = &self.sender {
            if sender.send(job).is_err() {
                log::warn!("保存队列已关闭，任务被丢弃");
            }
        }
    }
}

impl Default for SessionSaver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionSaver {
    fn drop(&mut self) {
        // 先关闭发送端让工作线程退出循环，再等待其完成
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
