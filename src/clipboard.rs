use crate::block_array::BlockArray;
use crate::error::VoxStreamError;
use crate::math::{BlockPos, Vector3};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// 带锚点的方块缓冲：锚点为捕获时操作者的位置，
/// 粘贴时用它计算目标偏移
#[derive(Debug, Clone)]
pub struct Clipboard {
    array: BlockArray,
    /// 展开态锚点，与packed_position互斥
    relative_position: Option<BlockPos>,
    /// 压缩态锚点（64位方块哈希）
    packed_position: Option<i64>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self {
            array: BlockArray::new(),
            relative_position: None,
            packed_position: None,
        }
    }

    /// 从普通方块缓冲构造剪贴板：复制记录与包围盒并安装锚点
    pub fn from_block_array(array: &BlockArray, player_position: Vector3) -> Self {
        Self {
            array: array.clone(),
            relative_position: Some(player_position.floor()),
            packed_position: None,
        }
    }

    pub fn relative_position(&self) -> Option<BlockPos> {
        self.relative_position
    }

    pub fn set_relative_position(&mut self, position: Vector3) -> &mut Self {
        self.relative_position = Some(position.floor());
        self
    }

    pub fn set_relative_block_pos(&mut self, position: BlockPos) -> &mut Self {
        self.relative_position = Some(position);
        self
    }

    /// 平移剪贴板
    ///
    /// 已设锚点时不修改接收者，而是返回锚点平移后的新剪贴板
    /// （记录列表取完整深拷贝，避免两个持有者共享可变状态）；
    /// 未设锚点时平移所有记录坐标。
    pub fn add_vector3(&self, vector: Vector3) -> Result<Clipboard, VoxStreamError> {
        if !vector.is_integer() {
            return Err(VoxStreamError::InvalidArgument(
                "Vector3坐标必须为整数".to_string(),
            ));
        }
        let delta = vector.floor();

        if let Some(anchor) = self.relative_position {
            let mut derived = self.clone();
            derived.relative_position = Some(anchor.add_pos(&delta));
            return Ok(derived);
        }

        let mut derived = self.clone();
        derived.array = crate::rotation::translate(&self.array, delta)?;
        Ok(derived)
    }

    /// 压缩缓冲并把锚点打包为8字节方块哈希
    pub fn compress(&mut self) -> Result<(), VoxStreamError> {
        self.array.compress()?;

        if let Some(anchor) = self.relative_position.take() {
            self.packed_position = Some(anchor.hash());
        }

        Ok(())
    }

    /// 解压缓冲并还原锚点
    pub fn decompress(&mut self) -> Result<(), VoxStreamError> {
        self.array.decompress()?;

        if let Some(hash) = self.packed_position.take() {
            self.relative_position = Some(BlockPos::from_hash(hash));
        }

        Ok(())
    }

    /// 压缩态锚点哈希（用于离线会话持久化）
    pub fn packed_position(&self) -> Option<i64> {
        self.packed_position
    }

    /// 从持久化数据还原剪贴板（压缩态）
    pub fn from_parts(blob: Vec<u8>, anchor: Option<BlockPos>, duplicate_detection: bool) -> Self {
        let mut array = BlockArray::from_blob(blob);
        array.set_duplicate_detection(duplicate_detection);

        Self {
            array,
            relative_position: None,
            packed_position: anchor.map(|pos| pos.hash()),
        }
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Clipboard {
    type Target = BlockArray;

    fn deref(&self) -> &BlockArray {
        &self.array
    }
}

impl DerefMut for Clipboard {
    fn deref_mut(&mut self) -> &mut BlockArray {
        &mut self.array
    }
}

/// 操作者ID到剪贴板的显式映射，取代全局单例注册表
#[derive(Debug, Default)]
pub struct ClipboardManager {
    clipboards: HashMap<String, Clipboard>,
}

impl ClipboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存操作者的当前剪贴板，替换旧值
    pub fn save_clipboard(&mut self, actor_id: &str, clipboard: Clipboard) {
        self.clipboards.insert(actor_id.to_string(), clipboard);
    }

    pub fn has_clipboard(&self, actor_id: &str) -> bool {
        self.clipboards.contains_key(actor_id)
    }

    pub fn get_clipboard(&self, actor_id: &str) -> Option<&Clipboard> {
        self.clipboards.get(actor_id)
    }

    pub fn get_clipboard_mut(&mut self, actor_id: &str) -> Option<&mut Clipboard> {
        self.clipboards.get_mut(actor_id)
    }

    pub fn remove_clipboard(&mut self, actor_id: &str) -> Option<Clipboard> {
        self.clipboards.remove(actor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clipboard() -> Clipboard {
        let mut clipboard = Clipboard::new();
        clipboard.set_relative_position(Vector3::new(10.5, 64.0, -3.2));
        clipboard.add_block_at(1, 2, 3, 4, 0).unwrap();
        clipboard.add_block_at(-1, 0, 5, 7, 3).unwrap();
        clipboard
    }

    #[test]
    fn from_block_array_copies_records_and_installs_anchor() {
        let mut array = BlockArray::new();
        array.add_block_at(1, 2, 3, 4, 0).unwrap();
        array.add_block_at(-5, 6, 7, 8, 1).unwrap();

        let clipboard = Clipboard::from_block_array(&array, Vector3::new(2.7, 64.0, -1.5));

        assert_eq!(clipboard.records().unwrap(), array.records().unwrap());
        assert_eq!(clipboard.size_data(), array.size_data());
        // 锚点向下取整安装
        assert_eq!(clipboard.relative_position(), Some(BlockPos::new(2, 64, -2)));
        assert_eq!(clipboard.packed_position(), None);
    }

    #[test]
    fn anchor_is_floored() {
        let clipboard = sample_clipboard();
        assert_eq!(
            clipboard.relative_position(),
            Some(BlockPos::new(10, 64, -4))
        );
    }

    #[test]
    fn add_vector3_with_anchor_does_not_mutate_receiver() {
        let clipboard = sample_clipboard();
        let shifted = clipboard.add_vector3(Vector3::new(2.0, 0.0, -1.0)).unwrap();

        assert_eq!(
            clipboard.relative_position(),
            Some(BlockPos::new(10, 64, -4))
        );
        assert_eq!(shifted.relative_position(), Some(BlockPos::new(12, 64, -5)));
        // 记录本身不动，只动锚点
        assert_eq!(
            shifted.records().unwrap(),
            clipboard.records().unwrap()
        );
    }

    #[test]
    fn add_vector3_without_anchor_translates_records() {
        let mut clipboard = Clipboard::new();
        clipboard.add_block_at(1, 2, 3, 4, 0).unwrap();

        let shifted = clipboard.add_vector3(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let record = shifted.records().unwrap()[0];
        assert_eq!((record.x, record.y, record.z), (2, 3, 4));
    }

    #[test]
    fn add_vector3_rejects_fractional_vector() {
        let clipboard = sample_clipboard();
        assert!(matches!(
            clipboard.add_vector3(Vector3::new(0.5, 0.0, 0.0)),
            Err(VoxStreamError::InvalidArgument(_))
        ));
    }

    #[test]
    fn compress_packs_anchor_and_decompress_restores_it() {
        let mut clipboard = sample_clipboard();
        let anchor = clipboard.relative_position();

        clipboard.compress().unwrap();
        assert_eq!(clipboard.relative_position(), None);
        assert!(clipboard.packed_position().is_some());

        clipboard.decompress().unwrap();
        assert_eq!(clipboard.relative_position(), anchor);
        assert_eq!(clipboard.packed_position(), None);
        assert_eq!(clipboard.len(), 2);
    }

    #[test]
    fn manager_replaces_saved_clipboard() {
        let mut manager = ClipboardManager::new();
        assert!(!manager.has_clipboard("steve"));

        manager.save_clipboard("steve", sample_clipboard());
        assert!(manager.has_clipboard("steve"));

        let mut other = Clipboard::new();
        other.add_block_at(0, 0, 0, 1, 0).unwrap();
        manager.save_clipboard("steve", other);
        assert_eq!(manager.get_clipboard("steve").unwrap().len(), 1);
    }
}
