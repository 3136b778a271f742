use crate::error::VoxStreamError;
use crate::math::{BlockPos, BoundingBox};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashSet;
use std::io::Cursor;

/// 单条方块记录的固定宽度（3×i32 + u16 + u8）
pub const RECORD_WIDTH: usize = 15;

/// 压缩数据头部宽度（包围盒，6×i32）
pub const HEADER_WIDTH: usize = 24;

/// 一条方块记录（全局坐标 + 方块ID + 附加值）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub id: u16,
    pub meta: u8,
}

/// 内部存储状态：展开态与压缩态互斥，由枚举保证
#[derive(Debug, Clone)]
enum Storage {
    Expanded {
        records: Vec<BlockRecord>,
        cursor: usize,
    },
    Compressed {
        blob: Vec<u8>,
    },
}

/// 方块选区缓冲：按插入顺序保存记录，增量维护包围盒，
/// 支持流式读取以及定宽二进制的压缩与解压
#[derive(Debug, Clone)]
pub struct BlockArray {
    storage: Storage,
    size_data: Option<BoundingBox>,
    detect_duplicates: bool,
    seen: HashSet<i64>,
}

impl BlockArray {
    /// 创建空的方块缓冲（展开态）
    pub fn new() -> Self {
        Self {
            storage: Storage::Expanded {
                records: Vec::new(),
                cursor: 0,
            },
            size_data: None,
            detect_duplicates: false,
            seen: HashSet::new(),
        }
    }

    /// 创建带坐标去重的方块缓冲：同一坐标只保留第一次写入
    pub fn with_duplicate_detection() -> Self {
        Self {
            detect_duplicates: true,
            ..Self::new()
        }
    }

    /// 从压缩数据直接构造（压缩态），内容在解压时才被校验
    pub fn from_blob(blob: Vec<u8>) -> Self {
        Self {
            storage: Storage::Compressed { blob },
            size_data: None,
            detect_duplicates: false,
            seen: HashSet::new(),
        }
    }

    pub fn duplicate_detection(&self) -> bool {
        self.detect_duplicates
    }

    pub fn set_duplicate_detection(&mut self, enabled: bool) {
        self.detect_duplicates = enabled;
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.storage, Storage::Compressed { .. })
    }

    /// 追加一条记录并扩展包围盒
    ///
    /// 重复坐标默认全部保留，最终值由消费者按插入顺序决定；
    /// 开启去重时重复坐标被直接丢弃。
    pub fn add_block_at(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        id: u16,
        meta: u8,
    ) -> Result<(), VoxStreamError> {
        let Storage::Expanded { records, .. } = &mut self.storage else {
            return Err(VoxStreamError::NotDecompressed);
        };

        if self.detect_duplicates && !self.seen.insert(BlockPos::new(x, y, z).hash()) {
            return Ok(());
        }

        records.push(BlockRecord { x, y, z, id, meta });

        match &mut self.size_data {
            Some(bb) => bb.extend(x, y, z),
            None => self.size_data = Some(BoundingBox::at(x, y, z)),
        }

        Ok(())
    }

    /// 游标后面是否还有未读记录（压缩态恒为false）
    pub fn has_next(&self) -> bool {
        match &self.storage {
            Storage::Expanded { records, cursor } => *cursor < records.len(),
            Storage::Compressed { .. } => false,
        }
    }

    /// 读取游标处的下一条记录，读尽后返回None
    pub fn read_next(&mut self) -> Option<BlockRecord> {
        let Storage::Expanded { records, cursor } = &mut self.storage else {
            return None;
        };

        let record = records.get(*cursor).copied()?;
        *cursor += 1;
        Some(record)
    }

    /// 重置游标到起始位置
    pub fn rewind(&mut self) {
        if let Storage::Expanded { cursor, .. } = &mut self.storage {
            *cursor = 0;
        }
    }

    /// 当前记录数（压缩态按定宽从数据长度推算）
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Expanded { records, .. } => records.len(),
            Storage::Compressed { blob } => blob.len().saturating_sub(HEADER_WIDTH) / RECORD_WIDTH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 展开态的记录切片
    pub fn records(&self) -> Result<&[BlockRecord], VoxStreamError> {
        match &self.storage {
            Storage::Expanded { records, .. } => Ok(records),
            Storage::Compressed { .. } => Err(VoxStreamError::NotDecompressed),
        }
    }

    /// 维护中的包围盒（O(1)）
    pub fn size_data(&self) -> Option<BoundingBox> {
        self.size_data
    }

    /// 序列化为定宽二进制数据，不改变缓冲状态
    pub fn to_blob(&self) -> Result<Vec<u8>, VoxStreamError> {
        let records = self.records()?;
        let mut blob = Vec::with_capacity(HEADER_WIDTH + records.len() * RECORD_WIDTH);

        // 空缓冲用min>max作为包围盒哨兵值
        let bb = self.size_data.unwrap_or(BoundingBox {
            min_x: 0,
            max_x: -1,
            min_y: 0,
            max_y: -1,
            min_z: 0,
            max_z: -1,
        });
        blob.write_i32::<LittleEndian>(bb.min_x)?;
        blob.write_i32::<LittleEndian>(bb.max_x)?;
        blob.write_i32::<LittleEndian>(bb.min_y)?;
        blob.write_i32::<LittleEndian>(bb.max_y)?;
        blob.write_i32::<LittleEndian>(bb.min_z)?;
        blob.write_i32::<LittleEndian>(bb.max_z)?;

        for record in records {
            blob.write_i32::<LittleEndian>(record.x)?;
            blob.write_i32::<LittleEndian>(record.y)?;
            blob.write_i32::<LittleEndian>(record.z)?;
            blob.write_u16::<LittleEndian>(record.id)?;
            blob.write_u8(record.meta)?;
        }

        Ok(blob)
    }

    /// 压缩：序列化全部记录并释放内存中的记录列表（展开态 → 压缩态）
    pub fn compress(&mut self) -> Result<(), VoxStreamError> {
        let blob = self.to_blob()?;
        self.storage = Storage::Compressed { blob };
        self.seen.clear();
        Ok(())
    }

    /// 解压：还原记录列表并释放压缩数据，游标回到起始位置（压缩态 → 展开态）
    pub fn decompress(&mut self) -> Result<(), VoxStreamError> {
        let Storage::Compressed { blob } = &self.storage else {
            return Err(VoxStreamError::NotCompressed);
        };

        if blob.len() < HEADER_WIDTH || (blob.len() - HEADER_WIDTH) % RECORD_WIDTH != 0 {
            return Err(VoxStreamError::CorruptData(format!(
                "压缩数据长度不合法: {} 字节",
                blob.len()
            )));
        }

        let mut cursor = Cursor::new(blob.as_slice());

        let min_x = cursor.read_i32::<LittleEndian>()?;
        let max_x = cursor.read_i32::<LittleEndian>()?;
        let min_y = cursor.read_i32::<LittleEndian>()?;
        let max_y = cursor.read_i32::<LittleEndian>()?;
        let min_z = cursor.read_i32::<LittleEndian>()?;
        let max_z = cursor.read_i32::<LittleEndian>()?;

        let size_data = if max_x < min_x {
            None
        } else {
            Some(BoundingBox {
                min_x,
                max_x,
                min_y,
                max_y,
                min_z,
                max_z,
            })
        };

        let record_count = (blob.len() - HEADER_WIDTH) / RECORD_WIDTH;
        let mut records = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            records.push(BlockRecord {
                x: cursor.read_i32::<LittleEndian>()?,
                y: cursor.read_i32::<LittleEndian>()?,
                z: cursor.read_i32::<LittleEndian>()?,
                id: cursor.read_u16::<LittleEndian>()?,
                meta: cursor.read_u8()?,
            });
        }

        if self.detect_duplicates {
            self.seen = records
                .iter()
                .map(|r| BlockPos::new(r.x, r.y, r.z).hash())
                .collect();
        }

        self.size_data = size_data;
        self.storage = Storage::Expanded { records, cursor: 0 };

        Ok(())
    }
}

impl Default for BlockArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_array() -> BlockArray {
        let mut array = BlockArray::new();
        array.add_block_at(0, 0, 0, 1, 0).unwrap();
        array.add_block_at(-3, 64, 7, 17, 2).unwrap();
        array.add_block_at(5, -1, -9, 35, 14).unwrap();
        array
    }

    #[test]
    fn compress_decompress_roundtrip() {
        let mut array = sample_array();
        let original = array.records().unwrap().to_vec();
        let original_box = array.size_data();

        array.compress().unwrap();
        assert!(array.is_compressed());
        assert_eq!(array.len(), 3);

        array.decompress().unwrap();
        assert!(!array.is_compressed());
        assert_eq!(array.records().unwrap(), original.as_slice());
        assert_eq!(array.size_data(), original_box);
    }

    #[test]
    fn empty_array_roundtrip() {
        let mut array = BlockArray::new();
        array.compress().unwrap();
        array.decompress().unwrap();
        assert!(array.is_empty());
        assert_eq!(array.size_data(), None);
    }

    #[test]
    fn cursor_exhausts_after_all_records() {
        let mut array = sample_array();
        array.compress().unwrap();
        array.decompress().unwrap();

        let mut read = 0;
        while array.has_next() {
            array.read_next().unwrap();
            read += 1;
        }
        assert_eq!(read, 3);
        assert!(array.read_next().is_none());

        array.rewind();
        assert!(array.has_next());
    }

    #[test]
    fn bounding_box_matches_inserted_coords() {
        let array = sample_array();
        let bb = array.size_data().unwrap();
        assert_eq!((bb.min_x, bb.max_x), (-3, 5));
        assert_eq!((bb.min_y, bb.max_y), (-1, 64));
        assert_eq!((bb.min_z, bb.max_z), (-9, 7));
    }

    #[test]
    fn corrupt_blob_is_rejected() {
        let mut array = BlockArray::from_blob(vec![0u8; HEADER_WIDTH + RECORD_WIDTH + 1]);
        assert!(matches!(
            array.decompress(),
            Err(VoxStreamError::CorruptData(_))
        ));

        let mut truncated = BlockArray::from_blob(vec![0u8; HEADER_WIDTH - 1]);
        assert!(matches!(
            truncated.decompress(),
            Err(VoxStreamError::CorruptData(_))
        ));
    }

    #[test]
    fn duplicate_detection_keeps_first_write() {
        let mut array = BlockArray::with_duplicate_detection();
        array.add_block_at(1, 2, 3, 5, 0).unwrap();
        array.add_block_at(1, 2, 3, 9, 0).unwrap();
        array.add_block_at(1, 2, 4, 9, 0).unwrap();

        assert_eq!(array.len(), 2);
        assert_eq!(array.records().unwrap()[0].id, 5);
    }

    #[test]
    fn add_on_compressed_array_fails() {
        let mut array = sample_array();
        array.compress().unwrap();
        assert!(matches!(
            array.add_block_at(0, 0, 0, 1, 0),
            Err(VoxStreamError::NotDecompressed)
        ));
    }
}
