use crate::block_array::BlockArray;
use crate::error::VoxStreamError;
use crate::math::{BlockPos, ChunkPos};
use crate::world::World;
use crate::AIR;
use std::collections::HashSet;

/// 填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// 覆盖目标位置的所有方块
    Replace,
    /// 合并：来源中的空气方块不覆盖目标
    Merge,
}

/// 批量修改会话
///
/// 写入立即落到世界，但区块重载推迟到reload_chunks统一触发，
/// 每个受影响区块只重载一次。会话关闭后拒绝一切访问。
pub struct FillSession<'a, W: World> {
    world: &'a mut W,
    /// 声明的XZ范围（min_x, max_x, min_z, max_z），用于圈定重载区域
    dimensions: Option<(i32, i32, i32, i32)>,
    touched: HashSet<ChunkPos>,
    blocks_changed: u64,
    closed: bool,
}

impl<'a, W: World> FillSession<'a, W> {
    pub fn new(world: &'a mut W) -> Self {
        Self {
            world,
            dimensions: None,
            touched: HashSet::new(),
            blocks_changed: 0,
            closed: false,
        }
    }

    /// 声明本次编辑覆盖的XZ范围
    ///
    /// 设置后重载按该范围内的区块进行；未设置时退化为
    /// 逐个记录被触碰的区块。
    pub fn set_dimensions(&mut self, min_x: i32, max_x: i32, min_z: i32, max_z: i32) {
        self.dimensions = Some((min_x, max_x, min_z, max_z));
    }

    fn ensure_open(&self) -> Result<(), VoxStreamError> {
        if self.closed {
            return Err(VoxStreamError::SessionClosed);
        }
        Ok(())
    }

    /// 直读世界，不做缓存
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> Result<(u16, u8), VoxStreamError> {
        self.ensure_open()?;
        Ok(self.world.get_block_at(x, y, z))
    }

    /// 写入一格
    ///
    /// 与现值相同的写入直接跳过，因此计数器反映的是净变化；
    /// 垂直越界以及超出已声明XZ范围的写入被丢弃。
    pub fn set_block_at(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        id: u16,
        meta: u8,
    ) -> Result<(), VoxStreamError> {
        self.ensure_open()?;

        if y < self.world.y_min() || y > self.world.y_max() {
            return Ok(());
        }
        if let Some((min_x, max_x, min_z, max_z)) = self.dimensions {
            if x < min_x || x > max_x || z < min_z || z > max_z {
                log::debug!("写入 ({}, {}, {}) 超出会话范围，已忽略", x, y, z);
                return Ok(());
            }
        }

        if self.world.get_block_at(x, y, z) == (id, meta) {
            return Ok(());
        }

        self.world.set_block_at(x, y, z, id, meta);
        self.blocks_changed += 1;
        self.touched.insert(BlockPos::new(x, y, z).chunk_pos());

        Ok(())
    }

    /// 会话内的净变化计数，只增不减
    pub fn blocks_changed(&self) -> u64 {
        self.blocks_changed
    }

    /// 关闭会话：每个受影响区块恰好触发一次重载
    ///
    /// 重载开销与区块数成正比而与写入格数无关，
    /// 这是批量编辑的主要收益。
    pub fn reload_chunks(&mut self) -> Result<(), VoxStreamError> {
        self.ensure_open()?;
        self.closed = true;

        match self.dimensions {
            Some((min_x, max_x, min_z, max_z)) if !self.touched.is_empty() => {
                for chunk_x in (min_x >> 4)..=(max_x >> 4) {
                    for chunk_z in (min_z >> 4)..=(max_z >> 4) {
                        self.world.reload_chunk(ChunkPos::new(chunk_x, chunk_z));
                    }
                }
            }
            _ => {
                for chunk in &self.touched {
                    self.world.reload_chunk(*chunk);
                }
            }
        }

        log::debug!(
            "填充会话关闭: 修改 {} 格，触碰 {} 个区块",
            self.blocks_changed,
            self.touched.len()
        );

        Ok(())
    }
}

/// 把解压后的缓冲按偏移写入世界，作为一次会话提交
///
/// 记录按插入顺序流式写入，结束时统一重载，返回净变化格数。
pub fn fill<W: World>(
    world: &mut W,
    array: &mut BlockArray,
    delta: BlockPos,
    mode: FillMode,
) -> Result<u64, VoxStreamError> {
    let mut session = FillSession::new(world);

    if let Some(bb) = array.size_data() {
        let shifted = bb.shifted(delta.x, delta.y, delta.z);
        session.set_dimensions(shifted.min_x, shifted.max_x, shifted.min_z, shifted.max_z);
    }

    array.rewind();
    while let Some(record) = array.read_next() {
        if mode == FillMode::Merge && record.id == AIR {
            continue;
        }
        session.set_block_at(
            record.x + delta.x,
            record.y + delta.y,
            record.z + delta.z,
            record.id,
            record.meta,
        )?;
    }

    session.reload_chunks()?;
    Ok(session.blocks_changed())
}
