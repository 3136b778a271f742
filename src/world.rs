use crate::math::{BlockPos, ChunkPos};
use crate::AIR;
use std::collections::HashMap;

/// 外部方块世界的接口边界
///
/// 编辑引擎只依赖单格读写和按区块触发的重载，
/// 区块重载（光照与外观重算）由宿主实现，代价较高。
pub trait World {
    fn get_block_at(&self, x: i32, y: i32, z: i32) -> (u16, u8);

    fn set_block_at(&mut self, x: i32, y: i32, z: i32, id: u16, meta: u8);

    /// 请求重载一个区块
    fn reload_chunk(&mut self, chunk: ChunkPos);

    fn y_min(&self) -> i32 {
        0
    }

    fn y_max(&self) -> i32 {
        255
    }
}

/// 基于哈希表的内存世界实现，供演示与测试使用
///
/// 未写入的坐标一律视为空气；重载调用被记录下来，
/// 便于验证批量重载只按区块数发生。
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: HashMap<i64, (u16, u8)>,
    reloaded: Vec<ChunkPos>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的重载调用次数
    pub fn reload_calls(&self) -> usize {
        self.reloaded.len()
    }

    pub fn reloaded_chunks(&self) -> &[ChunkPos] {
        &self.reloaded
    }

    /// 非空气方块总数
    pub fn non_air_count(&self) -> usize {
        self.blocks.values().filter(|(id, _)| *id != AIR).count()
    }
}

impl World for MemoryWorld {
    fn get_block_at(&self, x: i32, y: i32, z: i32) -> (u16, u8) {
        self.blocks
            .get(&BlockPos::new(x, y, z).hash())
            .copied()
            .unwrap_or((AIR, 0))
    }

    fn set_block_at(&mut self, x: i32, y: i32, z: i32, id: u16, meta: u8) {
        let hash = BlockPos::new(x, y, z).hash();
        if id == AIR && meta == 0 {
            self.blocks.remove(&hash);
        } else {
            self.blocks.insert(hash, (id, meta));
        }
    }

    fn reload_chunk(&mut self, chunk: ChunkPos) {
        log::trace!("重载区块 ({}, {})", chunk.x, chunk.z);
        self.reloaded.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_position_reads_as_air() {
        let world = MemoryWorld::new();
        assert_eq!(world.get_block_at(5, 70, -3), (AIR, 0));
    }

    #[test]
    fn set_then_get() {
        let mut world = MemoryWorld::new();
        world.set_block_at(1, 2, 3, 17, 2);
        assert_eq!(world.get_block_at(1, 2, 3), (17, 2));

        world.set_block_at(1, 2, 3, AIR, 0);
        assert_eq!(world.get_block_at(1, 2, 3), (AIR, 0));
        assert_eq!(world.non_air_count(), 0);
    }

    #[test]
    fn reload_calls_are_recorded() {
        let mut world = MemoryWorld::new();
        world.reload_chunk(ChunkPos::new(0, 0));
        world.reload_chunk(ChunkPos::new(1, 0));
        assert_eq!(world.reload_calls(), 2);
    }
}
