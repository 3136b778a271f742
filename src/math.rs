/// 三维浮点向量（操作者位置与朝向）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 向下取整为方块坐标
    pub fn floor(&self) -> BlockPos {
        BlockPos {
            x: self.x.floor() as i32,
            y: self.y.floor() as i32,
            z: self.z.floor() as i32,
        }
    }

    /// 向上取整为方块坐标
    pub fn ceil(&self) -> BlockPos {
        BlockPos {
            x: self.x.ceil() as i32,
            y: self.y.ceil() as i32,
            z: self.z.ceil() as i32,
        }
    }

    /// 坐标是否全部为整数
    pub fn is_integer(&self) -> bool {
        self.x.fract() == 0.0 && self.y.fract() == 0.0 && self.z.fract() == 0.0
    }
}

/// 方块位置（全局整数坐标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn add(&self, x: i32, y: i32, z: i32) -> Self {
        Self {
            x: self.x + x,
            y: self.y + y,
            z: self.z + z,
        }
    }

    pub fn add_pos(&self, other: &BlockPos) -> Self {
        self.add(other.x, other.y, other.z)
    }

    pub fn sub_pos(&self, other: &BlockPos) -> Self {
        self.add(-other.x, -other.y, -other.z)
    }

    /// 获取该位置所在的区块坐标
    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: self.x >> 4,
            z: self.z >> 4,
        }
    }

    /// 打包为64位哈希（x与z各占26位，y占12位）
    pub fn hash(&self) -> i64 {
        ((self.x as i64 & 0x3FF_FFFF) << 38)
            | ((self.z as i64 & 0x3FF_FFFF) << 12)
            | (self.y as i64 & 0xFFF)
    }

    /// 从64位哈希还原坐标
    pub fn from_hash(hash: i64) -> Self {
        Self {
            // x位于最高26位，算术右移自动补符号
            x: (hash >> 38) as i32,
            z: ((hash << 26) >> 38) as i32,
            y: ((hash << 52) >> 52) as i32,
        }
    }
}

/// 区块位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// 旋转轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// 水平基本方向（从朝向向量取主轴得到）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// +X
    East,
    /// -X
    West,
    /// +Z
    South,
    /// -Z
    North,
}

impl Direction {
    /// 把任意朝向向量吸附到四个基本方向之一
    ///
    /// 斜向朝向不做特殊处理，直接落到绝对值较大的那个轴上。
    pub fn from_facing(facing: &Vector3) -> Direction {
        if facing.x.abs() >= facing.z.abs() {
            if facing.x >= 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if facing.z >= 0.0 {
            Direction::South
        } else {
            Direction::North
        }
    }

    /// 方向是否指向坐标轴负方向
    pub fn is_negative(&self) -> bool {
        matches!(self, Direction::West | Direction::North)
    }

    /// 方向所在的水平轴
    pub fn axis(&self) -> Axis {
        match self {
            Direction::East | Direction::West => Axis::X,
            Direction::South | Direction::North => Axis::Z,
        }
    }
}

/// 选区包围盒（逐次插入时增量维护）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl BoundingBox {
    /// 以单个坐标为初始范围
    pub fn at(x: i32, y: i32, z: i32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
            min_z: z,
            max_z: z,
        }
    }

    /// 扩展包围盒使其包含给定坐标（只增不减）
    pub fn extend(&mut self, x: i32, y: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// 整体平移后的包围盒
    pub fn shifted(&self, x: i32, y: i32, z: i32) -> Self {
        Self {
            min_x: self.min_x + x,
            max_x: self.max_x + x,
            min_y: self.min_y + y,
            max_y: self.max_y + y,
            min_z: self.min_z + z,
            max_z: self.max_z + z,
        }
    }

    /// 指定轴上的跨度（含两端）
    pub fn span(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => (self.max_x - self.min_x).abs() + 1,
            Axis::Y => (self.max_y - self.min_y).abs() + 1,
            Axis::Z => (self.max_z - self.min_z).abs() + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_roundtrip() {
        let positions = [
            BlockPos::new(0, 0, 0),
            BlockPos::new(1, 2, 3),
            BlockPos::new(-1, -64, -1),
            BlockPos::new(30_000_000, 319, -30_000_000),
            BlockPos::new(-30_000_000, -2048, 30_000_000),
        ];

        for pos in positions {
            assert_eq!(BlockPos::from_hash(pos.hash()), pos);
        }
    }

    #[test]
    fn chunk_pos_of_negative_coords() {
        assert_eq!(BlockPos::new(-1, 0, -16).chunk_pos(), ChunkPos::new(-1, -1));
        assert_eq!(BlockPos::new(15, 0, 16).chunk_pos(), ChunkPos::new(0, 1));
    }

    #[test]
    fn direction_snaps_to_dominant_axis() {
        assert_eq!(
            Direction::from_facing(&Vector3::new(0.9, 0.0, 0.2)),
            Direction::East
        );
        assert_eq!(
            Direction::from_facing(&Vector3::new(-0.3, 0.0, 0.1)),
            Direction::West
        );
        assert_eq!(
            Direction::from_facing(&Vector3::new(0.1, 0.0, 0.8)),
            Direction::South
        );
        assert_eq!(
            Direction::from_facing(&Vector3::new(0.2, 0.0, -0.9)),
            Direction::North
        );
    }

    #[test]
    fn bounding_box_tracks_min_max() {
        let mut bb = BoundingBox::at(1, 2, 3);
        bb.extend(-4, 7, 3);
        bb.extend(2, -1, 9);

        assert_eq!(bb.min_x, -4);
        assert_eq!(bb.max_x, 2);
        assert_eq!(bb.min_y, -1);
        assert_eq!(bb.max_y, 7);
        assert_eq!(bb.min_z, 3);
        assert_eq!(bb.max_z, 9);
        assert_eq!(bb.span(Axis::X), 7);
    }
}
