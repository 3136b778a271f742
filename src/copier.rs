use crate::block_array::BlockArray;
use crate::clipboard::{Clipboard, ClipboardManager};
use crate::error::VoxStreamError;
use crate::fill_session::{fill, FillMode, FillSession};
use crate::math::{Axis, BlockPos, Direction, Vector3};
use crate::rotation;
use crate::world::World;
use crate::AIR;
use std::time::Instant;

/// 执行编辑操作的主体：身份、位置与朝向
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub position: Vector3,
    pub facing: Vector3,
}

impl Actor {
    pub fn new(id: &str, position: Vector3, facing: Vector3) -> Self {
        Self {
            id: id.to_string(),
            position,
            facing,
        }
    }
}

/// 堆叠方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackDirection {
    /// 沿操作者朝向吸附到的水平轴
    Facing,
    Up,
    Down,
}

/// 所有编辑操作的统一返回值
///
/// 预期内的失败（空剪贴板、非法角度）收敛为ok=false，
/// 不向上抛出。
#[derive(Debug, Clone, PartialEq)]
pub struct EditorResult {
    pub ok: bool,
    pub blocks_changed: u64,
    pub elapsed_seconds: f64,
    pub error_message: String,
}

impl EditorResult {
    pub fn success(blocks_changed: u64, elapsed_seconds: f64) -> Self {
        Self {
            ok: true,
            blocks_changed,
            elapsed_seconds,
            error_message: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            blocks_changed: 0,
            elapsed_seconds: 0.0,
            error_message: message.into(),
        }
    }

    fn from_outcome(start: Instant, outcome: Result<u64, VoxStreamError>) -> Self {
        match outcome {
            Ok(changed) => Self::success(changed, start.elapsed().as_secs_f64()),
            Err(err) => Self::error(err.to_string()),
        }
    }
}

/// 复制、剪切、移动、粘贴、堆叠与旋转的编辑器
///
/// 持有操作者剪贴板注册表；世界通过参数显式传入。
#[derive(Debug, Default)]
pub struct Copier {
    clipboards: ClipboardManager,
}

impl Copier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clipboards(&self) -> &ClipboardManager {
        &self.clipboards
    }

    pub fn clipboards_mut(&mut self) -> &mut ClipboardManager {
        &mut self.clipboards
    }

    /// 取出操作者的剪贴板并保证处于展开态
    fn active_clipboard_mut(&mut self, actor_id: &str) -> Result<&mut Clipboard, VoxStreamError> {
        let clipboard = self
            .clipboards
            .get_clipboard_mut(actor_id)
            .ok_or(VoxStreamError::EmptyClipboard)?;

        if clipboard.is_compressed() {
            clipboard.decompress()?;
        }
        Ok(clipboard)
    }

    /// 复制选区到操作者剪贴板，锚点取操作者位置（向上取整）
    pub fn copy<W: World>(
        &mut self,
        world: &W,
        pos1: BlockPos,
        pos2: BlockPos,
        actor: &Actor,
    ) -> EditorResult {
        let start = Instant::now();

        let mut clipboard = Clipboard::new();
        clipboard.set_relative_block_pos(actor.position.ceil());

        let outcome = (|| {
            let mut visited = 0u64;
            for x in pos1.x.min(pos2.x)..=pos1.x.max(pos2.x) {
                for z in pos1.z.min(pos2.z)..=pos1.z.max(pos2.z) {
                    for y in pos1.y.min(pos2.y)..=pos1.y.max(pos2.y) {
                        let (id, meta) = world.get_block_at(x, y, z);
                        clipboard.add_block_at(x, y, z, id, meta)?;
                        visited += 1;
                    }
                }
            }
            Ok(visited)
        })();

        if outcome.is_ok() {
            self.clipboards.save_clipboard(&actor.id, clipboard);
        }
        EditorResult::from_outcome(start, outcome)
    }

    /// 剪切：捕获选区后把每格清为空气，通过一次填充会话提交
    pub fn cut<W: World>(
        &mut self,
        world: &mut W,
        pos1: BlockPos,
        pos2: BlockPos,
        actor: &Actor,
    ) -> EditorResult {
        let start = Instant::now();

        let mut clipboard = Clipboard::new();
        clipboard.set_relative_block_pos(actor.position.ceil());

        let min_x = pos1.x.min(pos2.x);
        let max_x = pos1.x.max(pos2.x);
        let min_z = pos1.z.min(pos2.z);
        let max_z = pos1.z.max(pos2.z);

        // 垂直方向收缩到世界边界内
        let min_y = pos1.y.min(pos2.y).clamp(world.y_min(), world.y_max());
        let max_y = pos1.y.max(pos2.y).clamp(world.y_min(), world.y_max());

        let outcome = (|| {
            let mut session = FillSession::new(world);
            session.set_dimensions(min_x, max_x, min_z, max_z);

            for x in min_x..=max_x {
                for z in min_z..=max_z {
                    for y in min_y..=max_y {
                        let (id, meta) = session.get_block_at(x, y, z)?;
                        clipboard.add_block_at(x, y, z, id, meta)?;
                        session.set_block_at(x, y, z, AIR, 0)?;
                    }
                }
            }

            session.reload_chunks()?;
            Ok(session.blocks_changed())
        })();

        if outcome.is_ok() {
            self.clipboards.save_clipboard(&actor.id, clipboard);
        }
        EditorResult::from_outcome(start, outcome)
    }

    /// 粘贴剪贴板：目标偏移 = 操作者位置（向上取整） - 锚点
    pub fn paste<W: World>(&mut self, world: &mut W, actor: &Actor) -> EditorResult {
        self.paste_with_mode(world, actor, FillMode::Replace)
    }

    /// 合并粘贴：剪贴板中的空气方块不覆盖目标
    pub fn merge<W: World>(&mut self, world: &mut W, actor: &Actor) -> EditorResult {
        self.paste_with_mode(world, actor, FillMode::Merge)
    }

    fn paste_with_mode<W: World>(
        &mut self,
        world: &mut W,
        actor: &Actor,
        mode: FillMode,
    ) -> EditorResult {
        let start = Instant::now();
        let target = actor.position.ceil();

        let outcome = (|| {
            let clipboard = self.active_clipboard_mut(&actor.id)?;
            let anchor = clipboard.relative_position().ok_or_else(|| {
                VoxStreamError::InvalidArgument("剪贴板没有记录锚点".to_string())
            })?;

            let delta = target.sub_pos(&anchor);
            fill(world, clipboard, delta, mode)
        })();

        EditorResult::from_outcome(start, outcome)
    }

    /// 旋转剪贴板，不修改世界
    pub fn rotate(&mut self, actor: &Actor, axis: Axis, degrees: i32) -> EditorResult {
        let start = Instant::now();

        let outcome = (|| {
            let clipboard = self.active_clipboard_mut(&actor.id)?;
            let rotated = rotation::rotate(clipboard, axis, degrees)?;
            self.clipboards.save_clipboard(&actor.id, rotated);
            Ok(0)
        })();

        EditorResult::from_outcome(start, outcome)
    }

    /// 沿一个轴把剪贴板内容重复repeat_count次
    ///
    /// 每次重复的偏移为选区跨度的整数倍，从一个跨度开始，
    /// 朝向的反方向（西、北）与向下取负跨度。垂直方向沿用
    /// 原实现的闭区间循环，比水平方向多放置一份。
    pub fn stack<W: World>(
        &mut self,
        world: &mut W,
        actor: &Actor,
        repeat_count: u32,
        direction: StackDirection,
    ) -> EditorResult {
        let start = Instant::now();
        let facing = Direction::from_facing(&actor.facing);

        let outcome = (|| {
            let clipboard = self.active_clipboard_mut(&actor.id)?;
            let bb = clipboard.size_data().ok_or(VoxStreamError::EmptyClipboard)?;

            let (axis, negative) = match direction {
                StackDirection::Facing => (facing.axis(), facing.is_negative()),
                StackDirection::Up => (Axis::Y, false),
                StackDirection::Down => (Axis::Y, true),
            };

            let mut length = bb.span(axis);
            if negative {
                length = -length;
            }

            let repetitions = match direction {
                StackDirection::Facing => repeat_count,
                StackDirection::Up | StackDirection::Down => repeat_count + 1,
            };

            let mut update = BlockArray::new();
            for pasted in 0..repetitions {
                let offset = length * (pasted as i32 + 1);
                clipboard.rewind();
                while let Some(record) = clipboard.read_next() {
                    let (x, y, z) = match axis {
                        Axis::X => (record.x + offset, record.y, record.z),
                        Axis::Y => (record.x, record.y + offset, record.z),
                        Axis::Z => (record.x, record.y, record.z + offset),
                    };
                    update.add_block_at(x, y, z, record.id, record.meta)?;
                }
            }

            fill(world, &mut update, BlockPos::new(0, 0, 0), FillMode::Replace)
        })();

        EditorResult::from_outcome(start, outcome)
    }

    /// 移动选区：先登记新位置的方块，再把原位置清为空气
    ///
    /// 使用坐标去重缓冲，源与目标重叠时已被重新放置的格子
    /// 不会被后续的清除记录覆盖。
    pub fn move_region<W: World>(
        &mut self,
        world: &mut W,
        pos1: BlockPos,
        pos2: BlockPos,
        delta: BlockPos,
    ) -> EditorResult {
        let start = Instant::now();

        let outcome = (|| {
            let mut update = BlockArray::with_duplicate_detection();
            let mut moved_from = Vec::new();

            for x in pos1.x.min(pos2.x)..=pos1.x.max(pos2.x) {
                for z in pos1.z.min(pos2.z)..=pos1.z.max(pos2.z) {
                    for y in pos1.y.min(pos2.y)..=pos1.y.max(pos2.y) {
                        let (id, meta) = world.get_block_at(x, y, z);
                        if id == AIR {
                            continue;
                        }
                        moved_from.push(BlockPos::new(x, y, z));
                        update.add_block_at(
                            x + delta.x,
                            y + delta.y,
                            z + delta.z,
                            id,
                            meta,
                        )?;
                    }
                }
            }

            for pos in moved_from {
                update.add_block_at(pos.x, pos.y, pos.z, AIR, 0)?;
            }

            fill(world, &mut update, BlockPos::new(0, 0, 0), FillMode::Replace)
        })();

        EditorResult::from_outcome(start, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;

    fn actor_at(x: f64, y: f64, z: f64) -> Actor {
        Actor::new("steve", Vector3::new(x, y, z), Vector3::new(1.0, 0.0, 0.0))
    }

    /// 在(0,0,0)..(1,1,1)放8个互不相同的方块
    fn eight_block_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        let mut id = 1u16;
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    world.set_block_at(x, y, z, id, 0);
                    id += 1;
                }
            }
        }
        world
    }

    #[test]
    fn cut_captures_and_clears() {
        let mut world = eight_block_world();
        let mut copier = Copier::new();
        let actor = actor_at(0.0, 0.0, 0.0);

        let result = copier.cut(
            &mut world,
            BlockPos::new(0, 0, 0),
            BlockPos::new(1, 1, 1),
            &actor,
        );

        assert!(result.ok);
        assert_eq!(result.blocks_changed, 8);
        assert_eq!(copier.clipboards().get_clipboard("steve").unwrap().len(), 8);
        assert_eq!(world.non_air_count(), 0);
    }

    #[test]
    fn copy_then_paste_at_same_spot_changes_nothing() {
        let mut world = eight_block_world();
        let mut copier = Copier::new();
        let actor = actor_at(5.0, 0.0, 5.0);

        let copied = copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(1, 1, 1), &actor);
        assert!(copied.ok);
        assert_eq!(copied.blocks_changed, 8);

        // 同一锚点粘贴回去：每格写入值与现值相同
        let pasted = copier.paste(&mut world, &actor);
        assert!(pasted.ok);
        assert_eq!(pasted.blocks_changed, 0);
    }

    #[test]
    fn paste_applies_actor_offset() {
        let mut world = MemoryWorld::new();
        world.set_block_at(0, 0, 0, 7, 1);

        let mut copier = Copier::new();
        let capture_actor = actor_at(0.0, 0.0, 0.0);
        copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0), &capture_actor);

        let paste_actor = actor_at(10.0, 0.0, 4.0);
        let result = copier.paste(&mut world, &paste_actor);
        assert!(result.ok);
        assert_eq!(result.blocks_changed, 1);
        assert_eq!(world.get_block_at(10, 0, 4), (7, 1));
    }

    #[test]
    fn paste_without_clipboard_fails_softly() {
        let mut world = MemoryWorld::new();
        let mut copier = Copier::new();
        let result = copier.paste(&mut world, &actor_at(0.0, 0.0, 0.0));

        assert!(!result.ok);
        assert_eq!(result.error_message, "剪贴板为空");
    }

    #[test]
    fn merge_keeps_existing_blocks_under_air() {
        let mut world = MemoryWorld::new();
        world.set_block_at(0, 0, 0, 1, 0);
        // (0,0,1)是空气，(0,0,0)非空气
        let mut copier = Copier::new();
        let actor = actor_at(0.0, 0.0, 0.0);
        copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 1), &actor);

        world.set_block_at(0, 0, 1, 9, 0);
        let result = copier.merge(&mut world, &actor);
        assert!(result.ok);
        // 空气记录被跳过，(0,0,1)保持原样
        assert_eq!(world.get_block_at(0, 0, 1), (9, 0));
    }

    #[test]
    fn rotate_without_clipboard_fails_softly() {
        let mut copier = Copier::new();
        let result = copier.rotate(&actor_at(0.0, 0.0, 0.0), Axis::Y, 90);
        assert!(!result.ok);
    }

    #[test]
    fn rotate_replaces_stored_clipboard() {
        let world = {
            let mut w = MemoryWorld::new();
            w.set_block_at(2, 0, 0, 5, 0);
            w
        };
        let mut copier = Copier::new();
        let actor = actor_at(0.0, 0.0, 0.0);
        copier.copy(&world, BlockPos::new(2, 0, 0), BlockPos::new(2, 0, 0), &actor);

        let result = copier.rotate(&actor, Axis::Y, 90);
        assert!(result.ok);

        let records = copier
            .clipboards()
            .get_clipboard("steve")
            .unwrap()
            .records()
            .unwrap()
            .to_vec();
        let placed = records.iter().find(|r| r.id == 5).unwrap();
        // (x,z)=(2,0) 绕Y转90° -> (0,2)
        assert_eq!((placed.x, placed.z), (0, 2));
    }

    #[test]
    fn stack_along_positive_x_offsets_by_span_multiples() {
        let mut world = MemoryWorld::new();
        for x in 0..=2 {
            world.set_block_at(x, 0, 0, (x + 1) as u16, 0);
        }

        let mut copier = Copier::new();
        let actor = actor_at(0.0, 0.0, 0.0); // 朝向+X
        copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(2, 0, 0), &actor);

        let result = copier.stack(&mut world, &actor, 2, StackDirection::Facing);
        assert!(result.ok);

        // 跨度3，两次重复：偏移+3与+6
        for x in 0..=2 {
            assert_eq!(world.get_block_at(x + 3, 0, 0), ((x + 1) as u16, 0));
            assert_eq!(world.get_block_at(x + 6, 0, 0), ((x + 1) as u16, 0));
        }
        assert_eq!(world.get_block_at(9, 0, 0), (AIR, 0));
    }

    #[test]
    fn vertical_stack_places_one_extra_repetition() {
        let mut world = MemoryWorld::new();
        world.set_block_at(0, 0, 0, 3, 0);

        let mut copier = Copier::new();
        let actor = actor_at(0.0, 0.0, 0.0);
        copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0), &actor);

        let result = copier.stack(&mut world, &actor, 2, StackDirection::Up);
        assert!(result.ok);

        // 闭区间循环：count=2实际放置3份
        for y in 1..=3 {
            assert_eq!(world.get_block_at(0, y, 0), (3, 0));
        }
        assert_eq!(world.get_block_at(0, 4, 0), (AIR, 0));
    }

    #[test]
    fn move_shifts_blocks_and_clears_source() {
        let mut world = MemoryWorld::new();
        world.set_block_at(0, 0, 0, 1, 0);
        world.set_block_at(1, 0, 0, 2, 0);

        let mut copier = Copier::new();
        let result = copier.move_region(
            &mut world,
            BlockPos::new(0, 0, 0),
            BlockPos::new(1, 0, 0),
            BlockPos::new(5, 0, 0),
        );

        assert!(result.ok);
        assert_eq!(world.get_block_at(0, 0, 0), (AIR, 0));
        assert_eq!(world.get_block_at(1, 0, 0), (AIR, 0));
        assert_eq!(world.get_block_at(5, 0, 0), (1, 0));
        assert_eq!(world.get_block_at(6, 0, 0), (2, 0));
    }

    #[test]
    fn overlapping_move_keeps_repopulated_cells() {
        let mut world = MemoryWorld::new();
        world.set_block_at(0, 0, 0, 1, 0);
        world.set_block_at(1, 0, 0, 2, 0);

        let mut copier = Copier::new();
        let result = copier.move_region(
            &mut world,
            BlockPos::new(0, 0, 0),
            BlockPos::new(1, 0, 0),
            BlockPos::new(1, 0, 0),
        );

        assert!(result.ok);
        // (1,0,0)既是源也是目标：先被重新放置，清除记录被去重丢弃
        assert_eq!(world.get_block_at(0, 0, 0), (AIR, 0));
        assert_eq!(world.get_block_at(1, 0, 0), (1, 0));
        assert_eq!(world.get_block_at(2, 0, 0), (2, 0));
    }
}
