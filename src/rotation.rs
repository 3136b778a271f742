use crate::block_array::BlockArray;
use crate::clipboard::Clipboard;
use crate::error::VoxStreamError;
use crate::math::{Axis, BlockPos};

/// 把角度归一化为0..=3个90°步进
fn rotation_steps(degrees: i32) -> Result<i32, VoxStreamError> {
    if degrees % 90 != 0 {
        return Err(VoxStreamError::InvalidRotation(degrees));
    }
    Ok(((degrees / 90) % 4 + 4) % 4)
}

/// 绕轴旋转与轴正交的坐标对，轴坐标不变
fn rotate_pair(a: i32, b: i32, steps: i32) -> (i32, i32) {
    match steps {
        1 => (-b, a),
        2 => (-a, -b),
        3 => (b, -a),
        _ => (a, b),
    }
}

/// 绕指定轴按90°的倍数旋转剪贴板
///
/// 返回新剪贴板，输入保持不变；包围盒按旋转后的坐标重建，
/// 锚点不参与旋转。非90°倍数返回InvalidRotation。
pub fn rotate(
    clipboard: &Clipboard,
    axis: Axis,
    degrees: i32,
) -> Result<Clipboard, VoxStreamError> {
    let steps = rotation_steps(degrees)?;
    let records = clipboard.records()?;

    let mut rotated = Clipboard::new();
    rotated.set_duplicate_detection(clipboard.duplicate_detection());
    if let Some(anchor) = clipboard.relative_position() {
        rotated.set_relative_block_pos(anchor);
    }

    for record in records {
        let (x, y, z) = match axis {
            Axis::X => {
                let (y, z) = rotate_pair(record.y, record.z, steps);
                (record.x, y, z)
            }
            Axis::Y => {
                let (x, z) = rotate_pair(record.x, record.z, steps);
                (x, record.y, z)
            }
            Axis::Z => {
                let (x, y) = rotate_pair(record.x, record.y, steps);
                (x, y, record.z)
            }
        };
        rotated.add_block_at(x, y, z, record.id, record.meta)?;
    }

    Ok(rotated)
}

/// 平移缓冲中的所有记录并同步平移包围盒
pub fn translate(array: &BlockArray, delta: BlockPos) -> Result<BlockArray, VoxStreamError> {
    let records = array.records()?;

    let mut translated = if array.duplicate_detection() {
        BlockArray::with_duplicate_detection()
    } else {
        BlockArray::new()
    };

    for record in records {
        translated.add_block_at(
            record.x + delta.x,
            record.y + delta.y,
            record.z + delta.z,
            record.id,
            record.meta,
        )?;
    }

    Ok(translated)
}
