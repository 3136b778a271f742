use voxstream::math::{Axis, BlockPos, Vector3};
use voxstream::session::OfflineSession;
use voxstream::{
    Actor, CompressionType, Copier, MemoryWorld, SessionSaver, StackDirection, VoxStreamError,
    World,
};
use std::path::Path;

fn main() -> Result<(), VoxStreamError> {
    env_logger::init();

    // 搭一个简单的示例结构：5x3x5的石头平台，中间立一根柱子
    println!("创建示例世界...");
    let mut world = MemoryWorld::new();
    for x in 0..5 {
        for z in 0..5 {
            world.set_block_at(x, 0, z, 1, 0);
        }
    }
    for y in 1..=3 {
        world.set_block_at(2, y, 2, 17, 0);
    }
    println!("初始方块数: {}", world.non_air_count());

    let actor = Actor::new(
        "demo",
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0), // 朝向+X
    );
    let mut copier = Copier::new();

    // 复制整个结构
    let copied = copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(4, 3, 4), &actor);
    println!(
        "复制完成: 访问 {} 格，耗时 {:.4} 秒",
        copied.blocks_changed, copied.elapsed_seconds
    );

    // 沿朝向堆叠两份
    let stacked = copier.stack(&mut world, &actor, 2, StackDirection::Facing);
    println!(
        "堆叠完成: 修改 {} 格，重载 {} 个区块",
        stacked.blocks_changed,
        world.reload_calls()
    );

    // 旋转剪贴板再粘贴到别处
    let rotated = copier.rotate(&actor, Axis::Y, 90);
    println!("旋转: ok={}", rotated.ok);

    let paste_actor = Actor::new(
        "demo",
        Vector3::new(0.0, 0.0, 20.0),
        Vector3::new(1.0, 0.0, 0.0),
    );
    let pasted = copier.paste(&mut world, &paste_actor);
    println!("粘贴完成: 修改 {} 格", pasted.blocks_changed);
    println!("当前方块数: {}", world.non_air_count());

    // 把剪贴板异步保存为离线会话
    let clipboard = copier
        .clipboards()
        .get_clipboard("demo")
        .ok_or(VoxStreamError::EmptyClipboard)?;
    let session = OfflineSession::new("demo").with_clipboard(clipboard)?;

    let data_folder = Path::new("demo_data");
    let saver = SessionSaver::new();
    saver.submit(session, data_folder, CompressionType::Zstandard);
    drop(saver); // 等待写盘完成

    // 读回并检查
    let loaded = OfflineSession::load(data_folder, "demo")?;
    let mut restored = loaded
        .into_clipboard()
        .ok_or(VoxStreamError::EmptyClipboard)?;
    restored.decompress()?;
    println!("离线会话读回: {} 个方块", restored.len());

    Ok(())
}
