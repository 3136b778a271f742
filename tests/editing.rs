use voxstream::math::{BlockPos, Vector3};
use voxstream::session::OfflineSession;
use voxstream::{
    Actor, CompressionType, Copier, MemoryWorld, SessionSaver, VoxStreamError, World,
};

fn build_house(world: &mut MemoryWorld) {
    // 3x3地板加四个角柱
    for x in 0..3 {
        for z in 0..3 {
            world.set_block_at(x, 0, z, 1, 0);
        }
    }
    for (x, z) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
        world.set_block_at(x, 1, z, 5, 0);
    }
}

#[test]
fn cut_and_paste_relocates_structure() {
    let mut world = MemoryWorld::new();
    build_house(&mut world);
    let before = world.non_air_count();

    let mut copier = Copier::new();
    let cutter = Actor::new(
        "steve",
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    );

    let cut = copier.cut(
        &mut world,
        BlockPos::new(0, 0, 0),
        BlockPos::new(2, 1, 2),
        &cutter,
    );
    assert!(cut.ok);
    assert_eq!(world.non_air_count(), 0);

    let paster = Actor::new(
        "steve",
        Vector3::new(10.0, 0.0, 10.0),
        Vector3::new(1.0, 0.0, 0.0),
    );
    let pasted = copier.paste(&mut world, &paster);
    assert!(pasted.ok);

    assert_eq!(world.non_air_count(), before);
    assert_eq!(world.get_block_at(10, 0, 10), (1, 0));
    assert_eq!(world.get_block_at(12, 1, 12), (5, 0));
}

#[test]
fn clipboard_survives_offline_session_roundtrip() -> Result<(), VoxStreamError> {
    let dir = tempfile::tempdir()?;

    let mut world = MemoryWorld::new();
    build_house(&mut world);

    let actor = Actor::new(
        "steve",
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    );

    // 第一次游玩：复制并异步持久化
    let mut copier = Copier::new();
    let copied = copier.copy(&world, BlockPos::new(0, 0, 0), BlockPos::new(2, 1, 2), &actor);
    assert!(copied.ok);

    let clipboard = copier
        .clipboards()
        .get_clipboard("steve")
        .ok_or(VoxStreamError::EmptyClipboard)?;
    let session = OfflineSession::new("steve").with_clipboard(clipboard)?;

    let saver = SessionSaver::new();
    saver.submit(session, dir.path(), CompressionType::LZ4);
    drop(saver);

    // 第二次游玩：恢复剪贴板后照常粘贴
    let mut copier = Copier::new();
    let restored = OfflineSession::load(dir.path(), "steve")?
        .into_clipboard()
        .ok_or(VoxStreamError::EmptyClipboard)?;
    copier.clipboards_mut().save_clipboard("steve", restored);

    let paster = Actor::new(
        "steve",
        Vector3::new(0.0, 0.0, 10.0),
        Vector3::new(1.0, 0.0, 0.0),
    );
    let pasted = copier.paste(&mut world, &paster);
    assert!(pasted.ok);
    assert_eq!(world.get_block_at(0, 0, 10), (1, 0));
    assert_eq!(world.get_block_at(2, 1, 12), (5, 0));

    Ok(())
}
