use clap::{Parser, Subcommand};
use voxstream::math::{Axis, Vector3};
use voxstream::session::OfflineSession;
use voxstream::{Clipboard, CompressionType, VoxStreamError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// VoxStream命令行工具 - 体素选区的二进制存储与离线会话管理
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 查看离线会话文件信息
    Info {
        /// 会话文件路径
        #[arg(short, long)]
        file: PathBuf,

        /// 是否详细输出
        #[arg(short, long)]
        verbose: bool,
    },

    /// 将离线会话中的剪贴板导出为JSON方块列表
    Export {
        /// 输入会话文件路径
        #[arg(short, long)]
        input: PathBuf,

        /// 输出文件路径（JSON格式）
        #[arg(short, long)]
        output: PathBuf,
    },

    /// 将JSON方块列表打包为离线会话文件
    Import {
        /// 输入文件路径（JSON格式）
        #[arg(short, long)]
        input: PathBuf,

        /// 输出目录（会话文件写入其offline_data子目录）
        #[arg(short, long)]
        output: PathBuf,

        /// 操作者ID（决定文件名）
        #[arg(short, long)]
        player: String,

        /// 压缩算法: none, zstd, lz4, brotli
        #[arg(short, long, default_value = "zstd")]
        compression: String,
    },

    /// 就地旋转会话文件中的剪贴板
    Rotate {
        /// 会话文件路径
        #[arg(short, long)]
        file: PathBuf,

        /// 旋转轴: x, y, z
        #[arg(short, long, default_value = "y")]
        axis: String,

        /// 角度（90的倍数）
        #[arg(short, long)]
        degrees: i32,
    },
}

fn main() -> Result<(), VoxStreamError> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Info { file, verbose } => print_session_info(file, *verbose),

        Commands::Export { input, output } => {
            println!("导出中...");
            export_session_to_json(input, output)?;
            println!("导出完成: {}", output.display());
            Ok(())
        }

        Commands::Import {
            input,
            output,
            player,
            compression,
        } => {
            let compression_type = match CompressionType::from_name(compression) {
                Some(compression_type) => compression_type,
                None => {
                    println!("不支持的压缩算法: {}，使用默认的zstd", compression);
                    CompressionType::Zstandard
                }
            };

            println!("打包中...");
            import_json_to_session(input, output, player, compression_type)?;
            println!("打包完成: {}", output.display());
            Ok(())
        }

        Commands::Rotate {
            file,
            axis,
            degrees,
        } => {
            let axis = parse_axis(axis)?;
            rotate_session_clipboard(file, axis, *degrees)?;
            println!("剪贴板已旋转: {}", file.display());
            Ok(())
        }
    }
}

fn parse_axis(name: &str) -> Result<Axis, VoxStreamError> {
    match name.to_lowercase().as_str() {
        "x" => Ok(Axis::X),
        "y" => Ok(Axis::Y),
        "z" => Ok(Axis::Z),
        _ => Err(VoxStreamError::InvalidArgument(format!(
            "无效的旋转轴: {}",
            name
        ))),
    }
}

/// 按文件路径读取会话，操作者ID取自文件名
fn load_session_file(path: &Path) -> Result<OfflineSession, VoxStreamError> {
    if !path.exists() {
        return Err(VoxStreamError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("文件不存在: {}", path.display()),
        )));
    }

    let player_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown");

    let mut reader = BufReader::new(File::open(path)?);
    OfflineSession::read_from(&mut reader, player_id)
}

/// 打印会话文件信息
fn print_session_info(path: &Path, verbose: bool) -> Result<(), VoxStreamError> {
    let session = load_session_file(path)?;

    println!("=== 离线会话信息 ===");
    println!("文件: {}", path.display());
    println!("操作者: {}", session.player_id);
    println!(
        "撤销数据: {}",
        if session.undo_data.is_empty() {
            "无".to_string()
        } else {
            format!("{} 字节", session.undo_data.len())
        }
    );
    println!(
        "重做数据: {}",
        if session.redo_data.is_empty() {
            "无".to_string()
        } else {
            format!("{} 字节", session.redo_data.len())
        }
    );

    let Some(mut clipboard) = session.into_clipboard() else {
        println!("剪贴板: 无");
        return Ok(());
    };
    clipboard.decompress()?;

    println!("剪贴板方块数: {}", clipboard.len());
    if let Some(anchor) = clipboard.relative_position() {
        println!("锚点: ({}, {}, {})", anchor.x, anchor.y, anchor.z);
    }
    if let Some(bb) = clipboard.size_data() {
        println!(
            "包围盒: X [{}, {}]  Y [{}, {}]  Z [{}, {}]",
            bb.min_x, bb.max_x, bb.min_y, bb.max_y, bb.min_z, bb.max_z
        );
    }

    if verbose {
        println!("\n=== 方块示例 ===");
        let records = clipboard.records()?;
        for (i, record) in records.iter().take(10).enumerate() {
            println!(
                "  #{}: id={} meta={} @ ({}, {}, {})",
                i + 1,
                record.id,
                record.meta,
                record.x,
                record.y,
                record.z
            );
        }
        if records.len() > 10 {
            println!("  ... 还有 {} 个方块", records.len() - 10);
        }
    }

    Ok(())
}

/// 导出会话剪贴板为JSON方块列表
fn export_session_to_json(input: &Path, output: &Path) -> Result<(), VoxStreamError> {
    let session = load_session_file(input)?;
    let player_id = session.player_id.clone();
    let duplicate_detection = session.clipboard_duplicate_detection;

    let mut clipboard = session
        .into_clipboard()
        .ok_or(VoxStreamError::EmptyClipboard)?;
    clipboard.decompress()?;

    let mut blocks = Vec::new();
    for record in clipboard.records()? {
        blocks.push(serde_json::json!({
            "pos": [record.x, record.y, record.z],
            "id": record.id,
            "meta": record.meta,
        }));
    }

    let anchor = clipboard
        .relative_position()
        .map(|pos| serde_json::json!([pos.x, pos.y, pos.z]))
        .unwrap_or(serde_json::Value::Null);

    let json = serde_json::json!({
        "format": "vxs",
        "version": "1.0",
        "player": player_id,
        "anchor": anchor,
        "duplicate_detection": duplicate_detection,
        "blocks": blocks,
    });

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(output)?);
    serde_json::to_writer_pretty(writer, &json)
        .map_err(|e| VoxStreamError::ValidationError(format!("JSON写入错误: {}", e)))?;

    Ok(())
}

/// 从JSON方块列表构建会话文件
fn import_json_to_session(
    input: &Path,
    output: &Path,
    player_id: &str,
    compression: CompressionType,
) -> Result<(), VoxStreamError> {
    let reader = BufReader::new(File::open(input)?);
    let data: serde_json::Value = serde_json::from_reader(reader)
        .map_err(|e| VoxStreamError::ValidationError(format!("JSON解析错误: {}", e)))?;

    let mut clipboard = Clipboard::new();

    if let Some(anchor) = data.get("anchor").and_then(|a| a.as_array()) {
        if anchor.len() != 3 {
            return Err(VoxStreamError::ValidationError(
                "anchor字段格式错误".to_string(),
            ));
        }
        clipboard.set_relative_position(Vector3::new(
            anchor[0].as_f64().unwrap_or(0.0),
            anchor[1].as_f64().unwrap_or(0.0),
            anchor[2].as_f64().unwrap_or(0.0),
        ));
    }

    let blocks = data
        .get("blocks")
        .and_then(|b| b.as_array())
        .ok_or_else(|| VoxStreamError::ValidationError("缺少blocks字段".to_string()))?;

    for block in blocks {
        let pos = block
            .get("pos")
            .and_then(|p| p.as_array())
            .ok_or_else(|| VoxStreamError::ValidationError("方块缺少pos字段".to_string()))?;
        if pos.len() != 3 {
            return Err(VoxStreamError::ValidationError(
                "方块坐标格式错误".to_string(),
            ));
        }

        let id = block.get("id").and_then(|i| i.as_u64()).unwrap_or(0) as u16;
        let meta = block.get("meta").and_then(|m| m.as_u64()).unwrap_or(0) as u8;

        clipboard.add_block_at(
            pos[0].as_i64().unwrap_or(0) as i32,
            pos[1].as_i64().unwrap_or(0) as i32,
            pos[2].as_i64().unwrap_or(0) as i32,
            id,
            meta,
        )?;
    }

    let session = OfflineSession::new(player_id).with_clipboard(&clipboard)?;
    session.save(output, compression)?;

    Ok(())
}

/// 就地旋转会话文件里的剪贴板
fn rotate_session_clipboard(path: &Path, axis: Axis, degrees: i32) -> Result<(), VoxStreamError> {
    let session = load_session_file(path)?;
    let player_id = session.player_id.clone();
    let undo_data = session.undo_data.clone();
    let redo_data = session.redo_data.clone();

    let mut clipboard = session
        .into_clipboard()
        .ok_or(VoxStreamError::EmptyClipboard)?;
    clipboard.decompress()?;

    let rotated = voxstream::rotation::rotate(&clipboard, axis, degrees)?;

    let mut session = OfflineSession::new(&player_id).with_clipboard(&rotated)?;
    session.undo_data = undo_data;
    session.redo_data = redo_data;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    session.write_to(&mut writer, CompressionType::Zstandard)?;
    writer.flush()?;

    Ok(())
}
