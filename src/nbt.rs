// 这是一个简单的大端命名标签流，仅覆盖离线会话文件用到的标签类型
// 实际项目中如需完整NBT支持应换用专门的解析库

use crate::error::VoxStreamError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// 标签类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TryFrom<u8> for TagType {
    type Error = VoxStreamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TagType::End),
            1 => Ok(TagType::Byte),
            2 => Ok(TagType::Short),
            3 => Ok(TagType::Int),
            4 => Ok(TagType::Long),
            5 => Ok(TagType::Float),
            6 => Ok(TagType::Double),
            7 => Ok(TagType::ByteArray),
            8 => Ok(TagType::String),
            9 => Ok(TagType::List),
            10 => Ok(TagType::Compound),
            11 => Ok(TagType::IntArray),
            12 => Ok(TagType::LongArray),
            _ => Err(VoxStreamError::TagError(format!(
                "无效的标签类型: {}",
                value
            ))),
        }
    }
}

/// 标签值（只实现会话文件需要的子集）
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    ByteArray(Vec<u8>),
    IntArray(Vec<i32>),
}

impl Tag {
    fn tag_type(&self) -> TagType {
        match self {
            Tag::Byte(_) => TagType::Byte,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::IntArray(_) => TagType::IntArray,
        }
    }
}

/// 写入标签名（2字节大端长度前缀 + UTF-8内容）
fn write_name<W: Write>(writer: &mut W, name: &str) -> Result<(), VoxStreamError> {
    if name.len() > u16::MAX as usize {
        return Err(VoxStreamError::TagError("标签名过长".to_string()));
    }
    writer.write_u16::<BigEndian>(name.len() as u16)?;
    writer.write_all(name.as_bytes())?;
    Ok(())
}

fn read_name<R: Read>(reader: &mut R) -> Result<String, VoxStreamError> {
    let len = reader.read_u16::<BigEndian>()?;
    let mut buffer = vec![0u8; len as usize];
    reader.read_exact(&mut buffer)?;
    String::from_utf8(buffer).map_err(|_| VoxStreamError::TagError("非UTF-8标签名".to_string()))
}

fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> Result<(), VoxStreamError> {
    match tag {
        Tag::Byte(value) => writer.write_i8(*value)?,
        Tag::ByteArray(data) => {
            writer.write_i32::<BigEndian>(data.len() as i32)?;
            writer.write_all(data)?;
        }
        Tag::IntArray(values) => {
            writer.write_i32::<BigEndian>(values.len() as i32)?;
            for value in values {
                writer.write_i32::<BigEndian>(*value)?;
            }
        }
    }
    Ok(())
}

fn read_payload<R: Read>(reader: &mut R, tag_type: TagType) -> Result<Tag, VoxStreamError> {
    match tag_type {
        TagType::Byte => Ok(Tag::Byte(reader.read_i8()?)),
        TagType::ByteArray => {
            let len = reader.read_i32::<BigEndian>()?;
            if len < 0 {
                return Err(VoxStreamError::TagError("负的数组长度".to_string()));
            }
            let mut data = vec![0u8; len as usize];
            reader.read_exact(&mut data)?;
            Ok(Tag::ByteArray(data))
        }
        TagType::IntArray => {
            let len = reader.read_i32::<BigEndian>()?;
            if len < 0 {
                return Err(VoxStreamError::TagError("负的数组长度".to_string()));
            }
            let mut values = Vec::with_capacity(len as usize);
            for _ in 0..len {
                values.push(reader.read_i32::<BigEndian>()?);
            }
            Ok(Tag::IntArray(values))
        }
        other => Err(VoxStreamError::TagError(format!(
            "未支持的标签类型: {:?}",
            other
        ))),
    }
}

/// 把命名字段写为一个无名根复合标签
pub fn write_compound<W: Write>(
    writer: &mut W,
    entries: &[(&str, Tag)],
) -> Result<(), VoxStreamError> {
    writer.write_u8(TagType::Compound as u8)?;
    write_name(writer, "")?;

    for (name, tag) in entries {
        writer.write_u8(tag.tag_type() as u8)?;
        write_name(writer, name)?;
        write_payload(writer, tag)?;
    }

    writer.write_u8(TagType::End as u8)?;
    Ok(())
}

/// 读取根复合标签的全部命名字段
pub fn read_compound<R: Read>(reader: &mut R) -> Result<Vec<(String, Tag)>, VoxStreamError> {
    let root_type = TagType::try_from(reader.read_u8()?)?;
    if root_type != TagType::Compound {
        return Err(VoxStreamError::TagError(
            "根标签必须是复合标签".to_string(),
        ));
    }
    read_name(reader)?;

    let mut entries = Vec::new();
    loop {
        let tag_type = TagType::try_from(reader.read_u8()?)?;
        if tag_type == TagType::End {
            break;
        }
        let name = read_name(reader)?;
        let tag = read_payload(reader, tag_type)?;
        entries.push((name, tag));
    }

    Ok(entries)
}
