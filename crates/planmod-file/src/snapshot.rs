//! 场景图快照
//!
//! - JSON：用于与外部系统交换
//! - `.pmsg`：MessagePack + Zstd 的紧凑二进制格式
//!
//! 二进制文件头（16 字节，小端）：
//! 魔数 `PMSG`、格式版本、标志位（预留）、压缩后数据长度。

use crate::error::{FileError, FileResult};
use planmod_core::scene::SceneGraph;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数
const MAGIC: &[u8; 4] = b"PMSG";

/// 当前格式版本
const FORMAT_VERSION: u32 = 1;

/// Zstd 压缩级别
const COMPRESSION_LEVEL: i32 = 3;

/// 快照格式，按扩展名区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Binary,
}

impl SnapshotFormat {
    /// `.pmsg` 为二进制，其余按 JSON 处理
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pmsg") => SnapshotFormat::Binary,
            _ => SnapshotFormat::Json,
        }
    }
}

#[derive(Debug)]
struct SnapshotHeader {
    magic: [u8; 4],
    version: u32,
    flags: u32,
    compressed_size: u32,
}

impl SnapshotHeader {
    fn new(compressed_size: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            compressed_size,
        }
    }

    fn write(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        Ok(())
    }

    fn read(reader: &mut impl Read) -> FileResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a PlanMod snapshot".to_string(),
            ));
        }

        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        let version = u32::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let flags = u32::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let compressed_size = u32::from_le_bytes(buf);

        if version > FORMAT_VERSION {
            return Err(FileError::UnsupportedVersion(format!(
                "Snapshot version {} is newer than supported version {}",
                version, FORMAT_VERSION
            )));
        }

        Ok(Self {
            magic,
            version,
            flags,
            compressed_size,
        })
    }
}

pub fn to_json(graph: &SceneGraph) -> FileResult<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

pub fn from_json(text: &str) -> FileResult<SceneGraph> {
    Ok(serde_json::from_str(text)?)
}

/// 编码为二进制快照
pub fn to_binary(graph: &SceneGraph) -> FileResult<Vec<u8>> {
    let msgpack = rmp_serde::to_vec_named(graph)?;
    let compressed = zstd::encode_all(msgpack.as_slice(), COMPRESSION_LEVEL)?;
    let size = u32::try_from(compressed.len()).map_err(|_| {
        FileError::InvalidFormat(format!("Snapshot too large: {} bytes", compressed.len()))
    })?;

    let mut out = Vec::with_capacity(compressed.len() + 16);
    SnapshotHeader::new(size).write(&mut out)?;
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// 解码二进制快照
pub fn from_binary(bytes: &[u8]) -> FileResult<SceneGraph> {
    read_binary(&mut &bytes[..])
}

fn read_binary(reader: &mut impl Read) -> FileResult<SceneGraph> {
    let header = SnapshotHeader::read(reader)?;
    let mut compressed = vec![0u8; header.compressed_size as usize];
    reader.read_exact(&mut compressed)?;
    let msgpack = zstd::decode_all(compressed.as_slice())?;
    Ok(rmp_serde::from_slice(&msgpack)?)
}

/// 保存快照，格式由扩展名决定
pub fn save(graph: &SceneGraph, path: &Path) -> FileResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::to_writer_pretty(&mut writer, graph)?,
        SnapshotFormat::Binary => writer.write_all(&to_binary(graph)?)?,
    }
    writer.flush()?;

    tracing::info!(
        "Saved scene graph '{}' ({} components, {} entities) to {}",
        graph.title,
        graph.components.len(),
        graph.entities.len(),
        path.display()
    );
    Ok(())
}

pub fn load(path: &Path) -> FileResult<SceneGraph> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let graph: SceneGraph = match SnapshotFormat::from_path(path) {
        SnapshotFormat::Json => serde_json::from_reader(reader)?,
        SnapshotFormat::Binary => read_binary(&mut reader)?,
    };

    tracing::info!(
        "Loaded scene graph '{}' ({} components, {} entities) from {}",
        graph.title,
        graph.components.len(),
        graph.entities.len(),
        path.display()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planmod_core::math::{BoundingBox2, Point2};
    use planmod_core::scene::{Component, ComponentType, GeometryEntity, View, ViewType};

    fn graph() -> SceneGraph {
        let mut graph = SceneGraph::new("Cub").with_image_size(640, 480);
        let view = graph.add_view(View::new(
            "Side",
            ViewType::Side,
            BoundingBox2::from_xywh(0.0, 0.0, 320.0, 240.0),
        ));
        graph.add_component(
            Component::new("F1", ComponentType::Former, BoundingBox2::from_xywh(10.0, 10.0, 4.0, 40.0))
                .with_view(&view),
        );
        graph.add_entity(
            GeometryEntity::arc(Point2::new(20.0, 20.0), 5.0, 10.0, 200.0).with_view(&view),
        );
        graph.add_processing_note("built in test");
        graph
    }

    #[test]
    fn test_binary_roundtrip() {
        let g = graph();
        let bytes = to_binary(&g).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(from_binary(&bytes).unwrap(), g);
    }

    #[test]
    fn test_file_roundtrip_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let g = graph();
        for name in ["scene.json", "scene.pmsg"] {
            let path = dir.path().join(name);
            save(&g, &path).unwrap();
            assert_eq!(load(&path).unwrap(), g, "{}", name);
        }
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(
            from_binary(b"XXXX\0\0\0\0\0\0\0\0\0\0\0\0"),
            Err(FileError::InvalidFormat(_))
        ));

        let mut bytes = to_binary(&graph()).unwrap();
        bytes[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        assert!(matches!(
            from_binary(&bytes),
            Err(FileError::UnsupportedVersion(_))
        ));
    }
}
