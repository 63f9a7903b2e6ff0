//! `UnityFsSource` over bundles written to disk

use std::ops::ControlFlow;
use std::path::Path;

use manoexport::speakers::build_speaker_map;
use manoexport::{AssetSource, Error, UnityFsSource};
use pretty_assertions::assert_eq;
use unitybundle::AssetObject;

fn aligned_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
    out.extend_from_slice(bytes);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Serialized file v22 (no type trees) holding (class id, object bytes) pairs
fn serialized_file(objects: &[(i32, Vec<u8>)]) -> Vec<u8> {
    const HEADER_LEN: usize = 48;
    let class_ids = [49i32, 83];

    let mut data = Vec::new();
    let mut entries = Vec::new();
    for (class_id, bytes) in objects {
        while data.len() % 8 != 0 {
            data.push(0);
        }
        let type_index = class_ids.iter().position(|c| c == class_id).unwrap();
        entries.push((type_index as i32, data.len() as u64, bytes.len() as u32));
        data.extend_from_slice(bytes);
    }

    let mut meta = Vec::new();
    meta.extend_from_slice(b"2022.3.21f1\0");
    meta.extend_from_slice(&19i32.to_le_bytes());
    meta.push(0); // type trees disabled
    meta.extend_from_slice(&(class_ids.len() as i32).to_le_bytes());
    for class_id in class_ids {
        meta.extend_from_slice(&class_id.to_le_bytes());
        meta.push(0);
        meta.extend_from_slice(&(-1i16).to_le_bytes());
        meta.extend_from_slice(&[0u8; 16]);
    }
    meta.extend_from_slice(&(entries.len() as i32).to_le_bytes());
    for (path_id, (type_index, start, size)) in entries.iter().enumerate() {
        while (HEADER_LEN + meta.len()) % 4 != 0 {
            meta.push(0);
        }
        meta.extend_from_slice(&(path_id as i64 + 1).to_le_bytes());
        meta.extend_from_slice(&start.to_le_bytes());
        meta.extend_from_slice(&size.to_le_bytes());
        meta.extend_from_slice(&type_index.to_le_bytes());
    }

    let data_offset = (HEADER_LEN + meta.len()).div_ceil(16) * 16;
    let mut file = Vec::new();
    file.extend_from_slice(&(meta.len() as u32).to_be_bytes());
    file.extend_from_slice(&0u32.to_be_bytes());
    file.extend_from_slice(&22u32.to_be_bytes());
    file.extend_from_slice(&0u32.to_be_bytes());
    file.extend_from_slice(&[0, 0, 0, 0]);
    file.extend_from_slice(&(meta.len() as u32).to_be_bytes());
    file.extend_from_slice(&((data_offset + data.len()) as i64).to_be_bytes());
    file.extend_from_slice(&(data_offset as u64).to_be_bytes());
    file.extend_from_slice(&0i64.to_be_bytes());
    file.extend_from_slice(&meta);
    file.resize(data_offset, 0);
    file.extend_from_slice(&data);
    file
}

/// Uncompressed UnityFS v8 archive with a single serialized node
fn unityfs(node_path: &str, serialized: &[u8]) -> Vec<u8> {
    let mut info = vec![0u8; 16];
    info.extend_from_slice(&1i32.to_be_bytes());
    info.extend_from_slice(&(serialized.len() as u32).to_be_bytes());
    info.extend_from_slice(&(serialized.len() as u32).to_be_bytes());
    info.extend_from_slice(&0u16.to_be_bytes());
    info.extend_from_slice(&1i32.to_be_bytes());
    info.extend_from_slice(&0i64.to_be_bytes());
    info.extend_from_slice(&(serialized.len() as i64).to_be_bytes());
    info.extend_from_slice(&4u32.to_be_bytes());
    info.extend_from_slice(node_path.as_bytes());
    info.push(0);

    let mut out = Vec::new();
    out.extend_from_slice(b"UnityFS\0");
    out.extend_from_slice(&8u32.to_be_bytes());
    out.extend_from_slice(b"5.x.x\0");
    out.extend_from_slice(b"2022.3.21f1\0");
    out.extend_from_slice(&0i64.to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    while out.len() % 16 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&info);
    out.extend_from_slice(serialized);
    out
}

/// Speaker table followed by an `AudioClip` cut off after its name
fn names_then_broken_clip(dir: &Path) -> std::path::PathBuf {
    let mut names = Vec::new();
    aligned_bytes(&mut names, b"CharacterNames");
    aligned_bytes(&mut names, "Leia:莱雅\nEma:艾玛\n".as_bytes());
    let mut clip = Vec::new();
    aligned_bytes(&mut clip, b"0101Trial00_Leia001");

    let serialized = serialized_file(&[(49, names), (83, clip)]);
    let path = dir.join("general-localization-zhhans-text_assets_all.bundle");
    std::fs::write(&path, unityfs("CAB-names", &serialized)).unwrap();
    path
}

#[test]
fn test_speaker_map_stops_before_later_broken_objects() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = names_then_broken_clip(dir.path());

    let map = build_speaker_map(&UnityFsSource, &bundle, "CharacterNames").unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["Leia"], "莱雅");
    assert_eq!(map["Ema"], "艾玛");
}

#[test]
fn test_full_walk_reports_the_broken_object() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = names_then_broken_clip(dir.path());

    let mut seen = Vec::new();
    let result = UnityFsSource.visit_bundle(&bundle, &mut |asset| {
        seen.push(match asset {
            AssetObject::TextAsset(text) => text.name,
            AssetObject::AudioClip(clip) => clip.name,
        });
        Ok(ControlFlow::Continue(()))
    });

    assert_eq!(seen, ["CharacterNames"]);
    assert!(matches!(
        result,
        Err(Error::Bundle(unitybundle::Error::UnexpectedEof { .. }))
    ));
}
