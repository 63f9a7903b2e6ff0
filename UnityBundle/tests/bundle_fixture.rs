use pretty_assertions::assert_eq;
use unitybundle::{AssetBundle, AssetObject, Error};

/// Minimal byte writer for building fixture bundles
struct Buf {
    bytes: Vec<u8>,
    big: bool,
}

impl Buf {
    fn le() -> Self {
        Self { bytes: Vec::new(), big: false }
    }

    fn be() -> Self {
        Self { bytes: Vec::new(), big: true }
    }

    fn raw(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }

    fn u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    fn u16(&mut self, v: u16) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn i16(&mut self, v: i16) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn u32(&mut self, v: u32) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn i32(&mut self, v: i32) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn i64(&mut self, v: i64) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn u64(&mut self, v: u64) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn f32(&mut self, v: f32) {
        let b = if self.big { v.to_be_bytes() } else { v.to_le_bytes() };
        self.raw(&b);
    }

    fn cstr(&mut self, s: &str) {
        self.raw(s.as_bytes());
        self.u8(0);
    }

    fn align(&mut self, n: usize) {
        while self.bytes.len() % n != 0 {
            self.u8(0);
        }
    }

    fn aligned_bytes(&mut self, b: &[u8]) {
        self.i32(i32::try_from(b.len()).unwrap());
        self.raw(b);
        self.align(4);
    }
}

fn text_asset_object(name: &str, script: &[u8]) -> Vec<u8> {
    let mut obj = Buf::le();
    obj.aligned_bytes(name.as_bytes());
    obj.aligned_bytes(script);
    obj.bytes
}

fn audio_clip_object(name: &str, source: &str, offset: i64, size: i64) -> Vec<u8> {
    let mut obj = Buf::le();
    obj.aligned_bytes(name.as_bytes());
    obj.i32(1); // load type
    obj.i32(1); // channels
    obj.i32(44100); // frequency
    obj.i32(16); // bits per sample
    obj.f32(1.5); // length
    obj.u8(0); // tracker format
    obj.u8(0); // ambisonic
    obj.align(4);
    obj.i32(0); // subsound index
    obj.u8(1);
    obj.u8(0);
    obj.u8(0);
    obj.align(4);
    obj.aligned_bytes(source.as_bytes());
    obj.i64(offset);
    obj.i64(size);
    obj.i32(2); // compression format
    obj.bytes
}

/// Serialized file v22 holding the given (class id, object bytes) pairs
fn serialized_file(objects: &[(i32, Vec<u8>)]) -> Vec<u8> {
    const HEADER_LEN: usize = 48;

    let mut data = Buf::le();
    let mut entries = Vec::new();
    for (class_id, bytes) in objects {
        data.align(8);
        entries.push((*class_id, data.bytes.len() as u64, bytes.len() as u32));
        data.raw(bytes);
    }

    let class_ids = [49, 83];
    let mut meta = Buf::le();
    meta.cstr("2022.3.21f1");
    meta.i32(19); // target platform
    meta.u8(1); // type tree enabled
    meta.i32(class_ids.len() as i32);
    for class_id in class_ids {
        meta.i32(class_id);
        meta.u8(0); // stripped
        meta.i16(-1); // script type index
        meta.raw(&[0u8; 16]); // old type hash
        meta.i32(1); // type tree nodes
        meta.i32(4); // string buffer size
        meta.raw(&[0u8; 32]);
        meta.raw(b"abc\0");
        meta.i32(0); // dependencies
    }
    meta.i32(entries.len() as i32);
    for (path_id, (class_id, start, size)) in entries.iter().enumerate() {
        meta.align(4);
        meta.i64(path_id as i64 + 1);
        meta.u64(*start);
        meta.u32(*size);
        let type_index = class_ids.iter().position(|c| c == class_id).unwrap();
        meta.i32(type_index as i32);
    }
    meta.i32(0); // script types
    meta.i32(0); // externals

    let data_offset = (HEADER_LEN + meta.bytes.len()).div_ceil(16) * 16;

    let mut file = Buf::be();
    file.u32(meta.bytes.len() as u32);
    file.u32(0);
    file.u32(22);
    file.u32(0);
    file.u8(0); // little endian
    file.raw(&[0, 0, 0]);
    file.u32(meta.bytes.len() as u32);
    file.i64((data_offset + data.bytes.len()) as i64);
    file.i64(data_offset as i64);
    file.i64(0);
    assert_eq!(file.bytes.len(), HEADER_LEN);
    file.raw(&meta.bytes);
    while file.bytes.len() < data_offset {
        file.u8(0);
    }
    file.raw(&data.bytes);
    file.bytes
}

/// UnityFS v8 archive; first half of the data is stored raw, second half LZ4
fn unityfs(nodes: &[(&str, u32, Vec<u8>)], info_at_end: bool) -> Vec<u8> {
    let mut data = Vec::new();
    let mut node_table = Vec::new();
    for (path, flags, bytes) in nodes {
        node_table.push((data.len() as i64, bytes.len() as i64, *flags, *path));
        data.extend_from_slice(bytes);
    }

    let (raw_half, lz4_half) = data.split_at(data.len() / 2);
    let compressed_half = lz4_flex::block::compress(lz4_half);

    let mut info = Buf::be();
    info.raw(&[0u8; 16]);
    info.i32(2);
    info.u32(raw_half.len() as u32);
    info.u32(raw_half.len() as u32);
    info.u16(0);
    info.u32(lz4_half.len() as u32);
    info.u32(compressed_half.len() as u32);
    info.u16(3);
    info.i32(node_table.len() as i32);
    for (offset, size, flags, path) in &node_table {
        info.i64(*offset);
        info.i64(*size);
        info.u32(*flags);
        info.cstr(path);
    }

    let (stored_info, flags) = if info_at_end {
        (lz4_flex::block::compress(&info.bytes), 0x80 | 0x200 | 2)
    } else {
        (info.bytes.clone(), 0x40)
    };

    let mut out = Buf::be();
    out.cstr("UnityFS");
    out.u32(8);
    out.cstr("5.x.x");
    out.cstr("2022.3.21f1");
    out.i64(0);
    out.u32(stored_info.len() as u32);
    out.u32(info.bytes.len() as u32);
    out.u32(flags);
    out.align(16);
    if !info_at_end {
        out.raw(&stored_info);
    }
    if flags & 0x200 != 0 {
        out.align(16);
    }
    out.raw(raw_half);
    out.raw(&compressed_half);
    if info_at_end {
        out.raw(&stored_info);
    }
    out.bytes
}

fn fixture(info_at_end: bool) -> Vec<u8> {
    let names = "Leia:莱雅\nEma:艾玛\n".as_bytes();
    let serialized = serialized_file(&[
        (49, text_asset_object("CharacterNames", names)),
        (
            83,
            audio_clip_object("0101Trial00_Leia001", "archive:/CAB-test/CAB-test.resS", 4, 16),
        ),
    ]);
    unityfs(
        &[
            ("CAB-test", 4, serialized),
            ("CAB-test.resS", 0, b"xxxxFSB5-audio-bytes-tail".to_vec()),
        ],
        info_at_end,
    )
}

fn assert_fixture_contents(bundle: &AssetBundle) {
    let assets: Vec<_> = bundle.assets().collect::<Result<_, _>>().unwrap();
    assert_eq!(assets.len(), 2);

    let AssetObject::TextAsset(text) = &assets[0] else {
        panic!("expected a text asset first");
    };
    assert_eq!(text.name, "CharacterNames");
    assert_eq!(text.text(), "Leia:莱雅\nEma:艾玛\n");

    let AssetObject::AudioClip(clip) = &assets[1] else {
        panic!("expected an audio clip second");
    };
    assert_eq!(clip.name, "0101Trial00_Leia001");
    assert_eq!(clip.samples.len(), 1);
    assert_eq!(clip.samples[0].file_name, "0101Trial00_Leia001.fsb");
    assert_eq!(clip.samples[0].data, b"FSB5-audio-bytes");
}

#[test]
fn test_reads_bundle_with_inline_block_info() {
    let bundle = AssetBundle::from_bytes(&fixture(false)).unwrap();
    assert_eq!(bundle.archive().nodes().len(), 2);
    assert_eq!(bundle.archive().header().unity_revision, "2022.3.21f1");
    assert_fixture_contents(&bundle);
}

#[test]
fn test_reads_bundle_with_compressed_block_info_at_end() {
    let bundle = AssetBundle::from_bytes(&fixture(true)).unwrap();
    assert_fixture_contents(&bundle);
}

#[test]
fn test_clip_without_resource_has_no_samples() {
    let serialized = serialized_file(&[(83, audio_clip_object("Silent", "", 0, 0))]);
    let bytes = unityfs(&[("CAB-silent", 4, serialized)], false);
    let bundle = AssetBundle::from_bytes(&bytes).unwrap();
    let AssetObject::AudioClip(clip) = bundle.assets().next().unwrap().unwrap() else {
        panic!("expected an audio clip");
    };
    assert_eq!(clip.name, "Silent");
    assert!(clip.samples.is_empty());
}

#[test]
fn test_missing_resource_node_is_an_error() {
    let serialized = serialized_file(&[(
        83,
        audio_clip_object("Lost", "archive:/CAB-gone/CAB-gone.resS", 0, 4),
    )]);
    let bytes = unityfs(&[("CAB-lost", 4, serialized)], false);
    let bundle = AssetBundle::from_bytes(&bytes).unwrap();
    let err = bundle.assets().next().unwrap().unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { ref clip, .. } if clip == "Lost"));
}

#[test]
fn test_objects_are_decoded_as_the_walk_advances() {
    let serialized = serialized_file(&[
        (49, text_asset_object("CharacterNames", "Leia:莱雅\n".as_bytes())),
        (
            83,
            audio_clip_object("Lost", "archive:/CAB-gone/CAB-gone.resS", 0, 4),
        ),
        (49, text_asset_object("Unreached", b"")),
    ]);
    let bytes = unityfs(&[("CAB-names", 4, serialized)], false);
    let bundle = AssetBundle::from_bytes(&bytes).unwrap();

    // Stopping after the first object never decodes the broken clip
    let AssetObject::TextAsset(text) = bundle.assets().next().unwrap().unwrap() else {
        panic!("expected a text asset first");
    };
    assert_eq!(text.name, "CharacterNames");

    // A full walk yields the error in place and then ends
    let mut assets = bundle.assets();
    assert!(assets.next().unwrap().is_ok());
    assert!(matches!(
        assets.next(),
        Some(Err(Error::ResourceNotFound { ref clip, .. })) if clip == "Lost"
    ));
    assert!(assets.next().is_none());
}

/// UnityFS header with inline, uncompressed block info and `payload` as block data
fn unityfs_with_blocks(blocks: &[(u32, u32, u16)], payload: &[u8]) -> Vec<u8> {
    let mut info = Buf::be();
    info.raw(&[0u8; 16]);
    info.i32(blocks.len() as i32);
    for (uncompressed, compressed, flags) in blocks {
        info.u32(*uncompressed);
        info.u32(*compressed);
        info.u16(*flags);
    }
    info.i32(0); // nodes

    let mut out = Buf::be();
    out.cstr("UnityFS");
    out.u32(8);
    out.cstr("5.x.x");
    out.cstr("2022.3.21f1");
    out.i64(0);
    out.u32(info.bytes.len() as u32);
    out.u32(info.bytes.len() as u32);
    out.u32(0);
    out.align(16);
    out.raw(&info.bytes);
    out.raw(payload);
    out.bytes
}

#[test]
fn test_oversized_block_table_is_rejected() {
    let blocks = vec![(u32::MAX, 1, 2); 200];
    let bytes = unityfs_with_blocks(&blocks, &[0u8; 200]);
    assert!(matches!(
        AssetBundle::from_bytes(&bytes),
        Err(Error::InvalidBlockSize { compressed: 1, uncompressed }) if uncompressed == u32::MAX as usize
    ));
}

#[test]
fn test_stored_block_sizes_must_fit_the_file() {
    let bytes = unityfs_with_blocks(&[(8, 8, 0), (u32::MAX, u32::MAX, 0)], &[0u8; 8]);
    assert!(matches!(
        AssetBundle::from_bytes(&bytes),
        Err(Error::UnexpectedEof { available: 8, .. })
    ));

    let bytes = unityfs_with_blocks(&[(9, 8, 0)], &[0u8; 8]);
    assert!(matches!(
        AssetBundle::from_bytes(&bytes),
        Err(Error::InvalidBlockSize { compressed: 8, uncompressed: 9 })
    ));
}

#[test]
fn test_truncated_bundle_is_an_error() {
    let mut bytes = fixture(false);
    bytes.truncate(bytes.len() - 10);
    assert!(AssetBundle::from_bytes(&bytes).is_err());
}

#[test]
fn test_open_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.bundle");
    std::fs::write(&path, fixture(false)).unwrap();

    let bundle = AssetBundle::open(&path).unwrap();
    assert_fixture_contents(&bundle);
}
