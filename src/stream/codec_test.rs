// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::*;
use crate::stream::testing::compress;

#[test]
fn test_every_codec_fills_destination() {
    let original: Vec<u8> = (0..4096u32).flat_map(|i| (i % 97).to_be_bytes()).collect();

    for kind in CodecKind::ALL {
        let mut codec = kind.codec();
        assert_eq!(codec.kind(), kind);

        let compressed = compress(kind, &original);
        let mut dst = vec![0u8; original.len()];
        let written = codec
            .decompress(&compressed, original.len(), &mut dst)
            .unwrap();

        assert_eq!(written, original.len(), "codec {}", kind);
        assert_eq!(dst, original, "codec {}", kind);
    }
}

#[test]
fn test_only_identity_is_passthrough() {
    assert!(CodecKind::None.codec().is_passthrough());
    assert!(!CodecKind::Deflate.codec().is_passthrough());
    assert!(!CodecKind::Lz4.codec().is_passthrough());
    assert!(!CodecKind::Zstd.codec().is_passthrough());
}

#[test]
fn test_corrupt_input_is_reported() {
    let garbage = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02, 0x03, 0x04];
    for kind in [CodecKind::Deflate, CodecKind::Lz4, CodecKind::Zstd] {
        let mut dst = vec![0u8; 64];
        let err = kind.codec().decompress(&garbage, 64, &mut dst).unwrap_err();
        let CodecError::Corrupt { codec, .. } = err;
        assert_eq!(codec, kind);
    }
}

#[test]
fn test_output_larger_than_declared_reports_real_size() {
    let original = vec![7u8; 1000];
    for kind in [CodecKind::Deflate, CodecKind::Zstd] {
        let compressed = compress(kind, &original);
        let mut dst = vec![0u8; 100];
        let produced = kind.codec().decompress(&compressed, 100, &mut dst).unwrap();
        assert_eq!(produced, 1000, "codec {}", kind);
        assert_eq!(dst, vec![7u8; 100], "codec {}", kind);
    }

    // Raw lz4 blocks only tell how far decoding got
    let compressed = compress(CodecKind::Lz4, &original);
    let mut dst = vec![0u8; 100];
    let produced = Lz4Codec.decompress(&compressed, 100, &mut dst).unwrap();
    assert!(produced > 100, "lz4 reported {}", produced);
}

#[test]
fn test_deflate_exact_fit() {
    let original: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
    let compressed = compress(CodecKind::Deflate, &original);
    let mut dst = vec![0u8; original.len()];
    let produced = DeflateCodec::new()
        .decompress(&compressed, original.len(), &mut dst)
        .unwrap();
    assert_eq!(produced, original.len());
    assert_eq!(dst, original);
}

#[test]
fn test_deflate_inflater_is_reused_across_chunks() {
    let mut codec = DeflateCodec::new();
    let first = compress(CodecKind::Deflate, b"first chunk payload");
    let second = compress(CodecKind::Deflate, &[3u8; 512]);

    let mut dst = vec![0u8; 19];
    assert_eq!(codec.decompress(&first, 19, &mut dst).unwrap(), 19);
    assert_eq!(&dst, b"first chunk payload");

    // A corrupt chunk must not poison the next one
    let mut dst = vec![0u8; 8];
    assert!(codec.decompress(&[0xde, 0xad, 0xbe, 0xef], 8, &mut dst).is_err());

    let mut dst = vec![0u8; 512];
    assert_eq!(codec.decompress(&second, 512, &mut dst).unwrap(), 512);
    assert_eq!(dst, vec![3u8; 512]);

    // Truncated input that never fills the output
    let mut dst = vec![0u8; 512];
    assert!(codec
        .decompress(&second[..second.len() / 2], 512, &mut dst)
        .is_err());
}

#[test]
fn test_identity_reports_payload_size() {
    let mut dst = [0u8; 2];
    assert_eq!(IdentityCodec.decompress(&[1, 2, 3], 2, &mut dst).unwrap(), 3);
    assert_eq!(dst, [1, 2]);

    let mut dst = [0u8; 4];
    assert_eq!(IdentityCodec.decompress(&[1, 2], 4, &mut dst).unwrap(), 2);
}

#[test]
fn test_codec_names() {
    assert_eq!("ZSTD".parse::<CodecKind>().unwrap(), CodecKind::Zstd);
    assert_eq!("None".parse::<CodecKind>().unwrap(), CodecKind::None);
    assert_eq!("zlib".parse::<CodecKind>().unwrap(), CodecKind::Deflate);
    assert!("snappy".parse::<CodecKind>().is_err());
    assert_eq!(CodecKind::Lz4.wire_name(), "LZ4");
    assert_eq!(CodecKind::default(), CodecKind::None);
}
