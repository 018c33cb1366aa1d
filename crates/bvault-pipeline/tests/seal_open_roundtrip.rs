//! Integration tests for the full seal/open pipeline.
//!
//! Every test uses a low PBKDF2 iteration count; the default-parameter path
//! is covered by bvault-crypto's own tests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bvault_core::{BvaultError, CompressionLevel, IntegrityIssue, MergeError};
use bvault_crypto::KdfParams;
use bvault_pipeline::{open, open_value, seal, seal_value, ArtifactPayload, BackupArtifact, SealOptions};
use proptest::prelude::*;
use secrecy::SecretString;
use serde_json::json;

fn fast_kdf() -> KdfParams {
    KdfParams { iterations: 1000 }
}

fn options(max_chunk_size: usize) -> SealOptions {
    SealOptions {
        kdf: fast_kdf(),
        max_chunk_size,
        ..SealOptions::default()
    }
}

/// Low-redundancy text so compressed output stays well above small chunk sizes.
fn sales_export(rows: usize) -> String {
    (0..rows)
        .map(|i| format!("{i},{},{}\n", (i * 7919) % 10007, (i * 104_729) % 997))
        .collect()
}

#[test]
fn encrypted_chunked_roundtrip() {
    let data = sales_export(500);
    let password = SecretString::from("correct horse battery staple");
    let opts = options(64).with_password(password.clone());

    let artifact = seal(&data, &opts).unwrap();
    assert!(artifact.is_encrypted());
    assert_eq!(artifact.encryption.as_ref().unwrap().kdf_iterations, 1000);
    match &artifact.payload {
        ArtifactPayload::Chunked(set) => {
            assert!(set.chunks.len() > 1);
            assert_eq!(set.metadata.total_chunks, set.chunks.len());
            assert_eq!(set.metadata.chunk_size, 64);
        }
        other => panic!("expected chunked payload, got: {other:?}"),
    }

    assert_eq!(open(&artifact, Some(&password)).unwrap(), data);
}

#[test]
fn small_payload_stays_inline() {
    let artifact = seal("tiny", &options(1024)).unwrap();
    assert_eq!(artifact.payload.chunk_count(), 1);
    assert!(matches!(artifact.payload, ArtifactPayload::Inline { .. }));
    assert_eq!(artifact.checksum.size, 4);
}

#[test]
fn wrong_password_is_generic_failure() {
    let opts = options(1024).with_password(SecretString::from("right"));
    let artifact = seal("secret ledger", &opts).unwrap();

    let err = open(&artifact, Some(&SecretString::from("wrong"))).unwrap_err();
    assert!(matches!(err, BvaultError::DecryptionFailed), "got: {err:?}");
}

#[test]
fn tampered_chunk_fails_merge() {
    let data = sales_export(300);
    let mut artifact = seal(&data, &options(48)).unwrap();

    let ArtifactPayload::Chunked(set) = &mut artifact.payload else {
        panic!("expected chunked payload");
    };
    // Same length, different content, still valid base64 of ASCII.
    let original = String::from_utf8(STANDARD.decode(&set.chunks[1]).unwrap()).unwrap();
    let flipped: String = original
        .chars()
        .map(|c| if c == 'A' { 'B' } else { 'A' })
        .collect();
    set.chunks[1] = STANDARD.encode(flipped);

    let err = open(&artifact, None).unwrap_err();
    assert!(
        matches!(err, BvaultError::Merge(MergeError::ChecksumMismatch { .. })),
        "got: {err:?}"
    );
}

#[test]
fn dropped_chunk_fails_merge_count() {
    let mut artifact = seal(&sales_export(300), &options(48)).unwrap();
    let ArtifactPayload::Chunked(set) = &mut artifact.payload else {
        panic!("expected chunked payload");
    };
    set.chunks.pop();

    assert!(matches!(
        open(&artifact, None),
        Err(BvaultError::Merge(MergeError::ChunkCountMismatch { .. }))
    ));
}

#[test]
fn tampered_ciphertext_is_rejected() {
    let password = SecretString::from("pw");
    let mut artifact = seal("ledger", &options(4096).with_password(password.clone())).unwrap();

    let ArtifactPayload::Inline { data } = &mut artifact.payload else {
        panic!("expected inline payload");
    };
    let mut bytes = STANDARD.decode(&*data).unwrap();
    bytes[0] ^= 0x01;
    *data = STANDARD.encode(bytes);

    assert!(matches!(
        open(&artifact, Some(&password)),
        Err(BvaultError::DecryptionFailed)
    ));
}

#[test]
fn tampered_iteration_count_is_generic_failure() {
    let password = SecretString::from("pw");
    let sealed = seal("ledger", &options(4096).with_password(password.clone())).unwrap();

    for iterations in [0, u32::MAX] {
        let mut artifact = sealed.clone();
        artifact.encryption.as_mut().unwrap().kdf_iterations = iterations;
        assert!(matches!(
            open(&artifact, Some(&password)),
            Err(BvaultError::DecryptionFailed)
        ));
    }
}

#[test]
fn tampered_total_size_fails_merge() {
    let mut artifact = seal(&sales_export(300), &options(48)).unwrap();
    let ArtifactPayload::Chunked(set) = &mut artifact.payload else {
        panic!("expected chunked payload");
    };
    set.metadata.total_size = u64::MAX;

    assert!(matches!(
        open(&artifact, None),
        Err(BvaultError::Merge(MergeError::SizeMismatch { .. }))
    ));
}

#[test]
fn altered_checksum_record_fails_integrity() {
    let mut artifact = seal("inventory snapshot", &options(4096)).unwrap();
    artifact.checksum.sha256 = "0".repeat(64);

    match open(&artifact, None) {
        Err(BvaultError::Integrity(issues)) => {
            assert_eq!(issues, vec![IntegrityIssue::Sha256Mismatch]);
        }
        other => panic!("expected integrity failure, got: {other:?}"),
    }
}

#[test]
fn fallback_strategy_roundtrip() {
    let data = "aaaaaaaaaaaaaaaabbbbbbbbbbbbcccc 2024-01-01 0000000000";
    for level in CompressionLevel::ALL {
        let opts = SealOptions {
            level,
            force_fallback: true,
            ..options(4096)
        };
        let artifact = seal(data, &opts).unwrap();
        assert_eq!(artifact.level, level);
        assert_eq!(open(&artifact, None).unwrap(), data, "level {level}");
    }
}

#[test]
fn recorded_level_wins_over_artifact_level() {
    let data = sales_export(50);
    let mut artifact = seal(
        &data,
        &SealOptions {
            level: CompressionLevel::Balanced,
            ..options(1 << 20)
        },
    )
    .unwrap();
    // The frame tag still says balanced; decompression warns and carries on.
    artifact.level = CompressionLevel::Fast;
    assert_eq!(open(&artifact, None).unwrap(), data);
}

#[test]
fn artifact_survives_disk_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("backup.bvault.json");

    let password = SecretString::from("disk");
    let data = sales_export(200);
    let artifact = seal(&data, &options(100).with_password(password.clone())).unwrap();
    std::fs::write(&path, artifact.to_json().unwrap()).unwrap();

    let restored = BackupArtifact::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored, artifact);
    assert_eq!(open(&restored, Some(&password)).unwrap(), data);
}

#[test]
fn structured_values_roundtrip() {
    let backup = json!({
        "sales": [{"id": 1, "total": 19.5}, {"id": 2, "total": 7.25}],
        "inventory": {"widget": 40},
    });
    let password = SecretString::from("values");
    let artifact = seal_value(&backup, &options(32).with_password(password.clone())).unwrap();

    let restored: serde_json::Value = open_value(&artifact, Some(&password)).unwrap();
    assert_eq!(restored, backup);
}

#[test]
fn empty_backup_roundtrip() {
    let artifact = seal("", &options(16)).unwrap();
    assert_eq!(artifact.checksum.size, 0);
    assert_eq!(open(&artifact, None).unwrap(), "");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_text_roundtrips(
        data in ".{0,400}",
        chunk in 8usize..128,
        fallback in any::<bool>(),
        encrypt in any::<bool>(),
    ) {
        let mut opts = SealOptions {
            force_fallback: fallback,
            kdf: KdfParams { iterations: 10 },
            max_chunk_size: chunk,
            ..SealOptions::default()
        };
        let password = SecretString::from("prop");
        if encrypt {
            opts = opts.with_password(password.clone());
        }

        let artifact = seal(&data, &opts).unwrap();
        let opened = open(&artifact, encrypt.then_some(&password)).unwrap();
        prop_assert_eq!(opened, data);
    }
}
