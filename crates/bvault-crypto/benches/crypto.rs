use bvault_crypto::{decrypt_with, encrypt_with, KdfParams};
use secrecy::SecretString;

fn make_payload(size: usize) -> String {
    (0..size)
        .map(|i| (b'a' + ((i.wrapping_mul(7) ^ (i >> 3)) % 26) as u8) as char)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let password = SecretString::from("bench-password");
    let params = KdfParams { iterations: 1000 };
    let data = make_payload(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt_with(
                divan::black_box(&data),
                divan::black_box(&password),
                &params,
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let password = SecretString::from("bench-password");
    let params = KdfParams { iterations: 1000 };
    let data = make_payload(size);
    let blob = encrypt_with(&data, &password, &params).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decrypt_with(
                divan::black_box(&blob.ciphertext),
                &password,
                &blob.salt,
                &blob.iv,
                &params,
            )
            .unwrap()
        });
}

#[divan::bench]
fn bench_default_kdf() {
    let password = SecretString::from("bench-password");
    bvault_crypto::derive_key(&password, &[7u8; 16], &KdfParams::default()).unwrap();
}

fn main() {
    divan::main();
}
