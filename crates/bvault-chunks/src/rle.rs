//! Run-length token codec for the compression fallback
//!
//! A run of one character becomes `<count><char>` where `count` is a single
//! ASCII digit (1-9). Runs longer than the level's threshold are tokenized;
//! shorter runs pass through literally. Any digit in the input is always
//! tokenized, since the decoder reads every digit as a run length.
//!
//! Runs longer than 9 are emitted as several tokens. Payloads written by the
//! older encoder (single token capped at 9, literal digits) still decode with
//! the same rules.

use bvault_core::{BvaultError, BvaultResult, CompressionLevel};

/// Longest run a single token can carry
pub const MAX_TOKEN_RUN: usize = 9;

/// Runs strictly longer than this are tokenized.
pub fn run_threshold(level: CompressionLevel) -> usize {
    match level {
        CompressionLevel::Maximum => 2,
        CompressionLevel::Fast | CompressionLevel::Balanced => 3,
    }
}

pub fn encode(input: &str, level: CompressionLevel) -> String {
    let threshold = run_threshold(level);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }

        let digit = c.is_ascii_digit();
        if !digit && run <= threshold {
            out.extend(std::iter::repeat(c).take(run));
            continue;
        }

        while run > 0 {
            let take = run.min(MAX_TOKEN_RUN);
            if !digit && take <= threshold {
                out.extend(std::iter::repeat(c).take(take));
            } else {
                push_token(&mut out, take, c);
            }
            run -= take;
        }
    }

    out
}

pub fn decode(input: &str) -> BvaultResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            out.push(c);
            continue;
        }
        let count = (c as u8 - b'0') as usize;
        let repeated = chars.next().ok_or_else(|| {
            BvaultError::Decompression("run-length token is missing its character".into())
        })?;
        out.extend(std::iter::repeat(repeated).take(count));
    }

    Ok(out)
}

fn push_token(out: &mut String, count: usize, c: char) {
    debug_assert!((1..=MAX_TOKEN_RUN).contains(&count));
    out.push(char::from(b'0' + count as u8));
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_runs_pass_through() {
        assert_eq!(encode("aabbbc", CompressionLevel::Balanced), "aabbbc");
    }

    #[test]
    fn long_runs_become_tokens() {
        assert_eq!(encode("aaaab", CompressionLevel::Balanced), "4ab");
        assert_eq!(encode("xxxxxxx", CompressionLevel::Fast), "7x");
    }

    #[test]
    fn maximum_level_lowers_threshold() {
        assert_eq!(encode("aaab", CompressionLevel::Balanced), "aaab");
        assert_eq!(encode("aaab", CompressionLevel::Maximum), "3ab");
    }

    #[test]
    fn runs_longer_than_nine_are_split() {
        let input = "z".repeat(23);
        let encoded = encode(&input, CompressionLevel::Balanced);
        assert_eq!(encoded, "9z9z5z");
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn short_remainder_stays_literal() {
        assert_eq!(encode(&"q".repeat(11), CompressionLevel::Balanced), "9qqq");
    }

    #[test]
    fn digits_are_always_tokenized() {
        assert_eq!(encode("a1b22", CompressionLevel::Balanced), "a11b22");
        assert_eq!(decode("a11b22").unwrap(), "a1b22");
    }

    #[test]
    fn legacy_payload_decodes() {
        // Written by the older encoder: single capped token, plain text around it.
        assert_eq!(decode("ab9-cd").unwrap(), "ab---------cd");
    }

    #[test]
    fn dangling_token_is_an_error() {
        assert!(matches!(decode("abc7"), Err(BvaultError::Decompression(_))));
    }

    #[test]
    fn non_ascii_runs() {
        let input = "ééééé🙂🙂🙂🙂";
        let encoded = encode(input, CompressionLevel::Balanced);
        assert_eq!(encoded, "5é4🙂");
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    proptest! {
        #[test]
        fn roundtrip_any_text(data in "[a-c0-9 é]{0,200}", level in 0usize..3) {
            let level = CompressionLevel::ALL[level];
            let encoded = encode(&data, level);
            prop_assert_eq!(decode(&encoded).unwrap(), data);
        }

        #[test]
        fn roundtrip_arbitrary_unicode(data in ".{0,128}") {
            let encoded = encode(&data, CompressionLevel::Maximum);
            prop_assert_eq!(decode(&encoded).unwrap(), data);
        }
    }
}
