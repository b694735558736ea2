//! Packing of serialized automata into 16-bit words.
//!
//! Values in `0..=0x7FFF` take one word. Larger values take two: the high
//! half with bit 15 set, then the low half. `-1` is written as `FFFF FFFF`.

use super::error::AtnError;

const SINGLE_WORD_MAX: i32 = 0x7FFF;
const TWO_WORD_FLAG: u16 = 0x8000;

pub fn encode_words(data: &[i32]) -> Result<Vec<u16>, AtnError> {
    let mut words = Vec::with_capacity(data.len());
    for (index, &value) in data.iter().enumerate() {
        match value {
            -1 => words.extend([0xFFFF, 0xFFFF]),
            0..=SINGLE_WORD_MAX => words.push(value as u16),
            // 0x7FFFFFFF would collide with the -1 marker.
            v if v > SINGLE_WORD_MAX && v < i32::MAX => {
                words.push(((v >> 16) as u16) | TWO_WORD_FLAG);
                words.push((v & 0xFFFF) as u16);
            }
            _ => return Err(AtnError::WordOverflow { index, value }),
        }
    }
    Ok(words)
}

pub fn decode_words(words: &[u16]) -> Result<Vec<i32>, AtnError> {
    let mut data = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let high = words[i];
        if high & TWO_WORD_FLAG == 0 {
            data.push(i32::from(high));
            i += 1;
            continue;
        }
        let low = *words.get(i + 1).ok_or(AtnError::TruncatedWords { offset: i })?;
        if high == 0xFFFF && low == 0xFFFF {
            data.push(-1);
        } else {
            data.push((i32::from(high & 0x7FFF) << 16) | i32::from(low));
        }
        i += 2;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn small_values_take_one_word() {
        assert_eq!(encode_words(&[0, 5, 0x7FFF]).unwrap(), vec![0, 5, 0x7FFF]);
    }

    #[test]
    fn large_values_and_minus_one_take_two() {
        let words = encode_words(&[0x8000, -1, 0x12345678]).unwrap();
        assert_eq!(words, vec![0x8000, 0x8000, 0xFFFF, 0xFFFF, 0x9234, 0x5678]);
        assert_eq!(decode_words(&words).unwrap(), vec![0x8000, -1, 0x12345678]);
    }

    #[test]
    fn rejects_unrepresentable_values() {
        assert_eq!(
            encode_words(&[1, -2]),
            Err(AtnError::WordOverflow { index: 1, value: -2 })
        );
        assert!(encode_words(&[i32::MAX]).is_err());
    }

    #[test]
    fn truncated_pair_is_an_error() {
        assert_eq!(
            decode_words(&[3, 0x8001]),
            Err(AtnError::TruncatedWords { offset: 1 })
        );
    }

    proptest! {
        #[test]
        fn packing_is_lossless(values in prop::collection::vec(-1i32..=0x7FFF_FFFE, 0..64)) {
            let words = encode_words(&values).unwrap();
            prop_assert_eq!(decode_words(&words).unwrap(), values);
        }
    }
}
