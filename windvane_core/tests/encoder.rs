use proptest::prelude::*;
use rstest::rstest;
use windvane_core::OutputReading;
use windvane_core::encoder::{checksum, mwv_sentence, sentence_checksum};

fn parse_trailer(sentence: &str) -> u8 {
    let star = sentence.rfind('*').unwrap();
    u8::from_str_radix(&sentence[star + 1..star + 3], 16).unwrap()
}

#[rstest]
#[case(0, 0, "$WIMWV,0.0,R,0.0,N,A*")]
#[case(23, 620, "$WIMWV,23.0,R,6.2,N,A*")]
#[case(359, 4_502, "$WIMWV,359.0,R,45.0,N,A*")]
fn sentence_fields(#[case] dir: u16, #[case] cknots: i32, #[case] prefix: &str) {
    let s = mwv_sentence(
        "WI",
        &OutputReading {
            speed_cknots: cknots,
            direction_deg: dir,
        },
    );
    assert!(s.starts_with(prefix), "{s}");
    assert_eq!(s.len(), prefix.len() + 4);
}

#[test]
fn talker_is_configurable() {
    let s = mwv_sentence("II", &OutputReading::default());
    assert!(s.starts_with("$IIMWV,"));
    assert_eq!(parse_trailer(&s), sentence_checksum(&s).unwrap());
}

#[test]
fn checksum_is_uppercase_two_digit_hex() {
    for dir in 0u16..360 {
        let s = mwv_sentence(
            "WI",
            &OutputReading {
                speed_cknots: 0,
                direction_deg: dir,
            },
        );
        let trailer = &s[s.rfind('*').unwrap() + 1..s.len() - 2];
        assert_eq!(trailer.len(), 2);
        assert!(trailer.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}

proptest! {
    #[test]
    fn checksum_is_xor_between_delimiters(body in "[A-Z0-9,.]{0,60}") {
        let sentence = format!("${body}*00\r\n");
        let expected = body.bytes().fold(0u8, |a, b| a ^ b);
        prop_assert_eq!(sentence_checksum(&sentence), Some(expected));
        prop_assert_eq!(checksum(body.as_bytes()), expected);
    }

    #[test]
    fn emitted_trailer_matches_content(dir in 0u16..360, cknots in 0i32..20_000) {
        let s = mwv_sentence("WI", &OutputReading { speed_cknots: cknots, direction_deg: dir });
        prop_assert!(s.ends_with("\r\n"));
        prop_assert_eq!(Some(parse_trailer(&s)), sentence_checksum(&s));
    }
}
