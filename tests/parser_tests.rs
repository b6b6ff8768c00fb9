// tests/parser_tests.rs - Line decoding and relevance filtering

use pcclog::input_format::{decode_line, is_relevant, RelevanceFilter, MESSAGE_OFFSET};

#[test]
fn test_decode_device_line() {
    let line = "10-16 12:34:56.789  1234  1301 D NetworkTypeController: [0] Physical channel configs updated: anchorNrCell=5, nrBandwidths=20, nrBands=78, configs=[]";
    let decoded = decode_line(line).unwrap();

    assert_eq!(decoded.date, "10-16");
    assert_eq!(decoded.time, "12:34:56.789");
    // Padding produces empty tokens, so the level and tag land in the message
    assert_eq!(
        decoded.message,
        "D NetworkTypeController: [0] Physical channel configs updated: anchorNrCell=5, nrBandwidths=20, nrBands=78, configs=[]"
    );
}

#[test]
fn test_message_is_rejoined_with_single_spaces() {
    let samples = [
        "a b c d e f g",
        "d t p q r s first second third",
        "2024-01-01 00:00:00 x y z w {mBand=1} {mBand=2}",
    ];

    for line in samples {
        let tokens: Vec<&str> = line.split(' ').collect();
        let decoded = decode_line(line).unwrap();
        assert_eq!(decoded.date, tokens[0]);
        assert_eq!(decoded.time, tokens[1]);
        assert_eq!(decoded.message, tokens[MESSAGE_OFFSET..].join(" "));
    }
}

#[test]
fn test_short_lines_are_dropped() {
    let samples = [
        "",
        "--------- beginning of radio",
        "a b c d e f",
        "10-16 12:34:56.789",
    ];

    for line in samples {
        assert!(decode_line(line).is_none(), "expected '{}' to be dropped", line);
    }
}

#[test]
fn test_filter_after_decode() {
    let relevant = "10-16 12:34:56.789 1234 1301 D Tag: PHYSICAL channel CONFIGS updated: x";
    let irrelevant = "10-16 12:34:56.789 1234 1301 D Tag: onServiceStateChanged";

    assert!(is_relevant(&decode_line(relevant).unwrap().message));
    assert!(!is_relevant(&decode_line(irrelevant).unwrap().message));
}

#[test]
fn test_marker_in_header_columns_is_not_seen() {
    // The marker sits before the message offset, so it is cut away
    let line = "Physical channel configs updated: a b c d";
    let decoded = decode_line(line).unwrap();
    assert_eq!(decoded.message, "c d");
    assert!(!RelevanceFilter::default().matches(&decoded.message));
}
