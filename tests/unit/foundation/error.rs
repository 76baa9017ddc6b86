use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CutoutError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CutoutError::decode("x").to_string().contains("decode error:"));
    assert!(
        CutoutError::mask_export("x")
            .to_string()
            .contains("mask export failed:")
    );
    assert!(
        CutoutError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(CutoutError::http(502, "bad gateway").to_string().contains("502"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CutoutError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn payload_too_large_matches_status_and_body_text() {
    assert!(CutoutError::http(413, "").is_payload_too_large());
    assert!(CutoutError::http(500, "Request Entity Too Large").is_payload_too_large());
    assert!(CutoutError::http(502, "proxy: entity too large").is_payload_too_large());
    assert!(!CutoutError::http(500, "internal error").is_payload_too_large());
    assert!(!CutoutError::network("entity too large").is_payload_too_large());
}

#[test]
fn no_source_message_asks_for_upload() {
    assert!(CutoutError::NoSource.to_string().contains("Upload"));
}
