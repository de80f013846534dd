use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScanError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ScanError::decode("x").to_string().contains("decode error:"));
    assert!(ScanError::surface("x").to_string().contains("surface error:"));
    assert!(ScanError::encode("x").to_string().contains("encode error:"));
    assert!(
        ScanError::delivery("x")
            .to_string()
            .contains("delivery error:")
    );
    assert!(ScanError::storage("x").to_string().contains("storage error:"));
    assert!(
        ScanError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScanError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
