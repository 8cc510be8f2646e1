use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CardError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        CardError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        CardError::mask_parse("x")
            .to_string()
            .contains("mask parse error:")
    );
    assert!(
        CardError::payload("x")
            .to_string()
            .contains("payload error:")
    );
    let fetch = CardError::fetch("https://cdn/bg.png", FetchFailure::Status(404), "missing");
    assert_eq!(
        fetch.to_string(),
        "fetch error (status 404) for 'https://cdn/bg.png': missing"
    );
}

#[test]
fn transient_fetch_failures_are_retryable() {
    for failure in [
        FetchFailure::Timeout,
        FetchFailure::Unreachable,
        FetchFailure::Status(503),
        FetchFailure::Status(429),
    ] {
        let err = CardError::fetch("u", failure, "r");
        assert_eq!(err.class(), ErrorClass::Transient, "{failure}");
        assert!(err.is_retryable());
    }
}

#[test]
fn input_problems_are_not_retryable() {
    let cases = [
        CardError::fetch("u", FetchFailure::NotFound, "r"),
        CardError::fetch("u", FetchFailure::Status(403), "r"),
        CardError::decode("corrupt"),
        CardError::geometry("nan"),
        CardError::mask_parse("bad path"),
        CardError::payload("bad json"),
    ];
    for err in cases {
        assert_eq!(err.class(), ErrorClass::Input, "{err}");
        assert!(!err.is_retryable());
    }
    assert_eq!(CardError::Cancelled.class(), ErrorClass::Internal);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CardError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
