//! Property-based tests for ViewerSettings serialization round-trip.
//!
//! These tests verify that ViewerSettings can be serialized to JSON
//! and deserialized back without data loss for arbitrary valid inputs.

use docviewer::types::settings::{
    InteractionSettings, LoggingSettings, ServerSettings, SessionSettings, StreamSettings,
    ViewerSettings,
};
use proptest::prelude::*;

fn arb_server_settings() -> impl Strategy<Value = ServerSettings> {
    ("https?://[a-z]{3,12}(\\.[a-z]{2,5})?(:[0-9]{2,5})?", 1u64..=120_000u64).prop_map(
        |(base_url, request_timeout_ms)| ServerSettings {
            base_url,
            request_timeout_ms,
        },
    )
}

fn arb_viewer_settings() -> impl Strategy<Value = ViewerSettings> {
    (
        arb_server_settings(),
        proptest::option::of("/[a-z0-9/_-]{1,40}\\.db"),
        0u64..=60_000u64,
        0u64..=60_000u64,
        "(trace|debug|info|warn|error)(,docviewer=(trace|debug))?",
    )
        .prop_map(
            |(server, database_path, confirm_timeout_ms, retry_delay_ms, filter)| ViewerSettings {
                server,
                session: SessionSettings { database_path },
                interaction: InteractionSettings { confirm_timeout_ms },
                stream: StreamSettings { retry_delay_ms },
                logging: LoggingSettings { filter },
            },
        )
}

// *For any* valid `ViewerSettings`, serializing to JSON then deserializing
// SHALL produce an equivalent struct.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn settings_serialization_roundtrip(settings in arb_viewer_settings()) {
        let json = serde_json::to_string(&settings)
            .expect("Serialization to JSON should succeed for any valid ViewerSettings");

        let deserialized: ViewerSettings = serde_json::from_str(&json)
            .expect("Deserialization from JSON should succeed for valid JSON");

        prop_assert_eq!(
            deserialized,
            settings,
            "Deserialized ViewerSettings must equal the original"
        );
    }
}
