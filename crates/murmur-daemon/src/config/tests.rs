#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_defaults_cover_the_full_surface() {
        let config = Config::default();
        assert_eq!(config.api.base_url, default_base_url());
        assert_eq!(config.api.mode, SourceMode::Live);
        assert_eq!(config.store.host, "localhost");
        assert_eq!(config.store.port, 6334);
        assert_eq!(config.store.collection, "meeting_transcripts");
        assert_eq!(config.store.embedding_dim, 384);
        assert!((config.pipeline.poll_interval_secs - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            meeting_id = "abc-defg-hij"
            mode = "mock"

            [store]
            host = "qdrant.internal"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.meeting_id.as_deref(), Some("abc-defg-hij"));
        assert_eq!(config.api.mode, SourceMode::Mock);
        assert_eq!(config.api.base_url, default_base_url());
        assert_eq!(config.store.host, "qdrant.internal");
        assert_eq!(config.store.port, 6334);
    }

    #[test]
    fn test_live_mode_requires_credentials() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(config.meeting_id().is_err());

        let mut config = Config::default();
        config.api.api_key = Some("key".to_string());
        config.api.meeting_id = Some("meet".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.meeting_id().unwrap(), "meet");
    }

    #[test]
    fn test_mock_mode_needs_no_credentials() {
        let mut config = Config::default();
        config.api.mode = SourceMode::Mock;
        assert!(config.validate().is_ok());
        assert_eq!(config.meeting_id().unwrap(), "mock-meeting-001");
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let mut config = Config::default();
        config.api.mode = SourceMode::Mock;
        config.pipeline.poll_interval_secs = 0.0;
        assert!(config.validate().is_err());
    }
}
