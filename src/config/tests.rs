use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.public_port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        public_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.public_addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn cache_defaults_keep_module_windows() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert!(settings.cache.default_ttl.is_none());
    assert!(settings.cache.ttl_overrides.is_empty());
    assert_eq!(settings.cache.loader_timeout, Duration::from_secs(3));
    assert!(settings.database.url.is_none());
}

#[test]
fn default_settings_match_default_cache_config() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    let config = crate::cache::CacheConfig::from(&settings.cache);

    assert_eq!(
        config.loader_timeout,
        crate::cache::CacheConfig::default().loader_timeout
    );
}

#[test]
fn per_module_ttls_are_parsed() {
    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(120);
    raw.cache.ttl_seconds.insert("water_today".into(), 30);
    raw.cache.ttl_seconds.insert("services".into(), 3600);

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.default_ttl, Some(Duration::from_secs(120)));
    assert_eq!(
        settings.cache.ttl_overrides.get(&Module::WaterToday),
        Some(&Duration::from_secs(30))
    );
    assert_eq!(
        settings.cache.ttl_overrides.get(&Module::Services),
        Some(&Duration::from_secs(3600))
    );
}

#[test]
fn unknown_module_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds.insert("weather".into(), 30);

    let err = Settings::from_raw(raw).expect_err("unknown module");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        }
    ));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.ttl_seconds.insert("faq".into(), 0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.cache.default_ttl_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn cache_can_be_disabled_via_cli() {
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        cache_enabled: Some(false),
        cache_loader_timeout_ms: Some(250),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.cache.enabled);
    assert_eq!(settings.cache.loader_timeout, Duration::from_millis(250));
}

#[test]
fn blank_database_url_means_no_database() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".into());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn shared_listener_address_is_rejected() {
    let mut raw = RawSettings::default();
    raw.server.public_port = Some(3000);
    raw.server.admin_port = Some(3000);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["portico"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "portico",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_purge_arguments() {
    let args = CliArgs::parse_from([
        "portico",
        "purge",
        "--database-url",
        "postgres://example",
        "services",
        "social_links",
        "services",
    ]);

    match args.command.expect("purge command") {
        Command::Purge(purge) => {
            assert_eq!(
                purge.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(
                purge.selected_modules().expect("known modules"),
                vec![Module::Services, Module::SocialLinks]
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn purge_all_selects_every_module() {
    let args = CliArgs::parse_from(["portico", "purge", "--all"]);
    match args.command.expect("purge command") {
        Command::Purge(purge) => {
            assert_eq!(purge.selected_modules().expect("all"), Module::ALL.to_vec());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn purge_rejects_unknown_module() {
    let args = CliArgs::parse_from(["portico", "purge", "weather"]);
    match args.command.expect("purge command") {
        Command::Purge(purge) => assert!(purge.selected_modules().is_err()),
        _ => panic!("wrong command parsed"),
    }
}
