use super::*;

// Env-driven tests share process globals; each test clears before and after.

/// # Safety
/// Tests that touch these vars must not interleave with each other.
unsafe fn clear_server_env() {
    unsafe {
        std::env::remove_var("PORT");
        std::env::remove_var("BACKEND_API_URL");
        std::env::remove_var("DEFAULT_LOCALE");
        std::env::remove_var("COOKIE_SECURE");
        std::env::remove_var("BACKEND_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("BACKEND_CONNECT_TIMEOUT_SECS");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe { clear_server_env() };

    let cfg = ServerConfig::from_env().unwrap();
    assert_eq!(cfg, ServerConfig::default());
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_server_env();
        std::env::set_var("PORT", "8081");
        std::env::set_var("BACKEND_API_URL", "https://api.example.vn/v1/");
        std::env::set_var("DEFAULT_LOCALE", "en");
        std::env::set_var("BACKEND_REQUEST_TIMEOUT_SECS", "12");
        std::env::set_var("BACKEND_CONNECT_TIMEOUT_SECS", "3");
    }

    let cfg = ServerConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8081);
    assert_eq!(cfg.backend_url, "https://api.example.vn/v1");
    assert_eq!(cfg.default_locale, Locale::En);
    assert!(cfg.cookie_secure, "https backend implies secure cookies");
    assert_eq!(cfg.request_timeout_secs, 12);
    assert_eq!(cfg.connect_timeout_secs, 3);

    unsafe { clear_server_env() };
}

#[test]
fn explicit_cookie_secure_wins_over_inference() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_server_env();
        std::env::set_var("BACKEND_API_URL", "https://api.example.vn");
        std::env::set_var("COOKIE_SECURE", "off");
    }

    let cfg = ServerConfig::from_env().unwrap();
    assert!(!cfg.cookie_secure);

    unsafe { clear_server_env() };
}

#[test]
fn from_env_rejects_bad_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_server_env();
        std::env::set_var("PORT", "eighty");
    }
    assert_eq!(
        ServerConfig::from_env(),
        Err(ConfigError::Invalid { var: "PORT", value: "eighty".into() })
    );

    unsafe {
        clear_server_env();
        std::env::set_var("DEFAULT_LOCALE", "fr");
    }
    assert!(matches!(ServerConfig::from_env(), Err(ConfigError::Invalid { var: "DEFAULT_LOCALE", .. })));

    unsafe {
        clear_server_env();
        std::env::set_var("BACKEND_API_URL", "ftp://files");
    }
    assert!(matches!(ServerConfig::from_env(), Err(ConfigError::Invalid { var: "BACKEND_API_URL", .. })));

    unsafe { clear_server_env() };
}

// =============================================================================
// env_bool — unique names avoid races with the tests above.
// =============================================================================

#[test]
fn env_bool_variants() {
    for (i, (val, expected)) in [("1", true), ("yes", true), ("On", true), ("0", false), ("FALSE", false), (" no ", false)]
        .iter()
        .enumerate()
    {
        let key = format!("__TEST_SF_EB_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(*expected), "value {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_or_unset_is_none() {
    let key = "__TEST_SF_EB_INVALID__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
    assert_eq!(env_bool("__TEST_SF_EB_SURELY_UNSET__"), None);
}
