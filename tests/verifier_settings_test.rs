use std::env;
use std::fs;

use certchain::chain::{create_certificate, ChainValidator, ChainVerifier, VerifyError};
use certchain::config::{load_settings, ConfigError, Settings};
use certchain::document::BaseDocument;
use certchain::modules::crypto::public_key_to_pem;
use certchain::KeyPair;

const VARS: [&str; 5] = [
    "CERTCHAIN_RANK_CEILING",
    "CERTCHAIN_MAX_CHAIN_DEPTH",
    "CERTCHAIN_REQUIRE_ISSUER_LINKAGE",
    "CERTCHAIN_TRUSTED_ROOTS_PATH",
    "CERTCHAIN_DEFAULT_TTL",
];

// Environment is process-global, so every case lives in one test.
#[test]
fn test_verifier_settings_from_environment() {
    // Save original environment variables
    let originals: Vec<(&str, Option<String>)> =
        VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
    for name in VARS {
        env::remove_var(name);
    }

    // Defaults
    let settings = load_settings().unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.verifier.max_chain_depth, None);

    // Overrides
    env::set_var("CERTCHAIN_RANK_CEILING", "1000");
    env::set_var("CERTCHAIN_MAX_CHAIN_DEPTH", "4");
    env::set_var("CERTCHAIN_REQUIRE_ISSUER_LINKAGE", "true");
    env::set_var("CERTCHAIN_DEFAULT_TTL", "120");
    let settings = load_settings().unwrap();
    assert_eq!(settings.verifier.rank_ceiling, 1000);
    assert_eq!(settings.verifier.max_chain_depth, Some(4));
    assert!(settings.verifier.require_issuer_linkage);
    assert_eq!(settings.issuance.default_ttl_seconds, 120);

    // Invalid value
    env::set_var("CERTCHAIN_MAX_CHAIN_DEPTH", "-1");
    assert!(matches!(
        load_settings(),
        Err(ConfigError::InvalidValue { .. })
    ));
    env::remove_var("CERTCHAIN_MAX_CHAIN_DEPTH");

    // Trusted roots bundle
    let root = KeyPair::generate();
    let other = KeyPair::generate();
    let bundle_path = env::temp_dir().join(format!("certchain-roots-{}.pem", std::process::id()));
    fs::write(&bundle_path, public_key_to_pem(&root.public_key())).unwrap();
    env::set_var("CERTCHAIN_TRUSTED_ROOTS_PATH", &bundle_path);
    let settings = load_settings().unwrap();
    assert_eq!(settings.verifier.trusted_roots, vec![root.public_key()]);

    let validator = ChainValidator::new(settings.verifier);
    let trusted = create_certificate(&root, &other, 1, ["base"], 60, None).unwrap();
    let document = BaseDocument::new().with_certificate(&trusted).unwrap();
    assert!(validator.verify(&document).is_ok());

    let untrusted = create_certificate(&other, &root, 1, ["base"], 60, None).unwrap();
    let document = BaseDocument::new().with_certificate(&untrusted).unwrap();
    assert!(matches!(
        validator.verify(&document),
        Err(VerifyError::UntrustedRoot { .. })
    ));

    // Empty bundle
    fs::write(&bundle_path, "").unwrap();
    assert!(matches!(
        load_settings(),
        Err(ConfigError::TrustedRoots { .. })
    ));
    fs::remove_file(&bundle_path).unwrap();

    // Restore original environment variables
    for (name, value) in originals {
        match value {
            Some(value) => env::set_var(name, value),
            None => env::remove_var(name),
        }
    }
}
