//! Tests for db::factory and db::repo_config - repository creation and configuration.

mod support;

use std::io::Write;
use std::str::FromStr;

use brokerdesk::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use brokerdesk::db::{RepositoryConfig, RepositoryError};

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_repository_type_from_str() {
    assert_eq!(RepositoryType::from_str("rest").unwrap(), RepositoryType::Rest);
    assert_eq!(RepositoryType::from_str("REMOTE").unwrap(), RepositoryType::Rest);
    assert_eq!(RepositoryType::from_str("memory").unwrap(), RepositoryType::Local);

    let err = RepositoryType::from_str("postgres").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[("REPOSITORY_TYPE", None), ("BACKEND_URL", None)],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_backend_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("BACKEND_URL", Some("https://xyz.example.co")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Rest),
    );
}

#[test]
fn test_repository_type_from_env_explicit_wins() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("BACKEND_URL", Some("https://xyz.example.co")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("bogus"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local)
    });
}

#[cfg(feature = "local-repo")]
#[tokio::test]
async fn test_create_local_via_factory() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None).unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(feature = "rest-repo")]
#[test]
fn test_create_rest_without_config_fails() {
    let err = RepositoryFactory::create(RepositoryType::Rest, None).err().unwrap();
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
}

#[cfg(feature = "rest-repo")]
#[test]
fn test_rest_from_env_requires_anon_key() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("rest")),
            ("BACKEND_URL", Some("https://xyz.example.co")),
            ("BACKEND_ANON_KEY", None),
        ],
        || {
            let err = RepositoryFactory::from_env().err().unwrap();
            assert!(err.to_string().contains("BACKEND_ANON_KEY"));
        },
    );
}

#[cfg(feature = "local-repo")]
#[tokio::test]
async fn test_builder_from_local_config_file() {
    let file = config_file("[repository]\ntype = \"local\"\n");
    let repo = RepositoryBuilder::new()
        .from_config_file(file.path())
        .unwrap()
        .build()
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(feature = "rest-repo")]
#[test]
fn test_rest_config_file_with_env_override() {
    let file = config_file(
        r#"
[repository]
type = "rest"

[rest]
url = "https://file.example.co"
anon_key = "file-key"
timeout_secs = 5
"#,
    );
    support::with_scoped_env(
        &[
            ("BACKEND_URL", Some("https://env.example.co")),
            ("BACKEND_ANON_KEY", None),
            ("BACKEND_ACCESS_TOKEN", None),
            ("BACKEND_TIMEOUT_SECS", None),
        ],
        || {
            let config = RepositoryConfig::from_file(file.path()).unwrap();
            let rest = config.to_rest_config().unwrap().unwrap();
            assert_eq!(rest.url, "https://env.example.co");
            assert_eq!(rest.anon_key, "file-key");
            assert_eq!(rest.timeout_secs, 5);
        },
    );
}

#[cfg(feature = "rest-repo")]
#[test]
fn test_rest_config_file_missing_key_is_rejected() {
    let file = config_file("[repository]\ntype = \"rest\"\n\n[rest]\nurl = \"https://x.example.co\"\n");
    support::with_scoped_env(&[("BACKEND_ANON_KEY", None)], || {
        let config = RepositoryConfig::from_file(file.path()).unwrap();
        let err = config.to_rest_config().unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    });
}

#[test]
fn test_config_file_errors() {
    let missing = RepositoryConfig::from_file("/nonexistent/repository.toml").unwrap_err();
    assert!(missing.to_string().contains("Failed to read config file"));

    let garbage = config_file("repository = [");
    let err = RepositoryConfig::from_file(garbage.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));

    let unknown = config_file("[repository]\ntype = \"oracle\"\n");
    let config = RepositoryConfig::from_file(unknown.path()).unwrap();
    assert!(config.repository_type().is_err());
}
