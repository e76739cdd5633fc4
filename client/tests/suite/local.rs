//! Resolution from a repository rooted in a local directory.

use std::path::Path;

use dmr_client::Client;
use dmr_client::ClientConfig;
use dmr_client::DependencyResolution;
use dmr_client::RepositoryLocation;
use dmr_client::ResolverError;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

fn interface(id: &str, extends: &[&str]) -> Value {
    let mut doc = json!({
        "@context": "dtmi:dtdl:context;2",
        "@id": id,
        "@type": "Interface",
    });
    if !extends.is_empty() {
        doc["extends"] = json!(extends);
    }
    doc
}

fn write_document(root: &Path, repo_path: &str, body: &Value) {
    let file = root.join(repo_path);
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, body.to_string()).unwrap();
}

#[tokio::test]
async fn resolves_a_closure_from_a_directory() {
    let repo = TempDir::new().unwrap();
    write_document(
        repo.path(),
        "dtmi/com/example/a-1.json",
        &interface("dtmi:com:example:A;1", &["dtmi:com:example:B;1"]),
    );
    write_document(
        repo.path(),
        "dtmi/com/example/b-1.json",
        &interface("dtmi:com:example:B;1", &[]),
    );

    let client = Client::new(RepositoryLocation::local(repo.path())).unwrap();
    let models = client.resolve("dtmi:com:example:A;1").await.unwrap();

    assert_eq!(models.len(), 2);
    assert!(models.contains_key("dtmi:com:example:A;1"));
    assert!(models.contains_key("dtmi:com:example:B;1"));
}

#[tokio::test]
async fn expanded_documents_are_read_from_disk() {
    let repo = TempDir::new().unwrap();
    let expanded = json!([
        interface("dtmi:com:example:Root;1", &["dtmi:com:example:Dep;1"]),
        interface("dtmi:com:example:Dep;1", &[]),
    ]);
    write_document(
        repo.path(),
        "metadata.json",
        &json!({ "features": { "expanded": true } }),
    );
    write_document(repo.path(), "dtmi/com/example/root-1.expanded.json", &expanded);

    let config = ClientConfig {
        dependency_resolution: DependencyResolution::TryFromExpanded,
        ..ClientConfig::default()
    };
    let client = Client::with_config(RepositoryLocation::local(repo.path()), config).unwrap();
    let models = client.resolve("dtmi:com:example:Root;1").await.unwrap();

    assert_eq!(models.len(), 1);
    assert_eq!(
        models.get("dtmi:com:example:Root;1").unwrap(),
        &expanded.to_string()
    );
}

#[tokio::test]
async fn missing_file_is_model_not_found() {
    let repo = TempDir::new().unwrap();
    write_document(
        repo.path(),
        "dtmi/com/example/a-1.json",
        &interface("dtmi:com:example:A;1", &["dtmi:com:example:Gone;1"]),
    );

    let client = Client::new(RepositoryLocation::local(repo.path())).unwrap();
    let err = client.resolve("dtmi:com:example:A;1").await.unwrap_err();

    match err {
        ResolverError::ModelNotFound { dtmi, .. } => {
            assert_eq!(dtmi.as_str(), "dtmi:com:example:Gone;1");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn file_uri_locations_resolve_like_paths() {
    let repo = TempDir::new().unwrap();
    write_document(
        repo.path(),
        "dtmi/com/example/a-1.json",
        &interface("dtmi:com:example:A;1", &[]),
    );

    let uri = format!("file://{}", repo.path().display());
    let location: RepositoryLocation = uri.parse().unwrap();
    let client = Client::new(location).unwrap();
    let models = client.resolve("dtmi:com:example:A;1").await.unwrap();

    assert_eq!(models.len(), 1);
}

#[tokio::test]
async fn plain_directory_strings_resolve_like_paths() {
    let repo = TempDir::new().unwrap();
    write_document(
        repo.path(),
        "dtmi/com/example/a-1.json",
        &interface("dtmi:com:example:A;1", &[]),
    );

    let location: RepositoryLocation = repo.path().display().to_string().parse().unwrap();
    assert!(!location.is_remote());
    let client = Client::new(location).unwrap();
    let models = client.resolve("dtmi:com:example:A;1").await.unwrap();

    assert_eq!(models.len(), 1);
}

#[tokio::test]
async fn repeated_resolution_yields_identical_maps() {
    let repo = TempDir::new().unwrap();
    write_document(
        repo.path(),
        "dtmi/com/example/a-1.json",
        &interface("dtmi:com:example:A;1", &["dtmi:com:example:B;1"]),
    );
    write_document(
        repo.path(),
        "dtmi/com/example/b-1.json",
        &interface("dtmi:com:example:B;1", &[]),
    );

    let client = Client::new(RepositoryLocation::local(repo.path())).unwrap();
    let first = client.resolve("dtmi:com:example:A;1").await.unwrap();
    let second = client.resolve("dtmi:com:example:A;1").await.unwrap();

    assert_eq!(first, second);
}
