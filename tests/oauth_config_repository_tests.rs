//! Integration tests for OAuthConfigRepository against in-memory SQLite.

use anyhow::Result;
use oauth_config::crypto::{decrypt_client_secret, is_encrypted_payload};
use oauth_config::models::{OAuthConfigEntity, Role, Service, ServiceAppRoleMap};
use oauth_config::record::{AppRoleMapping, FieldVisibility};
use oauth_config::repositories::{OAuthConfigRepository, RepositoryError};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, ModelTrait, Set};
use serde_json::{Map, Value, json};

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{insert_role, insert_service, setup_test_db_arc, test_crypto_key};

fn as_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test payload must be an object"),
    }
}

fn github_config() -> Map<String, Value> {
    as_map(json!({
        "client_id": "abc",
        "client_secret": "xyz",
        "redirect_url": "https://x/cb"
    }))
}

#[tokio::test]
async fn create_and_get_roundtrip() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let role_id = insert_role(&db, "Admin", true).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert("default_role".to_string(), json!(role_id));
    config.insert("icon_class".to_string(), json!("fa-github"));

    let created = repo.create(service_id, &config).await?;
    assert_eq!(created.service_id, service_id);

    let fetched = repo.get(service_id).await?;
    assert_eq!(fetched, created);
    assert_eq!(fetched.client_secret.expose(), "xyz");
    assert_eq!(fetched.default_role, Some(role_id));
    assert_eq!(fetched.icon_class.as_deref(), Some("fa-github"));
    assert!(!fetched.custom_provider);

    let view = fetched.to_view(FieldVisibility::Read);
    assert!(view.client_secret.is_none());
    Ok(())
}

#[tokio::test]
async fn client_secret_is_stored_encrypted() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    repo.create(service_id, &github_config()).await?;

    let row = OAuthConfigEntity::find_by_id(service_id)
        .one(&*db)
        .await?
        .expect("row exists");
    assert!(is_encrypted_payload(&row.client_secret_ciphertext));
    assert!(
        !row.client_secret_ciphertext
            .windows(3)
            .any(|window| window == b"xyz")
    );

    let secret =
        decrypt_client_secret(&test_crypto_key(), service_id, &row.client_secret_ciphertext)?;
    assert_eq!(secret.expose(), "xyz");
    Ok(())
}

#[tokio::test]
async fn ciphertext_moved_to_another_service_fails_to_decrypt() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let first = insert_service(&db, "github").await?;
    let second = insert_service(&db, "google").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    repo.create(first, &github_config()).await?;
    repo.create(second, &github_config()).await?;

    let first_row = OAuthConfigEntity::find_by_id(first)
        .one(&*db)
        .await?
        .expect("row exists");
    let second_row = OAuthConfigEntity::find_by_id(second)
        .one(&*db)
        .await?
        .expect("row exists");

    let mut tampered = second_row.into_active_model();
    tampered.client_secret_ciphertext = Set(first_row.client_secret_ciphertext);
    tampered.update(&*db).await?;

    let result = repo.find_by_service_id(second).await;
    assert!(matches!(result, Err(RepositoryError::Crypto(_))));
    Ok(())
}

#[tokio::test]
async fn create_rejects_missing_required_fields() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let err = repo
        .create(service_id, &as_map(json!({ "client_id": "abc" })))
        .await
        .unwrap_err();
    match err {
        RepositoryError::Validation(validation) => {
            assert_eq!(
                validation.failed_fields(),
                vec!["client_secret", "redirect_url"]
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    assert!(repo.find_by_service_id(service_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn create_twice_is_already_exists() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    repo.create(service_id, &github_config()).await?;
    let err = repo.create(service_id, &github_config()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists { service_id: id } if id == service_id));
    Ok(())
}

#[tokio::test]
async fn create_for_missing_service_is_unknown_service() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let err = repo.create(42, &github_config()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownService { service_id: 42 }));
    Ok(())
}

#[tokio::test]
async fn unknown_default_role_is_a_validation_error() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert("default_role".to_string(), json!(999));

    let err = repo.create(service_id, &config).await.unwrap_err();
    match err {
        RepositoryError::Validation(validation) => {
            assert_eq!(validation.failed_fields(), vec!["default_role"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn update_replaces_values_and_requires_existing_row() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let err = repo.update(service_id, &github_config()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    repo.create(service_id, &github_config()).await?;
    let updated = repo
        .update(
            service_id,
            &as_map(json!({
                "client_id": "abc2",
                "client_secret": "rotated",
                "redirect_url": "https://x/cb2",
                "custom_provider": "true"
            })),
        )
        .await?;
    assert!(updated.custom_provider);

    let fetched = repo.get(service_id).await?;
    assert_eq!(fetched.client_id, "abc2");
    assert_eq!(fetched.client_secret.expose(), "rotated");
    assert_eq!(fetched.redirect_url, "https://x/cb2");
    assert!(fetched.custom_provider);
    Ok(())
}

#[tokio::test]
async fn update_with_partial_payload_is_rejected() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());
    repo.create(service_id, &github_config()).await?;

    let err = repo
        .update(service_id, &as_map(json!({ "icon_class": "fa-github" })))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    assert_eq!(repo.get(service_id).await?.client_id, "abc");
    Ok(())
}

#[tokio::test]
async fn delete_removes_row() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    repo.create(service_id, &github_config()).await?;
    repo.delete_by_service_id(service_id).await?;

    assert!(repo.find_by_service_id(service_id).await?.is_none());
    let err = repo.delete_by_service_id(service_id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn deleting_service_cascades_to_config() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());
    repo.create(service_id, &github_config()).await?;

    let service = Service::find_by_id(service_id)
        .one(&*db)
        .await?
        .expect("service exists");
    service.delete(&*db).await?;

    assert!(repo.find_by_service_id(service_id).await?.is_none());
    Ok(())
}

fn validation_fields(err: RepositoryError) -> Vec<String> {
    match err {
        RepositoryError::Validation(validation) => validation
            .failed_fields()
            .into_iter()
            .map(str::to_string)
            .collect(),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn inactive_default_role_is_a_validation_error() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let retired = insert_role(&db, "Retired", false).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert("default_role".to_string(), json!(retired));

    let err = repo.create(service_id, &config).await.unwrap_err();
    assert_eq!(validation_fields(err), vec!["default_role"]);
    assert!(repo.find_by_service_id(service_id).await?.is_none());

    repo.create(service_id, &github_config()).await?;
    let err = repo.update(service_id, &config).await.unwrap_err();
    assert_eq!(validation_fields(err), vec!["default_role"]);
    assert_eq!(repo.get(service_id).await?.default_role, None);
    Ok(())
}

#[tokio::test]
async fn app_role_map_is_stored_with_the_config() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let admin = insert_role(&db, "Admin", true).await?;
    let user = insert_role(&db, "User", true).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert(
        "app_role_map".to_string(),
        json!([{ "app_id": 9, "role_id": user }, { "app_id": 2, "role_id": admin }]),
    );
    let created = repo.create(service_id, &config).await?;

    let expected = vec![
        AppRoleMapping { app_id: 2, role_id: admin },
        AppRoleMapping { app_id: 9, role_id: user },
    ];
    assert_eq!(created.app_role_map, expected);
    assert_eq!(repo.get(service_id).await?, created);
    assert_eq!(
        repo.get(service_id).await?.to_view(FieldVisibility::Read).app_role_map,
        expected
    );
    Ok(())
}

#[tokio::test]
async fn update_without_app_role_map_keeps_it() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let admin = insert_role(&db, "Admin", true).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert(
        "app_role_map".to_string(),
        json!([{ "app_id": 1, "role_id": admin }]),
    );
    repo.create(service_id, &config).await?;

    let updated = repo.update(service_id, &github_config()).await?;
    assert_eq!(updated.app_role_map.len(), 1);
    assert_eq!(repo.get(service_id).await?.app_role_map.len(), 1);

    config.insert("app_role_map".to_string(), json!([]));
    let cleared = repo.update(service_id, &config).await?;
    assert!(cleared.app_role_map.is_empty());
    assert!(repo.get(service_id).await?.app_role_map.is_empty());
    Ok(())
}

#[tokio::test]
async fn app_role_map_must_name_active_roles() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let retired = insert_role(&db, "Retired", false).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert(
        "app_role_map".to_string(),
        json!([{ "app_id": 1, "role_id": retired }, { "app_id": 2, "role_id": 404 }]),
    );

    match repo.create(service_id, &config).await.unwrap_err() {
        RepositoryError::Validation(validation) => {
            assert_eq!(validation.errors["app_role_map"].len(), 2);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(repo.find_by_service_id(service_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn role_map_goes_away_with_config_and_role() -> Result<()> {
    let db = setup_test_db_arc().await?;
    let admin = insert_role(&db, "Admin", true).await?;
    let user = insert_role(&db, "User", true).await?;
    let service_id = insert_service(&db, "github").await?;
    let repo = OAuthConfigRepository::new(db.clone(), test_crypto_key());

    let mut config = github_config();
    config.insert(
        "app_role_map".to_string(),
        json!([{ "app_id": 1, "role_id": admin }, { "app_id": 2, "role_id": user }]),
    );
    repo.create(service_id, &config).await?;

    let role = Role::find_by_id(user).one(&*db).await?.expect("role exists");
    role.delete(&*db).await?;
    assert_eq!(
        repo.get(service_id).await?.app_role_map,
        vec![AppRoleMapping { app_id: 1, role_id: admin }]
    );

    repo.delete_by_service_id(service_id).await?;
    assert!(ServiceAppRoleMap::find().all(&*db).await?.is_empty());
    Ok(())
}
