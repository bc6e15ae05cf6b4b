//! Scenario tests for the employee service against a real SQLite file.

use std::sync::Arc;

use super::employee_service::{EmployeeService, ROLE_REQUIRED, USER_NAME_TAKEN};
use crate::error_handling::types::EmployeeError;
use crate::storage::test_support::seeded;
use crate::storage::types::EmployeeDraft;
use crate::storage::{DatabaseStorage, Storage};

fn draft(name: &str, user_name: &str, password: &str) -> EmployeeDraft {
    EmployeeDraft {
        name: name.into(),
        user_name: user_name.into(),
        password: password.into(),
    }
}

async fn service() -> (Arc<DatabaseStorage>, EmployeeService) {
    let storage = Arc::new(seeded().await);
    let service = EmployeeService::new(storage.clone());
    (storage, service)
}

fn fields(err: EmployeeError) -> Vec<(String, String)> {
    match err {
        EmployeeError::Validation { errors, .. } => {
            errors.into_iter().map(|e| (e.field, e.reason)).collect()
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_keeps_only_existing_roles() {
    let (_storage, service) = service().await;
    let employee = service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1, 3, 99])
        .await
        .unwrap();
    let role_ids: Vec<i32> = employee.roles.iter().map(|r| r.id).collect();
    assert_eq!(role_ids, vec![1, 3]);
    assert_eq!(service.details(employee.id).await.unwrap(), employee);
}

#[tokio::test]
async fn test_create_rejects_invalid_fields_and_taken_user_name() {
    let (_storage, service) = service().await;
    service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1])
        .await
        .unwrap();

    let errors = fields(
        service
            .create(draft("ada", "alovelace", "pw"), &[1])
            .await
            .unwrap_err(),
    );
    let names: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
    assert_eq!(names, vec!["name", "password", "userName"]);
    assert!(errors.contains(&("userName".to_string(), USER_NAME_TAKEN.to_string())));
    assert_eq!(service.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_replaces_roles_wholesale() {
    let (_storage, service) = service().await;
    let created = service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1, 2])
        .await
        .unwrap();

    let edited = service
        .edit(
            created.id,
            created.id,
            draft("Ada King", "aking", "secret2"),
            &[3],
        )
        .await
        .unwrap();
    assert_eq!(edited.name, "Ada King");
    assert_eq!(edited.user_name, "aking");
    let role_ids: Vec<i32> = edited.roles.iter().map(|r| r.id).collect();
    assert_eq!(role_ids, vec![3]);
    assert_eq!(edited.version, created.version + 1);
}

#[tokio::test]
async fn test_edit_collects_role_and_user_name_errors() {
    let (storage, service) = service().await;
    let first = service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1])
        .await
        .unwrap();
    let second = service
        .create(draft("Alan Turing", "aturing", "secret1"), &[2])
        .await
        .unwrap();

    let errors = fields(
        service
            .edit(
                second.id,
                second.id,
                draft("Alan Turing", "alovelace", "secret1"),
                &[42],
            )
            .await
            .unwrap_err(),
    );
    assert_eq!(
        errors,
        vec![
            ("roles".to_string(), ROLE_REQUIRED.to_string()),
            ("userName".to_string(), USER_NAME_TAKEN.to_string()),
        ]
    );
    let unchanged = storage.fetch_employee(second.id).await.unwrap().unwrap();
    assert_eq!(unchanged.user_name, "aturing");
    assert_eq!(unchanged.roles.len(), 1);

    // keeping your own user name is fine
    service
        .edit(
            first.id,
            first.id,
            draft("Ada Lovelace", "alovelace", "secret9"),
            &[1],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_edit_not_found_cases() {
    let (_storage, service) = service().await;
    let created = service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1])
        .await
        .unwrap();

    let mismatch = service
        .edit(
            created.id,
            created.id + 1,
            draft("Ada Lovelace", "alovelace", "secret1"),
            &[1],
        )
        .await
        .unwrap_err();
    assert!(matches!(mismatch, EmployeeError::NotFound(id) if id == created.id));

    let missing = service
        .edit(404, 404, draft("No Body", "nobody", "secret1"), &[1])
        .await
        .unwrap_err();
    assert!(matches!(missing, EmployeeError::NotFound(404)));
}

#[tokio::test]
async fn test_delete_then_missing() {
    let (storage, service) = service().await;
    let created = service
        .create(draft("Ada Lovelace", "alovelace", "secret1"), &[1, 2])
        .await
        .unwrap();
    service.delete(created.id).await.unwrap();
    assert!(storage.fetch_employee(created.id).await.unwrap().is_none());
    assert!(matches!(
        service.delete(created.id).await.unwrap_err(),
        EmployeeError::NotFound(_)
    ));
    assert!(matches!(
        service.details(created.id).await.unwrap_err(),
        EmployeeError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_roles_lists_every_role() {
    let (_storage, service) = service().await;
    let titles: Vec<String> = service
        .roles()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Instructor", "Coordinator", "Chair"]);
}
