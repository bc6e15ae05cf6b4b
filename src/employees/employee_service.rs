use std::sync::Arc;

use log::{debug, info, warn};

use crate::error_handling::types::{EmployeeError, FieldError, StorageError};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{CommitOutcome, Employee, EmployeeDraft, Role};
use crate::validation::validate;

pub const ROLE_REQUIRED: &str = "You must select at least one role!";
pub const USER_NAME_TAKEN: &str = "This username has been used by another employee!";

fn field_error(field: &str, reason: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Employee CRUD with role assignment through the join table.
pub struct EmployeeService {
    storage: Arc<dyn Storage>,
}

impl EmployeeService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, EmployeeError> {
        Ok(self.storage.list_employees().await?)
    }

    pub async fn details(&self, id: i32) -> Result<Employee, EmployeeError> {
        self.storage
            .fetch_employee(id)
            .await?
            .ok_or(EmployeeError::NotFound(id))
    }

    pub async fn roles(&self) -> Result<Vec<Role>, EmployeeError> {
        Ok(self.storage.list_roles().await?)
    }

    /// Create an employee holding whichever of `selected_roles` exist.
    pub async fn create(
        &self,
        draft: EmployeeDraft,
        selected_roles: &[i32],
    ) -> Result<Employee, EmployeeError> {
        let mut errors = validate(&draft);
        if self.storage.user_name_taken(&draft.user_name, None).await? {
            errors.push(field_error("userName", USER_NAME_TAKEN));
        }
        if !errors.is_empty() {
            return Err(EmployeeError::Validation { draft, errors });
        }

        let role_ids = self.resolve_roles(selected_roles).await?;
        match self.storage.insert_employee(&draft, &role_ids).await {
            Ok(employee) => {
                info!(
                    "Created employee {} ({}) with {} role(s)",
                    employee.id,
                    employee.user_name,
                    employee.roles.len()
                );
                Ok(employee)
            }
            Err(StorageError::UniqueViolation(_)) => Err(EmployeeError::Validation {
                draft,
                errors: vec![field_error("userName", USER_NAME_TAKEN)],
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite employee `route_id` and replace its roles wholesale.
    pub async fn edit(
        &self,
        route_id: i32,
        body_id: i32,
        draft: EmployeeDraft,
        selected_roles: &[i32],
    ) -> Result<Employee, EmployeeError> {
        if route_id != body_id {
            warn!("Edit of employee {} carried id {}", route_id, body_id);
            return Err(EmployeeError::NotFound(route_id));
        }

        let role_ids = self.resolve_roles(selected_roles).await?;
        let mut errors = Vec::new();
        if role_ids.is_empty() {
            errors.push(field_error("roles", ROLE_REQUIRED));
        }
        if self
            .storage
            .user_name_taken(&draft.user_name, Some(route_id))
            .await?
        {
            errors.push(field_error("userName", USER_NAME_TAKEN));
        }
        errors.extend(validate(&draft));
        if !errors.is_empty() {
            return Err(EmployeeError::Validation { draft, errors });
        }

        let current = self.details(route_id).await?;
        let outcome = match self
            .storage
            .update_employee(route_id, current.version, &draft, &role_ids)
            .await
        {
            Ok(outcome) => outcome,
            Err(StorageError::UniqueViolation(_)) => {
                return Err(EmployeeError::Validation {
                    draft,
                    errors: vec![field_error("userName", USER_NAME_TAKEN)],
                })
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            CommitOutcome::Committed { .. } => {
                info!(
                    "Updated employee {} with {} role(s)",
                    route_id,
                    role_ids.len()
                );
                self.details(route_id).await
            }
            CommitOutcome::Conflict { .. } => match self.storage.fetch_employee(route_id).await? {
                Some(_) => Err(EmployeeError::Concurrency(route_id)),
                None => Err(EmployeeError::NotFound(route_id)),
            },
        }
    }

    pub async fn delete(&self, id: i32) -> Result<(), EmployeeError> {
        if self.storage.delete_employee(id).await? {
            info!("Deleted employee {}", id);
            Ok(())
        } else {
            Err(EmployeeError::NotFound(id))
        }
    }

    async fn resolve_roles(&self, selected: &[i32]) -> Result<Vec<i32>, EmployeeError> {
        let roles = self.storage.fetch_roles(selected).await?;
        if roles.len() < selected.len() {
            debug!(
                "Ignoring {} unknown role id(s)",
                selected.len() - roles.len()
            );
        }
        Ok(roles.into_iter().map(|r| r.id).collect())
    }
}
