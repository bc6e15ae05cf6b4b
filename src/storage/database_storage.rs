use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    Schema, Set, SqlErr, TransactionTrait,
};

use crate::error_handling::types::StorageError;
use crate::storage::db_entities::{
    academic_records, courses, employee_roles, employees, roles, students,
};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{
    AcademicRecord, AcademicRecordEdit, CommitOutcome, Course, Employee, EmployeeDraft,
    RecordKey, Role, Student, UpdateBatch,
};

fn read_failed(context: &str, err: DbErr) -> StorageError {
    error!("{}: {}", context, err);
    StorageError::ReadFailed
}

fn write_failed(context: &str, err: DbErr) -> StorageError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        warn!("{}: unique constraint violated: {}", context, detail);
        return StorageError::UniqueViolation(detail);
    }
    error!("{}: {}", context, err);
    StorageError::WriteFailed
}

fn to_student(model: students::Model) -> Student {
    Student {
        id: model.id,
        name: model.name,
    }
}

fn to_course(model: courses::Model) -> Course {
    Course {
        code: model.code,
        title: model.title,
    }
}

fn to_role(model: roles::Model) -> Role {
    Role {
        id: model.id,
        title: model.title,
    }
}

fn to_employee(model: employees::Model, roles: Vec<Role>) -> Employee {
    Employee {
        id: model.id,
        name: model.name,
        user_name: model.user_name,
        password: model.password,
        roles,
        version: model.version,
    }
}

/// Attach the student and course rows a record points at.
fn attach(
    row: academic_records::Model,
    students: &HashMap<String, Student>,
    courses: &HashMap<String, Course>,
) -> Result<AcademicRecord, StorageError> {
    let student = students.get(&row.student_id).cloned().ok_or_else(|| {
        error!("Record {}/{} references a missing student", row.student_id, row.course_code);
        StorageError::ReadFailed
    })?;
    let course = courses.get(&row.course_code).cloned().ok_or_else(|| {
        error!("Record {}/{} references a missing course", row.student_id, row.course_code);
        StorageError::ReadFailed
    })?;
    Ok(AcademicRecord {
        student,
        course,
        grade: row.grade,
        version: row.version,
    })
}

async fn load_records<C: ConnectionTrait>(conn: &C) -> Result<Vec<AcademicRecord>, StorageError> {
    let rows = academic_records::Entity::find()
        .order_by_asc(academic_records::Column::StudentId)
        .order_by_asc(academic_records::Column::CourseCode)
        .all(conn)
        .await
        .map_err(|e| read_failed("Failed to load academic records", e))?;
    let students: HashMap<String, Student> = students::Entity::find()
        .all(conn)
        .await
        .map_err(|e| read_failed("Failed to load students", e))?
        .into_iter()
        .map(|m| (m.id.clone(), to_student(m)))
        .collect();
    let courses: HashMap<String, Course> = courses::Entity::find()
        .all(conn)
        .await
        .map_err(|e| read_failed("Failed to load courses", e))?
        .into_iter()
        .map(|m| (m.code.clone(), to_course(m)))
        .collect();

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(attach(row, &students, &courses)?);
    }
    debug!("Loaded {} academic records", out.len());
    Ok(out)
}

async fn insert_role_links<C: ConnectionTrait>(
    conn: &C,
    employee_id: i32,
    role_ids: &[i32],
) -> Result<(), StorageError> {
    // duplicates would collide on the join table's primary key
    let unique: BTreeSet<i32> = role_ids.iter().copied().collect();
    for role_id in unique {
        employee_roles::ActiveModel {
            employee_id: Set(employee_id),
            role_id: Set(role_id),
        }
        .insert(conn)
        .await
        .map_err(|e| write_failed("Failed to link employee role", e))?;
    }
    Ok(())
}

/// SeaORM-backed storage over SQLite.
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    /// Connect to `url` and create any missing tables.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let mut opts = ConnectOptions::new(url.to_owned());
        opts.max_connections(5).sqlx_logging(false);
        let db = Database::connect(opts).await.map_err(|e| {
            error!("Failed to connect to {}: {}", url, e);
            StorageError::ConnectionFailed
        })?;
        let storage = Self { db };
        storage.create_schema().await?;
        info!("DatabaseStorage ready at {}", url);
        Ok(storage)
    }

    /// Create or open an SQLite database file at `path`.
    pub async fn new_file<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create database dir {}: {}", parent.display(), e);
                StorageError::WriteFailed
            })?;
        }
        Self::connect(&format!("sqlite://{}?mode=rwc", path_ref.display())).await
    }

    async fn create_schema(&self) -> Result<(), StorageError> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        // parents before children so foreign keys resolve
        let mut statements = vec![
            schema.create_table_from_entity(students::Entity),
            schema.create_table_from_entity(courses::Entity),
            schema.create_table_from_entity(academic_records::Entity),
            schema.create_table_from_entity(roles::Entity),
            schema.create_table_from_entity(employees::Entity),
            schema.create_table_from_entity(employee_roles::Entity),
        ];
        for stmt in statements.iter_mut() {
            stmt.if_not_exists();
            self.db
                .execute(backend.build(&*stmt))
                .await
                .map_err(|e| write_failed("Failed to create schema", e))?;
        }
        Ok(())
    }

    /// Insert a student unless one with the same id exists. Returns whether a row was added.
    pub async fn seed_student(&self, student: &Student) -> Result<bool, StorageError> {
        let inserted = students::Entity::insert(students::ActiveModel {
            id: Set(student.id.clone()),
            name: Set(student.name.clone()),
        })
        .on_conflict(OnConflict::column(students::Column::Id).do_nothing().to_owned())
        .exec_without_returning(&self.db)
        .await
        .map_err(|e| write_failed("Failed to seed student", e))?;
        Ok(inserted > 0)
    }

    /// Insert a course unless one with the same code exists. Returns whether a row was added.
    pub async fn seed_course(&self, course: &Course) -> Result<bool, StorageError> {
        let inserted = courses::Entity::insert(courses::ActiveModel {
            code: Set(course.code.clone()),
            title: Set(course.title.clone()),
        })
        .on_conflict(OnConflict::column(courses::Column::Code).do_nothing().to_owned())
        .exec_without_returning(&self.db)
        .await
        .map_err(|e| write_failed("Failed to seed course", e))?;
        Ok(inserted > 0)
    }

    /// Insert a role unless one with the same id exists. Returns whether a row was added.
    pub async fn seed_role(&self, role: &Role) -> Result<bool, StorageError> {
        let inserted = roles::Entity::insert(roles::ActiveModel {
            id: Set(role.id),
            title: Set(role.title.clone()),
        })
        .on_conflict(OnConflict::column(roles::Column::Id).do_nothing().to_owned())
        .exec_without_returning(&self.db)
        .await
        .map_err(|e| write_failed("Failed to seed role", e))?;
        Ok(inserted > 0)
    }

    async fn roles_for(&self, employee_id: i32) -> Result<Vec<Role>, StorageError> {
        let ids: Vec<i32> = employee_roles::Entity::find()
            .filter(employee_roles::Column::EmployeeId.eq(employee_id))
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load employee roles", e))?
            .into_iter()
            .map(|link| link.role_id)
            .collect();
        self.fetch_roles(&ids).await
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn fetch_all_records(&self) -> Result<Vec<AcademicRecord>, StorageError> {
        load_records(&self.db).await
    }

    async fn fetch_record(&self, key: &RecordKey) -> Result<Option<AcademicRecord>, StorageError> {
        let row = academic_records::Entity::find_by_id((
            key.student_id.clone(),
            key.course_code.clone(),
        ))
        .one(&self.db)
        .await
        .map_err(|e| read_failed("Failed to load academic record", e))?;
        let Some(row) = row else {
            debug!("Academic record {} not found", key);
            return Ok(None);
        };
        let student = students::Entity::find_by_id(row.student_id.clone())
            .one(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load student", e))?
            .map(to_student);
        let course = courses::Entity::find_by_id(row.course_code.clone())
            .one(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load course", e))?
            .map(to_course);
        let students: HashMap<String, Student> =
            student.into_iter().map(|s| (s.id.clone(), s)).collect();
        let courses: HashMap<String, Course> =
            course.into_iter().map(|c| (c.code.clone(), c)).collect();
        attach(row, &students, &courses).map(Some)
    }

    async fn fetch_snapshot(&self) -> Result<Vec<AcademicRecord>, StorageError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| read_failed("Failed to open snapshot transaction", e))?;
        let records = load_records(&txn).await?;
        txn.commit()
            .await
            .map_err(|e| read_failed("Failed to close snapshot transaction", e))?;
        Ok(records)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StorageError> {
        Ok(students::Entity::find()
            .order_by_asc(students::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to list students", e))?
            .into_iter()
            .map(to_student)
            .collect())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        Ok(courses::Entity::find()
            .order_by_asc(courses::Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to list courses", e))?
            .into_iter()
            .map(to_course)
            .collect())
    }

    async fn insert_record(
        &self,
        edit: &AcademicRecordEdit,
    ) -> Result<AcademicRecord, StorageError> {
        let grade = edit.stored_grade().map_err(|e| {
            error!("Grade of {} does not fit the grade column: {}", edit.key(), e);
            StorageError::WriteFailed
        })?;
        academic_records::ActiveModel {
            student_id: Set(edit.student_id.clone()),
            course_code: Set(edit.course_code.clone()),
            grade: Set(grade),
            version: Set(0),
        }
        .insert(&self.db)
        .await
        .map_err(|e| write_failed("Failed to insert academic record", e))?;
        info!("Inserted academic record {}", edit.key());
        self.fetch_record(&edit.key())
            .await?
            .ok_or(StorageError::ReadFailed)
    }

    async fn commit(&self, batch: &UpdateBatch) -> Result<CommitOutcome, StorageError> {
        if batch.is_empty() {
            debug!("Empty update batch, nothing to commit");
            return Ok(CommitOutcome::Committed { rows: 0 });
        }
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| write_failed("Failed to open write transaction", e))?;
        let mut rows = 0usize;
        for (index, update) in batch.updates().iter().enumerate() {
            let result = academic_records::Entity::update_many()
                .col_expr(academic_records::Column::Grade, Expr::value(update.grade))
                .col_expr(
                    academic_records::Column::Version,
                    Expr::col(academic_records::Column::Version).add(1),
                )
                .filter(academic_records::Column::StudentId.eq(update.key.student_id.as_str()))
                .filter(academic_records::Column::CourseCode.eq(update.key.course_code.as_str()))
                .filter(academic_records::Column::Version.eq(update.expected_version))
                .exec(&txn)
                .await
                .map_err(|e| write_failed("Failed to update academic record", e))?;
            if result.rows_affected == 0 {
                warn!(
                    "Academic record {} is no longer at version {}, rolling back",
                    update.key, update.expected_version
                );
                txn.rollback()
                    .await
                    .map_err(|e| write_failed("Failed to roll back", e))?;
                return Ok(CommitOutcome::Conflict { index });
            }
            rows += result.rows_affected as usize;
        }
        txn.commit()
            .await
            .map_err(|e| write_failed("Failed to commit academic records", e))?;
        info!("Committed {} academic record update(s)", rows);
        Ok(CommitOutcome::Committed { rows })
    }

    async fn delete_record(&self, key: &RecordKey) -> Result<bool, StorageError> {
        let result = academic_records::Entity::delete_by_id((
            key.student_id.clone(),
            key.course_code.clone(),
        ))
        .exec(&self.db)
        .await
        .map_err(|e| write_failed("Failed to delete academic record", e))?;
        if result.rows_affected > 0 {
            info!("Deleted academic record {}", key);
        }
        Ok(result.rows_affected > 0)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StorageError> {
        Ok(roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to list roles", e))?
            .into_iter()
            .map(to_role)
            .collect())
    }

    async fn fetch_roles(&self, ids: &[i32]) -> Result<Vec<Role>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(roles::Entity::find()
            .filter(roles::Column::Id.is_in(ids.to_vec()))
            .order_by_asc(roles::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load roles", e))?
            .into_iter()
            .map(to_role)
            .collect())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, StorageError> {
        let models = employees::Entity::find()
            .order_by_asc(employees::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to list employees", e))?;
        let roles: HashMap<i32, Role> = self
            .list_roles()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let mut links: HashMap<i32, Vec<Role>> = HashMap::new();
        for link in employee_roles::Entity::find()
            .order_by_asc(employee_roles::Column::RoleId)
            .all(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load employee roles", e))?
        {
            if let Some(role) = roles.get(&link.role_id) {
                links.entry(link.employee_id).or_default().push(role.clone());
            }
        }
        Ok(models
            .into_iter()
            .map(|m| {
                let assigned = links.remove(&m.id).unwrap_or_default();
                to_employee(m, assigned)
            })
            .collect())
    }

    async fn fetch_employee(&self, id: i32) -> Result<Option<Employee>, StorageError> {
        let model = employees::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| read_failed("Failed to load employee", e))?;
        match model {
            Some(m) => {
                let roles = self.roles_for(id).await?;
                Ok(Some(to_employee(m, roles)))
            }
            None => Ok(None),
        }
    }

    async fn user_name_taken(
        &self,
        user_name: &str,
        excluding: Option<i32>,
    ) -> Result<bool, StorageError> {
        let mut query = employees::Entity::find().filter(employees::Column::UserName.eq(user_name));
        if let Some(id) = excluding {
            query = query.filter(employees::Column::Id.ne(id));
        }
        let count = query
            .count(&self.db)
            .await
            .map_err(|e| read_failed("Failed to check user name", e))?;
        Ok(count > 0)
    }

    async fn insert_employee(
        &self,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<Employee, StorageError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| write_failed("Failed to open write transaction", e))?;
        let model = employees::ActiveModel {
            id: NotSet,
            name: Set(draft.name.clone()),
            user_name: Set(draft.user_name.clone()),
            password: Set(draft.password.clone()),
            version: Set(0),
        }
        .insert(&txn)
        .await
        .map_err(|e| write_failed("Failed to insert employee", e))?;
        insert_role_links(&txn, model.id, role_ids).await?;
        txn.commit()
            .await
            .map_err(|e| write_failed("Failed to commit employee", e))?;
        info!("Inserted employee {} ({})", model.id, model.user_name);
        let roles = self.roles_for(model.id).await?;
        Ok(to_employee(model, roles))
    }

    async fn update_employee(
        &self,
        id: i32,
        expected_version: i32,
        draft: &EmployeeDraft,
        role_ids: &[i32],
    ) -> Result<CommitOutcome, StorageError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| write_failed("Failed to open write transaction", e))?;
        let result = employees::Entity::update_many()
            .col_expr(employees::Column::Name, Expr::value(draft.name.clone()))
            .col_expr(employees::Column::UserName, Expr::value(draft.user_name.clone()))
            .col_expr(employees::Column::Password, Expr::value(draft.password.clone()))
            .col_expr(
                employees::Column::Version,
                Expr::col(employees::Column::Version).add(1),
            )
            .filter(employees::Column::Id.eq(id))
            .filter(employees::Column::Version.eq(expected_version))
            .exec(&txn)
            .await
            .map_err(|e| write_failed("Failed to update employee", e))?;
        if result.rows_affected == 0 {
            warn!(
                "Employee {} is no longer at version {}, rolling back",
                id, expected_version
            );
            txn.rollback()
                .await
                .map_err(|e| write_failed("Failed to roll back", e))?;
            return Ok(CommitOutcome::Conflict { index: 0 });
        }
        employee_roles::Entity::delete_many()
            .filter(employee_roles::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| write_failed("Failed to clear employee roles", e))?;
        insert_role_links(&txn, id, role_ids).await?;
        txn.commit()
            .await
            .map_err(|e| write_failed("Failed to commit employee", e))?;
        info!("Updated employee {}", id);
        Ok(CommitOutcome::Committed { rows: 1 })
    }

    async fn delete_employee(&self, id: i32) -> Result<bool, StorageError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| write_failed("Failed to open write transaction", e))?;
        employee_roles::Entity::delete_many()
            .filter(employee_roles::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| write_failed("Failed to clear employee roles", e))?;
        let result = employees::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| write_failed("Failed to delete employee", e))?;
        txn.commit()
            .await
            .map_err(|e| write_failed("Failed to commit employee removal", e))?;
        if result.rows_affected > 0 {
            info!("Deleted employee {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}
