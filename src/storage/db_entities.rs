//! SeaORM entity models used by the database storage backend.
//!
//! These modules map to the SQLite tables created by `database_storage`:
//! - `students`, `courses`: reference data a record points at
//! - `academic_records`: one grade per (student, course), versioned
//! - `employees`, `roles`: staff accounts and job titles
//! - `employee_roles`: the many-to-many join between them

/// Students table entity model.
pub mod students {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "students")]
    pub struct Model {
        /// Student number
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::academic_records::Entity")]
        AcademicRecords,
    }

    impl Related<super::academic_records::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::AcademicRecords.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Courses table entity model.
pub mod courses {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "courses")]
    pub struct Model {
        /// Course code (e.g. "CST8257")
        #[sea_orm(primary_key, auto_increment = false)]
        pub code: String,
        pub title: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::academic_records::Entity")]
        AcademicRecords,
    }

    impl Related<super::academic_records::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::AcademicRecords.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Academic records table entity model.
///
/// Keyed by (student_id, course_code). `version` starts at 0 and is bumped by
/// every update so writers can detect that a row moved under them.
pub mod academic_records {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "academic_records")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub student_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub course_code: String,
        /// Absent until the course is graded
        #[sea_orm(nullable)]
        pub grade: Option<i32>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::students::Entity",
            from = "Column::StudentId",
            to = "super::students::Column::Id"
        )]
        Student,
        #[sea_orm(
            belongs_to = "super::courses::Entity",
            from = "Column::CourseCode",
            to = "super::courses::Column::Code"
        )]
        Course,
    }

    impl Related<super::students::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Student.def()
        }
    }

    impl Related<super::courses::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Course.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Roles table entity model.
pub mod roles {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "roles")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Employees table entity model.
pub mod employees {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "employees")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        /// Network ID, unique across employees
        #[sea_orm(unique)]
        pub user_name: String,
        pub password: String,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Join table between employees and roles.
pub mod employee_roles {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "employee_roles")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub employee_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub role_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::employees::Entity",
            from = "Column::EmployeeId",
            to = "super::employees::Column::Id"
        )]
        Employee,
        #[sea_orm(
            belongs_to = "super::roles::Entity",
            from = "Column::RoleId",
            to = "super::roles::Column::Id"
        )]
        Role,
    }

    impl ActiveModelBehavior for ActiveModel {}
}
