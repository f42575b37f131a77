use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::role::{ADMIN_ROLE, DEFAULT_ROLE, EVALUATOR_ROLE};
use crate::entity::{evaluation, role, role_permission, team};

/// Every permission the portal checks.
pub const ALL_PERMISSIONS: &[&str] = &[
    "team:register",
    "team:manage",
    "problem_statement:manage",
    "evaluator:assign",
    "evaluation:submit",
    "evaluation:view_all",
    "user:manage",
];

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[ADMIN_ROLE, EVALUATOR_ROLE, DEFAULT_ROLE];

/// Permissions granted to roles other than admin, which gets all of them.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    (EVALUATOR_ROLE, "evaluation:submit"),
    (DEFAULT_ROLE, "team:register"),
];

fn default_mappings() -> impl Iterator<Item = (&'static str, &'static str)> {
    ALL_PERMISSIONS
        .iter()
        .map(|&p| (ADMIN_ROLE, p))
        .chain(DEFAULT_MAPPINGS.iter().copied())
}

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => roles_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for (role, permission) in default_mappings() {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => perms_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// Schema-sync only creates unique indexes, so the composite lookup
/// indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Team listings and eligibility checks filter by problem statement and status.
    let team_status = Index::create()
        .if_not_exists()
        .name("idx_team_problem_statement_status")
        .table(team::Entity)
        .col(team::Column::ProblemStatementId)
        .col(team::Column::Status)
        .to_owned();

    // Consensus and overview read the finalized evaluations of a problem statement.
    let evaluation_finalized = Index::create()
        .if_not_exists()
        .name("idx_evaluation_problem_statement_finalized")
        .table(evaluation::Entity)
        .col(evaluation::Column::ProblemStatementId)
        .col(evaluation::Column::IsFinalized)
        .to_owned();

    for (name, stmt) in [
        ("idx_team_problem_statement_status", team_status),
        ("idx_evaluation_problem_statement_finalized", evaluation_finalized),
    ] {
        create_index(db, name, stmt).await;
    }

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    match db
        .execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
        .await
    {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
    }
}
