pub mod evaluation;
pub mod evaluator_assignment;
pub mod problem_statement;
pub mod role;
pub mod role_permission;
pub mod task_submission;
pub mod team;
pub mod user;
