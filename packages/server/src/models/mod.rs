pub mod auth;
pub mod evaluation;
pub mod problem_statement;
pub mod shared;
pub mod team;
