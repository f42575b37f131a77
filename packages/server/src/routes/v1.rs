use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/problem-statements", problem_statement_routes())
        .nest("/teams", team_routes())
        .nest("/evaluations", evaluation_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::list_users))
        .routes(routes!(handlers::user::update_user_role))
}

fn problem_statement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::problem_statement::list_problem_statements,
            handlers::problem_statement::create_problem_statement
        ))
        .routes(routes!(
            handlers::problem_statement::get_problem_statement,
            handlers::problem_statement::update_problem_statement
        ))
        .routes(routes!(
            handlers::problem_statement::list_evaluators,
            handlers::problem_statement::assign_evaluator
        ))
        .routes(routes!(handlers::problem_statement::remove_evaluator))
        .routes(routes!(handlers::problem_statement::list_reviewable_teams))
        .routes(routes!(
            handlers::evaluation::get_my_evaluation,
            handlers::evaluation::submit_rankings
        ))
        .routes(routes!(handlers::evaluation::get_consensus))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::team::list_teams,
            handlers::team::register_team
        ))
        .routes(routes!(handlers::team::get_my_team))
        .routes(routes!(handlers::team::get_team))
        .routes(routes!(handlers::team::update_team_status))
        .routes(routes!(
            handlers::team::get_task_submission,
            handlers::team::submit_task
        ))
}

fn evaluation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::evaluation::list_my_assignments))
        .routes(routes!(handlers::evaluation::get_overview))
}
