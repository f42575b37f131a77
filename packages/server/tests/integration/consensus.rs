use serde_json::{Value, json};

use crate::common::{TestApp, routes};

fn approx(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("expected a number, got {value}"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Register `n` teams named `Team0..Team{n-1}` in id order.
async fn register_teams(app: &TestApp, ps: i32, n: usize) -> Vec<i32> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let (_, id) = app.register_team(ps, &format!("Team{i}")).await;
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn teams_are_ordered_by_average_rank() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let teams = register_teams(&app, ps, 3).await;
    let (a, b, c) = (teams[0], teams[1], teams[2]);

    for (name, ranks) in [
        ("judge_one", [(a, 1), (b, 2), (c, 3)]),
        ("judge_two", [(a, 1), (b, 3), (c, 2)]),
        ("judge_three", [(a, 2), (b, 1), (c, 3)]),
    ] {
        let (token, id) = app.create_evaluator(name).await;
        app.assign_evaluator(&admin, ps, id).await;
        let res = app.submit_ranks(&token, ps, &ranks, true).await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app.get_with_token(&routes::consensus(ps), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let consensus = res.body["consensus"].as_array().expect("array");
    let order: Vec<i64> = consensus
        .iter()
        .map(|c| c["team_id"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![a as i64, b as i64, c as i64]);

    approx(&consensus[0]["average_rank"], 4.0 / 3.0);
    approx(&consensus[1]["average_rank"], 2.0);
    approx(&consensus[2]["average_rank"], 8.0 / 3.0);
    approx(&consensus[0]["rank_standard_deviation"], (2.0f64 / 9.0).sqrt());
    assert_eq!(consensus[0]["team_name"], "Team0");
    assert_eq!(consensus[0]["conflict_level"], "low");
    assert_eq!(consensus[0]["rankings"].as_array().map(Vec::len), Some(3));

    assert_eq!(res.body["stats"]["total_teams"], 3);
    assert_eq!(res.body["stats"]["assigned_evaluators"], 3);
    assert_eq!(res.body["stats"]["finalized_evaluators"], 3);
    assert_eq!(res.body["stats"]["pending_evaluators"], 0);
    assert_eq!(res.body["problem_statement"]["id"], ps);
}

#[tokio::test]
async fn disagreement_is_classified_and_counted_separately_in_the_overview() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let teams = register_teams(&app, ps, 8).await;

    // One judge ranks in registration order, the other in reverse.
    let forward: Vec<(i32, u32)> = teams.iter().zip(1..).map(|(&t, r)| (t, r)).collect();
    let backward: Vec<(i32, u32)> = teams.iter().rev().zip(1..).map(|(&t, r)| (t, r)).collect();
    for (name, ranks) in [("judge_fwd", &forward), ("judge_bwd", &backward)] {
        let (token, id) = app.create_evaluator(name).await;
        app.assign_evaluator(&admin, ps, id).await;
        let res = app.submit_ranks(&token, ps, ranks, true).await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app.get_with_token(&routes::consensus(ps), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let consensus = res.body["consensus"].as_array().expect("array");

    // Every team averages 4.5, so the stable sort keeps registration order.
    let levels: Vec<&str> = consensus
        .iter()
        .map(|c| c["conflict_level"].as_str().unwrap())
        .collect();
    assert_eq!(
        levels,
        ["high", "medium", "low", "low", "low", "low", "medium", "high"]
    );
    for c in consensus {
        approx(&c["average_rank"], 4.5);
    }
    approx(&consensus[0]["rank_standard_deviation"], 3.5);
    approx(&consensus[1]["rank_standard_deviation"], 2.5);
    approx(&consensus[2]["rank_standard_deviation"], 1.5);
    assert_eq!(res.body["stats"]["high_conflict_teams"], 2);

    let overview = app.get_with_token(routes::OVERVIEW, &admin).await;
    assert_eq!(overview.status, 200, "{}", overview.text);
    let row = &overview.body[0];
    assert_eq!(row["problem_statement_id"], ps);
    assert_eq!(row["total_teams"], 8);
    assert_eq!(row["finalized_evaluators"], 2);
    assert_eq!(row["conflicting_teams"], 4);
    assert_eq!(row["high_conflict_teams"], 2);
}

#[tokio::test]
async fn drafts_do_not_count_and_unranked_teams_sort_last() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let teams = register_teams(&app, ps, 3).await;
    let (a, b, c) = (teams[0], teams[1], teams[2]);

    let (final_token, final_id) = app.create_evaluator("finisher").await;
    let (draft_token, draft_id) = app.create_evaluator("drafter").await;
    app.assign_evaluator(&admin, ps, final_id).await;
    app.assign_evaluator(&admin, ps, draft_id).await;

    app.submit_ranks(&final_token, ps, &[(c, 1), (b, 2)], true).await;
    app.submit_ranks(&draft_token, ps, &[(a, 1), (b, 2), (c, 3)], false).await;

    let res = app.get_with_token(&routes::consensus(ps), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let stats = &res.body["stats"];
    assert_eq!(stats["assigned_evaluators"], 2);
    assert_eq!(stats["finalized_evaluators"], 1);
    assert_eq!(stats["pending_evaluators"], 1);

    let consensus = res.body["consensus"].as_array().expect("array");
    assert_eq!(consensus[0]["team_id"], c);
    assert_eq!(consensus[1]["team_id"], b);
    assert_eq!(consensus[2]["team_id"], a);

    // A single finalized rank has no spread.
    assert!(consensus[0]["rank_standard_deviation"].is_null());
    assert_eq!(consensus[0]["conflict_level"], "low");

    let unranked = &consensus[2];
    assert!(unranked["average_rank"].is_null());
    assert!(unranked["average_score"].is_null());
    assert!(unranked["rank_standard_deviation"].is_null());
    assert_eq!(unranked["conflict_level"], "low");
    assert_eq!(unranked["rankings"][0]["rank"], Value::Null);

    // The raw list still shows the draft.
    assert_eq!(res.body["evaluations"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn average_score_only_counts_given_scores() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let teams = register_teams(&app, ps, 1).await;

    for (name, body) in [
        ("judge_one", json!({"rankings": [{"team_id": teams[0], "rank": 1, "score": 80}], "is_finalized": true})),
        ("judge_two", json!({"rankings": [{"team_id": teams[0], "rank": 1, "score": 90}], "is_finalized": true})),
        ("judge_three", json!({"rankings": [{"team_id": teams[0], "rank": 1}], "is_finalized": true})),
    ] {
        let (token, id) = app.create_evaluator(name).await;
        app.assign_evaluator(&admin, ps, id).await;
        let res = app
            .put_with_token(&routes::evaluation(ps), &body, &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app.get_with_token(&routes::consensus(ps), &admin).await;
    let team = &res.body["consensus"][0];
    approx(&team["average_score"], 85.0);
    approx(&team["average_rank"], 1.0);
    approx(&team["rank_standard_deviation"], 0.0);
}

#[tokio::test]
async fn rejected_teams_leave_the_consensus() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let teams = register_teams(&app, ps, 2).await;
    let (token, id) = app.create_evaluator("judy").await;
    app.assign_evaluator(&admin, ps, id).await;
    app.submit_ranks(&token, ps, &[(teams[0], 1), (teams[1], 2)], true).await;

    app.set_team_status(&admin, teams[0], "rejected").await;

    let res = app.get_with_token(&routes::consensus(ps), &admin).await;
    let consensus = res.body["consensus"].as_array().expect("array");
    assert_eq!(consensus.len(), 1);
    assert_eq!(consensus[0]["team_id"], teams[1]);
    assert_eq!(res.body["stats"]["total_teams"], 1);
}

#[tokio::test]
async fn evaluators_cannot_view_the_consensus() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let ps = app.create_problem_statement(&admin, "Smart grids").await;
    let (token, id) = app.create_evaluator("judy").await;
    app.assign_evaluator(&admin, ps, id).await;

    let res = app.get_with_token(&routes::consensus(ps), &token).await;
    assert_eq!(res.status, 403);

    let res = app.get_with_token(routes::OVERVIEW, &token).await;
    assert_eq!(res.status, 403);
}
