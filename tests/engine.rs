mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use capbudget::budgeting::check_selection;
use capbudget::domain::PoolSearch;
use capbudget::{
    CapitalBudgetingEngine, ConfigError, EngineError, Project, ProjectDataset, RegionQuota,
    RuleConfiguration, SolveStatus,
};
use common::{city_projects, dataset, ids, three_projects, ExhaustiveSolver};

fn engine(solver: ExhaustiveSolver) -> (CapitalBudgetingEngine, Arc<ExhaustiveSolver>) {
    capbudget::logging::init_test();
    let solver = Arc::new(solver);
    (CapitalBudgetingEngine::new(solver.clone()), solver)
}

fn best_objective(dataset: &ProjectDataset, rules: &RuleConfiguration) -> f64 {
    let (engine, _) = engine(ExhaustiveSolver::new());
    engine
        .solve(dataset, rules)
        .unwrap()
        .best()
        .map(|s| s.objective_value)
        .unwrap()
}

fn city_rules() -> RuleConfiguration {
    RuleConfiguration::new(1000.0)
        .with_resource_cap("labour", 2000.0)
        .with_region_quota("South", RegionQuota::at_least(1))
        .with_region_quota("North", RegionQuota::at_most(2))
        .with_cardinality_limit(5)
        .with_dataset_rules(&city_projects())
}

#[test]
fn two_project_budget_examples() {
    let data = dataset(&[("P1", 100.0, 50.0), ("P2", 200.0, 90.0)]);
    let (engine, _) = engine(ExhaustiveSolver::new());

    let report = engine.solve(&data, &RuleConfiguration::new(250.0)).unwrap();
    let best = report.best().unwrap();
    assert_eq!(report.status, SolveStatus::Optimal);
    assert_eq!(best.selected_ids, ids(&["P1", "P2"]));
    assert_eq!(best.objective_value, 140.0);

    let report = engine.solve(&data, &RuleConfiguration::new(150.0)).unwrap();
    let best = report.best().unwrap();
    assert_eq!(best.selected_ids, ids(&["P2"]));
    assert_eq!(best.objective_value, 90.0);
}

#[test]
fn dependent_is_never_selected_alone() {
    let data = ProjectDataset::new(vec![
        Project::new("P1", 100.0, 50.0),
        Project::new("P2", 200.0, 90.0).requiring("P1"),
    ]);
    let (engine, _) = engine(ExhaustiveSolver::new());

    let tight = RuleConfiguration::new(200.0);
    let report = engine.solve(&data, &tight).unwrap();
    assert_eq!(report.best().unwrap().selected_ids, ids(&["P1"]));

    let roomy = RuleConfiguration::new(300.0);
    let report = engine.solve(&data, &roomy).unwrap();
    assert_eq!(report.best().unwrap().selected_ids, ids(&["P1", "P2"]));

    let only_p2 = RuleConfiguration::new(200.0).with_pool(4, None);
    let report = engine.solve(&data, &only_p2).unwrap();
    for solution in &report.solutions {
        assert!(!solution.is_selected("P2") || solution.is_selected("P1"));
    }
}

#[test]
fn exclusive_group_tags_hold_without_explicit_groups() {
    let data = ProjectDataset::new(vec![
        Project::new("A", 50.0, 40.0).with_exclusive_group("G"),
        Project::new("B", 50.0, 30.0).with_exclusive_group("G"),
        Project::new("C", 50.0, 10.0),
    ]);
    let (engine, _) = engine(ExhaustiveSolver::new());

    let rules = RuleConfiguration::new(100.0).with_pool(3, None);
    let report = engine.solve(&data, &rules).unwrap();
    assert_eq!(report.best().unwrap().selected_ids, ids(&["A", "C"]));
    for solution in &report.solutions {
        assert!(!(solution.is_selected("A") && solution.is_selected("B")));
    }
}

#[test]
fn native_pool_satisfies_request_without_fallback() {
    let (engine, solver) = engine(ExhaustiveSolver::with_pool());
    let rules = RuleConfiguration::new(250.0).with_pool(3, None);

    let report = engine.solve(&three_projects(), &rules).unwrap();
    assert!(!report.used_fallback);
    assert_eq!(solver.calls(), 1);

    let sets: Vec<Vec<String>> = report.solutions.iter().map(|s| s.selected_ids.clone()).collect();
    assert_eq!(sets, vec![ids(&["P2", "P3"]), ids(&["P2"]), ids(&["P1", "P3"])]);
    let objectives: Vec<f64> = report.solutions.iter().map(|s| s.objective_value).collect();
    assert_eq!(objectives, vec![120.0, 90.0, 80.0]);
}

#[test]
fn fallback_enumerates_when_backend_has_no_pool() {
    let (engine, solver) = engine(ExhaustiveSolver::new());
    let rules = RuleConfiguration::new(250.0).with_pool(3, None);

    let report = engine.solve(&three_projects(), &rules).unwrap();
    assert!(report.used_fallback);
    assert_eq!(solver.calls(), 4);

    let objectives: Vec<f64> = report.solutions.iter().map(|s| s.objective_value).collect();
    assert_eq!(objectives, vec![120.0, 90.0, 80.0]);
    let numbers: Vec<usize> = report.solutions.iter().map(|s| s.sequence_number).collect();
    assert_eq!(numbers, vec![0, 1, 2]);
}

#[test]
fn fallback_rounds_start_from_a_clean_configuration() {
    let (engine, solver) = engine(ExhaustiveSolver::new());
    let rules = RuleConfiguration::new(250.0)
        .with_pool(2, Some(0.2))
        .with_time_limit(3.0);
    engine.solve(&three_projects(), &rules).unwrap();

    let configs = solver.configs();
    assert_eq!(configs[0].pool, PoolSearch::Alternatives { count: 2, gap: 0.2 });
    for config in &configs[1..] {
        assert_eq!(config.pool, PoolSearch::Off);
        assert_eq!(config.time_limit, Some(3.0));
    }
}

#[test]
fn unreadable_slots_are_recovered_by_fallback() {
    let (engine, _) = engine(ExhaustiveSolver::with_pool().breaking_slot(1));
    let rules = RuleConfiguration::new(250.0).with_pool(3, None);

    let report = engine.solve(&three_projects(), &rules).unwrap();
    assert!(report.used_fallback);
    assert_eq!(report.solutions.len(), 3);
}

#[test]
fn pool_is_not_padded_past_the_feasible_space() {
    let data = dataset(&[("P1", 100.0, 50.0), ("P2", 200.0, 90.0)]);
    let rules = RuleConfiguration::new(1000.0).with_pool(10, None);

    for solver in [ExhaustiveSolver::new(), ExhaustiveSolver::with_pool()] {
        let (engine, _) = engine(solver);
        let report = engine.solve(&data, &rules).unwrap();
        assert_eq!(report.solutions.len(), 4);
        let distinct: BTreeSet<BTreeSet<String>> =
            report.solutions.iter().map(|s| s.canonical()).collect();
        assert_eq!(distinct.len(), 4);
        assert!(report.solutions[3].selected_ids.is_empty());
    }
}

#[test]
fn every_returned_selection_is_feasible_and_distinct() {
    let data = city_projects();
    let rules = city_rules().with_pool(6, None);

    for solver in [ExhaustiveSolver::new(), ExhaustiveSolver::with_pool()] {
        let (engine, _) = engine(solver);
        let report = engine.solve(&data, &rules).unwrap();
        assert_eq!(report.solutions.len(), 6);

        let mut seen = BTreeSet::new();
        let mut previous = f64::INFINITY;
        for solution in &report.solutions {
            assert!(
                check_selection(&data, &rules, &solution.selected_ids).is_empty(),
                "{:?} breaks a rule",
                solution.selected_ids
            );
            assert!(seen.insert(solution.canonical()));
            assert!(solution.objective_value <= previous + 1e-9);
            previous = solution.objective_value;
            if solution.is_selected("clinic") {
                assert!(solution.is_selected("water_main"));
            }
            if solution.is_selected("depot") {
                assert!(solution.is_selected("road_a"));
            }
        }
    }
}

#[test]
fn solving_twice_gives_the_same_best_objective() {
    let data = city_projects();
    let rules = city_rules();
    assert_eq!(best_objective(&data, &rules), best_objective(&data, &rules));
}

#[test]
fn monotone_in_budget_dependencies_and_groups() {
    let data = three_projects();

    let mut previous = f64::NEG_INFINITY;
    for budget in (0..=400).step_by(25) {
        let best = best_objective(&data, &RuleConfiguration::new(budget as f64));
        assert!(best >= previous);
        previous = best;
    }

    let base = RuleConfiguration::new(250.0);
    let unconstrained = best_objective(&data, &base);
    let with_dependency = best_objective(&data, &base.clone().with_dependency("P1", "P3"));
    assert!(unconstrained >= with_dependency);

    let with_group = best_objective(&data, &base.clone().with_exclusive_group(["P2", "P3"]));
    assert!(with_group <= unconstrained);
}

#[test]
fn secondary_score_changes_the_ranking() {
    let data = ProjectDataset::new(vec![
        Project::new("A", 100.0, 90.0).with_secondary_score(0.1),
        Project::new("B", 100.0, 60.0).with_secondary_score(0.9),
    ]);
    let rules = RuleConfiguration::new(100.0);

    let (engine, _) = engine(ExhaustiveSolver::new());
    let by_benefit = engine.solve(&data, &rules).unwrap();
    assert_eq!(by_benefit.best().unwrap().selected_ids, ids(&["A"]));

    let by_score = engine
        .solve(&data, &rules.clone().with_objective_weight(0.0))
        .unwrap();
    assert_eq!(by_score.best().unwrap().selected_ids, ids(&["B"]));
}

#[test]
fn infeasible_rules_return_an_empty_batch() {
    let data = city_projects();
    let rules = RuleConfiguration::new(1000.0)
        .with_region_quota("East", RegionQuota::at_least(4))
        .with_pool(3, None);
    let (engine, solver) = engine(ExhaustiveSolver::new());

    let report = engine.solve(&data, &rules).unwrap();
    assert_eq!(report.status, SolveStatus::Infeasible);
    assert!(report.solutions.is_empty());
    assert!(!report.used_fallback);
    assert_eq!(solver.calls(), 1);
}

#[test]
fn invalid_configuration_is_an_error() {
    let (engine, solver) = engine(ExhaustiveSolver::new());
    let rules = RuleConfiguration::new(100.0).with_objective_weight(1.5);

    let err = engine.solve(&three_projects(), &rules).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Config(ConfigError::ObjectiveWeightOutOfRange(w)) if w == 1.5
    ));
    assert_eq!(solver.calls(), 0);
}

#[test]
fn empty_dataset_selects_nothing() {
    let (engine, _) = engine(ExhaustiveSolver::new());
    let rules = RuleConfiguration::new(100.0).with_pool(3, None);

    let report = engine.solve(&ProjectDataset::default(), &rules).unwrap();
    assert_eq!(report.status, SolveStatus::Optimal);
    assert_eq!(report.solutions.len(), 1);
    assert!(report.solutions[0].selected_ids.is_empty());
}

#[test]
fn unknown_references_are_warnings_not_errors() {
    let data = ProjectDataset::new(vec![
        Project::new("P1", 100.0, 50.0).requiring("ghost"),
        Project::new("P2", 200.0, 90.0),
    ]);
    let rules = RuleConfiguration::new(300.0)
        .with_dataset_rules(&data)
        .with_exclusive_group(["P2", "phantom"]);
    let (engine, _) = engine(ExhaustiveSolver::new());

    let report = engine.solve(&data, &rules).unwrap();
    assert_eq!(report.best().unwrap().selected_ids, ids(&["P1", "P2"]));
    assert_eq!(report.diagnostics.len(), 3);
}
