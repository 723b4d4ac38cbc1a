// Example client: choose a municipal investment portfolio over gRPC
//
// Eight candidate projects compete for a budget of 1,000:
// - Two road projects are mutually exclusive (same corridor)
// - The clinic needs the water main
// - Labour hours are capped at 2,000
// - At least one project must land in the South region
//
// We ask for the best portfolio plus up to two alternatives.

use std::collections::HashMap;
use tonic::Request;

pub mod capbudget {
    tonic::include_proto!("capbudget");
}

use capbudget::{
    capital_budgeting_client::CapitalBudgetingClient, Empty, ExclusiveGroup, Project,
    RegionQuota, Rules, SolveRequest, SolveStatus, SolverBackend,
};

fn project(id: &str, cost: f64, benefit: f64, region: &str, labour: f64) -> Project {
    Project {
        id: id.to_string(),
        cost,
        benefit,
        region: Some(region.to_string()),
        resources: HashMap::from([("labour".to_string(), labour)]),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = CapitalBudgetingClient::connect("http://127.0.0.1:50051").await?;

    println!("=== Municipal Capital Budget ===\n");

    let solvers = client.get_available_solvers(Request::new(Empty {})).await?;
    for solver in solvers.into_inner().solvers {
        println!("Solver available: {}", solver.name);
    }

    let mut clinic = project("clinic", 260.0, 310.0, "North", 600.0);
    clinic.requires = vec!["water_main".to_string()];

    let projects = vec![
        project("road_a", 300.0, 280.0, "North", 700.0),
        project("road_b", 240.0, 230.0, "North", 500.0),
        project("water_main", 200.0, 150.0, "North", 400.0),
        clinic,
        project("school", 350.0, 330.0, "South", 800.0),
        project("park", 90.0, 70.0, "South", 150.0),
        project("library", 150.0, 120.0, "East", 300.0),
        project("bridge", 420.0, 390.0, "East", 900.0),
    ];

    let rules = Rules {
        budget: 1000.0,
        resource_caps: HashMap::from([("labour".to_string(), 2000.0)]),
        exclusive_groups: vec![ExclusiveGroup {
            project_ids: vec!["road_a".to_string(), "road_b".to_string()],
        }],
        region_quotas: HashMap::from([(
            "South".to_string(),
            RegionQuota {
                min: Some(1),
                max: None,
            },
        )]),
        pool_size: 3,
        time_limit_secs: Some(10.0),
        ..Default::default()
    };

    let request = Request::new(SolveRequest {
        projects,
        rules: Some(rules),
        solver: SolverBackend::Auto as i32,
        request_name: "municipal-2026".to_string(),
    });

    let result = client.solve_portfolio(request).await?.into_inner();

    println!("\nSolver: {} ({:.2} ms)", result.solver_name, result.solve_time_ms);
    for warning in &result.warnings {
        println!("⚠ {}", warning);
    }

    match SolveStatus::try_from(result.status) {
        Ok(SolveStatus::Optimal)
        | Ok(SolveStatus::TimeLimitWithIncumbent)
        | Ok(SolveStatus::SuboptimalWithIncumbent) => {
            if result.used_fallback {
                println!("Alternatives found by iterative exclusion");
            }
            for portfolio in &result.portfolios {
                println!(
                    "\n#{}: benefit {:.1}, cost {:.1}",
                    portfolio.sequence_number + 1,
                    portfolio.objective_value,
                    portfolio.total_cost
                );
                for id in &portfolio.selected_ids {
                    println!("   • {}", id);
                }
            }
        }
        Ok(status) => println!("\n✗ No portfolio: {:?}", status),
        Err(_) => println!("\n✗ Unknown status {}", result.status),
    }

    Ok(())
}
