// Example: Large portfolio using gRPC streaming
//
// 200 generated projects are uploaded one chunk at a time, followed by the
// rules. Each project carries a social score, so the objective blends
// benefit (70%) with social impact (30%).

use std::collections::HashMap;
use tonic::Request;

pub mod capbudget {
    tonic::include_proto!("capbudget");
}

use capbudget::{
    capital_budgeting_client::CapitalBudgetingClient, portfolio_chunk, Metadata, PortfolioChunk,
    Project, RegionQuota, Rules, SolveStatus, SolverBackend,
};

const NUM_PROJECTS: usize = 200;
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

fn generate_projects() -> Vec<Project> {
    (0..NUM_PROJECTS)
        .map(|i| {
            // Deterministic pseudo-random spread
            let cost = 50.0 + ((i * 37) % 450) as f64;
            let benefit = cost * (0.6 + ((i * 13) % 70) as f64 / 100.0);
            Project {
                id: format!("P{:03}", i),
                cost,
                benefit,
                secondary_score: Some(((i * 29) % 100) as f64 / 100.0),
                region: Some(REGIONS[i % REGIONS.len()].to_string()),
                exclusive_group: (i % 10 == 0).then(|| format!("site_{}", i / 40)),
                requires: if i % 17 == 5 {
                    vec![format!("P{:03}", i - 5)]
                } else {
                    Vec::new()
                },
                resources: HashMap::from([("land".to_string(), ((i * 7) % 40) as f64)]),
                priority: None,
            }
        })
        .collect()
}

fn create_chunks(projects: Vec<Project>) -> Vec<PortfolioChunk> {
    let mut chunks = vec![PortfolioChunk {
        chunk: Some(portfolio_chunk::Chunk::Metadata(Metadata {
            request_name: "regional-plan".to_string(),
            solver: SolverBackend::Auto as i32,
        })),
    }];

    chunks.extend(projects.into_iter().map(|p| PortfolioChunk {
        chunk: Some(portfolio_chunk::Chunk::Project(p)),
    }));

    let region_quotas = REGIONS
        .iter()
        .map(|r| {
            (
                r.to_string(),
                RegionQuota {
                    min: Some(3),
                    max: Some(20),
                },
            )
        })
        .collect();

    chunks.push(PortfolioChunk {
        chunk: Some(portfolio_chunk::Chunk::Rules(Rules {
            budget: 12_000.0,
            resource_caps: HashMap::from([("land".to_string(), 800.0)]),
            region_quotas,
            cardinality_limit: Some(50),
            objective_weight: Some(0.7),
            pool_size: 5,
            pool_gap: Some(0.05),
            time_limit_secs: Some(30.0),
            ..Default::default()
        })),
    });

    chunks
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = CapitalBudgetingClient::connect("http://127.0.0.1:50051").await?;

    println!("=== Regional Investment Plan (gRPC Streaming) ===\n");

    let chunks = create_chunks(generate_projects());
    println!("Sending {} chunks...\n", chunks.len());

    let response = client
        .solve_portfolio_stream(Request::new(tokio_stream::iter(chunks)))
        .await?;
    let result = response.into_inner();

    match SolveStatus::try_from(result.status) {
        Ok(SolveStatus::Optimal) | Ok(SolveStatus::TimeLimitWithIncumbent) => {
            println!("✓ {} portfolio(s) from {}\n", result.portfolios.len(), result.solver_name);
            for portfolio in &result.portfolios {
                println!(
                    "  #{}: {} projects, objective {:.1}, cost {:.1}",
                    portfolio.sequence_number + 1,
                    portfolio.selected_ids.len(),
                    portfolio.objective_value,
                    portfolio.total_cost
                );
            }
        }
        Ok(status) => println!("✗ No portfolio: {:?}", status),
        Err(_) => println!("✗ Unknown status {}", result.status),
    }

    if !result.warnings.is_empty() {
        println!("\n{} data warning(s)", result.warnings.len());
    }

    Ok(())
}
