//! Replication framework for mass-casualty incident simulations.
//!
//! Runs one scenario many times in parallel with consecutive seeds, scores each
//! run with a weighted objective, aggregates the runs and exports them.
//!
//! # Quick Start
//!
//! ```no_run
//! use mci_experiments::{load_scenario_file, run_replications, summarize, ObjectiveWeights, ReplicationConfig};
//!
//! let file = load_scenario_file("data/demo_scenario.json").unwrap();
//! let report = run_replications(&file, &ReplicationConfig::new(20, 1));
//! let summary = summarize(&report, &ObjectiveWeights::default());
//! println!("mean objective: {:.2}", summary.mean_objective);
//! ```
//!
//! # Architecture
//!
//! - [`scenario_file`]: scenario, reference data and parameters loaded from JSON
//! - [`runner`]: single runs and rayon-parallel replications
//! - [`metrics`]: per-run results and their aggregation
//! - [`objective`]: weighted objective over the four result metrics
//! - [`export`]: CSV and JSON export of runs, summaries and solution logs

pub mod export;
pub mod metrics;
pub mod objective;
pub mod runner;
pub mod scenario_file;

pub use export::{export_runs_to_csv, export_solution_to_csv, export_to_json};
pub use metrics::{summarize, ReplicationReport, ReplicationSummary, RunFailure, RunResult};
pub use objective::ObjectiveWeights;
pub use runner::{run_replications, run_replications_with_progress, run_single, ReplicationConfig};
pub use scenario_file::{load_scenario_file, ScenarioFile};
