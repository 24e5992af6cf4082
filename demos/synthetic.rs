//! # IV Validity Diagnostics on Simulated Data
//!
//! Two designs share the same structural equation `y = 1 + 2*d + 0.5*w + u + e`,
//! where the confounder `u` also drives `d`, so OLS overstates the effect.
//!
//! - Valid design: instruments `z1`, `z2` shift `d` and nothing else
//! - Invalid design: `z2` also enters the outcome directly
//!
//! The diagnostics should pass for the first and flag the exclusion
//! restriction for the second.
//!
//! Run with: `cargo run --example synthetic`

use iv_validity::core::DiagnosticsOptions;
use iv_validity::data::Dataset;
use iv_validity::diagnostics::{IvValidityTests, VariableRoles};

/// Small LCG so the demo is reproducible without extra dependencies.
struct Lcg(u64);

impl Lcg {
    fn uniform(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64) / ((1u64 << 53) as f64) * 2.0 - 1.0
    }

    fn column(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.uniform()).collect()
    }
}

fn simulate(n: usize, direct_effect: f64, seed: u64) -> Dataset {
    let mut rng = Lcg(seed);
    let z1 = rng.column(n);
    let z2 = rng.column(n);
    let w = rng.column(n);
    let u = rng.column(n);
    let e_d = rng.column(n);
    let e_y = rng.column(n);

    let d: Vec<f64> = (0..n)
        .map(|i| z1[i] + z2[i] + 0.5 * w[i] + u[i] + e_d[i])
        .collect();
    let y: Vec<f64> = (0..n)
        .map(|i| 1.0 + 2.0 * d[i] + 0.5 * w[i] + direct_effect * z2[i] + u[i] + e_y[i])
        .collect();

    Dataset::from_columns([("y", y), ("d", d), ("z1", z1), ("z2", z2), ("w", w)])
        .expect("columns have equal length")
}

fn run(title: &str, data: &Dataset) {
    println!("\n##### {title} #####");

    let roles = VariableRoles::new("y", ["d"], ["z1", "z2"]).with_controls(["w"]);
    let options = DiagnosticsOptions::builder()
        .verbose(false)
        .build()
        .expect("default options are valid");

    let mut tests = IvValidityTests::new(data, roles, options).expect("roles match the data");
    tests.run_all_tests().expect("diagnostics should run");
    let estimate = tests.estimate_2sls().expect("2SLS should fit");

    println!("\n{estimate}");
    println!("\n{}", tests.summary_table());
}

fn main() {
    println!("=== IV Validity Diagnostics ===");

    run("Valid instruments", &simulate(2000, 0.0, 7));
    run("z2 violates the exclusion restriction", &simulate(2000, 1.5, 7));
}
