//! Explores the fixture models and prints deterministic `key=value` lines
//! for cross-process comparison.
//!
//! Usage: `reachability_fixture`

use std::error::Error;
use std::fmt::Write;
use std::sync::Arc;

use lock_tests::fixtures::{explore, lights_out, logistics, two_var_model};
use planstate_kernel::digest::hash::canonical_hash;
use planstate_kernel::model::problem::ProblemModel;
use planstate_search::successor::generator::SuccessorGenerator;

const DOMAIN_TRANSITIONS: &[u8] = b"PLANSTATE::LOCK_TRANSITIONS::V1\0";

fn report(name: &str, model: ProblemModel) -> Result<(), Box<dyn Error>> {
    let digest = model.digest()?;
    let generator = SuccessorGenerator::new(&model);
    let stats = generator.statistics();
    let exploration = explore(Arc::new(model), &generator)?;

    let mut edges = String::new();
    for (from, op, to) in &exploration.transitions {
        writeln!(edges, "{} {} {}", from.index(), op.index(), to.index())?;
    }
    let trace = canonical_hash(DOMAIN_TRANSITIONS, edges.as_bytes());

    println!("{name}.model_digest={digest}");
    println!("{name}.states={}", exploration.order.len());
    println!("{name}.transitions={}", exploration.transitions.len());
    println!("{name}.trace_digest={trace}");
    println!(
        "{name}.generator=nodes:{} forks:{} switches:{} leaves:{} depth:{}",
        stats.num_nodes, stats.num_forks, stats.num_switches, stats.num_leaves, stats.max_depth
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    report("two_var", two_var_model())?;
    report("logistics", logistics(2, 3))?;
    report("lights_out", lights_out(5))?;
    Ok(())
}
