//! Repeatability locks.
//!
//! - Same model, same call sequence: same ids, same operator sets (N = 10).
//! - Model digests depend on content, not on how the model was assembled.
//! - Separate processes with different environments print identical reports.

use std::process::Command;
use std::sync::Arc;

use lock_tests::fixtures::{explore, lights_out, logistics};
use lock_tests::init_tracing;
use planstate_kernel::model::fact::{Fact, Variable};
use planstate_kernel::model::operator::{Effect, Operator, OperatorId};
use planstate_kernel::model::problem::ProblemModel;
use planstate_search::successor::generator::SuccessorGenerator;
use planstate_search::successor::{GeneratorConfig, VariableSelection};

const RUNS: usize = 10;

#[test]
fn exploration_is_identical_across_runs() {
    init_tracing();
    let model = Arc::new(logistics(2, 3));
    let generator = SuccessorGenerator::new(&model);
    let reference = explore(Arc::clone(&model), &generator).unwrap();
    for _ in 1..RUNS {
        let run = explore(Arc::clone(&model), &generator).unwrap();
        assert_eq!(run.order, reference.order);
        assert_eq!(run.transitions, reference.transitions);
    }
}

#[test]
fn rebuilt_generators_return_identical_sequences() {
    let model = lights_out(4);
    let states: Vec<Vec<u32>> = (0..16u32)
        .map(|n| (0..4).map(|bit| (n >> bit) & 1).collect())
        .collect();
    let reference: Vec<Vec<OperatorId>> = {
        let generator = SuccessorGenerator::new(&model);
        states.iter().map(|s| generator.generate(s)).collect()
    };
    for _ in 1..RUNS {
        let generator = SuccessorGenerator::new(&model);
        let run: Vec<Vec<OperatorId>> = states.iter().map(|s| generator.generate(s)).collect();
        assert_eq!(run, reference);
    }
}

#[test]
fn variable_selection_changes_shape_not_answers() {
    let model = logistics(2, 3);
    let most = SuccessorGenerator::new(&model);
    let lowest = SuccessorGenerator::with_config(
        &model,
        GeneratorConfig {
            variable_selection: VariableSelection::LowestIndex,
        },
    );
    let exploration = explore(Arc::new(model), &most).unwrap();
    for &id in &exploration.order {
        let state = exploration.registry.lookup(id);
        let mut a = most.generate(&state);
        let mut b = lowest.generate(&state);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b, "disagreement at {id:?}");
    }
}

#[test]
fn digest_depends_on_content_only() {
    let set = |var: usize| Effect::unconditional(Fact::new(var, 1));
    let variables = || vec![Variable::new("x", 2), Variable::new("y", 2)];

    let explicit = ProblemModel::new(
        variables(),
        vec![
            Operator::new("set-x", vec![], vec![set(0)], 1),
            Operator::new("set-y", vec![], vec![set(1)], 1),
        ],
        vec![0, 0],
        vec![Fact::new(0, 1), Fact::new(1, 1)],
    )
    .unwrap();
    let generated = ProblemModel::new(
        variables(),
        ["x", "y"]
            .iter()
            .enumerate()
            .map(|(var, name)| Operator::new(format!("set-{name}"), vec![], vec![set(var)], 1))
            .collect(),
        vec![0, 0],
        vec![Fact::new(0, 1), Fact::new(1, 1)],
    )
    .unwrap();

    let digest = explicit.digest().unwrap();
    assert_eq!(digest.algorithm(), "sha256");
    for _ in 0..RUNS {
        assert_eq!(generated.digest().unwrap(), digest);
    }

    let costlier = ProblemModel::new(
        variables(),
        vec![
            Operator::new("set-x", vec![], vec![set(0)], 2),
            Operator::new("set-y", vec![], vec![set(1)], 1),
        ],
        vec![0, 0],
        vec![Fact::new(0, 1), Fact::new(1, 1)],
    )
    .unwrap();
    assert_ne!(costlier.digest().unwrap(), digest);
}

#[test]
fn fixture_binary_output_is_process_independent() {
    let bin = env!("CARGO_BIN_EXE_reachability_fixture");
    let workspace = env!("CARGO_MANIFEST_DIR");
    let tmp = std::env::temp_dir();
    let variants: [(&std::path::Path, &[(&str, &str)]); 3] = [
        (workspace.as_ref(), &[]),
        (tmp.as_path(), &[("LC_ALL", "C")]),
        (tmp.as_path(), &[("LANG", "tr_TR.UTF-8"), ("RUST_LOG", "trace")]),
    ];
    let outputs: Vec<String> = variants
        .iter()
        .map(|(dir, env)| {
            let mut command = Command::new(bin);
            command
                .current_dir(dir)
                .env_remove("LC_ALL")
                .env_remove("LANG");
            for &(key, value) in *env {
                command.env(key, value);
            }
            let output = command.output().unwrap();
            assert!(
                output.status.success(),
                "fixture failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
            String::from_utf8(output.stdout).unwrap()
        })
        .collect();

    assert!(outputs[0].contains("two_var.states=4"));
    assert!(outputs[0].lines().count() >= 15);
    for other in &outputs[1..] {
        assert_eq!(other, &outputs[0]);
    }
}
