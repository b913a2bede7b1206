//! Exhaustive checks on small models.
//!
//! Reachable sets computed through registry + generator must equal those
//! computed by plain value-vector search, and at every reached state the
//! generator must return exactly the brute-force applicable set.

use std::collections::BTreeSet;
use std::sync::Arc;

use lock_tests::fixtures::{
    brute_force_applicable, brute_force_reachable, explore, lights_out, logistics, two_var_model,
};
use lock_tests::init_tracing;
use planstate_kernel::model::operator::OperatorId;
use planstate_kernel::model::problem::ProblemModel;
use planstate_kernel::registry::per_state::PerStateStore;
use planstate_kernel::registry::state_id::StateId;
use planstate_search::successor::generator::SuccessorGenerator;

fn check_model(model: ProblemModel) {
    let model = Arc::new(model);
    let generator = SuccessorGenerator::new(&model);
    let exploration = explore(Arc::clone(&model), &generator).unwrap();
    let registry = &exploration.registry;

    let reached: BTreeSet<Vec<u32>> = exploration
        .order
        .iter()
        .map(|&id| registry.lookup(id).values())
        .collect();
    assert_eq!(reached.len(), exploration.order.len(), "duplicate ids for one assignment");
    assert_eq!(reached, brute_force_reachable(&model));
    assert_eq!(registry.size(), exploration.order.len());

    for &id in &exploration.order {
        let state = registry.lookup(id);
        let mut generated = generator.generate(&state);
        generated.sort_unstable();
        assert_eq!(generated, brute_force_applicable(&model, &state.values()), "at {id:?}");
    }

    for &(from, op, to) in &exploration.transitions {
        let expected = model.operator(op).apply_to_values(&registry.lookup(from).values());
        assert_eq!(registry.lookup(to).values(), expected);
    }
    registry.log_statistics();
}

#[test]
fn two_var_model_matches_brute_force() {
    init_tracing();
    check_model(two_var_model());
}

#[test]
fn logistics_matches_brute_force() {
    init_tracing();
    check_model(logistics(2, 3));
    check_model(logistics(3, 2));
}

#[test]
fn conditional_effects_match_brute_force() {
    init_tracing();
    // Four lights: the press matrix is invertible over GF(2), so all 16
    // patterns are reachable. Five lights: it has rank 4, so only 16 of 32.
    check_model(lights_out(4));
    check_model(lights_out(5));
    assert_eq!(brute_force_reachable(&lights_out(4)).len(), 16);
    assert_eq!(brute_force_reachable(&lights_out(5)).len(), 16);
}

#[test]
fn per_state_stores_track_search_bookkeeping() {
    init_tracing();
    let model = Arc::new(logistics(2, 3));
    let generator = SuccessorGenerator::new(&model);
    let exploration = explore(Arc::clone(&model), &generator).unwrap();
    let registry = &exploration.registry;

    let mut g: PerStateStore<u32> = PerStateStore::new(registry, u32::MAX);
    let mut parent: PerStateStore<Option<(StateId, OperatorId)>> =
        PerStateStore::new(registry, None);
    let initial = exploration.order[0];
    g[initial] = 0;
    for &(from, op, to) in &exploration.transitions {
        let candidate = g[from] + 1;
        if candidate < g[to] {
            g[to] = candidate;
            parent[to] = Some((from, op));
        }
    }
    assert_eq!(registry.subscriber_count(), 2);

    // Walk back from a goal state and replay the plan.
    let goal = exploration
        .order
        .iter()
        .copied()
        .find(|&id| model.is_goal(&registry.lookup(id)))
        .unwrap();
    let mut plan = Vec::new();
    let mut cursor = goal;
    while let Some((prev, op)) = parent[cursor] {
        plan.push(op);
        cursor = prev;
    }
    plan.reverse();
    assert_eq!(cursor, initial);
    assert_eq!(u32::try_from(plan.len()).unwrap(), g[goal]);

    let mut values = model.initial_values().to_vec();
    for &op in &plan {
        assert!(model.is_applicable(op, &values));
        values = model.operator(op).apply_to_values(&values);
    }
    assert!(model.is_goal(&values));
    assert_eq!(model.plan_cost(&plan), i64::from(g[goal]));
}
