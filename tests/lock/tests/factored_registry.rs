//! Decoupled exploration of the logistics model.
//!
//! Center and leaf spaces are explored separately through the factored
//! registry and leaf generators; recombined with `joint_values`, every
//! transition must match the global registry's.

use std::collections::VecDeque;
use std::sync::Arc;

use lock_tests::fixtures::{brute_force_applicable, logistics};
use lock_tests::init_tracing;
use planstate_kernel::model::factoring::{FactorId, LeafFactorId};
use planstate_kernel::model::fact::StateValues;
use planstate_kernel::model::problem::ProblemModel;
use planstate_kernel::registry::factored::{FactoredRegistry, LeafStateId};
use planstate_kernel::registry::state_registry::StateRegistry;
use planstate_kernel::registry::RegistryConfig;
use planstate_search::successor::generator::SuccessorGenerator;
use planstate_search::successor::leaf::LeafOperatorScope;
use planstate_search::successor::GeneratorConfig;

const LOCATIONS: u32 = 3;
const PACKAGES: usize = 2;

fn leaf_generator(model: &ProblemModel, leaf: LeafFactorId) -> SuccessorGenerator {
    SuccessorGenerator::for_leaf(
        model,
        leaf,
        LeafOperatorScope::AffectingLeaf,
        GeneratorConfig::default(),
    )
    .unwrap()
}

/// All leaf states reachable from the leaf's initial state, ignoring
/// preconditions on other factors.
fn explore_leaf(
    registry: &mut FactoredRegistry,
    generator: &SuccessorGenerator,
    leaf: LeafFactorId,
) -> Vec<LeafStateId> {
    let initial = registry.initial_leaf(leaf).unwrap();
    let mut seen = vec![initial];
    let mut queue = VecDeque::from([initial]);
    while let Some(state) = queue.pop_front() {
        let ops = generator.generate(&registry.lookup_leaf(state));
        for op in ops {
            let next = registry.leaf_successor(state, op).unwrap();
            if !seen.contains(&next) {
                seen.push(next);
                queue.push_back(next);
            }
        }
    }
    seen
}

#[test]
fn leaf_spaces_are_explored_independently() {
    init_tracing();
    let model = Arc::new(logistics(PACKAGES, LOCATIONS));
    let mut registry = FactoredRegistry::new(Arc::clone(&model), RegistryConfig::default()).unwrap();
    let factoring = model.factoring().unwrap().clone();

    for leaf in factoring.leaf_ids() {
        let generator = leaf_generator(&model, leaf);
        let states = explore_leaf(&mut registry, &generator, leaf);
        // At every location plus in the truck.
        assert_eq!(states.len(), LOCATIONS as usize + 1);
        assert_eq!(registry.leaf_size(leaf), states.len());
    }
    // Leaf exploration never touches the center pool.
    assert_eq!(registry.center_size(), 0);
    registry.initial_center().unwrap();
    assert_eq!(registry.center_size(), 1);
    registry.log_statistics();
}

#[test]
fn recombined_transitions_match_the_global_registry() {
    init_tracing();
    let model = Arc::new(logistics(PACKAGES, LOCATIONS));
    let factoring = model.factoring().unwrap().clone();
    let mut factored =
        FactoredRegistry::new(Arc::clone(&model), RegistryConfig::default()).unwrap();
    let mut global = StateRegistry::new(Arc::clone(&model)).unwrap();

    let leaf_ids: Vec<LeafFactorId> = factoring.leaf_ids().collect();
    let generators: Vec<SuccessorGenerator> =
        leaf_ids.iter().map(|&leaf| leaf_generator(&model, leaf)).collect();
    let leaf_states: Vec<Vec<LeafStateId>> = leaf_ids
        .iter()
        .zip(&generators)
        .map(|(&leaf, generator)| explore_leaf(&mut factored, generator, leaf))
        .collect();
    let centers: Vec<_> = (0..LOCATIONS)
        .map(|truck| factored.center_state(&[truck]).unwrap())
        .collect();

    let mut checked = 0;
    for &center in &centers {
        for &a in &leaf_states[0] {
            for &b in &leaf_states[1] {
                let combo = [a, b];
                let values = factored.joint_values(center, &combo);
                let id = global.register_values(&values).unwrap();
                assert_eq!(global.lookup(id).values(), values);

                for op in brute_force_applicable(&model, &values) {
                    let succ = global.successor(id, op).unwrap();
                    let expected = global.lookup(succ).values();
                    let operator = model.operator(op);

                    let mut next_center = center;
                    let mut next_leaves = combo;
                    for effect in &operator.effects {
                        match factoring.factor_of(effect.fact.var) {
                            FactorId::Center => {
                                next_center = factored.center_successor(center, op).unwrap();
                            }
                            FactorId::Leaf(leaf) => {
                                let slot = leaf.index();
                                next_leaves[slot] =
                                    factored.leaf_successor(combo[slot], op).unwrap();
                            }
                        }
                    }
                    assert_eq!(
                        factored.joint_values(next_center, &next_leaves),
                        expected,
                        "{} from {values:?}",
                        operator.name
                    );
                    checked += 1;
                }
            }
        }
    }
    assert!(checked > 0);
    // Recombination never creates leaf states beyond the explored ones.
    for (leaf, states) in leaf_ids.iter().zip(&leaf_states) {
        assert_eq!(factored.leaf_size(*leaf), states.len());
    }
}

#[test]
fn leaf_generators_agree_with_global_applicability() {
    let model = logistics(PACKAGES, LOCATIONS);
    let factoring = model.factoring().unwrap();
    for leaf in factoring.leaf_ids() {
        let generator = leaf_generator(&model, leaf);
        let vars = factoring.leaf(leaf);
        for truck in 0..LOCATIONS {
            for pkg in 0..=LOCATIONS {
                let mut values = model.initial_values().to_vec();
                values[0] = truck;
                values[vars[0]] = pkg;
                let local = vec![pkg];

                // Leaf-local candidates, filtered by the center precondition.
                let mut candidates: Vec<_> = generator
                    .generate(&local)
                    .into_iter()
                    .filter(|&op| {
                        model
                            .operator(op)
                            .preconditions
                            .iter()
                            .filter(|f| factoring.factor_of(f.var) == FactorId::Center)
                            .all(|&f| values.satisfies(f))
                    })
                    .collect();
                candidates.sort_unstable();

                let expected: Vec<_> = brute_force_applicable(&model, &values)
                    .into_iter()
                    .filter(|&op| {
                        model
                            .operator(op)
                            .effects
                            .iter()
                            .any(|e| factoring.factor_of(e.fact.var) == FactorId::Leaf(leaf))
                    })
                    .collect();
                assert_eq!(candidates, expected);
            }
        }
    }
}
