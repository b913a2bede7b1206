//! Small planning models with known state spaces.
//!
//! Every builder returns a validated [`ProblemModel`]; construction failures
//! are fixture bugs, so they panic.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use planstate_kernel::model::fact::{Fact, Variable};
use planstate_kernel::model::operator::{Effect, Operator, OperatorId};
use planstate_kernel::model::problem::ProblemModel;
use planstate_kernel::registry::state_id::StateId;
use planstate_kernel::registry::state_registry::StateRegistry;
use planstate_kernel::registry::RegistryError;
use planstate_search::successor::generator::SuccessorGenerator;

/// Two variables, domains {0,1} and {0,1,2}.
///
/// `O1` requires v0=0 and sets v0=1; `O2` has no precondition and sets v1=2.
/// Initial state (0, 0).
///
/// # Panics
///
/// Never, unless the fixture itself is invalid.
#[must_use]
pub fn two_var_model() -> ProblemModel {
    ProblemModel::new(
        vec![Variable::new("v0", 2), Variable::new("v1", 3)],
        vec![
            Operator::new(
                "O1",
                vec![Fact::new(0, 0)],
                vec![Effect::unconditional(Fact::new(0, 1))],
                1,
            ),
            Operator::new("O2", vec![], vec![Effect::unconditional(Fact::new(1, 2))], 1),
        ],
        vec![0, 0],
        vec![Fact::new(0, 1), Fact::new(1, 2)],
    )
    .unwrap()
}

/// One truck (v0, domain `locations`) and `packages` packages
/// (v1.., domain `locations + 1`, where `locations` means "in the truck").
///
/// Factored with the truck as center and one leaf per package. All packages
/// start at location 0 and must reach the last location.
///
/// # Panics
///
/// Panics if `locations < 2`.
#[must_use]
pub fn logistics(packages: usize, locations: u32) -> ProblemModel {
    assert!(locations >= 2, "need at least two locations");
    let in_truck = locations;
    let mut operators = Vec::new();
    for from in 0..locations {
        for to in 0..locations {
            if from != to {
                operators.push(Operator::new(
                    format!("drive-{from}-{to}"),
                    vec![Fact::new(0, from)],
                    vec![Effect::unconditional(Fact::new(0, to))],
                    1,
                ));
            }
        }
    }
    for pkg in 1..=packages {
        for loc in 0..locations {
            operators.push(Operator::new(
                format!("load-p{pkg}-{loc}"),
                vec![Fact::new(0, loc), Fact::new(pkg, loc)],
                vec![Effect::unconditional(Fact::new(pkg, in_truck))],
                1,
            ));
            operators.push(Operator::new(
                format!("unload-p{pkg}-{loc}"),
                vec![Fact::new(0, loc), Fact::new(pkg, in_truck)],
                vec![Effect::unconditional(Fact::new(pkg, loc))],
                1,
            ));
        }
    }

    let mut variables = vec![Variable::new("truck", locations as usize)];
    variables.extend((1..=packages).map(|p| Variable::new(format!("p{p}"), locations as usize + 1)));
    let goal = (1..=packages).map(|p| Fact::new(p, locations - 1)).collect();

    ProblemModel::new(variables, operators, vec![0; packages + 1], goal)
        .unwrap()
        .with_factoring(vec![0], (1..=packages).map(|p| vec![p]).collect())
        .unwrap()
}

/// `n` binary lights in a row; `press-i` toggles light `i` and its
/// neighbours through guarded effects (`x := 1 if x = 0`, `x := 0 if x = 1`).
///
/// Correct successors require every guard to read the pre-state: evaluated
/// sequentially, the second effect would undo the first.
///
/// # Panics
///
/// Never, unless the fixture itself is invalid.
#[must_use]
pub fn lights_out(n: usize) -> ProblemModel {
    let operators = (0..n)
        .map(|i| {
            let effects = (i.saturating_sub(1)..=(i + 1).min(n - 1))
                .flat_map(|j| {
                    [
                        Effect::conditional(Fact::new(j, 1), vec![Fact::new(j, 0)]),
                        Effect::conditional(Fact::new(j, 0), vec![Fact::new(j, 1)]),
                    ]
                })
                .collect();
            Operator::new(format!("press-{i}"), vec![], effects, 1)
        })
        .collect();
    ProblemModel::new(
        (0..n).map(|i| Variable::new(format!("light{i}"), 2)).collect(),
        operators,
        vec![0; n],
        (0..n).map(|i| Fact::new(i, 1)).collect(),
    )
    .unwrap()
}

/// Reachable assignments of `model` by breadth-first search over plain value
/// vectors, without any registry or generator.
#[must_use]
pub fn brute_force_reachable(model: &ProblemModel) -> BTreeSet<Vec<u32>> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::new();
    seen.insert(model.initial_values().to_vec());
    queue.push_back(model.initial_values().to_vec());
    while let Some(state) = queue.pop_front() {
        for op in model.operators() {
            if op.is_applicable(&state) {
                let next = op.apply_to_values(&state);
                if seen.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen
}

/// Operators applicable in `values`, by scanning the whole operator list.
#[must_use]
pub fn brute_force_applicable(model: &ProblemModel, values: &[u32]) -> Vec<OperatorId> {
    model
        .operator_ids()
        .filter(|&op| model.is_applicable(op, values))
        .collect()
}

/// Look up an operator by name.
///
/// # Panics
///
/// Panics if no operator has that name.
#[must_use]
pub fn op_named(model: &ProblemModel, name: &str) -> OperatorId {
    model
        .operator_ids()
        .find(|&id| model.operator(id).name == name)
        .unwrap_or_else(|| panic!("no operator named {name}"))
}

/// Result of a breadth-first exploration through the registry.
pub struct Exploration {
    pub registry: StateRegistry,
    /// States in discovery order; the initial state comes first.
    pub order: Vec<StateId>,
    /// Every `(state, operator, successor)` edge, in expansion order.
    pub transitions: Vec<(StateId, OperatorId, StateId)>,
}

/// Breadth-first search over registered states, expanding each state with
/// `generator`. Operators are expanded in ascending id order so the edge
/// list does not depend on generator traversal order.
///
/// # Errors
///
/// Returns [`RegistryError`] if the registry cannot be built or grown.
pub fn explore(
    model: Arc<ProblemModel>,
    generator: &SuccessorGenerator,
) -> Result<Exploration, RegistryError> {
    let mut registry = StateRegistry::new(model)?;
    let initial = registry.initial_state()?;
    let mut order = vec![initial];
    let mut transitions = Vec::new();
    let mut ops = Vec::new();
    let mut next = 0;
    while next < order.len() {
        let id = order[next];
        next += 1;
        generator.generate_into(&registry.lookup(id), &mut ops);
        ops.sort_unstable();
        for &op in &ops {
            let succ = registry.successor(id, op)?;
            if succ.index() == order.len() {
                order.push(succ);
            }
            transitions.push((id, op, succ));
        }
    }
    Ok(Exploration {
        registry,
        order,
        transitions,
    })
}
