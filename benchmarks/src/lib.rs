//! Model builders shared by the benchmark suites.
//!
//! Models are generated deterministically from their parameters so runs
//! are comparable across machines.

use planstate_kernel::model::fact::{Fact, Variable};
use planstate_kernel::model::operator::{Effect, Operator};
use planstate_kernel::model::problem::ProblemModel;

/// Shape of a synthetic model.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticShape {
    pub num_vars: usize,
    pub domain_size: u32,
    pub num_operators: usize,
    /// Preconditions per operator (before dedup).
    pub preconditions: usize,
    pub effects: usize,
    pub seed: u64,
}

/// Small xorshift stream; only used to lay out benchmark models.
struct Xorshift(u64);

impl Xorshift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// A random model of the given shape. Preconditions never contradict each
/// other, so every operator is indexed.
///
/// # Panics
///
/// Panics if the shape yields an invalid model (zero-sized domain).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn synthetic(shape: SyntheticShape) -> ProblemModel {
    let mut rng = Xorshift(shape.seed | 1);
    let fact = |rng: &mut Xorshift| {
        Fact::new(
            rng.below(shape.num_vars as u64) as usize,
            rng.below(u64::from(shape.domain_size)) as u32,
        )
    };
    let operators = (0..shape.num_operators)
        .map(|i| {
            let mut preconditions: Vec<Fact> = Vec::with_capacity(shape.preconditions);
            for _ in 0..shape.preconditions {
                let f = fact(&mut rng);
                if preconditions.iter().all(|p| p.var != f.var) {
                    preconditions.push(f);
                }
            }
            let effects = (0..shape.effects)
                .map(|_| Effect::unconditional(fact(&mut rng)))
                .collect();
            Operator::new(format!("op{i}"), preconditions, effects, 1)
        })
        .collect();
    ProblemModel::new(
        (0..shape.num_vars)
            .map(|v| Variable::new(format!("v{v}"), shape.domain_size as usize))
            .collect(),
        operators,
        vec![0; shape.num_vars],
        vec![],
    )
    .expect("synthetic model")
}

/// Truck-and-packages logistics with the truck as center and one leaf per
/// package.
///
/// # Panics
///
/// Panics if `locations < 2`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn logistics(packages: usize, locations: u32) -> ProblemModel {
    assert!(locations >= 2, "need at least two locations");
    let in_truck = locations;
    let mut operators = Vec::new();
    for from in 0..locations {
        for to in (0..locations).filter(|&to| to != from) {
            operators.push(Operator::new(
                format!("drive-{from}-{to}"),
                vec![Fact::new(0, from)],
                vec![Effect::unconditional(Fact::new(0, to))],
                1,
            ));
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
    ProblemModel::new(variables, operators, vec![0; packages + 1], vec![])
        .expect("logistics model")
        .with_factoring(vec![0], (1..=packages).map(|p| vec![p]).collect())
        .expect("logistics factoring")
}
