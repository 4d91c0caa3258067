use crate::model::{Constraint, Objective, Variable, VariableId};

/// Solves LP relaxations for the cutting plane engine.
///
/// Every variable is implicitly bounded below by zero; constraints may bound
/// it further. Implementations must report any failure other than
/// infeasibility or unboundedness (numerical trouble, iteration limits, solver
/// errors) as `RelaxationResult::Infeasible` with a reason.
pub trait LpOracle {
    fn solve(
        &mut self,
        variables: &[Variable],
        objective: &Objective,
        constraints: &[Constraint],
    ) -> RelaxationResult;
}

impl<F> LpOracle for F
where
    F: FnMut(&[Variable], &Objective, &[Constraint]) -> RelaxationResult,
{
    fn solve(
        &mut self,
        variables: &[Variable],
        objective: &Objective,
        constraints: &[Constraint],
    ) -> RelaxationResult {
        self(variables, objective, constraints)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelaxationResult {
    Optimal(RelaxedSolution),
    Infeasible { reason: Option<String> },
    Unbounded,
}

impl RelaxationResult {
    pub fn infeasible<S: Into<String>>(reason: S) -> Self {
        RelaxationResult::Infeasible {
            reason: Some(reason.into()),
        }
    }

    pub fn status(&self) -> RelaxationStatus {
        match self {
            RelaxationResult::Optimal(..) => RelaxationStatus::Optimal,
            RelaxationResult::Infeasible { .. } => RelaxationStatus::Infeasible,
            RelaxationResult::Unbounded => RelaxationStatus::Unbounded,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelaxationStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

impl std::fmt::Display for RelaxationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RelaxationStatus::Optimal => write!(f, "optimal"),
            RelaxationStatus::Infeasible => write!(f, "infeasible"),
            RelaxationStatus::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Optimal point of a relaxation. `x` is indexed by variable id.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedSolution {
    x: Vec<f64>,
    obj: f64,
}

impl RelaxedSolution {
    pub fn new(x: Vec<f64>, obj: f64) -> Self {
        Self { x, obj }
    }

    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    #[inline]
    pub fn obj(&self) -> f64 {
        self.obj
    }

    #[inline]
    pub fn value(&self, var: VariableId) -> Option<f64> {
        self.x.get(usize::from(var)).copied()
    }
}
