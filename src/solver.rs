use crate::error::FloorCutError;
use crate::model::{Constraint, Objective, Variable};
use crate::oracle::{LpOracle, RelaxationResult, RelaxedSolution};
use crate::primal::primal_simplex_solver::{PrimalSimplexSolver, SolverResult};
use crate::standard_form::StandardForm;

use log::{debug, info};

/// LP oracle backed by the crate's own two-phase primal simplex solver.
#[derive(Debug, Clone, Default)]
pub struct SimplexOracle {
    solver: PrimalSimplexSolver,
}

impl SimplexOracle {
    /// `max_iter` caps the simplex iterations of each phase, `None` means no
    /// cap.
    pub fn new(max_iter: Option<u64>) -> Self {
        Self {
            solver: PrimalSimplexSolver::new(max_iter),
        }
    }
}

impl LpOracle for SimplexOracle {
    fn solve(
        &mut self,
        variables: &[Variable],
        objective: &Objective,
        constraints: &[Constraint],
    ) -> RelaxationResult {
        let std_form = match StandardForm::new(variables, objective, constraints) {
            Ok(std_form) => std_form,

            Err(FloorCutError::Infeasible { reason }) => {
                info!(
                    "infeasible before solving: {}",
                    reason.as_deref().unwrap_or("conflicting bounds")
                );

                return RelaxationResult::Infeasible { reason };
            }

            Err(err) => return RelaxationResult::infeasible(err.to_string()),
        };

        let num_vars = std_form.num_vars();

        match self.solver.solve(std_form) {
            Ok(SolverResult::Optimal(x)) => {
                let x: Vec<f64> = x.iter().take(num_vars).copied().collect();
                let obj = objective.expr.evaluate(&x);
                debug!("relaxation optimum {} at {:?}", obj, x);
                RelaxationResult::Optimal(RelaxedSolution::new(x, obj))
            }

            Ok(SolverResult::Infeasible) => RelaxationResult::Infeasible { reason: None },
            Ok(SolverResult::Unbounded) => RelaxationResult::Unbounded,

            Ok(SolverResult::MaxIter { phase }) => RelaxationResult::infeasible(format!(
                "simplex phase {} reached its iteration limit",
                phase
            )),

            Err(err) => RelaxationResult::infeasible(err.to_string()),
        }
    }
}
