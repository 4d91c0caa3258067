mod cutting_plane;
mod error;
mod expression;
pub mod model;
mod oracle;
mod parse_expr;
mod primal;
pub mod solver;
mod standard_form;
mod util;

pub use crate::cutting_plane::{
    is_integral, CuttingPlaneEngine, EngineConfig, IntegerSolution, Phase, SolveReport,
    Termination, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
pub use crate::error::{FloorCutError, FloorCutResult};
pub use crate::expression::LinearExpression;
pub use crate::model::{
    Constraint, ConstraintOp, Direction, Model, Objective, Variable, VariableId,
};
pub use crate::oracle::{LpOracle, RelaxationResult, RelaxationStatus, RelaxedSolution};
pub use crate::parse_expr::{parse_constraint, parse_expression, parse_number};
pub use crate::solver::SimplexOracle;
