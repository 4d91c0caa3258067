#![allow(non_snake_case)]

use crate::error::{FloorCutError, FloorCutResult};
use crate::model::{Constraint, ConstraintOp, Direction, Objective, Variable, VariableId};
use crate::util::EPS;

use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Lower(f64),
    TwoSided(f64, f64),
    Fixed(f64),
}

impl Bound {
    fn from_range(lb: f64, ub: f64) -> Self {
        if ub.is_infinite() {
            Bound::Lower(lb)
        } else if ub - lb <= EPS {
            Bound::Fixed(lb)
        } else {
            Bound::TwoSided(lb, ub)
        }
    }

    #[inline]
    pub fn lower(&self) -> f64 {
        match *self {
            Bound::Lower(lb) | Bound::TwoSided(lb, ..) | Bound::Fixed(lb) => lb,
        }
    }

    #[inline]
    pub fn upper(&self) -> f64 {
        match *self {
            Bound::Lower(..) => f64::INFINITY,
            Bound::TwoSided(.., ub) | Bound::Fixed(ub) => ub,
        }
    }
}

/// `min cᵀx` subject to `Ax = b` and the bounds, built from a model's
/// objective and constraints.
///
/// Columns are the model variables (in declaration order) followed by one
/// slack per inequality row. Constraints on a single variable become bounds
/// rather than rows, so cuts never grow the matrix.
#[derive(Debug, Clone)]
pub struct StandardForm {
    pub c: nalgebra::DVector<f64>,
    pub A: nalgebra::DMatrix<f64>,
    pub b: nalgebra::DVector<f64>,
    pub bounds: Vec<Bound>,
    num_vars: usize,
}

impl StandardForm {
    /// Fails with `FloorCutError::Infeasible` if the bounds or a constraint
    /// without variables already rule out every point.
    pub fn new(
        variables: &[Variable],
        objective: &Objective,
        constraints: &[Constraint],
    ) -> FloorCutResult<StandardForm> {
        let n = variables.len();
        let mut lb = vec![0f64; n];
        let mut ub = vec![f64::INFINITY; n];
        let mut rows = Vec::with_capacity(constraints.len());

        for constraint in constraints {
            let rhs = constraint.rhs - constraint.lhs.constant();
            let mut terms = constraint.lhs.terms();

            match (terms.next(), terms.next()) {
                (None, _) => {
                    let holds = match constraint.op {
                        ConstraintOp::Lte => 0. <= rhs + EPS,
                        ConstraintOp::Eq => rhs.abs() < EPS,
                        ConstraintOp::Gte => 0. >= rhs - EPS,
                    };

                    if !holds {
                        return Err(infeasible(format!(
                            "{} reduces to 0 {} {}",
                            constraint.label, constraint.op, rhs
                        )));
                    }
                }

                (Some((var, coeff)), None) => {
                    let i = column(var, n)?;
                    let value = rhs / coeff;

                    let op = match (constraint.op, coeff < 0.) {
                        (ConstraintOp::Lte, true) => ConstraintOp::Gte,
                        (ConstraintOp::Gte, true) => ConstraintOp::Lte,
                        (op, _) => op,
                    };

                    if op != ConstraintOp::Gte {
                        ub[i] = ub[i].min(value);
                    }

                    if op != ConstraintOp::Lte {
                        lb[i] = lb[i].max(value);
                    }
                }

                _ => rows.push((constraint, rhs)),
            }
        }

        let num_slack_vars = rows
            .iter()
            .filter(|(constraint, _rhs)| constraint.op != ConstraintOp::Eq)
            .count();

        let m = rows.len();
        let total_vars = n + num_slack_vars;

        let mut c = nalgebra::DVector::zeros(total_vars);
        let mut A = nalgebra::DMatrix::zeros(m, total_vars);
        let mut b = nalgebra::DVector::zeros(m);

        //slack variables are only bounded below
        let mut bounds = vec![Bound::Lower(0.); total_vars];

        for (i, var) in variables.iter().enumerate() {
            if lb[i] > ub[i] + EPS {
                return Err(infeasible(format!(
                    "bounds on {} conflict: {} > {}",
                    var, lb[i], ub[i]
                )));
            }

            bounds[i] = Bound::from_range(lb[i], ub[i]);
        }

        let sign = match objective.direction {
            Direction::Minimize => 1.,
            Direction::Maximize => -1.,
        };

        for (var, coeff) in objective.expr.terms() {
            c[column(var, n)?] = sign * coeff;
        }

        let mut cur_slack_col = n;

        for (i, (constraint, rhs)) in rows.iter().enumerate() {
            b[i] = *rhs;

            for (var, coeff) in constraint.lhs.terms() {
                A[(i, column(var, n)?)] = coeff;
            }

            if let Some(slack_coeff) = match constraint.op {
                ConstraintOp::Lte => Some(1.),
                ConstraintOp::Eq => None,
                ConstraintOp::Gte => Some(-1.),
            } {
                A[(i, cur_slack_col)] = slack_coeff;
                cur_slack_col += 1;
            }
        }

        debug_assert_eq!(cur_slack_col, total_vars);

        debug!(
            "standard form has {} rows and {} columns ({} constraints folded into bounds)",
            m,
            total_vars,
            constraints.len() - m
        );

        trace!("bounds: {:?}", bounds);

        Ok(StandardForm {
            c,
            A,
            b,
            bounds,
            num_vars: n,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.A.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.A.ncols()
    }

    /// Number of model variables, which occupy the leading columns.
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[inline]
    pub fn obj(&self, x: &nalgebra::DVector<f64>) -> f64 {
        self.c.dot(x)
    }
}

fn column(var: VariableId, n: usize) -> FloorCutResult<usize> {
    let i = usize::from(var);

    if i < n {
        Ok(i)
    } else {
        Err(FloorCutError::UnknownVariable(var.to_string()))
    }
}

fn infeasible(reason: String) -> FloorCutError {
    FloorCutError::Infeasible {
        reason: Some(reason),
    }
}

#[derive(Debug, Clone)]
pub struct Point {
    pub x: nalgebra::DVector<f64>,
    pub N: Vec<Nonbasic>,
    pub B: Vec<Basic>,
}

#[derive(Debug, Clone, Copy)]
pub struct Basic {
    pub index: usize,
}

impl Basic {
    #[inline]
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Nonbasic {
    pub index: usize,
    pub bound: NonbasicBound,
}

impl Nonbasic {
    #[inline]
    pub fn new(index: usize, bound: NonbasicBound) -> Self {
        Self { index, bound }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonbasicBound {
    Lower,
    Upper,
}
