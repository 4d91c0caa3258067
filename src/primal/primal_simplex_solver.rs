#![allow(non_snake_case)]

use super::primal_problem::{PrimalPhase1, PrimalPhase2, StandardizedProblem};
use crate::error::{FloorCutError, FloorCutResult};
use crate::standard_form::{Bound, NonbasicBound, Point, StandardForm};
use crate::util::{EPS, FEAS_TOL, ITER_WIDTH};

use log::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    Optimal,
    Unbounded,
    MaxIter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult {
    Optimal(nalgebra::DVector<f64>),
    Infeasible,
    Unbounded,
    MaxIter { phase: u8 },
}

/// Two-phase primal simplex method with bounded variables.
///
/// Entering and leaving variables are chosen by the smallest subscript rule,
/// which rules out cycling on degenerate problems.
#[derive(Debug, Clone)]
pub struct PrimalSimplexSolver {
    max_iter: u64,
}

impl std::default::Default for PrimalSimplexSolver {
    fn default() -> Self {
        Self { max_iter: 1000 }
    }
}

impl PrimalSimplexSolver {
    pub fn new(max_iter: Option<u64>) -> Self {
        Self {
            max_iter: max_iter.unwrap_or(u64::MAX),
        }
    }

    pub fn solve(&self, std_form: StandardForm) -> FloorCutResult<SolverResult> {
        if std_form.rows() == 0 {
            //trivial problem, and would run into errors if we proceed
            let mut x = nalgebra::DVector::zeros(std_form.cols());

            return Ok(match solve_trivial_problem(&std_form, &mut x) {
                SolutionStatus::Optimal => SolverResult::Optimal(x),
                _ => SolverResult::Unbounded,
            });
        }

        let mut phase_1: PrimalPhase1 = std_form.into();

        info!("PRIMAL PHASE 1");

        let mut phase_2: PrimalPhase2 = match self.solve_with_initial(&mut phase_1)? {
            SolutionStatus::Optimal => {
                let obj = phase_1.obj();

                if obj < FEAS_TOL {
                    info!("found feasible point");
                    phase_1.into()
                } else {
                    info!("problem is infeasible, phase 1 objective is {}", obj);
                    return Ok(SolverResult::Infeasible);
                }
            }

            SolutionStatus::Unbounded => {
                return Err(FloorCutError::Numerical(
                    "primal phase 1 should never be unbounded".to_string(),
                ))
            }

            SolutionStatus::MaxIter => {
                info!("reached maximum iterations");
                return Ok(SolverResult::MaxIter { phase: 1 });
            }
        };

        info!("PRIMAL PHASE 2");

        Ok(match self.solve_with_initial(&mut phase_2)? {
            SolutionStatus::Optimal => {
                info!(
                    "found optimal point with objective value {}",
                    phase_2.obj()
                );

                SolverResult::Optimal(phase_2.point.x)
            }

            SolutionStatus::Unbounded => {
                info!("problem is unbounded");
                SolverResult::Unbounded
            }

            SolutionStatus::MaxIter => {
                info!("reached maximum iterations");
                SolverResult::MaxIter { phase: 2 }
            }
        })
    }

    pub fn solve_with_initial<P: StandardizedProblem>(
        &self,
        prob: &mut P,
    ) -> FloorCutResult<SolutionStatus> {
        let (std_form, pt) = prob.unpack();
        let Point { x, N, B } = pt;

        debug!(
            "solving problem with {} variables and {} constraints",
            std_form.cols(),
            std_form.rows()
        );

        trace!("c: {}", std_form.c);
        trace!("A: {}", std_form.A);
        trace!("b: {}", std_form.b);

        if B.len() != std_form.rows() {
            return Err(FloorCutError::Numerical(format!(
                "invalid B, has {} elements but {} expected",
                B.len(),
                std_form.rows(),
            )));
        }

        let m = B.len();

        debug!("Iteration  |  Objective");

        let mut iter = 1u64;

        loop {
            if iter > self.max_iter {
                debug!("reached max iterations");
                return Ok(SolutionStatus::MaxIter);
            }

            let B_cols: Vec<_> = B.iter().map(|i| std_form.A.column(i.index)).collect();
            let A_B = nalgebra::DMatrix::from_columns(&B_cols);
            let lu_decomp = A_B.clone().lu();

            if lu_decomp.u().diagonal().iter().any(|d| d.abs() < EPS) {
                return Err(FloorCutError::Numerical(
                    "invalid B, A_B is not invertible".to_string(),
                ));
            }

            //recompute the basic values from the nonbasic ones so errors do not accumulate
            let mut rhs = std_form.b.clone();

            for nonbasic in N.iter() {
                rhs.axpy(-x[nonbasic.index], &std_form.A.column(nonbasic.index), 1.);
            }

            let x_B = lu_decomp
                .solve(&rhs)
                .ok_or_else(|| FloorCutError::Numerical("failed to solve for x_B".to_string()))?;

            for (basic, &x_i) in B.iter().zip(x_B.iter()) {
                x[basic.index] = x_i;
            }

            debug!("{:it$}  |  {:.8E}", iter, std_form.obj(x), it = ITER_WIDTH);

            iter += 1;

            let c_B = nalgebra::DVector::from_iterator(m, B.iter().map(|i| std_form.c[i.index]));

            let u = A_B.transpose().lu().solve(&c_B).ok_or_else(|| {
                FloorCutError::Numerical("failed to solve for the duals".to_string())
            })?;

            trace!("x: {}", x);
            trace!("B: {:?}", B);
            trace!("N: {:?}", N);

            //this logic breaks cycles (smallest subscript rule)
            let entering = N
                .iter()
                .enumerate()
                .filter(|(_pos, nonbasic)| {
                    if matches!(std_form.bounds[nonbasic.index], Bound::Fixed(..)) {
                        return false;
                    }

                    let r_i = std_form.c[nonbasic.index] - std_form.A.column(nonbasic.index).dot(&u);

                    match nonbasic.bound {
                        NonbasicBound::Lower => r_i < -EPS,
                        NonbasicBound::Upper => r_i > EPS,
                    }
                })
                .min_by_key(|(_pos, nonbasic)| nonbasic.index)
                .map(|(pos, _nonbasic)| pos);

            let entering = match entering {
                Some(pos) => pos,
                None => return Ok(SolutionStatus::Optimal),
            };

            let q = N[entering].index;
            let nonbasic_at_lower = N[entering].bound == NonbasicBound::Lower;

            //change of the basic variables per unit step of the entering variable
            let mut d = lu_decomp.solve(&std_form.A.column(q)).ok_or_else(|| {
                FloorCutError::Numerical("failed to solve for the direction".to_string())
            })?;

            if nonbasic_at_lower {
                d = -d;
            }

            trace!("entering: {}, d: {}", q, d);

            let q_bound = std_form.bounds[q];
            let mut lambda = q_bound.upper() - q_bound.lower();
            let mut leaving: Option<(usize, NonbasicBound)> = None;

            for (i, (basic, &d_i)) in B.iter().zip(d.iter()).enumerate() {
                if d_i.abs() < EPS {
                    continue;
                }

                let bound = std_form.bounds[basic.index];

                let (limit, hit) = if d_i > 0. {
                    (bound.upper(), NonbasicBound::Upper)
                } else {
                    (bound.lower(), NonbasicBound::Lower)
                };

                let lambda_i = ((limit - x[basic.index]) / d_i).max(0.);

                let replaces = if lambda_i < lambda - EPS {
                    true
                } else if (lambda_i - lambda).abs() <= EPS {
                    //this logic breaks cycles (smallest subscript rule)
                    match leaving {
                        Some((j, _)) => basic.index < B[j].index,
                        None => true,
                    }
                } else {
                    false
                };

                if replaces {
                    lambda = lambda_i;
                    leaving = Some((i, hit));
                }
            }

            if lambda.is_infinite() {
                return Ok(SolutionStatus::Unbounded);
            }

            for (basic, &d_i) in B.iter().zip(d.iter()) {
                x[basic.index] += lambda * d_i;
            }

            match leaving {
                Some((i, hit)) => {
                    let leaving_index = B[i].index;
                    let bound = std_form.bounds[leaving_index];

                    x[q] += if nonbasic_at_lower { lambda } else { -lambda };

                    x[leaving_index] = match hit {
                        NonbasicBound::Lower => bound.lower(),
                        NonbasicBound::Upper => bound.upper(),
                    };

                    trace!("pivot: {} enters, {} leaves", q, leaving_index);

                    //basic variable becomes nonbasic, and vice versa
                    B[i].index = q;
                    N[entering].index = leaving_index;
                    N[entering].bound = hit;
                }

                None => {
                    //nonbasic went from lower to upper bound, or vice versa
                    let nonbasic = &mut N[entering];

                    if nonbasic_at_lower {
                        nonbasic.bound = NonbasicBound::Upper;
                        x[q] = q_bound.upper();
                    } else {
                        nonbasic.bound = NonbasicBound::Lower;
                        x[q] = q_bound.lower();
                    }

                    trace!("bound flip: {}", q);
                }
            }
        }
    }
}

/// Problems without rows: every variable sits at whichever bound minimizes
/// its objective term.
fn solve_trivial_problem(std_form: &StandardForm, x: &mut nalgebra::DVector<f64>) -> SolutionStatus {
    for (x_i, (&c_i, bound)) in x.iter_mut().zip(std_form.c.iter().zip(&std_form.bounds)) {
        if c_i < 0. {
            let ub = bound.upper();

            if ub.is_infinite() {
                return SolutionStatus::Unbounded;
            }

            *x_i = ub;
        } else {
            *x_i = bound.lower();
        }
    }

    SolutionStatus::Optimal
}
