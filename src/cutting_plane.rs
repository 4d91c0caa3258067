//! Floor-cut refinement of LP relaxations.
//!
//! Each round solves the relaxation of the model, and if some variable is
//! fractional, appends `x <= floor(value)` for the first such variable in
//! declaration order. This is a heuristic, not a Gomory cut: it has no
//! convergence guarantee and can cut off the true integer optimum. For
//! `max 5*x1 + 4*x2` subject to `6*x1 + 4*x2 <= 24` and `x1 + 2*x2 <= 6` it
//! ends at `(3, 1)` with objective 19, although `(4, 0)` reaches 20.
//! Non-convergence surfaces as `Phase::Stalled` or `Phase::IterationLimit`.

use crate::error::{FloorCutError, FloorCutResult};
use crate::model::{Model, VariableId};
use crate::oracle::{LpOracle, RelaxationResult, RelaxationStatus, RelaxedSolution};

use log::{debug, info, warn};

pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Absolute distance to the nearest integer within which a value counts
    /// as integral.
    pub tolerance: f64,

    /// Maximum number of relaxations solved in one session.
    pub max_iterations: u64,
}

impl std::default::Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl EngineConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn validate(&self) -> FloorCutResult<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0. {
            return Err(FloorCutError::InvalidConfig(format!(
                "tolerance must be finite and nonnegative, got {}",
                self.tolerance
            )));
        }

        if self.max_iterations == 0 {
            return Err(FloorCutError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Building,
    Relaxing,
    Checking,
    Cutting,
    IntegerFound,
    Infeasible,
    Stalled,
    IterationLimit,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Phase::IntegerFound | Phase::Infeasible | Phase::Stalled | Phase::IterationLimit
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Phase::Building => "BUILDING",
            Phase::Relaxing => "RELAXING",
            Phase::Checking => "CHECKING",
            Phase::Cutting => "CUTTING",
            Phase::IntegerFound => "INTEGER_FOUND",
            Phase::Infeasible => "INFEASIBLE",
            Phase::Stalled => "STALLED",
            Phase::IterationLimit => "ITERATION_LIMIT",
        };

        write!(f, "{}", name)
    }
}

/// Integer assignment found by the engine. `x` holds the relaxation values
/// rounded to the nearest integer and `obj` is the objective evaluated at `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerSolution {
    x: Vec<f64>,
    obj: f64,
}

impl IntegerSolution {
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

#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    IntegerFound(IntegerSolution),

    /// `status` is `Infeasible` or `Unbounded`, as reported by the oracle.
    Infeasible {
        status: RelaxationStatus,
        reason: Option<String>,
    },

    Stalled {
        last: RelaxedSolution,
    },

    /// `last` is the most recent relaxation, which was still fractional.
    IterationLimit {
        last: Option<RelaxedSolution>,
    },
}

impl Termination {
    pub fn phase(&self) -> Phase {
        match self {
            Termination::IntegerFound(..) => Phase::IntegerFound,
            Termination::Infeasible { .. } => Phase::Infeasible,
            Termination::Stalled { .. } => Phase::Stalled,
            Termination::IterationLimit { .. } => Phase::IterationLimit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub termination: Termination,

    /// Number of relaxations solved.
    pub iterations: u64,

    /// Labels of the cuts appended to the model, in order.
    pub cuts: Vec<String>,

    /// Every phase the engine passed through, starting with `Building`.
    pub phases: Vec<Phase>,
}

impl SolveReport {
    #[inline]
    pub fn phase(&self) -> Phase {
        self.termination.phase()
    }

    pub fn into_result(self) -> FloorCutResult<IntegerSolution> {
        let iterations = self.iterations;

        match self.termination {
            Termination::IntegerFound(sol) => Ok(sol),

            Termination::Infeasible {
                status: RelaxationStatus::Unbounded,
                ..
            } => Err(FloorCutError::Unbounded),

            Termination::Infeasible { reason, .. } => Err(FloorCutError::Infeasible { reason }),
            Termination::Stalled { .. } => Err(FloorCutError::Stalled { iterations }),
            Termination::IterationLimit { .. } => Err(FloorCutError::IterationLimit { iterations }),
        }
    }
}

/// True iff `value` is within `tolerance` of the nearest integer.
#[inline]
pub fn is_integral(value: f64, tolerance: f64) -> bool {
    (value - value.round()).abs() <= tolerance
}

pub struct CuttingPlaneEngine<O> {
    oracle: O,
    config: EngineConfig,
    phase: Phase,
}

impl<O: LpOracle> CuttingPlaneEngine<O> {
    pub fn new(oracle: O, config: EngineConfig) -> FloorCutResult<Self> {
        config.validate()?;

        Ok(Self {
            oracle,
            config,
            phase: Phase::Building,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Phase reached by the most recent session, `Building` before the first.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Runs the refinement loop on `model`, appending a cut per fractional
    /// round, until one of the terminal phases is reached.
    ///
    /// Fails only if the model has no variables or no objective; every other
    /// outcome, including infeasibility and non-convergence, is described by
    /// the returned report.
    pub fn solve(&mut self, model: &mut Model) -> FloorCutResult<SolveReport> {
        model.check_complete()?;

        self.phase = Phase::Building;
        let mut phases = vec![Phase::Building];
        let mut iterations = 0u64;
        let mut cuts = Vec::new();
        let mut last: Option<RelaxedSolution> = None;

        info!(
            "solving {} variables and {} constraints, at most {} relaxations",
            model.variables().len(),
            model.constraints().len(),
            self.config.max_iterations
        );

        let termination = loop {
            if iterations >= self.config.max_iterations {
                warn!(
                    "no integer solution after {} relaxations, the floor cuts did not converge",
                    iterations
                );

                break Termination::IterationLimit { last };
            }

            self.enter(&mut phases, Phase::Relaxing);
            iterations += 1;

            let objective = model.objective().ok_or_else(|| {
                FloorCutError::IncompleteModel("define the objective first".to_string())
            })?;

            let result = self
                .oracle
                .solve(model.variables(), objective, model.constraints());

            info!("iteration {}: relaxation is {}", iterations, result.status());

            let solution = match result {
                RelaxationResult::Optimal(solution) => solution,

                RelaxationResult::Infeasible { reason } => {
                    break Termination::Infeasible {
                        status: RelaxationStatus::Infeasible,
                        reason,
                    }
                }

                RelaxationResult::Unbounded => {
                    break Termination::Infeasible {
                        status: RelaxationStatus::Unbounded,
                        reason: None,
                    }
                }
            };

            if solution.x().len() != model.variables().len() {
                break Termination::Infeasible {
                    status: RelaxationStatus::Infeasible,
                    reason: Some(format!(
                        "oracle returned {} values for {} variables",
                        solution.x().len(),
                        model.variables().len()
                    )),
                };
            }

            self.enter(&mut phases, Phase::Checking);
            debug!("relaxation objective {}, x = {:?}", solution.obj(), solution.x());

            if solution
                .x()
                .iter()
                .all(|&value| is_integral(value, self.config.tolerance))
            {
                let x: Vec<f64> = solution.x().iter().map(|value| value.round()).collect();
                let obj = objective.expr.evaluate(&x);

                info!("integer solution found with objective value {}", obj);
                break Termination::IntegerFound(IntegerSolution { x, obj });
            }

            self.enter(&mut phases, Phase::Cutting);

            let (var, value) = match select_fractional(&solution, self.config.tolerance) {
                Some(selected) => selected,

                None => {
                    warn!("no fractional variable can be cut, stopping");
                    break Termination::Stalled { last: solution };
                }
            };

            let cut = model.add_cut(var, value.floor(), iterations)?;
            info!("adding cut {}: {} <= {}", cut.label, value, cut.rhs);

            cuts.push(cut.label.clone());
            last = Some(solution);
        };

        let phase = termination.phase();
        self.enter(&mut phases, phase);

        Ok(SolveReport {
            termination,
            iterations,
            cuts,
            phases,
        })
    }

    fn enter(&mut self, phases: &mut Vec<Phase>, next: Phase) {
        debug!("{} -> {}", self.phase, next);
        self.phase = next;
        phases.push(next);
    }
}

/// First variable in declaration order whose value is finite and not
/// integral.
fn select_fractional(solution: &RelaxedSolution, tolerance: f64) -> Option<(VariableId, f64)> {
    solution
        .x()
        .iter()
        .enumerate()
        .find(|&(_i, &value)| value.is_finite() && !is_integral(value, tolerance))
        .map(|(i, &value)| (VariableId::from(i), value))
}
