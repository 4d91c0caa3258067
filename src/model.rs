use crate::error::{FloorCutError, FloorCutResult};
use crate::expression::LinearExpression;
use crate::parse_expr::{is_identifier, parse_constraint, parse_expression};
use crate::util::EPS;

use log::debug;

use std::collections::{HashMap, HashSet};

const LTE_STR: &str = "\u{2264}";
const EQ_STR: &str = "\u{003D}";
const GTE_STR: &str = "\u{2265}";

const CONSTRAINT_LABEL_PREFIX: &str = "Constraint";
const CUT_LABEL_PREFIX: &str = "Cut_Floor";

/// Decision variables, an objective and an ordered list of constraints.
///
/// Every variable is implicitly bounded below by zero. All mutating methods
/// validate their input first, so a rejected call leaves the model unchanged.
#[derive(Debug, Clone, Default)]
pub struct Model {
    variables: Vec<Variable>,
    objective: Option<Objective>,
    constraints: Vec<Constraint>,
    var_ids: HashMap<String, VariableId>,
    labels: HashSet<String>,
}

impl Model {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_variable(&mut self, name: &str) -> FloorCutResult<VariableId> {
        let name = name.trim();

        if !is_identifier(name) {
            return Err(FloorCutError::InvalidVariableName(name.to_string()));
        }

        if self.var_ids.contains_key(name) {
            return Err(FloorCutError::DuplicateVariable(name.to_string()));
        }

        let id = VariableId(self.variables.len());
        self.variables.push(Variable::new(id, name.to_string()));
        self.var_ids.insert(name.to_string(), id);

        debug!("added variable {}", name);
        Ok(id)
    }

    #[inline]
    pub fn variables(&self) -> &[Variable] {
        self.variables.as_slice()
    }

    #[inline]
    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    #[inline]
    pub fn variable_id(&self, name: &str) -> Option<VariableId> {
        self.var_ids.get(name).copied()
    }

    /// Parses `text` against the variables declared so far.
    pub fn parse_expression(&self, text: &str) -> FloorCutResult<LinearExpression> {
        parse_expression(text, self)
    }

    pub fn set_objective(&mut self, direction: Direction, text: &str) -> FloorCutResult<()> {
        if self.objective.is_some() {
            return Err(FloorCutError::ObjectiveAlreadySet);
        }

        let expr = self.parse_expression(text)?;
        self.set_objective_expr(direction, expr)
    }

    pub fn set_objective_expr(
        &mut self,
        direction: Direction,
        expr: LinearExpression,
    ) -> FloorCutResult<()> {
        if self.objective.is_some() {
            return Err(FloorCutError::ObjectiveAlreadySet);
        }

        if self.variables.is_empty() {
            return Err(FloorCutError::IncompleteModel(
                "add decision variables before the objective".to_string(),
            ));
        }

        self.check_vars(&expr)?;

        debug!("objective set to {} {}", direction, expr.render(&self.variables));
        self.objective = Some(Objective { direction, expr });
        Ok(())
    }

    #[inline]
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Parses and appends a constraint such as `6*x1 + 4*x2 <= 24`, labelled
    /// `Constraint_<n>`.
    pub fn add_constraint(&mut self, text: &str) -> FloorCutResult<&Constraint> {
        self.require_objective()?;
        let (lhs, op, rhs) = parse_constraint(text, self)?;
        self.add_constraint_expr(lhs, op, rhs, None)
    }

    pub fn add_labeled_constraint(&mut self, text: &str, label: &str) -> FloorCutResult<&Constraint> {
        self.require_objective()?;
        let (lhs, op, rhs) = parse_constraint(text, self)?;
        self.add_constraint_expr(lhs, op, rhs, Some(label.to_string()))
    }

    /// Appends a constraint built programmatically. Without a label, one of
    /// the form `Constraint_<n>` is generated.
    pub fn add_constraint_expr(
        &mut self,
        lhs: LinearExpression,
        op: ConstraintOp,
        rhs: f64,
        label: Option<String>,
    ) -> FloorCutResult<&Constraint> {
        self.require_objective()?;
        self.check_vars(&lhs)?;

        if !rhs.is_finite() {
            return Err(FloorCutError::syntax(
                &rhs.to_string(),
                "right-hand side must be a finite number",
            ));
        }

        let label = match label {
            Some(label) => {
                if self.labels.contains(&label) {
                    return Err(FloorCutError::DuplicateLabel(label));
                }

                label
            }

            None => self.unique_label(format!(
                "{}_{}",
                CONSTRAINT_LABEL_PREFIX,
                self.constraints.iter().filter(|constraint| !constraint.cut).count() + 1
            )),
        };

        Ok(self.push_constraint(Constraint {
            label,
            lhs,
            op,
            rhs,
            cut: false,
        }))
    }

    /// Appends the cut `var <= bound`, labelled `Cut_Floor_<name>_<iteration>`
    /// (with a numeric suffix if that label is already taken).
    pub(crate) fn add_cut(
        &mut self,
        var: VariableId,
        bound: f64,
        iteration: u64,
    ) -> FloorCutResult<&Constraint> {
        let name = match self.variable(var) {
            Some(var) => var.name.clone(),
            None => return Err(FloorCutError::UnknownVariable(var.to_string())),
        };

        let label = self.unique_label(format!("{}_{}_{}", CUT_LABEL_PREFIX, name, iteration));

        Ok(self.push_constraint(Constraint {
            label,
            lhs: LinearExpression::term(var, 1.),
            op: ConstraintOp::Lte,
            rhs: bound,
            cut: true,
        }))
    }

    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        self.constraints.as_slice()
    }

    pub fn cuts(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|constraint| constraint.cut)
    }

    /// Ok if the model can be handed to the cutting plane engine.
    pub fn check_complete(&self) -> FloorCutResult<()> {
        if self.variables.is_empty() {
            return Err(FloorCutError::IncompleteModel(
                "the model has no decision variables".to_string(),
            ));
        }

        self.require_objective()
    }

    /// Checks the implicit lower bounds and every constraint at `x`, which is
    /// indexed by variable id.
    pub fn is_feasible(&self, x: &[f64]) -> bool {
        if x.len() != self.variables.len() {
            return false;
        }

        x.iter().all(|&val| val >= -EPS)
            && self
                .constraints
                .iter()
                .all(|constraint| constraint.is_feasible(x))
    }

    fn require_objective(&self) -> FloorCutResult<()> {
        match self.objective {
            Some(_) => Ok(()),
            None => Err(FloorCutError::IncompleteModel(
                "define the objective first".to_string(),
            )),
        }
    }

    fn check_vars(&self, expr: &LinearExpression) -> FloorCutResult<()> {
        match expr.vars().find(|var| var.0 >= self.variables.len()) {
            Some(var) => Err(FloorCutError::UnknownVariable(var.to_string())),
            None => Ok(()),
        }
    }

    fn unique_label(&self, base: String) -> String {
        if !self.labels.contains(&base) {
            return base;
        }

        let mut k = 2u64;

        loop {
            let label = format!("{}_{}", base, k);

            if !self.labels.contains(&label) {
                return label;
            }

            k += 1;
        }
    }

    fn push_constraint(&mut self, constraint: Constraint) -> &Constraint {
        debug!(
            "added {}: {} {} {}",
            constraint.label,
            constraint.lhs.render(&self.variables),
            constraint.op,
            constraint.rhs
        );

        self.labels.insert(constraint.label.clone());
        self.constraints.push(constraint);
        &self.constraints[self.constraints.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
}

impl Variable {
    fn new(id: VariableId, name: String) -> Self {
        Self { id, name }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        //Model::add_variable guarantees that different variables have different ids
        self.id == other.id
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(usize);

impl std::convert::From<usize> for VariableId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl std::convert::From<VariableId> for usize {
    fn from(id: VariableId) -> Self {
        id.0
    }
}

impl std::convert::From<&VariableId> for usize {
    fn from(id: &VariableId) -> Self {
        id.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl std::str::FromStr for Direction {
    type Err = FloorCutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" | "maximize" => Ok(Direction::Maximize),
            "min" | "minimize" => Ok(Direction::Minimize),
            _ => Err(FloorCutError::InvalidDirection(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub direction: Direction,
    pub expr: LinearExpression,
}

impl Objective {
    pub fn new(direction: Direction, expr: LinearExpression) -> Self {
        Self { direction, expr }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOp {
    Lte,
    Eq,
    Gte,
}

impl ConstraintOp {
    /// The token that spells this operator in constraint text.
    pub fn token(&self) -> &'static str {
        match self {
            ConstraintOp::Lte => "<=",
            ConstraintOp::Eq => "==",
            ConstraintOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub label: String,
    pub lhs: LinearExpression,
    pub op: ConstraintOp,
    pub rhs: f64,
    cut: bool,
}

impl Constraint {
    pub fn new(label: String, lhs: LinearExpression, op: ConstraintOp, rhs: f64) -> Self {
        Self {
            label,
            lhs,
            op,
            rhs,
            cut: false,
        }
    }

    /// True for constraints appended by the cutting plane engine.
    #[inline]
    pub fn is_cut(&self) -> bool {
        self.cut
    }

    pub fn is_feasible(&self, x: &[f64]) -> bool {
        let lhs = self.lhs.evaluate(x);

        match self.op {
            ConstraintOp::Lte => lhs <= self.rhs + EPS,
            ConstraintOp::Eq => (lhs - self.rhs).abs() < EPS,
            ConstraintOp::Gte => lhs >= self.rhs - EPS,
        }
    }

    /// Renders the constraint as text accepted by `Model::add_constraint`.
    pub fn render(&self, variables: &[Variable]) -> String {
        format!(
            "{} {} {}",
            self.lhs.render(variables),
            self.op.token(),
            self.rhs
        )
    }

    fn display(&self, f: &mut std::fmt::Formatter, variables: &[Variable]) -> std::fmt::Result {
        write!(f, "{}: ", self.label)?;
        display_terms(f, &self.lhs, variables)?;
        write!(f, "{} {}", self.op, self.rhs)
    }
}

fn display_terms(
    f: &mut std::fmt::Formatter,
    expr: &LinearExpression,
    variables: &[Variable],
) -> std::fmt::Result {
    for (var_id, coeff) in expr.terms() {
        write!(
            f,
            "{} {} {} ",
            if coeff >= 0. { "+" } else { "-" },
            coeff.abs(),
            variables[var_id.0]
        )?;
    }

    if expr.constant() != 0. {
        write!(
            f,
            "{} {} ",
            if expr.constant() >= 0. { "+" } else { "-" },
            expr.constant().abs()
        )?;
    }

    Ok(())
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.objective {
            Some(objective) => {
                writeln!(f, "{}", objective.direction)?;
                display_terms(f, &objective.expr, &self.variables)?;
            }

            None => write!(f, "no objective")?,
        }

        writeln!(f, "\n\nsubject to")?;

        for constraint in &self.constraints {
            constraint.display(f, &self.variables)?;
            writeln!(f)?;
        }

        writeln!(f, "\nwith the bounds")?;

        for var in &self.variables {
            writeln!(f, "{} {} 0", var, GTE_STR)?;
        }

        Ok(())
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::fmt::Display for VariableId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "id[{}]", self.0)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Maximize => write!(f, "maximize"),
            Direction::Minimize => write!(f, "minimize"),
        }
    }
}

impl std::fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ConstraintOp::Lte => write!(f, "{}", LTE_STR),
            ConstraintOp::Eq => write!(f, "{}", EQ_STR),
            ConstraintOp::Gte => write!(f, "{}", GTE_STR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConstraintOp::*;
    use super::{Direction, Model};
    use crate::error::FloorCutError;
    use crate::expression::LinearExpression;

    fn model_with_objective() -> Model {
        let mut model = Model::new();
        model.add_variable("x1").unwrap();
        model.add_variable("x2").unwrap();
        model
            .set_objective(Direction::Maximize, "5*x1 + 4*x2")
            .unwrap();
        model
    }

    #[test]
    fn add_variable() {
        let mut model = Model::new();
        let x = model.add_variable("x").unwrap();
        assert_eq!(model.variables()[0].name, "x");
        assert_eq!(model.variable_id("x"), Some(x));
    }

    #[test]
    fn nonunique_var_names() {
        let mut model = Model::new();
        model.add_variable("x").unwrap();

        assert_eq!(
            model.add_variable("x"),
            Err(FloorCutError::DuplicateVariable("x".to_string()))
        );
        assert_eq!(model.variables().len(), 1);
    }

    #[test]
    fn invalid_var_names() {
        let mut model = Model::new();

        for name in &["", "1x", "x-y", "a b", "x*"] {
            assert!(matches!(
                model.add_variable(name),
                Err(FloorCutError::InvalidVariableName(_))
            ));
        }

        assert!(model.variables().is_empty());
        assert!(model.add_variable("_tmp_2").is_ok());
    }

    #[test]
    fn objective_requires_variables() {
        let mut model = Model::new();

        assert!(matches!(
            model.set_objective_expr(Direction::Minimize, LinearExpression::new()),
            Err(FloorCutError::IncompleteModel(_))
        ));
    }

    #[test]
    fn objective_set_once() {
        let mut model = model_with_objective();

        assert_eq!(
            model.set_objective(Direction::Minimize, "x1"),
            Err(FloorCutError::ObjectiveAlreadySet)
        );
        assert_eq!(model.objective().unwrap().direction, Direction::Maximize);
    }

    #[test]
    fn objective_unknown_variable_leaves_model_unchanged() {
        let mut model = Model::new();
        model.add_variable("x1").unwrap();

        assert_eq!(
            model.set_objective(Direction::Maximize, "x1 + y"),
            Err(FloorCutError::UnknownVariable("y".to_string()))
        );
        assert!(model.objective().is_none());
    }

    #[test]
    fn constraint_requires_objective() {
        let mut model = Model::new();
        model.add_variable("x").unwrap();

        assert!(matches!(
            model.add_constraint("x <= 1"),
            Err(FloorCutError::IncompleteModel(_))
        ));
    }

    #[test]
    fn add_constraint() {
        let mut model = model_with_objective();
        let constraint = model.add_constraint("6*x1 + 4*x2 <= 24").unwrap();

        assert_eq!(constraint.label, "Constraint_1");
        assert_eq!(constraint.op, Lte);
        assert_eq!(constraint.rhs, 24.);
        assert!(!constraint.is_cut());

        let constraint = model.add_constraint("x1 + 2*x2 >= 6").unwrap();
        assert_eq!(constraint.label, "Constraint_2");
        assert_eq!(constraint.op, Gte);
    }

    #[test]
    fn rejected_constraint_leaves_model_unchanged() {
        let mut model = model_with_objective();
        model.add_constraint("x1 <= 3").unwrap();

        assert!(model.add_constraint("3*x1 + y <= 2").is_err());
        assert!(model.add_constraint("x1 + x2").is_err());
        assert!(model.add_constraint("x1 + x2 <= x1").is_err());
        assert_eq!(model.constraints().len(), 1);
    }

    #[test]
    fn duplicate_label() {
        let mut model = model_with_objective();
        model.add_labeled_constraint("x1 <= 3", "cap").unwrap();

        assert_eq!(
            model.add_labeled_constraint("x2 <= 3", "cap").unwrap_err(),
            FloorCutError::DuplicateLabel("cap".to_string())
        );
        assert_eq!(model.constraints().len(), 1);
    }

    #[test]
    fn generated_labels_avoid_user_labels() {
        let mut model = model_with_objective();
        model.add_labeled_constraint("x1 <= 3", "Constraint_2").unwrap();

        let label = model.add_constraint("x2 <= 3").unwrap().label.clone();
        assert_eq!(label, "Constraint_2_2");
    }

    #[test]
    fn infinite_literals_are_rejected() {
        let mut model = Model::new();
        model.add_variable("x1").unwrap();

        assert!(matches!(
            model.set_objective(Direction::Maximize, "1e400*x1"),
            Err(FloorCutError::Syntax { .. })
        ));
        assert!(model.objective().is_none());

        model.set_objective(Direction::Maximize, "x1").unwrap();

        assert_eq!(
            model.add_constraint("x1 <= 1e400").unwrap_err(),
            FloorCutError::Syntax {
                fragment: "1e400".to_string(),
                message: "right-hand side must be a single finite number, not an expression"
                    .to_string(),
            }
        );
        assert!(model.constraints().is_empty());
    }

    #[test]
    fn cuts_do_not_advance_constraint_numbering() {
        let mut model = model_with_objective();
        let x1 = model.variable_id("x1").unwrap();

        model.add_constraint("x1 + x2 <= 4").unwrap();
        model.add_cut(x1, 3., 1).unwrap();

        let label = model.add_constraint("x1 - x2 <= 2").unwrap().label.clone();
        assert_eq!(label, "Constraint_2");
        assert_eq!(model.constraints().len(), 3);
    }

    #[test]
    fn cut_labels_are_unique() {
        let mut model = model_with_objective();
        let x1 = model.variable_id("x1").unwrap();

        model
            .add_labeled_constraint("x1 <= 9", "Cut_Floor_x1_1")
            .unwrap();
        let cut = model.add_cut(x1, 3., 1).unwrap();

        assert_eq!(cut.label, "Cut_Floor_x1_1_2");
        assert!(cut.is_cut());
        assert_eq!(model.cuts().count(), 1);
    }

    #[test]
    fn is_feasible() {
        let mut model = model_with_objective();
        model.add_constraint("6*x1 + 4*x2 <= 24").unwrap();
        model.add_constraint("x1 + 2*x2 <= 6").unwrap();

        assert!(model.is_feasible(&[3., 1.5]));
        assert!(model.is_feasible(&[4., 0.]));
        assert!(!model.is_feasible(&[4., 1.]));
        assert!(!model.is_feasible(&[-1., 0.]));
        assert!(!model.is_feasible(&[1.]));
    }

    #[test]
    fn check_complete() {
        let mut model = Model::new();
        assert!(model.check_complete().is_err());

        model.add_variable("x").unwrap();
        assert!(model.check_complete().is_err());

        model.set_objective(Direction::Maximize, "x").unwrap();
        assert!(model.check_complete().is_ok());
    }

    #[test]
    fn direction_from_str() {
        assert_eq!("max".parse::<Direction>().unwrap(), Direction::Maximize);
        assert_eq!(" MIN ".parse::<Direction>().unwrap(), Direction::Minimize);
        assert!("best".parse::<Direction>().is_err());
    }

    #[test]
    fn display() {
        let mut model = model_with_objective();
        model.add_constraint("x1 + 2*x2 <= 6").unwrap();
        let text = model.to_string();

        assert!(text.starts_with("maximize\n+ 5 x1 + 4 x2"));
        assert!(text.contains("Constraint_1: + 1 x1 + 2 x2 \u{2264} 6"));
        assert!(text.contains("x2 \u{2265} 0"));
    }
}
