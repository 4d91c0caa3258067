use crate::model::{Variable, VariableId};

use std::collections::BTreeMap;

/// A linear combination of model variables plus a constant.
///
/// Terms are kept in variable declaration order. Adding a term for a variable
/// that is already present sums the coefficients, and a term whose coefficient
/// becomes exactly zero is removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpression {
    terms: BTreeMap<VariableId, f64>,
    constant: f64,
}

impl LinearExpression {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_constant(constant: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant,
        }
    }

    pub fn term(var: VariableId, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    pub fn add_term(&mut self, var: VariableId, coeff: f64) {
        let entry = self.terms.entry(var).or_insert(0.);
        *entry += coeff;

        if *entry == 0. {
            self.terms.remove(&var);
        }
    }

    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    #[inline]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    #[inline]
    pub fn coeff(&self, var: VariableId) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.)
    }

    pub fn terms(&self) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.terms.iter().map(|(&var, &coeff)| (var, coeff))
    }

    pub fn vars(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.terms.keys().copied()
    }

    /// Number of variable terms (the constant is not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression at `values`, which is indexed by variable id.
    /// Variables without a value count as zero.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms().fold(self.constant, |acc, (var, coeff)| {
            acc + coeff * values.get(usize::from(var)).copied().unwrap_or(0.)
        })
    }

    /// Renders the expression as text that the expression parser accepts and
    /// that parses back to an equal expression.
    pub fn render(&self, variables: &[Variable]) -> String {
        let mut parts: Vec<String> = self
            .terms()
            .map(|(var, coeff)| {
                let name = match variables.get(usize::from(var)) {
                    Some(var) => var.name.clone(),
                    None => format!("{}", var),
                };

                if coeff == 1. {
                    name
                } else {
                    format!("{}*{}", coeff, name)
                }
            })
            .collect();

        if self.constant != 0. || parts.is_empty() {
            parts.push(format!("{}", self.constant));
        }

        parts.join(" + ")
    }
}

#[cfg(test)]
mod tests {
    use super::LinearExpression;
    use crate::model::Model;

    #[test]
    fn add_term_merges_and_drops_zeros() {
        let mut expr = LinearExpression::new();
        expr.add_term(0usize.into(), 2.);
        expr.add_term(1usize.into(), 1.);
        expr.add_term(0usize.into(), 3.);
        assert_eq!(expr.coeff(0usize.into()), 5.);

        expr.add_term(1usize.into(), -1.);
        assert_eq!(expr.len(), 1);
        assert_eq!(expr.coeff(1usize.into()), 0.);
    }

    #[test]
    fn evaluate() {
        let mut expr = LinearExpression::from_constant(1.5);
        expr.add_term(0usize.into(), 5.);
        expr.add_term(1usize.into(), 4.);
        assert_eq!(expr.evaluate(&[3., 1.]), 20.5);
    }

    #[test]
    fn render_uses_declaration_order() {
        let mut model = Model::new();
        let x = model.add_variable("x").unwrap();
        let y = model.add_variable("y").unwrap();

        let mut expr = LinearExpression::from_constant(-2.);
        expr.add_term(y, -0.5);
        expr.add_term(x, 1.);

        assert_eq!(expr.render(model.variables()), "x + -0.5*y + -2");
    }

    #[test]
    fn render_empty() {
        assert_eq!(LinearExpression::new().render(&[]), "0");
    }
}
