#![allow(non_snake_case)]

use crate::standard_form::{Basic, Bound, Nonbasic, NonbasicBound, Point, StandardForm};

use log::debug;

pub trait StandardizedProblem {
    fn obj(&self) -> f64;
    fn unpack(&mut self) -> (&StandardForm, &mut Point);
}

/// Minimizes the sum of one artificial variable per row, starting from every
/// original variable at its lower bound.
#[derive(Debug)]
pub struct PrimalPhase1 {
    pub std_form: StandardForm,
    pub point: Point,
    phase_1_vars: Vec<usize>,
    orig_c: nalgebra::DVector<f64>,
}

impl StandardizedProblem for PrimalPhase1 {
    #[inline]
    fn obj(&self) -> f64 {
        self.std_form.obj(&self.point.x)
    }

    #[inline]
    fn unpack(&mut self) -> (&StandardForm, &mut Point) {
        (&self.std_form, &mut self.point)
    }
}

#[derive(Debug)]
pub struct PrimalPhase2 {
    pub std_form: StandardForm,
    pub point: Point,
}

impl StandardizedProblem for PrimalPhase2 {
    #[inline]
    fn obj(&self) -> f64 {
        self.std_form.obj(&self.point.x)
    }

    #[inline]
    fn unpack(&mut self) -> (&StandardForm, &mut Point) {
        (&self.std_form, &mut self.point)
    }
}

impl std::convert::From<StandardForm> for PrimalPhase1 {
    fn from(mut std_form: StandardForm) -> Self {
        debug!("converting standard form to phase 1 standard form");

        let n = std_form.cols();
        let m = std_form.rows();
        let mut N = Vec::with_capacity(n);
        let mut B = Vec::with_capacity(m);
        let mut v = nalgebra::DVector::<f64>::zeros(n);

        for (i, bound) in std_form.bounds.iter().enumerate() {
            v[i] = bound.lower();
            N.push(Nonbasic::new(i, NonbasicBound::Lower));
        }

        let b_tilde = &std_form.b - &std_form.A * &v;

        let orig_c = std::mem::replace(
            &mut std_form.c,
            nalgebra::DVector::from_fn(n + m, |i, _| if i < n { 0. } else { 1. }),
        );

        std_form.A = std_form.A.resize_horizontally(n + m, 0.);
        v = v.resize_vertically(n + m, 0.);

        let mut phase_1_vars = Vec::with_capacity(m);

        for i in 0..m {
            let index = n + i;
            v[index] = b_tilde[i].abs();
            std_form.A[(i, index)] = if b_tilde[i] < 0. { -1. } else { 1. };
            std_form.bounds.push(Bound::Lower(0.));
            B.push(Basic::new(index));
            phase_1_vars.push(index);
        }

        PrimalPhase1 {
            std_form,
            point: Point { x: v, N, B },
            phase_1_vars,
            orig_c,
        }
    }
}

impl std::convert::From<PrimalPhase1> for PrimalPhase2 {
    fn from(phase_1: PrimalPhase1) -> Self {
        debug!("converting phase 1 standard form to phase 2 standard form");

        let mut std_form = phase_1.std_form;
        let cols = std_form.cols();

        //artificial variables keep their columns but can no longer move
        std_form.c = phase_1.orig_c.resize_vertically(cols, 0.);

        for &i in &phase_1.phase_1_vars {
            std_form.bounds[i] = Bound::Fixed(0.);
        }

        PrimalPhase2 {
            std_form,
            point: phase_1.point,
        }
    }
}
