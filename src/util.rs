pub const EPS: f64 = 1e-9;

//phase 1 objectives below this are treated as feasible
pub const FEAS_TOL: f64 = 1e-7;

pub const ITER_WIDTH: usize = 9;
