pub mod primal_problem;
pub mod primal_simplex_solver;
