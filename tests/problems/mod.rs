use floorcut::*;

const EPS: f64 = 0.00000001;

pub fn assert_optimal(result: &RelaxationResult, expected_obj: f64, expected_x: &[f64]) {
    match result {
        RelaxationResult::Optimal(sol) => {
            assert!(
                (sol.obj() - expected_obj).abs() < EPS,
                "obj: {}, expected: {}",
                sol.obj(),
                expected_obj
            );

            let x = sol.x();

            assert_eq!(x.len(), expected_x.len());

            for (x1, x2) in x.iter().zip(expected_x) {
                assert!((x1 - x2).abs() < EPS, "x_i: {}, expected: {}", x1, x2);
            }
        }

        _ => panic!("not optimal: {:?}", result),
    }
}

pub fn assert_optimal_obj(result: &RelaxationResult, expected_obj: f64) {
    match result {
        RelaxationResult::Optimal(sol) => {
            assert!(
                (sol.obj() - expected_obj).abs() < EPS,
                "obj: {}, expected: {}",
                sol.obj(),
                expected_obj
            );
        }

        _ => panic!("not optimal: {:?}", result),
    }
}

pub fn assert_infeasible(result: &RelaxationResult) {
    match result {
        RelaxationResult::Infeasible { .. } => (),
        _ => panic!("not infeasible: {:?}", result),
    }
}

pub fn assert_unbounded(result: &RelaxationResult) {
    match result {
        RelaxationResult::Unbounded => (),
        _ => panic!("not unbounded: {:?}", result),
    }
}

pub struct TestProblem {
    pub model: Model,
    pub check_result: Box<dyn FnOnce(&RelaxationResult)>,
}

impl TestProblem {
    fn new<F: FnOnce(&RelaxationResult) + 'static>(model: Model, check_result: F) -> Self {
        Self {
            model,
            check_result: Box::new(check_result),
        }
    }
}

fn model(vars: &[&str], direction: Direction, objective: &str, constraints: &[&str]) -> Model {
    let mut model = Model::new();

    for var in vars {
        model.add_variable(var).unwrap();
    }

    model.set_objective(direction, objective).unwrap();

    for constraint in constraints {
        model.add_constraint(constraint).unwrap();
    }

    model
}

pub fn one_variable_no_constraints() -> TestProblem {
    let model = model(&["x1"], Direction::Minimize, "2*x1", &[]);

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 0., &[0.])
    })
}

pub fn one_variable_bounded() -> TestProblem {
    let model = model(&["x1"], Direction::Maximize, "2*x1", &["x1 <= 3"]);

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 6., &[3.])
    })
}

pub fn one_variable_infeasible() -> TestProblem {
    let model = model(&["x1"], Direction::Maximize, "2*x1", &["x1 <= -1"]);
    TestProblem::new(model, |result: &RelaxationResult| assert_infeasible(&result))
}

pub fn one_variable_unbounded() -> TestProblem {
    let model = model(&["x1"], Direction::Maximize, "2*x1", &["x1 >= 1"]);
    TestProblem::new(model, |result: &RelaxationResult| assert_unbounded(&result))
}

pub fn two_variables_unbounded() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Maximize,
        "x1 + x2",
        &["x1 - x2 <= 1"],
    );

    TestProblem::new(model, |result: &RelaxationResult| assert_unbounded(&result))
}

pub fn two_variables_infeasible() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Maximize,
        "x1 + x2",
        &["x1 + x2 <= 1", "x1 + x2 >= 3"],
    );

    TestProblem::new(model, |result: &RelaxationResult| assert_infeasible(&result))
}

pub fn infeasible_constraint_without_vars() -> TestProblem {
    let model = model(&["x1"], Direction::Maximize, "x1", &["x1 - x1 >= 1"]);
    TestProblem::new(model, |result: &RelaxationResult| assert_infeasible(&result))
}

pub fn feasible_constraint_without_vars() -> TestProblem {
    let model = model(
        &["x1"],
        Direction::Maximize,
        "x1",
        &["x1 - x1 <= 1", "x1 <= 2"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 2., &[2.])
    })
}

pub fn objective_with_constant() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Maximize,
        "x1 + 10",
        &["x1 + x2 <= 4"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 14., &[4., 0.])
    })
}

pub fn linear_system_2d() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Minimize,
        "x1",
        &["x1 + x2 == 3", "x1 - x2 == 1"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 2., &[2., 1.])
    })
}

pub fn linear_system_3d() -> TestProblem {
    let model = model(
        &["x1", "x2", "x3"],
        Direction::Maximize,
        "x1 + x2 + x3",
        &[
            "x1 + x2 + x3 == 6",
            "x1 - x2 + x3 == 2",
            "x1 + 2*x2 - x3 == 2",
        ],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 6., &[1., 2., 3.])
    })
}

pub fn linear_system_3d_infeasible() -> TestProblem {
    let model = model(
        &["x1", "x2", "x3"],
        Direction::Maximize,
        "x1 + x2 + x3",
        &[
            "x1 + x2 + x3 == 6",
            "x1 - x2 + x3 == 2",
            "x1 + 2*x2 - x3 == 2",
            "x1 + x2 + x3 == 7",
        ],
    );

    TestProblem::new(model, |result: &RelaxationResult| assert_infeasible(&result))
}

pub fn small_prob_1() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Maximize,
        "5*x1 + 4*x2",
        &["6*x1 + 4*x2 <= 24", "x1 + 2*x2 <= 6"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 21., &[3., 1.5])
    })
}

pub fn small_prob_2() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Maximize,
        "5*x1 + 4*x2",
        &["6*x1 + 4*x2 <= 24", "x1 + 2*x2 <= 6", "x2 <= 1"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 62. / 3., &[10. / 3., 1.])
    })
}

pub fn small_prob_3() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Minimize,
        "x1 + x2",
        &["x1 + 2*x2 >= 4", "3*x1 + x2 >= 6"],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, 2.8, &[1.6, 1.2])
    })
}

pub fn small_prob_4() -> TestProblem {
    let model = model(
        &["x1", "x2", "x3"],
        Direction::Maximize,
        "3*x1 + 2*x2 + 4*x3",
        &[
            "x1 + x2 + 2*x3 <= 4",
            "2*x1 + 3*x3 <= 5",
            "2*x1 + x2 + 3*x3 <= 7",
        ],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal_obj(&result, 10.5)
    })
}

pub fn small_prob_unbounded() -> TestProblem {
    let model = model(
        &["x1", "x2"],
        Direction::Minimize,
        "x1 - 2*x2",
        &["x1 + x2 >= 2", "-x1 + x2 <= 3"],
    );

    TestProblem::new(model, |result: &RelaxationResult| assert_unbounded(&result))
}

pub fn beale_cycle() -> TestProblem {
    let model = model(
        &["x", "y", "z", "w"],
        Direction::Minimize,
        "-10*x + 57*y + 9*z + 24*w",
        &[
            "-0.5*x + 5.5*y + 2.5*z - 9*w >= 0",
            "-0.5*x + 1.5*y + 0.5*z - w >= 0",
            "-x >= -1",
        ],
    );

    TestProblem::new(model, |result: &RelaxationResult| {
        assert_optimal(&result, -1., &[1., 0., 1., 0.])
    })
}
