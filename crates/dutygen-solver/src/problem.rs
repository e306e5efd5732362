/// Represents a linear programming problem
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
    /// Domain of each variable
    pub kinds: Vec<VarKind>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Variable domain. All variables are non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarKind {
    #[default]
    Continuous,
    Integer,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
            kinds: vec![VarKind::Continuous; n],
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    /// Append a variable given as a sparse column of `(constraint, coefficient)` entries.
    /// Returns the index of the new variable.
    pub fn add_variable(&mut self, name: impl Into<String>, cost: f64, column: &[(usize, f64)]) -> usize {
        let index = self.variables.len();
        self.variables.push(name.into());
        self.objective.coefficients.push(cost);
        self.kinds.push(VarKind::Continuous);
        for constraint in &mut self.constraints {
            constraint.coefficients.resize(index, 0.0);
            constraint.coefficients.push(0.0);
        }
        for &(row, coef) in column {
            if let Some(constraint) = self.constraints.get_mut(row) {
                constraint.coefficients[index] += coef;
            }
        }
        index
    }

    /// Switch every variable to the given domain
    pub fn set_all_kinds(&mut self, kind: VarKind) {
        self.kinds.iter_mut().for_each(|k| *k = kind);
    }

    pub fn is_integer(&self, variable: usize) -> bool {
        self.kinds.get(variable) == Some(&VarKind::Integer)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value of `values` as stated (not negated for maximization)
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Left-hand side of constraint `row` at `values`
    pub fn row_activity(&self, row: usize, values: &[f64]) -> f64 {
        self.constraints[row]
            .coefficients
            .iter()
            .zip(values)
            .map(|(a, x)| a * x)
            .sum()
    }

    /// Whether `values` satisfies every constraint and non-negativity within `tolerance`
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.num_variables() || values.iter().any(|&x| x < -tolerance) {
            return false;
        }
        self.constraints.iter().enumerate().all(|(i, c)| {
            let lhs = self.row_activity(i, values);
            match c.op {
                ConstraintOp::Le => lhs <= c.rhs + tolerance,
                ConstraintOp::Ge => lhs >= c.rhs - tolerance,
                ConstraintOp::Eq => (lhs - c.rhs).abs() <= tolerance,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variable_extends_rows() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.add_constraint("r0", vec![1.0], ConstraintOp::Eq, 1.0);
        problem.add_constraint("r1", vec![0.0], ConstraintOp::Eq, 1.0);

        let y = problem.add_variable("y", 2.0, &[(0, 1.0), (1, 1.0)]);

        assert_eq!(y, 1);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 1.0]);
        assert_eq!(problem.constraints[1].coefficients, vec![0.0, 1.0]);
        assert_eq!(problem.objective.coefficients, vec![0.0, 2.0]);
        assert_eq!(problem.kinds.len(), 2);
    }

    #[test]
    fn test_feasibility_check() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Eq, 1.0);
        problem.add_constraint("cap", vec![1.0, 0.0], ConstraintOp::Le, 0.5);

        assert!(problem.is_feasible(&[0.5, 0.5], 1e-9));
        assert!(!problem.is_feasible(&[1.0, 0.0], 1e-9));
        assert!(!problem.is_feasible(&[0.0, 0.5], 1e-9));
        assert!(!problem.is_feasible(&[0.0], 1e-9));
    }
}
