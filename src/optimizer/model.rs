use super::{Candidate, OptimizerSettings};

/// Tolerance for constraint and objective comparisons.
pub(crate) const EPSILON: f64 = 1e-9;

/// `lower <= sum(coefficients[j] * x[j]) <= upper`
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub coefficients: Vec<f64>,
    pub lower: f64,
    pub upper: f64,
}

impl Constraint {
    pub fn activity(&self, selection: &[bool]) -> f64 {
        self.coefficients
            .iter()
            .zip(selection)
            .filter(|(_, selected)| **selected)
            .map(|(coefficient, _)| coefficient)
            .sum()
    }

    pub fn is_satisfied_by(&self, activity: f64) -> bool {
        activity >= self.lower - EPSILON && activity <= self.upper + EPSILON
    }
}

/// A binary selection model: pick a subset of variables maximizing the objective.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
    /// No feasible selection has more variables set than this.
    pub max_selected: usize,
}

impl Model {
    pub fn len(&self) -> usize {
        self.objective.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objective.is_empty()
    }

    pub fn objective_value(&self, selection: &[bool]) -> f64 {
        self.objective
            .iter()
            .zip(selection)
            .filter(|(_, selected)| **selected)
            .map(|(coefficient, _)| coefficient)
            .sum()
    }

    pub fn is_feasible(&self, selection: &[bool]) -> bool {
        selection.len() == self.len()
            && selection.iter().filter(|selected| **selected).count() <= self.max_selected
            && self.constraints.iter().all(|constraint| constraint.is_satisfied_by(constraint.activity(selection)))
    }
}

/// Builds the leg count, delta and theta constrained model over `candidates`.
///
/// Objective per candidate is `gamma + theta_weight * theta`, both already scaled by the
/// candidate's ratio.
pub fn build_model(candidates: &[Candidate], settings: &OptimizerSettings) -> Model {
    let legs = settings.max_legs as f64;

    Model {
        objective: candidates
            .iter()
            .map(|candidate| candidate.gamma + settings.theta_weight * candidate.theta)
            .collect(),
        constraints: vec![
            Constraint {
                name: "legs".into(),
                coefficients: vec![1.0; candidates.len()],
                lower: -legs,
                upper: legs,
            },
            Constraint {
                name: "delta".into(),
                coefficients: candidates.iter().map(|candidate| candidate.delta).collect(),
                lower: -settings.delta_limit,
                upper: settings.delta_limit,
            },
            Constraint {
                name: "theta".into(),
                coefficients: candidates.iter().map(|candidate| candidate.theta).collect(),
                lower: settings.theta_floor,
                upper: settings.theta_ceiling,
            },
        ],
        max_selected: settings.max_legs as usize,
    }
}
