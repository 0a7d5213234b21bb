use log::debug;

use super::model::{Constraint, Model, EPSILON};
use crate::Error;

/// Solves a binary selection [Model].
pub trait Solver {
    /// Returns one flag per model variable, set for the selected ones.
    fn solve(&self, model: &Model) -> Result<Vec<bool>, Error>;
}

/// Exact depth first branch and bound over selections of at most `max_selected` variables.
///
/// Every objective coefficient is split into a weighted sum of the variable's constraint
/// coefficients and a reduced remainder, with one weight per constraint row taken from a
/// least squares fit of the objective on the rows. The weighted part of a feasible
/// selection can never exceed what the row bounds allow, so the reduced remainder alone
/// bounds the search, and the last variable of a selection is looked up in the narrow band
/// of weighted values that could still beat the incumbent instead of being enumerated.
///
/// Variables are visited in descending reduced objective order, ties broken by index, and a
/// selection only replaces the incumbent when it is strictly better, so the result is
/// deterministic for a given model.
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchAndBound;

impl Solver for BranchAndBound {
    fn solve(&self, model: &Model) -> Result<Vec<bool>, Error> {
        let mut search = Search::new(model);

        if feasible(model, &vec![0.0; model.constraints.len()]) {
            search.best = Some((0.0, Vec::new()));
        }

        search.branch(0, 0.0, 0.0, 0.0);

        debug!("branch and bound visited {} nodes over {} variables", search.nodes, model.len());

        let (value, chosen) = search
            .best
            .ok_or_else(|| Error::Infeasible(format!("no selection of at most {} legs satisfies the constraints", search.max_selected)))?;

        debug!("optimal objective {value} with {} variables selected", chosen.len());

        let mut selection = vec![false; model.len()];
        for index in chosen {
            selection[index] = true;
        }
        Ok(selection)
    }
}

fn feasible(model: &Model, activities: &[f64]) -> bool {
    model
        .constraints
        .iter()
        .zip(activities)
        .all(|(constraint, activity)| constraint.is_satisfied_by(*activity))
}

/// Row weights whose weighted constraint coefficients best fit the objective.
///
/// Solves the normal equations with a small ridge so repeated or empty rows stay solvable.
fn row_weights(model: &Model) -> Vec<f64> {
    let rows = &model.constraints;
    let size = rows.len();

    let mut system = vec![vec![0.0_f64; size + 1]; size];
    for (r, row) in rows.iter().enumerate() {
        for (c, column) in rows.iter().enumerate() {
            system[r][c] = row.coefficients.iter().zip(&column.coefficients).map(|(a, b)| a * b).sum::<f64>();
        }
        system[r][size] = row.coefficients.iter().zip(&model.objective).map(|(a, b)| a * b).sum::<f64>();
        let diagonal = system[r][r];
        system[r][r] += 1e-9 * (1.0 + diagonal);
    }

    for pivot in 0..size {
        let pivot_row = system[pivot].clone();
        for (r, row) in system.iter_mut().enumerate() {
            if r == pivot || row[pivot] == 0.0 {
                continue;
            }
            let factor = row[pivot] / pivot_row[pivot];
            for (value, subtrahend) in row.iter_mut().zip(&pivot_row).skip(pivot) {
                *value -= factor * subtrahend;
            }
        }
    }

    system
        .iter()
        .enumerate()
        .map(|(r, row)| row[size] / row[r])
        .map(|weight| if weight.is_finite() { weight } else { 0.0 })
        .collect()
}

/// Largest weighted activity a row can contribute while satisfied.
fn row_ceiling(constraint: &Constraint, weight: f64) -> f64 {
    if weight > 0.0 {
        weight * constraint.upper
    } else if weight < 0.0 {
        weight * constraint.lower
    } else {
        0.0
    }
}

struct Search<'a> {
    model: &'a Model,
    max_selected: usize,
    /// Sum of the row weighted constraint coefficients per variable.
    weighted: Vec<f64>,
    /// `objective - weighted` per variable.
    reduced: Vec<f64>,
    /// Variables by descending reduced objective.
    order: Vec<usize>,
    /// `rank[index]`: position of `index` in `order`.
    rank: Vec<usize>,
    /// Variables by ascending weighted value.
    by_weight: Vec<usize>,
    /// No feasible selection has a larger weighted sum than this.
    weight_ceiling: f64,
    /// Absorbs the constraint tolerance and rounding in the bounds.
    slack: f64,
    /// Constraint activities of the current selection, one block of rows per depth.
    activities: Vec<f64>,
    chosen: Vec<usize>,
    best: Option<(f64, Vec<usize>)>,
    nodes: u64,
}

impl<'a> Search<'a> {
    fn new(model: &'a Model) -> Self {
        let max_selected = model.max_selected.min(model.len());
        let weights = row_weights(model);

        let weighted: Vec<f64> = (0..model.len())
            .map(|index| {
                model
                    .constraints
                    .iter()
                    .zip(&weights)
                    .map(|(constraint, weight)| weight * constraint.coefficients[index])
                    .sum()
            })
            .collect();
        let reduced: Vec<f64> = model.objective.iter().zip(&weighted).map(|(objective, weighted)| objective - weighted).collect();

        let mut order: Vec<usize> = (0..model.len()).collect();
        order.sort_by(|a, b| reduced[*b].total_cmp(&reduced[*a]).then(a.cmp(b)));

        let mut rank = vec![0; model.len()];
        for (position, index) in order.iter().enumerate() {
            rank[*index] = position;
        }

        let mut by_weight: Vec<usize> = (0..model.len()).collect();
        by_weight.sort_by(|a, b| weighted[*a].total_cmp(&weighted[*b]).then(a.cmp(b)));

        let slack = 2.0 * EPSILON * (1.0 + weights.iter().map(|weight| weight.abs()).sum::<f64>());
        let weight_ceiling = model
            .constraints
            .iter()
            .zip(&weights)
            .map(|(constraint, weight)| row_ceiling(constraint, *weight))
            .sum::<f64>()
            + slack;

        debug!("row weights {weights:?}, weighted ceiling {weight_ceiling}");

        Self {
            model,
            max_selected,
            weighted,
            reduced,
            order,
            rank,
            by_weight,
            weight_ceiling,
            slack,
            activities: vec![0.0; (max_selected + 1) * model.constraints.len()],
            chosen: Vec::with_capacity(max_selected),
            best: None,
            nodes: 0,
        }
    }

    fn improves(&self, value: f64) -> bool {
        match &self.best {
            Some((best, _)) => value > best + EPSILON,
            None => true,
        }
    }

    fn record(&mut self, value: f64) {
        let mut selected = self.chosen.clone();
        selected.sort_unstable();
        self.best = Some((value, selected));
    }

    /// Extends the current selection with variables from `order[start..]`.
    ///
    /// `reduced` and `weighted` are the current selection's sums of the split objective.
    fn branch(&mut self, start: usize, value: f64, reduced: f64, weighted: f64) {
        self.nodes += 1;
        match self.max_selected - self.chosen.len() {
            0 => {}
            1 => self.last_leg(start, value, reduced, weighted),
            remaining => {
                let rows = self.model.constraints.len();
                let depth = self.chosen.len();

                for position in start..self.order.len() {
                    let top: f64 = self.order[position..(position + remaining).min(self.order.len())]
                        .iter()
                        .map(|index| self.reduced[*index].max(0.0))
                        .sum();

                    // Later positions have no larger reduced objective.
                    if !self.improves(reduced + top + self.weight_ceiling) {
                        break;
                    }

                    let index = self.order[position];
                    let (parent, child) = self.activities.split_at_mut((depth + 1) * rows);
                    for ((next, activity), constraint) in child.iter_mut().zip(&parent[depth * rows..]).zip(&self.model.constraints) {
                        *next = activity + constraint.coefficients[index];
                    }

                    let next_value = value + self.model.objective[index];
                    self.chosen.push(index);
                    if self.improves(next_value) && feasible(self.model, &self.activities[(depth + 1) * rows..(depth + 2) * rows]) {
                        self.record(next_value);
                    }
                    self.branch(position + 1, next_value, reduced + self.reduced[index], weighted + self.weighted[index]);
                    self.chosen.pop();
                }
            }
        }
    }

    /// Completes the current selection with its best last variable from `order[start..]`.
    fn last_leg(&mut self, start: usize, value: f64, reduced: f64, weighted: f64) {
        let Some(first) = self.order.get(start) else {
            return;
        };
        let reduced = reduced + self.reduced[*first];
        if !self.improves(reduced + self.weight_ceiling) {
            return;
        }

        let upper = self.weight_ceiling - weighted;
        let from = match &self.best {
            Some((best, _)) => {
                let lower = best + EPSILON - reduced - weighted - self.slack;
                self.by_weight.partition_point(|index| self.weighted[*index] < lower)
            }
            None => 0,
        };

        let rows = self.model.constraints.len();
        let depth = self.chosen.len();
        let activities = &self.activities[depth * rows..(depth + 1) * rows];
        let mut incumbent = self.best.as_ref().map(|(best, _)| *best);
        let mut found = None;

        for index in &self.by_weight[from..] {
            let index = *index;
            if self.weighted[index] > upper {
                break;
            }
            if self.rank[index] < start {
                continue;
            }

            let next_value = value + self.model.objective[index];
            if incumbent.is_some_and(|incumbent| next_value <= incumbent + EPSILON) {
                continue;
            }

            let fits = self
                .model
                .constraints
                .iter()
                .zip(activities)
                .all(|(constraint, activity)| constraint.is_satisfied_by(activity + constraint.coefficients[index]));
            if fits {
                incumbent = Some(next_value);
                found = Some((next_value, index));
            }
        }

        if let Some((value, index)) = found {
            self.chosen.push(index);
            self.record(value);
            self.chosen.pop();
        }
    }
}
