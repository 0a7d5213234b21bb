//! CPLEX LP export of a selection [Model], for solving with an external MIP solver.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use super::model::Model;
use crate::Error;

/// Terms written per line; CPLEX rejects over long lines.
const TERMS_PER_LINE: usize = 8;

pub fn write_lp<W: Write>(model: &Model, mut out: W) -> Result<(), Error> {
    writeln!(out, "\\ binary leg selection, {} variables", model.len())?;
    writeln!(out, "Maximize")?;
    writeln!(out, " obj: {}", expression(&model.objective))?;

    writeln!(out, "Subject To")?;
    for constraint in &model.constraints {
        let row = expression(&constraint.coefficients);
        if constraint.upper.is_finite() {
            writeln!(out, " {}_up: {row} <= {}", constraint.name, constraint.upper)?;
        }
        if constraint.lower.is_finite() {
            writeln!(out, " {}_down: {row} >= {}", constraint.name, constraint.lower)?;
        }
    }

    writeln!(out, "Binary")?;
    for index in 0..model.len() {
        writeln!(out, " {}", variable(index))?;
    }
    writeln!(out, "End")?;

    Ok(())
}

/// Writes the model to `path`.
pub fn export_lp(model: &Model, path: &Path) -> Result<(), Error> {
    let mut out = BufWriter::new(File::create(path)?);
    write_lp(model, &mut out)?;
    out.flush()?;

    info!("wrote LP model with {} variables to {}", model.len(), path.display());
    Ok(())
}

fn variable(index: usize) -> String {
    format!("x{}", index + 1)
}

fn expression(coefficients: &[f64]) -> String {
    let terms: Vec<String> = coefficients
        .iter()
        .enumerate()
        .filter(|(_, coefficient)| **coefficient != 0.0)
        .map(|(index, coefficient)| {
            let sign = if coefficient.is_sign_negative() { '-' } else { '+' };
            format!("{sign} {} {}", coefficient.abs(), variable(index))
        })
        .collect();

    if terms.is_empty() {
        return format!("0 {}", variable(0));
    }

    terms
        .chunks(TERMS_PER_LINE)
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n   ")
}
