use ndarray::prelude::*;

use super::error::{Error, Result};
use super::linalg::lstsq;


/// Residuals smaller than this, relative to the observed flows, count as an exact fit.
static RESIDUAL_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    Dense,
    Sparse{sparsity: usize},
}

impl Solver {
    pub fn estimate(&self, edge_flows: &Array1<f64>, routing: &Array2<f64>)
                    -> Result<Array1<f64>> {
        match self {
            Solver::Dense => estimate_dense(edge_flows, routing),
            Solver::Sparse{sparsity} => estimate_sparse(edge_flows, routing, *sparsity),
        }
    }
}

fn check_shape(edge_flows: &Array1<f64>, routing: &Array2<f64>) -> Result<()> {
    if edge_flows.len() != routing.nrows() {
        return Err(Error::ShapeMismatch {
            expected: routing.nrows(),
            found: edge_flows.len(),
        });
    }
    Ok(())
}

/// Least-squares estimate of the flow on each route.  Where the routes don't pin the flows down,
/// this picks the solution with the smallest norm.  Nothing stops the estimates from going
/// negative.
pub fn estimate_dense(edge_flows: &Array1<f64>, routing: &Array2<f64>) -> Result<Array1<f64>> {
    check_shape(edge_flows, routing)?;
    Ok(lstsq(routing, edge_flows))
}

/// Estimates route flows with orthogonal matching pursuit, allowing at most `sparsity_budget`
/// routes to carry flow.  The lower the budget, the sparser the result.
///
/// Routes are normalised to unit length before the pursuit, and the coefficients found are scaled
/// back to the un-normalised routes, so each entry is a flow on the route.  Routes outside the
/// chosen set get exactly zero.
pub fn estimate_sparse(edge_flows: &Array1<f64>, routing: &Array2<f64>, sparsity_budget: usize)
                       -> Result<Array1<f64>> {
    check_shape(edge_flows, routing)?;
    let num_routes = routing.ncols();
    let mut route_flows = Array1::zeros(num_routes);

    let norms: Array1<f64> = routing.columns().into_iter()
        .map(|col| col.dot(&col).sqrt())
        .collect();
    let mut normalized = routing.to_owned();
    for (mut col, norm) in normalized.columns_mut().into_iter().zip(norms.iter()) {
        if *norm > 0. {
            col.mapv_inplace(|xx| xx / norm);
        }
    }

    let flows_norm_sq = edge_flows.dot(edge_flows);
    let tol = RESIDUAL_TOL * flows_norm_sq.max(1.);
    let mut support: Vec<usize> = vec![];
    let mut in_support = vec![false; num_routes];
    let mut coefs = Array1::zeros(0);
    let mut residual = edge_flows.clone();

    while support.len() < sparsity_budget.min(num_routes) {
        if residual.dot(&residual) <= tol {
            break;
        }
        // the unchosen route best aligned with what's left to explain; ties go to the lowest index
        let correlations = normalized.t().dot(&residual);
        let mut best: Option<(usize, f64)> = None;
        for (r_idx, corr) in correlations.iter().enumerate() {
            if in_support[r_idx] || norms[r_idx] == 0. {
                continue;
            }
            match best {
                Some((_, best_corr)) if corr.abs() <= best_corr => (),
                _ => best = Some((r_idx, corr.abs())),
            }
        }
        let best_idx = match best {
            Some((r_idx, corr)) if corr * corr > tol => r_idx,
            // whatever's left is orthogonal to every remaining route
            _ => break,
        };

        support.push(best_idx);
        in_support[best_idx] = true;
        let atoms = normalized.select(Axis(1), &support);
        coefs = lstsq(&atoms, edge_flows);
        residual = edge_flows - &atoms.dot(&coefs);
    }

    for (coef, r_idx) in coefs.iter().zip(support.iter()) {
        route_flows[*r_idx] = coef / norms[*r_idx];
    }
    log::debug!("sparse estimate uses {} of {} routes, residual {}", support.len(), num_routes,
                residual.dot(&residual).sqrt());
    Ok(route_flows)
}
