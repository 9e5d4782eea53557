//! Bounded local optimization of smooth functions of three variables.
//!
//! The classifier only needs a local search that stays inside an
//! axis-aligned region and reports how it ended. [`LocalOptimizer`] is that
//! seam; [`ProjectedGradient`] is the implementation used by default.

use crate::config::Config;
use crate::{Point, NDIM};

/// Direction of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Minimize,
    Maximize,
}

impl Goal {
    /// Factor that turns the goal into a minimization.
    fn factor(self) -> f64 {
        match self {
            Goal::Minimize => 1.0,
            Goal::Maximize => -1.0,
        }
    }
}

/// How an optimizer run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeStatus {
    /// The objective went past the configured stop value
    StopValueReached,
    /// Step or objective change fell below tolerance
    Converged,
    /// The evaluation budget ran out first
    MaxEvaluations,
    /// The objective or its gradient was not finite
    Failed,
}

impl OptimizeStatus {
    /// Whether the reported point can be trusted as a local extremum or a
    /// witness of the stop value.
    pub fn is_conclusive(self) -> bool {
        matches!(self, OptimizeStatus::StopValueReached | OptimizeStatus::Converged)
    }
}

/// Best point found by an optimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOutcome {
    pub x: Point,
    /// Objective at `x`, in the caller's sign convention
    pub value: f64,
    pub evaluations: usize,
    pub status: OptimizeStatus,
}

/// A bounded, blocking local search over `lb <= x <= ub`.
///
/// The objective returns its value and, when asked, writes its gradient into
/// the supplied vector. Implementations must respect `config.max_evaluations`
/// and stop once the objective passes `config.stop_value` in the direction of
/// `goal`.
pub trait LocalOptimizer {
    fn optimize<F>(
        &self,
        objective: F,
        goal: Goal,
        lb: &[f64; NDIM],
        ub: &[f64; NDIM],
        start: &Point,
        config: &Config,
    ) -> OptimizeOutcome
    where
        F: FnMut(&Point, Option<&mut Point>) -> f64;
}

/// Projected steepest descent with Armijo backtracking.
///
/// Each iteration moves against the gradient, clamps the trial point onto the
/// bounds and halves the step until the sufficient-decrease test holds. An
/// accepted step doubles the next trial step.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedGradient {
    /// Armijo sufficient-decrease constant
    pub armijo: f64,
}

impl Default for ProjectedGradient {
    fn default() -> Self {
        ProjectedGradient { armijo: 1e-4 }
    }
}

fn project(x: &Point, lb: &[f64; NDIM], ub: &[f64; NDIM]) -> Point {
    Point::new(
        x[0].clamp(lb[0], ub[0]),
        x[1].clamp(lb[1], ub[1]),
        x[2].clamp(lb[2], ub[2]),
    )
}

impl LocalOptimizer for ProjectedGradient {
    fn optimize<F>(
        &self,
        mut objective: F,
        goal: Goal,
        lb: &[f64; NDIM],
        ub: &[f64; NDIM],
        start: &Point,
        config: &Config,
    ) -> OptimizeOutcome
    where
        F: FnMut(&Point, Option<&mut Point>) -> f64,
    {
        let factor = goal.factor();
        let target = factor * config.stop_value;
        let diagonal = (0..NDIM)
            .map(|i| (ub[i] - lb[i]).powi(2))
            .sum::<f64>()
            .sqrt();

        // Everything below minimizes factor * objective
        let mut evaluate = |x: &Point, g: &mut Point| {
            let f = factor * objective(x, Some(&mut *g));
            *g *= factor;
            f
        };
        let finish = |x: Point, f: f64, evaluations: usize, status: OptimizeStatus| OptimizeOutcome {
            x,
            value: factor * f,
            evaluations,
            status,
        };

        let mut x = project(start, lb, ub);
        let mut g = Point::zeros();
        let mut fx = evaluate(&x, &mut g);
        let mut evaluations = 1;
        if !fx.is_finite() || !g.iter().all(|c| c.is_finite()) {
            return finish(x, fx, evaluations, OptimizeStatus::Failed);
        }
        if fx < target {
            return finish(x, fx, evaluations, OptimizeStatus::StopValueReached);
        }

        let gnorm = g.norm();
        if gnorm == 0.0 {
            return finish(x, fx, evaluations, OptimizeStatus::Converged);
        }
        let mut alpha = diagonal / gnorm;

        loop {
            let step_tol = config.xtol_rel * (x.norm() + diagonal);
            loop {
                let mut trial = x;
                trial.axpy(-alpha, &g, 1.0);
                let trial = project(&trial, lb, ub);
                let d = trial - x;
                if d.norm() <= step_tol {
                    return finish(x, fx, evaluations, OptimizeStatus::Converged);
                }
                if evaluations >= config.max_evaluations {
                    return finish(x, fx, evaluations, OptimizeStatus::MaxEvaluations);
                }

                let mut gt = Point::zeros();
                let ft = evaluate(&trial, &mut gt);
                evaluations += 1;
                if !ft.is_finite() || !gt.iter().all(|c| c.is_finite()) {
                    return finish(trial, ft, evaluations, OptimizeStatus::Failed);
                }
                if ft < target {
                    return finish(trial, ft, evaluations, OptimizeStatus::StopValueReached);
                }

                if ft <= fx + self.armijo * g.dot(&d) {
                    let decrease = fx - ft;
                    x = trial;
                    fx = ft;
                    g = gt;
                    if decrease <= config.ftol_abs {
                        return finish(x, fx, evaluations, OptimizeStatus::Converged);
                    }
                    alpha *= 2.0;
                    break;
                }
                alpha *= 0.5;
            }
        }
    }
}
