use roots::{find_root_brent, find_root_newton_raphson, SimpleConvergency};
use thiserror::Error;
use tracing::debug;

// Relative step used for the central-difference derivative in Newton iterations
const DERIVATIVE_STEP: f64 = 1e-6;

/// Which stage of the solver produced a root
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RootMethod {
    Newton,
    Bracketing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Root {
    pub value: f64,
    pub method: RootMethod,
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("No root found starting from {start} nor within the bracket [{lower}, {upper}]")]
pub struct RootNotFound {
    pub start: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Tolerances and iteration budget shared by both stages of the solver
#[derive(Clone, Copy, Debug)]
pub struct SolverSettings {
    pub x_tolerance: f64,
    pub residual_tolerance: f64,
    pub max_iter: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            x_tolerance: 1e-9,
            residual_tolerance: 1e-6,
            max_iter: 50,
        }
    }
}

/// Find a root of `residual` using Newton-Raphson from `start`, falling back to a
/// bracketing (Brent) search over `bracket` when Newton fails to converge, leaves the
/// bracket or ends on a point that does not satisfy the residual tolerance.
///
/// The residual may return NaN outside its domain; such points are treated as failed
/// iterations rather than roots.
pub(crate) fn newton_with_bracket_fallback(
    residual: impl Fn(f64) -> f64,
    start: f64,
    bracket: (f64, f64),
    settings: SolverSettings,
) -> Result<Root, RootNotFound> {
    let (lower, upper) = bracket;
    let acceptable = |x: f64| {
        x.is_finite()
            && (lower..=upper).contains(&x)
            && residual(x).abs() <= settings.residual_tolerance
    };

    let derivative = |x: f64| {
        let step = DERIVATIVE_STEP * x.abs().max(1.);
        (residual(x + step) - residual(x - step)) / (2. * step)
    };

    let mut convergency = SimpleConvergency {
        eps: settings.x_tolerance,
        max_iter: settings.max_iter,
    };

    match find_root_newton_raphson::<f64, _, _>(start, &residual, derivative, &mut convergency) {
        Ok(x) if acceptable(x) => {
            return Ok(Root {
                value: x,
                method: RootMethod::Newton,
            })
        }
        Ok(x) => debug!("Newton iteration ended on unacceptable point {x}, trying bracket"),
        Err(e) => debug!("Newton iteration failed ({e}), trying bracket"),
    }

    bisect(&residual, lower, upper, settings)
        .filter(|x| acceptable(*x))
        .map(|value| Root {
            value,
            method: RootMethod::Bracketing,
        })
        .ok_or(RootNotFound {
            start,
            lower,
            upper,
        })
}

/// Bounded bracketing search. We use the Brent root solver, which keeps the bisection
/// guarantee of staying within the bracket while converging faster.
pub(crate) fn bisect(
    func: impl Fn(f64) -> f64,
    a: f64,
    b: f64,
    settings: SolverSettings,
) -> Option<f64> {
    let mut convergency = SimpleConvergency {
        eps: settings.x_tolerance,
        max_iter: settings.max_iter.max(100),
    };

    find_root_brent::<f64, _>(a, b, func, &mut convergency).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_find_root_with_newton_when_well_behaved() {
        let root = newton_with_bracket_fallback(
            |x| x * x - 2.,
            1.,
            (0., 10.),
            SolverSettings::default(),
        )
        .unwrap();

        assert_relative_eq!(root.value, 2f64.sqrt(), max_relative = 1e-8);
        assert_eq!(root.method, RootMethod::Newton);
    }

    #[rstest]
    fn should_fall_back_to_bracket_when_newton_leaves_the_domain() {
        // ln(x) - 1 is undefined below zero; starting far right overshoots into x < 0
        let residual = |x: f64| if x > 0. { x.ln() - 1. } else { f64::NAN };
        let root =
            newton_with_bracket_fallback(residual, 50., (1e-6, 200.), SolverSettings::default())
                .unwrap();

        assert_relative_eq!(root.value, std::f64::consts::E, max_relative = 1e-6);
        assert_eq!(root.method, RootMethod::Bracketing);
    }

    #[rstest]
    fn should_report_failure_when_no_root_exists() {
        let result =
            newton_with_bracket_fallback(|x| x * x + 1., 0.5, (0., 10.), SolverSettings::default());

        assert_eq!(
            result,
            Err(RootNotFound {
                start: 0.5,
                lower: 0.,
                upper: 10.
            })
        );
    }

    #[rstest]
    fn should_bisect_within_bracket() {
        let root = bisect(|x| x - 3., 0., 5., SolverSettings::default()).unwrap();
        assert_relative_eq!(root, 3., max_relative = 1e-8);
    }
}
