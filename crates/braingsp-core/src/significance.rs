//! Empirical significance of an observation against a surrogate null.
//!
//! The observation is either supplied explicitly or taken from the last slice
//! of the surrogate axis (the stacked, unrandomized reconstruction). Each
//! element's empirical p-value is the fraction of null slices at least as
//! extreme as the observation.
//!
//! Testing methods form a closed set ([`TestMethod`]) resolved through a
//! name → implementation table:
//!
//! - **frequentist**: per-element test, significant when `p < alpha`.
//! - **Bernoulli**: group test over the last data axis (subjects). The number
//!   of subjects rejecting the null is compared with the `1 - alpha` quantile
//!   of `Binomial(n_subjects, alpha)`.

use ndarray::{ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, DiscreteCDF};

use crate::error::{GspError, Result, fmt_shape};

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Closed set of significance-testing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    #[default]
    Frequentist,
    Bernoulli,
}

/// Which side(s) of the null distribution count as extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tail {
    /// `|surrogate| >= |observed|`
    #[default]
    Two,
    /// `surrogate >= observed`
    Greater,
    /// `surrogate <= observed`
    Less,
}

impl Tail {
    fn at_least_as_extreme(self, surrogate: f64, observed: f64) -> bool {
        match self {
            Self::Two => surrogate.abs() >= observed.abs(),
            Self::Greater => surrogate >= observed,
            Self::Less => surrogate <= observed,
        }
    }
}

impl std::str::FromStr for Tail {
    type Err = GspError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "two" | "two-sided" | "two_sided" => Ok(Self::Two),
            "greater" | "upper" => Ok(Self::Greater),
            "less" | "lower" => Ok(Self::Less),
            _ => Err(GspError::InvalidParameter(format!(
                "unknown tail '{s}', expected two, greater or less"
            ))),
        }
    }
}

/// Outcome of a significance test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceResult {
    pub method: TestMethod,
    pub tail: Tail,
    pub alpha: f64,
    /// Null slices the observation was ranked against.
    pub n_surrogates: usize,
    pub p_values: ArrayD<f64>,
    pub significant: ArrayD<bool>,
}

impl SignificanceResult {
    /// Number of significant elements.
    pub fn n_significant(&self) -> usize {
        self.significant.iter().filter(|&&s| s).count()
    }

    /// `data` with non-significant elements set to zero.
    ///
    /// Data with one extra trailing axis (subjects, as tested by Bernoulli)
    /// is averaged over that axis first.
    pub fn masked<S, D>(&self, data: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let data = data.view().into_dyn();
        let reduced = if data.shape() == self.significant.shape() {
            data.to_owned()
        } else if data.ndim() == self.significant.ndim() + 1
            && data.shape()[..data.ndim() - 1] == *self.significant.shape()
        {
            data.mean_axis(Axis(data.ndim() - 1))
                .ok_or_else(|| GspError::Shape("cannot average an empty subject axis".into()))?
        } else {
            return Err(GspError::Shape(format!(
                "data of shape {} cannot be masked by a result of shape {}",
                fmt_shape(data.shape()),
                fmt_shape(self.significant.shape())
            )));
        };
        let mut out = reduced;
        Zip::from(&mut out)
            .and(&self.significant)
            .for_each(|v, &keep| {
                if !keep {
                    *v = 0.0;
                }
            });
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Method table
// ---------------------------------------------------------------------------

/// Observation and null distribution, validated.
struct NullComparison<'a> {
    observed: ArrayViewD<'a, f64>,
    null: ArrayViewD<'a, f64>,
    tail: Tail,
    alpha: f64,
}

struct Outcome {
    p_values: ArrayD<f64>,
    significant: ArrayD<bool>,
}

type TestFn = fn(&NullComparison<'_>) -> Result<Outcome>;

/// Method names and their implementations.
pub(crate) const METHODS: &[(TestMethod, &str, TestFn)] = &[
    (TestMethod::Frequentist, "frequentist", frequentist),
    (TestMethod::Bernoulli, "Bernoulli", bernoulli),
];

fn method_names() -> String {
    let names: Vec<&str> = METHODS.iter().map(|(_, name, _)| *name).collect();
    names.join(" and ")
}

impl TestMethod {
    /// Row of this method in the method table.
    const fn index(self) -> usize {
        match self {
            Self::Frequentist => 0,
            Self::Bernoulli => 1,
        }
    }

    pub fn name(self) -> &'static str {
        METHODS[self.index()].1
    }
}

impl std::fmt::Display for TestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TestMethod {
    type Err = GspError;

    fn from_str(s: &str) -> Result<Self> {
        METHODS
            .iter()
            .find(|(_, name, _)| name.eq_ignore_ascii_case(s))
            .map(|(m, _, _)| *m)
            .ok_or_else(|| {
                GspError::UnsupportedMethod(format!(
                    "'{s}' requested. Other testing methods than {} are not implemented",
                    method_names()
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Testing
// ---------------------------------------------------------------------------

/// Rank an observation against a surrogate null distribution.
///
/// With `data = None` the last slice of the surrogate axis is the observation
/// and the remaining slices form the null. Supplied `data` must have the
/// shape of the surrogate array minus its last axis.
pub fn test_significance<'a, S, D>(
    surrogates: &'a ArrayBase<S, D>,
    data: Option<ArrayViewD<'a, f64>>,
    method: TestMethod,
    tail: Tail,
    alpha: f64,
) -> Result<SignificanceResult>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(GspError::InvalidParameter(format!(
            "alpha must lie in (0, 1), got {alpha}"
        )));
    }
    let surr = surrogates.view().into_dyn();
    if surr.ndim() == 0 {
        return Err(GspError::Shape("surrogate array is a scalar".into()));
    }
    let last = surr.ndim() - 1;

    let (observed, null) = match data {
        Some(observed) => (observed, surr),
        None => {
            let n = surr.shape()[last];
            if n < 2 {
                return Err(GspError::Shape(format!(
                    "surrogates of shape {} need at least one null slice next to the observation",
                    fmt_shape(surr.shape())
                )));
            }
            let (null, observed) = surr.split_at(Axis(last), n - 1);
            (observed.index_axis_move(Axis(last), 0), null)
        }
    };

    if observed.ndim() >= null.ndim() || observed.shape() != &null.shape()[..observed.ndim()] {
        return Err(GspError::Shape(format!(
            "provided data of shape {} and surrogates of shape {}: shapes do not agree",
            fmt_shape(observed.shape()),
            fmt_shape(null.shape())
        )));
    }
    // Extra axes between the data shape and the surrogate axis are not ranked.
    if observed.ndim() + 1 != null.ndim() {
        return Err(GspError::Shape(format!(
            "provided data of shape {} and surrogates of shape {}: shapes do not agree \
             (exactly one trailing surrogate axis expected)",
            fmt_shape(observed.shape()),
            fmt_shape(null.shape())
        )));
    }
    let n_surrogates = null.shape()[null.ndim() - 1];
    if n_surrogates == 0 {
        return Err(GspError::Shape("surrogate axis is empty".into()));
    }

    let (_, _, run) = METHODS[method.index()];
    log::info!("testing significance with the {method} method against {n_surrogates} surrogate(s)");

    let outcome = run(&NullComparison {
        observed,
        null,
        tail,
        alpha,
    })?;
    Ok(SignificanceResult {
        method,
        tail,
        alpha,
        n_surrogates,
        p_values: outcome.p_values,
        significant: outcome.significant,
    })
}

/// Fraction of null values at least as extreme as each observed element.
pub fn empirical_p_values(
    observed: ArrayViewD<'_, f64>,
    null: ArrayViewD<'_, f64>,
    tail: Tail,
) -> Result<ArrayD<f64>> {
    if null.ndim() != observed.ndim() + 1 || observed.shape() != &null.shape()[..observed.ndim()] {
        return Err(GspError::Shape(format!(
            "observation of shape {} and null distribution of shape {}: shapes do not agree",
            fmt_shape(observed.shape()),
            fmt_shape(null.shape())
        )));
    }
    let axis = Axis(null.ndim() - 1);
    let mut p = ArrayD::<f64>::zeros(observed.raw_dim());
    Zip::from(&mut p)
        .and(&observed)
        .and(null.lanes(axis))
        .for_each(|p, &x, lane| {
            let extreme = lane
                .iter()
                .filter(|&&s| tail.at_least_as_extreme(s, x))
                .count();
            *p = extreme as f64 / lane.len().max(1) as f64;
        });
    Ok(p)
}

fn frequentist(cmp: &NullComparison<'_>) -> Result<Outcome> {
    let p_values = empirical_p_values(cmp.observed.view(), cmp.null.view(), cmp.tail)?;
    let significant = p_values.mapv(|p| p < cmp.alpha);
    Ok(Outcome {
        p_values,
        significant,
    })
}

fn bernoulli(cmp: &NullComparison<'_>) -> Result<Outcome> {
    if cmp.observed.ndim() < 2 {
        return Err(GspError::Shape(format!(
            "the Bernoulli test needs a trailing subject axis, got data of shape {}",
            fmt_shape(cmp.observed.shape())
        )));
    }
    let subject_axis = Axis(cmp.observed.ndim() - 1);
    let n_subjects = cmp.observed.len_of(subject_axis);

    let per_subject = empirical_p_values(cmp.observed.view(), cmp.null.view(), cmp.tail)?;
    let counts = per_subject
        .mapv(|p| if p < cmp.alpha { 1.0 } else { 0.0 })
        .sum_axis(subject_axis);

    let binom = Binomial::new(cmp.alpha, n_subjects as u64)
        .map_err(|e| GspError::InvalidParameter(format!("binomial null: {e}")))?;
    let threshold = binom.inverse_cdf(1.0 - cmp.alpha) as f64;
    log::debug!("Bernoulli threshold: more than {threshold} of {n_subjects} subject(s)");

    let significant = counts.mapv(|c| c > threshold);
    let p_values = counts.mapv(|c| {
        let c = c as u64;
        if c == 0 { 1.0 } else { binom.sf(c - 1) }
    });
    Ok(Outcome {
        p_values,
        significant,
    })
}
