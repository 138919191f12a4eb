//! Analysis method vocabulary shared by configuration and the engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How model parameters are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Maximum likelihood.
    #[default]
    Mle,
    /// Least squares on median-rank or cumulative-MTBF plots.
    RankRegression,
}

/// Which side(s) of the estimate a confidence bound covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceType {
    LowerOneSided,
    UpperOneSided,
    #[default]
    TwoSided,
}

/// How confidence bounds are constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceMethod {
    Crow,
    Duane,
    #[default]
    FisherMatrix,
    Likelihood,
    Bootstrap,
}

/// Model selected for a survival analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Mcf,
    KaplanMeier,
    PowerLaw,
    LogLinear,
    Exponential,
    Lognormal,
    Normal,
    Weibull,
}

macro_rules! snake_case_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $name),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().replace('-', "_").as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($ty), other)),
                }
            }
        }
    };
}

snake_case_str!(FitMethod { Mle => "mle", RankRegression => "rank_regression" });
snake_case_str!(ConfidenceType {
    LowerOneSided => "lower_one_sided",
    UpperOneSided => "upper_one_sided",
    TwoSided => "two_sided",
});
snake_case_str!(ConfidenceMethod {
    Crow => "crow",
    Duane => "duane",
    FisherMatrix => "fisher_matrix",
    Likelihood => "likelihood",
    Bootstrap => "bootstrap",
});
snake_case_str!(Distribution {
    Mcf => "mcf",
    KaplanMeier => "kaplan_meier",
    PowerLaw => "power_law",
    LogLinear => "log_linear",
    Exponential => "exponential",
    Lognormal => "lognormal",
    Normal => "normal",
    Weibull => "weibull",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        let json = serde_json::to_string(&ConfidenceMethod::FisherMatrix).unwrap();
        assert_eq!(json, format!("\"{}\"", ConfidenceMethod::FisherMatrix));
        let json = serde_json::to_string(&Distribution::KaplanMeier).unwrap();
        assert_eq!(json, "\"kaplan_meier\"");
    }

    #[test]
    fn from_str_accepts_kebab_case() {
        assert_eq!("rank-regression".parse::<FitMethod>(), Ok(FitMethod::RankRegression));
        assert_eq!("Two_Sided".parse::<ConfidenceType>(), Ok(ConfidenceType::TwoSided));
        assert!("nope".parse::<Distribution>().is_err());
    }
}
