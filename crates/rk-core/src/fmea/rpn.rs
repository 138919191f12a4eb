//! Risk priority numbers.

use rk_common::{Error, Result};
use rk_config::settings::rank_of;
use rk_config::FmeaSettings;

use super::model::{Fmea, Rating};

const MAX_RANK: u32 = 10;

/// Resolve a rating against one ordinal scale.
pub fn resolve_rating(rating: &Rating, scale: &[String], field: &str) -> Result<u32> {
    match rating {
        Rating::Rank(r) if (1..=MAX_RANK).contains(r) => Ok(*r),
        Rating::Rank(r) => Err(Error::invalid(field, format!("rank {} is outside 1..=10", r))),
        Rating::Name(name) => rank_of(scale, name)
            .ok_or_else(|| Error::invalid(field, format!("'{}' is not on the {} scale", name, field))),
    }
}

fn resolve(rating: Option<&Rating>, scale: &[String], field: &str) -> Result<Option<u32>> {
    rating.map(|r| resolve_rating(r, scale, field)).transpose()
}

/// Write `rpn` and `rpn_new` on every mechanism.
///
/// A mechanism missing S, O or D is left unrated. The revised RPN falls
/// back to the current O and D when no new value is given, and keeps S
/// unless the mode carries a revised severity.
pub fn calculate_rpn(fmea: &mut Fmea, settings: &FmeaSettings) -> Result<()> {
    let mut computed = Vec::new();
    for mode in &fmea.modes {
        let s = resolve(mode.rpn_severity.as_ref(), &settings.severity_scale, "severity")?;
        let s_new = resolve(mode.rpn_severity_new.as_ref(), &settings.severity_scale, "severity")?
            .or(s);
        for mech in &mode.mechanisms {
            let o = resolve(mech.rpn_occurrence.as_ref(), &settings.occurrence_scale, "occurrence")?;
            let d = resolve(mech.rpn_detection.as_ref(), &settings.detection_scale, "detection")?;
            let o_new =
                resolve(mech.rpn_occurrence_new.as_ref(), &settings.occurrence_scale, "occurrence")?
                    .or(o);
            let d_new =
                resolve(mech.rpn_detection_new.as_ref(), &settings.detection_scale, "detection")?
                    .or(d);
            let product = |s: Option<u32>, o: Option<u32>, d: Option<u32>| Some(s? * o? * d?);
            computed.push((product(s, o, d), product(s_new, o_new, d_new)));
        }
    }

    let mechanisms = fmea.modes.iter_mut().flat_map(|m| m.mechanisms.iter_mut());
    for (mech, (rpn, rpn_new)) in mechanisms.zip(computed) {
        mech.rpn = rpn;
        mech.rpn_new = rpn_new;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmea::model::{FailureMechanism, FailureMode};

    fn worksheet(severity: Rating, mech: FailureMechanism) -> Fmea {
        Fmea {
            modes: vec![FailureMode {
                rpn_severity: Some(severity),
                mechanisms: vec![mech],
                ..FailureMode::default()
            }],
            ..Fmea::default()
        }
    }

    #[test]
    fn rpn_and_revised_rpn() {
        let mut fmea = worksheet(
            Rating::Rank(8),
            FailureMechanism {
                rpn_occurrence: Some(Rating::Rank(4)),
                rpn_detection: Some(Rating::Rank(2)),
                rpn_detection_new: Some(Rating::Rank(1)),
                ..FailureMechanism::default()
            },
        );
        calculate_rpn(&mut fmea, &FmeaSettings::default()).unwrap();
        let mech = &fmea.modes[0].mechanisms[0];
        assert_eq!(mech.rpn, Some(64));
        assert_eq!(mech.rpn_new, Some(32));
    }

    #[test]
    fn names_resolve_through_scales() {
        let mut fmea = worksheet(
            Rating::Name("very high".into()),
            FailureMechanism {
                rpn_occurrence: Some(Rating::Name("Moderate".into())),
                rpn_detection: Some(Rating::Name("High".into())),
                ..FailureMechanism::default()
            },
        );
        fmea.modes[0].rpn_severity_new = Some(Rating::Name("Minor".into()));
        calculate_rpn(&mut fmea, &FmeaSettings::default()).unwrap();
        let mech = &fmea.modes[0].mechanisms[0];
        assert_eq!(mech.rpn, Some(8 * 5 * 3));
        assert_eq!(mech.rpn_new, Some(3 * 5 * 3));
    }

    #[test]
    fn unrated_mechanism_has_no_rpn() {
        let mut fmea = worksheet(
            Rating::Rank(5),
            FailureMechanism {
                rpn_occurrence: Some(Rating::Rank(4)),
                rpn: Some(99),
                ..FailureMechanism::default()
            },
        );
        calculate_rpn(&mut fmea, &FmeaSettings::default()).unwrap();
        assert_eq!(fmea.modes[0].mechanisms[0].rpn, None);
    }

    #[test]
    fn bad_rating_is_rejected() {
        let settings = FmeaSettings::default();
        assert!(resolve_rating(&Rating::Rank(0), &settings.severity_scale, "severity").is_err());
        assert!(resolve_rating(&Rating::Rank(11), &settings.severity_scale, "severity").is_err());
        assert!(
            resolve_rating(&Rating::Name("Catastrophic".into()), &settings.severity_scale, "severity")
                .is_err()
        );
    }
}
