//! The ISC gating policy (§4.7): a pure function from account status,
//! community sensitivity, and a requested archetype to an allowed archetype
//! plus the constraints the generator must honor.

use conditioner_types::{AccountStatus, Archetype};

/// High-ISC and new-account gating always caps vulnerability at this level.
pub const MAX_VULNERABILITY_CAP: f64 = 0.9;

/// §4.7 boundary: ISC strictly greater than this is "high".
pub const HIGH_ISC_THRESHOLD: f64 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateConstraint {
    NoLinks,
    NoPitch,
    MaxVulnerability(f64),
    ZeroLinks,
    PainToSolutionRatio(f64),
    ProductMentionOnlyLast10Pct,
    InMediaResOpening,
    RequireNumericMilestones,
    InvertAuthority,
    ControlledImperfection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateResult {
    pub allowed_archetype: Archetype,
    pub constraints: Vec<GateConstraint>,
}

/// §4.7 contract. New accounts are always routed to the safest archetype
/// regardless of community sensitivity; a hostile community (`isc_score >
/// 7.5`) downgrades `ProblemSolution`/`Journey` requests to `Feedback`.
#[must_use]
pub fn gate(account_status: AccountStatus, isc_score: f64, requested_archetype: Archetype) -> GateResult {
    if account_status == AccountStatus::New {
        return GateResult {
            allowed_archetype: Archetype::Feedback,
            constraints: vec![
                GateConstraint::NoLinks,
                GateConstraint::NoPitch,
                GateConstraint::MaxVulnerability(MAX_VULNERABILITY_CAP),
            ],
        };
    }

    let high_isc = isc_score > HIGH_ISC_THRESHOLD;

    if high_isc && matches!(requested_archetype, Archetype::ProblemSolution | Archetype::Journey) {
        return GateResult {
            allowed_archetype: Archetype::Feedback,
            constraints: vec![
                GateConstraint::ZeroLinks,
                GateConstraint::MaxVulnerability(MAX_VULNERABILITY_CAP),
            ],
        };
    }

    if high_isc && requested_archetype == Archetype::Feedback {
        return GateResult {
            allowed_archetype: Archetype::Feedback,
            constraints: vec![GateConstraint::ZeroLinks],
        };
    }

    match requested_archetype {
        Archetype::ProblemSolution => GateResult {
            allowed_archetype: Archetype::ProblemSolution,
            constraints: vec![
                GateConstraint::PainToSolutionRatio(0.9),
                GateConstraint::ProductMentionOnlyLast10Pct,
                GateConstraint::InMediaResOpening,
            ],
        },
        Archetype::Journey => GateResult {
            allowed_archetype: Archetype::Journey,
            constraints: vec![GateConstraint::RequireNumericMilestones],
        },
        Archetype::Feedback | Archetype::Unclassified => GateResult {
            allowed_archetype: Archetype::Feedback,
            constraints: vec![GateConstraint::InvertAuthority, GateConstraint::ControlledImperfection],
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn new_account_always_gated_to_feedback() {
        let result = gate(AccountStatus::New, 2.0, Archetype::ProblemSolution);
        assert_eq!(result.allowed_archetype, Archetype::Feedback);
        assert!(result.constraints.contains(&GateConstraint::NoLinks));
        assert!(result.constraints.contains(&GateConstraint::NoPitch));
    }

    #[test]
    fn isc_boundary_is_strictly_greater_than() {
        let at_boundary = gate(AccountStatus::Established, 7.5, Archetype::Journey);
        assert_eq!(at_boundary.allowed_archetype, Archetype::Journey);

        let just_over = gate(AccountStatus::Established, 7.5001, Archetype::Journey);
        assert_eq!(just_over.allowed_archetype, Archetype::Feedback);
    }

    #[test]
    fn high_isc_downgrades_problem_solution_and_journey() {
        for archetype in [Archetype::ProblemSolution, Archetype::Journey] {
            let result = gate(AccountStatus::Established, 9.0, archetype);
            assert_eq!(result.allowed_archetype, Archetype::Feedback);
            assert!(result.constraints.contains(&GateConstraint::ZeroLinks));
        }
    }

    #[test]
    fn high_isc_feedback_keeps_feedback_with_zero_links() {
        let result = gate(AccountStatus::Established, 9.0, Archetype::Feedback);
        assert_eq!(result.allowed_archetype, Archetype::Feedback);
        assert_eq!(result.constraints, vec![GateConstraint::ZeroLinks]);
    }

    #[test]
    fn low_isc_passes_through_requested_archetype() {
        assert_eq!(
            gate(AccountStatus::Established, 3.0, Archetype::ProblemSolution).allowed_archetype,
            Archetype::ProblemSolution
        );
        assert_eq!(
            gate(AccountStatus::Established, 3.0, Archetype::Journey).allowed_archetype,
            Archetype::Journey
        );
        assert_eq!(
            gate(AccountStatus::Established, 3.0, Archetype::Feedback).allowed_archetype,
            Archetype::Feedback
        );
    }

    proptest! {
        #[test]
        fn always_returns_a_non_unclassified_archetype(
            isc in 0.0f64..10.0,
            requested_idx in 0u8..4,
            new_account in any::<bool>(),
        ) {
            let requested = match requested_idx {
                0 => Archetype::Journey,
                1 => Archetype::ProblemSolution,
                2 => Archetype::Feedback,
                _ => Archetype::Unclassified,
            };
            let status = if new_account { AccountStatus::New } else { AccountStatus::Established };
            let result = gate(status, isc, requested);
            prop_assert_ne!(result.allowed_archetype, Archetype::Unclassified);
        }

        #[test]
        fn new_account_is_gated_to_feedback_regardless_of_isc_or_request(
            isc in 0.0f64..10.0,
            requested_idx in 0u8..4,
        ) {
            let requested = match requested_idx {
                0 => Archetype::Journey,
                1 => Archetype::ProblemSolution,
                2 => Archetype::Feedback,
                _ => Archetype::Unclassified,
            };
            let result = gate(AccountStatus::New, isc, requested);
            prop_assert_eq!(result.allowed_archetype, Archetype::Feedback);
        }
    }
}
