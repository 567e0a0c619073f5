//! The four wizard phases and the edges between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A wizard phase.
///
/// Serialized with the names used in project files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// D.U.R. crash test of the raw idea
    #[default]
    #[serde(rename = "crash_test")]
    CrashTest,
    /// Ten candidate angles for the validated idea
    #[serde(rename = "generation")]
    Generation,
    /// Weighted scoring of the three selected angles
    #[serde(rename = "priorisation")]
    Priorisation,
    /// Backcasting plan for the chosen angle
    #[serde(rename = "sequencage")]
    Sequencage,
}

impl Phase {
    /// All phases in order.
    pub const ALL: [Self; 4] = [Self::CrashTest, Self::Generation, Self::Priorisation, Self::Sequencage];

    /// The single forward edge out of this phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::CrashTest => Some(Self::Generation),
            Self::Generation => Some(Self::Priorisation),
            Self::Priorisation => Some(Self::Sequencage),
            Self::Sequencage => None,
        }
    }

    /// Whether `self -> to` is a legal transition.
    ///
    /// Forward by one step, or back to the start (reset).
    pub fn can_transition_to(self, to: Self) -> bool {
        to == Self::CrashTest || self.next() == Some(to)
    }

    /// Identifier used in project files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrashTest => "crash_test",
            Self::Generation => "generation",
            Self::Priorisation => "priorisation",
            Self::Sequencage => "sequencage",
        }
    }

    /// Heading shown to the user.
    pub fn title(self) -> &'static str {
        match self {
            Self::CrashTest => "Phase 0 : Crash Test D.U.R.",
            Self::Generation => "Phase G : Génération",
            Self::Priorisation => "Phase P : Priorisation",
            Self::Sequencage => "Phase S : Plan d'Action",
        }
    }

    /// Progress through the wizard, in percent.
    pub fn progress(self) -> u8 {
        match self {
            Self::CrashTest => 0,
            Self::Generation => 33,
            Self::Priorisation => 66,
            Self::Sequencage => 100,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_edges() {
        assert_eq!(Phase::CrashTest.next(), Some(Phase::Generation));
        assert_eq!(Phase::Generation.next(), Some(Phase::Priorisation));
        assert_eq!(Phase::Priorisation.next(), Some(Phase::Sequencage));
        assert_eq!(Phase::Sequencage.next(), None);
    }

    #[test]
    fn test_only_forward_or_reset_allowed() {
        for from in Phase::ALL {
            for to in Phase::ALL {
                let expected = to == Phase::CrashTest || from.next() == Some(to);
                assert_eq!(from.can_transition_to(to), expected, "{from} -> {to}");
            }
        }
        assert!(!Phase::Sequencage.can_transition_to(Phase::Priorisation));
        assert!(!Phase::CrashTest.can_transition_to(Phase::Priorisation));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Phase::Priorisation).unwrap(), "\"priorisation\"");
        let phase: Phase = serde_json::from_str("\"sequencage\"").unwrap();
        assert_eq!(phase, Phase::Sequencage);
        for phase in Phase::ALL {
            assert_eq!(serde_json::to_value(phase).unwrap(), phase.as_str());
        }
    }

    #[test]
    fn test_progress_is_monotonic() {
        let progress: Vec<u8> = Phase::ALL.iter().map(|p| p.progress()).collect();
        assert_eq!(progress, [0, 33, 66, 100]);
    }
}
