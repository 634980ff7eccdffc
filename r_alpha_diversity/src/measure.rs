use std::{fmt, str::FromStr};

/// Alpha diversity indices understood by phyloseq::estimate_richness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Observed,
    Chao1,
    Shannon,
    Simpson,
    InvSimpson,
    Ace,
    Fisher,
}

impl Measure {
    pub const ALL: [Measure; 7] = [
        Measure::Observed,
        Measure::Chao1,
        Measure::Shannon,
        Measure::Simpson,
        Measure::InvSimpson,
        Measure::Ace,
        Measure::Fisher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observed => "Observed",
            Self::Chao1 => "Chao1",
            Self::Shannon => "Shannon",
            Self::Simpson => "Simpson",
            Self::InvSimpson => "InvSimpson",
            Self::Ace => "ACE",
            Self::Fisher => "Fisher",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Measure {
    type Err = anyhow::Error;

    // Names must match exactly as they are passed through to R
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "Measure {} is not a valid alpha diversity index (available: {})",
                    s,
                    Self::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

/// Parse the alpha measure arguments
///
/// Each argument can be a single measure name or a comma separated list
/// of names, so `Observed Shannon` and `Observed,Shannon` are equivalent.
/// Duplicates are removed, keeping the position of the first occurrence.
/// Fails on the first unknown or empty name.
pub fn parse_measures<S: AsRef<str>>(args: &[S]) -> anyhow::Result<Vec<Measure>> {
    let mut v: Vec<Measure> = Vec::new();
    for arg in args {
        for s in arg.as_ref().split(',').map(|s| s.trim()) {
            if s.is_empty() {
                return Err(anyhow!(
                    "Empty alpha diversity index in '{}'",
                    arg.as_ref()
                ));
            }
            let m = s.parse::<Measure>()?;
            if !v.contains(&m) {
                v.push(m)
            }
        }
    }
    if v.is_empty() {
        Err(anyhow!("No alpha diversity index specified"))
    } else {
        Ok(v)
    }
}

/// Comma separated list as passed to the report template
pub fn join_measures(v: &[Measure]) -> String {
    v.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_known_measures_are_accepted() {
        let names: Vec<_> = Measure::ALL.iter().map(|m| m.to_string()).collect();
        assert_eq!(parse_measures(&names).unwrap(), Measure::ALL.to_vec());
        let joined = join_measures(&Measure::ALL);
        assert_eq!(
            joined,
            "Observed,Chao1,Shannon,Simpson,InvSimpson,ACE,Fisher"
        );
        assert_eq!(parse_measures(&[joined]).unwrap(), Measure::ALL.to_vec());
    }

    #[test]
    fn comma_list_matches_separate_tokens() {
        let a = parse_measures(&["Observed", "Shannon"]).unwrap();
        let b = parse_measures(&["Observed,Shannon"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![Measure::Observed, Measure::Shannon]);

        let c = parse_measures(&["Observed,Shannon", "Fisher"]).unwrap();
        assert_eq!(c, vec![Measure::Observed, Measure::Shannon, Measure::Fisher]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let v = parse_measures(&["Shannon,Observed", "Shannon", "Chao1,Observed"]).unwrap();
        assert_eq!(v, vec![Measure::Shannon, Measure::Observed, Measure::Chao1]);
    }

    #[test]
    fn unknown_measure_is_named_in_error() {
        for args in [
            vec!["Foo"],
            vec!["Foo,Shannon"],
            vec!["Observed,Foo"],
            vec!["Observed", "Chao1", "Foo"],
        ] {
            let e = parse_measures(&args).unwrap_err();
            assert!(e.to_string().contains("Foo"), "{}", e);
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        let e = parse_measures(&["shannon"]).unwrap_err();
        assert!(e.to_string().contains("shannon"));
        assert!(parse_measures(&["Ace"]).is_err());
        assert_eq!(parse_measures(&["ACE"]).unwrap(), vec![Measure::Ace]);
    }

    #[test]
    fn empty_entries_are_rejected() {
        assert!(parse_measures(&["Observed,"]).is_err());
        assert!(parse_measures(&[""]).is_err());
        assert!(parse_measures::<&str>(&[]).is_err());
    }
}
