use serde::{Deserialize, Serialize};

pub const UNKNOWN_AGENCY: &str = "Unknown Agency";

/// Checked in order; the first pattern contained in the source URL wins.
const DEFAULT_AGENCIES: &[(&str, &str)] = &[
    ("dst.gov.in", "DST - Department of Science & Technology"),
    ("dbtindia.gov.in", "DBT - Department of Biotechnology"),
    ("birac.nic.in", "BIRAC - Biotechnology Industry Research Assistance Council"),
    ("icmr.gov.in", "ICMR - Indian Council of Medical Research"),
    ("serb.gov.in", "SERB - Science and Engineering Research Board"),
    ("icssr.org", "ICSSR - Indian Council of Social Science Research"),
    ("cefipra.org", "CEFIPRA - Indo-French Centre for Scientific Research"),
    ("igstc.org", "IGSTC - Indo-German Science & Technology Centre"),
    ("tdb.gov.in", "TDB - Technology Development Board"),
    ("ugc.ac.in", "UGC - University Grants Commission"),
    (
        "sparc.iitkgp.ac.in",
        "SPARC - Scheme for Promotion of Academic and Research Collaboration",
    ),
    ("nasi.org.in", "NASI - National Academy of Sciences India"),
    ("insaindia.res.in", "INSA - Indian National Science Academy"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyRule {
    pub pattern: String,
    pub name: String,
}

impl AgencyRule {
    pub fn new(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            name: name.into(),
        }
    }
}

/// Maps a source URL to an agency name using an ordered substring table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyResolver {
    rules: Vec<AgencyRule>,
}

impl AgencyResolver {
    pub fn new(rules: Vec<AgencyRule>) -> Self {
        Self { rules }
    }

    pub fn resolve(&self, source_url: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| source_url.contains(rule.pattern.as_str()))
            .map(|rule| rule.name.as_str())
            .unwrap_or(UNKNOWN_AGENCY)
    }
}

impl Default for AgencyResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_AGENCIES
                .iter()
                .map(|(pattern, name)| AgencyRule::new(*pattern, *name))
                .collect(),
        )
    }
}
