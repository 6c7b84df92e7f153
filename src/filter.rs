use crate::error::{Result, WatchError};
use crate::resolver::ProcessNameResolver;

/// Target value that switches matching to "every process".
pub const MATCH_ALL: &str = "0";

/// Processes to watch, given as process names and/or decimal PIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    targets: Vec<String>,
    debug: bool,
}

/// Matcher outcome for one pid. The resolved name is carried along so the
/// projector does not look it up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub name: String,
    pub matched: bool,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Split a comma-separated list, trimming tokens and dropping empty ones.
fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Parse the `-p` list. Every token must be a decimal pid; tokens are kept
/// in their textual form.
fn parse_pid_list(s: &str) -> Result<Vec<String>> {
    split_list(s)
        .map(|token| {
            token
                .parse::<u32>()
                .map(|_| token.to_string())
                .map_err(|_| WatchError::InvalidPid(token.to_string()))
        })
        .collect()
}

impl TargetSpec {
    /// Build targets from the `-n` (names) and `-p` (pids) lists.
    ///
    /// At least one target is required. A `"0"` anywhere turns on match-all
    /// mode, which makes pid 0 itself untargetable.
    pub fn from_lists(names: Option<&str>, pids: Option<&str>) -> Result<Self> {
        let mut targets: Vec<String> = names
            .map(|n| split_list(n).map(str::to_string).collect())
            .unwrap_or_default();
        if let Some(p) = pids {
            targets.extend(parse_pid_list(p)?);
        }
        if targets.is_empty() {
            return Err(WatchError::NoTargets);
        }
        let debug = targets.iter().any(|t| t == MATCH_ALL);
        Ok(TargetSpec { targets, debug })
    }

    pub fn is_match_all(&self) -> bool {
        self.debug
    }

    /// Human-readable target list for the startup banner.
    pub fn describe(&self) -> String {
        if self.debug {
            "all processes".to_string()
        } else {
            self.targets.join(", ")
        }
    }

    /// Decide whether the process owning a row is being watched.
    ///
    /// Order: match-all, then the pid as text, then the resolved name
    /// compared case-insensitively. The pid check comes first so targeting
    /// by pid does not need a name lookup to decide.
    pub fn matches(&self, pid: u32, resolver: &ProcessNameResolver) -> Verdict {
        if self.debug || self.targets.contains(&pid.to_string()) {
            return Verdict {
                name: resolver.resolve(pid),
                matched: true,
            };
        }

        let name = resolver.resolve(pid);
        let lowered = name.to_lowercase();
        let matched = self.targets.iter().any(|t| t.to_lowercase() == lowered);
        Verdict { name, matched }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::FakeProcesses;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn resolver(procs: &[(u32, &str)]) -> ProcessNameResolver {
        ProcessNameResolver::new(Box::new(FakeProcesses::new(procs)))
    }

    // -----------------------------------------------------------------------
    // Parsing tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_names_and_pids_merge() {
        let spec = TargetSpec::from_lists(Some("java.exe, nginx"), Some("1234")).unwrap();
        assert_eq!(spec.describe(), "java.exe, nginx, 1234");
        assert!(!spec.is_match_all());
    }

    #[test]
    fn test_empty_lists_rejected() {
        assert!(matches!(
            TargetSpec::from_lists(None, None),
            Err(WatchError::NoTargets)
        ));
        assert!(matches!(
            TargetSpec::from_lists(Some(""), Some(" , ")),
            Err(WatchError::NoTargets)
        ));
    }

    #[test]
    fn test_invalid_pid_rejected() {
        match TargetSpec::from_lists(None, Some("12,abc")) {
            Err(WatchError::InvalidPid(token)) => assert_eq!(token, "abc"),
            other => panic!("expected InvalidPid, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_enables_match_all() {
        let spec = TargetSpec::from_lists(Some("java.exe"), Some("0")).unwrap();
        assert!(spec.is_match_all());
        assert_eq!(spec.describe(), "all processes");
    }

    // -----------------------------------------------------------------------
    // Matching tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_name_match_is_case_insensitive() {
        let spec = TargetSpec::from_lists(Some("java.exe"), None).unwrap();
        let resolver = resolver(&[(10, "JAVA.EXE"), (11, "javaw.exe")]);

        let verdict = spec.matches(10, &resolver);
        assert!(verdict.matched);
        assert_eq!(verdict.name, "JAVA.EXE");

        assert!(!spec.matches(11, &resolver).matched);
    }

    #[test]
    fn test_long_name_matches_whole() {
        let spec = TargetSpec::from_lists(Some("My-Long-Service-Name"), None).unwrap();
        let resolver = resolver(&[(5, "my-long-service-name"), (6, "my-long-service")]);

        assert!(spec.matches(5, &resolver).matched);
        assert!(!spec.matches(6, &resolver).matched);
    }

    #[test]
    fn test_pid_match() {
        let spec = TargetSpec::from_lists(None, Some("4321")).unwrap();
        let resolver = resolver(&[(4321, "postgres"), (4322, "postgres")]);

        let verdict = spec.matches(4321, &resolver);
        assert_eq!(
            verdict,
            Verdict {
                name: "postgres".to_string(),
                matched: true
            }
        );
        assert!(!spec.matches(4322, &resolver).matched);
    }

    #[test]
    fn test_match_all_matches_every_pid() {
        let spec = TargetSpec::from_lists(Some("nothing-runs-this"), Some("0")).unwrap();
        let resolver = resolver(&[(1, "init")]);

        assert!(spec.matches(1, &resolver).matched);
        let verdict = spec.matches(999, &resolver);
        assert!(verdict.matched);
        assert_eq!(verdict.name, "N/A");
    }

    #[test]
    fn test_unresolved_pid_still_matches_by_pid() {
        let spec = TargetSpec::from_lists(None, Some("77")).unwrap();
        let resolver = resolver(&[]);
        let verdict = spec.matches(77, &resolver);
        assert!(verdict.matched);
        assert_eq!(verdict.name, "N/A");
    }

    #[test]
    fn test_non_match_scans_once_per_pid() {
        let spec = TargetSpec::from_lists(Some("sshd"), None).unwrap();
        let fake = FakeProcesses::new(&[(5, "bash")]);
        let scans = Arc::clone(&fake.scans);
        let resolver = ProcessNameResolver::new(Box::new(fake));

        for _ in 0..3 {
            let verdict = spec.matches(5, &resolver);
            assert!(!verdict.matched);
            assert_eq!(verdict.name, "bash");
        }
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }
}
