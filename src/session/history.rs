//! In-memory session history

use crate::core::types::{CommandCandidate, Query};
use std::fmt::Write;
use uuid::Uuid;

/// One processed query and what came of it
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub query: Query,
    pub candidates: Vec<CommandCandidate>,
    /// Provider failure that left the query without candidates
    pub error: Option<String>,
}

/// Append-only record of a session; dropped with the session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    entries: Vec<SessionEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entries: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn record(&mut self, query: Query, candidates: Vec<CommandCandidate>) {
        self.entries.push(SessionEntry {
            query,
            candidates,
            error: None,
        });
    }

    pub fn record_failure(&mut self, query: Query, error: impl Into<String>) {
        self.entries.push(SessionEntry {
            query,
            candidates: Vec::new(),
            error: Some(error.into()),
        });
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable transcript, oldest query first
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Session {}", self.id);
        if self.entries.is_empty() {
            let _ = writeln!(out, "(no queries yet)");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "[{}] {}", i + 1, entry.query.raw().trim());
            if let Some(error) = &entry.error {
                let _ = writeln!(out, "    error: {}", error);
            }
            for candidate in &entry.candidates {
                if candidate.is_validated() {
                    let _ = writeln!(
                        out,
                        "    ok   {:.2}  {}",
                        candidate.confidence, candidate.text
                    );
                } else {
                    let _ = writeln!(
                        out,
                        "    no   {:.2}  {}  ({})",
                        candidate.confidence,
                        candidate.text,
                        candidate.rejection_reason()
                    );
                }
            }
        }
        out
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_only_order() {
        let mut session = Session::new();
        assert!(session.is_empty());

        session.record(Query::new("launch gazebo"), vec![CommandCandidate::new("robo sim launch gazebo")]);
        session.record_failure(Query::new("echo /scan"), "request timed out after 30s");

        assert_eq!(session.len(), 2);
        assert_eq!(session.entries()[0].query.normalized(), "launch gazebo");
        assert_eq!(session.entries()[1].candidates.len(), 0);
    }

    #[test]
    fn test_transcript() {
        let mut session = Session::new();
        let mut ok = CommandCandidate::new("robo sim launch gazebo");
        ok.approve();
        ok.confidence = 1.0;
        let mut bad = CommandCandidate::new("rm -rf /");
        bad.reject("unrecognized command namespace");
        session.record(Query::new("Launch Gazebo"), vec![ok, bad]);

        let transcript = session.transcript();
        assert!(transcript.starts_with(&format!("Session {}\n", session.id())));
        assert!(transcript.contains("[1] Launch Gazebo\n"));
        assert!(transcript.contains("    ok   1.00  robo sim launch gazebo\n"));
        assert!(transcript.contains("    no   0.00  rm -rf /  (unrecognized command namespace)\n"));
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }
}
