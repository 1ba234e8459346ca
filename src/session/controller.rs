//! Interactive read-translate-confirm loop
//!
//! Queries are processed strictly one at a time. The controller blocks on the
//! provider call through the caller's runtime, prints the candidates, and
//! only hands validated commands to the executor after confirmation (or
//! straight away when auto-execute is on).

use super::history::Session;
use crate::command::executor::{run_in_order, ProcessExecutor};
use crate::core::types::Query;
use crate::pipeline::{Pipeline, Translation};
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use tokio::runtime::Runtime;

const PROMPT: &str = "robocmd> ";

const EXAMPLE_QUERIES: [&str; 6] = [
    "launch gazebo with turtlebot3 burger",
    "move the robot forward at 0.5 m/s",
    "show laser scan data",
    "navigate to 2, 3",
    "list all nodes",
    "stop the simulation",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Hand validated commands over without asking
    pub auto_execute: bool,
    /// Print intent, entities and score components with each translation
    pub show_reasoning: bool,
}

/// What happened to one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Empty,
    ProviderFailed,
    NothingExecutable,
    Declined,
    Executed,
    ExecutionFailed,
}

impl QueryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, QueryOutcome::ProviderFailed | QueryOutcome::ExecutionFailed)
    }
}

/// Format a translation for the terminal
pub fn render_translation(translation: &Translation, show_reasoning: bool) -> String {
    let mut out = String::new();

    if show_reasoning {
        let _ = writeln!(out, "Intent:   {}", translation.intent);
        let _ = writeln!(out, "Entities: {}", translation.entities.to_json());
        if let Some(meta) = &translation.completion {
            let _ = writeln!(
                out,
                "Engine:   {} ({}) in {}ms",
                meta.provider, meta.model, meta.latency_ms
            );
        }
    }

    if translation.candidates.is_empty() {
        let _ = writeln!(out, "No commands generated.");
        return out;
    }

    for (i, candidate) in translation.candidates.iter().enumerate() {
        if candidate.is_validated() {
            let _ = writeln!(
                out,
                "{:>2}. {}  [confidence {:.2}]",
                i + 1,
                candidate.text,
                candidate.confidence
            );
        } else {
            let _ = writeln!(
                out,
                "{:>2}. {}  [REJECTED: {}]",
                i + 1,
                candidate.text,
                candidate.rejection_reason()
            );
        }
        for warning in &candidate.warnings {
            let _ = writeln!(out, "    warning: {}", warning);
        }
        if show_reasoning {
            if let Some(score) = translation.scores.get(i) {
                let _ = writeln!(
                    out,
                    "    intent {:.2}, entities {:.2}, safety {:.2}",
                    score.intent_match, score.entity_coverage, score.validator_pass
                );
            }
        }
    }
    out
}

pub struct SessionController<'a, R, W, E> {
    pipeline: &'a Pipeline,
    runtime: &'a Runtime,
    input: R,
    output: W,
    executor: E,
    options: SessionOptions,
    session: Session,
}

impl<'a, R, W, E> SessionController<'a, R, W, E>
where
    R: BufRead,
    W: Write,
    E: ProcessExecutor,
{
    pub fn new(
        pipeline: &'a Pipeline,
        runtime: &'a Runtime,
        input: R,
        output: W,
        executor: E,
        options: SessionOptions,
    ) -> Self {
        Self {
            pipeline,
            runtime,
            input,
            output,
            executor,
            options,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run until an exit word or end of input
    pub fn run(&mut self) -> io::Result<()> {
        let span = tracing::info_span!("session", id = %self.session.id());
        let _enter = span.enter();
        tracing::info!("Interactive session started");

        writeln!(self.output, "robocmd interactive session {}", self.session.id())?;
        writeln!(self.output, "Type 'help' for usage, 'exit' to quit.")?;

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match input.to_lowercase().as_str() {
                "exit" | "quit" | "bye" => break,
                "help" => self.print_help()?,
                "status" => self.print_status()?,
                "history" => {
                    let transcript = self.session.transcript();
                    write!(self.output, "{}", transcript)?;
                }
                _ => {
                    self.process(input)?;
                }
            }
        }

        tracing::info!(queries = self.session.len(), "Interactive session ended");
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Translate, present and possibly execute one query
    pub fn process(&mut self, input: &str) -> io::Result<QueryOutcome> {
        let translation = match self.runtime.block_on(self.pipeline.translate(input)) {
            Ok(translation) => translation,
            Err(e) => {
                tracing::warn!(kind = %e.kind(), "Provider call failed: {}", e);
                writeln!(self.output, "Error ({}): {}", e.kind(), e)?;
                self.session.record_failure(Query::new(input), e.to_string());
                return Ok(QueryOutcome::ProviderFailed);
            }
        };

        if translation.query.is_empty() {
            return Ok(QueryOutcome::Empty);
        }

        let rendered = render_translation(&translation, self.options.show_reasoning);
        write!(self.output, "{}", rendered)?;
        self.session
            .record(translation.query.clone(), translation.candidates.clone());

        self.hand_off(&translation)
    }

    fn hand_off(&mut self, translation: &Translation) -> io::Result<QueryOutcome> {
        let commands: Vec<&str> = translation.executable().map(|c| c.text.as_str()).collect();
        if commands.is_empty() {
            writeln!(self.output, "Nothing to execute.")?;
            return Ok(QueryOutcome::NothingExecutable);
        }

        if !self.options.auto_execute && !self.confirm(commands.len())? {
            writeln!(self.output, "Skipped.")?;
            return Ok(QueryOutcome::Declined);
        }

        let report = match run_in_order(&mut self.executor, commands.iter().copied()) {
            Ok(report) => report,
            Err(e) => {
                writeln!(self.output, "Execution error: {}", e)?;
                return Ok(QueryOutcome::ExecutionFailed);
            }
        };

        for (_, output) in &report.outputs {
            write!(self.output, "{}", output.stdout)?;
            if !output.stderr.is_empty() {
                write!(self.output, "{}", output.stderr)?;
            }
        }
        match report.failed {
            Some(command) => {
                writeln!(
                    self.output,
                    "Command failed: {} (remaining steps skipped)",
                    command
                )?;
                Ok(QueryOutcome::ExecutionFailed)
            }
            None => Ok(QueryOutcome::Executed),
        }
    }

    fn confirm(&mut self, count: usize) -> io::Result<bool> {
        write!(self.output, "Execute {} command(s)? [y/N] ", count)?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn print_help(&mut self) -> io::Result<()> {
        writeln!(self.output, "Describe what the robot or simulator should do.")?;
        writeln!(self.output, "Examples:")?;
        for example in EXAMPLE_QUERIES {
            writeln!(self.output, "  {}", example)?;
        }
        writeln!(self.output, "Reserved inputs:")?;
        writeln!(self.output, "  help     show this message")?;
        writeln!(self.output, "  status   show engine and safety settings")?;
        writeln!(self.output, "  history  show this session's queries")?;
        writeln!(self.output, "  exit     end the session (also quit, bye)")?;
        Ok(())
    }

    fn print_status(&mut self) -> io::Result<()> {
        let info = self.pipeline.engine_info();
        writeln!(self.output, "{}", info)?;
        writeln!(self.output, "Session:        {}", self.session.id())?;
        writeln!(self.output, "Queries:        {}", self.session.len())?;
        writeln!(
            self.output,
            "Auto-execute:   {}",
            if self.options.auto_execute { "on" } else { "off" }
        )?;
        Ok(())
    }
}
