//! Adapter for discovery tools invoked as child processes.

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use subtake_common::config::DEFAULT_SOURCE_TIMEOUT;
use subtake_common::domain::Domain;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{SourceError, SourceOutput, SubdomainSource};
use crate::parser::OutputFormat;

const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Runs `program` with a fixed argument list and captures its standard output.
///
/// Arguments may embed `{domain}`, which is replaced by the target domain. No shell is
/// involved, so the domain can never introduce extra arguments.
#[derive(Debug, Clone)]
pub struct CommandSource {
    name: String,
    slug: String,
    program: String,
    args: Vec<String>,
    format: OutputFormat,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        program: impl Into<String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            program: program.into(),
            args: Vec::new(),
            format,
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn render_args(&self, domain: &Domain) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(DOMAIN_PLACEHOLDER, domain.as_str()))
            .collect()
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        match source.kind() {
            ErrorKind::NotFound => SourceError::Unavailable {
                program: self.program.clone(),
            },
            _ => SourceError::Io {
                program: self.program.clone(),
                source,
            },
        }
    }
}

#[async_trait]
impl SubdomainSource for CommandSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn format(&self) -> OutputFormat {
        self.format
    }

    async fn fetch(
        &self,
        domain: &Domain,
        cancel: &CancellationToken,
    ) -> Result<SourceOutput, SourceError> {
        let args = self.render_args(domain);
        debug!("running {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.io_error(e))?;

        let stdout = child.stdout.take().ok_or_else(|| SourceError::Io {
            program: self.program.clone(),
            source: std::io::Error::other("stdout was not captured"),
        })?;

        let mut lines = Vec::new();
        // The read future borrows `lines`; it is dropped before they are returned.
        let stop = {
            let run = read_until_exit(&mut child, stdout, &mut lines);
            tokio::select! {
                res = tokio::time::timeout(self.timeout, run) => match res {
                    Ok(status) => Ok(status),
                    Err(_) => Err(Stop::TimedOut),
                },
                _ = cancel.cancelled() => Err(Stop::Cancelled),
            }
        };

        // Returning drops `child`, which kills a tool that is still running.
        match stop {
            Ok(status) => {
                let status = status.map_err(|e| self.io_error(e))?;
                Ok(SourceOutput::exited(lines, status))
            }
            Err(Stop::TimedOut) => Err(SourceError::TimedOut {
                program: self.program.clone(),
                after: self.timeout,
                partial: lines,
            }),
            Err(Stop::Cancelled) => Err(SourceError::Cancelled {
                program: self.program.clone(),
                partial: lines,
            }),
        }
    }
}

enum Stop {
    TimedOut,
    Cancelled,
}

/// Collects stdout line by line until the tool closes it, then reaps the process.
async fn read_until_exit(
    child: &mut Child,
    stdout: ChildStdout,
    lines: &mut Vec<String>,
) -> std::io::Result<ExitStatus> {
    let mut segments = BufReader::new(stdout).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        lines.push(line.strip_suffix('\r').unwrap_or(&*line).to_string());
    }
    child.wait().await
}
