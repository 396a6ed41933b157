//! External-command compiler, the binary's default port.
//!
//! # Responsibilities
//! - Spawn the configured compiler command once per compile
//! - Feed template source on stdin, pass the template name as an argument
//! - Read compiled output from stdout, surface stderr on failure
//!
//! # Design Decisions
//! - One process per call: no shared interpreter state, so concurrent
//!   compiles need no serialization
//! - The provider probes the command at acquisition time so a missing
//!   binary surfaces as a provider failure, not a per-compile one

use std::io::Write;
use std::process::{Command, Stdio};

use crate::compiler::port::{CompileError, CompilerProvider, ProviderError, TemplateCompiler};
use crate::config::CompilerConfig;

/// Compiles templates by invoking an external compiler binary.
pub struct DustcCompiler {
    command: String,
    args: Vec<String>,
}

impl DustcCompiler {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl TemplateCompiler for DustcCompiler {
    fn compile(&self, name: &str, source: &str) -> Result<String, CompileError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(format!("--name={name}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin handle is dropped after writing so the child sees EOF
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(CompileError::Rejected {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| CompileError::InvalidOutput)
    }
}

/// Provider wiring [`DustcCompiler`] from configuration.
pub struct DustcProvider {
    config: CompilerConfig,
}

impl DustcProvider {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }
}

impl CompilerProvider for DustcProvider {
    fn create_compiler(&self) -> Result<Box<dyn TemplateCompiler>, ProviderError> {
        // Probe: the command must at least be spawnable on this host.
        Command::new(&self.config.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                ProviderError::Unavailable(format!("{}: {}", self.config.command, e))
            })?;

        Ok(Box::new(DustcCompiler::new(
            self.config.command.clone(),
            self.config.args.clone(),
        )))
    }
}
