//! Shared test utilities for the packager crate.

use crate::assembler::BuildInvocation;
use crate::error::{PackagerError, Result};
use crate::executor::CommandExecutor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.cast_unsigned())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given exit code and stderr.
#[must_use]
pub fn failure_output(code: i32, stderr: &str) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected build-tool invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program to run (e.g., "cmake").
    pub program: String,
    /// Exact argument tokens, or `None` to accept any arguments.
    pub args: Option<Vec<String>>,
    /// The result to return when this invocation is received.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `program` with any arguments.
    #[must_use]
    pub fn any_args(program: &str, result: Result<Output>) -> Self {
        Self {
            program: program.to_owned(),
            args: None,
            result,
        }
    }

    /// Expect `program` with exactly `args`.
    #[must_use]
    pub fn exact(program: &str, args: &[String], result: Result<Output>) -> Self {
        Self {
            program: program.to_owned(),
            args: Some(args.to_vec()),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Hands out predefined results in order and records every invocation it
/// receives, allowing tests to verify the commands without running them.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    received: RefCell<Vec<BuildInvocation>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            received: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far, oldest first.
    #[must_use]
    pub fn received(&self) -> Vec<BuildInvocation> {
        self.received.borrow().clone()
    }

    /// Asserts that all expected invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, invocation: &BuildInvocation) -> Result<Output> {
        self.received.borrow_mut().push(invocation.clone());

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(PackagerError::StubMismatch {
                message: format!("unexpected invocation: {invocation}"),
            });
        };

        if call.program != invocation.program() {
            return Err(PackagerError::StubMismatch {
                message: format!(
                    "expected program {}, got {}",
                    call.program,
                    invocation.program()
                ),
            });
        }
        if let Some(args) = &call.args {
            if args.as_slice() != invocation.args() {
                return Err(PackagerError::StubMismatch {
                    message: format!("expected args {args:?}, got {:?}", invocation.args()),
                });
            }
        }

        call.result
    }
}
