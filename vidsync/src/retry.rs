/*!
    Bounded retry for operations that can report "nothing yet".
*/

use std::fmt;
use std::thread;
use std::time::Duration;

use thiserror::Error;

/**
    Retry an operation a fixed number of times with a fixed pause between
    attempts.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E: fmt::Debug + fmt::Display> {
    /// Every attempt failed with a retryable error; `last` is the final one.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that retrying cannot fix.
    #[error("{0}")]
    Fatal(E),
}

impl<E: fmt::Debug + fmt::Display> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal(e) => e,
        }
    }
}

impl RetryPolicy {
    /**
        A policy making at most `attempts` calls. Zero is treated as one.
    */
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn run<T, E>(
        &self,
        mut op: impl FnMut() -> Result<T, E>,
        retryable: impl Fn(&E) -> bool,
    ) -> Result<T, RetryError<E>>
    where
        E: fmt::Debug + fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !retryable(&e) => return Err(RetryError::Fatal(e)),
                Err(e) if attempt >= self.attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(_) => {
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }
    }
}
