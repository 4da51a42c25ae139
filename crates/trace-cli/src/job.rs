//! Background pipeline jobs.
//!
//! A job runs on its own thread and reports stage changes and its final
//! result over a channel. The handle is polled from the caller's thread.
//! Jobs cannot be cancelled.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};

/// Observable state of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running { stage: String },
    Finished,
    Failed { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed { .. })
    }
}

enum JobUpdate<T> {
    Stage(String),
    Done(Result<T>),
}

/// Passed to the job body to announce stage changes.
pub struct JobReporter<T> {
    sender: Sender<JobUpdate<T>>,
}

impl<T> JobReporter<T> {
    pub fn stage(&self, name: &str) {
        // The handle may already be gone; progress is best-effort.
        let _ = self.sender.send(JobUpdate::Stage(name.to_string()));
    }
}

/// Handle to a job running on a worker thread.
pub struct JobHandle<T> {
    name: String,
    receiver: Receiver<JobUpdate<T>>,
    status: JobStatus,
    result: Option<Result<T>>,
    thread: Option<JoinHandle<()>>,
}

/// Spawns `body` on a worker thread.
pub fn spawn_job<T, F>(name: &str, body: F) -> JobHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&JobReporter<T>) -> Result<T> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let reporter = JobReporter { sender };
    let thread = thread::spawn(move || {
        let result = body(&reporter);
        let _ = reporter.sender.send(JobUpdate::Done(result));
    });
    tracing::debug!(job = name, "spawned job");

    JobHandle {
        name: name.to_string(),
        receiver,
        status: JobStatus::Pending,
        result: None,
        thread: Some(thread),
    }
}

impl<T> JobHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status after draining pending updates.
    pub fn status(&mut self) -> &JobStatus {
        self.poll();
        &self.status
    }

    /// True until the job has finished or failed.
    pub fn is_alive(&mut self) -> bool {
        !self.status().is_terminal()
    }

    /// Takes the result if the job has completed.
    pub fn try_result(&mut self) -> Option<Result<T>> {
        self.poll();
        self.result.take()
    }

    /// Blocks until the job completes.
    pub fn wait(mut self) -> Result<T> {
        while self.result.is_none() && !self.status.is_terminal() {
            match self.receiver.recv() {
                Ok(update) => self.apply(update),
                Err(_) => self.disconnected(),
            }
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        self.result
            .take()
            .unwrap_or_else(|| Err(anyhow!("job '{}' result already taken", self.name)))
    }

    fn poll(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        loop {
            match self.receiver.try_recv() {
                Ok(update) => self.apply(update),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected();
                    break;
                }
            }
        }
    }

    fn apply(&mut self, update: JobUpdate<T>) {
        match update {
            JobUpdate::Stage(stage) => {
                tracing::debug!(job = %self.name, stage = %stage, "job stage");
                self.status = JobStatus::Running { stage };
            }
            JobUpdate::Done(result) => {
                self.status = match &result {
                    Ok(_) => JobStatus::Finished,
                    Err(error) => JobStatus::Failed {
                        error: format!("{error:#}"),
                    },
                };
                self.result = Some(result);
            }
        }
    }

    /// The worker exited without reporting a result.
    fn disconnected(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        let error = format!("job '{}' exited without a result", self.name);
        self.status = JobStatus::Failed {
            error: error.clone(),
        };
        self.result = Some(Err(anyhow!(error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_job_reports_stages_and_result() {
        let gate = Arc::new(Barrier::new(2));
        let worker_gate = Arc::clone(&gate);
        let mut job = spawn_job("sum", move |reporter| {
            reporter.stage("encode");
            worker_gate.wait();
            Ok(41 + 1)
        });
        gate.wait();
        assert!(!matches!(job.status(), JobStatus::Failed { .. }));
        assert_eq!(job.wait().unwrap(), 42);
    }

    #[test]
    fn test_failed_job() {
        let mut job = spawn_job::<(), _>("broken", |_| Err(anyhow!("bad config")));
        let result = loop {
            if let Some(result) = job.try_result() {
                break result;
            }
            thread::yield_now();
        };
        assert_eq!(result.unwrap_err().to_string(), "bad config");
        assert_eq!(
            job.status(),
            &JobStatus::Failed {
                error: "bad config".to_string()
            }
        );
        assert!(!job.is_alive());
    }

    #[test]
    fn test_panicking_job_fails() {
        let job = spawn_job::<(), _>("panics", |_| panic!("worker panic"));
        let err = job.wait().unwrap_err();
        assert!(err.to_string().contains("exited without a result"));
    }
}
