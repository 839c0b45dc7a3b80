//! Concurrent build + package over a platform x architecture matrix.
//!
//! Every target becomes an independent job: build, package, then remove the
//! build directory no matter how the first two steps went. Jobs run
//! concurrently up to a parallelism cap. One target failing never cancels or
//! affects its siblings; each job's outcome is reported back individually so
//! the caller decides whether a partial release is acceptable.

mod types;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::archive;
use crate::build::{self, Compiler};
use crate::platform::{BuildMatrix, BuildTarget};
use crate::util::fs;

pub use types::{JobError, MatrixOptions, MatrixResult, TargetOutcome};

/// Build and package every target of `matrix`.
///
/// Returns once all jobs have finished. Outcomes are in matrix order.
pub async fn build_all<C: Compiler>(compiler: Arc<C>, matrix: &BuildMatrix, options: &MatrixOptions) -> MatrixResult {
  let targets = matrix.targets();
  info!(
    targets = targets.len(),
    parallelism = options.parallelism,
    "starting matrix build"
  );

  let semaphore = Arc::new(Semaphore::new(options.parallelism.max(1)));
  let options = Arc::new(options.clone());
  let mut join_set = JoinSet::new();
  let mut pending = HashMap::new();

  for (index, target) in targets.iter().enumerate() {
    let compiler = compiler.clone();
    let options = options.clone();
    let semaphore = semaphore.clone();
    let job_target = target.clone();

    let handle = join_set.spawn(async move {
      // The semaphore is never closed, so this only waits for a free slot.
      let _permit = semaphore.acquire().await;
      debug!(target = %job_target, "job started");
      run_job(compiler.as_ref(), &job_target, &options).await
    });
    pending.insert(handle.id(), (index, target.clone()));
  }

  let mut slots: Vec<Option<TargetOutcome>> = (0..targets.len()).map(|_| None).collect();

  while let Some(joined) = join_set.join_next_with_id().await {
    let (id, result, aborted) = match joined {
      Ok((id, result)) => (id, result, false),
      Err(e) => (e.id(), Err(JobError::Panicked(e.to_string())), true),
    };

    let Some((index, target)) = pending.remove(&id) else {
      warn!(task = %id, "finished job has no matching target");
      continue;
    };

    // an aborted job never reached its own cleanup
    if aborted {
      let build_dir = options.layout.build_dir(&target);
      if let Err(e) = fs::remove_tree(&build_dir).await {
        warn!(target = %target, error = %e, "failed to remove build directory of aborted job");
      }
    }

    match &result {
      Ok(archive) => info!(target = %target, archive = %archive.display(), "built zip"),
      Err(e) => error!(target = %target, error = %e, "target failed"),
    }
    slots[index] = Some(TargetOutcome { target, result });
  }

  let result = MatrixResult {
    outcomes: slots.into_iter().flatten().collect(),
  };

  info!(
    succeeded = result.succeeded().count(),
    failed = result.failed().count(),
    "matrix build complete"
  );

  result
}

/// One target: build, package, and always clean up the build directory.
async fn run_job<C: Compiler>(compiler: &C, target: &BuildTarget, options: &MatrixOptions) -> Result<PathBuf, JobError> {
  let build_dir = options.layout.build_dir(target);
  let packaged = build_and_package(compiler, target, options).await;
  let cleanup = fs::remove_tree(&build_dir).await;

  match (packaged, cleanup) {
    (Ok(archive), Ok(())) => Ok(archive),
    (Ok(_), Err(e)) => Err(JobError::Cleanup(e)),
    (Err(e), Err(cleanup_err)) => {
      warn!(target = %target, error = %cleanup_err, "cleanup after failure also failed");
      Err(e)
    }
    (Err(e), Ok(())) => Err(e),
  }
}

async fn build_and_package<C: Compiler>(
  compiler: &C,
  target: &BuildTarget,
  options: &MatrixOptions,
) -> Result<PathBuf, JobError> {
  let build_dir = build::build_binary(compiler, target, &options.layout).await?;
  fs::ensure_dir(&options.archive.output_dir)
    .await
    .map_err(JobError::Output)?;

  let archive_options = options.archive.clone();
  let target = target.clone();
  let archive = tokio::task::spawn_blocking(move || archive::package(&build_dir, &target, &archive_options))
    .await
    .map_err(|e| JobError::Panicked(e.to_string()))??;

  Ok(archive)
}
