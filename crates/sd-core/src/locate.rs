use tracing::{debug, info};

use sd_http::Fetch;
use sd_model::{JobDetail, JobMetadata, JobReference};

use crate::{
    error::PipelineError,
    remote::{fetch_json, required},
};

/// Fetch the job record and derive where its build outputs and logs live.
pub async fn locate<F>(fetch: &F, job: &JobReference) -> Result<JobMetadata, PipelineError>
where
    F: Fetch + ?Sized,
{
    info!(target: "sd.locate", %job, "Getting related kernel information.");
    let detail: JobDetail = fetch_json(fetch, job.as_str()).await?;

    let kernel_url = required(detail.kernel, "kernel", job.as_str())?;
    let download_url = required(detail.download_url, "download_url", job.as_str())?;

    let meta = JobMetadata::new(job.clone(), kernel_url, download_url).ok_or_else(|| {
        PipelineError::InvalidUrl(format!("kernel url of {job} does not name a file"))
    })?;

    debug!(
        target: "sd.locate",
        build = %meta.build_base_url,
        logs = %meta.download_url,
        "job located"
    );
    Ok(meta)
}
