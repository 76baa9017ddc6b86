use crate::adapt::size::ImageSizeAdapter;
use crate::config::SizePolicy;
use crate::foundation::core::SourceFile;
use crate::foundation::error::{CutoutError, CutoutResult};
use crate::remote::transport::{Endpoint, FormPart, Transport};

/// Where the last operation stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
    /// Nothing sent yet.
    Idle,
    /// Upload number `attempt` (1-based) is in flight.
    Uploading {
        /// 1 for the original upload, 2 for the retry.
        attempt: u32,
    },
    /// The first upload was rejected as oversized; recompressing.
    Retrying,
    /// A reply body was returned.
    Succeeded,
    /// The operation ended in an error.
    Failed,
}

/// Auto-remove and refine round trips with one recompress-and-retry on oversized payloads.
///
/// Any other failure, and any failure of the retry itself, is returned to the caller.
#[derive(Debug)]
pub struct RemoteRefinePipeline<T: Transport> {
    transport: T,
    adapter: ImageSizeAdapter,
    retry_max_bytes: u64,
    state: RequestState,
    attempts: u32,
}

impl<T: Transport> RemoteRefinePipeline<T> {
    /// Pipeline over `transport` using `policy` for the retry budget.
    pub fn new(transport: T, policy: SizePolicy) -> Self {
        Self {
            transport,
            adapter: ImageSizeAdapter::new(policy),
            retry_max_bytes: policy.retry_max_bytes,
            state: RequestState::Idle,
            attempts: 0,
        }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// State after the last call.
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Uploads made by the last operation (1 or 2).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Send `file` to the background-removal endpoint; returns the cutout PNG bytes.
    #[tracing::instrument(skip(self, file), fields(name = %file.name, size = file.size()))]
    pub fn auto_remove(&mut self, file: &SourceFile) -> CutoutResult<Vec<u8>> {
        self.submit(Endpoint::RemoveBackground, file, None)
    }

    /// Send `file` and the exported mask to the refine endpoint; returns the refined PNG bytes.
    #[tracing::instrument(skip(self, file, mask_png), fields(name = %file.name, size = file.size()))]
    pub fn refine(&mut self, file: &SourceFile, mask_png: &[u8]) -> CutoutResult<Vec<u8>> {
        self.submit(Endpoint::Refine, file, Some(mask_png))
    }

    fn submit(
        &mut self,
        endpoint: Endpoint,
        file: &SourceFile,
        mask_png: Option<&[u8]>,
    ) -> CutoutResult<Vec<u8>> {
        self.attempts = 0;
        let err = match self.attempt(endpoint, file, mask_png) {
            Ok(body) => return Ok(self.succeed(body)),
            Err(err) => err,
        };
        if !err.is_payload_too_large() {
            return Err(self.fail(err));
        }

        self.state = RequestState::Retrying;
        tracing::warn!(
            size = file.size(),
            budget = self.retry_max_bytes,
            "upload rejected as too large; recompressing and retrying once"
        );
        let smaller = self.adapter.adapt(file, self.retry_max_bytes);
        match self.attempt(endpoint, &smaller, mask_png) {
            Ok(body) => Ok(self.succeed(body)),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn attempt(
        &mut self,
        endpoint: Endpoint,
        file: &SourceFile,
        mask_png: Option<&[u8]>,
    ) -> CutoutResult<Vec<u8>> {
        self.attempts += 1;
        self.state = RequestState::Uploading {
            attempt: self.attempts,
        };

        let mut parts = vec![FormPart {
            field: "file",
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
            bytes: file.bytes().to_vec(),
        }];
        if let Some(mask) = mask_png {
            parts.push(FormPart {
                field: "mask",
                file_name: "mask.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: mask.to_vec(),
            });
        }

        let reply = self.transport.post_multipart(endpoint, &parts)?.into_result()?;
        Ok(reply.body)
    }

    fn succeed(&mut self, body: Vec<u8>) -> Vec<u8> {
        self.state = RequestState::Succeeded;
        body
    }

    fn fail(&mut self, err: CutoutError) -> CutoutError {
        self.state = RequestState::Failed;
        tracing::info!(error = %err, attempts = self.attempts, "remote request failed");
        err
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/pipeline.rs"]
mod tests;
