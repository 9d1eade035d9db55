//! Asynchronous model loading.
//!
//! [`ModelLoader`] keeps a single load slot: a new request aborts the
//! pending one, and a completion from a superseded request is discarded
//! even if it already finished. The UI thread collects results with the
//! non-blocking [`ModelLoader::poll`].

pub mod glb;

use std::time::{Duration, Instant};

use shared::AssetLocation;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::LoadError;
use crate::state::model::Model;
use crate::validation;

/// Finished load, delivered by [`ModelLoader::poll`]
#[derive(Debug)]
pub struct LoadCompletion {
    pub generation: u64,
    pub label: String,
    pub result: Result<Model, LoadError>,
}

pub struct ModelLoader {
    /// Created on the first request
    runtime: Option<Runtime>,
    tx: mpsc::UnboundedSender<LoadCompletion>,
    rx: mpsc::UnboundedReceiver<LoadCompletion>,
    /// Generation of the latest request; older completions are stale
    generation: u64,
    pending: Option<AbortHandle>,
}

impl ModelLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime: None,
            tx,
            rx,
            generation: 0,
            pending: None,
        }
    }

    fn runtime(&mut self) -> Result<&Runtime, LoadError> {
        if self.runtime.is_none() {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("skelview-loader")
                .enable_all()
                .build()?;
            self.runtime = Some(runtime);
        }
        self.runtime.as_ref().ok_or(LoadError::Cancelled)
    }

    /// Start loading `location` as a model named `label`, replacing any
    /// pending request. Returns the request generation.
    pub fn request(
        &mut self,
        label: &str,
        location: AssetLocation,
        default_color: [f32; 3],
    ) -> Result<u64, LoadError> {
        self.cancel();

        let generation = self.generation;
        let tx = self.tx.clone();
        let label = label.to_string();
        tracing::info!("Loading '{label}' from {location}");

        let handle = self.runtime()?.spawn(async move {
            let result = load_model(&location, &label, default_color).await;
            // Receiver gone means the loader was dropped
            let _ = tx.send(LoadCompletion {
                generation,
                label,
                result,
            });
        });

        self.pending = Some(handle.abort_handle());
        Ok(generation)
    }

    /// Abort the pending request, if any. Its result will never be delivered.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Whether a request is still waiting to be collected
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Collect the current request's completion without blocking.
    /// Stale completions are dropped.
    pub fn poll(&mut self) -> Option<LoadCompletion> {
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(current) = self.accept(completion) {
                return Some(current);
            }
        }
        None
    }

    /// Block until the current request completes or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadCompletion> {
        if !self.is_loading() {
            return self.poll();
        }
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let runtime = self.runtime.as_ref()?;
            let rx = &mut self.rx;
            let received =
                runtime.block_on(async { tokio::time::timeout(remaining, rx.recv()).await });

            match received {
                Ok(Some(completion)) => {
                    if let Some(current) = self.accept(completion) {
                        return Some(current);
                    }
                }
                Ok(None) | Err(_) => return None,
            }
        }
    }

    fn accept(&mut self, completion: LoadCompletion) -> Option<LoadCompletion> {
        if completion.generation != self.generation {
            tracing::debug!(
                "Discarding stale load of '{}' (generation {} < {})",
                completion.label,
                completion.generation,
                self.generation
            );
            return None;
        }
        self.pending = None;
        Some(completion)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ModelLoader {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn fetch_bytes(location: &AssetLocation) -> Result<Vec<u8>, LoadError> {
    match location {
        AssetLocation::File(path) => Ok(tokio::fs::read(path).await?),
        AssetLocation::Url(url) => {
            let response = reqwest::get(url.as_str()).await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        }
    }
}

async fn load_model(
    location: &AssetLocation,
    label: &str,
    default_color: [f32; 3],
) -> Result<Model, LoadError> {
    let bytes = fetch_bytes(location).await?;
    let name = label.to_string();

    let model = tokio::task::spawn_blocking(move || glb::parse_glb(&bytes, &name, default_color))
        .await
        .map_err(|_| LoadError::Cancelled)??;

    for issue in validation::validate_model(&model) {
        tracing::warn!("'{label}' mesh issue: {issue}");
    }
    tracing::info!("Loaded '{label}': {} parts", model.part_count());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_load_from_file() {
        let dir = fixtures::TempAssets::new();
        let path = dir.write("a.glb", &fixtures::skeleton_glb());

        let mut loader = ModelLoader::new();
        loader
            .request("A", AssetLocation::File(path), [1.0; 3])
            .unwrap();
        assert!(loader.is_loading());

        let done = loader.wait(TIMEOUT).expect("load should complete");
        assert_eq!(done.label, "A");
        let model = done.result.unwrap();
        assert_eq!(model.name(), "A");
        assert!(model.part_count() > 0);
        assert!(!loader.is_loading());
    }

    #[test]
    fn test_missing_file_reports_io_error() {
        let dir = fixtures::TempAssets::new();
        let mut loader = ModelLoader::new();
        loader
            .request("X", AssetLocation::File(dir.path().join("nope.glb")), [1.0; 3])
            .unwrap();
        let done = loader.wait(TIMEOUT).unwrap();
        assert!(matches!(done.result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_superseded_request_never_delivered() {
        let dir = fixtures::TempAssets::new();
        let first = dir.write("first.glb", &fixtures::skeleton_glb());
        let second = dir.write("second.glb", &fixtures::skeleton_glb());

        let mut loader = ModelLoader::new();
        let g1 = loader.request("first", AssetLocation::File(first), [1.0; 3]).unwrap();
        let g2 = loader.request("second", AssetLocation::File(second), [1.0; 3]).unwrap();
        assert!(g2 > g1);

        let done = loader.wait(TIMEOUT).unwrap();
        assert_eq!(done.label, "second");
        assert_eq!(done.generation, g2);

        std::thread::sleep(Duration::from_millis(50));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_cancel_drops_result() {
        let dir = fixtures::TempAssets::new();
        let path = dir.write("a.glb", &fixtures::skeleton_glb());

        let mut loader = ModelLoader::new();
        loader.request("A", AssetLocation::File(path), [1.0; 3]).unwrap();
        loader.cancel();
        assert!(!loader.is_loading());

        std::thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_poll_without_request() {
        let mut loader = ModelLoader::new();
        assert!(loader.poll().is_none());
        assert!(loader.wait(Duration::from_millis(10)).is_none());
    }
}
