//! In-memory runtime used by the integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use op_env::config::normalize_reference;
use op_env::runtime::{PullProgress, PullStream};
use op_env::{ClientError, ContainerHandle, ContainerInfo, Error, Result, RoleSpec, RuntimeGateway};

pub const PULL_CHUNKS: usize = 3;

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub running: bool,
}

#[derive(Default)]
struct State {
    images: HashSet<String>,
    containers: Vec<FakeContainer>,
    calls: Vec<String>,
    fail_start: HashSet<String>,
    fail_remove: HashSet<String>,
    next_id: u64,
}

/// Records every call and keeps containers keyed by name, like the engine.
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
    chunks_read: Arc<AtomicUsize>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, image: &str) -> Self {
        self.state.lock().images.insert(normalize_reference(image));
        self
    }

    /// A running container this environment did not create.
    pub fn with_running(self, name: &str, image: &str) -> Self {
        {
            let mut state = self.state.lock();
            let id = next_id(&mut state);
            state.containers.push(FakeContainer {
                id,
                name: name.to_string(),
                image: image.to_string(),
                running: true,
            });
        }
        self
    }

    pub fn fail_start(self, name: &str) -> Self {
        self.state.lock().fail_start.insert(name.to_string());
        self
    }

    pub fn fail_remove(self, target: &str) -> Self {
        self.state.lock().fail_remove.insert(target.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().containers.clone()
    }

    pub fn running_names(&self) -> Vec<String> {
        self.state
            .lock()
            .containers
            .iter()
            .filter(|c| c.running)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Pull progress records consumed so far.
    pub fn chunks_read(&self) -> usize {
        self.chunks_read.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.state.lock().calls.push(call);
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    format!("{:012x}{:052x}", 0xc0ffee000000u64 + state.next_id, state.next_id)
}

#[async_trait]
impl RuntimeGateway for FakeRuntime {
    async fn list_images(&self, _cancel: &CancellationToken) -> Result<Vec<String>> {
        self.record("list_images".to_string());
        Ok(self.state.lock().images.iter().cloned().collect())
    }

    async fn pull_image(&self, _cancel: &CancellationToken, image: &str) -> Result<PullStream> {
        self.record(format!("pull {image}"));
        self.state.lock().images.insert(normalize_reference(image));

        let counter = self.chunks_read.clone();
        let layer = image.to_string();
        let stream = futures::stream::iter(0..PULL_CHUNKS)
            .map(move |i| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(PullProgress {
                    layer: Some(format!("{layer}#{i}")),
                    status: Some("Downloading".to_string()),
                    ..Default::default()
                })
            })
            .boxed();
        Ok(stream)
    }

    async fn create_container(
        &self,
        _cancel: &CancellationToken,
        spec: &RoleSpec,
        name: &str,
    ) -> Result<ContainerHandle> {
        self.record(format!("create {name}"));
        let mut state = self.state.lock();
        if state.containers.iter().any(|c| c.name == name) {
            return Err(Error::ContainerCreate {
                name: name.to_string(),
                source: ClientError::Other(format!(
                    "Conflict. The container name \"/{name}\" is already in use"
                )),
            });
        }
        let id = next_id(&mut state);
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: spec.image.clone(),
            running: false,
        });
        Ok(ContainerHandle::new(id))
    }

    async fn start_container(&self, _cancel: &CancellationToken, handle: &ContainerHandle) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let container = state
            .containers
            .iter_mut()
            .find(|c| c.id == handle.id())
            .ok_or_else(|| Error::ContainerStart {
                id: handle.id().to_string(),
                source: ClientError::NotFound(handle.id().to_string()),
            })?;
        let call = format!("start {}", container.name);
        if state.fail_start.contains(&container.name) {
            state.calls.push(call);
            return Err(Error::ContainerStart {
                id: handle.id().to_string(),
                source: ClientError::Other("port is already allocated".to_string()),
            });
        }
        container.running = true;
        state.calls.push(call);
        Ok(())
    }

    async fn list_containers(&self, _cancel: &CancellationToken) -> Result<Vec<ContainerInfo>> {
        self.record("list_containers".to_string());
        Ok(self
            .state
            .lock()
            .containers
            .iter()
            .filter(|c| c.running)
            .map(|c| ContainerInfo {
                id: c.id.clone(),
                names: vec![format!("/{}", c.name)],
                image: c.image.clone(),
            })
            .collect())
    }

    async fn remove_container(&self, _cancel: &CancellationToken, target: &str, _force: bool) -> Result<()> {
        self.record(format!("remove {target}"));
        let mut state = self.state.lock();
        if state.fail_remove.contains(target) {
            return Err(Error::ContainerRemove {
                target: target.to_string(),
                source: ClientError::Other("driver failed to remove root filesystem".to_string()),
            });
        }
        let before = state.containers.len();
        state.containers.retain(|c| c.id != target && c.name != target);
        if state.containers.len() == before {
            return Err(Error::ContainerRemove {
                target: target.to_string(),
                source: ClientError::NotFound(target.to_string()),
            });
        }
        Ok(())
    }
}
