//! In-memory stand-ins for the search server used by unit tests.

use bytes::Bytes;
use providers::{ImageSource, MatchPayload, ProviderError, SearchResponse, SearchService};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub fn png(width: u32, height: u32) -> Bytes {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 80, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

pub fn response(query: &str, paths: &[&str]) -> SearchResponse {
    SearchResponse {
        text_query: query.to_string(),
        image_list_with_metadata: paths
            .iter()
            .enumerate()
            .map(|(i, p)| MatchPayload {
                image_path: p.to_string(),
                application_name: format!("app-{i}"),
                timestamp: format!("2024-06-01 10:0{i}:00"),
                distance: i as f64 * 0.1,
            })
            .collect(),
    }
}

enum Entry {
    Bytes(Bytes),
    Status(u16),
}

#[derive(Default)]
pub struct StaticSource {
    entries: HashMap<String, Entry>,
    requests: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, key: &str, bytes: Bytes) -> Self {
        self.with_bytes(key, bytes)
    }

    pub fn with_bytes(mut self, key: &str, bytes: Bytes) -> Self {
        self.entries.insert(key.to_string(), Entry::Bytes(bytes));
        self
    }

    pub fn with_status(mut self, key: &str, status: u16) -> Self {
        self.entries.insert(key.to_string(), Entry::Status(status));
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageSource for StaticSource {
    async fn fetch(&self, key: &str) -> Result<Bytes, ProviderError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(key) {
            Some(Entry::Bytes(b)) => Ok(b.clone()),
            Some(Entry::Status(status)) => Err(ProviderError::Status {
                status: *status,
                body: String::new(),
            }),
            None => Err(ProviderError::Status {
                status: 404,
                body: "not found".into(),
            }),
        }
    }
}

type ImageGate = oneshot::Receiver<Result<Bytes, ProviderError>>;

/// Image source whose responses are released by the test, in any order.
#[derive(Default)]
pub struct GatedSource {
    gates: Mutex<HashMap<String, ImageGate>>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate(&self, key: &str) -> oneshot::Sender<Result<Bytes, ProviderError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(key.to_string(), rx);
        tx
    }
}

#[async_trait::async_trait]
impl ImageSource for GatedSource {
    async fn fetch(&self, key: &str) -> Result<Bytes, ProviderError> {
        let gate = self.gates.lock().unwrap().remove(key);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ProviderError::RequestFailed("gate dropped".into()))),
            None => Err(ProviderError::Status {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

type SearchGate = oneshot::Receiver<Result<SearchResponse, ProviderError>>;

/// Search service answering from a fixed table, or from gates the test
/// releases explicitly.
#[derive(Default)]
pub struct FakeSearch {
    answers: Mutex<HashMap<String, SearchResponse>>,
    gates: Mutex<HashMap<String, SearchGate>>,
    calls: AtomicUsize,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, query: &str, paths: &[&str]) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(query.to_string(), response(query, paths));
        self
    }

    pub fn gate(&self, query: &str) -> oneshot::Sender<Result<SearchResponse, ProviderError>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(query.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SearchService for FakeSearch {
    async fn search(&self, text_query: &str) -> Result<SearchResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(text_query);
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(ProviderError::RequestFailed("gate dropped".into())));
        }
        let answer = self.answers.lock().unwrap().get(text_query).cloned();
        answer.ok_or(ProviderError::Status {
            status: 500,
            body: "Internal server error".into(),
        })
    }
}
