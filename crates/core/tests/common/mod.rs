use bytes::Bytes;
use providers::{ImageSource, MatchPayload, ProviderError, SearchResponse, SearchService};
use std::collections::HashMap;
use std::io::Cursor;

pub fn png(width: u32, height: u32) -> Bytes {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 120, 220, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

/// Serves a fixed table of queries and images; anything else is a 404.
#[derive(Default)]
pub struct FakeServer {
    answers: HashMap<String, Vec<MatchPayload>>,
    images: HashMap<String, Bytes>,
}

impl FakeServer {
    pub fn answer(mut self, query: &str, hits: &[(&str, &str, f64)]) -> Self {
        let hits = hits
            .iter()
            .map(|(path, app, distance)| MatchPayload {
                image_path: path.to_string(),
                application_name: app.to_string(),
                timestamp: "2024-06-01 21:14:03".to_string(),
                distance: *distance,
            })
            .collect();
        self.answers.insert(query.to_string(), hits);
        self
    }

    pub fn image(mut self, key: &str, bytes: Bytes) -> Self {
        self.images.insert(key.to_string(), bytes);
        self
    }
}

fn not_found() -> ProviderError {
    ProviderError::Status {
        status: 404,
        body: "not found".into(),
    }
}

#[async_trait::async_trait]
impl SearchService for FakeServer {
    async fn search(&self, text_query: &str) -> Result<SearchResponse, ProviderError> {
        let hits = self.answers.get(text_query).cloned().ok_or_else(not_found)?;
        Ok(SearchResponse {
            text_query: text_query.to_string(),
            image_list_with_metadata: hits,
        })
    }
}

#[async_trait::async_trait]
impl ImageSource for FakeServer {
    async fn fetch(&self, key: &str) -> Result<Bytes, ProviderError> {
        self.images.get(key).cloned().ok_or_else(not_found)
    }
}
