use super::ImageCompressor;
use crate::error::CompressError;
use crate::models::{CompressOptions, CompressedFile, Dimensions, InputFile, OutputFile};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Stand-in compressor that halves every file without decoding it.
pub struct MockImageProcessor {
    process_count: Arc<Mutex<usize>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
    delays: HashMap<String, Duration>,
    panicking_names: HashSet<String>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(Mutex::new(0)),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
            delays: HashMap::new(),
            panicking_names: HashSet::new(),
        }
    }

    /// Fail with a decode error whenever a file with this name is compressed.
    pub fn with_failure(self, name: &str) -> Self {
        self.failing_names.lock().unwrap().insert(name.to_string());
        self
    }

    /// Sleep before answering for `name`, to shuffle completion order in tests.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Panic inside the compressor for this name, as a crashing worker would.
    pub fn with_panic(mut self, name: &str) -> Self {
        self.panicking_names.insert(name.to_string());
        self
    }

    pub fn get_process_count(&self) -> usize {
        *self.process_count.lock().unwrap()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCompressor for MockImageProcessor {
    async fn compress_image(
        &self,
        file: Arc<InputFile>,
        _options: &CompressOptions,
    ) -> Result<OutputFile, CompressError> {
        *self.process_count.lock().unwrap() += 1;

        if let Some(delay) = self.delays.get(&file.name) {
            tokio::time::sleep(*delay).await;
        }

        if self.panicking_names.contains(&file.name) {
            panic!("Mock panic for {}", file.name);
        }

        if self.failing_names.lock().unwrap().contains(&file.name) {
            return Err(CompressError::Decode(format!(
                "Mock failure for {}",
                file.name
            )));
        }

        Ok(OutputFile::Compressed(CompressedFile {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
            data: file.data[..file.data.len() / 2].to_vec(),
            dimensions: Dimensions::new(1, 1),
            last_modified: Utc::now(),
        }))
    }
}
