use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use tokio::{fs, sync::Mutex, time::Instant};

use crate::{
    cache::content_hash,
    config::{AnalyzerConfig, PollPolicy},
    error::{Result, SentiscopeError},
    gemini::MediaApi,
    types::{FileState, ProcessedVideo, RemoteFile},
};

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mpeg"];

/// Resolve the MIME type for an uploaded file name, rejecting unsupported formats.
pub fn video_mime_type(file_name: &str) -> Result<&'static str> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => Ok("video/mp4"),
        "avi" => Ok("video/x-msvideo"),
        "mov" => Ok("video/quicktime"),
        "mpeg" | "mpg" => Ok("video/mpeg"),
        _ => Err(SentiscopeError::UnsupportedUpload {
            reason: format!(
                "{file_name} is not a supported video ({})",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        }),
    }
}

struct CachedFile {
    file: RemoteFile,
    stored_at: Instant,
}

/// Uploads videos to the provider and waits for its processing job.
///
/// Processed handles are cached by content hash, so uploading byte-identical
/// content again skips the upload and the processing wait.
pub struct VideoProcessor {
    api: Arc<dyn MediaApi>,
    poll: PollPolicy,
    temp_dir: PathBuf,
    cache_ttl: Duration,
    cache: Mutex<HashMap<u64, CachedFile>>,
}

impl VideoProcessor {
    pub fn new(api: Arc<dyn MediaApi>, config: &AnalyzerConfig) -> Self {
        Self {
            api,
            poll: config.poll.clone(),
            temp_dir: config.temp_dir.clone(),
            cache_ttl: config.cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn upload_and_process(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> Result<ProcessedVideo> {
        let content_hash = content_hash(bytes);

        if let Some(file) = self.cached(content_hash).await {
            tracing::info!(file = %file.name, "reusing processed video");
            return Ok(ProcessedVideo {
                file,
                cached: true,
            });
        }

        let uploaded = {
            fs::create_dir_all(&self.temp_dir).await?;
            let suffix = display_name
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{ext}"))
                .unwrap_or_default();
            // Removed when the guard drops, whichever way this block exits.
            let temp = tempfile::Builder::new()
                .prefix("sentiscope-")
                .suffix(&suffix)
                .tempfile_in(&self.temp_dir)?;
            fs::write(temp.path(), bytes).await?;

            self.api
                .upload_file(temp.path(), mime_type, display_name)
                .await?
        };

        let file = self.wait_until_processed(uploaded).await?;

        self.cache.lock().await.insert(
            content_hash,
            CachedFile {
                file: file.clone(),
                stored_at: Instant::now(),
            },
        );

        Ok(ProcessedVideo {
            file,
            cached: false,
        })
    }

    async fn cached(&self, content_hash: u64) -> Option<RemoteFile> {
        let expired = {
            let mut cache = self.cache.lock().await;
            let fresh = cache
                .get(&content_hash)
                .map(|entry| entry.stored_at.elapsed() < self.cache_ttl);
            match fresh {
                Some(true) => return cache.get(&content_hash).map(|e| e.file.clone()),
                Some(false) => cache.remove(&content_hash).map(|e| e.file),
                None => None,
            }
        };

        if let Some(file) = expired {
            self.delete_remote(&file).await;
        }
        None
    }

    async fn wait_until_processed(&self, mut file: RemoteFile) -> Result<RemoteFile> {
        let started = Instant::now();
        let mut attempts = 0;

        while file.state == FileState::Processing {
            if attempts >= self.poll.max_attempts
                || started.elapsed() + self.poll.interval > self.poll.deadline
            {
                self.delete_remote(&file).await;
                return Err(SentiscopeError::ProcessingTimeout {
                    file: file.name,
                    attempts,
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }

            tokio::time::sleep(self.poll.interval).await;
            attempts += 1;
            file = self.api.get_file(&file.name).await?;
            tracing::debug!(file = %file.name, state = file.state.name(), attempts, "polled video");
        }

        if file.state == FileState::Failed {
            if let Some(err) = &file.error {
                tracing::warn!(file = %file.name, code = err.code, "{}", err.message);
            }
            self.delete_remote(&file).await;
            return Err(SentiscopeError::ProcessingFailed {
                file: file.name,
                state: FileState::Failed.name().to_string(),
            });
        }

        tracing::info!(file = %file.name, attempts, "video processed");
        Ok(file)
    }

    /// Delete a processed file remotely and forget it.
    pub async fn release(&self, file: &RemoteFile) {
        self.cache
            .lock()
            .await
            .retain(|_, entry| entry.file.name != file.name);
        self.delete_remote(file).await;
    }

    /// Drop cache entries older than the cache TTL and delete them remotely.
    pub async fn evict_expired(&self) -> usize {
        let expired: Vec<RemoteFile> = {
            let mut cache = self.cache.lock().await;
            let keys: Vec<u64> = cache
                .iter()
                .filter(|(_, entry)| entry.stored_at.elapsed() >= self.cache_ttl)
                .map(|(key, _)| *key)
                .collect();
            keys.iter()
                .filter_map(|key| cache.remove(key).map(|e| e.file))
                .collect()
        };

        for file in &expired {
            self.delete_remote(file).await;
        }
        expired.len()
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn delete_remote(&self, file: &RemoteFile) {
        if let Err(e) = self.api.delete_file(&file.name).await {
            tracing::warn!(file = %file.name, error = %e, "failed to delete remote file");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicU32, Ordering},
        },
    };

    use async_trait::async_trait;

    use super::*;

    /// Reports `Processing` for a fixed number of polls, then `final_state`.
    struct ScriptedApi {
        polls_before_done: u32,
        final_state: FileState,
        uploads: AtomicU32,
        polls: AtomicU32,
        deleted: StdMutex<Vec<String>>,
        seen_paths: StdMutex<Vec<PathBuf>>,
    }

    impl ScriptedApi {
        fn new(polls_before_done: u32, final_state: FileState) -> Arc<Self> {
            Arc::new(Self {
                polls_before_done,
                final_state,
                uploads: AtomicU32::new(0),
                polls: AtomicU32::new(0),
                deleted: StdMutex::new(Vec::new()),
                seen_paths: StdMutex::new(Vec::new()),
            })
        }

        fn file(&self, state: FileState) -> RemoteFile {
            RemoteFile {
                name: "files/video-1".into(),
                mime_type: "video/mp4".into(),
                uri: "https://example.test/files/video-1".into(),
                state,
                ..RemoteFile::default()
            }
        }
    }

    #[async_trait]
    impl MediaApi for ScriptedApi {
        async fn upload_file(&self, path: &Path, _: &str, _: &str) -> Result<RemoteFile> {
            assert!(path.exists(), "temp file must exist during upload");
            self.seen_paths.lock().unwrap().push(path.to_path_buf());
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(self.file(FileState::Processing))
        }

        async fn get_file(&self, _: &str) -> Result<RemoteFile> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.polls_before_done {
                Ok(self.file(self.final_state))
            } else {
                Ok(self.file(FileState::Processing))
            }
        }

        async fn delete_file(&self, name: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(name.to_string());
            Ok(())
        }

        async fn generate_content(&self, _: &str, _: &RemoteFile) -> Result<String> {
            unreachable!("not used by the processor")
        }
    }

    fn test_config(temp_dir: &Path, max_attempts: u32) -> AnalyzerConfig {
        AnalyzerConfig {
            poll: PollPolicy {
                interval: Duration::from_millis(1),
                max_attempts,
                deadline: Duration::from_secs(5),
            },
            temp_dir: temp_dir.to_path_buf(),
            ..AnalyzerConfig::default()
        }
    }

    #[test]
    fn accepts_only_supported_video_extensions() {
        assert_eq!(video_mime_type("clip.MP4").unwrap(), "video/mp4");
        assert_eq!(video_mime_type("talk.mov").unwrap(), "video/quicktime");
        assert!(matches!(
            video_mime_type("notes.txt"),
            Err(SentiscopeError::UnsupportedUpload { .. })
        ));
        assert!(video_mime_type("no_extension").is_err());
    }

    #[tokio::test]
    async fn identical_upload_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(2, FileState::Active);
        let processor = VideoProcessor::new(api.clone(), &test_config(dir.path(), 10));

        let first = processor
            .upload_and_process(b"video", "video/mp4", "clip.mp4")
            .await
            .unwrap();
        let second = processor
            .upload_and_process(b"video", "video/mp4", "clip.mp4")
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.file.name, first.file.name);
        assert_eq!(api.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(api.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_state_is_reported_and_temp_file_removed() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(1, FileState::Failed);
        let processor = VideoProcessor::new(api.clone(), &test_config(dir.path(), 10));

        let err = processor
            .upload_and_process(b"broken", "video/mp4", "clip.mp4")
            .await
            .unwrap_err();

        match err {
            SentiscopeError::ProcessingFailed { state, .. } => assert_eq!(state, "FAILED"),
            other => panic!("unexpected error: {other:?}"),
        }
        for path in api.seen_paths.lock().unwrap().iter() {
            assert!(!path.exists());
        }
        assert_eq!(api.deleted.lock().unwrap().as_slice(), ["files/video-1"]);
        assert_eq!(processor.cached_count().await, 0);
    }

    #[tokio::test]
    async fn never_finishing_job_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(u32::MAX, FileState::Active);
        let processor = VideoProcessor::new(api.clone(), &test_config(dir.path(), 3));

        let err = processor
            .upload_and_process(b"slow", "video/mp4", "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SentiscopeError::ProcessingTimeout { attempts: 3, .. }
        ));
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
        assert_eq!(api.deleted.lock().unwrap().as_slice(), ["files/video-1"]);
        let paths = api.seen_paths.lock().unwrap();
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].exists());
    }

    #[tokio::test]
    async fn concurrent_uploads_use_distinct_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(0, FileState::Active);
        let processor = VideoProcessor::new(api.clone(), &test_config(dir.path(), 10));

        let (a, b) = tokio::join!(
            processor.upload_and_process(b"first", "video/mp4", "a.mp4"),
            processor.upload_and_process(b"second", "video/mp4", "b.mp4"),
        );
        a.unwrap();
        b.unwrap();

        let paths = api.seen_paths.lock().unwrap();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths[0], paths[1]);
    }

    #[tokio::test]
    async fn release_deletes_remote_and_forgets_entry() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(0, FileState::Active);
        let processor = VideoProcessor::new(api.clone(), &test_config(dir.path(), 10));

        let processed = processor
            .upload_and_process(b"video", "video/mp4", "clip.mp4")
            .await
            .unwrap();
        processor.release(&processed.file).await;

        assert_eq!(processor.cached_count().await, 0);
        assert_eq!(api.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let api = ScriptedApi::new(0, FileState::Active);
        let mut config = test_config(dir.path(), 10);
        config.cache_ttl = Duration::ZERO;
        let processor = VideoProcessor::new(api.clone(), &config);

        processor
            .upload_and_process(b"video", "video/mp4", "clip.mp4")
            .await
            .unwrap();

        assert_eq!(processor.evict_expired().await, 1);
        assert_eq!(processor.cached_count().await, 0);
    }
}
