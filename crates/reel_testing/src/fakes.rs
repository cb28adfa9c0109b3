//! In-memory stand-ins for every external generation service.
//!
//! Remote results are "downloaded" by writing the URL into the destination
//! file, so tests can tell which candidate ended up where.

use async_trait::async_trait;
use reel_core::{Alignment, DocumentRef};
use reel_error::{GenerationError, GenerationErrorKind, ReelResult};
use reel_interface::{
    AnimationRenderer, AssetKind, DocumentExtractor, Downloader, MediaComposer,
    MediaTaskRequest, MediaTaskService, MoleculeRenderer, SpeechSynthesizer, StructureDatabase,
    TalkingHeadService, TaskStatus,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn write(path: &Path, contents: &str) -> ReelResult<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
    Ok(path.to_path_buf())
}

/// Media tasks that finish on the first poll.
#[derive(Default)]
pub struct FakeMedia {
    pub requests: Mutex<Vec<MediaTaskRequest>>,
}

#[async_trait]
impl MediaTaskService for FakeMedia {
    async fn create_task(&self, request: &MediaTaskRequest) -> ReelResult<String> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!("task-{}", requests.len() - 1))
    }

    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus> {
        Ok(TaskStatus::Succeeded {
            url: format!("https://media.test/{}", task_id),
        })
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub texts: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> ReelResult<String> {
        let mut texts = self.texts.lock().unwrap();
        texts.push(text.to_string());
        Ok(format!("https://tts.test/audio-{}.wav", texts.len() - 1))
    }
}

#[derive(Default)]
pub struct FakeAvatar {
    pub jobs: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl TalkingHeadService for FakeAvatar {
    async fn create_task(&self, audio_url: &str, script: &str) -> ReelResult<String> {
        self.jobs
            .lock()
            .unwrap()
            .push((audio_url.to_string(), script.to_string()));
        Ok("avatar-0".to_string())
    }

    async fn poll(&self, task_id: &str) -> ReelResult<TaskStatus> {
        Ok(TaskStatus::Succeeded {
            url: format!("https://avatar.test/{}.mp4", task_id),
        })
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    pub urls: Mutex<Vec<String>>,
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str, destination: &Path) -> ReelResult<PathBuf> {
        self.urls.lock().unwrap().push(url.to_string());
        write(destination, url)
    }
}

#[derive(Default)]
pub struct FakeDocuments {
    pub located: Mutex<Vec<(AssetKind, u32)>>,
}

#[async_trait]
impl DocumentExtractor for FakeDocuments {
    async fn locate(
        &self,
        _document: &DocumentRef,
        kind: AssetKind,
        index: u32,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        self.located.lock().unwrap().push((kind, index));
        write(destination, &format!("{} {}", kind, index))
    }

    async fn read_full_text(&self, _document: &DocumentRef) -> ReelResult<String> {
        Ok("# Paper".to_string())
    }
}

/// Composer reporting every medium as eight seconds long.
#[derive(Default)]
pub struct FakeComposer {
    pub frame_times: Mutex<Vec<Vec<f64>>>,
    pub stills: Mutex<Vec<f64>>,
    pub slides: Mutex<Vec<String>>,
    pub muxes: Mutex<Vec<Alignment>>,
    pub concats: Mutex<Vec<Vec<PathBuf>>>,
}

#[async_trait]
impl MediaComposer for FakeComposer {
    async fn probe_duration(&self, _media: &Path) -> ReelResult<f64> {
        Ok(8.0)
    }

    async fn key_frames(&self, _video: &Path, times: &[f64], dest_dir: &Path) -> ReelResult<Vec<PathBuf>> {
        self.frame_times.lock().unwrap().push(times.to_vec());
        times
            .iter()
            .enumerate()
            .map(|(i, _)| write(&dest_dir.join(format!("frame{}.png", i)), "frame"))
            .collect()
    }

    async fn mux(
        &self,
        video: &Path,
        _audio: &Path,
        alignment: &Alignment,
        destination: &Path,
    ) -> ReelResult<PathBuf> {
        self.muxes.lock().unwrap().push(*alignment);
        let visual = std::fs::read_to_string(video).unwrap_or_default();
        write(destination, &format!("muxed {}", visual))
    }

    async fn still_to_video(&self, image: &Path, seconds: f64, destination: &Path) -> ReelResult<PathBuf> {
        self.stills.lock().unwrap().push(seconds);
        let still = std::fs::read_to_string(image).unwrap_or_default();
        write(destination, &still)
    }

    async fn compose_slide(&self, image: &Path, caption: &str, destination: &Path) -> ReelResult<PathBuf> {
        self.slides.lock().unwrap().push(caption.to_string());
        let asset = std::fs::read_to_string(image).unwrap_or_default();
        write(destination, &format!("{} | {}", asset, caption))
    }

    async fn concat(&self, segments: &[PathBuf], destination: &Path) -> ReelResult<PathBuf> {
        self.concats.lock().unwrap().push(segments.to_vec());
        write(destination, "final")
    }
}

/// Renderer that fails its first `failures` renders.
#[derive(Default)]
pub struct FakeAnimator {
    pub failures: usize,
    pub renders: AtomicUsize,
}

impl FakeAnimator {
    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            renders: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AnimationRenderer for FakeAnimator {
    async fn render(&self, code: &str, _scenario: &str, _narration: &str, destination: &Path) -> ReelResult<PathBuf> {
        let n = self.renders.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(GenerationError::new(GenerationErrorKind::Media(
                "NameError: name 'Axes3DPlot' is not defined".to_string(),
            ))
            .into());
        }
        write(destination, code)
    }
}

#[derive(Default)]
pub struct FakeStructures {
    pub ids: Vec<String>,
    pub fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl StructureDatabase for FakeStructures {
    async fn resolve(&self, _name: &str) -> ReelResult<Vec<String>> {
        Ok(self.ids.clone())
    }

    async fn fetch(&self, id: &str, destination: &Path) -> ReelResult<PathBuf> {
        self.fetched.lock().unwrap().push(id.to_string());
        write(destination, &format!("HEADER {}", id))
    }
}

#[derive(Default)]
pub struct FakeMolecules {
    pub rendered: AtomicUsize,
}

#[async_trait]
impl MoleculeRenderer for FakeMolecules {
    async fn render_turntable(&self, structure: &Path, destination: &Path) -> ReelResult<PathBuf> {
        self.rendered.fetch_add(1, Ordering::SeqCst);
        let pdb = std::fs::read_to_string(structure).unwrap_or_default();
        write(destination, &format!("turntable {}", pdb))
    }
}

/// One of every fake, kept so tests can inspect what each service saw.
#[derive(Default)]
pub struct Fakes {
    pub media: Arc<FakeMedia>,
    pub speech: Arc<FakeSpeech>,
    pub avatar: Arc<FakeAvatar>,
    pub downloader: Arc<FakeDownloader>,
    pub documents: Arc<FakeDocuments>,
    pub composer: Arc<FakeComposer>,
    pub animator: Arc<FakeAnimator>,
    pub structures: Arc<FakeStructures>,
    pub molecules: Arc<FakeMolecules>,
}
