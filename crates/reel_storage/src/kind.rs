//! Artifact kinds and their on-disk names.

use std::path::PathBuf;

/// One persisted artifact of a document run.
///
/// Document-level kinds live under `logs/`; scene-level kinds carry their
/// scene index and live under `scene_<i>/`, except scene plans, which are
/// kept next to the high-level plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ArtifactKind {
    /// Decomposed scene list
    #[display("high-level plan")]
    HighPlan,
    /// Request/response transcript
    #[display("transcript")]
    Transcript,
    /// Workflow narrative log
    #[display("workflow log")]
    WorkflowLog,
    /// Concatenated output video
    #[display("final video")]
    FinalVideo,
    /// Accepted low-level plan of a scene
    #[display("scene {} plan", _0)]
    ScenePlan(usize),
    /// Narration audio of a scene
    #[display("scene {} audio", _0)]
    Audio(usize),
    /// Remote location of a scene's synthesized narration
    #[display("scene {} audio url", _0)]
    AudioUrl(usize),
    /// Accepted visual clip of a scene
    #[display("scene {} video", _0)]
    Video(usize),
    /// Accepted still image of a scene
    #[display("scene {} image", _0)]
    Image(usize),
    /// Generated video candidate
    #[display("scene {} video candidate {}", scene, attempt)]
    VideoCandidate {
        /// Scene index
        scene: usize,
        /// Refinement iteration
        attempt: u32,
    },
    /// Generated image candidate
    #[display("scene {} image candidate {}", scene, attempt)]
    ImageCandidate {
        /// Scene index
        scene: usize,
        /// Refinement iteration
        attempt: u32,
    },
    /// Asset lifted from the source document
    #[display("scene {} document asset", _0)]
    DocumentAsset(usize),
    /// Generated animation code
    #[display("scene {} animation code", _0)]
    AnimationCode(usize),
    /// Downloaded molecular structure
    #[display("scene {} structure {}", scene, id)]
    Structure {
        /// Scene index
        scene: usize,
        /// Structure identifier
        id: String,
    },
    /// Sampled frames of a candidate
    #[display("scene {} frames", _0)]
    Frames(usize),
    /// Finished segment of a scene
    #[display("scene {} segment", _0)]
    Segment(usize),
}

impl ArtifactKind {
    /// Scene the artifact belongs to, if any.
    pub fn scene(&self) -> Option<usize> {
        match self {
            ArtifactKind::HighPlan
            | ArtifactKind::Transcript
            | ArtifactKind::WorkflowLog
            | ArtifactKind::FinalVideo => None,
            ArtifactKind::ScenePlan(i)
            | ArtifactKind::Audio(i)
            | ArtifactKind::AudioUrl(i)
            | ArtifactKind::Video(i)
            | ArtifactKind::Image(i)
            | ArtifactKind::DocumentAsset(i)
            | ArtifactKind::AnimationCode(i)
            | ArtifactKind::Frames(i)
            | ArtifactKind::Segment(i) => Some(*i),
            ArtifactKind::VideoCandidate { scene, .. }
            | ArtifactKind::ImageCandidate { scene, .. }
            | ArtifactKind::Structure { scene, .. } => Some(*scene),
        }
    }

    /// Path relative to the document's working directory.
    pub fn relative_path(&self) -> PathBuf {
        let scene_dir = |i: &usize| PathBuf::from(format!("scene_{}", i));
        match self {
            ArtifactKind::HighPlan => PathBuf::from("logs/highplan.json"),
            ArtifactKind::Transcript => PathBuf::from("logs/transcript.log"),
            ArtifactKind::WorkflowLog => PathBuf::from("logs/workflow.log"),
            ArtifactKind::FinalVideo => PathBuf::from("logs/final_video.mp4"),
            ArtifactKind::ScenePlan(i) => PathBuf::from(format!("logs/file_{}.json", i)),
            ArtifactKind::Audio(i) => scene_dir(i).join("audio.wav"),
            ArtifactKind::AudioUrl(i) => scene_dir(i).join("audio_url.json"),
            ArtifactKind::Video(i) => scene_dir(i).join("video.mp4"),
            ArtifactKind::Image(i) => scene_dir(i).join("image.png"),
            ArtifactKind::VideoCandidate { scene, attempt } => {
                scene_dir(scene).join(format!("test{}.mp4", attempt))
            }
            ArtifactKind::ImageCandidate { scene, attempt } => {
                scene_dir(scene).join(format!("test{}.png", attempt))
            }
            ArtifactKind::DocumentAsset(i) => scene_dir(i).join("image0.png"),
            ArtifactKind::AnimationCode(i) => scene_dir(i).join("animate.py"),
            ArtifactKind::Structure { scene, id } => scene_dir(scene).join(format!("{}.pdb", id)),
            ArtifactKind::Frames(i) => scene_dir(i).join("frames"),
            ArtifactKind::Segment(i) => scene_dir(i).join(format!("scene{}.mp4", i)),
        }
    }
}
