// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors raised by the render lane.

use lumen_core::renderer::{CommandError, MaterialError, RenderPass, RenderQueue, ResourceError};
use thiserror::Error;

/// Failures of the frame protocol and of the draws it records.
///
/// Frame protocol violations and missing cameras, targets or passes are engine
/// bugs and are reported as soon as they happen instead of skipping the draw.
#[derive(Error, Debug)]
pub enum RenderPipelineError {
    /// `render_begin` was called while a frame was already open.
    #[error("render_begin called while frame {0} is still open")]
    AlreadyInFrame(u64),

    /// A frame operation was called outside `render_begin`/`render_end`.
    #[error("{0} called outside of a frame")]
    NotInFrame(&'static str),

    /// The scene holds no camera.
    #[error("The scene has no camera to render with")]
    MissingCamera,

    /// Neither the camera nor the pipeline names a target framebuffer.
    #[error("No framebuffer to render into")]
    MissingFramebuffer,

    /// The material cannot draw in the requested queue or pass.
    #[error("Material '{material}' has no pass for {queue:?}/{pass:?}")]
    MissingMaterialPass {
        /// Material name.
        material: String,
        /// Requested queue.
        queue: RenderQueue,
        /// Requested pass, if one was named.
        pass: Option<RenderPass>,
    },

    /// A raw queue index outside `0..RenderQueue::COUNT`.
    #[error("Render queue index {0} is out of range")]
    QueueOutOfRange(usize),

    /// A raw pass index outside `0..RenderPass::COUNT`.
    #[error("Render pass index {0} is out of range")]
    PassOutOfRange(usize),

    /// Resource creation or access failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Command recording or submission failed.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Material setup or update failed.
    #[error(transparent)]
    Material(#[from] MaterialError),
}

impl RenderPipelineError {
    /// Returns `true` for failures a caller may recover from by releasing
    /// resources or falling back, as opposed to engine bugs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RenderPipelineError::Resource(err) => err.is_recoverable(),
            RenderPipelineError::Material(MaterialError::Resource(err)) => err.is_recoverable(),
            _ => false,
        }
    }
}

/// Result type of the render lane.
pub type Result<T> = std::result::Result<T, RenderPipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_convert() {
        let err: RenderPipelineError = ResourceError::Exhausted("pool".into()).into();
        assert!(err.is_recoverable());
        let err: RenderPipelineError = CommandError::NoPipelineBound.into();
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), CommandError::NoPipelineBound.to_string());
    }

    #[test]
    fn test_missing_pass_names_the_material() {
        let err = RenderPipelineError::MissingMaterialPass {
            material: "glass".into(),
            queue: RenderQueue::Transparent,
            pass: None,
        };
        assert!(err.to_string().contains("glass"));
    }
}
