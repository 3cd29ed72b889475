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

//! Pending submissions of the explicit backend.

use crate::graphics::soft::{ExecState, SoftContext};
use lumen_core::renderer::{
    DeviceChild, GraphicsCommand, GraphicsSemaphore, ResourceError, ResourceHandle,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// One queue submission, holding everything its commands reference.
#[derive(Debug)]
pub(crate) struct Submission {
    pub(crate) queue: ResourceHandle,
    pub(crate) lists: Vec<(ResourceHandle, Vec<GraphicsCommand>)>,
    pub(crate) wait: Vec<Arc<GraphicsSemaphore>>,
    pub(crate) signal: Vec<Arc<GraphicsSemaphore>>,
}

/// Submissions not yet executed, in submission order, and the semaphores
/// signaled so far.
#[derive(Debug, Default)]
pub(crate) struct SubmissionQueue {
    pending: VecDeque<Submission>,
    signaled: HashSet<ResourceHandle>,
}

impl SubmissionQueue {
    pub(crate) fn push(&mut self, submission: Submission) {
        self.pending.push_back(submission);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Removes every pending submission, oldest first.
    pub(crate) fn drain(&mut self) -> Vec<Submission> {
        self.pending.drain(..).collect()
    }

    /// Executes one submission. Each list starts from empty bound state.
    ///
    /// A failing list stops at the failing command; the remaining lists still
    /// run and the first error is returned.
    pub(crate) fn execute(
        &mut self,
        context: &mut SoftContext,
        submission: &Submission,
    ) -> Result<(), ResourceError> {
        for semaphore in &submission.wait {
            if !self.signaled.remove(&semaphore.handle()) {
                log::warn!(
                    "Submission to queue {:?} waits on semaphore {:?}, which nothing signaled",
                    submission.queue,
                    semaphore.handle()
                );
            }
        }
        let mut first_error = None;
        for (list, commands) in &submission.lists {
            let mut state = ExecState::default();
            let result = commands
                .iter()
                .try_for_each(|command| context.execute(*list, &mut state, command));
            if let Err(err) = result {
                log::warn!("Command list {list:?} aborted: {err}");
                first_error.get_or_insert(err);
            }
            context.stats.command_lists_executed += 1;
        }
        self.signaled
            .extend(submission.signal.iter().map(|s| s.handle()));
        first_error.map_or(Ok(()), Err)
    }
}
