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

use crate::graphics::soft::{lock, ExecState, SoftContext};
use lumen_core::renderer::{CommandRecorder, GraphicsCommand, ResourceError, ResourceHandle};
use std::sync::{Arc, Mutex};

/// Runs every command against device memory as soon as it is recorded.
///
/// Each list tracks its own bound framebuffer, scissor and index buffer, so
/// lists recorded side by side never see each other's state.
#[derive(Debug)]
pub struct ImmediateRecorder {
    list: ResourceHandle,
    context: Arc<Mutex<SoftContext>>,
    state: ExecState,
}

impl ImmediateRecorder {
    pub(crate) fn new(list: ResourceHandle, context: Arc<Mutex<SoftContext>>) -> Self {
        Self {
            list,
            context,
            state: ExecState::default(),
        }
    }
}

impl CommandRecorder for ImmediateRecorder {
    fn begin(&mut self) -> Result<(), ResourceError> {
        self.state = ExecState::default();
        Ok(())
    }

    fn record(&mut self, command: GraphicsCommand) -> Result<(), ResourceError> {
        lock(&self.context).execute(self.list, &mut self.state, &command)
    }

    fn reset(&mut self) {
        // Commands already ran; only the bound state goes.
        self.state = ExecState::default();
    }
}
