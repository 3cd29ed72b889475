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

use crate::graphics::soft::lock;
use lumen_core::renderer::{CommandRecorder, GraphicsCommand, ResourceError};
use std::sync::{Arc, Mutex};

/// Commands stored by one explicit command list.
pub(crate) type CommandBuffer = Arc<Mutex<Vec<GraphicsCommand>>>;

/// Appends validated commands to a buffer the device reads at submission.
#[derive(Debug)]
pub struct ExplicitRecorder {
    commands: CommandBuffer,
}

impl ExplicitRecorder {
    pub(crate) fn new(commands: CommandBuffer) -> Self {
        Self { commands }
    }
}

impl CommandRecorder for ExplicitRecorder {
    fn record(&mut self, command: GraphicsCommand) -> Result<(), ResourceError> {
        lock(&self.commands).push(command);
        Ok(())
    }

    fn reset(&mut self) {
        lock(&self.commands).clear();
    }
}
