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

use crate::renderer::api::GraphicsCommand;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The backend half of a [`GraphicsCommandList`](crate::renderer::GraphicsCommandList).
///
/// The list validates every command and tracks its lifecycle; a recorder only
/// sees commands that already passed validation, in recording order. Depending
/// on the backend, a recorder executes each command on the spot or stores it
/// for execution at submission.
pub trait CommandRecorder: Send + Debug {
    /// Called when the list enters the recording state.
    fn begin(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Accepts one validated command.
    fn record(&mut self, command: GraphicsCommand) -> Result<(), ResourceError>;

    /// Called when recording ends.
    fn end(&mut self) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Drops everything recorded so far.
    fn reset(&mut self);
}
