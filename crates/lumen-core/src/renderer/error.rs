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

//! Defines the error types of the rendering subsystem.
//!
//! Errors fall in four classes. Unsupported requests and exhausted pools are
//! recoverable at the call site. Invalid compositions and misuse of the command
//! recording API are engine bugs and are never retried.

use super::api::{CommandKind, CommandListState, QueueType, UniformType};
use std::fmt;

/// An error raised while creating, updating or reading a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The active backend cannot satisfy the request (format, dimension, stage, size limit).
    Unsupported(String),
    /// The descriptor is malformed independently of the backend.
    InvalidDescriptor(String),
    /// The resource was assembled from components that do not fit together.
    InvalidComposition(String),
    /// A bounded allocator (descriptor pool, memory) ran out of space.
    Exhausted(String),
    /// A read, write or copy touched bytes outside the resource.
    OutOfBounds,
    /// The owning device no longer exists.
    DeviceLost,
    /// The backend has no record of the referenced resource.
    NotFound,
    /// Any other backend-specific failure.
    Backend(String),
}

impl ResourceError {
    /// Returns `true` for failures a caller may recover from by falling back,
    /// shrinking a batch or releasing resources.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ResourceError::Unsupported(_) | ResourceError::Exhausted(_))
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Unsupported(msg) => write!(f, "Unsupported by backend: {msg}"),
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {msg}"),
            ResourceError::InvalidComposition(msg) => write!(f, "Invalid composition: {msg}"),
            ResourceError::Exhausted(msg) => write!(f, "Resource exhausted: {msg}"),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::DeviceLost => write!(f, "The owning graphics device was destroyed."),
            ResourceError::NotFound => write!(f, "Resource not found on this device."),
            ResourceError::Backend(msg) => write!(f, "Backend-specific resource error: {msg}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Misuse of the command recording and submission API.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The operation is not legal in the list's current state.
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The state the list was in.
        state: CommandListState,
    },
    /// The list's pool was not created with `RESET_COMMAND_BUFFER`.
    ResetNotAllowed,
    /// A draw or clear was recorded before any framebuffer was bound.
    NoFramebufferBound,
    /// A draw was recorded before any pipeline was bound.
    NoPipelineBound,
    /// An indexed draw was recorded without an index buffer.
    NoIndexBuffer,
    /// The command cannot be recorded on a list of this queue type.
    UnsupportedOnQueue {
        /// The rejected command.
        command: CommandKind,
        /// The queue type of the list's pool.
        queue: QueueType,
    },
    /// The list was allocated for a queue type the target queue cannot execute.
    QueueMismatch {
        /// The queue the list was submitted to.
        queue: QueueType,
        /// The queue type of the list.
        list: QueueType,
    },
    /// A resource-level failure surfaced while recording or submitting.
    Resource(ResourceError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidState { operation, state } => {
                write!(f, "Cannot {operation} a command list in state {state:?}")
            }
            CommandError::ResetNotAllowed => {
                write!(f, "Command pool does not allow resetting individual lists")
            }
            CommandError::NoFramebufferBound => write!(f, "No framebuffer bound"),
            CommandError::NoPipelineBound => write!(f, "No pipeline bound"),
            CommandError::NoIndexBuffer => write!(f, "No index buffer bound for an indexed draw"),
            CommandError::UnsupportedOnQueue { command, queue } => {
                write!(f, "{command:?} cannot be recorded on a {queue:?} list")
            }
            CommandError::QueueMismatch { queue, list } => {
                write!(f, "A {list:?} list cannot be submitted to a {queue:?} queue")
            }
            CommandError::Resource(err) => write!(f, "Resource error: {err}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for CommandError {
    fn from(err: ResourceError) -> Self {
        CommandError::Resource(err)
    }
}

/// An error raised by the material model.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialError {
    /// Parameter names must be unique within a material.
    DuplicateParameter(String),
    /// No parameter with this name exists.
    UnknownParameter(String),
    /// The name does not identify a global semantic.
    UnknownSemantic(String),
    /// The value's type does not match the parameter or uniform.
    TypeMismatch {
        /// The parameter or uniform name.
        name: String,
        /// The declared type.
        expected: UniformType,
        /// The type that was supplied.
        actual: UniformType,
    },
    /// Semantic parameters are fed by the semantic table and hold no value.
    SemanticParameter(String),
    /// A device call failed during setup or update.
    Resource(ResourceError),
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialError::DuplicateParameter(name) => write!(f, "Duplicate material parameter '{name}'"),
            MaterialError::UnknownParameter(name) => write!(f, "Unknown material parameter '{name}'"),
            MaterialError::UnknownSemantic(name) => write!(f, "Unknown material semantic '{name}'"),
            MaterialError::TypeMismatch {
                name,
                expected,
                actual,
            } => write!(f, "Parameter '{name}' expects {expected:?}, got {actual:?}"),
            MaterialError::SemanticParameter(name) => {
                write!(f, "Parameter '{name}' is bound to a global semantic and cannot be assigned")
            }
            MaterialError::Resource(err) => write!(f, "Resource error: {err}"),
        }
    }
}

impl std::error::Error for MaterialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaterialError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for MaterialError {
    fn from(err: ResourceError) -> Self {
        MaterialError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_recoverable_classification() {
        assert!(ResourceError::Unsupported("Rgba16Float".into()).is_recoverable());
        assert!(ResourceError::Exhausted("pool".into()).is_recoverable());
        assert!(!ResourceError::InvalidComposition("layout".into()).is_recoverable());
        assert!(!ResourceError::DeviceLost.is_recoverable());
    }

    #[test]
    fn test_command_error_chains_resource_source() {
        let err: CommandError = ResourceError::OutOfBounds.into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Resource error: Resource access out of bounds.");
    }
}
