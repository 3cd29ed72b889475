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

//! Backend-agnostic descriptor values.
//!
//! Everything here is plain data: a caller fills a descriptor, hands it to the
//! [`GraphicsDevice`](crate::renderer::GraphicsDevice), and the resulting object
//! keeps an identical copy for introspection.

pub mod buffer;
pub mod capabilities;
pub mod command;
pub mod common;
pub mod descriptor_set;
pub mod framebuffer;
pub mod pipeline;
pub mod queue;
pub mod settings;
pub mod shader;
pub mod texture;

pub use self::buffer::*;
pub use self::capabilities::*;
pub use self::command::*;
pub use self::common::*;
pub use self::descriptor_set::*;
pub use self::framebuffer::*;
pub use self::pipeline::*;
pub use self::queue::*;
pub use self::settings::*;
pub use self::shader::*;
pub use self::texture::*;
