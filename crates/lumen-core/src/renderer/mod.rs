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

//! The graphics abstraction layer.
//!
//! - [`api`]: plain descriptor values, enums and flags describing resources.
//! - [`object`]: the resource objects a device hands back, and their capability traits.
//! - [`traits`]: the [`GraphicsDevice`] factory and the [`CommandRecorder`] backend seam.
//! - [`material`]: materials, techniques, passes and the global semantic table.
//! - [`validation`]: descriptor checks shared by every backend.

pub mod api;
pub mod error;
pub mod material;
pub mod object;
pub mod traits;
pub mod validation;

pub use self::api::*;
pub use self::error::{CommandError, MaterialError, ResourceError};
pub use self::object::*;
pub use self::traits::{CommandRecorder, GraphicsDevice};
