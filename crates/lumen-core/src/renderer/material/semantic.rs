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

//! Engine-supplied shader parameters.

use crate::math::{Mat4, Vec3};
use crate::renderer::api::{UniformType, UniformValue};
use crate::renderer::error::MaterialError;

/// A shader parameter whose value the renderer supplies instead of the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalSemantic {
    /// Object to world.
    ModelMatrix,
    /// World to object.
    ModelMatrixInverse,
    /// World to camera.
    ViewMatrix,
    /// Camera to world.
    ViewMatrixInverse,
    /// Camera to clip.
    ProjectMatrix,
    /// Clip to camera.
    ProjectMatrixInverse,
    /// World to clip.
    ViewProjectMatrix,
    /// Clip to world.
    ViewProjectMatrixInverse,
    /// Object to camera.
    ModelViewMatrix,
    /// Object to clip.
    ModelViewProjectMatrix,
    /// Vertical field of view in radians.
    CameraAperture,
    /// Near plane distance.
    CameraNear,
    /// Far plane distance.
    CameraFar,
    /// Camera position in world space.
    CameraPosition,
    /// Camera forward direction in world space.
    CameraDirection,
    /// Scene depth buffer.
    DepthMap,
    /// Scene depth, linearized.
    DepthLinearMap,
    /// G-buffer albedo.
    DiffuseMap,
    /// G-buffer normals.
    NormalMap,
    /// Accumulated lighting.
    LightingMap,
}

impl GlobalSemantic {
    /// Number of semantics.
    pub const COUNT: usize = 20;

    /// Every semantic, ordered by [`index`](Self::index).
    pub const ALL: [GlobalSemantic; Self::COUNT] = [
        GlobalSemantic::ModelMatrix,
        GlobalSemantic::ModelMatrixInverse,
        GlobalSemantic::ViewMatrix,
        GlobalSemantic::ViewMatrixInverse,
        GlobalSemantic::ProjectMatrix,
        GlobalSemantic::ProjectMatrixInverse,
        GlobalSemantic::ViewProjectMatrix,
        GlobalSemantic::ViewProjectMatrixInverse,
        GlobalSemantic::ModelViewMatrix,
        GlobalSemantic::ModelViewProjectMatrix,
        GlobalSemantic::CameraAperture,
        GlobalSemantic::CameraNear,
        GlobalSemantic::CameraFar,
        GlobalSemantic::CameraPosition,
        GlobalSemantic::CameraDirection,
        GlobalSemantic::DepthMap,
        GlobalSemantic::DepthLinearMap,
        GlobalSemantic::DiffuseMap,
        GlobalSemantic::NormalMap,
        GlobalSemantic::LightingMap,
    ];

    /// Uniform name shaders use for the semantic.
    pub fn name(&self) -> &'static str {
        match self {
            GlobalSemantic::ModelMatrix => "matModel",
            GlobalSemantic::ModelMatrixInverse => "matModelInverse",
            GlobalSemantic::ViewMatrix => "matView",
            GlobalSemantic::ViewMatrixInverse => "matViewInverse",
            GlobalSemantic::ProjectMatrix => "matProject",
            GlobalSemantic::ProjectMatrixInverse => "matProjectInverse",
            GlobalSemantic::ViewProjectMatrix => "matViewProject",
            GlobalSemantic::ViewProjectMatrixInverse => "matViewProjectInverse",
            GlobalSemantic::ModelViewMatrix => "matModelView",
            GlobalSemantic::ModelViewProjectMatrix => "matModelViewProject",
            GlobalSemantic::CameraAperture => "CameraAperture",
            GlobalSemantic::CameraNear => "CameraNear",
            GlobalSemantic::CameraFar => "CameraFar",
            GlobalSemantic::CameraPosition => "CameraPosition",
            GlobalSemantic::CameraDirection => "CameraDirection",
            GlobalSemantic::DepthMap => "DepthMap",
            GlobalSemantic::DepthLinearMap => "DepthLinearMap",
            GlobalSemantic::DiffuseMap => "DiffuseMap",
            GlobalSemantic::NormalMap => "NormalMap",
            GlobalSemantic::LightingMap => "LightingMap",
        }
    }

    /// Looks a semantic up by its uniform name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Type of the value the semantic carries.
    pub fn uniform_type(&self) -> UniformType {
        match self.index() {
            0..=9 => UniformType::Float4x4,
            10..=12 => UniformType::Float,
            13 | 14 => UniformType::Float3,
            _ => UniformType::CombinedImageSampler,
        }
    }

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Per-camera inputs of the semantic table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSemantics {
    /// World to camera.
    pub view: Mat4,
    /// Camera to clip.
    pub projection: Mat4,
    /// Vertical field of view in radians.
    pub aperture: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Camera position in world space.
    pub position: Vec3,
    /// Forward direction in world space.
    pub direction: Vec3,
}

/// The current value of every global semantic.
///
/// Owned by the renderer context: camera slots are refreshed once per camera,
/// model slots once per object, texture slots whenever the frame's targets change.
#[derive(Debug, Clone, Default)]
pub struct MaterialSemanticTable {
    values: [Option<UniformValue>; GlobalSemantic::COUNT],
    view: Option<(Mat4, Mat4)>,
}

impl MaterialSemanticTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `semantic`.
    pub fn set(&mut self, semantic: GlobalSemantic, value: UniformValue) -> Result<(), MaterialError> {
        if value.ty() != semantic.uniform_type() {
            return Err(MaterialError::TypeMismatch {
                name: semantic.name().to_string(),
                expected: semantic.uniform_type(),
                actual: value.ty(),
            });
        }
        self.values[semantic.index()] = Some(value);
        Ok(())
    }

    /// The value of `semantic`, if one was set.
    pub fn get(&self, semantic: GlobalSemantic) -> Option<&UniformValue> {
        self.values[semantic.index()].as_ref()
    }

    /// Forgets `semantic`.
    pub fn unset(&mut self, semantic: GlobalSemantic) {
        self.values[semantic.index()] = None;
    }

    fn put_matrix(&mut self, semantic: GlobalSemantic, inverse: GlobalSemantic, m: Mat4) {
        self.values[semantic.index()] = Some(UniformValue::Float4x4(m));
        self.values[inverse.index()] = m.inverse().map(UniformValue::Float4x4);
    }

    /// Refreshes the camera slots.
    pub fn set_camera(&mut self, camera: &CameraSemantics) {
        let view_project = camera.projection * camera.view;
        self.put_matrix(GlobalSemantic::ViewMatrix, GlobalSemantic::ViewMatrixInverse, camera.view);
        self.put_matrix(
            GlobalSemantic::ProjectMatrix,
            GlobalSemantic::ProjectMatrixInverse,
            camera.projection,
        );
        self.put_matrix(
            GlobalSemantic::ViewProjectMatrix,
            GlobalSemantic::ViewProjectMatrixInverse,
            view_project,
        );
        let position = camera.position;
        let direction = camera.direction;
        self.values[GlobalSemantic::CameraAperture.index()] = Some(UniformValue::Float(camera.aperture));
        self.values[GlobalSemantic::CameraNear.index()] = Some(UniformValue::Float(camera.near));
        self.values[GlobalSemantic::CameraFar.index()] = Some(UniformValue::Float(camera.far));
        self.values[GlobalSemantic::CameraPosition.index()] =
            Some(UniformValue::Float3([position.x, position.y, position.z]));
        self.values[GlobalSemantic::CameraDirection.index()] =
            Some(UniformValue::Float3([direction.x, direction.y, direction.z]));
        self.view = Some((camera.view, view_project));
    }

    /// Refreshes the model slots for one object, combining with the last camera.
    pub fn set_model(&mut self, model: Mat4) {
        self.put_matrix(GlobalSemantic::ModelMatrix, GlobalSemantic::ModelMatrixInverse, model);
        let (view, view_project) = self.view.unwrap_or((Mat4::IDENTITY, Mat4::IDENTITY));
        self.values[GlobalSemantic::ModelViewMatrix.index()] =
            Some(UniformValue::Float4x4(view * model));
        self.values[GlobalSemantic::ModelViewProjectMatrix.index()] =
            Some(UniformValue::Float4x4(view_project * model));
    }
}
