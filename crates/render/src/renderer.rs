use std::time::Instant;

use glam::Mat4;
use renderkit_common::{Camera, ClearConfig, CullMode, DirectionalLight, Material, math};
use renderkit_mesh::Mesh;

use crate::RenderError;
use crate::backend::{DrawItem, FrameOutcome, FramePass, RenderBackend};
use crate::instances::{InstanceId, InstanceRecord, InstanceTable};
use crate::uniforms::{FrameUniforms, ModelUniforms};

/// Per-frame update hook, called with the renderer and the seconds elapsed
/// since the previous frame.
pub type UpdateFn<B> = Box<dyn FnMut(&mut Renderer<B>, f32)>;

/// Forward renderer with a single directional light.
///
/// Owns the backend, the instance table and the scene configuration. The
/// host view calls [`Renderer::resize`] when the drawable changes size and
/// [`Renderer::draw`] once per display refresh. Every live instance is drawn
/// every frame; there is no batching or culling.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    pub camera: Camera,
    pub light: DirectionalLight,
    pub clear: ClearConfig,
    pub cull_mode: CullMode,
    on_update: Option<UpdateFn<B>>,
    // Bumped whenever the hook is set or cleared.
    hook_generation: u64,
    instances: InstanceTable<B::Geometry>,
    view_proj: Mat4,
    last_frame: Instant,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        let camera = Camera::default();
        let (width, height) = backend.drawable_size();
        Self {
            backend,
            camera,
            light: DirectionalLight::default(),
            clear: ClearConfig::default(),
            cull_mode: CullMode::default(),
            on_update: None,
            hook_generation: 0,
            instances: InstanceTable::new(),
            view_proj: math::view_projection(&camera, width, height),
            last_frame: Instant::now(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Cached view-projection, refreshed on [`Renderer::resize`].
    pub fn view_projection(&self) -> Mat4 {
        self.view_proj
    }

    /// Install the per-frame update hook, replacing any previous one.
    pub fn set_on_update(&mut self, update: impl FnMut(&mut Renderer<B>, f32) + 'static) {
        self.on_update = Some(Box::new(update));
        self.hook_generation += 1;
    }

    /// Remove the update hook. Takes effect immediately, also when called
    /// from inside the hook itself.
    pub fn clear_on_update(&mut self) {
        self.on_update = None;
        self.hook_generation += 1;
    }

    /// Upload `mesh` and start drawing it with `material` and `transform`.
    pub fn add_instance(
        &mut self,
        mesh: &Mesh,
        material: Material,
        transform: Mat4,
    ) -> Result<InstanceId, RenderError> {
        let geometry = self.backend.upload_mesh(mesh)?;
        let id = self.instances.insert(InstanceRecord {
            transform,
            material,
            geometry,
        });
        tracing::debug!(?id, indices = mesh.index_count(), "instance added");
        Ok(id)
    }

    /// Replace the supplied fields of an instance. Returns `false` and
    /// changes nothing if `id` is not live.
    pub fn update_instance(
        &mut self,
        id: InstanceId,
        transform: Option<Mat4>,
        material: Option<Material>,
    ) -> bool {
        let Some(record) = self.instances.get_mut(id) else {
            tracing::debug!(?id, "update of unknown instance ignored");
            return false;
        };
        if let Some(transform) = transform {
            record.transform = transform;
        }
        if let Some(material) = material {
            record.material = material;
        }
        true
    }

    /// Stop drawing an instance and release its buffers. Returns `false`
    /// if `id` is not live.
    pub fn remove_instance(&mut self, id: InstanceId) -> bool {
        if self.instances.remove(id).is_some() {
            tracing::debug!(?id, "instance removed");
            true
        } else {
            tracing::debug!(?id, "removal of unknown instance ignored");
            false
        }
    }

    pub fn instance(&self, id: InstanceId) -> Option<&InstanceRecord<B::Geometry>> {
        self.instances.get(id)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances.ids().collect()
    }

    /// The drawable is about to change size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
        self.view_proj = math::view_projection(&self.camera, width, height);
        tracing::debug!(width, height, "drawable resized");
    }

    /// Run the update hook and draw one frame.
    pub fn draw(&mut self) -> FrameOutcome {
        self.draw_at(Instant::now())
    }

    pub(crate) fn draw_at(&mut self, now: Instant) -> FrameOutcome {
        let dt = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Some(mut update) = self.on_update.take() {
            let generation = self.hook_generation;
            update(self, dt);
            // Setting or clearing the hook from inside the callback wins.
            if self.hook_generation == generation {
                self.on_update = Some(update);
            }
        }

        let pass = FramePass {
            clear: self.clear,
            cull_mode: self.cull_mode,
            frame: FrameUniforms::new(self.view_proj, &self.light, self.camera.position),
            draws: self
                .instances
                .iter()
                .map(|(_, record)| DrawItem {
                    geometry: &record.geometry,
                    model: ModelUniforms::new(record.transform, &record.material),
                })
                .collect(),
        };

        let outcome = self.backend.submit(&pass);
        match outcome {
            FrameOutcome::Presented => tracing::trace!(draws = pass.draws.len(), "frame presented"),
            FrameOutcome::Skipped => tracing::trace!("no drawable, frame skipped"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use glam::{Vec3, Vec4};
    use renderkit_mesh::IndexWidth;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::time::Duration;

    fn renderer() -> Renderer<RecordingBackend> {
        Renderer::new(RecordingBackend::new(1600, 900))
    }

    #[test]
    fn handles_are_unique() {
        let mut r = renderer();
        let cube = renderkit_mesh::cube(1.0);
        let mut seen = HashSet::new();
        for i in 0..50 {
            let id = r
                .add_instance(&cube, Material::default(), Mat4::IDENTITY)
                .unwrap();
            assert!(seen.insert(id));
            if i % 4 == 0 {
                r.remove_instance(id);
            }
        }
    }

    #[test]
    fn partial_update_keeps_other_field() {
        let mut r = renderer();
        let mat = Material::new(Vec3::new(0.2, 0.4, 0.6), 1.0, 0.1);
        let id = r
            .add_instance(&renderkit_mesh::cube(1.0), mat, Mat4::IDENTITY)
            .unwrap();

        let moved = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(r.update_instance(id, Some(moved), None));
        let rec = r.instance(id).unwrap();
        assert_eq!(rec.transform, moved);
        assert_eq!(rec.material, mat);

        let recolored = Material::default();
        assert!(r.update_instance(id, None, Some(recolored)));
        let rec = r.instance(id).unwrap();
        assert_eq!(rec.transform, moved);
        assert_eq!(rec.material, recolored);
    }

    #[test]
    fn unknown_handles_are_ignored() {
        let mut r = renderer();
        let id = r
            .add_instance(&renderkit_mesh::cube(1.0), Material::default(), Mat4::IDENTITY)
            .unwrap();
        assert!(r.remove_instance(id));
        assert!(!r.remove_instance(id));
        assert!(!r.update_instance(id, Some(Mat4::ZERO), Some(Material::default())));
        assert!(r.instance(id).is_none());
        assert_eq!(r.instance_count(), 0);
    }

    #[test]
    fn failed_upload_stores_nothing() {
        let mut r = renderer();
        let mut mesh = renderkit_mesh::cube(1.0);
        mesh.normals.clear();
        let err = r
            .add_instance(&mesh, Material::default(), Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, RenderError::MeshUpload(_)));
        assert_eq!(r.instance_count(), 0);
    }

    #[test]
    fn view_projection_follows_resize() {
        let mut r = renderer();
        let initial = r.view_projection();
        assert_eq!(initial, math::view_projection(&r.camera, 1600, 900));

        r.camera.position = Vec3::new(5.0, 5.0, 5.0);
        assert_eq!(r.view_projection(), initial);

        r.resize(800, 800);
        assert_eq!(r.backend().drawable_size(), (800, 800));
        let resized = r.view_projection();
        assert_ne!(resized, initial);
        r.resize(800, 800);
        assert_eq!(r.view_projection(), resized);
    }

    #[test]
    fn reference_camera_matches_closed_form() {
        let r = renderer();
        let (eye, center, up) = (Vec3::new(0.0, 1.6, 3.8), Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        let (fov, near, far) = (60.0_f32.to_radians(), 0.01_f32, 100.0_f32);
        let aspect = 16.0_f32 / 9.0;

        let y = 1.0 / (fov * 0.5).tan();
        let x = y / aspect;
        let z = far / (near - far);
        let proj = Mat4::from_cols(
            Vec4::new(x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z, -1.0),
            Vec4::new(0.0, 0.0, z * near, 0.0),
        );
        let f = (center - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);
        let rot = Mat4::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::W,
        );
        let expected = proj * rot * Mat4::from_translation(-eye);

        let got = r.view_projection().to_cols_array();
        for (i, (a, b)) in got.iter().zip(expected.to_cols_array()).enumerate() {
            assert!((a - b).abs() < 1e-4, "component {i}: {a} != {b}");
        }
    }

    #[test]
    fn empty_scene_still_clears_and_presents() {
        let mut r = renderer();
        r.clear = ClearConfig {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            depth: 0.5,
        };
        assert_eq!(r.draw(), FrameOutcome::Presented);
        let frame = r.backend().last_frame().unwrap();
        assert!(frame.draws.is_empty());
        assert_eq!(frame.clear, r.clear);
    }

    #[test]
    fn one_instance_one_draw() {
        let mut r = renderer();
        let sphere = renderkit_mesh::uv_sphere(1.0, 12, 6);
        let mat = Material::new(Vec3::ONE, 0.5, 0.5);
        let transform = Mat4::from_scale(Vec3::splat(2.0));
        let id = r.add_instance(&sphere, mat, transform).unwrap();
        let geometry = r.instance(id).unwrap().geometry.id;

        r.draw();
        let frame = r.backend().last_frame().unwrap();
        assert_eq!(frame.draws.len(), 1);
        let draw = frame.draws[0];
        assert_eq!(draw.geometry, geometry);
        assert_eq!(draw.index_count, sphere.index_count() as u32);
        assert_eq!(draw.index_width, IndexWidth::U16);
        assert_eq!(draw.model, ModelUniforms::new(transform, &mat));
    }

    #[test]
    fn every_live_instance_is_drawn() {
        let mut r = renderer();
        let cube = renderkit_mesh::cube(1.0);
        let ids: Vec<_> = (0..4)
            .map(|_| r.add_instance(&cube, Material::default(), Mat4::IDENTITY).unwrap())
            .collect();
        r.remove_instance(ids[1]);
        r.draw();
        assert_eq!(r.backend().last_frame().unwrap().draws.len(), 3);
    }

    #[test]
    fn frame_state_reflects_scene() {
        let mut r = renderer();
        r.cull_mode = CullMode::Front;
        r.light = DirectionalLight::new(Vec3::X, Vec3::ONE, 3.0);
        r.draw();
        let frame = r.backend().last_frame().unwrap();
        assert_eq!(frame.cull_mode, CullMode::Front);
        assert_eq!(
            frame.frame,
            FrameUniforms::new(r.view_projection(), &r.light, r.camera.position)
        );
    }

    #[test]
    fn missing_drawable_skips_frame() {
        let mut r = renderer();
        r.backend_mut().set_drawable_available(false);
        assert_eq!(r.draw(), FrameOutcome::Skipped);
        assert!(r.backend().frames().is_empty());
        assert_eq!(r.backend().skipped(), 1);

        r.backend_mut().set_drawable_available(true);
        assert_eq!(r.draw(), FrameOutcome::Presented);
        assert_eq!(r.backend().frames().len(), 1);
    }

    #[test]
    fn update_hook_receives_delta_and_runs_before_encoding() {
        let mut r = renderer();
        let id = r
            .add_instance(&renderkit_mesh::cube(1.0), Material::default(), Mat4::IDENTITY)
            .unwrap();
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let seen = deltas.clone();
        let moved = Mat4::from_translation(Vec3::Y);
        r.set_on_update(move |renderer, dt| {
            seen.borrow_mut().push(dt);
            renderer.update_instance(id, Some(moved), None);
        });

        let start = r.last_frame;
        r.draw_at(start + Duration::from_millis(250));
        r.draw_at(start + Duration::from_millis(750));

        let deltas = deltas.borrow();
        assert_eq!(deltas.len(), 2);
        assert!((deltas[0] - 0.25).abs() < 1e-6);
        assert!((deltas[1] - 0.5).abs() < 1e-6);
        let frame = r.backend().last_frame().unwrap();
        assert_eq!(frame.draws[0].model.model, moved.to_cols_array_2d());
    }

    #[test]
    fn update_hook_can_be_cleared() {
        let mut r = renderer();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        r.set_on_update(move |_, _| *counter.borrow_mut() += 1);
        r.draw();
        r.clear_on_update();
        r.draw();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn update_hook_can_clear_itself() {
        let mut r = renderer();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        r.set_on_update(move |renderer, _| {
            *counter.borrow_mut() += 1;
            renderer.clear_on_update();
        });
        r.draw();
        r.draw();
        r.draw();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn update_hook_can_replace_itself() {
        let mut r = renderer();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let first = calls.clone();
        let second = calls.clone();
        r.set_on_update(move |renderer, _| {
            first.borrow_mut().push("first");
            let second = second.clone();
            renderer.set_on_update(move |_, _| second.borrow_mut().push("second"));
        });
        r.draw();
        r.draw();
        r.draw();
        assert_eq!(*calls.borrow(), vec!["first", "second", "second"]);
    }

    #[test]
    fn zero_sized_drawable_skips_until_resized() {
        let mut r = renderer();
        r.resize(0, 900);
        assert!(r.view_projection().is_finite());
        assert_eq!(r.draw(), FrameOutcome::Skipped);
        assert_eq!(r.backend().skipped(), 1);

        r.resize(1600, 0);
        assert!(r.view_projection().is_finite());
        assert_eq!(r.draw(), FrameOutcome::Skipped);

        r.resize(1600, 900);
        assert_eq!(r.draw(), FrameOutcome::Presented);
        assert_eq!(r.backend().presented(), 1);
        assert_eq!(
            r.view_projection(),
            math::view_projection(&r.camera, 1600, 900)
        );
    }
}
