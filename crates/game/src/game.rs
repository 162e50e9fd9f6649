use std::time::Duration;

use edgeview_camera::Camera;
use edgeview_common::OutputSize;
use edgeview_input::{InputSampler, Key, MouseMode};
use edgeview_render::{
    DeviceNotify, DispatchSize, FrameBackend, MeshDraw, PostProcessChain, RenderError,
    ResourceFactory,
};
use glam::Vec3;

use crate::config::GameConfig;
use crate::error::GameError;
use crate::scene::Scene;
use crate::timer::StepTimer;

/// What the host loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Continue,
    /// The user asked to quit.
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No update has run yet, so there is nothing meaningful to draw.
    NoUpdateYet,
    /// GPU resources are released and waiting to be restored.
    ResourcesReleased,
}

/// Result of the render half of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    Presented { edge_groups: DispatchSize },
}

/// Per-frame driver owning the camera, scene and post-process chain.
pub struct Game {
    config: GameConfig,
    camera: Camera,
    timer: StepTimer,
    scene: Scene,
    post: PostProcessChain,
    last_outcome: Option<FrameOutcome>,
    /// Set between device loss and a successful restore.
    resources_lost: bool,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut timer = StepTimer::new();
        timer.set_fixed_step(config.fixed_step());
        Self {
            config,
            camera: Camera::new(),
            timer,
            scene: Scene::demo(),
            post: PostProcessChain::new(),
            last_outcome: None,
            resources_lost: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn timer(&self) -> &StepTimer {
        &self.timer
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn post_process(&self) -> &PostProcessChain {
        &self.post
    }

    pub fn last_outcome(&self) -> Option<FrameOutcome> {
        self.last_outcome
    }

    pub fn default_size(&self) -> OutputSize {
        self.config.default_size
    }

    /// True after device loss until resources are recreated.
    pub fn resources_lost(&self) -> bool {
        self.resources_lost
    }

    /// Place the camera, configure the output and create every GPU resource.
    /// Any creation failure aborts startup.
    pub fn initialize<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(), GameError> {
        let size = OutputSize::validated(width, height)?;
        self.camera
            .create_view(self.config.eye, self.config.target, Vec3::Y)?;

        backend.resize_output(size)?;
        self.create_device_dependent_resources(backend)?;
        self.create_size_dependent_resources(backend)?;
        self.resources_lost = false;

        tracing::info!(
            %size,
            format = ?backend.color_format(),
            "game initialized"
        );
        Ok(())
    }

    /// Advance one host frame: run as many updates as the timer allows, then
    /// render once.
    pub fn tick<B, I>(
        &mut self,
        backend: &mut B,
        input: &mut I,
        delta: Duration,
    ) -> Result<TickStatus, GameError>
    where
        B: FrameBackend + ?Sized,
        I: InputSampler + ?Sized,
    {
        let updates = self.timer.advance(delta);
        let mut status = TickStatus::Continue;
        for _ in 0..updates {
            if self.update(input, self.timer.elapsed_seconds()) == TickStatus::Exit {
                status = TickStatus::Exit;
            }
        }

        let outcome = self.render(backend)?;
        self.last_outcome = Some(outcome);
        Ok(status)
    }

    fn update<I: InputSampler + ?Sized>(&mut self, input: &mut I, elapsed: f32) -> TickStatus {
        input.begin_frame();

        let kb = input.keyboard_state();
        let step = self.config.move_speed * elapsed;
        if kb.is_pressed(Key::W) {
            self.camera.walk(step);
        }
        if kb.is_pressed(Key::S) {
            self.camera.walk(-step);
        }
        if kb.is_pressed(Key::A) {
            self.camera.strafe(-step);
        }
        if kb.is_pressed(Key::D) {
            self.camera.strafe(step);
        }
        if kb.is_pressed(Key::Q) {
            self.camera.fly(step);
        }
        if kb.is_pressed(Key::E) {
            self.camera.fly(-step);
        }

        let mouse = input.mouse_state();
        if mouse.mode == MouseMode::Relative {
            let (dx, dy) = mouse.delta();
            let yaw = (dx as f32 * self.config.rotate_speed).to_radians();
            let pitch = (dy as f32 * self.config.rotate_speed).to_radians();
            self.camera.pitch(-pitch);
            self.camera.rotate_y(-yaw);
        }
        input.set_mouse_mode(if mouse.right_button {
            MouseMode::Relative
        } else {
            MouseMode::Absolute
        });

        self.camera.update_view_matrix();

        if kb.is_pressed(Key::Escape) {
            tracing::info!("exit requested");
            return TickStatus::Exit;
        }
        TickStatus::Continue
    }

    fn render<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<FrameOutcome, GameError> {
        if self.timer.frame_count() == 0 {
            return Ok(FrameOutcome::Skipped(SkipReason::NoUpdateYet));
        }
        if self.resources_lost || !self.post.is_ready() {
            tracing::trace!("frame skipped, resources released");
            return Ok(FrameOutcome::Skipped(SkipReason::ResourcesReleased));
        }

        backend.begin_frame()?;
        match self.record_frame(backend) {
            Ok(edge_groups) => Ok(FrameOutcome::Presented { edge_groups }),
            Err(e) => {
                backend.abort_frame();
                tracing::warn!("frame aborted: {e}");
                Err(e)
            }
        }
    }

    /// Record and present everything after `begin_frame`.
    fn record_frame<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<DispatchSize, GameError> {
        backend.clear(self.config.background)?;

        let view = self.camera.try_view()?;
        let proj = self.camera.proj();
        for object in self.scene.objects() {
            backend.draw_mesh(&MeshDraw {
                mesh: object.mesh,
                world: object.world,
                view,
                proj,
                tint: object.tint,
            })?;
        }
        backend.end_scene()?;

        let edge_groups = self.post.run(backend)?;
        backend.present()?;
        Ok(edge_groups)
    }

    /// React to a new window size. Zero sizes (minimized windows) are ignored.
    /// While resources are lost only the output size is recorded; the restore
    /// builds targets at whatever size is current by then.
    pub fn on_window_size_changed<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> Result<(), GameError> {
        let Ok(size) = OutputSize::validated(width, height) else {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return Ok(());
        };
        if !backend.resize_output(size)? {
            return Ok(());
        }
        if self.resources_lost {
            tracing::debug!(%size, "resize recorded while resources are lost");
            return Ok(());
        }

        self.post.release();
        self.create_size_dependent_resources(backend)?;
        tracing::debug!(%size, "window size dependent resources recreated");
        Ok(())
    }

    pub fn on_activated(&mut self) {
        tracing::debug!("activated");
    }

    pub fn on_deactivated(&mut self) {
        tracing::debug!("deactivated");
    }

    pub fn on_suspending(&mut self) {
        tracing::debug!("suspending");
    }

    pub fn on_resuming(&mut self) {
        self.timer.reset_elapsed();
        tracing::debug!("resuming");
    }

    /// Re-apply the current output size through the resize path. Nothing is
    /// recreated when the size is unchanged.
    pub fn on_window_moved<B: FrameBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), GameError> {
        tracing::trace!("window moved");
        let size = backend.output_size();
        self.on_window_size_changed(backend, size.width, size.height)
    }

    fn create_device_dependent_resources<F: ResourceFactory + ?Sized>(
        &mut self,
        factory: &mut F,
    ) -> Result<(), RenderError> {
        factory.create_device_resources()
    }

    fn create_size_dependent_resources<F: ResourceFactory + ?Sized>(
        &mut self,
        factory: &mut F,
    ) -> Result<(), RenderError> {
        let size = factory.output_size();
        let targets = factory.create_size_resources(size)?;
        self.post.attach(targets);
        self.camera.create_proj(
            self.config.fov_y_degrees.to_radians(),
            size.aspect_ratio(),
            self.config.z_near,
            self.config.z_far,
        );
        Ok(())
    }
}

impl DeviceNotify for Game {
    fn on_device_lost(&mut self, factory: &mut dyn ResourceFactory) {
        tracing::warn!("device lost, releasing resources");
        self.resources_lost = true;
        self.post.release();
        factory.release_resources();
    }

    fn on_device_restored(
        &mut self,
        factory: &mut dyn ResourceFactory,
    ) -> Result<(), RenderError> {
        self.create_device_dependent_resources(factory)?;
        self.create_size_dependent_resources(factory)?;
        self.resources_lost = false;
        tracing::info!(size = %factory.output_size(), "device restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeview_input::{InputFrame, KeyboardState, ScriptedInput};
    use edgeview_render::{HeadlessBackend, MeshKind, RenderCommand};

    const FRAME: Duration = Duration::from_millis(16);

    fn started(width: u32, height: u32) -> (Game, HeadlessBackend) {
        let mut game = Game::new(GameConfig::default());
        let mut backend = HeadlessBackend::new(game.default_size());
        game.initialize(&mut backend, width, height).unwrap();
        backend.take_commands();
        (game, backend)
    }

    fn keys(keys: &[Key]) -> InputFrame {
        let keyboard = keys
            .iter()
            .fold(KeyboardState::new(), |kb, k| kb.with(*k));
        InputFrame {
            keyboard,
            ..InputFrame::default()
        }
    }

    #[test]
    fn initialize_creates_resources_and_projection() {
        let mut game = Game::new(GameConfig::default());
        let mut backend = HeadlessBackend::new(game.default_size());
        game.initialize(&mut backend, 1920, 1080).unwrap();

        assert_eq!(
            backend.commands(),
            &[
                RenderCommand::CreateDeviceResources,
                RenderCommand::CreateSizeResources {
                    size: OutputSize::new(1920, 1080),
                    generation: 1,
                },
            ]
        );
        assert!(game.post_process().is_ready());
        assert_eq!(game.camera().proj().z_axis.w, -1.0);
        assert!(game.camera().is_view_dirty());
    }

    #[test]
    fn failed_shader_aborts_initialize() {
        let mut game = Game::new(GameConfig::default());
        let mut backend =
            HeadlessBackend::new(game.default_size()).with_device_failure("compile error");
        let err = game.initialize(&mut backend, 800, 600).unwrap_err();
        assert!(matches!(
            err,
            GameError::Render(RenderError::ResourceCreation { .. })
        ));
        assert!(!game.post_process().is_ready());
    }

    #[test]
    fn full_frame_runs_in_order() {
        let (mut game, mut backend) = started(1920, 1080);
        let mut input = ScriptedInput::default();

        let status = game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(status, TickStatus::Continue);

        let cmds = backend.take_commands();
        let kinds: Vec<&str> = cmds
            .iter()
            .map(|c| match c {
                RenderCommand::BeginFrame => "begin",
                RenderCommand::Clear { .. } => "clear",
                RenderCommand::DrawMesh { .. } => "draw",
                RenderCommand::EndScene => "end_scene",
                RenderCommand::BindEdgeInputs { .. } => "bind_edge",
                RenderCommand::Dispatch(_) => "dispatch",
                RenderCommand::UnbindEdge => "unbind_edge",
                RenderCommand::BindCompositeInputs { .. } => "bind_composite",
                RenderCommand::DrawFullscreen { .. } => "fullscreen",
                RenderCommand::UnbindComposite => "unbind_composite",
                RenderCommand::Present => "present",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "begin",
                "clear",
                "draw",
                "draw",
                "draw",
                "end_scene",
                "bind_edge",
                "dispatch",
                "unbind_edge",
                "bind_composite",
                "fullscreen",
                "unbind_composite",
                "present",
            ]
        );
        assert_eq!(
            cmds[1],
            RenderCommand::Clear {
                color: GameConfig::default().background
            }
        );
        assert!(matches!(
            cmds[2],
            RenderCommand::DrawMesh {
                mesh: MeshKind::Teapot,
                ..
            }
        ));
        assert_eq!(
            game.last_outcome(),
            Some(FrameOutcome::Presented {
                edge_groups: DispatchSize { x: 120, y: 68, z: 1 }
            })
        );
    }

    #[test]
    fn nothing_renders_before_first_update() {
        let mut config = GameConfig::default();
        config.fixed_update_hz = Some(60.0);
        let mut game = Game::new(config);
        let mut backend = HeadlessBackend::new(game.default_size());
        game.initialize(&mut backend, 800, 600).unwrap();
        backend.take_commands();

        let mut input = ScriptedInput::default();
        // Too short for one fixed update.
        game.tick(&mut backend, &mut input, Duration::from_millis(1))
            .unwrap();
        assert_eq!(game.timer().frame_count(), 0);
        assert!(backend.commands().is_empty());
        assert_eq!(
            game.last_outcome(),
            Some(FrameOutcome::Skipped(SkipReason::NoUpdateYet))
        );
    }

    #[test]
    fn walking_moves_at_configured_speed() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::new([keys(&[Key::W])]);
        let start = game.camera().position();
        let forward = game.camera().forward();

        game.tick(&mut backend, &mut input, Duration::from_millis(50))
            .unwrap();

        let moved = game.camera().position() - start;
        let expected = -forward * (10.0 * 0.05);
        assert!(moved.abs_diff_eq(expected, 1e-4), "{moved} vs {expected}");
    }

    #[test]
    fn opposite_keys_cancel() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::new([keys(&[Key::A, Key::D, Key::Q, Key::E])]);
        let start = game.camera().position();
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert!(game.camera().position().abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn mouse_look_needs_relative_mode() {
        let (mut game, mut backend) = started(800, 600);
        let look = InputFrame {
            dx: 40,
            dy: 0,
            right_button: true,
            ..InputFrame::default()
        };
        let mut input = ScriptedInput::new([look, look, InputFrame::default()]);
        let start = game.camera().forward();

        // First frame only switches to relative mode.
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert!(game.camera().forward().abs_diff_eq(start, 1e-6));
        assert_eq!(input.mode(), MouseMode::Relative);

        // Second frame yaws by 40 * 0.25 = 10 degrees around world Y.
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z);
        let angle = flat(game.camera().forward()).angle_between(flat(start));
        assert!((angle.to_degrees() - 10.0).abs() < 1e-2, "angle {angle}");

        // Releasing the button goes back to absolute mode.
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(input.mode(), MouseMode::Absolute);
        assert_eq!(
            input.mode_changes(),
            &[MouseMode::Relative, MouseMode::Absolute]
        );
    }

    #[test]
    fn escape_requests_exit() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::new([keys(&[Key::Escape])]);
        let status = game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(status, TickStatus::Exit);
    }

    #[test]
    fn resize_recreates_targets_and_projection() {
        let (mut game, mut backend) = started(800, 600);
        let before = game.camera().proj();

        game.on_window_size_changed(&mut backend, 1920, 1080)
            .unwrap();
        assert_eq!(game.post_process().targets().unwrap().generation(), 2);
        assert_ne!(game.camera().proj(), before);

        // Same size again is a no-op.
        game.on_window_size_changed(&mut backend, 1920, 1080)
            .unwrap();
        assert_eq!(game.post_process().targets().unwrap().generation(), 2);

        // Minimized windows report zero and are ignored.
        game.on_window_size_changed(&mut backend, 0, 0).unwrap();
        assert!(game.post_process().is_ready());

        let mut input = ScriptedInput::default();
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn device_loss_skips_frames_until_restored() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::default();

        game.on_device_lost(&mut backend);
        assert!(!game.post_process().is_ready());
        backend.take_commands();

        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(
            game.last_outcome(),
            Some(FrameOutcome::Skipped(SkipReason::ResourcesReleased))
        );
        assert!(backend.commands().is_empty());

        game.on_device_restored(&mut backend).unwrap();
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert!(matches!(
            game.last_outcome(),
            Some(FrameOutcome::Presented { .. })
        ));
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn resize_while_lost_waits_for_restore() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::default();

        game.on_device_lost(&mut backend);
        game.on_window_size_changed(&mut backend, 1024, 768)
            .unwrap();
        assert!(game.resources_lost());
        assert!(!game.post_process().is_ready());
        assert!(!backend.is_ready());

        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(
            game.last_outcome(),
            Some(FrameOutcome::Skipped(SkipReason::ResourcesReleased))
        );

        game.on_device_restored(&mut backend).unwrap();
        assert!(!game.resources_lost());
        assert_eq!(
            game.post_process().targets().unwrap().size,
            OutputSize::new(1024, 768)
        );

        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(
            game.last_outcome(),
            Some(FrameOutcome::Presented {
                edge_groups: DispatchSize { x: 64, y: 48, z: 1 }
            })
        );
    }

    #[test]
    fn failed_frame_is_aborted_and_the_next_one_records() {
        let (mut game, mut backend) = started(800, 600);
        let mut input = ScriptedInput::default();
        // Targets rebuilt behind the game's back leave its handles stale.
        backend
            .create_size_resources(OutputSize::new(800, 600))
            .unwrap();
        backend.take_commands();

        let err = game.tick(&mut backend, &mut input, FRAME).unwrap_err();
        assert!(matches!(
            err,
            GameError::Render(RenderError::StaleTarget { .. })
        ));
        assert_eq!(backend.commands().last(), Some(&RenderCommand::AbortFrame));
        assert_eq!(backend.frames_presented(), 0);

        game.on_window_size_changed(&mut backend, 640, 480)
            .unwrap();
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn moving_the_window_keeps_targets() {
        let (mut game, mut backend) = started(800, 600);
        game.on_window_moved(&mut backend).unwrap();
        assert_eq!(game.post_process().targets().unwrap().generation(), 1);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn unusable_update_rate_falls_back_to_variable_steps() {
        let mut config = GameConfig::default();
        config.fixed_update_hz = Some(1e-300);
        let mut game = Game::new(config);
        let mut backend = HeadlessBackend::new(game.default_size());
        game.initialize(&mut backend, 800, 600).unwrap();

        let mut input = ScriptedInput::default();
        game.tick(&mut backend, &mut input, FRAME).unwrap();
        assert_eq!(game.timer().frame_count(), 1);
    }
}
