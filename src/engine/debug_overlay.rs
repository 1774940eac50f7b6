use egui::epaint::Shadow;

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub resolution: (u32, u32),
    pub instance_count: usize,
    /// "AvatarMoves" / "WorldScrolls".
    pub movement_frame: String,
    /// "Pending" / "Ready" / "Failed" per asset.
    pub avatar_status: String,
    pub environment_status: String,
    pub occluders: usize,
    pub avatar_position: Option<(f32, f32, f32)>,
    pub facing_deg: f32,
    pub move_vector: (f32, f32),
    pub force: f32,
    pub walk_state: String,
    pub walk_phase: f32,
    pub world_offset: (f32, f32, f32),
    pub ticks: u64,
    pub admitted: u64,
    pub blocked: u64,
}

/// Occluder box outline, already projected to egui screen points.
///
/// Drawn as the projected rectangle of the box's 8 corners. Toggled with F4.
pub struct OccluderOutline {
    pub min: egui::Pos2,
    pub max: egui::Pos2,
}

pub struct DebugOverlay {
    pub visible: bool,
    pub show_occluders: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        // The scene pass has a depth buffer but the overlay pass does not.
        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: false,
            show_occluders: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn toggle_occluders(&mut self) {
        self.show_occluders = !self.show_occluders;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame:
    ///
    /// - `occluders` — F4 projected occluder outlines (`None` = hidden).
    /// - `stats`     — F3 stats panel (`None` = hidden).
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        stats: Option<&DebugStats>,
        occluders: Option<&[OccluderOutline]>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            // ── F4: occluder outlines on a background layer ──────────────────
            if let Some(outlines) = occluders {
                let painter = ctx.layer_painter(egui::LayerId::new(
                    egui::Order::Background,
                    egui::Id::new("occluders"),
                ));
                let stroke = egui::Stroke::new(
                    1.0,
                    egui::Color32::from_rgba_unmultiplied(255, 220, 0, 160),
                );
                for outline in outlines {
                    painter.rect_stroke(egui::Rect::from_min_max(outline.min, outline.max), 0.0, stroke);
                }
            }

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = stats {
                egui::Area::new(egui::Id::new("debug_overlay"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        egui::Frame::none()
                            .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                            .inner_margin(egui::Margin::same(8.0))
                            .rounding(4.0)
                            .show(ui, |ui: &mut egui::Ui| {
                                ui.label(format!("FPS: {}", stats.fps));
                                ui.label(format!(
                                    "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                                    stats.frame_time_avg_ms,
                                    stats.frame_time_min_ms,
                                    stats.frame_time_max_ms
                                ));
                                ui.label(format!(
                                    "Resolution: {} x {}  Boxes: {}",
                                    stats.resolution.0, stats.resolution.1, stats.instance_count
                                ));
                                ui.separator();
                                ui.label(format!(
                                    "Avatar: {}  Environment: {} ({} occluders)",
                                    stats.avatar_status, stats.environment_status, stats.occluders
                                ));
                                ui.label(format!("Frame of reference: {}", stats.movement_frame));
                                match stats.avatar_position {
                                    Some((x, y, z)) => ui.label(format!(
                                        "Position: ({:.2}, {:.2}, {:.2})  facing {:.0}°",
                                        x, y, z, stats.facing_deg
                                    )),
                                    None => ui.label("Position: -"),
                                };
                                ui.label(format!(
                                    "World offset: ({:.2}, {:.2}, {:.2})",
                                    stats.world_offset.0, stats.world_offset.1, stats.world_offset.2
                                ));
                                ui.label(format!(
                                    "Move: ({:.3}, {:.3})  force {:.2}",
                                    stats.move_vector.0, stats.move_vector.1, stats.force
                                ));
                                ui.label(format!(
                                    "Walk: {}  phase {:.2}",
                                    stats.walk_state, stats.walk_phase
                                ));
                                ui.label(format!(
                                    "Ticks: {}  admitted {}  blocked {}",
                                    stats.ticks, stats.admitted, stats.blocked
                                ));
                            });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
