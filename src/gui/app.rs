use eframe::egui;
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::core::{AutoplayPolicy, MediaList, ReelConfig};
use crate::gui::card_stack_renderer::{CardStackRenderer, StackInteraction};
use crate::playback::{BroadcastBus, BroadcastEvent, ClickOutcome, MediaElement, SurfaceController, SurfaceOptions};
use crate::video::{PageEnvironment, SimulatedPlayerHandle};

/// One mounted stack plus the simulated players behind its videos.
pub struct ShowcaseSurface {
    pub title: String,
    pub controller: SurfaceController,
    pub players: Vec<Option<SimulatedPlayerHandle>>,
}

impl ShowcaseSurface {
    fn mount(title: String, bus: &BroadcastBus, media: MediaList, config: &ReelConfig, page: &Arc<PageEnvironment>) -> Self {
        let mut players: Vec<Option<SimulatedPlayerHandle>> = vec![None; media.len()];
        let controller = SurfaceController::mount(
            bus,
            media,
            SurfaceOptions::from_config(config),
            Self::player_factory(&mut players, config.showcase.clip_seconds, page),
        );
        Self { title, controller, players }
    }

    fn player_factory<'a>(
        players: &'a mut Vec<Option<SimulatedPlayerHandle>>,
        clip_seconds: f32,
        page: &'a Arc<PageEnvironment>,
    ) -> impl FnMut(usize, &crate::core::MediaItem) -> Option<Box<dyn MediaElement>> + 'a {
        move |index, item| {
            // Vary clip lengths a little so stacks drift apart
            let duration = clip_seconds * (1.0 + 0.15 * (index % 3) as f32);
            let (handle, video) = SimulatedPlayerHandle::create(item.url(), duration, page);
            if let Some(slot) = players.get_mut(index) {
                *slot = Some(handle);
            }
            Some(Box::new(video) as Box<dyn MediaElement>)
        }
    }

    fn reload(&mut self, config: &ReelConfig, page: &Arc<PageEnvironment>) {
        let media = self.controller.media();
        let mut players: Vec<Option<SimulatedPlayerHandle>> = vec![None; media.len()];
        self.controller
            .replace_media(media, Self::player_factory(&mut players, config.showcase.clip_seconds, page));
        self.players = players;
    }

    /// Advance every simulated player and forward what they report.
    fn tick(&self, dt: f32) {
        for (index, player) in self.players.iter().enumerate() {
            let Some(player) = player else {
                continue;
            };
            let report = player.tick(dt);
            if let Some(result) = report.resolved {
                self.controller.resolve_play(index, result);
            }
            if report.ended {
                self.controller.handle_ended(index);
            }
        }
    }
}

pub struct ShowcaseApp {
    pub config: ReelConfig,
    pub bus: BroadcastBus,
    pub page: Arc<PageEnvironment>,
    pub surfaces: Vec<ShowcaseSurface>,
    pub bus_receiver: broadcast::Receiver<BroadcastEvent>,
    pub focused_surface: usize,
    pub status_message: String,
}

impl ShowcaseApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = ReelConfig::load()?;
        Ok(Self::with_config(config, BroadcastBus::global().clone()))
    }

    pub fn with_config(config: ReelConfig, bus: BroadcastBus) -> Self {
        let page = PageEnvironment::new(config.showcase.autoplay_policy);
        let bus_receiver = bus.watch();

        let titles = ["Hero", "Gallery", "Testimonials"];
        let mut surfaces = Vec::new();
        for (i, urls) in config.showcase.surfaces.iter().enumerate() {
            let title = titles
                .get(i)
                .map(|t| t.to_string())
                .unwrap_or_else(|| format!("Reel {}", i + 1));
            match MediaList::with_extensions(urls.iter().cloned(), &config.video_extensions) {
                Ok(media) => {
                    log::info!("Mounting showcase surface '{}' ({} items)", title, media.len());
                    surfaces.push(ShowcaseSurface::mount(title, &bus, media, &config, &page));
                }
                Err(e) => log::warn!("Skipping showcase surface '{}': {}", title, e),
            }
        }

        Self {
            config,
            bus,
            page,
            surfaces,
            bus_receiver,
            focused_surface: 0,
            status_message: String::new(),
        }
    }

    /// Non-UI half of a frame: clocks, element events, bus notices.
    pub fn process_frame(&mut self, dt: f32) {
        for surface in &self.surfaces {
            surface.tick(dt);
        }
        self.process_bus_events();
    }

    fn process_bus_events(&mut self) {
        loop {
            match self.bus_receiver.try_recv() {
                Ok(event) => {
                    let title = self
                        .surfaces
                        .iter()
                        .find(|s| s.controller.id() == &event.origin)
                        .map(|s| s.title.as_str())
                        .unwrap_or("another surface");
                    self.status_message = format!("🔊 {} is playing with sound", title);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::debug!("Showcase status skipped {} bus events", skipped);
                }
                Err(_) => break,
            }
        }
    }

    pub fn handle_click(&mut self, surface_index: usize, card_index: usize) {
        let Some(surface) = self.surfaces.get(surface_index) else {
            return;
        };
        self.focused_surface = surface_index;
        match surface.controller.click(card_index) {
            ClickOutcome::ToggledSound => {
                if surface.controller.snapshot().is_muted {
                    self.status_message = format!("🔇 {} muted", surface.title);
                }
            }
            ClickOutcome::Promoted(index) => log::debug!("{}: promoted card {}", surface.title, index),
            ClickOutcome::Ignored => {}
        }
        // Counts as a gesture for play requests made from now on
        self.page.mark_interaction();
    }

    fn apply_interaction(&mut self, surface_index: usize, interaction: StackInteraction) {
        if let Some(surface) = self.surfaces.get(surface_index) {
            surface.controller.set_hovered(interaction.hovered);
            surface.controller.report_intersection(interaction.visible_ratio);
        }
        if let Some(card_index) = interaction.clicked {
            self.handle_click(surface_index, card_index);
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let (left, right) = ctx.input(|i| (i.key_pressed(egui::Key::ArrowLeft), i.key_pressed(egui::Key::ArrowRight)));
        if let Some(surface) = self.surfaces.get(self.focused_surface) {
            if left {
                surface.controller.previous();
            }
            if right {
                surface.controller.next();
            }
        }
    }

    fn set_policy(&mut self, policy: AutoplayPolicy) {
        self.page.set_policy(policy);
        self.config.showcase.autoplay_policy = policy;
        if let Err(e) = self.config.save() {
            log::error!("Failed to save config: {}", e);
            self.status_message = format!("Failed to save config: {}", e);
        }
    }

    fn reload_surfaces(&mut self) {
        for surface in &mut self.surfaces {
            surface.reload(&self.config, &self.page);
        }
        self.status_message = "Media reloaded".to_string();
    }
}

impl eframe::App for ShowcaseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        self.process_frame(dt);
        self.handle_keyboard(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Reel Stack");
                ui.separator();

                let mut policy = self.config.showcase.autoplay_policy;
                egui::ComboBox::from_label("Autoplay policy")
                    .selected_text(format!("{:?}", policy))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut policy, AutoplayPolicy::AllowAll, "Allow all");
                        ui.selectable_value(&mut policy, AutoplayPolicy::RequireGesture, "Require gesture");
                        ui.selectable_value(&mut policy, AutoplayPolicy::BlockUnmuted, "Block unmuted");
                    });
                if policy != self.config.showcase.autoplay_policy {
                    self.set_policy(policy);
                }

                if ui.button("⟳ Reload media").clicked() {
                    self.reload_surfaces();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Status:");
                if self.status_message.is_empty() {
                    ui.label("Click the front card to toggle sound");
                } else {
                    ui.label(&self.status_message);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label("←/→ cycle the focused stack");
                });
            });
        });

        let mut interactions: Vec<StackInteraction> = Vec::with_capacity(self.surfaces.len());
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, surface) in self.surfaces.iter().enumerate() {
                    let snapshot = surface.controller.snapshot();
                    ui.add_space(12.0);
                    ui.label(format!(
                        "{} · {}/{} · {}",
                        surface.title,
                        snapshot.active_index + 1,
                        snapshot.len,
                        snapshot.phase.label()
                    ));
                    let media = surface.controller.media();
                    let positions = surface.controller.positions();
                    interactions.push(CardStackRenderer::show(
                        ui,
                        &media,
                        &positions,
                        &snapshot,
                        &surface.players,
                        i == self.focused_surface,
                    ));
                    // Spacer so some stacks can scroll out of view
                    ui.add_space(160.0);
                }
            });
        });

        for (i, interaction) in interactions.into_iter().enumerate() {
            self.apply_interaction(i, interaction);
        }

        ctx.request_repaint();
    }
}

impl Drop for ShowcaseApp {
    fn drop(&mut self) {
        log::debug!("Showcase closing, unmounting {} surfaces", self.surfaces.len());
        for surface in self.surfaces.drain(..) {
            surface.controller.unmount();
        }
    }
}
