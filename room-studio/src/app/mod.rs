use std::{io, sync::Arc, time::Duration};

use egui::{CentralPanel, Color32, InnerResponse, SidePanel, TopBottomPanel, UiBuilder};
use egui_inpaint::{MaskEditorView, SourceImage};
use log::{error, info, warn};

use crate::{
    acquire::{self, NamedPhoto, PhotoLoadError, PhotoSource},
    client::{ClientError, GenerationClient, RenderRequest},
    history::{EntrySource, HistoryEntry, RenderHistory},
    job::{Job, JobSlot},
    storage::{RenderId, SessionStore, StoredRender},
};

mod menu;
mod native;

pub use native::run_native;

const UPSCALE_FACTOR: u8 = 2;

pub(crate) struct RoomStudioApp {
    client: Arc<dyn GenerationClient>,
    store: SessionStore,
    history: RenderHistory,
    listing: Option<Job<io::Result<Vec<StoredRender>>>>,
    scene: SceneState,
    prompt: String,
    workflow: Workflow,
    workflow_error: Option<String>,
    save_job: JobSlot<io::Result<RenderId>>,
    render_seq: usize,
    analyze_on_mount: bool,
}

#[allow(clippy::large_enum_variant)]
enum SceneState {
    Empty,
    Loading(Job<Result<NamedPhoto, PhotoLoadError>>),
    Loaded(SceneLoaded),
    Error(String),
}

struct SceneLoaded {
    name: String,
    photo: SourceImage,
    view: MaskEditorView,
}

enum Workflow {
    Idle,
    Analyzing(Job<Result<String, ClientError>>),
    Rendering(Job<Result<Vec<u8>, ClientError>>),
    Upscaling(Job<Result<Vec<u8>, ClientError>>),
}

enum WorkflowDone {
    Analyze(Result<String, ClientError>),
    Render(Result<Vec<u8>, ClientError>),
}

impl RoomStudioApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        client: Arc<dyn GenerationClient>,
        store: SessionStore,
    ) -> Self {
        let listing = Some(Job::new(store.list_renders()));
        Self {
            client,
            store,
            history: RenderHistory::default(),
            listing,
            scene: SceneState::Empty,
            prompt: String::new(),
            workflow: Workflow::Idle,
            workflow_error: None,
            save_job: JobSlot::ready(Ok(RenderId::from(String::new()))),
            render_seq: 0,
            analyze_on_mount: false,
        }
    }

    fn busy(&self) -> bool {
        !matches!(self.workflow, Workflow::Idle)
    }

    fn open_photo(&mut self, source: PhotoSource) {
        self.analyze_on_mount = true;
        self.scene = SceneState::Loading(Job::new(acquire::load_photo(source)));
    }

    fn show_history_entry(&mut self, ctx: &egui::Context, idx: usize) {
        let Some(entry) = self.history.get(idx) else {
            return;
        };
        self.analyze_on_mount = false;
        match &entry.source {
            EntrySource::Memory(image) => {
                let (name, image) = (entry.name.clone(), image.clone());
                self.mount_scene(ctx, name, image);
            }
            EntrySource::Disk(id) => {
                let path = PhotoSource::Path(id.as_str().into());
                self.scene = SceneState::Loading(Job::new(acquire::load_photo(path)));
            }
        }
    }

    /// Replaces the displayed scene; the mask editor always starts empty for
    /// a newly mounted photo.
    fn mount_scene(&mut self, ctx: &egui::Context, name: String, photo: SourceImage) {
        self.scene = match MaskEditorView::mount(ctx, &photo) {
            Ok(view) => SceneState::Loaded(SceneLoaded { name, photo, view }),
            Err(e) => SceneState::Error(e.to_string()),
        };
        if std::mem::take(&mut self.analyze_on_mount) {
            self.start_analyze();
        }
    }

    fn start_analyze(&mut self) {
        if self.busy() {
            return;
        }
        let SceneState::Loaded(scene) = &self.scene else {
            return;
        };
        info!("Analyzing room with {}", self.client.label());
        self.workflow = Workflow::Analyzing(Job::new(self.client.analyze(&scene.photo)));
        self.workflow_error = None;
    }

    /// Kicks off a render. With `masked` the committed strokes restrict the
    /// repaint; without strokes the request degrades to a full restyle.
    fn start_render(&mut self, masked: bool) {
        if self.busy() {
            return;
        }
        let SceneState::Loaded(scene) = &self.scene else {
            return;
        };
        let mask_png = if masked {
            match scene.view.editor().export_mask() {
                Ok(mask) => mask.map(|m| m.png),
                Err(e) => {
                    self.workflow_error = Some(e.to_string());
                    return;
                }
            }
        } else {
            None
        };
        let request = RenderRequest {
            prompt: self.prompt.trim().to_string(),
            photo: Some(scene.photo.clone()),
            mask_png,
        };
        info!(
            "Requesting {} render from {}",
            if request.mask_png.is_some() {
                "masked"
            } else {
                "full"
            },
            self.client.label()
        );
        self.workflow = Workflow::Rendering(Job::new(self.client.render(request)));
        self.workflow_error = None;
    }

    fn start_upscale(&mut self) {
        if self.busy() {
            return;
        }
        let SceneState::Loaded(scene) = &self.scene else {
            return;
        };
        info!("Upscaling x{UPSCALE_FACTOR} with {}", self.client.label());
        self.workflow =
            Workflow::Upscaling(Job::new(self.client.upscale(&scene.photo, UPSCALE_FACTOR)));
        self.workflow_error = None;
    }

    /// A finished generation becomes the new working photo: it joins the
    /// history, is persisted in the background and replaces the scene so the
    /// next mask refines the latest result.
    fn adopt_render(&mut self, ctx: &egui::Context, png: Vec<u8>) {
        let image = match SourceImage::decode(&png) {
            Ok(image) => image,
            Err(e) => {
                error!("Backend returned an undecodable image: {e}");
                self.workflow_error = Some(e.to_string());
                return;
            }
        };
        self.render_seq += 1;
        let name = format!("render-{:03}", self.render_seq);
        self.save_job = JobSlot::new(self.store.save_render(&name, png));
        self.history.push(HistoryEntry {
            name: name.clone(),
            source: EntrySource::Memory(image.clone()),
        });
        self.analyze_on_mount = false;
        self.mount_scene(ctx, name, image);
    }

    fn poll_jobs(&mut self, ctx: &egui::Context) {
        if let Some(result) = self.listing.as_mut().and_then(Job::poll_take) {
            self.listing = None;
            match result {
                Ok(items) => {
                    info!("Restored {} stored renders", items.len());
                    self.render_seq = self.render_seq.max(items.len());
                    for item in items {
                        self.history.push_unselected(HistoryEntry {
                            name: item.name,
                            source: EntrySource::Disk(item.id),
                        });
                    }
                }
                Err(e) => warn!("Could not list session dir: {e}"),
            }
        }

        let loaded_photo = match &mut self.scene {
            SceneState::Loading(job) => job.poll_take(),
            _ => None,
        };
        if let Some(result) = loaded_photo {
            match result {
                Ok(NamedPhoto { name, image }) => {
                    // Freshly acquired photos join the session history;
                    // re-selected entries are already in it.
                    if self.analyze_on_mount {
                        self.history.push(HistoryEntry {
                            name: name.clone(),
                            source: EntrySource::Memory(image.clone()),
                        });
                    }
                    self.mount_scene(ctx, name, image);
                }
                Err(e) => {
                    error!("Photo load failed: {e}");
                    self.scene = SceneState::Error(e.to_string());
                }
            }
        }

        let done = match &mut self.workflow {
            Workflow::Idle => None,
            Workflow::Analyzing(job) => job.poll_take().map(WorkflowDone::Analyze),
            Workflow::Rendering(job) | Workflow::Upscaling(job) => {
                job.poll_take().map(WorkflowDone::Render)
            }
        };
        if let Some(done) = done {
            self.workflow = Workflow::Idle;
            match done {
                WorkflowDone::Analyze(Ok(prompt)) => {
                    info!("Prompt drafted ({} chars)", prompt.len());
                    self.prompt = prompt;
                }
                WorkflowDone::Analyze(Err(e)) => {
                    error!("Analyze failed: {e}");
                    self.workflow_error = Some(format!("analyze: {e}"));
                }
                WorkflowDone::Render(Ok(png)) => self.adopt_render(ctx, png),
                WorkflowDone::Render(Err(e)) => {
                    error!("Generation failed: {e}");
                    self.workflow_error = Some(e.to_string());
                }
            }
        }

        if self.any_job_running() {
            // Noop-waker polling needs a frame to observe completions.
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn any_job_running(&self) -> bool {
        self.listing.is_some()
            || matches!(self.scene, SceneState::Loading(_))
            || self.busy()
            || matches!(self.save_job, JobSlot::Pending(_))
    }
}

impl eframe::App for RoomStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs(ctx);

        if let Some(source) = acquire::dropped_photo(ctx) {
            info!("Dropped photo {}", source.name());
            self.open_photo(source);
        }

        TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| self.menu_ui(ui));
        });

        SidePanel::left("session")
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Session");
                ui.separator();
                let selected = ui.horizontal(|ui| self.history.ui(ui)).inner;
                if let Some(idx) = selected {
                    self.show_history_entry(ui.ctx(), idx);
                }
            });

        TopBottomPanel::bottom("studio_controls").show(ctx, |ui| self.controls_ui(ui));

        CentralPanel::default().show(ctx, |ui| match &mut self.scene {
            SceneState::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.label("Drop a room photo here, or use \u{201c}Open photo\u{2026}\u{201d}");
                });
            }
            SceneState::Loading(_) => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
            }
            SceneState::Error(e) => {
                ui.colored_label(Color32::RED, format!("Error: {e}"));
            }
            SceneState::Loaded(scene) => {
                let output = ui.reserve_bottom_space(28.0, |ui| scene.view.ui(ui));
                if let Some(present) = scene.view.editor_mut().take_presence_change() {
                    info!("Mask presence changed: {present}");
                }
                if let Some((x, y)) = output.cursor_image_pos {
                    ui.label(format!("Pixel: {x}, {y}"));
                }
            }
        });
    }
}

trait UiExt {
    fn reserve_bottom_space<T>(&mut self, size: f32, inner: impl FnOnce(&mut egui::Ui) -> T) -> T;
}

impl UiExt for egui::Ui {
    fn reserve_bottom_space<T>(&mut self, size: f32, inner: impl FnOnce(&mut egui::Ui) -> T) -> T {
        let mut available = self.available_rect_before_wrap();
        available.max.y = (available.max.y - size).max(0.);

        let InnerResponse { inner, .. } =
            self.allocate_new_ui(UiBuilder::new().max_rect(available), inner);
        inner
    }
}
