use chrono::Local;
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};
use flow_canvas::config::Settings;
use flow_canvas::document::GraphDocument;
use flow_canvas::editor::connection_renderer::{draw_curve, route_edges};
use flow_canvas::editor::node_layout::{HEADER_HEIGHT, PORT_RADIUS, hit_test};
use flow_canvas::editor::node_ports::{ALL_KINDS, ports_for_kind};
use flow_canvas::editor::utils::get_type_color;
use flow_canvas::editor::{
    BoxLayout, CanvasSession, EditorStyle, HitTarget, InteractionOutcome, NodeLayout,
    PointerButton, PointerEvent,
};
use flow_canvas::executor::client::ExecutionClient;
use flow_canvas::executor::events::ExecutionEvent;
use flow_canvas::executor::{ExecutionController, ExecutionOutcome};
use flow_canvas::graph::FlowGraph;
use flow_canvas::history::UndoStack;
use flow_canvas::node_types::{FieldType, KindCategory, PortDirection};
use std::path::PathBuf;
use std::sync::Arc;

/// Models offered by the LLM selector.
const MODEL_CHOICES: &[&str] = &["gemini", "groq"];
const GRID_SPACING: f32 = 40.0;
/// Zoom per pixel of wheel scroll.
const SCROLL_ZOOM_RATE: f32 = 0.002;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Flow Canvas",
        native_options,
        Box::new(|_cc| Ok(Box::new(FlowCanvasApp::new()?))),
    )
}

/// Inline field edit collected while drawing, applied afterwards.
struct FieldEdit {
    node_id: String,
    port_id: String,
    value: String,
    commit: bool,
}

struct FlowCanvasApp {
    graph: FlowGraph,
    session: CanvasSession,
    undo_stack: UndoStack,
    controller: ExecutionController,
    settings: Settings,
    settings_path: Option<PathBuf>,
    style: EditorStyle,
    logs: Vec<String>,
    graph_name: String,
    canvas_rect: Option<Rect>,
    show_palette: bool,
    show_load_window: bool,
    show_result: bool,
    /// Cascade offset for nodes added from the palette.
    spawn_count: u32,
}

impl FlowCanvasApp {
    fn new() -> anyhow::Result<Self> {
        let settings_path = Settings::default_path();
        let settings = Settings::load_or_default(settings_path.as_deref());
        let client = ExecutionClient::new(&settings.backend_url, settings.request_timeout())?;

        let mut undo_stack = UndoStack::new();
        undo_stack.max_records = settings.history_max_records;

        let mut app = Self {
            graph: FlowGraph::new(),
            session: CanvasSession::new(settings.snap_radius, settings.edge_hit_width),
            undo_stack,
            controller: ExecutionController::new(Arc::new(client)),
            settings_path,
            style: EditorStyle::default(),
            logs: Vec::new(),
            graph_name: "untitled".to_string(),
            canvas_rect: None,
            show_palette: true,
            show_load_window: false,
            show_result: false,
            spawn_count: 0,
            settings,
        };
        app.log(format!("[System] Backend: {}", app.settings.backend_url));

        if let Some(last) = app.settings.last_graph.clone() {
            app.load_graph(&last);
        }
        app.undo_stack.reset(&app.graph);
        Ok(app)
    }

    fn log(&mut self, line: String) {
        self.logs
            .push(format!("[{}] {}", Local::now().format("%H:%M:%S"), line));
    }

    fn save_settings(&mut self) {
        let Some(path) = self.settings_path.clone() else {
            return;
        };
        if let Err(e) = self.settings.save(&path) {
            log::warn!("Failed to save settings: {:#}", e);
            self.log(format!("[Error] Settings not saved: {:#}", e));
        }
    }

    fn save_graph(&mut self) {
        let name = self.graph_name.trim().to_string();
        if name.is_empty() {
            self.log("[Error] Graph name is empty".to_string());
            return;
        }
        let path = self.settings.graph_path(&name);
        match GraphDocument::from_graph(&self.graph).save(&path) {
            Ok(()) => {
                self.log(format!("[System] Saved {}", path.display()));
                self.settings.last_graph = Some(name);
                self.save_settings();
            }
            Err(e) => self.log(format!("[Error] {}", e)),
        }
    }

    fn load_graph(&mut self, name: &str) -> bool {
        let path = self.settings.graph_path(name);
        match GraphDocument::load(&path) {
            Ok(document) => {
                let dropped = document.apply_to(&mut self.graph);
                self.session.graph_replaced(&self.graph, &BoxLayout);
                self.graph_name = name.trim_end_matches(".json").to_string();
                self.log(format!("[System] Loaded {}", path.display()));
                if dropped > 0 {
                    self.log(format!("[System] Dropped {} invalid edge(s)", dropped));
                }
                true
            }
            Err(e) => {
                self.log(format!("[Error] {}", e));
                false
            }
        }
    }

    fn new_graph(&mut self) {
        self.graph = FlowGraph::new();
        self.session.graph_replaced(&self.graph, &BoxLayout);
        self.undo_stack.reset(&self.graph);
        self.graph_name = "untitled".to_string();
        self.log("[System] New graph created.".to_string());
    }

    fn undo(&mut self) {
        if let Some(graph) = self.undo_stack.undo() {
            self.graph = graph;
            self.session.graph_replaced(&self.graph, &BoxLayout);
        }
    }

    fn redo(&mut self) {
        if let Some(graph) = self.undo_stack.redo() {
            self.graph = graph;
            self.session.graph_replaced(&self.graph, &BoxLayout);
        }
    }

    fn add_node(&mut self, kind: &str) {
        let center = self
            .canvas_rect
            .map(|rect| self.session.viewport().to_canvas(rect.center()))
            .unwrap_or(Pos2::ZERO);
        let cascade = (self.spawn_count % 8) as f32 * 24.0;
        let position = center + Vec2::new(-120.0 + cascade, -60.0 + cascade);
        self.spawn_count += 1;

        if self.graph.add_node(kind, position).is_some() {
            self.session.refresh_anchors(&self.graph, &BoxLayout);
            self.undo_stack.push(&self.graph);
            self.log(format!("[Canvas] Added {}", kind));
        }
    }

    fn execute(&mut self) {
        self.show_result = true;
        if let Err(e) = self.controller.execute_graph(&self.graph) {
            self.controller.report_failure(&e);
            self.log(format!("[Error] {}", e));
        }
    }

    fn drain_execution_events(&mut self) {
        for event in self.controller.poll() {
            match event {
                ExecutionEvent::Started {
                    pattern_id,
                    endpoint,
                } => self.log(format!("[Run] {} -> {}", pattern_id, endpoint)),
                ExecutionEvent::Finished(result) => {
                    self.log(format!("[Run] {}: {}", result.pattern_id, result.message))
                }
                ExecutionEvent::Failed(message) => self.log(format!("[Error] {}", message)),
            }
        }
    }

    fn apply_outcome(&mut self, outcome: InteractionOutcome) {
        match &outcome {
            InteractionOutcome::EdgeCreated(id) => self.log(format!("[Canvas] Connected {}", id)),
            InteractionOutcome::EdgeRemoved(id) => self.log(format!("[Canvas] Removed edge {}", id)),
            InteractionOutcome::Aborted => self.log("[Canvas] Drag cancelled".to_string()),
            _ => {}
        }
        if outcome.mutates_graph() {
            self.undo_stack.push(&self.graph);
        }
    }

    fn dispatch_pointer(&mut self, event: PointerEvent) {
        let outcome = self.session.handle(&mut self.graph, &BoxLayout, event);
        self.apply_outcome(outcome);
    }

    /// Translates this frame's egui pointer input into canvas events.
    fn handle_canvas_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        layouts: &[NodeLayout],
    ) {
        let (hover, latest, pressed, released, scroll, zoom) = ui.input(|i| {
            let pressed = if i.pointer.primary_pressed() {
                Some(PointerButton::Primary)
            } else if i.pointer.secondary_pressed() {
                Some(PointerButton::Secondary)
            } else if i.pointer.button_pressed(egui::PointerButton::Middle) {
                Some(PointerButton::Middle)
            } else {
                None
            };
            (
                i.pointer.hover_pos(),
                i.pointer.latest_pos(),
                pressed,
                i.pointer.any_released(),
                i.smooth_scroll_delta.y,
                i.zoom_delta(),
            )
        });
        let scale = self.session.viewport().scale();

        if let (Some(pos), Some(button)) = (hover, pressed) {
            if response.hovered() {
                let target = hit_test(layouts, pos, scale);
                self.dispatch_pointer(PointerEvent::Down {
                    pos,
                    button,
                    target,
                });
            }
        }

        if !self.session.is_idle() {
            if let Some(pos) = latest {
                self.dispatch_pointer(PointerEvent::Move { pos });
                if released {
                    self.dispatch_pointer(PointerEvent::Up { pos });
                }
            }
        }

        if response.hovered() {
            if let Some(pivot) = hover {
                let factor = if zoom != 1.0 {
                    zoom
                } else if scroll != 0.0 {
                    (scroll * SCROLL_ZOOM_RATE).exp()
                } else {
                    1.0
                };
                if factor != 1.0 {
                    self.dispatch_pointer(PointerEvent::Zoom { factor, pivot });
                }
            }
        }

        let delete = ui.input(|i| i.key_pressed(egui::Key::Delete));
        if delete && !ui.ctx().wants_keyboard_input() {
            let hovered_node = hover.and_then(|pos| match hit_test(layouts, pos, scale) {
                HitTarget::Port(port) => Some(port.node_id),
                HitTarget::Field { node_id, .. } | HitTarget::NodeBody(node_id) => Some(node_id),
                HitTarget::Canvas => None,
            });
            if let Some(node_id) = hovered_node {
                if self
                    .session
                    .remove_node(&mut self.graph, &node_id, &BoxLayout)
                {
                    self.undo_stack.push(&self.graph);
                    self.log(format!("[Canvas] Removed node {}", node_id));
                }
            }
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, area: Rect) {
        let viewport = self.session.viewport();
        let spacing = GRID_SPACING * viewport.scale();
        let origin = viewport.to_screen(Pos2::ZERO);
        let stroke = Stroke::new(1.0, self.style.grid);

        let mut x = area.left() + (origin.x - area.left()).rem_euclid(spacing);
        while x < area.right() {
            painter.line_segment([Pos2::new(x, area.top()), Pos2::new(x, area.bottom())], stroke);
            x += spacing;
        }
        let mut y = area.top() + (origin.y - area.top()).rem_euclid(spacing);
        while y < area.bottom() {
            painter.line_segment([Pos2::new(area.left(), y), Pos2::new(area.right(), y)], stroke);
            y += spacing;
        }
    }

    fn draw_edges(&self, painter: &egui::Painter) {
        let viewport = self.session.viewport();
        let width = self.style.connection_width * viewport.scale();
        let port_color = |node_id: &str, port_id: &str| {
            self.graph
                .port(node_id, port_id)
                .map(|p| get_type_color(p.data_type))
                .unwrap_or(Color32::WHITE)
        };

        for routed in route_edges(&self.graph, self.session.anchors()) {
            let Some(edge) = self.graph.edge(&routed.edge_id) else {
                continue;
            };
            let from = port_color(&edge.source_node, &edge.source_port);
            let to = if self.style.use_gradient_connections {
                port_color(&edge.target_node, &edge.target_port)
            } else {
                from
            };
            draw_curve(painter, &routed.curve.to_screen(viewport), from, to, width);
        }

        if let Some(preview) = self.session.preview_curve() {
            let color = Color32::from_white_alpha(180);
            draw_curve(painter, &preview.to_screen(viewport), color, color, width);
        }
    }

    fn draw_nodes(&self, painter: &egui::Painter, layouts: &[NodeLayout]) {
        let scale = self.session.viewport().scale();
        let font = FontId::proportional(self.style.font_size * scale);
        let small = FontId::proportional(self.style.font_size * 0.85 * scale);
        let rounding = 5.0 * scale;

        for layout in layouts {
            let Some(node) = self.graph.node(&layout.node_id) else {
                continue;
            };
            let category = ports_for_kind(&node.kind)
                .map(|spec| spec.category)
                .unwrap_or(KindCategory::Tool);
            let stroke = if self.session.state().involves(&node.id) {
                Stroke::new(2.0, self.style.selected_stroke)
            } else {
                Stroke::new(1.0, self.style.node_stroke)
            };

            painter.rect_filled(layout.rect, rounding, self.style.node_fill);
            let header = Rect::from_min_size(
                layout.rect.min,
                Vec2::new(layout.rect.width(), HEADER_HEIGHT * scale),
            );
            painter.rect_filled(header, rounding, self.style.header_color(category));
            painter.rect_stroke(layout.rect, rounding, stroke, egui::StrokeKind::Middle);
            painter.text(
                header.left_center() + Vec2::new(10.0 * scale, 0.0),
                Align2::LEFT_CENTER,
                &node.kind,
                font.clone(),
                Color32::WHITE,
            );

            for port_layout in &layout.ports {
                let Some(port) = node.port(&port_layout.port_id) else {
                    continue;
                };
                painter.circle_filled(
                    port_layout.center,
                    PORT_RADIUS * scale,
                    get_type_color(port.data_type),
                );
                if port.direction == PortDirection::Output {
                    painter.text(
                        port_layout.center - Vec2::new(12.0 * scale, 0.0),
                        Align2::RIGHT_CENTER,
                        &port.name,
                        small.clone(),
                        Color32::LIGHT_GRAY,
                    );
                } else {
                    painter.text(
                        port_layout.center + Vec2::new(12.0 * scale, 0.0),
                        Align2::LEFT_CENTER,
                        &port.name,
                        small.clone(),
                        Color32::LIGHT_GRAY,
                    );
                }
            }
        }
    }

    /// Inline editors for unconnected inputs. Returns the edits to apply.
    fn draw_fields(&self, ui: &mut egui::Ui, layouts: &[NodeLayout]) -> Vec<FieldEdit> {
        let scale = self.session.viewport().scale();
        let font = FontId::proportional(12.0 * scale);
        let mut edits = Vec::new();

        for layout in layouts {
            for field in &layout.fields {
                let Some(port) = self.graph.port(&layout.node_id, &field.port_id) else {
                    continue;
                };
                let mut value = port.value.clone().unwrap_or_default();
                let salt = (&layout.node_id, &field.port_id);

                match port.field_type {
                    FieldType::Select => {
                        let before = value.clone();
                        ui.put(field.rect, |ui: &mut egui::Ui| {
                            egui::ComboBox::from_id_salt(salt)
                                .selected_text(value.as_str())
                                .width(field.rect.width())
                                .show_ui(ui, |ui| {
                                    for choice in MODEL_CHOICES {
                                        ui.selectable_value(
                                            &mut value,
                                            choice.to_string(),
                                            *choice,
                                        );
                                    }
                                })
                                .response
                        });
                        if value != before {
                            edits.push(FieldEdit {
                                node_id: layout.node_id.clone(),
                                port_id: field.port_id.clone(),
                                value,
                                commit: true,
                            });
                        }
                    }
                    FieldType::None => {}
                    FieldType::Input | FieldType::Textarea | FieldType::File => {
                        let hint = if port.field_type == FieldType::File {
                            "path to file"
                        } else {
                            port.name.as_str()
                        };
                        let response = ui.put(
                            field.rect,
                            egui::TextEdit::singleline(&mut value)
                                .id_salt(salt)
                                .hint_text(hint)
                                .font(font.clone()),
                        );
                        if response.changed() || response.lost_focus() {
                            edits.push(FieldEdit {
                                node_id: layout.node_id.clone(),
                                port_id: field.port_id.clone(),
                                value,
                                commit: response.lost_focus(),
                            });
                        }
                    }
                }
            }
        }
        edits
    }

    fn apply_field_edits(&mut self, edits: Vec<FieldEdit>) {
        let mut commit = false;
        for edit in edits {
            let value = (!edit.value.is_empty()).then_some(edit.value);
            self.graph
                .set_input_value(&edit.node_id, &edit.port_id, value);
            commit |= edit.commit;
        }
        if commit {
            self.undo_stack.push(&self.graph);
        }
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let area = response.rect;
        self.canvas_rect = Some(area);
        self.session.mount(area, &self.graph, &BoxLayout);

        let layouts = self.session.layouts(&self.graph, &BoxLayout);
        self.handle_canvas_input(ui, &response, &layouts);

        // Input may have moved nodes or the view.
        let layouts = self.session.layouts(&self.graph, &BoxLayout);
        painter.rect_filled(area, 0.0, Color32::from_gray(25));
        self.draw_grid(&painter, area);
        self.draw_edges(&painter);
        self.draw_nodes(&painter, &layouts);

        let edits = self.draw_fields(ui, &layouts);
        self.apply_field_edits(edits);
    }

    fn result_window(&mut self, ctx: &egui::Context) {
        if !self.show_result || (!self.controller.is_busy() && self.controller.outcome().is_none())
        {
            return;
        }
        let mut dismiss = false;
        egui::Window::new("Result")
            .collapsible(false)
            .resizable(true)
            .default_width(420.0)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                match self.controller.outcome() {
                    Some(ExecutionOutcome::Success(result)) => {
                        ui.heading(&result.message);
                        ui.label(format!("Pattern: {}", result.pattern_id));
                        if let Some(response) = &result.response {
                            let text = match response {
                                serde_json::Value::String(s) => s.clone(),
                                other => serde_json::to_string_pretty(other)
                                    .unwrap_or_else(|_| other.to_string()),
                            };
                            egui::ScrollArea::vertical()
                                .max_height(300.0)
                                .show(ui, |ui| {
                                    ui.label(text);
                                });
                        }
                    }
                    Some(ExecutionOutcome::Failure(message)) => {
                        ui.colored_label(Color32::LIGHT_RED, message);
                    }
                    None => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Executing...");
                        });
                    }
                }
                ui.separator();
                if ui.button("Dismiss").clicked() {
                    dismiss = true;
                }
            });
        if dismiss {
            self.controller.dismiss();
            self.show_result = false;
        }
    }

    fn load_window(&mut self, ctx: &egui::Context) {
        if !self.show_load_window {
            return;
        }
        let mut open = true;
        let mut chosen = None;
        egui::Window::new("Load Graph")
            .open(&mut open)
            .show(ctx, |ui| match std::fs::read_dir(&self.settings.graphs_dir) {
                Ok(entries) => {
                    for entry in entries.flatten() {
                        let Ok(name) = entry.file_name().into_string() else {
                            continue;
                        };
                        if name.ends_with(".json") && ui.button(&name).clicked() {
                            chosen = Some(name);
                        }
                    }
                }
                Err(_) => {
                    ui.label(format!(
                        "No graphs in {}",
                        self.settings.graphs_dir.display()
                    ));
                }
            });
        self.show_load_window = open;

        if let Some(name) = chosen {
            if self.load_graph(&name) {
                self.undo_stack.reset(&self.graph);
                self.settings.last_graph = Some(self.graph_name.clone());
                self.save_settings();
                self.show_load_window = false;
            }
        }
    }

    fn palette_window(&mut self, ctx: &egui::Context) {
        let mut chosen = None;
        egui::Window::new("Components")
            .open(&mut self.show_palette)
            .resizable(true)
            .default_width(200.0)
            .anchor(Align2::RIGHT_TOP, Vec2::new(-10.0, 40.0))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for category in [
                        KindCategory::Input,
                        KindCategory::Agent,
                        KindCategory::Tool,
                        KindCategory::Output,
                    ] {
                        ui.label(egui::RichText::new(category.label()).strong());
                        for kind in ALL_KINDS {
                            let in_category = ports_for_kind(kind)
                                .is_some_and(|spec| spec.category == category);
                            if in_category && ui.button(*kind).clicked() {
                                chosen = Some(*kind);
                            }
                        }
                        ui.separator();
                    }
                });
            });
        if let Some(kind) = chosen {
            self.add_node(kind);
        }
    }
}

impl eframe::App for FlowCanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_execution_events();
        if self.controller.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Flow Canvas");
                ui.separator();
                let busy = self.controller.is_busy();
                if ui
                    .add_enabled(!busy, egui::Button::new("▶ Execute"))
                    .clicked()
                {
                    self.execute();
                }
                ui.separator();

                ui.label("Graph:");
                ui.horizontal(|ui| {
                    ui.set_min_width(100.0);
                    ui.set_max_width(150.0);
                    ui.text_edit_singleline(&mut self.graph_name);
                });
                if ui.button("New").clicked() {
                    self.new_graph();
                }
                if ui.button("Save").clicked() {
                    self.save_graph();
                }
                if ui.button("Load").clicked() {
                    self.show_load_window = true;
                }
                ui.separator();
                if ui
                    .add_enabled(self.undo_stack.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    self.undo();
                }
                if ui
                    .add_enabled(self.undo_stack.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    self.redo();
                }
                ui.separator();
                if ui.button("Reset View").clicked() {
                    if let Some(area) = self.canvas_rect {
                        self.session.reset_view(area, &self.graph, &BoxLayout);
                    }
                }
                ui.checkbox(&mut self.show_palette, "Components");
                ui.label(format!("{:.0}%", self.session.viewport().scale() * 100.0));
            });
        });

        self.palette_window(ctx);
        self.load_window(ctx);
        self.result_window(ctx);

        egui::Window::new("Output Log")
            .resizable(true)
            .collapsible(true)
            .default_width(600.0)
            .default_height(200.0)
            .anchor(Align2::LEFT_BOTTOM, Vec2::new(10.0, -10.0))
            .show(ctx, |ui| {
                if ui.button("Clear").clicked() {
                    self.logs.clear();
                }
                ui.separator();
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for line in &self.logs {
                            let color = if line.contains("[Error]") {
                                Color32::LIGHT_RED
                            } else {
                                Color32::LIGHT_GRAY
                            };
                            ui.colored_label(color, line);
                        }
                    });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if !ui.ctx().wants_keyboard_input() {
                    if ui.input(|i| i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                        || ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Y))
                    {
                        self.redo();
                    } else if ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z)) {
                        self.undo();
                    }
                }
                self.show_canvas(ui);
            });
    }
}
