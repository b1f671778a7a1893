use anyhow::Context;
use clap::{Parser, ValueEnum};
use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        checkbox, column, row, scrollable, slider, text, Column, Container,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Task, Theme,
};
use log::info;
use phasecore::field::{FieldGrid, Heatmap};
use phasecore::interact::{PointAccumulator, SetPointHandler};
use phasecore::model::{BazykinModel, ParamId};
use phasecore::prelude::{ActionError, ClickEvent, FieldConfig, RegionId, SolveConfig};
use phasecore::solver::{self, SolverError, Trajectory};
use phasecore::telemetry::InteractionMetrics;
use std::path::PathBuf;

mod colormap;
mod config;

use config::ExplorerConfig;

/// Region identifier of the phase-plane canvas; handlers bound to it ignore
/// clicks from anywhere else.
const PHASE_PLANE: RegionId = RegionId(1);

/// Slider changes smaller than this do not trigger a heatmap refresh.
const REFRESH_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GuiBackend {
    Wgpu,
    TinySkia,
}

impl GuiBackend {
    fn renderer_name(self) -> &'static str {
        match self {
            GuiBackend::Wgpu => "wgpu",
            GuiBackend::TinySkia => "tiny-skia",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogChoice {
    Debug,
    Info,
    Error,
}

impl LogChoice {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogChoice::Debug => log::LevelFilter::Debug,
            LogChoice::Info => log::LevelFilter::Info,
            LogChoice::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Interactive phase-plane explorer for the Bazykin predator-prey model"
)]
struct Args {
    /// Rendering backend handed to the iced runtime
    #[arg(long = "gui_backend", value_enum, default_value_t = GuiBackend::Wgpu)]
    gui_backend: GuiBackend,
    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogChoice::Debug)]
    log: LogChoice,
    /// Optional YAML file overriding domain, solver, and buffer settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log.filter())
        .init();

    let explorer_config = match &args.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };

    info!("starting explorer...");
    std::env::set_var("ICED_BACKEND", args.gui_backend.renderer_name());

    if let Err(err) = launch(explorer_config.clone()) {
        if args.gui_backend != GuiBackend::TinySkia {
            eprintln!(
                "backend '{}' failed: {err}",
                args.gui_backend.renderer_name()
            );
            eprintln!("falling back to renderer backend 'tiny-skia'");
            std::env::set_var("ICED_BACKEND", GuiBackend::TinySkia.renderer_name());
            launch(explorer_config).context("running with fallback backend")?;
        } else {
            return Err(anyhow::anyhow!("running visualizer: {err}"));
        }
    }

    Ok(())
}

fn launch(config: ExplorerConfig) -> Result<(), iced::Error> {
    iced::application(
        move || Explorer::boot(config.clone()),
        Explorer::update,
        Explorer::view,
    )
    .title(application_title)
    .theme(application_theme)
    .run()
}

fn application_title(_: &Explorer) -> String {
    "Bazykin population model".into()
}

fn application_theme(_: &Explorer) -> Theme {
    Theme::Dark
}

struct Explorer {
    model: BazykinModel,
    heatmap: Heatmap,
    solve: SolveConfig,
    tracer: SetPointHandler,
    seeds: PointAccumulator,
    seed_mode: bool,
    trajectories: Vec<Trajectory>,
    metrics: InteractionMetrics,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    CanvasClicked(ClickEvent),
    ParamChanged(ParamId, f64),
    RefreshRequested,
    SeedModeToggled(bool),
    ClearTraces,
}

impl Explorer {
    fn boot(config: ExplorerConfig) -> (Self, Task<Message>) {
        let mut model = BazykinModel::default();
        model.validate_parameters();

        let mut heatmap = Heatmap::new(config.field.clone());
        heatmap.init(&model);

        (
            Explorer {
                model,
                heatmap,
                solve: config.solve,
                tracer: SetPointHandler::new(PHASE_PLANE),
                seeds: PointAccumulator::new(PHASE_PLANE, config.max_seed_points),
                seed_mode: false,
                trajectories: Vec::new(),
                metrics: InteractionMetrics::new(),
                status: "Click the phase plane to trace a trajectory.".into(),
                history: Vec::new(),
            },
            Task::none(),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::CanvasClicked(event) => {
                state.metrics.record_click();
                if state.seed_mode {
                    if state.seeds.on_click(&event) {
                        state.status =
                            format!("seed point ({:.3}, {:.3}) stored", event.x, event.y);
                        state.push_history(format!("seed ({:.3}, {:.3})", event.x, event.y));
                    }
                } else {
                    state.trace_from(&event);
                }
                Task::none()
            }
            Message::ParamChanged(id, value) => {
                let previous = state.model.param(id);
                state.model.set_param(id, value);
                if (value - previous).abs() > REFRESH_THRESHOLD {
                    state.refresh_heatmap();
                }
                Task::none()
            }
            Message::RefreshRequested => {
                state.refresh_heatmap();
                Task::none()
            }
            Message::SeedModeToggled(enabled) => {
                state.seed_mode = enabled;
                state.status = if enabled {
                    "Seed collection mode: clicks are buffered, not traced.".into()
                } else {
                    "Trace mode: clicks integrate a trajectory.".into()
                };
                Task::none()
            }
            Message::ClearTraces => {
                state.trajectories.clear();
                state.seeds.clear();
                state.tracer.reset();
                state.status = "Traces cleared.".into();
                Task::none()
            }
        }
    }

    /// Runs the solver through the set-and-act handler. Solver failures are
    /// caught here: a diverged run still plots its partial trace, everything
    /// else degrades to "no trajectory drawn".
    fn trace_from(&mut self, event: &ClickEvent) {
        let model = self.model.clone();
        let solve_config = self.solve.clone();
        let mut outcome: Option<Result<Trajectory, SolverError>> = None;

        self.tracer.on_click_with(event, |x, y| {
            match solver::solve(&model, x, y, &solve_config) {
                Ok(trajectory) => {
                    outcome = Some(Ok(trajectory));
                    Ok(())
                }
                Err(err) => {
                    let reported = ActionError::from(err.clone());
                    outcome = Some(Err(err));
                    Err(reported)
                }
            }
        });

        match outcome {
            Some(Ok(trajectory)) => {
                self.status = format!(
                    "trace from ({:.3}, {:.3}): {} points",
                    event.x,
                    event.y,
                    trajectory.len()
                );
                self.push_history(format!("trace ({:.3}, {:.3})", event.x, event.y));
                self.trajectories.push(trajectory);
                self.metrics.record_trace();
            }
            Some(Err(SolverError::Diverged { t, partial })) => {
                self.status = format!("trajectory diverged at t={t:.2}; partial trace drawn");
                self.push_history(format!(
                    "diverged trace ({:.3}, {:.3})",
                    event.x, event.y
                ));
                if !partial.is_empty() {
                    self.trajectories.push(partial);
                }
                self.metrics.record_failure();
            }
            Some(Err(err)) => {
                self.status = format!("solver error: {err}");
                self.push_history("solver failure".into());
                self.metrics.record_failure();
            }
            // Click belonged to another region; nothing ran.
            None => {}
        }
    }

    fn refresh_heatmap(&mut self) {
        if self.heatmap.refresh(&self.model) {
            self.metrics.record_refresh();
            // The original rebuilds the whole axes on refresh: trajectories,
            // seed points, and the marker go with the stale contour layers.
            self.trajectories.clear();
            self.seeds.clear();
            self.tracer.reset();
            self.push_history("heatmap refreshed".into());
        } else {
            self.metrics.record_dropped_refresh();
            self.push_history("refresh dropped (already in progress)".into());
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let mut controls = column![text("Model parameters").size(22)].spacing(12);
        for (id, spec) in state.model.parameters() {
            controls = controls.push(
                row![
                    text(format!("{} = {:.3}", id.label(), spec.value))
                        .size(14)
                        .width(Length::Fixed(90.0)),
                    slider(spec.min..=spec.max, spec.value, move |value| {
                        Message::ParamChanged(id, value)
                    })
                    .step(0.01),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            );
        }

        let snapshot = state.metrics.snapshot();
        let metrics_line = text(format!(
            "clicks {} | traces {} | refreshes {} (dropped {}) | failures {}",
            snapshot.clicks,
            snapshot.traces,
            snapshot.refreshes,
            snapshot.dropped_refreshes,
            snapshot.failures
        ))
        .size(12);

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let control_column = column![
            controls,
            button("Update heatmap")
                .on_press(Message::RefreshRequested)
                .padding(10),
            checkbox(state.seed_mode)
                .label("Collect seed points")
                .on_toggle(Message::SeedModeToggled),
            button("Clear traces")
                .on_press(Message::ClearTraces)
                .padding(6),
            text(&state.status).size(14),
            metrics_line,
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(140.0))).padding(6),
        ]
        .spacing(12)
        .padding(16)
        .width(Length::Fixed(320.0));

        let phase_canvas = Canvas::new(PhasePlane {
            field: state.heatmap.config().clone(),
            grid: state.heatmap.grid().cloned(),
            trajectories: state.trajectories.clone(),
            seeds: state.seeds.iter().collect(),
            marker: state.tracer.marker(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let (mag_min, mag_max) = state
            .heatmap
            .grid()
            .map(|grid| (grid.mag_min, grid.mag_max))
            .unwrap_or((0.0, 1.0));
        let legend_canvas = Canvas::new(ColorLegend { mag_min, mag_max })
            .width(Length::Fixed(70.0))
            .height(Length::Fill);

        let plot_column = column![
            text("Prey x (horizontal) / Predators y (vertical)").size(14),
            row![phase_canvas, legend_canvas]
                .spacing(8)
                .height(Length::Fill),
            text(state.model.to_string()).size(14),
        ]
        .spacing(8)
        .padding(16)
        .width(Length::Fill);

        let layout = row![control_column, plot_column]
            .spacing(12)
            .align_y(Alignment::Start)
            .padding(8);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

/// Trace colors, cycled per trajectory.
const TRACE_PALETTE: [Color; 4] = [
    Color::from_rgb(0.18, 0.89, 0.72),
    Color::from_rgb(0.95, 0.95, 0.95),
    Color::from_rgb(0.35, 0.65, 1.00),
    Color::from_rgb(1.00, 0.45, 0.75),
];

/// Phase-plane canvas: magnitude cells, direction glyphs, trajectories,
/// seed points, and the set-point marker. Clicks inside its bounds become
/// data-space events tagged with the phase-plane region.
struct PhasePlane {
    field: FieldConfig,
    grid: Option<FieldGrid>,
    trajectories: Vec<Trajectory>,
    seeds: Vec<(f64, f64)>,
    marker: Option<(f64, f64)>,
}

impl PhasePlane {
    fn x_span(&self) -> f64 {
        (self.field.xmax - self.field.xmin).max(1e-9)
    }

    fn y_span(&self) -> f64 {
        (self.field.ymax - self.field.ymin).max(1e-9)
    }

    fn data_to_screen(&self, x: f64, y: f64, size: Size) -> Point {
        let fx = (x - self.field.xmin) / self.x_span();
        let fy = (y - self.field.ymin) / self.y_span();
        Point::new(fx as f32 * size.width, (1.0 - fy as f32) * size.height)
    }

    fn screen_to_data(&self, position: Point, size: Size) -> (f64, f64) {
        let fx = (position.x / size.width.max(1.0)) as f64;
        let fy = 1.0 - (position.y / size.height.max(1.0)) as f64;
        (
            self.field.xmin + fx * self.x_span(),
            self.field.ymin + fy * self.y_span(),
        )
    }

    fn draw_field(&self, frame: &mut Frame, bounds: Rectangle) {
        let Some(grid) = &self.grid else {
            return;
        };
        let steps = grid.steps();
        if steps == 0 {
            return;
        }
        let cell_w = bounds.width / steps as f32;
        let cell_h = bounds.height / steps as f32;

        for i in 0..steps {
            for j in 0..steps {
                let color = colormap::plasma(grid.normalized_magnitude(i, j) as f32);
                // Small overlap hides seams between cells.
                frame.fill_rectangle(
                    Point::new(i as f32 * cell_w, bounds.height - (j as f32 + 1.0) * cell_h),
                    Size::new(cell_w + 0.5, cell_h + 0.5),
                    color,
                );
            }
        }

        let glyph_reach = 0.5 * cell_w.min(cell_h);
        for i in 0..steps {
            for j in 0..steps {
                let magnitude = grid.magnitude[[i, j]];
                if magnitude <= 0.0 {
                    continue;
                }
                let center = Point::new(
                    (i as f32 + 0.5) * cell_w,
                    bounds.height - (j as f32 + 0.5) * cell_h,
                );
                // Screen y grows downward, so the v component flips.
                let dir_x = (grid.u[[i, j]] / magnitude) as f32;
                let dir_y = -(grid.v[[i, j]] / magnitude) as f32;
                let reach = glyph_reach * (0.35 + 0.65 * grid.normalized_magnitude(i, j) as f32);
                let tail = Point::new(center.x - dir_x * reach, center.y - dir_y * reach);
                let tip = Point::new(center.x + dir_x * reach, center.y + dir_y * reach);
                stroke_arrow(frame, tail, tip);
            }
        }
    }

    fn draw_overlays(&self, frame: &mut Frame, bounds: Rectangle) {
        for (index, trajectory) in self.trajectories.iter().enumerate() {
            if trajectory.points.len() < 2 {
                continue;
            }
            let color = TRACE_PALETTE[index % TRACE_PALETTE.len()];
            let path = Path::new(|builder| {
                for (k, &(x, y)) in trajectory.points.iter().enumerate() {
                    let point = self.data_to_screen(x, y, bounds.size());
                    if k == 0 {
                        builder.move_to(point);
                    } else {
                        builder.line_to(point);
                    }
                }
            });
            frame.stroke(&path, Stroke::default().with_width(2.0).with_color(color));
        }

        for &(x, y) in &self.seeds {
            let center = self.data_to_screen(x, y, bounds.size());
            let dot = Path::new(|builder| builder.circle(center, 3.5));
            frame.fill(&dot, Color::from_rgb(0.95, 0.95, 0.95));
        }

        if let Some((x, y)) = self.marker {
            let center = self.data_to_screen(x, y, bounds.size());
            let cross = Path::new(|builder| {
                builder.move_to(Point::new(center.x - 6.0, center.y));
                builder.line_to(Point::new(center.x + 6.0, center.y));
                builder.move_to(Point::new(center.x, center.y - 6.0));
                builder.line_to(Point::new(center.x, center.y + 6.0));
            });
            frame.stroke(
                &cross,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(1.0, 0.3, 0.2)),
            );
        }
    }
}

fn stroke_arrow(frame: &mut Frame, tail: Point, tip: Point) {
    let shaft = Path::new(|builder| {
        builder.move_to(tail);
        builder.line_to(tip);
    });
    let stroke = Stroke::default()
        .with_width(1.0)
        .with_color(Color::from_rgba(0.1, 0.1, 0.1, 0.8));
    frame.stroke(&shaft, stroke.clone());

    let dx = tip.x - tail.x;
    let dy = tip.y - tail.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f32::EPSILON {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);
    let head = (0.4 * length).min(5.0);
    // Barbs at ±150° from the shaft direction.
    let (cos, sin) = (-0.866_f32, 0.5_f32);
    let left = Point::new(
        tip.x + head * (ux * cos - uy * sin),
        tip.y + head * (ux * sin + uy * cos),
    );
    let right = Point::new(
        tip.x + head * (ux * cos + uy * sin),
        tip.y + head * (-ux * sin + uy * cos),
    );
    let barbs = Path::new(|builder| {
        builder.move_to(left);
        builder.line_to(tip);
        builder.line_to(right);
    });
    frame.stroke(&barbs, stroke);
}

impl canvas::Program<Message> for PhasePlane {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        if let iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
            if let Some(position) = cursor.position_in(bounds) {
                let (x, y) = self.screen_to_data(position, bounds.size());
                let click = ClickEvent::new(PHASE_PLANE, x, y);
                return Some(
                    canvas::Action::publish(Message::CanvasClicked(click)).and_capture(),
                );
            }
        }
        None
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let local = Rectangle::new(Point::ORIGIN, bounds.size());
        self.draw_field(&mut frame, local);
        self.draw_overlays(&mut frame, local);

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Vertical gradient legend for the magnitude range of the current grid.
struct ColorLegend {
    mag_min: f64,
    mag_max: f64,
}

impl canvas::Program<Message> for ColorLegend {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let bar_x = 6.0_f32;
        let bar_width = 18.0_f32;
        let margin = 16.0_f32;
        let bar_height = (bounds.height - 2.0 * margin).max(1.0);
        let strips = 48;
        let strip_height = bar_height / strips as f32;

        for k in 0..strips {
            // Top strip carries the maximum magnitude.
            let t = 1.0 - k as f32 / (strips - 1) as f32;
            frame.fill_rectangle(
                Point::new(bar_x, margin + k as f32 * strip_height),
                Size::new(bar_width, strip_height + 0.5),
                colormap::plasma(t),
            );
        }

        frame.fill_text(canvas::Text {
            content: format!("{:.2}", self.mag_max),
            position: Point::new(bar_x + bar_width + 4.0, margin),
            color: Color::WHITE,
            size: 12.0.into(),
            ..canvas::Text::default()
        });
        frame.fill_text(canvas::Text {
            content: format!("{:.2}", self.mag_min),
            position: Point::new(bar_x + bar_width + 4.0, margin + bar_height - 12.0),
            color: Color::WHITE,
            size: 12.0.into(),
            ..canvas::Text::default()
        });

        vec![frame.into_geometry()]
    }
}
