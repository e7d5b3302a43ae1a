//! Visualization utilities for min_snap_planner
//!
//! Renders waypoints and sampled trajectories in 3D using gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{DesiredState, Waypoints};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";

    // Semantic colors
    pub const WAYPOINT: &str = BLUE;
    pub const WAYPOINT_PATH: &str = BLACK;
    pub const TRAJECTORY: &str = RED;
    pub const START: &str = GREEN;
    pub const GOAL: &str = ORANGE;
}

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: colors::TRAJECTORY.to_string(),
            line_width: 2.0,
            caption: "Trajectory".to_string(),
        }
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl Series {
    fn from_rows(points: &Waypoints) -> Self {
        let z_of = |i: usize| if points.ncols() > 2 { points[(i, 2)] } else { 0.0 };
        Self {
            x: points.column(0).iter().copied().collect(),
            y: points.column(1).iter().copied().collect(),
            z: (0..points.nrows()).map(z_of).collect(),
        }
    }

    fn from_states(states: &[DesiredState]) -> Self {
        let z_of = |s: &DesiredState| if s.position.len() > 2 { s.position[2] } else { 0.0 };
        Self {
            x: states.iter().map(|s| s.position[0]).collect(),
            y: states.iter().map(|s| s.position[1]).collect(),
            z: states.iter().map(z_of).collect(),
        }
    }
}

/// 3D trajectory visualizer
///
/// Series are collected first and drawn on a single set of axes when the
/// figure is shown or saved.
pub struct Visualizer {
    figure: Figure,
    title: String,
    x_label: String,
    y_label: String,
    z_label: String,
    z_range: Option<(f64, f64)>,
    lines: Vec<(Series, PathStyle)>,
    points: Vec<(Series, PointStyle)>,
}

impl Visualizer {
    /// Create a new visualizer
    pub fn new() -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            z_label: "Z [m]".to_string(),
            z_range: None,
            lines: Vec::new(),
            points: Vec::new(),
        }
    }

    /// Set the plot title
    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set Z axis range
    pub fn set_z_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.z_range = Some((min, max));
        self
    }

    /// Plot the polyline through the waypoints and mark each one
    pub fn plot_waypoints(&mut self, waypoints: &Waypoints) -> &mut Self {
        let series = Series::from_rows(waypoints);
        self.lines.push((
            series.clone(),
            PathStyle::new(colors::WAYPOINT_PATH, "Path").with_line_width(1.0),
        ));
        self.points.push((series, PointStyle::new(colors::WAYPOINT, "Waypoints").with_size(1.5)));
        self
    }

    /// Plot sampled trajectory positions
    pub fn plot_trajectory(&mut self, states: &[DesiredState], style: &PointStyle) -> &mut Self {
        self.points.push((Series::from_states(states), style.clone()));
        self
    }

    /// Plot sampled trajectory positions as a line
    pub fn plot_trajectory_line(&mut self, states: &[DesiredState], style: &PathStyle) -> &mut Self {
        self.lines.push((Series::from_states(states), style.clone()));
        self
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> Result<(), String> {
        self.render();
        self.figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.render();
        self.figure.save_to_png(path, width, height).map_err(|e| e.to_string())
    }

    fn render(&mut self) {
        self.figure.clear_axes();
        let axes = self.figure.axes3d();

        for (series, style) in &self.lines {
            axes.lines(&series.x, &series.y, &series.z, &[
                Caption(&style.caption),
                Color(&style.color),
                LineWidth(style.line_width),
            ]);
        }
        for (series, style) in &self.points {
            axes.points(&series.x, &series.y, &series.z, &[
                Caption(&style.caption),
                Color(&style.color),
                PointSymbol(style.symbol),
                PointSize(style.size),
            ]);
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);
        axes.set_z_label(&self.z_label, &[]);
        if let Some((min, max)) = self.z_range {
            axes.set_z_range(AutoOption::Fix(min), AutoOption::Fix(max));
        }
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
