//! egui widget that draws the globe: an orthographic sphere with points, animated dashed arcs
//! and labels, plus drag-to-rotate, scroll-to-zoom and eased camera transitions.

use std::time::Instant;

use catppuccin_egui::MOCHA;
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};

use crate::gui::surface::{ArcDatum, GlobeSurface, LabelDatum, PointDatum, PointOfView};
use crate::gui::transition::{Camera, CameraTransition, dash_phase, wrap_longitude};
use crate::network::node::NodeId;

const ARC_SEGMENTS: usize = 32;
const GRATICULE_STEP: i32 = 30;
const MIN_ALTITUDE: f64 = 0.3;
const MAX_ALTITUDE: f64 = 6.0;
const HIT_SLOP: f32 = 3.0;
const MAX_TOOLTIP_LINKS: usize = 4;

/// What the user did on the globe this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobeResponse {
    pub clicked: Option<NodeId>,
}

pub struct GlobeView {
    points: Vec<PointDatum>,
    arcs: Vec<ArcDatum>,
    labels: Vec<LabelDatum>,
    camera: Camera,
    transition: Option<CameraTransition>,
    last_pov: Option<PointOfView>,
    clock: Instant,
}

impl Default for GlobeView {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            arcs: Vec::new(),
            labels: Vec::new(),
            camera: Camera::default(),
            transition: None,
            last_pov: None,
            clock: Instant::now(),
        }
    }
}

impl GlobeSurface for GlobeView {
    fn set_points(&mut self, points: Vec<PointDatum>) {
        self.points = points;
    }

    fn set_arcs(&mut self, arcs: Vec<ArcDatum>) {
        self.arcs = arcs;
    }

    fn set_labels(&mut self, labels: Vec<LabelDatum>) {
        self.labels = labels;
    }

    fn point_of_view(&mut self, pov: PointOfView) {
        let target = Camera {
            lat: pov.lat,
            lng: pov.lng,
            altitude: pov.altitude,
        };
        let from = self.current_camera(Instant::now());
        self.transition = Some(CameraTransition::new(from, target, pov.transition));
        self.last_pov = Some(pov);
    }
}

impl GlobeView {
    pub fn points(&self) -> &[PointDatum] {
        &self.points
    }

    pub fn arcs(&self) -> &[ArcDatum] {
        &self.arcs
    }

    pub fn labels(&self) -> &[LabelDatum] {
        &self.labels
    }

    pub fn last_point_of_view(&self) -> Option<&PointOfView> {
        self.last_pov.as_ref()
    }

    fn current_camera(&self, now: Instant) -> Camera {
        match &self.transition {
            Some(transition) => transition.camera_at(now),
            None => self.camera,
        }
    }

    /// Advances the camera transition; returns true while it is still running.
    fn step_camera(&mut self, now: Instant) -> bool {
        if let Some(transition) = &self.transition {
            self.camera = transition.camera_at(now);
            if transition.is_finished(now) {
                self.transition = None;
            }
        }
        self.transition.is_some()
    }

    pub fn show(&mut self, ui: &mut Ui) -> GlobeResponse {
        let now = Instant::now();
        let animating = self.step_camera(now);

        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged() {
            // Manual rotation wins over a running transition
            self.transition = None;
            let delta = response.drag_delta();
            let k = 0.25 * (self.camera.altitude / 2.5).max(0.2);
            self.camera.lng = wrap_longitude(self.camera.lng - delta.x as f64 * k);
            self.camera.lat = (self.camera.lat + delta.y as f64 * k).clamp(-89.0, 89.0);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.transition = None;
                let factor = (1.0 - scroll as f64 * 0.002).clamp(0.5, 1.5);
                self.camera.altitude =
                    (self.camera.altitude * factor).clamp(MIN_ALTITUDE, MAX_ALTITUDE);
            }
        }

        let projection = Projection::new(rect, &self.camera);
        let elapsed = now.saturating_duration_since(self.clock);

        self.paint_sphere(&painter, &projection);
        for arc in &self.arcs {
            paint_arc(&painter, &projection, arc, dash_phase(elapsed, arc.style.animate_ms));
        }

        let pointer = response.hover_pos();
        let mut hovered: Option<(NodeId, f32, Pos2)> = None;
        for point in &self.points {
            let Some(pos) = projection.project(point.lat, point.lng, point.altitude as f64) else {
                continue;
            };
            let radius = (point.radius.to_radians() * projection.scale).max(1.5);
            painter.circle_filled(pos, radius, point.color);
            if let Some(pointer) = pointer {
                let dist = pos.distance(pointer);
                if dist <= radius + HIT_SLOP && hovered.is_none_or(|(_, best, _)| dist < best) {
                    hovered = Some((point.id, dist, pos));
                }
            }
        }

        for label in &self.labels {
            if let Some(pos) = projection.project(label.lat, label.lng, 0.06) {
                painter.text(
                    pos + Vec2::new(6.0, -6.0),
                    Align2::LEFT_BOTTOM,
                    &label.text,
                    FontId::proportional(12.0),
                    MOCHA.text,
                );
            }
        }

        let hovered_id = hovered.map(|(id, _, _)| id);
        if let Some((id, _, pos)) = hovered {
            if let Some(point) = self.points.iter().find(|p| p.id == id) {
                let mut text = point.label.clone();
                let links: Vec<&str> = self
                    .arcs
                    .iter()
                    .rev()
                    .filter(|arc| arc.source == id || arc.target == id)
                    .take(MAX_TOOLTIP_LINKS)
                    .map(|arc| arc.label.as_str())
                    .collect();
                for link in links {
                    text.push('\n');
                    text.push_str(link);
                }
                paint_tooltip(&painter, pos + Vec2::new(12.0, 12.0), &text);
            }
        }

        if animating || !self.arcs.is_empty() {
            ui.ctx().request_repaint();
        }

        GlobeResponse {
            clicked: if response.clicked() { hovered_id } else { None },
        }
    }

    fn paint_sphere(&self, painter: &Painter, projection: &Projection) {
        painter.circle_filled(projection.center, projection.scale, MOCHA.mantle);
        let grid = Stroke::new(0.5, MOCHA.surface0);
        for lng in (-180..180).step_by(GRATICULE_STEP as usize) {
            let line: Vec<(f64, f64)> = (-90..=90)
                .step_by(5)
                .map(|lat| (lat as f64, lng as f64))
                .collect();
            paint_polyline(painter, projection, &line, grid);
        }
        for lat in (-60..=60).step_by(GRATICULE_STEP as usize) {
            let line: Vec<(f64, f64)> = (-180..=180)
                .step_by(5)
                .map(|lng| (lat as f64, lng as f64))
                .collect();
            paint_polyline(painter, projection, &line, grid);
        }
        painter.circle_stroke(
            projection.center,
            projection.scale,
            Stroke::new(1.0, MOCHA.surface2),
        );
    }
}

fn paint_polyline(painter: &Painter, projection: &Projection, line: &[(f64, f64)], stroke: Stroke) {
    for pair in line.windows(2) {
        if let (Some(a), Some(b)) = (
            projection.project(pair[0].0, pair[0].1, 0.0),
            projection.project(pair[1].0, pair[1].1, 0.0),
        ) {
            painter.line_segment([a, b], stroke);
        }
    }
}

fn paint_arc(painter: &Painter, projection: &Projection, arc: &ArcDatum, phase: f32) {
    let stroke = Stroke::new((arc.style.stroke * 2.0).max(0.6), arc.style.color);
    let period = (arc.style.dash_length + arc.style.dash_gap).max(f32::EPSILON);
    let samples: Vec<Option<Pos2>> = (0..=ARC_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ARC_SEGMENTS as f64;
            let (lat, lng) = great_circle_point(arc.start, arc.end, t);
            let altitude = arc.style.altitude as f64 * (std::f64::consts::PI * t).sin();
            projection.project(lat, lng, altitude)
        })
        .collect();
    let mut shapes = Vec::with_capacity(ARC_SEGMENTS);
    for (i, pair) in samples.windows(2).enumerate() {
        let mid = (i as f32 + 0.5) / ARC_SEGMENTS as f32;
        if (mid - phase).rem_euclid(period) >= arc.style.dash_length {
            continue;
        }
        if let (Some(a), Some(b)) = (pair[0], pair[1]) {
            shapes.push(Shape::line_segment([a, b], stroke));
        }
    }
    painter.extend(shapes);
}

fn paint_tooltip(painter: &Painter, anchor: Pos2, text: &str) {
    let galley = painter.layout_no_wrap(text.to_string(), FontId::proportional(12.0), MOCHA.text);
    let rect = Rect::from_min_size(anchor, galley.size()).expand(4.0);
    painter.rect_filled(rect, 4.0, MOCHA.crust.gamma_multiply(0.9));
    painter.galley(anchor, galley, Color32::WHITE);
}

/// Point at fraction `t` along the great circle between two (lat, lng) positions, in degrees.
pub fn great_circle_point(start: (f64, f64), end: (f64, f64), t: f64) -> (f64, f64) {
    let a = to_unit(start);
    let b = to_unit(end);
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]).clamp(-1.0, 1.0);
    let omega = dot.acos();
    let v = if omega.sin().abs() < 1e-9 {
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
        ]
    } else {
        let wa = ((1.0 - t) * omega).sin() / omega.sin();
        let wb = (t * omega).sin() / omega.sin();
        [
            a[0] * wa + b[0] * wb,
            a[1] * wa + b[1] * wb,
            a[2] * wa + b[2] * wb,
        ]
    };
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt().max(f64::EPSILON);
    let lat = (v[2] / norm).clamp(-1.0, 1.0).asin().to_degrees();
    let lng = v[1].atan2(v[0]).to_degrees();
    (lat, lng)
}

fn to_unit((lat, lng): (f64, f64)) -> [f64; 3] {
    let (lat, lng) = (lat.to_radians(), lng.to_radians());
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Orthographic projection centred on the camera position.
struct Projection {
    center: Pos2,
    /// Screen radius of the globe surface in points.
    scale: f32,
    lng0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
}

impl Projection {
    fn new(rect: Rect, camera: &Camera) -> Self {
        let zoom = 2.5 / (1.0 + camera.altitude);
        let lat0 = camera.lat.to_radians();
        Self {
            center: rect.center(),
            scale: rect.width().min(rect.height()) * 0.45 * zoom as f32,
            lng0: camera.lng.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
        }
    }

    /// Screen position of a point, or `None` if it is on the far side of the globe.
    fn project(&self, lat: f64, lng: f64, altitude: f64) -> Option<Pos2> {
        let (lat, dlng) = (lat.to_radians(), lng.to_radians() - self.lng0);
        let cos_c = self.sin_lat0 * lat.sin() + self.cos_lat0 * lat.cos() * dlng.cos();
        if cos_c < 0.0 {
            return None;
        }
        let x = lat.cos() * dlng.sin();
        let y = self.cos_lat0 * lat.sin() - self.sin_lat0 * lat.cos() * dlng.cos();
        let r = self.scale as f64 * (1.0 + altitude);
        Some(self.center + Vec2::new((x * r) as f32, (-y * r) as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_projection_centre_and_far_side() {
        let camera = Camera {
            lat: 0.0,
            lng: 0.0,
            altitude: 1.5,
        };
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 200.0));
        let projection = Projection::new(rect, &camera);
        let centre = projection.project(0.0, 0.0, 0.0).unwrap();
        assert!((centre - Pos2::new(100.0, 100.0)).length() < 1e-3);
        assert!(projection.project(0.0, 180.0, 0.0).is_none());
        // North is up on screen
        assert!(projection.project(45.0, 0.0, 0.0).unwrap().y < 100.0);
    }

    #[test]
    fn test_great_circle_endpoints() {
        let start = (41.0, 29.0);
        let end = (-33.9, 151.2);
        let (lat, lng) = great_circle_point(start, end, 0.0);
        assert!((lat - 41.0).abs() < 1e-6 && (lng - 29.0).abs() < 1e-6);
        let (lat, lng) = great_circle_point(start, end, 1.0);
        assert!((lat + 33.9).abs() < 1e-6 && (lng - 151.2).abs() < 1e-6);
        let same = great_circle_point(start, start, 0.5);
        assert!((same.0 - 41.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_of_view_records_and_animates() {
        let mut globe = GlobeView::default();
        globe.point_of_view(PointOfView {
            lat: 10.0,
            lng: 20.0,
            altitude: 1.5,
            transition: Duration::from_millis(1000),
        });
        assert_eq!(globe.last_point_of_view().unwrap().lat, 10.0);
        let later = Instant::now() + Duration::from_secs(2);
        assert!(!globe.step_camera(later));
        assert_eq!(
            globe.camera,
            Camera {
                lat: 10.0,
                lng: 20.0,
                altitude: 1.5
            }
        );
    }
}
