use egui::Pos2;

/// One committed freehand gesture: the ordered point path in image-space
/// coordinates plus the brush diameter (image-space pixels) captured when the
/// gesture started. Immutable once committed.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushStroke {
    points: Vec<Pos2>,
    diameter: f32,
}

impl BrushStroke {
    fn start(first: Pos2, diameter: f32) -> Self {
        Self {
            points: vec![first],
            diameter,
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }
}

/// Gesture state machine accumulating strokes across pointer gestures.
///
/// Idle until [`begin`](Self::begin), collecting while a gesture is live,
/// back to idle on [`finish`](Self::finish). Events that do not fit the
/// current state (moves while idle, a second press mid-gesture) are dropped,
/// so callers can forward raw pointer events without pre-filtering.
#[derive(Debug, Default)]
pub struct StrokeRecorder {
    committed: Vec<BrushStroke>,
    live: Option<BrushStroke>,
}

impl StrokeRecorder {
    /// Starts a gesture at `at`. Ignored while another gesture is live: the
    /// first gesture keeps exclusive ownership until it finishes.
    pub fn begin(&mut self, at: Pos2, diameter: f32) {
        if self.live.is_none() {
            self.live = Some(BrushStroke::start(at, diameter));
        }
    }

    /// Appends a point to the live gesture. No-op while idle.
    pub fn extend(&mut self, to: Pos2) {
        if let Some(live) = &mut self.live {
            live.points.push(to);
        }
    }

    /// Ends the live gesture and commits it. Returns whether a stroke was
    /// committed (false when no gesture was live).
    pub fn finish(&mut self) -> bool {
        match self.live.take() {
            Some(stroke) => {
                self.committed.push(stroke);
                true
            }
            None => false,
        }
    }

    /// Records a tap as a single-point stroke. Ignored mid-gesture.
    pub fn tap(&mut self, at: Pos2, diameter: f32) -> bool {
        if self.live.is_some() {
            return false;
        }
        self.begin(at, diameter);
        self.finish()
    }

    /// Drops everything, committed and live.
    pub fn clear(&mut self) {
        self.committed.clear();
        self.live = None;
    }

    pub fn committed(&self) -> &[BrushStroke] {
        &self.committed
    }

    pub fn live(&self) -> Option<&BrushStroke> {
        self.live.as_ref()
    }

    pub fn has_committed(&self) -> bool {
        !self.committed.is_empty()
    }

    pub fn is_drawing(&self) -> bool {
        self.live.is_some()
    }
}
