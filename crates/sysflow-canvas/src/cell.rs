use serde::Serialize;

pub type CellId = String;

/// Position and size of a cell, relative to its parent cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Axis-aligned box accumulated over several geometries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_geometries<'a>(items: impl IntoIterator<Item = &'a Geometry>) -> Option<Self> {
        let mut it = items.into_iter();
        let g0 = it.next()?;
        let mut b = Self {
            min_x: g0.x,
            min_y: g0.y,
            max_x: g0.right(),
            max_y: g0.bottom(),
        };
        for g in it {
            b.min_x = b.min_x.min(g.x);
            b.min_y = b.min_y.min(g.y);
            b.max_x = b.max_x.max(g.right());
            b.max_y = b.max_y.max(g.bottom());
        }
        Some(b)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Vertex,
    Edge,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub id: CellId,
    pub kind: CellKind,
    pub value: String,
    pub parent: CellId,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CellId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<CellId>,
}

impl Cell {
    pub fn is_vertex(&self) -> bool {
        self.kind == CellKind::Vertex
    }

    pub fn is_edge(&self) -> bool {
        self.kind == CellKind::Edge
    }
}
