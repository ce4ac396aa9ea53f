/// RGBA colors, colormaps and per-face color assignment
use crate::error::{GeometryError, Result};

/// An RGBA color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiply the RGB channels by `factor`, keeping alpha
    pub fn shaded(self, factor: f32) -> Self {
        Self::rgba(self.r * factor, self.g * factor, self.b * factor, self.a)
    }

    /// Move the RGB channels toward white by `t` (0 keeps the color, 1 is white)
    pub fn lightened(self, t: f32) -> Self {
        let mix = |c: f32| t + (1.0 - t) * c;
        Self::rgba(mix(self.r), mix(self.g), mix(self.b), self.a)
    }

    /// Component-wise linear interpolation
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Perceived brightness (Rec. 601 weights)
    pub fn luminance(&self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// Mean of a set of colors; `None` when empty
    pub fn mean<'a>(colors: impl IntoIterator<Item = &'a Color>) -> Option<Color> {
        let mut sum = [0.0f32; 4];
        let mut count = 0usize;
        for c in colors {
            sum[0] += c.r;
            sum[1] += c.g;
            sum[2] += c.b;
            sum[3] += c.a;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = count as f32;
        Some(Color::rgba(sum[0] / n, sum[1] / n, sum[2] / n, sum[3] / n))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Piecewise-linear colormap over evenly spaced stops
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    stops: Vec<Color>,
}

impl Colormap {
    /// Build a colormap from at least one stop
    pub fn new(stops: Vec<Color>) -> Option<Self> {
        if stops.is_empty() {
            None
        } else {
            Some(Self { stops })
        }
    }

    pub fn gray() -> Self {
        Self {
            stops: vec![Color::BLACK, Color::WHITE],
        }
    }

    pub fn viridis() -> Self {
        Self {
            stops: vec![
                Color::rgb(0.267, 0.005, 0.329),
                Color::rgb(0.229, 0.322, 0.546),
                Color::rgb(0.128, 0.567, 0.551),
                Color::rgb(0.369, 0.789, 0.383),
                Color::rgb(0.993, 0.906, 0.144),
            ],
        }
    }

    pub fn magma() -> Self {
        Self {
            stops: vec![
                Color::rgb(0.001, 0.000, 0.014),
                Color::rgb(0.317, 0.071, 0.485),
                Color::rgb(0.716, 0.215, 0.475),
                Color::rgb(0.987, 0.536, 0.382),
                Color::rgb(0.987, 0.991, 0.750),
            ],
        }
    }

    pub fn reds() -> Self {
        Self {
            stops: vec![
                Color::rgb(1.000, 0.961, 0.941),
                Color::rgb(0.988, 0.733, 0.631),
                Color::rgb(0.984, 0.416, 0.290),
                Color::rgb(0.796, 0.094, 0.114),
                Color::rgb(0.404, 0.000, 0.051),
            ],
        }
    }

    /// Evaluate at `t`, clamped to [0, 1]
    pub fn map(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        if last == 0 {
            return self.stops[0];
        }
        let position = t * last as f32;
        let index = (position.floor() as usize).min(last - 1);
        self.stops[index].lerp(self.stops[index + 1], position - index as f32)
    }
}

/// How colors are supplied for a set of faces
#[derive(Debug, Clone, PartialEq)]
pub enum FaceColors {
    /// One color for every face
    Flat(Color),
    /// One color per face, in face order
    PerFace(Vec<Color>),
    /// One color per vertex; a face gets the mean of its vertices' colors
    PerVertex(Vec<Color>),
}

impl FaceColors {
    /// Resolve to exactly one color per face
    pub fn resolve(&self, what: &'static str, faces: &[Vec<usize>], vertex_count: usize) -> Result<Vec<Color>> {
        match self {
            FaceColors::Flat(color) => Ok(vec![*color; faces.len()]),
            FaceColors::PerFace(colors) => {
                if colors.len() != faces.len() {
                    return Err(GeometryError::ColorCount {
                        what,
                        expected: faces.len(),
                        actual: colors.len(),
                    });
                }
                Ok(colors.clone())
            }
            FaceColors::PerVertex(colors) => {
                if colors.len() != vertex_count {
                    return Err(GeometryError::ColorCount {
                        what,
                        expected: vertex_count,
                        actual: colors.len(),
                    });
                }
                crate::geometry::validate_faces(faces, vertex_count)?;
                Ok(faces
                    .iter()
                    .map(|face| Color::mean(face.iter().map(|&i| &colors[i])).unwrap_or_default())
                    .collect())
            }
        }
    }

    /// Resolve to one color per item for primitives without face lists
    /// (one entry per bar, per point, ...). Both `PerFace` and `PerVertex`
    /// are read as one color per item.
    pub fn per_item(&self, what: &'static str, count: usize) -> Result<Vec<Color>> {
        match self {
            FaceColors::Flat(color) => Ok(vec![*color; count]),
            FaceColors::PerFace(colors) | FaceColors::PerVertex(colors) => {
                if colors.len() != count {
                    return Err(GeometryError::ColorCount {
                        what,
                        expected: count,
                        actual: colors.len(),
                    });
                }
                Ok(colors.clone())
            }
        }
    }
}

impl From<Color> for FaceColors {
    fn from(color: Color) -> Self {
        FaceColors::Flat(color)
    }
}

/// Fill color source for a face pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FaceFill {
    /// Fixed colors resolved once at construction
    Colors(FaceColors),
    /// Colormap evaluated every frame from normalized face depth
    Colormap(Colormap),
}

impl From<Color> for FaceFill {
    fn from(color: Color) -> Self {
        FaceFill::Colors(FaceColors::Flat(color))
    }
}

impl From<FaceColors> for FaceFill {
    fn from(colors: FaceColors) -> Self {
        FaceFill::Colors(colors)
    }
}

impl From<Colormap> for FaceFill {
    fn from(colormap: Colormap) -> Self {
        FaceFill::Colormap(colormap)
    }
}
